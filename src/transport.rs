//! Serial transports for 16-bit command words
//!
//! The AD9833 latches one 16-bit word per FSYNC frame: FSYNC low, 16 bits MSB
//! first (sampled on the falling SCLK edge), FSYNC high. Two transports frame
//! words identically:
//!
//! - [`SpiChannel`] on an `embedded-hal` [`SpiDevice`], which owns FSYNC as its
//!   chip select
//! - [`BitBangChannel`] toggling three GPIOs by hand

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Mode, SpiDevice, MODE_2};

/// SPI mode expected by the AD9833 (CPOL = 1, CPHA = 0).
pub const SPI_MODE: Mode = MODE_2;

/// Conservative SCLK rate in Hz, well below the 40 MHz datasheet limit.
pub const MAX_SPI_FREQUENCY_HZ: u32 = 14_000_000;

/// Sink for 16-bit command words.
///
/// Implementations send each word as one complete frame and return once it is
/// latched. Ordering between words is the caller's responsibility.
pub trait RegisterChannel {
    /// Transport error
    type Error;

    /// Prepare the bus lines. Called once by `initialize()` before any word is sent.
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Send one command word.
    fn send_command(&mut self, value: u16) -> Result<(), Self::Error>;
}

impl<T: RegisterChannel + ?Sized> RegisterChannel for &mut T {
    type Error = T::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        T::init(self)
    }

    fn send_command(&mut self, value: u16) -> Result<(), Self::Error> {
        T::send_command(self, value)
    }
}

/// Hardware SPI transport.
///
/// The SPI device must be configured for [`SPI_MODE`] with FSYNC as its chip
/// select, clocked at no more than [`MAX_SPI_FREQUENCY_HZ`].
#[derive(Debug)]
pub struct SpiChannel<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiChannel<SPI> {
    /// Wrap an SPI device.
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume the channel and return the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> RegisterChannel for SpiChannel<SPI> {
    type Error = SPI::Error;

    fn send_command(&mut self, value: u16) -> Result<(), Self::Error> {
        self.spi.write(&value.to_be_bytes())
    }
}

/// Bit-banged transport over three GPIO outputs.
///
/// No delays are inserted between edges; at typical MCU clock rates each
/// pin write already exceeds the 10 ns minimum SCLK high/low time.
#[derive(Debug)]
pub struct BitBangChannel<DATA, CLK, FSYNC> {
    data: DATA,
    clk: CLK,
    fsync: FSYNC,
}

impl<DATA, CLK, FSYNC, E> BitBangChannel<DATA, CLK, FSYNC>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    FSYNC: OutputPin<Error = E>,
{
    /// Create a transport from the SDATA, SCLK and FSYNC pins.
    pub fn new(data: DATA, clk: CLK, fsync: FSYNC) -> Self {
        Self { data, clk, fsync }
    }

    /// Consume the channel and return the (SDATA, SCLK, FSYNC) pins.
    pub fn release(self) -> (DATA, CLK, FSYNC) {
        (self.data, self.clk, self.fsync)
    }
}

impl<DATA, CLK, FSYNC, E> RegisterChannel for BitBangChannel<DATA, CLK, FSYNC>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    FSYNC: OutputPin<Error = E>,
{
    type Error = E;

    fn init(&mut self) -> Result<(), E> {
        // Idle: deselected, clock high (mode 2), data low
        self.fsync.set_high()?;
        self.clk.set_high()?;
        self.data.set_low()?;
        Ok(())
    }

    fn send_command(&mut self, value: u16) -> Result<(), E> {
        self.fsync.set_low()?;

        for i in (0..16).rev() {
            if (value >> i) & 1 == 1 {
                self.data.set_high()?;
            } else {
                self.data.set_low()?;
            }
            // Data is sampled on the falling edge
            self.clk.set_low()?;
            self.clk.set_high()?;
        }

        self.data.set_low()?;
        self.fsync.set_high()?;
        Ok(())
    }
}
