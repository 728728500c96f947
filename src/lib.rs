#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Device driver for the Analog Devices AD9833 programmable waveform generator.
//!
//! The AD9833 is a DDS chip with two 28-bit frequency registers, two 12-bit
//! phase registers and a control register, all written through a 3-wire
//! serial interface (SCLK, SDATA, FSYNC) as 16-bit words. Nothing can be read
//! back, so the driver keeps a mirror of every register it writes.
//!
//! # Features
//!
//! - **Glitch-free programming** - [`Ad9833Driver::initialize`] holds RESET
//!   while both channels are loaded, and 28-bit frequencies are always sent as
//!   control word, LSB half, MSB half
//! - **Unit conversions** - frequencies in Hz and phases in tenths of a degree,
//!   encoded against a configurable [`ReferenceClock`]
//! - **Two transports** - hardware SPI ([`SpiChannel`]) or bit-banged GPIO
//!   ([`BitBangChannel`]), or bring your own via [`RegisterChannel`]
//! - **Typed register map** - frame layouts generated with
//!   [`device-driver`](https://crates.io/crates/device-driver)
//! - **No_std support** - with an optional `std` feature for `std::error::Error`
//!   and a `defmt` feature for logging
//!
//! # Hardware Notes
//!
//! ## FSYNC
//!
//! FSYNC frames each 16-bit word. With [`SpiChannel`] it is the chip select of
//! the [`SpiDevice`](embedded_hal::spi::SpiDevice), which must run in
//! [`SPI_MODE`] (CPOL = 1, CPHA = 0). Two drivers must never share one FSYNC
//! line.
//!
//! ## Concurrency
//!
//! A driver owns its chip. Methods take `&mut self` and are not reentrant;
//! callers sharing a driver between threads or interrupt contexts must
//! serialize access themselves.
//!
//! # Usage
//!
//! ```
//! use ad9833::{Ad9833Driver, Channel, Config, Mode, RegisterChannel};
//! use core::convert::Infallible;
//!
//! struct Trace;
//!
//! impl RegisterChannel for Trace {
//!     type Error = Infallible;
//!     fn send_command(&mut self, _value: u16) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! let mut driver = Ad9833Driver::new(Trace);
//!
//! // RESET held while both channels are loaded with 1 kHz / 0°
//! driver.initialize(&Config::default()).unwrap();
//!
//! // Prepare channel 1 while channel 0 plays, then switch
//! driver.set_frequency(Channel::One, 440.0).unwrap();
//! driver.set_active_frequency_channel(Channel::One).unwrap();
//! driver.set_mode(Mode::Triangle).unwrap();
//!
//! assert_eq!(driver.frequency(Channel::One), 440.0);
//! assert_eq!(driver.mode(), Mode::Triangle);
//! ```
//!
//! **See `demos/basic_usage.rs` and `demos/bit_bang.rs` for complete examples.**
//!
//! # Register Map
//!
//! - **Control**: D15:D14 = 00, B28, HLB, FSELECT, PSELECT, RESET, SLEEP1,
//!   SLEEP12, OPBITEN, DIV2, MODE
//! - **FREQ0 / FREQ1**: D15:D14 = 01 / 10, one 14-bit half per word
//! - **PHASE0 / PHASE1**: D15:D13 = 110 / 111, 12-bit value

use core::fmt;

use device_driver::RegisterInterface;

pub mod control;
pub mod frequency;
mod state;
mod transport;

pub use control::{Channel, Command, ControlRegister, Mode};
pub use frequency::{encode_frequency, encode_phase, split_frequency, ReferenceClock};
pub use state::{ChannelSettings, DeviceState, Status};
pub use transport::{BitBangChannel, RegisterChannel, SpiChannel, MAX_SPI_FREQUENCY_HZ, SPI_MODE};

use frequency::PHASE_MASK;

// The AD9833 has no address bus: the destination is encoded in the top bits
// of every word. The addresses below only route the generated API and never
// reach the wire.
device_driver::create_device!(
    device_name: Ad9833,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        /// Control register (D15:D14 = 00)
        register Control {
            const ADDRESS = 0;
            const SIZE_BITS = 16;

            /// MODE: triangle output (sine ROM bypassed)
            triangle: bool = 1,
            /// DIV2: MSB instead of MSB/2 on VOUT
            divide_by_two: bool = 3,
            /// OPBITEN: DAC MSB drives VOUT
            output_bit_enable: bool = 5,
            /// SLEEP12: DAC powered down
            dac_sleep: bool = 6,
            /// SLEEP1: MCLK disabled
            clock_sleep: bool = 7,
            /// RESET
            reset: bool = 8,
            /// PSELECT
            phase_select: bool = 10,
            /// FSELECT
            frequency_select: bool = 11,
            /// HLB
            half_word_load: bool = 12,
            /// B28: two consecutive writes load all 28 bits
            word_mode: bool = 13,
        },

        /// One 14-bit half of FREQ0 (D15:D14 = 01) or FREQ1 (10)
        register FrequencyWord {
            const ADDRESS = 1;
            const SIZE_BITS = 16;

            value: uint = 0..14,
            destination: uint = 14..16,
        },

        /// PHASE0 (D15:D13 = 110) or PHASE1 (111)
        register PhaseWord {
            const ADDRESS = 2;
            const SIZE_BITS = 16;

            value: uint = 0..12,
            destination: uint = 13..16,
        },
    }
);

type Device<I> = Ad9833<I>;

/// Error type for driver operations
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Error from the register channel
    Transport(E),

    /// Reference clock was zero, negative or not finite
    InvalidReferenceClock,

    /// A register read was attempted; the AD9833 is write-only
    WriteOnly,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "register channel error: {:?}", e),
            Error::InvalidReferenceClock => {
                f.write_str("reference clock must be finite and greater than zero")
            }
            Error::WriteOnly => f.write_str("AD9833 registers cannot be read"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// Adapts a [`RegisterChannel`] to the generated register API.
///
/// Each register write becomes exactly one 16-bit command word.
#[derive(Debug)]
struct CommandInterface<C> {
    channel: C,
}

impl<C: RegisterChannel> RegisterInterface for CommandInterface<C> {
    type Error = Error<C::Error>;
    type AddressType = u8;

    fn write_register(
        &mut self,
        _address: Self::AddressType,
        size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        debug_assert_eq!(size_bits, 16);
        let word = u16::from_be_bytes([data[0], data[1]]);

        #[cfg(feature = "defmt")]
        defmt::trace!("send {=u16:#x} {}", word, Command::decode(word));

        self.channel.send_command(word).map_err(Error::Transport)
    }

    fn read_register(
        &mut self,
        _address: Self::AddressType,
        _size_bits: u32,
        _data: &mut [u8],
    ) -> Result<(), Self::Error> {
        Err(Error::WriteOnly)
    }
}

/// Settings applied by [`Ad9833Driver::initialize`].
///
/// [`Config::default()`] gives a 1 kHz sine on channel 0 from a 25 MHz clock.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// MCLK frequency
    pub reference_clock: ReferenceClock,
    /// Loaded into both frequency registers, in Hz
    pub frequency_hz: f64,
    /// Loaded into both phase registers, in tenths of a degree
    pub phase: u16,
    /// Output waveform once reset is released
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reference_clock: ReferenceClock::NOMINAL,
            frequency_hz: 1000.0,
            phase: 0,
            mode: Mode::Sine,
        }
    }
}

/// High-level AD9833 driver.
///
/// Owns the register channel and the mirror of the chip's registers. Every
/// method that changes the mirror writes the affected register before it
/// returns.
///
/// # Example
///
/// ```
/// # use ad9833::{Ad9833Driver, Channel, Config, RegisterChannel};
/// # use core::convert::Infallible;
/// # struct Trace;
/// # impl RegisterChannel for Trace {
/// #     type Error = Infallible;
/// #     fn send_command(&mut self, _: u16) -> Result<(), Infallible> { Ok(()) }
/// # }
/// let mut driver = Ad9833Driver::new(Trace);
/// driver.initialize(&Config::default()).unwrap();
///
/// // 90° phase offset on channel 0
/// driver.set_phase(Channel::Zero, 900).unwrap();
/// assert_eq!(driver.phase_register(Channel::Zero), 1024);
/// ```
pub struct Ad9833Driver<C> {
    device: Device<CommandInterface<C>>,
    state: DeviceState,
}

impl<C: RegisterChannel> Ad9833Driver<C> {
    /// Create a driver on `channel`.
    ///
    /// Nothing is sent until [`initialize()`](Self::initialize).
    pub fn new(channel: C) -> Self {
        Self {
            device: Ad9833::new(CommandInterface { channel }),
            state: DeviceState::default(),
        }
    }

    /// Get a reference to the register channel.
    pub fn channel(&self) -> &C {
        &self.device.interface.channel
    }

    /// Consume the driver and return the register channel.
    pub fn release(self) -> C {
        let Ad9833 { interface, .. } = self.device;
        interface.channel
    }

    /// The register mirror.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Coarse device state.
    pub fn status(&self) -> Status {
        self.state.status
    }

    /// Last control word written.
    pub fn control_word(&self) -> u16 {
        self.state.control.bits()
    }

    /// Bring the chip up in a known state.
    ///
    /// Follows the datasheet's initialization flow:
    /// 1. Transport setup ([`RegisterChannel::init`])
    /// 2. Control register cleared except B28
    /// 3. RESET asserted and held
    /// 4. Reference clock, both frequencies and both phases loaded from `cfg`
    /// 5. RESET pulsed (set, then cleared) to commit
    /// 6. `cfg.mode` applied, channel 0 selected for frequency and phase
    ///
    /// The output stays at midscale until both channels are loaded. The
    /// driver reports [`Status::Uninitialized`] until the whole sequence has
    /// been sent.
    pub fn initialize(&mut self, cfg: &Config) -> Result<(), Error<C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("initialize {}", cfg);

        self.device
            .interface
            .channel
            .init()
            .map_err(Error::Transport)?;

        self.state.status = Status::Uninitialized;
        self.state.control = ControlRegister {
            word_mode: true,
            ..ControlRegister::default()
        };
        self.write_control()?;

        self.reset(true)?;

        self.state.reference_clock = cfg.reference_clock;
        for channel in Channel::ALL {
            self.set_frequency(channel, cfg.frequency_hz)?;
        }
        for channel in Channel::ALL {
            self.set_phase(channel, cfg.phase)?;
        }

        self.state.control.reset = true;
        self.write_control()?;
        self.reset(false)?;

        self.set_mode(cfg.mode)?;
        self.set_active_frequency_channel(Channel::Zero)?;
        self.set_active_phase_channel(Channel::Zero)?;

        self.state.status = Status::Active;
        Ok(())
    }

    /// Reset the chip's internal registers. Reset happens on the 1 → 0 RESET
    /// transition.
    ///
    /// With `hold = true` RESET is set and left set, so further registers can
    /// be loaded without the output following them. A later `reset(false)`
    /// releases it with a single write; otherwise `reset(false)` sets and
    /// clears RESET with two writes.
    ///
    /// [`status()`](Self::status) only follows the hold once the driver has
    /// been initialized.
    pub fn reset(&mut self, hold: bool) -> Result<(), Error<C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("reset hold={}", hold);

        let release_only = !hold && self.state.control.reset;
        if !release_only {
            self.state.control.reset = true;
            self.write_control()?;
        }

        let initialized = self.state.status != Status::Uninitialized;
        if hold {
            if initialized {
                self.state.status = Status::ResetHeld;
            }
            return Ok(());
        }

        self.state.control.reset = false;
        self.write_control()?;
        if initialized {
            self.state.status = Status::Active;
        }
        Ok(())
    }

    /// Select the output waveform. One control register write.
    ///
    /// | Mode | OPBITEN | DIV2 | MODE | SLEEP1 | SLEEP12 |
    /// |------|---------|------|------|--------|---------|
    /// | Off | 0 | 0 | 0 | 1 | 1 |
    /// | Sine | 0 | 0 | 0 | 0 | 0 |
    /// | Square | 1 | 1 | 0 | 0 | 0 |
    /// | SquareHalf | 1 | 0 | 0 | 0 | 0 |
    /// | Triangle | 0 | 0 | 1 | 0 | 0 |
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("set_mode {}", mode);

        self.state.mode = mode;
        self.state.control.apply_mode(mode);
        self.write_control()
    }

    /// Last mode passed to [`set_mode()`](Self::set_mode).
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Select the frequency register feeding the phase accumulator.
    pub fn set_active_frequency_channel(
        &mut self,
        channel: Channel,
    ) -> Result<Channel, Error<C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("set_active_frequency_channel {}", channel);

        self.state.control.frequency_select = channel == Channel::One;
        self.write_control()?;
        Ok(channel)
    }

    /// Frequency register currently feeding the phase accumulator.
    pub fn active_frequency_channel(&self) -> Channel {
        self.state.control.frequency_channel()
    }

    /// Select the phase register added to the phase accumulator.
    pub fn set_active_phase_channel(
        &mut self,
        channel: Channel,
    ) -> Result<Channel, Error<C::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("set_active_phase_channel {}", channel);

        self.state.control.phase_select = channel == Channel::One;
        self.write_control()?;
        Ok(channel)
    }

    /// Phase register currently added to the phase accumulator.
    pub fn active_phase_channel(&self) -> Channel {
        self.state.control.phase_channel()
    }

    /// Load a frequency register.
    ///
    /// The value is encoded against the current reference clock and sent as
    /// three words: the control register (re-asserting B28), then the low and
    /// the high 14 bits, both addressed to `channel`.
    pub fn set_frequency(&mut self, channel: Channel, freq_hz: f64) -> Result<(), Error<C::Error>> {
        let encoded = encode_frequency(freq_hz, self.state.reference_clock);

        #[cfg(feature = "defmt")]
        defmt::debug!("set_frequency {} {} Hz -> {=u32:#x}", channel, freq_hz, encoded);

        let settings = self.state.channel_mut(channel);
        settings.frequency_hz = freq_hz;
        settings.frequency_register = encoded;

        // The chip needs both halves back to back after a control write
        self.write_control()?;

        let (low, high) = split_frequency(encoded);
        for half in [low, high] {
            self.device.frequency_word().write(|r| {
                r.set_value(half);
                r.set_destination(channel.frequency_address());
            })?;
        }
        Ok(())
    }

    /// Last frequency requested for `channel`, in Hz.
    pub fn frequency(&self, channel: Channel) -> f64 {
        self.state.channel(channel).frequency_hz
    }

    /// Encoded value last sent to `channel`'s frequency register.
    pub fn frequency_register(&self, channel: Channel) -> u32 {
        self.state.channel(channel).frequency_register
    }

    /// Load a phase register with `tenths_of_degree` (100.1° is 1001).
    pub fn set_phase(&mut self, channel: Channel, tenths_of_degree: u16) -> Result<(), Error<C::Error>> {
        let encoded = encode_phase(tenths_of_degree);

        #[cfg(feature = "defmt")]
        defmt::debug!("set_phase {} {} -> {=u16:#x}", channel, tenths_of_degree, encoded);

        let settings = self.state.channel_mut(channel);
        settings.phase = tenths_of_degree;
        settings.phase_register = encoded;

        self.device.phase_word().write(|r| {
            r.set_value(encoded & PHASE_MASK);
            r.set_destination(channel.phase_address());
        })?;
        Ok(())
    }

    /// Last phase requested for `channel`, in tenths of a degree.
    pub fn phase(&self, channel: Channel) -> u16 {
        self.state.channel(channel).phase
    }

    /// Encoded value last sent to `channel`'s phase register.
    pub fn phase_register(&self, channel: Channel) -> u16 {
        self.state.channel(channel).phase_register
    }

    /// Set the MCLK frequency used by later [`set_frequency()`](Self::set_frequency)
    /// calls. Nothing is written, and frequencies already loaded are not
    /// re-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReferenceClock`] for zero, negative or
    /// non-finite values; the previous clock is kept.
    pub fn set_reference_clock(&mut self, hz: f64) -> Result<(), Error<C::Error>> {
        self.state.reference_clock = ReferenceClock::new(hz).ok_or(Error::InvalidReferenceClock)?;
        Ok(())
    }

    /// MCLK frequency in Hz.
    pub fn reference_clock(&self) -> f64 {
        self.state.reference_clock.hz()
    }

    fn write_control(&mut self) -> Result<(), Error<C::Error>> {
        let image = self.state.control;
        self.device.control().write(|r| *r = image.into())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct Recorder {
        words: Vec<u16>,
        init_calls: usize,
    }

    impl RegisterChannel for Recorder {
        type Error = Infallible;

        fn init(&mut self) -> Result<(), Infallible> {
            self.init_calls += 1;
            Ok(())
        }

        fn send_command(&mut self, value: u16) -> Result<(), Infallible> {
            self.words.push(value);
            Ok(())
        }
    }

    fn initialized() -> Ad9833Driver<Recorder> {
        let mut driver = Ad9833Driver::new(Recorder::default());
        driver.initialize(&Config::default()).unwrap();
        driver
    }

    /// Words sent since the last call.
    fn take(driver: &mut Ad9833Driver<Recorder>) -> Vec<u16> {
        core::mem::take(&mut driver.device.interface.channel.words)
    }

    #[test]
    fn test_initialize_sequence() {
        let mut driver = initialized();
        assert_eq!(driver.channel().init_calls, 1);

        // 1000 Hz at 25 MHz = 10737 = 0x29F1
        assert_eq!(
            take(&mut driver),
            vec![
                0x2000, // B28
                0x2100, // B28 | RESET, held
                0x2100, 0x69F1, 0x4000, // FREQ0
                0x2100, 0xA9F1, 0x8000, // FREQ1
                0xC000, // PHASE0
                0xE000, // PHASE1
                0x2100, // RESET set
                0x2000, // RESET cleared, commits
                0x2000, // sine
                0x2000, // FSELECT = 0
                0x2000, // PSELECT = 0
            ]
        );
    }

    #[test]
    fn test_initialize_state() {
        let driver = initialized();
        assert_eq!(driver.status(), Status::Active);
        assert_eq!(driver.mode(), Mode::Sine);
        assert_eq!(driver.active_frequency_channel(), Channel::Zero);
        assert_eq!(driver.active_phase_channel(), Channel::Zero);
        assert_eq!(driver.reference_clock(), 25_000_000.0);
        for channel in Channel::ALL {
            assert_eq!(driver.frequency(channel), 1000.0);
            assert_eq!(driver.frequency_register(channel), 10737);
            assert_eq!(driver.phase(channel), 0);
            assert_eq!(driver.phase_register(channel), 0);
        }
        assert!(driver.state().control().word_mode);
        assert!(!driver.state().control().reset);
    }

    #[test]
    fn test_initialize_with_config() {
        let cfg = Config {
            reference_clock: ReferenceClock::new(16_000_000.0).unwrap(),
            frequency_hz: 2000.0,
            phase: 900,
            mode: Mode::Square,
        };
        let mut driver = Ad9833Driver::new(Recorder::default());
        driver.initialize(&cfg).unwrap();

        // 2000 × 2^28 / 16e6 = 33554.432
        assert_eq!(driver.frequency_register(Channel::One), 33554);
        assert_eq!(driver.phase_register(Channel::One), 1024);
        assert_eq!(driver.mode(), Mode::Square);
        assert_eq!(driver.control_word(), 0x2028);
        assert_eq!(take(&mut driver).len(), 15);
    }

    #[test]
    fn test_every_word_has_clean_address_and_unused_bits() {
        let mut driver = initialized();
        driver.set_frequency(Channel::One, 12_345.6).unwrap();
        driver.set_phase(Channel::One, 3599).unwrap();
        driver.set_mode(Mode::Square).unwrap();
        driver.set_active_phase_channel(Channel::One).unwrap();

        for word in take(&mut driver) {
            assert!(!Command::has_stray_bits(word), "{:#06x}", word);
        }
    }

    #[test]
    fn test_control_writes_match_mirror() {
        let mut driver = initialized();
        take(&mut driver);

        driver.set_active_frequency_channel(Channel::One).unwrap();
        driver.set_mode(Mode::Triangle).unwrap();
        let words = take(&mut driver);
        assert_eq!(words.last().copied(), Some(driver.control_word()));
        assert_eq!(
            Command::decode(words[1]),
            Command::Control(*driver.state().control())
        );
    }

    #[test]
    fn test_set_frequency_write_order() {
        let mut driver = initialized();
        take(&mut driver);

        driver.set_frequency(Channel::One, 5000.0).unwrap();

        // 5000 Hz = 53687 = 0xD1B7: low 0x11B7, high 0x0003
        assert_eq!(take(&mut driver), vec![0x2000, 0x91B7, 0x8003]);
        assert_eq!(driver.frequency(Channel::One), 5000.0);
        assert_eq!(driver.frequency_register(Channel::One), 53687);
        // Channel 0 untouched
        assert_eq!(driver.frequency(Channel::Zero), 1000.0);
    }

    #[test]
    fn test_set_frequency_reasserts_current_control_word() {
        let mut driver = initialized();
        driver.set_mode(Mode::Triangle).unwrap();
        driver.set_active_frequency_channel(Channel::One).unwrap();
        take(&mut driver);

        driver.set_frequency(Channel::Zero, 1000.0).unwrap();
        let words = take(&mut driver);
        assert_eq!(words, vec![0x2802, 0x69F1, 0x4000]);
    }

    #[test]
    fn test_set_frequency_masks_overflow() {
        let mut driver = initialized();
        take(&mut driver);

        // 2^28 + 1 at the register level: bit 28 is dropped on the wire
        driver.set_reference_clock(268_435_456.0).unwrap();
        driver.set_frequency(Channel::Zero, 268_435_457.0).unwrap();

        assert_eq!(driver.frequency_register(Channel::Zero), (1 << 28) + 1);
        assert_eq!(take(&mut driver), vec![0x2000, 0x4001, 0x4000]);
    }

    #[test]
    fn test_set_phase() {
        let mut driver = initialized();
        take(&mut driver);

        driver.set_phase(Channel::Zero, 900).unwrap();
        driver.set_phase(Channel::One, 3600).unwrap();
        driver.set_phase(Channel::One, 2700).unwrap();

        assert_eq!(take(&mut driver), vec![0xC400, 0xE000, 0xEC00]);
        assert_eq!(driver.phase(Channel::Zero), 900);
        assert_eq!(driver.phase_register(Channel::Zero), 1024);
        assert_eq!(driver.phase(Channel::One), 2700);
        assert_eq!(driver.phase_register(Channel::One), 3072);
    }

    #[test]
    fn test_set_mode_single_write_each() {
        let cases = [
            (Mode::Off, 0x20C0),
            (Mode::Sine, 0x2000),
            (Mode::Square, 0x2028),
            (Mode::SquareHalf, 0x2020),
            (Mode::Triangle, 0x2002),
        ];
        for (mode, expected) in cases {
            let mut driver = initialized();
            take(&mut driver);

            driver.set_mode(mode).unwrap();
            assert_eq!(take(&mut driver), vec![expected], "{:?}", mode);
            assert_eq!(driver.mode(), mode);
        }
    }

    #[test]
    fn test_set_mode_after_square_clears_div2() {
        let mut driver = initialized();
        driver.set_mode(Mode::Square).unwrap();
        take(&mut driver);

        driver.set_mode(Mode::Sine).unwrap();
        assert_eq!(take(&mut driver), vec![0x2000]);
    }

    #[test]
    fn test_active_channels_are_independent() {
        let mut driver = initialized();
        take(&mut driver);

        assert_eq!(driver.set_active_frequency_channel(Channel::One), Ok(Channel::One));
        assert_eq!(driver.active_frequency_channel(), Channel::One);
        assert_eq!(driver.active_phase_channel(), Channel::Zero);

        assert_eq!(driver.set_active_phase_channel(Channel::One), Ok(Channel::One));
        assert_eq!(driver.set_active_frequency_channel(Channel::Zero), Ok(Channel::Zero));
        assert_eq!(driver.active_frequency_channel(), Channel::Zero);
        assert_eq!(driver.active_phase_channel(), Channel::One);

        assert_eq!(take(&mut driver), vec![0x2800, 0x2C00, 0x2400]);
    }

    #[test]
    fn test_reset_pulse() {
        let mut driver = initialized();
        take(&mut driver);

        driver.reset(false).unwrap();
        assert_eq!(take(&mut driver), vec![0x2100, 0x2000]);
        assert_eq!(driver.status(), Status::Active);
    }

    #[test]
    fn test_reset_hold_then_release() {
        let mut driver = initialized();
        take(&mut driver);

        driver.reset(true).unwrap();
        assert_eq!(driver.status(), Status::ResetHeld);
        assert!(driver.state().control().reset);

        driver.set_frequency(Channel::One, 5000.0).unwrap();

        driver.reset(false).unwrap();
        assert_eq!(driver.status(), Status::Active);
        assert!(!driver.state().control().reset);

        assert_eq!(
            take(&mut driver),
            vec![0x2100, 0x2100, 0x91B7, 0x8003, 0x2000]
        );
    }

    #[test]
    fn test_reset_hold_release_is_two_writes() {
        let mut driver = initialized();
        take(&mut driver);

        driver.reset(true).unwrap();
        driver.reset(false).unwrap();
        assert_eq!(take(&mut driver), vec![0x2100, 0x2000]);
    }

    #[test]
    fn test_initialize_commit_is_a_full_reset_pulse() {
        let mut driver = initialized();
        let words = take(&mut driver);
        let phase1 = words.iter().position(|&w| w == 0xE000).unwrap();
        assert_eq!(words[phase1 + 1..phase1 + 3], [0x2100, 0x2000]);
    }

    #[test]
    fn test_reset_before_initialize_keeps_status() {
        let mut driver = Ad9833Driver::new(Recorder::default());

        driver.reset(true).unwrap();
        assert_eq!(driver.status(), Status::Uninitialized);
        driver.reset(false).unwrap();
        assert_eq!(driver.status(), Status::Uninitialized);

        // The words still go out
        assert_eq!(take(&mut driver), vec![0x0100, 0x0000]);
    }

    /// Accepts `remaining` words, then fails every send.
    struct FailAfter {
        remaining: usize,
    }

    impl RegisterChannel for FailAfter {
        type Error = &'static str;

        fn send_command(&mut self, _value: u16) -> Result<(), Self::Error> {
            if self.remaining == 0 {
                return Err("bus fault");
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_failed_initialize_stays_uninitialized() {
        // Fails inside the first set_frequency, with RESET held
        let mut driver = Ad9833Driver::new(FailAfter { remaining: 3 });
        assert_eq!(
            driver.initialize(&Config::default()),
            Err(Error::Transport("bus fault"))
        );
        assert!(driver.state().control().reset);
        assert_eq!(driver.status(), Status::Uninitialized);
    }

    #[test]
    fn test_control_word_is_the_word_sent() {
        let mut driver = initialized();
        driver.set_mode(Mode::Square).unwrap();
        driver.set_active_phase_channel(Channel::One).unwrap();
        driver.reset(true).unwrap();

        let words = take(&mut driver);
        assert_eq!(words.last().copied(), Some(driver.control_word()));
        assert_eq!(driver.control_word(), 0x2528);
    }

    #[test]
    fn test_reference_clock_is_cache_only() {
        let mut driver = initialized();
        take(&mut driver);

        driver.set_reference_clock(16_000_000.0).unwrap();
        assert_eq!(driver.reference_clock(), 16_000_000.0);
        assert!(take(&mut driver).is_empty());

        // Already loaded channels keep their old encoding
        assert_eq!(driver.frequency_register(Channel::Zero), 10737);

        driver.set_frequency(Channel::Zero, 1000.0).unwrap();
        // 1000 × 2^28 / 16e6 = 16777.216
        assert_eq!(driver.frequency_register(Channel::Zero), 16777);
    }

    #[test]
    fn test_invalid_reference_clock_rejected() {
        let mut driver = initialized();
        for hz in [0.0, -25_000_000.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                driver.set_reference_clock(hz),
                Err(Error::InvalidReferenceClock)
            );
        }
        assert_eq!(driver.reference_clock(), 25_000_000.0);
    }

    #[test]
    fn test_uninitialized_driver() {
        let driver = Ad9833Driver::new(Recorder::default());
        assert_eq!(driver.status(), Status::Uninitialized);
        assert_eq!(driver.mode(), Mode::Off);
        assert_eq!(driver.control_word(), 0);
        assert!(driver.channel().words.is_empty());
        assert_eq!(driver.release().init_calls, 0);
    }

    #[test]
    fn test_driver_over_mutable_reference() {
        let mut recorder = Recorder::default();
        {
            let mut driver = Ad9833Driver::new(&mut recorder);
            driver.initialize(&Config::default()).unwrap();
        }
        assert_eq!(recorder.words.len(), 15);
    }

    struct Broken;

    impl RegisterChannel for Broken {
        type Error = &'static str;

        fn send_command(&mut self, _value: u16) -> Result<(), Self::Error> {
            Err("bus fault")
        }
    }

    #[test]
    fn test_transport_errors_propagate() {
        let mut driver = Ad9833Driver::new(Broken);
        assert_eq!(
            driver.initialize(&Config::default()),
            Err(Error::Transport("bus fault"))
        );
        assert_eq!(
            driver.set_phase(Channel::Zero, 0),
            Err(Error::Transport("bus fault"))
        );
    }

    #[test]
    fn test_registers_are_write_only() {
        let mut interface = CommandInterface {
            channel: Recorder::default(),
        };
        let mut buf = [0u8; 2];
        assert_eq!(
            interface.read_register(0, 16, &mut buf),
            Err(Error::WriteOnly)
        );
    }

    #[test]
    fn test_error_display() {
        let err: Error<Infallible> = Error::InvalidReferenceClock;
        assert_eq!(
            err.to_string(),
            "reference clock must be finite and greater than zero"
        );
        let err: Error<&str> = Error::Transport("bus fault");
        assert_eq!(err.to_string(), "register channel error: \"bus fault\"");
    }
}
