//! Basic usage example - Ad9833Driver on a tracing register channel
//!
//! This example demonstrates the `Ad9833Driver`:
//! - One-shot initialization from a `Config`
//! - Loading a second channel while the first one plays, then switching
//! - Changing the waveform
//! - Holding reset while several registers are reprogrammed
//!
//! Every 16-bit word is printed along with its decoded form.
//!
//! Run with: `cargo run --example basic_usage`

use ad9833::{
    Ad9833Driver, Channel, Command, Config, Mode, RegisterChannel, MAX_SPI_FREQUENCY_HZ, SPI_MODE,
};
use core::convert::Infallible;

/// Mock register channel for demonstration
///
/// In a real application, use `SpiChannel` or `BitBangChannel` with your HAL
#[derive(Default)]
struct TraceChannel {
    sent: usize,
}

impl RegisterChannel for TraceChannel {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        println!("  (transport ready)");
        Ok(())
    }

    fn send_command(&mut self, value: u16) -> Result<(), Self::Error> {
        self.sent += 1;
        println!("  → 0x{:04X}  {}", value, Command::decode(value));
        Ok(())
    }
}

fn main() {
    println!("=== AD9833 Driver Demo ===\n");
    println!(
        "On hardware use SpiChannel: {:?}, SCLK up to {} MHz\n",
        SPI_MODE,
        MAX_SPI_FREQUENCY_HZ / 1_000_000
    );

    let mut driver = Ad9833Driver::new(TraceChannel::default());

    println!("1. Initialize (1 kHz sine, 25 MHz MCLK):");
    driver.initialize(&Config::default()).unwrap();
    println!();

    println!("2. Load 5 kHz into channel 1 while channel 0 plays:");
    driver.set_frequency(Channel::One, 5000.0).unwrap();
    println!(
        "   FREQ1 = {} Hz → register 0x{:07X}",
        driver.frequency(Channel::One),
        driver.frequency_register(Channel::One)
    );
    println!();

    println!("3. Switch the output to channel 1:");
    driver.set_active_frequency_channel(Channel::One).unwrap();
    println!();

    println!("4. Waveforms:");
    for mode in [Mode::Triangle, Mode::Square, Mode::SquareHalf, Mode::Sine] {
        println!("   {:?}", mode);
        driver.set_mode(mode).unwrap();
    }
    println!();

    println!("5. Reprogram both channels under reset:");
    driver.reset(true).unwrap();
    driver.set_frequency(Channel::Zero, 10_000.0).unwrap();
    driver.set_phase(Channel::Zero, 900).unwrap();
    driver.set_frequency(Channel::One, 10_000.0).unwrap();
    driver.set_phase(Channel::One, 2700).unwrap();
    driver.reset(false).unwrap();
    println!(
        "   PHASE0 = {}° → 0x{:03X}, PHASE1 = {}° → 0x{:03X}",
        driver.phase(Channel::Zero) as f64 / 10.0,
        driver.phase_register(Channel::Zero),
        driver.phase(Channel::One) as f64 / 10.0,
        driver.phase_register(Channel::One)
    );
    println!();

    println!("6. Output off:");
    driver.set_mode(Mode::Off).unwrap();
    println!();

    println!("Status: {:?}", driver.status());
    println!("Control word: 0x{:04X}", driver.control_word());

    let channel = driver.release();
    println!("Words sent: {}", channel.sent);
}
