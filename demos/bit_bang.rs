//! Bit-banged transport example - BitBangChannel on three mock GPIOs
//!
//! This example demonstrates the `BitBangChannel` transport which:
//! - Owns the SDATA, SCLK and FSYNC pins
//! - Idles SCLK high (SPI mode 2) and frames each word with FSYNC
//! - Shifts 16 bits MSB first, data sampled on the falling SCLK edge
//!
//! The pins record their levels; the SDATA level at each falling SCLK edge is
//! reassembled into the word the chip would latch.
//!
//! Run with: `cargo run --example bit_bang`

use std::cell::RefCell;
use std::rc::Rc;

use ad9833::{Ad9833Driver, BitBangChannel, Channel, Command, Config};
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};

/// Shared view of the three lines, as a logic analyser would see them
#[derive(Default)]
struct Bus {
    data: bool,
    clk: bool,
    selected: bool,
    shift: u16,
    bits: u8,
    latched: Vec<u16>,
}

#[derive(Clone, Copy)]
enum Line {
    Data,
    Clock,
    Fsync,
}

/// Mock GPIO pin
///
/// In a real application, use your platform's GPIO implementation
struct MockPin {
    line: Line,
    bus: Rc<RefCell<Bus>>,
}

impl MockPin {
    fn set(&mut self, high: bool) {
        let mut bus = self.bus.borrow_mut();
        match self.line {
            Line::Data => bus.data = high,
            Line::Clock => {
                if bus.selected && bus.clk && !high {
                    bus.shift = (bus.shift << 1) | bus.data as u16;
                    bus.bits += 1;
                }
                bus.clk = high;
            }
            Line::Fsync => {
                if !high {
                    bus.selected = true;
                    bus.shift = 0;
                    bus.bits = 0;
                } else if bus.selected {
                    bus.selected = false;
                    assert_eq!(bus.bits, 16, "incomplete frame");
                    let word = bus.shift;
                    bus.latched.push(word);
                }
            }
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

fn main() {
    println!("=== AD9833 Bit-Bang Demo ===\n");

    let bus = Rc::new(RefCell::new(Bus::default()));
    let pin = |line| MockPin {
        line,
        bus: Rc::clone(&bus),
    };

    let channel = BitBangChannel::new(pin(Line::Data), pin(Line::Clock), pin(Line::Fsync));
    let mut driver = Ad9833Driver::new(channel);

    driver.initialize(&Config::default()).unwrap();
    driver.set_frequency(Channel::One, 5000.0).unwrap();
    driver.set_phase(Channel::One, 1800).unwrap();
    driver.set_active_frequency_channel(Channel::One).unwrap();

    println!("Words latched by the chip:");
    for word in &bus.borrow().latched {
        println!("  0x{:04X}  {}", word, Command::decode(*word));
    }
    println!("\nControl word mirror: 0x{:04X}", driver.control_word());
}
