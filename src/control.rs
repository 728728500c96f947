//! Control register image and 16-bit command words
//!
//! Every write to the AD9833 is one 16-bit word whose top bits select the
//! destination:
//!
//! | D15 | D14 | D13 | Destination |
//! |-----|-----|-----|-------------|
//! | 0 | 0 | x | Control |
//! | 0 | 1 | x | FREQ0 (one 14-bit half) |
//! | 1 | 0 | x | FREQ1 (one 14-bit half) |
//! | 1 | 1 | 0 | PHASE0 |
//! | 1 | 1 | 1 | PHASE1 |

use core::fmt;

use crate::field_sets;

/// One of the two frequency/phase register pairs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// FREQ0 / PHASE0
    Zero,
    /// FREQ1 / PHASE1
    One,
}

impl Channel {
    /// Both channels, in register order.
    pub const ALL: [Channel; 2] = [Channel::Zero, Channel::One];

    /// Array index of this channel.
    pub const fn index(self) -> usize {
        match self {
            Channel::Zero => 0,
            Channel::One => 1,
        }
    }

    /// Address bits D15:D14 of this channel's frequency register.
    pub const fn frequency_address(self) -> u8 {
        match self {
            Channel::Zero => 0b01,
            Channel::One => 0b10,
        }
    }

    /// Address bits D15:D13 of this channel's phase register.
    pub const fn phase_address(self) -> u8 {
        match self {
            Channel::Zero => 0b110,
            Channel::One => 0b111,
        }
    }

    fn from_bit(set: bool) -> Self {
        if set {
            Channel::One
        } else {
            Channel::Zero
        }
    }
}

/// Output waveform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// MCLK stopped and DAC powered down.
    #[default]
    Off,
    /// Sine wave at the selected frequency.
    Sine,
    /// Square wave at the selected frequency (DAC MSB).
    Square,
    /// Square wave at half the selected frequency (DAC MSB/2).
    SquareHalf,
    /// Triangle wave at the selected frequency.
    Triangle,
}

/// Software image of the write-only control register.
///
/// The chip cannot be read back, so this is the driver's record of what was
/// last written. Bit positions come from the generated `Control` register;
/// address bits (D15:D14) and unused bits (D9, D4, D2, D0) have no field and
/// always serialize as zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRegister {
    /// B28: load a 28-bit frequency as two consecutive 14-bit writes
    pub word_mode: bool,
    /// HLB: select MSB or LSB half when B28 is clear
    pub half_word_load: bool,
    /// FSELECT: FREQ1 feeds the phase accumulator
    pub frequency_select: bool,
    /// PSELECT: PHASE1 feeds the phase adder
    pub phase_select: bool,
    /// RESET: internal registers held at zero (midscale output)
    pub reset: bool,
    /// SLEEP1: MCLK disabled
    pub clock_sleep: bool,
    /// SLEEP12: DAC powered down
    pub dac_sleep: bool,
    /// OPBITEN: DAC MSB routed to VOUT
    pub output_bit_enable: bool,
    /// DIV2: MSB itself rather than MSB/2 (only with OPBITEN)
    pub divide_by_two: bool,
    /// MODE: sine ROM bypassed for a triangle output
    pub triangle: bool,
}

impl From<ControlRegister> for field_sets::Control {
    fn from(ctl: ControlRegister) -> Self {
        let mut reg = field_sets::Control::new_zero();
        reg.set_word_mode(ctl.word_mode);
        reg.set_half_word_load(ctl.half_word_load);
        reg.set_frequency_select(ctl.frequency_select);
        reg.set_phase_select(ctl.phase_select);
        reg.set_reset(ctl.reset);
        reg.set_clock_sleep(ctl.clock_sleep);
        reg.set_dac_sleep(ctl.dac_sleep);
        reg.set_output_bit_enable(ctl.output_bit_enable);
        reg.set_divide_by_two(ctl.divide_by_two);
        reg.set_triangle(ctl.triangle);
        reg
    }
}

impl From<field_sets::Control> for ControlRegister {
    fn from(reg: field_sets::Control) -> Self {
        ControlRegister {
            word_mode: reg.word_mode(),
            half_word_load: reg.half_word_load(),
            frequency_select: reg.frequency_select(),
            phase_select: reg.phase_select(),
            reset: reg.reset(),
            clock_sleep: reg.clock_sleep(),
            dac_sleep: reg.dac_sleep(),
            output_bit_enable: reg.output_bit_enable(),
            divide_by_two: reg.divide_by_two(),
            triangle: reg.triangle(),
        }
    }
}

impl ControlRegister {
    /// Serialize into the 16-bit control word, exactly as it is sent.
    pub fn bits(&self) -> u16 {
        u16::from_be_bytes(field_sets::Control::from(*self).into())
    }

    /// Parse a control word. Address and unused bits are ignored.
    pub fn from_bits(bits: u16) -> Self {
        field_sets::Control::from(bits.to_be_bytes()).into()
    }

    /// Channel currently feeding the phase accumulator.
    pub fn frequency_channel(&self) -> Channel {
        Channel::from_bit(self.frequency_select)
    }

    /// Channel currently feeding the phase adder.
    pub fn phase_channel(&self) -> Channel {
        Channel::from_bit(self.phase_select)
    }

    /// Apply the output-stage flags for `mode`.
    ///
    /// DIV2 is cleared for every non-square mode; it has no effect unless
    /// OPBITEN is set.
    pub fn apply_mode(&mut self, mode: Mode) {
        let (opbiten, div2, triangle, sleep) = match mode {
            Mode::Off => (false, false, false, true),
            Mode::Sine => (false, false, false, false),
            Mode::Square => (true, true, false, false),
            Mode::SquareHalf => (true, false, false, false),
            Mode::Triangle => (false, false, true, false),
        };
        self.output_bit_enable = opbiten;
        self.divide_by_two = div2;
        self.triangle = triangle;
        self.clock_sleep = sleep;
        self.dac_sleep = sleep;
    }
}

/// A decoded 16-bit command word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Control register write.
    Control(ControlRegister),
    /// One 14-bit half of a frequency register.
    Frequency {
        /// Target register
        channel: Channel,
        /// D13:D0
        value: u16,
    },
    /// Phase register write.
    Phase {
        /// Target register
        channel: Channel,
        /// D11:D0
        value: u16,
    },
}

impl Command {
    /// Classify `word` by its address bits.
    ///
    /// ```
    /// use ad9833::{Channel, Command};
    ///
    /// assert_eq!(
    ///     Command::decode(0x8003),
    ///     Command::Frequency { channel: Channel::One, value: 3 },
    /// );
    /// ```
    pub fn decode(word: u16) -> Self {
        let bytes = word.to_be_bytes();
        match word >> 14 {
            0b00 => Command::Control(ControlRegister::from_bits(word)),
            0b01 | 0b10 => {
                let frame = field_sets::FrequencyWord::from(bytes);
                Command::Frequency {
                    channel: Channel::from_bit(
                        frame.destination() == Channel::One.frequency_address(),
                    ),
                    value: frame.value(),
                }
            }
            _ => {
                let frame = field_sets::PhaseWord::from(bytes);
                Command::Phase {
                    channel: Channel::from_bit(frame.destination() == Channel::One.phase_address()),
                    value: frame.value(),
                }
            }
        }
    }

    /// The 16-bit word carrying this command.
    pub fn word(&self) -> u16 {
        match *self {
            Command::Control(ctl) => ctl.bits(),
            Command::Frequency { channel, value } => {
                let mut frame = field_sets::FrequencyWord::new_zero();
                frame.set_value(value);
                frame.set_destination(channel.frequency_address());
                u16::from_be_bytes(frame.into())
            }
            Command::Phase { channel, value } => {
                let mut frame = field_sets::PhaseWord::new_zero();
                frame.set_value(value);
                frame.set_destination(channel.phase_address());
                u16::from_be_bytes(frame.into())
            }
        }
    }

    /// Whether `word` has bits set outside the fields of its destination.
    pub fn has_stray_bits(word: u16) -> bool {
        Command::decode(word).word() != word
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Control(ctl) => {
                f.write_str("CTL")?;
                let flags = [
                    (ctl.word_mode, "B28"),
                    (ctl.half_word_load, "HLB"),
                    (ctl.frequency_select, "FSL"),
                    (ctl.phase_select, "PSL"),
                    (ctl.reset, "RST"),
                    (ctl.clock_sleep, "SL1"),
                    (ctl.dac_sleep, "SL2"),
                    (ctl.output_bit_enable, "OPB"),
                    (ctl.divide_by_two, "DIV"),
                    (ctl.triangle, "MOD"),
                ];
                for (set, name) in flags {
                    f.write_str(if set { " " } else { " ---" })?;
                    if set {
                        f.write_str(name)?;
                    }
                }
                Ok(())
            }
            Command::Frequency { channel, value } => {
                write!(f, "FQ{} 0x{:04X}", channel.index(), value)
            }
            Command::Phase { channel, value } => {
                write!(f, "PH{} 0x{:03X}", channel.index(), value)
            }
        }
    }
}
