//! Software mirror of the AD9833's write-only registers

use crate::control::{Channel, ControlRegister, Mode};
use crate::frequency::ReferenceClock;

/// Coarse device state as seen through the control register.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// `initialize()` has not run yet.
    #[default]
    Uninitialized,
    /// Reset released; the chip is generating output.
    Active,
    /// RESET is held high by `reset(true)`.
    ResetHeld,
}

/// Last requested and encoded settings of one frequency/phase register pair.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSettings {
    pub(crate) frequency_hz: f64,
    pub(crate) frequency_register: u32,
    pub(crate) phase: u16,
    pub(crate) phase_register: u16,
}

impl ChannelSettings {
    /// Requested frequency in Hz.
    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Encoded frequency register value, as computed with the reference
    /// clock active at the time of the write.
    pub fn frequency_register(&self) -> u32 {
        self.frequency_register
    }

    /// Requested phase in tenths of a degree.
    pub fn phase(&self) -> u16 {
        self.phase
    }

    /// Encoded 12-bit phase register value.
    pub fn phase_register(&self) -> u16 {
        self.phase_register
    }
}

/// Everything the driver knows about the chip.
///
/// Nothing here is read from hardware; it records what was last written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceState {
    pub(crate) control: ControlRegister,
    pub(crate) channels: [ChannelSettings; 2],
    pub(crate) reference_clock: ReferenceClock,
    pub(crate) mode: Mode,
    pub(crate) status: Status,
}

impl DeviceState {
    /// Control register image.
    pub fn control(&self) -> &ControlRegister {
        &self.control
    }

    /// Settings of `channel`.
    pub fn channel(&self, channel: Channel) -> &ChannelSettings {
        &self.channels[channel.index()]
    }

    /// Reference clock used for subsequent frequency encodings.
    pub fn reference_clock(&self) -> ReferenceClock {
        self.reference_clock
    }

    /// Last mode passed to `set_mode`.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Coarse device state.
    pub fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSettings {
        &mut self.channels[channel.index()]
    }
}
