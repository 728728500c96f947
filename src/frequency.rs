//! Frequency and phase encoding for the AD9833
//!
//! This module converts physical units into the fixed-point values held by the
//! chip's frequency and phase registers. Everything here is pure; nothing is
//! written to the device.

/// Full-scale value of the 28-bit phase accumulator (2^28).
pub const FREQUENCY_SCALE: f64 = 268_435_456.0;

/// Mask for one 14-bit half of a frequency register.
pub const FREQUENCY_HALF_MASK: u32 = 0x3FFF;

/// Mask for the 12-bit phase register.
pub const PHASE_MASK: u16 = 0x0FFF;

/// Master clock (MCLK) frequency in Hz.
///
/// Used as the denominator when encoding frequencies:
/// ```text
/// FREQREG = f_OUT × 2^28 / f_MCLK
/// ```
///
/// A reference clock is always finite and strictly positive, so encoding with
/// it can never divide by zero.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReferenceClock(f64);

impl ReferenceClock {
    /// The 25 MHz crystal fitted to most AD9833 modules.
    pub const NOMINAL: ReferenceClock = ReferenceClock(25_000_000.0);

    /// Create a reference clock of `hz`.
    ///
    /// Returns `None` for zero, negative or non-finite values.
    ///
    /// # Example
    ///
    /// ```
    /// use ad9833::ReferenceClock;
    ///
    /// assert!(ReferenceClock::new(16_000_000.0).is_some());
    /// assert!(ReferenceClock::new(0.0).is_none());
    /// ```
    pub fn new(hz: f64) -> Option<Self> {
        if hz.is_finite() && hz > 0.0 {
            Some(ReferenceClock(hz))
        } else {
            None
        }
    }

    /// Clock frequency in Hz.
    pub fn hz(&self) -> f64 {
        self.0
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        ReferenceClock::NOMINAL
    }
}

/// Encode an output frequency into the 28-bit frequency register value.
///
/// Rounds half-up. The result is not masked: frequencies at or above the
/// reference clock produce values wider than 28 bits, and negative or NaN
/// frequencies saturate to 0.
///
/// # Example
///
/// ```
/// use ad9833::{encode_frequency, ReferenceClock};
///
/// // 1 kHz from a 25 MHz clock: 1000 × 2^28 / 25e6 = 10737.418...
/// assert_eq!(encode_frequency(1000.0, ReferenceClock::NOMINAL), 10737);
/// ```
pub fn encode_frequency(freq_hz: f64, clock: ReferenceClock) -> u32 {
    (freq_hz * FREQUENCY_SCALE / clock.hz() + 0.5) as u32
}

/// Encode a phase given in tenths of a degree into the 12-bit phase register value.
///
/// One register step is 360° / 4096. The full circle wraps, so 3600 encodes
/// to the same value as 0.
///
/// # Example
///
/// ```
/// use ad9833::encode_phase;
///
/// assert_eq!(encode_phase(900), 1024); // 90°
/// assert_eq!(encode_phase(3600), 0);
/// ```
pub fn encode_phase(tenths_of_degree: u16) -> u16 {
    // 4096 steps per 360°, i.e. 512 per 45°
    let raw = (512.0 * (tenths_of_degree as f64 / 10.0) / 45.0 + 0.5) as u32;
    (raw as u16) & PHASE_MASK
}

/// Split an encoded frequency into its (low, high) 14-bit halves.
pub fn split_frequency(encoded: u32) -> (u16, u16) {
    let low = (encoded & FREQUENCY_HALF_MASK) as u16;
    let high = ((encoded >> 14) & FREQUENCY_HALF_MASK) as u16;
    (low, high)
}
