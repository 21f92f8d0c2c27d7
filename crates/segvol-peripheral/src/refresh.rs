//! Timing of the periodic interrupt that multiplexes the display.

/// Minimum rate at which each digit must be lit so the eye doesn't
/// perceive any flicker.
pub const MIN_DIGIT_REFRESH_HZ: u32 = 40;

/// Parameters of a timer running in clear-on-compare mode, which
/// interrupts once every `compare + 1` ticks of the prescaled clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshConfig {
    pub cpu_hz: u32,
    pub prescaler: u16,
    pub compare: u8,
}

impl RefreshConfig {
    pub const fn new(cpu_hz: u32, prescaler: u16, compare: u8) -> Self {
        Self {
            cpu_hz,
            prescaler,
            compare,
        }
    }

    /// Rate of the timer interrupt, that is, of [`crate::seven_seg::SevenSegmentMux::tick`].
    pub const fn tick_hz(&self) -> u32 {
        self.cpu_hz / self.prescaler as u32 / (self.compare as u32 + 1)
    }

    /// Rate at which each of the `digits` is lit.
    pub const fn digit_hz(&self, digits: u32) -> u32 {
        self.tick_hz() / digits
    }

    pub const fn is_flicker_free(&self, digits: u32) -> bool {
        self.digit_hz(digits) > MIN_DIGIT_REFRESH_HZ
    }

    /// Whether the prescaler is one of those a given timer can be
    /// clocked with.
    pub const fn prescaler_in(&self, supported: &[u16]) -> bool {
        let mut i = 0;
        while i < supported.len() {
            if supported[i] == self.prescaler {
                return true;
            }
            i += 1;
        }
        false
    }
}

/// A hardware timer that periodically fires the interrupt that refreshes
/// the display.
pub trait RefreshTimer {
    /// Configures the timer and unmasks its interrupt. Interrupts still
    /// need to be globally enabled for the refresh to start.
    fn start(&mut self);

    fn stop(&mut self);
}
