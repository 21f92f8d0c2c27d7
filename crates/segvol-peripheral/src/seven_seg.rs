//! Driver for a two digit, multiplexed seven segment display.
//!
//! Both digits share a single data bus, and each one has its own
//! enable line. Only one digit is lit at a time: on every
//! [`SevenSegmentMux::tick`] the driver switches to the other digit,
//! so when ticks happen fast enough (see [`crate::refresh`]) both
//! digits look lit at once.
//!
//! Ticks are meant to be run from a periodic timer interrupt, while
//! [`SevenSegmentMux::set_number`] is called from the main loop. The
//! owner of the driver is responsible for putting it behind a critical
//! section so that a tick never observes a half updated number.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::digital::OutputPin;
use segvol_common::dev_trace;

use crate::gpio::OutputPins;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveDigit {
    Ones,
    Tens,
}

impl ActiveDigit {
    pub const fn next(self) -> Self {
        match self {
            ActiveDigit::Ones => ActiveDigit::Tens,
            ActiveDigit::Tens => ActiveDigit::Ones,
        }
    }
}

/// The number being displayed, split in its two decimal digits, and
/// the digit that will be lit on the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayState {
    latched: u8,
    ones: u8,
    tens: u8,
    active: ActiveDigit,
}

impl DisplayState {
    pub const fn new() -> Self {
        Self {
            latched: 0,
            ones: 0,
            tens: 0,
            active: ActiveDigit::Ones,
        }
    }

    /// Latches a new number. Values over 99 are not rejected: only
    /// their two lowest decimal digits are kept.
    pub fn set_number(&mut self, value: u8) {
        self.latched = value;
        self.ones = value % 10;
        self.tens = (value / 10) % 10;
    }

    /// Latches a byte to be shown in hexadecimal: the high nibble on
    /// the tens digit and the low nibble on the ones digit.
    pub fn set_hex(&mut self, value: u8) {
        self.latched = value;
        self.ones = value & 0x0f;
        self.tens = value >> 4;
    }

    pub const fn latched(&self) -> u8 {
        self.latched
    }

    pub const fn ones(&self) -> u8 {
        self.ones
    }

    pub const fn tens(&self) -> u8 {
        self.tens
    }

    pub const fn active(&self) -> ActiveDigit {
        self.active
    }

    pub const fn digit(&self, which: ActiveDigit) -> u8 {
        match which {
            ActiveDigit::Ones => self.ones,
            ActiveDigit::Tens => self.tens,
        }
    }

    /// Returns the digit that must be lit now along with its value,
    /// and moves on to the other digit.
    pub fn advance(&mut self) -> (ActiveDigit, u8) {
        let current = self.active;
        self.active = current.next();
        (current, self.digit(current))
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates a digit, from 0 to 15, into the bit pattern written on
/// the data bus.
pub trait DigitEncoding {
    fn pattern(digit: u8) -> u8;
}

/// The bus carries the digit in BCD, to be decoded into segments by
/// an external BCD to seven segment decoder. What hex digits over 9
/// look like depends on the decoder; most leave the digit blank.
pub struct Bcd;

impl DigitEncoding for Bcd {
    #[inline(always)]
    fn pattern(digit: u8) -> u8 {
        digit & 0x0f
    }
}

/// The bus drives the segments directly. Bit 0 is segment `a` and bit
/// 6 is segment `g`, lit when high (common cathode).
pub struct SevenSegment;

impl SevenSegment {
    const SEGMENTS: [u8; 16] = [
        0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x6f, // 0-9
        0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71, // A b C d E F
    ];
}

impl DigitEncoding for SevenSegment {
    #[inline(always)]
    fn pattern(digit: u8) -> u8 {
        Self::SEGMENTS[(digit & 0x0f) as usize]
    }
}

/// The enable line of a single digit.
pub trait DigitEnable {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// An enable line that lights its digit when pulled low.
pub struct ActiveLow<P>(pub P);

/// An enable line that lights its digit when driven high.
pub struct ActiveHigh<P>(pub P);

// Pins are infallible, so results are dropped below.
impl<P: OutputPin<Error = Infallible>> DigitEnable for ActiveLow<P> {
    #[inline(always)]
    fn enable(&mut self) {
        let _ = self.0.set_low();
    }

    #[inline(always)]
    fn disable(&mut self) {
        let _ = self.0.set_high();
    }
}

impl<P: OutputPin<Error = Infallible>> DigitEnable for ActiveHigh<P> {
    #[inline(always)]
    fn enable(&mut self) {
        let _ = self.0.set_high();
    }

    #[inline(always)]
    fn disable(&mut self) {
        let _ = self.0.set_low();
    }
}

/// Anything able to show a number to the user.
pub trait NumberDisplay {
    fn set_number(&mut self, value: u8);
}

/// A two digit multiplexed display.
///
/// The definition of the display is completed with the following
/// generics:
///  - `Bus`: the pins of the shared data bus, generally a tuple of
///    output pins. See [`OutputPins`].
///  - `Ones`, `Tens`: the enable lines of each digit, wrapped in
///    [`ActiveLow`] or [`ActiveHigh`] depending on the board wiring.
///  - `E`: how digits are written on the bus, either [`Bcd`] or
///    [`SevenSegment`].
pub struct SevenSegmentMux<Bus, Ones, Tens, E> {
    state: DisplayState,
    bus: Bus,
    ones_enable: Ones,
    tens_enable: Tens,
    _encoding: PhantomData<E>,
}

impl<Bus, Ones, Tens, E> SevenSegmentMux<Bus, Ones, Tens, E>
where
    Bus: OutputPins,
    Ones: DigitEnable,
    Tens: DigitEnable,
    E: DigitEncoding,
{
    /// Takes ownership of the display pins, leaving both digits off
    /// and the bus cleared. Nothing is shown until the first tick.
    pub fn new(mut bus: Bus, mut ones_enable: Ones, mut tens_enable: Tens) -> Self {
        ones_enable.disable();
        tens_enable.disable();
        bus.write_bits(0);

        Self {
            state: DisplayState::new(),
            bus,
            ones_enable,
            tens_enable,
            _encoding: PhantomData,
        }
    }

    /// Latches the number to display. It is shown from the next tick
    /// on.
    pub fn set_number(&mut self, value: u8) {
        self.state.set_number(value);
        dev_trace!("Display set to {} ({}{})", value, self.state.tens(), self.state.ones());
    }

    /// Latches a byte to display in hexadecimal, from `00` to `FF`.
    pub fn set_hex(&mut self, value: u8) {
        self.state.set_hex(value);
        dev_trace!("Display set to {:02X}", value);
    }

    /// Lights the next digit. Both digits are turned off before the
    /// bus changes, and only then the new digit is turned on, so the
    /// two enables are never active at once and no digit ever shows
    /// the other one's value.
    #[inline]
    pub fn tick(&mut self) {
        self.ones_enable.disable();
        self.tens_enable.disable();

        let (digit, value) = self.state.advance();
        self.bus.write_bits(E::pattern(value));

        match digit {
            ActiveDigit::Ones => self.ones_enable.enable(),
            ActiveDigit::Tens => self.tens_enable.enable(),
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Turns the display off and gives the pins back.
    pub fn release(mut self) -> (Bus, Ones, Tens) {
        self.ones_enable.disable();
        self.tens_enable.disable();
        (self.bus, self.ones_enable, self.tens_enable)
    }
}

impl<Bus, Ones, Tens, E> NumberDisplay for SevenSegmentMux<Bus, Ones, Tens, E>
where
    Bus: OutputPins,
    Ones: DigitEnable,
    Tens: DigitEnable,
    E: DigitEncoding,
{
    fn set_number(&mut self, value: u8) {
        SevenSegmentMux::set_number(self, value);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mock::{event_log, EventLog, MockPin};
    use std::vec::Vec;

    type TestMux<E> = SevenSegmentMux<(MockPin, MockPin, MockPin, MockPin), ActiveLow<MockPin>, ActiveLow<MockPin>, E>;

    fn bcd_mux(log: &EventLog) -> TestMux<Bcd> {
        SevenSegmentMux::new(
            (
                MockPin::logged("d0", log),
                MockPin::logged("d1", log),
                MockPin::logged("d2", log),
                MockPin::logged("d3", log),
            ),
            ActiveLow(MockPin::logged("ones", log)),
            ActiveLow(MockPin::logged("tens", log)),
        )
    }

    /// Replays the pin changes caused by a single tick, starting from
    /// both digits off. Checks that both digits are never lit at once
    /// and returns the digit that ended up lit with the bus value it
    /// was lit with. Enables light their digit when low if `active_low`,
    /// when high otherwise.
    fn replay_tick(events: &[(&'static str, bool)], mut bus: u8, active_low: bool) -> (ActiveDigit, u8) {
        let mut ones_lit = false;
        let mut tens_lit = false;
        let mut lit_with = None;

        for (name, high) in events {
            match *name {
                "ones" => ones_lit = *high != active_low,
                "tens" => tens_lit = *high != active_low,
                pin => {
                    let bit = pin[1..].parse::<u8>().unwrap();
                    assert!(!ones_lit && !tens_lit, "Bus changed while a digit was lit");
                    if *high {
                        bus |= 1 << bit;
                    } else {
                        bus &= !(1 << bit);
                    }
                }
            }

            assert!(!(ones_lit && tens_lit), "Both digits lit at once");
            if ones_lit {
                lit_with = Some((ActiveDigit::Ones, bus));
            } else if tens_lit {
                lit_with = Some((ActiveDigit::Tens, bus));
            }
        }

        lit_with.expect("No digit lit after a tick")
    }

    fn tick_and_replay<E: DigitEncoding>(mux: &mut TestMux<E>, log: &EventLog, bus: u8) -> (ActiveDigit, u8) {
        log.borrow_mut().clear();
        mux.tick();
        let events: Vec<_> = log.borrow().clone();
        replay_tick(&events, bus, true)
    }

    #[test]
    fn test_new_turns_everything_off() {
        let log = event_log();
        let mux = bcd_mux(&log);
        let (bus, ones, tens) = mux.release();
        assert!(ones.0.is_high_now());
        assert!(tens.0.is_high_now());
        assert!(!bus.0.is_high_now() && !bus.1.is_high_now() && !bus.2.is_high_now() && !bus.3.is_high_now());
    }

    #[test]
    fn test_set_number_splits_digits() {
        let mut state = DisplayState::new();
        state.set_number(47);
        assert_eq!((state.tens(), state.ones(), state.latched()), (4, 7, 47));
        state.set_number(5);
        assert_eq!((state.tens(), state.ones()), (0, 5));
    }

    #[test]
    fn test_set_number_wraps_out_of_range_values() {
        let mut state = DisplayState::new();
        state.set_number(123);
        assert_eq!((state.tens(), state.ones(), state.latched()), (2, 3, 123));
        state.set_number(255);
        assert_eq!((state.tens(), state.ones()), (5, 5));
    }

    #[test]
    fn test_two_ticks_show_both_digits_for_every_value() {
        let log = event_log();
        let mut mux = bcd_mux(&log);

        for value in 0..=99u8 {
            mux.set_number(value);
            let first = tick_and_replay(&mut mux, &log, 0);
            let second = tick_and_replay(&mut mux, &log, first.1);

            let mut shown = [first, second];
            shown.sort_by_key(|(digit, _)| *digit == ActiveDigit::Tens);
            assert_eq!(shown[0], (ActiveDigit::Ones, value % 10), "value {}", value);
            assert_eq!(shown[1], (ActiveDigit::Tens, (value / 10) % 10), "value {}", value);
        }
    }

    #[test]
    fn test_tick_disables_before_driving_bus() {
        let log = event_log();
        let mut mux = bcd_mux(&log);
        mux.set_number(12);

        log.borrow_mut().clear();
        mux.tick();
        let events = log.borrow().clone();

        // disable-all, then the bus, then a single enable.
        assert_eq!(events[0], ("ones", true));
        assert_eq!(events[1], ("tens", true));
        assert_eq!(events.last(), Some(&("ones", false)));
        assert!(events[2..events.len() - 1].iter().all(|(name, _)| name.starts_with('d')));
    }

    #[test]
    fn test_even_ticks_return_to_starting_digit() {
        let log = event_log();
        let mut mux = bcd_mux(&log);
        let start = mux.state().active();

        for n in 1..=10 {
            mux.tick();
            assert_eq!(mux.state().active() == start, n % 2 == 0);
        }
    }

    #[test]
    fn test_number_change_applies_on_next_tick() {
        let log = event_log();
        let mut mux = bcd_mux(&log);
        mux.set_number(31);
        assert_eq!(tick_and_replay(&mut mux, &log, 0), (ActiveDigit::Ones, 1));

        mux.set_number(58);
        assert_eq!(tick_and_replay(&mut mux, &log, 1), (ActiveDigit::Tens, 5));
        assert_eq!(tick_and_replay(&mut mux, &log, 5), (ActiveDigit::Ones, 8));
    }

    #[test]
    fn test_active_high_enables() {
        let log = event_log();
        let mut mux: SevenSegmentMux<_, _, _, Bcd> = SevenSegmentMux::new(
            (
                MockPin::logged("d0", &log),
                MockPin::logged("d1", &log),
                MockPin::logged("d2", &log),
                MockPin::logged("d3", &log),
            ),
            ActiveHigh(MockPin::logged("ones", &log)),
            ActiveHigh(MockPin::logged("tens", &log)),
        );
        // Both lines are driven low by new.
        assert!(log.borrow().iter().any(|e| *e == ("ones", false)));

        mux.set_number(39);
        log.borrow_mut().clear();
        mux.tick();
        let events = log.borrow().clone();
        assert_eq!(events[0], ("ones", false));
        assert_eq!(events[1], ("tens", false));
        assert_eq!(events.last(), Some(&("ones", true)));
        assert_eq!(replay_tick(&events, 0, false), (ActiveDigit::Ones, 9));

        log.borrow_mut().clear();
        mux.tick();
        let events = log.borrow().clone();
        assert_eq!(events.last(), Some(&("tens", true)));
        assert_eq!(replay_tick(&events, 9, false), (ActiveDigit::Tens, 3));

        let (_, ones, tens) = mux.release();
        // Released displays are turned off.
        assert!(!ones.0.is_high_now());
        assert!(!tens.0.is_high_now());
    }

    #[test]
    fn test_set_hex_splits_nibbles() {
        let mut state = DisplayState::new();
        state.set_hex(0x3c);
        assert_eq!((state.tens(), state.ones(), state.latched()), (3, 12, 0x3c));
        state.set_hex(0xff);
        assert_eq!((state.tens(), state.ones()), (15, 15));
        state.set_hex(0x07);
        assert_eq!((state.tens(), state.ones()), (0, 7));
    }

    #[test]
    fn test_hex_digits_reach_the_bus() {
        let log = event_log();
        let mut mux = bcd_mux(&log);
        mux.set_hex(0xa5);
        assert_eq!(tick_and_replay(&mut mux, &log, 0), (ActiveDigit::Ones, 5));
        assert_eq!(tick_and_replay(&mut mux, &log, 5), (ActiveDigit::Tens, 0x0a));

        // Back to decimal.
        mux.set_number(42);
        assert_eq!(tick_and_replay(&mut mux, &log, 0x0a), (ActiveDigit::Ones, 2));
    }

    #[test]
    fn test_seven_segment_patterns() {
        assert_eq!(SevenSegment::pattern(0), 0b0011_1111);
        assert_eq!(SevenSegment::pattern(1), 0b0000_0110);
        assert_eq!(SevenSegment::pattern(8), 0b0111_1111);
        assert_eq!(SevenSegment::pattern(0x0a), 0b0111_0111);
        assert_eq!(SevenSegment::pattern(0x0f), 0b0111_0001);
        assert_eq!(Bcd::pattern(9), 9);
    }
}
