//! A polled rotary encoder decoder.
//!
//! This is not a full quadrature state machine. The decoder waits for
//! either line to go low, lets the contacts settle for a fixed time and
//! then looks at which lines are low: line A low counts up, line B low
//! counts down (both may happen on the same edge). A gate then blocks
//! any further counting until both lines are back high, so that a
//! single detent is counted once no matter how long the contacts
//! bounce. Good enough for a hand turned volume knob, not for fast
//! rotation.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use segvol_common::dev_trace;

/// Time given to the encoder contacts to settle after an edge.
pub const DEFAULT_SETTLE_MILLIS: u32 = 10;

/// A counter clamped to `[0, max]`, plus the gate that keeps a single
/// detent from being counted more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderState {
    count: u8,
    max: u8,
    gate_closed: bool,
}

impl EncoderState {
    pub const fn new(max: u8) -> Self {
        Self {
            count: 0,
            max,
            gate_closed: false,
        }
    }

    pub const fn count(&self) -> u8 {
        self.count
    }

    pub const fn max(&self) -> u8 {
        self.max
    }

    pub const fn is_gate_closed(&self) -> bool {
        self.gate_closed
    }

    /// Closes the gate and applies an edge, given which lines were low
    /// once the contacts settled. Counting stops at the rails.
    pub fn on_edge(&mut self, a_low: bool, b_low: bool) {
        self.gate_closed = true;

        if a_low && self.count < self.max {
            self.count += 1;
        }

        if b_low && self.count > 0 {
            self.count -= 1;
        }
    }

    /// Moves the counter to `count`, clamped to the max. The gate is
    /// left as is.
    pub fn set_count(&mut self, count: u8) {
        self.count = count.min(self.max);
    }

    /// Re-opens the gate. Must only be called with both lines high.
    pub fn release(&mut self) {
        self.gate_closed = false;
    }
}

/// A knob the user turns to pick a value, which the device may also
/// move on its own.
pub trait Knob {
    fn count(&self) -> u8;
    fn set_count(&mut self, count: u8);
    /// Polls the knob, returning its count after any movement.
    fn sample(&mut self) -> u8;
}

/// A rotary encoder wired to two input pins, whose count goes from 0
/// to a given max. Both pins are expected to be already configured as
/// inputs with their pull-up resistor enabled, so that the lines rest
/// high and the encoder pulls them low.
pub struct RotaryEncoder<A, B, D> {
    a: A,
    b: B,
    delay: D,
    settle_millis: u32,
    state: EncoderState,
}

impl<A, B, D> RotaryEncoder<A, B, D>
where
    A: InputPin<Error = Infallible>,
    B: InputPin<Error = Infallible>,
    D: DelayNs,
{
    pub fn new(a: A, b: B, delay: D, max: u8) -> Self {
        Self {
            a,
            b,
            delay,
            settle_millis: DEFAULT_SETTLE_MILLIS,
            state: EncoderState::new(max),
        }
    }

    pub fn with_settle_millis(mut self, millis: u32) -> Self {
        self.settle_millis = millis;
        self
    }

    #[inline(always)]
    fn lines_low(&mut self) -> (bool, bool) {
        // Pins are infallible.
        (
            self.a.is_low().unwrap_or(false),
            self.b.is_low().unwrap_or(false),
        )
    }

    /// Polls the encoder lines and returns the updated count. Meant to
    /// be called on every iteration of the main loop.
    ///
    /// When an edge is found, this blocks for the settle time.
    pub fn sample(&mut self) -> u8 {
        if !self.state.is_gate_closed() {
            let (a_low, b_low) = self.lines_low();
            if a_low || b_low {
                self.delay.delay_ms(self.settle_millis);
                let (a_low, b_low) = self.lines_low();
                self.state.on_edge(a_low, b_low);
                dev_trace!("Encoder edge (a: {}, b: {}). Count: {}", a_low, b_low, self.state.count());
            }
        }

        // Wait for the shaft to rest between detents before counting
        // again.
        if self.lines_low() == (false, false) {
            self.state.release();
        }

        self.state.count()
    }

    pub fn count(&self) -> u8 {
        self.state.count()
    }

    pub fn state(&self) -> &EncoderState {
        &self.state
    }

    pub fn release(self) -> (A, B, D) {
        (self.a, self.b, self.delay)
    }
}

impl<A, B, D> Knob for RotaryEncoder<A, B, D>
where
    A: InputPin<Error = Infallible>,
    B: InputPin<Error = Infallible>,
    D: DelayNs,
{
    fn count(&self) -> u8 {
        self.state.count()
    }

    fn set_count(&mut self, count: u8) {
        self.state.set_count(count);
    }

    fn sample(&mut self) -> u8 {
        RotaryEncoder::sample(self)
    }
}
