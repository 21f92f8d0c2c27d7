use bitflags::bitflags;

use crate::gpio::OutputPins;

bitflags! {
    /// The status LEDs of the board. Bit `i` maps to the LED at index
    /// `i` of the bank.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct LedMask: u8 {
        const LED1 = 1 << 0;
        const LED2 = 1 << 1;
        const LED3 = 1 << 2;
        const LED4 = 1 << 3;
    }
}

impl LedMask {
    /// Returns the mask of the LED at the given zero-based index, or
    /// an empty mask if there is no such LED.
    pub const fn led(index: u8) -> LedMask {
        if index < 4 {
            LedMask::from_bits_truncate(1 << index)
        } else {
            LedMask::empty()
        }
    }

    /// Builds a mask from one flag per LED, in LED order.
    pub fn from_flags(flags: [bool; 4]) -> LedMask {
        flags
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(LedMask::empty(), |mask, (i, _)| mask | LedMask::led(i as u8))
    }

    /// The inverse of [`LedMask::from_flags`].
    pub fn to_flags(self) -> [bool; 4] {
        let mut flags = [false; 4];
        for (i, flag) in flags.iter_mut().enumerate() {
            *flag = self.contains(LedMask::led(i as u8));
        }
        flags
    }
}

/// A set of on/off indicators the device exposes to the host.
pub trait StatusLeds {
    fn set(&mut self, mask: LedMask);
    fn state(&self) -> LedMask;

    fn turn_on(&mut self, mask: LedMask) {
        self.set(self.state() | mask);
    }

    fn turn_off(&mut self, mask: LedMask) {
        self.set(self.state() - mask);
    }
}

/// LEDs wired active-high to a set of output pins.
pub struct LedBank<P> {
    pins: P,
    state: LedMask,
}

impl<P: OutputPins> LedBank<P> {
    pub fn new(pins: P) -> Self {
        let mut bank = Self {
            pins,
            state: LedMask::empty(),
        };
        bank.pins.write_bits(0);
        bank
    }

    pub fn release(self) -> P {
        self.pins
    }
}

impl<P: OutputPins> StatusLeds for LedBank<P> {
    fn set(&mut self, mask: LedMask) {
        self.state = mask;
        self.pins.write_bits(mask.bits());
    }

    fn state(&self) -> LedMask {
        self.state
    }
}
