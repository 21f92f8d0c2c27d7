use core::convert::Infallible;

use embedded_hal::digital::{OutputPin, PinState};

// Implements [`OutputPins`] for tuples of pins of different sizes.
macro_rules! output_pins_impl {
    ($($npins:literal),*) => {
        $(
        seq_macro::seq!(N in 0..$npins {
            impl<#(P~N: OutputPin<Error = Infallible>,)*> OutputPins for (#(P~N,)*) {
                const COUNT: u8 = $npins;

                #[inline(always)]
                fn set_state(&mut self, index: u8, state: PinState) {
                    match index {
                        #(
                            // Pins are infallible.
                            N => { let _ = self.N.set_state(state); }
                        )*
                        _ => panic!("Attempt to set state of an output pin out of bounds!")
                    }
                }
            }
        });
        )*
    }
}

/// Represents a set of output pins that are driven together as the
/// bits of a single value, the way a parallel data bus is. Bit `i` of
/// the written value drives the pin at index `i`. Generally
/// implemented by tuples of pins.
pub trait OutputPins {
    const COUNT: u8;

    fn set_state(&mut self, index: u8, state: PinState);

    /// Drives every pin in the set with its bit of `bits`. Bits past
    /// [`Self::COUNT`] are ignored.
    fn write_bits(&mut self, bits: u8) {
        for index in 0..Self::COUNT {
            self.set_state(index, PinState::from(bits & (1 << index) != 0));
        }
    }
}

// 4 pins for a BCD bus or the LED bank, 7 and 8 for a direct segment
// bus with or without the decimal point.
output_pins_impl!(4, 7, 8);
