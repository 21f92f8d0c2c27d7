use atmega_hal::pac::TC0;
use segvol_peripheral::refresh::{RefreshConfig, RefreshTimer};

/// Clock dividers timer 0 can run from.
pub const TC0_PRESCALERS: [u16; 5] = [1, 8, 64, 256, 1024];

/// 8 bit timer 0 in clear-on-compare mode, firing `TIMER0_COMPA` at
/// the rate given by its [`RefreshConfig`].
pub struct Tc0RefreshTimer {
    tc0: TC0,
    config: RefreshConfig,
}

impl Tc0RefreshTimer {
    /// `config` must use one of [`TC0_PRESCALERS`].
    pub fn new(tc0: TC0, config: RefreshConfig) -> Self {
        Self { tc0, config }
    }
}

impl RefreshTimer for Tc0RefreshTimer {
    fn start(&mut self) {
        self.tc0.tccr0a.write(|w| w.wgm0().ctc());
        self.tc0.ocr0a.write(|w| unsafe { w.bits(self.config.compare) });
        self.tc0.tccr0b.write(|w| match self.config.prescaler {
            1 => w.cs0().direct(),
            8 => w.cs0().prescale_8(),
            64 => w.cs0().prescale_64(),
            256 => w.cs0().prescale_256(),
            1024 => w.cs0().prescale_1024(),
            // Ruled out at compile time in the board config.
            _ => unreachable!(),
        });
        self.tc0.timsk0.write(|w| w.ocie0a().set_bit());
    }

    fn stop(&mut self) {
        self.tc0.timsk0.write(|w| w.ocie0a().clear_bit());
        self.tc0.tccr0b.write(|w| w.cs0().no_clock());
    }
}
