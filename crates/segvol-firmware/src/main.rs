// Firmware of the seven segment volume display: an ATmega32U4 that
// shows a 0-99 volume level on a two digit display, set either from
// a rotary encoder or from a host application through a vendor defined
// HID interface. The host can also drive four status LEDs and pull the
// debug log of the device.

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

mod config;
mod timer;

use core::cell::RefCell;

use atmega_hal::{Peripherals, pins};
use atmega_usbd::UsbBus;
use critical_section::Mutex;
use panic_halt as _;
use segvol_common::{dev_info, dev_warn};
use segvol_core::device::VolumeDevice;
use segvol_core::hid::{GenericHid, GenericHidSettings};
use segvol_core::log::HidLogger;
use segvol_peripheral::encoder::RotaryEncoder;
use segvol_peripheral::leds::LedBank;
use segvol_peripheral::refresh::RefreshTimer;
use segvol_peripheral::seven_seg::{ActiveLow, NumberDisplay};
use usb_device::LangID;
use usb_device::device::StringDescriptors;

use config::*;
use timer::Tc0RefreshTimer;

static LOGGER: HidLogger<LOG_CAPACITY> = HidLogger::new(LOG_LEVEL);
static DISPLAY: Mutex<RefCell<Option<DisplayMux>>> = Mutex::new(RefCell::new(None));

/// Handle to the display multiplexer owned by the refresh interrupt.
/// Every update runs in a critical section, so the interrupt never
/// shows half of a new number.
struct SharedDisplay;

impl NumberDisplay for SharedDisplay {
    fn set_number(&mut self, value: u8) {
        critical_section::with(|cs| {
            if let Some(mux) = DISPLAY.borrow_ref_mut(cs).as_mut() {
                mux.set_number(value);
            }
        })
    }
}

#[avr_device::interrupt(atmega32u4)]
fn TIMER0_COMPA() {
    critical_section::with(|cs| {
        if let Some(mux) = DISPLAY.borrow_ref_mut(cs).as_mut() {
            mux.tick();
        }
    })
}

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();
    let pins = pins!(dp);

    // Disable the clock prescaler, so the core runs at the crystal
    // frequency.
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    // Safety: nothing has logged yet and interrupts are still disabled.
    unsafe { HidLogger::install(&LOGGER) }.unwrap();

    let leds = LedBank::new((
        pins.pd0.into_output(),
        pins.pd1.into_output(),
        pins.pd3.into_output(),
        pins.pd2.into_output(),
    ));

    let mux: DisplayMux = DisplayMux::new(
        (
            pins.pf4.into_output(),
            pins.pf5.into_output(),
            pins.pf6.into_output(),
            pins.pf7.into_output(),
        ),
        ActiveLow(pins.pb5.into_output()),
        ActiveLow(pins.pb4.into_output()),
    );
    critical_section::with(|cs| DISPLAY.borrow(cs).replace(Some(mux)));

    let encoder_a: EncoderA = pins.pb2.into_pull_up_input();
    let encoder_b: EncoderB = pins.pb3.into_pull_up_input();
    let mut encoder = RotaryEncoder::new(
        encoder_a,
        encoder_b,
        atmega_hal::delay::Delay::<CoreClock>::new(),
        ENCODER_MAX,
    )
    .with_settle_millis(ENCODER_SETTLE_MILLIS);

    let mut refresh = Tc0RefreshTimer::new(dp.TC0, REFRESH);
    refresh.start();

    // 16 MHz crystal, prescaled to 8 MHz into the PLL; 96 MHz PLL
    // output, divided by 2 for the 48 MHz USB clock.
    let pll = dp.PLL;
    pll.pllcsr.write(|w| w.pindiv().set_bit());
    pll.pllfrq
        .write(|w| w.pdiv().mhz96().plltm().factor_15().pllusb().set_bit());
    pll.pllcsr.modify(|_, w| w.plle().set_bit());
    while pll.pllcsr.read().plock().bit_is_clear() {}

    let usb_bus = UsbBus::new(dp.USB_DEVICE);
    let strings = [StringDescriptors::new(LangID::EN_US)
        .manufacturer(USB_MANUFACTURER)
        .product(USB_PRODUCT)
        .serial_number(USB_SERIAL_NUMBER)];
    let settings = GenericHidSettings {
        vid_pid: USB_VID_PID,
        string_descriptors: &strings,
        poll_ms: USB_POLL_MS,
    };
    let mut hid = GenericHid::alloc(&usb_bus, &settings).unwrap();

    let mut device = VolumeDevice::new(SharedDisplay, leds, &LOGGER);

    // Safety: every piece of state shared with interrupts is behind a
    // critical section.
    unsafe { avr_device::interrupt::enable() };

    dev_info!("{}", FIRMWARE_BANNER);

    loop {
        if let Err(_e) = device.serve(&mut hid) {
            dev_warn!("{}", _e);
        }

        device.follow_knob(&mut encoder);
    }
}
