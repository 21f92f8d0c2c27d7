//! Board definition: pin map and compile time settings of the device.

use atmega_hal::port::mode::{Input, Output, PullUp};
use atmega_hal::port::{PB2, PB3, PB4, PB5, PD0, PD1, PD2, PD3, PF4, PF5, PF6, PF7, Pin};
use log::Level;
use segvol_peripheral::refresh::RefreshConfig;
use segvol_peripheral::seven_seg::{ActiveLow, Bcd, SevenSegmentMux};
use usb_device::device::UsbVidPid;

use crate::timer::TC0_PRESCALERS;

pub type CoreClock = atmega_hal::clock::MHz16;
pub const CPU_HZ: u32 = 16_000_000;

/// BCD bus into the 7 segment decoder, least significant bit first.
pub type DisplayBus = (
    Pin<Output, PF4>,
    Pin<Output, PF5>,
    Pin<Output, PF6>,
    Pin<Output, PF7>,
);
pub type OnesEnable = ActiveLow<Pin<Output, PB5>>;
pub type TensEnable = ActiveLow<Pin<Output, PB4>>;
pub type DisplayMux = SevenSegmentMux<DisplayBus, OnesEnable, TensEnable, Bcd>;

pub type EncoderA = Pin<Input<PullUp>, PB2>;
pub type EncoderB = Pin<Input<PullUp>, PB3>;

/// LED1 to LED4, in order.
pub type LedPins = (
    Pin<Output, PD0>,
    Pin<Output, PD1>,
    Pin<Output, PD3>,
    Pin<Output, PD2>,
);

// TC0 in CTC mode: 16 MHz / 256 / 250 = 250 Hz, 125 Hz per digit.
pub const REFRESH: RefreshConfig = RefreshConfig::new(CPU_HZ, 256, 249);
const _: () = assert!(REFRESH.is_flicker_free(2), "Display refresh rate is too low, digits will flicker");
const _: () = assert!(REFRESH.prescaler_in(&TC0_PRESCALERS), "TC0 has no such prescaler");

pub const ENCODER_MAX: u8 = 99;
pub const ENCODER_SETTLE_MILLIS: u32 = 10;

pub const LOG_CAPACITY: usize = 256;
#[cfg(feature = "trace")]
pub const LOG_LEVEL: Level = Level::Trace;
#[cfg(not(feature = "trace"))]
pub const LOG_LEVEL: Level = Level::Info;

// Arduino Leonardo IDs, which is what the host application looks for.
pub const USB_VID_PID: UsbVidPid = UsbVidPid(0x2341, 0x8036);
pub const USB_MANUFACTURER: &str = "segvol";
pub const USB_PRODUCT: &str = "Seven Segment Volume Display";
pub const USB_SERIAL_NUMBER: &str = "0";
pub const USB_POLL_MS: u8 = 1;

pub const FIRMWARE_BANNER: &str = "Seven Segment Volume Display Firmware Version 1.0 (ATmega32U4)";
