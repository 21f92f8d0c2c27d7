use core::fmt::Display;

use heapless::Deque;
use segvol_common::{dev_debug, dev_info, dev_trace};
use usb_device::{
    bus::{UsbBus, UsbBusAllocator},
    device::{StringDescriptors, UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid},
    prelude::BuilderError,
};
use usbd_hid::{
    UsbError,
    hid_class::{HIDClass, HidClassSettings, HidProtocol, HidSubClass},
};

use crate::report::{GENERIC_REPORT_DESCRIPTOR, REPORT_SIZE, Report};

#[derive(Debug)]
pub enum HidSetupError {
    Builder(BuilderError),
}

impl From<BuilderError> for HidSetupError {
    fn from(value: BuilderError) -> Self {
        Self::Builder(value)
    }
}

impl Display for HidSetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HidSetupError::Builder(e) => write!(f, "Usb device setup error: {:?}", e),
        }
    }
}

#[derive(Debug)]
pub enum HidPollError {
    Usb(UsbError),
}

impl From<UsbError> for HidPollError {
    fn from(value: UsbError) -> Self {
        Self::Usb(value)
    }
}

impl Display for HidPollError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HidPollError::Usb(usb_error) => write!(f, "Usb error: {:?}", usb_error),
        }
    }
}

pub struct GenericHidSettings<'s, 'b> {
    pub vid_pid: UsbVidPid,
    pub string_descriptors: &'s [StringDescriptors<'b>],
    pub poll_ms: u8,
}

/// A link that exchanges fixed size reports with the host. Whatever USB
/// implementation or endpoints it uses under the hood is
/// implementation-specific.
pub trait HidTransport {
    /// Services the link and returns the next report sent by the host,
    /// if any. Must be called often; on USB, at least every 10 ms.
    fn poll(&mut self) -> Result<Option<Report>, HidPollError>;

    /// Queues a report for the host. A report the link can't take right
    /// away is kept and retried on the next polls; only the latest such
    /// report is kept.
    fn send(&mut self, report: &Report) -> Result<(), HidPollError>;
}

/// Returns the line logged when the device moves from `prev` to `next`.
///
/// The bus has no way to tell a cable being unplugged from a host going
/// to sleep, so an unplugged device first shows up as suspended, and as
/// disconnected once a bus reset drops its configuration.
pub fn state_change_message(prev: UsbDeviceState, next: UsbDeviceState) -> Option<&'static str> {
    if prev == next {
        return None;
    }

    match next {
        UsbDeviceState::Addressed => Some("USB Device enumerating"),
        UsbDeviceState::Configured => Some("USB Device configured"),
        UsbDeviceState::Suspend => Some("USB Device suspended"),
        UsbDeviceState::Default => Some("USB Device disconnected"),
    }
}

// One slot per inbound source: the interrupt OUT endpoint and
// SET_REPORT.
const INBOUND_DEPTH: usize = 2;

/// Queues the report read by one of the pulls of the HID class, if it
/// read any. The queue must have room for it.
fn queue_pulled(
    inbound: &mut Deque<Report, INBOUND_DEPTH>,
    buf: &[u8],
    pulled: Result<usize, UsbError>,
) -> Result<(), HidPollError> {
    match pulled {
        Ok(len) => {
            let report = Report::from_slice(&buf[..len.min(buf.len())]);
            if inbound.push_back(report).is_err() {
                dev_debug!("Inbound report queue full, report dropped");
            }
            Ok(())
        }
        Err(UsbError::WouldBlock) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// A vendor defined HID interface with one input and one output report
/// of [`REPORT_SIZE`] bytes. The host may send reports both through
/// the interrupt OUT endpoint and through SET_REPORT requests on the
/// control pipe; both are handled the same way.
pub struct GenericHid<'a, B: UsbBus> {
    usb_dev: UsbDevice<'a, B>,
    hid: HIDClass<'a, B>,
    state: UsbDeviceState,
    pending: Option<Report>,
    inbound: Deque<Report, INBOUND_DEPTH>,
}

impl<'a, B: UsbBus> GenericHid<'a, B> {
    pub fn alloc<'s>(
        allocator: &'a UsbBusAllocator<B>,
        settings: &'s GenericHidSettings<'s, 'a>,
    ) -> Result<Self, HidSetupError> {
        let mut hid_settings = HidClassSettings::default();
        hid_settings.protocol = HidProtocol::Generic;
        hid_settings.subclass = HidSubClass::NoSubClass;

        let hid = HIDClass::new_with_settings(allocator, &GENERIC_REPORT_DESCRIPTOR, settings.poll_ms, hid_settings);
        let usb_dev = UsbDeviceBuilder::new(allocator, UsbVidPid(settings.vid_pid.0, settings.vid_pid.1))
            .strings(settings.string_descriptors)?
            .max_packet_size_0(64)?
            .build();

        Ok(Self {
            usb_dev,
            hid,
            state: UsbDeviceState::Default,
            pending: None,
            inbound: Deque::new(),
        })
    }

    fn update_state(&mut self) {
        let next = self.usb_dev.state();
        if let Some(_msg) = state_change_message(self.state, next) {
            dev_info!("{}", _msg);
        }
        self.state = next;
    }

    fn flush_pending(&mut self) -> Result<(), HidPollError> {
        if let Some(report) = self.pending {
            match self.hid.push_raw_input(report.bytes()) {
                Ok(_) => {
                    dev_trace!("Pending report sent");
                    self.pending = None;
                }
                Err(UsbError::WouldBlock) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Reads whatever the host sent through both the OUT endpoint and
    /// SET_REPORT, as both may have arrived on the same poll. A source
    /// is left unread while the queue is full; its data stays in the
    /// HID class until the next poll.
    fn pull_reports(&mut self) -> Result<(), HidPollError> {
        let mut buf = [0u8; REPORT_SIZE];

        if !self.inbound.is_full() {
            let pulled = self.hid.pull_raw_output(&mut buf);
            if let Ok(_len) = &pulled {
                dev_trace!("Received output report. Len: {}", _len);
            }
            queue_pulled(&mut self.inbound, &buf, pulled)?;
        }

        if !self.inbound.is_full() {
            let pulled = self.hid.pull_raw_report(&mut buf).map(|info| {
                dev_debug!("Received report: {:?} {}", info.report_type, info.report_id);
                info.len
            });
            queue_pulled(&mut self.inbound, &buf, pulled)?;
        }

        Ok(())
    }
}

impl<'a, B: UsbBus> HidTransport for GenericHid<'a, B> {
    fn poll(&mut self) -> Result<Option<Report>, HidPollError> {
        self.flush_pending()?;

        let has_data = self.usb_dev.poll(&mut [&mut self.hid]);
        self.update_state();

        if has_data {
            self.pull_reports()?;
        }
        Ok(self.inbound.pop_front())
    }

    fn send(&mut self, report: &Report) -> Result<(), HidPollError> {
        match self.hid.push_raw_input(report.bytes()) {
            Ok(_) => Ok(()),
            Err(UsbError::WouldBlock) => {
                self.pending = Some(*report);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_state_change_messages() {
        use UsbDeviceState::*;

        assert_eq!(state_change_message(Default, Default), None);
        assert_eq!(state_change_message(Default, Addressed), Some("USB Device enumerating"));
        assert_eq!(state_change_message(Addressed, Configured), Some("USB Device configured"));
        assert_eq!(state_change_message(Configured, Suspend), Some("USB Device suspended"));
        assert_eq!(state_change_message(Suspend, Default), Some("USB Device disconnected"));
        assert_eq!(state_change_message(Configured, Configured), None);
    }

    #[test]
    fn test_both_sources_are_queued_in_order() {
        let mut inbound = Deque::new();
        let out = [0x82, 7];
        let set_report = [0x80, 42, 3];

        queue_pulled(&mut inbound, &out, Ok(out.len())).unwrap();
        queue_pulled(&mut inbound, &set_report, Ok(set_report.len())).unwrap();

        assert_eq!(inbound.pop_front(), Some(Report::from_slice(&[0x82, 7])));
        assert_eq!(inbound.pop_front(), Some(Report::from_slice(&[0x80, 42, 3])));
        assert_eq!(inbound.pop_front(), None);
    }

    #[test]
    fn test_nothing_pulled_queues_nothing() {
        let mut inbound = Deque::new();
        queue_pulled(&mut inbound, &[0xff; 4], Err(UsbError::WouldBlock)).unwrap();
        assert!(inbound.is_empty());

        assert!(matches!(
            queue_pulled(&mut inbound, &[], Err(UsbError::BufferOverflow)),
            Err(HidPollError::Usb(UsbError::BufferOverflow))
        ));
        assert!(inbound.is_empty());
    }

    #[test]
    fn test_setup_error_message() {
        let e = HidSetupError::from(BuilderError::InvalidPacketSize);
        assert_eq!(std::format!("{}", e), "Usb device setup error: InvalidPacketSize");
    }
}
