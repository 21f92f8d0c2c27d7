use segvol_common::{dev_debug, dev_info, dev_warn};
use segvol_peripheral::encoder::Knob;
use segvol_peripheral::leds::StatusLeds;
use segvol_peripheral::seven_seg::NumberDisplay;

use crate::command::{Command, CommandError};
use crate::hid::{HidPollError, HidTransport};
use crate::log::HidLogger;
use crate::report::{REPORT_SIZE, Report, StatusReport};

/// Somewhere the device keeps diagnostic text for the host.
pub trait DebugSource {
    /// Takes the oldest pending text, framed as a length prefixed
    /// report.
    fn drain_report(&self) -> Report;
}

impl<const C: usize> DebugSource for HidLogger<C> {
    fn drain_report(&self) -> Report {
        Report::from_array(self.drain_block::<REPORT_SIZE>())
    }
}

impl<T: DebugSource + ?Sized> DebugSource for &T {
    fn drain_report(&self) -> Report {
        (**self).drain_report()
    }
}

/// The volume display as seen by the host: a number on the display, a
/// bank of status LEDs and a debug log, driven by commands.
pub struct VolumeDevice<D, L, S> {
    display: D,
    leds: L,
    debug: S,
    volume: u8,
    // Last volume the knob was known to agree with.
    knob_synced: u8,
}

impl<D: NumberDisplay, L: StatusLeds, S: DebugSource> VolumeDevice<D, L, S> {
    pub fn new(mut display: D, leds: L, debug: S) -> Self {
        display.set_number(0);
        Self {
            display,
            leds,
            debug,
            volume: 0,
            knob_synced: 0,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }

    /// Shows a new volume on the display. This is the only way the
    /// displayed number changes, whether it comes from the host or the
    /// encoder.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        self.display.set_number(volume);
        dev_debug!("Volume set to {}", volume);
    }

    /// Keeps the volume and the knob in step. A volume set by the host
    /// since the last call is pushed into the knob first, so the next
    /// detent moves on from the shown number. Then the knob is sampled,
    /// and any movement becomes the new volume.
    pub fn follow_knob<K: Knob>(&mut self, knob: &mut K) {
        if self.volume != self.knob_synced {
            knob.set_count(self.volume);
            self.knob_synced = self.volume;
        }

        let count = knob.sample();
        if count != self.knob_synced {
            self.set_volume(count);
            self.knob_synced = count;
        }
    }

    /// Applies a command, returning the report that must be sent back
    /// to the host, if any.
    pub fn handle(&mut self, command: Command) -> Option<Report> {
        match command {
            Command::DebugRequest => Some(self.debug.drain_report()),
            Command::GetStatus { display } => {
                if let Some(volume) = display {
                    self.set_volume(volume);
                }
                Some(StatusReport::new(self.leds.state().to_flags(), self.volume).into())
            }
            Command::SetLeds(mask) => {
                dev_info!("** Received command 0x81 (set LED status) from host");
                self.leds.set(mask);
                None
            }
            Command::SetVolume(volume) => {
                self.set_volume(volume);
                None
            }
        }
    }

    /// Decodes and applies a report received from the host. Reports that
    /// don't hold a valid command are logged and otherwise ignored.
    pub fn handle_report(&mut self, report: &Report) -> Option<Report> {
        match Command::parse(report.bytes()) {
            Ok(command) => self.handle(command),
            Err(e) => {
                Self::log_rejected(e);
                None
            }
        }
    }

    /// Polls the link once, answering the host report it returns, if
    /// any. Returns whether a report was received.
    pub fn serve<H: HidTransport>(&mut self, hid: &mut H) -> Result<bool, HidPollError> {
        let Some(report) = hid.poll()? else {
            return Ok(false);
        };

        if let Some(response) = self.handle_report(&report) {
            hid.send(&response)?;
        }
        Ok(true)
    }

    #[inline(always)]
    fn log_rejected(e: CommandError) {
        dev_warn!("{}", e);
    }

    pub fn release(self) -> (D, L, S) {
        (self.display, self.leds, self.debug)
    }
}
