use core::cell::RefCell;
use core::fmt::Write;

use critical_section::Mutex;
use heapless::String;
use log::{Level, Log, SetLoggerError};
use segvol_common::util::CyclicBuffer;

/// Longest line a single log record produces. Longer messages are
/// truncated.
pub const MAX_LINE_LEN: usize = 128;

/// A logger that keeps the formatted records in a cyclic buffer, from
/// which the host pulls them with debug requests. Each record becomes a
/// line terminated by CR LF. When a line doesn't fit in the free space
/// of the buffer the whole line is dropped, so the host never sees a
/// partial message.
pub struct HidLogger<const C: usize> {
    log_level: Level,
    buf: Mutex<RefCell<CyclicBuffer<C>>>,
}

impl<const C: usize> HidLogger<C> {
    pub const fn new(level: Level) -> Self {
        Self {
            log_level: level,
            buf: Mutex::new(RefCell::new(CyclicBuffer::new())),
        }
    }

    /// Installs this logger as the global `log` sink.
    ///
    /// # Safety
    ///
    /// The target has no atomics, so this goes through the racy setter
    /// of `log`. It must be called once at startup, before anything
    /// else logs.
    pub unsafe fn install(logger: &'static Self) -> Result<(), SetLoggerError> {
        critical_section::with(|_| unsafe {
            log::set_logger_racy(logger)?;
            log::set_max_level_racy(logger.log_level.to_level_filter());
            Ok(())
        })
    }

    /// Appends a raw line to the buffer.
    pub fn append(&self, text: &[u8]) {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).append(text))
    }

    /// Takes the oldest pending bytes out of the buffer, framed as
    /// [`CyclicBuffer::drain_block`] does.
    pub fn drain_block<const N: usize>(&self) -> [u8; N] {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).drain_block::<N>())
    }

    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.buf.borrow_ref(cs).level())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.buf.borrow_ref_mut(cs).reset())
    }
}

impl<const C: usize> Log for HidLogger<C> {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line: String<MAX_LINE_LEN> = String::new();
        // On overflow, whatever was formatted up to that point is kept.
        let _ = write!(line, "{:<5} {}", record.level(), record.args());
        self.append(line.as_bytes());
    }

    fn flush(&self) {}
}
