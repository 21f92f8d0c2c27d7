//! Host-side stand-ins for GPIO pins and delays, shared by the driver
//! tests.

extern crate std;

use core::convert::Infallible;
use std::boxed::Box;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Every level change on the pins that share it, in order.
pub type EventLog = Rc<RefCell<Vec<(&'static str, bool)>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A pin whose level lives in a shared cell, so that a test keeps a
/// handle to it after moving the pin into a driver.
#[derive(Clone)]
pub struct MockPin {
    name: &'static str,
    level: Rc<Cell<bool>>,
    log: Option<EventLog>,
}

impl MockPin {
    pub fn new(name: &'static str, high: bool) -> Self {
        Self {
            name,
            level: Rc::new(Cell::new(high)),
            log: None,
        }
    }

    pub fn logged(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            level: Rc::new(Cell::new(false)),
            log: Some(log.clone()),
        }
    }

    pub fn is_high_now(&self) -> bool {
        self.level.get()
    }

    /// Forces the level seen by the driver, as an external signal would.
    pub fn drive(&self, high: bool) {
        self.level.set(high);
    }

    fn set(&mut self, high: bool) {
        self.level.set(high);
        if let Some(log) = &self.log {
            log.borrow_mut().push((self.name, high));
        }
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

/// A delay that returns immediately, counting the requested time and
/// optionally running a hook that plays the role of the outside world
/// changing while the firmware waits.
pub struct MockDelay {
    pub waited_ns: Rc<Cell<u64>>,
    hook: Option<Box<dyn FnMut()>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self {
            waited_ns: Rc::new(Cell::new(0)),
            hook: None,
        }
    }

    pub fn with_hook<F: FnMut() + 'static>(hook: F) -> Self {
        Self {
            waited_ns: Rc::new(Cell::new(0)),
            hook: Some(Box::new(hook)),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns.set(self.waited_ns.get() + ns as u64);
        if let Some(hook) = &mut self.hook {
            hook();
        }
    }
}
