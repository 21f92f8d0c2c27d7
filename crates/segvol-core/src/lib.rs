#![no_std]

pub mod command;
pub mod device;
pub mod hid;
pub mod log;
pub mod report;
