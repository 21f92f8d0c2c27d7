#![no_std]

pub mod encoder;
pub mod gpio;
pub mod leds;
pub mod refresh;
pub mod seven_seg;

#[cfg(test)]
mod mock;
