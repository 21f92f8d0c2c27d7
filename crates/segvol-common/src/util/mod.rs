mod cyclic;

pub use cyclic::*;
