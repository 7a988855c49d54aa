//! Peripheral glue that only exists on the nRF52840.

pub mod buttons;
pub mod display;
pub mod link;
