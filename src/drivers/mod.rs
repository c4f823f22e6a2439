//! Drivers module
//!
//! Register-level RTC driver plus the codec and calendar types it shares.

pub mod bcd;
pub mod calendar;
pub mod pcf85263;

#[cfg(test)]
pub(crate) mod test_bus;
