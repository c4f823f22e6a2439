//! PCF85263 real-time clock as a host clock source.
//!
//! `drivers` holds the register-level driver (`Pcf85263`), its BCD codec and
//! the `CalendarTime` exchange type; `middleware` wraps the driver in the
//! fallback-aware API the clock subsystem calls.
//!
//! ```ignore
//! let mut rtc = Pcf85263::new(Config::default());
//! rtc.initialize(i2c);
//! let mut clock = RtcApi::new(&mut rtc);
//! let (now, status) = clock.now();
//! ```

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod drivers;
pub mod middleware;

pub use drivers::calendar::CalendarTime;
pub use drivers::pcf85263::{Config, Error, Pcf85263, PCF85263_ADDR};
pub use middleware::rtc_api::RtcApi;
