pub mod rtc_api; // host clock wrapper around the PCF85263 driver
