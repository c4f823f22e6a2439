//! PCF85263 middleware: host clock view of the RTC.
//!
//! Wraps the driver, remembers the last good reading and pairs every failed
//! read with a usable fallback time, so the clock subsystem can keep running
//! before the RTC is wired up.

use core::fmt::Write as _;

use embedded_hal::i2c::I2c;
use heapless::String;

use crate::drivers::calendar::CalendarTime;
use crate::drivers::pcf85263::{Error as RtcError, Pcf85263};

pub struct RtcApi<'d, I2C> {
    driver: &'d mut Pcf85263<I2C>,
    last: CalendarTime,
}

impl<'d, I2C, E> RtcApi<'d, I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(driver: &'d mut Pcf85263<I2C>) -> Self {
        let last = CalendarTime::epoch(driver.config().extended_fields);
        Self { driver, last }
    }

    /// Current time plus status. Before the driver is initialized this is the
    /// 1970 epoch with `NotReady`; on other failures it is the last good
    /// reading.
    pub fn now(&mut self) -> (CalendarTime, Result<(), RtcError<E>>) {
        match self.driver.get_time() {
            Ok(tm) => {
                self.last = tm;
                (tm, Ok(()))
            }
            Err(RtcError::NotReady) => {
                let epoch = CalendarTime::epoch(self.driver.config().extended_fields);
                (epoch, Err(RtcError::NotReady))
            }
            Err(e) => {
                warn!("PCF85263 read failed, keeping last time {}", self.last);
                (self.last, Err(e))
            }
        }
    }

    pub fn set_time(&mut self, seconds: i64, nanos: u32) -> Result<(), RtcError<E>> {
        self.driver.set_time(seconds, nanos)?;
        info!("PCF85263 time set to {}", seconds);
        Ok(())
    }

    /// Current chip time as seconds since the Unix epoch.
    pub fn timestamp(&mut self) -> Result<i64, RtcError<E>> {
        let tm = self.driver.get_time()?;
        self.last = tm;
        tm.to_timestamp(self.driver.config().utc_offset_secs)
            .ok_or(RtcError::InvalidTime)
    }

    pub fn last(&self) -> &CalendarTime {
        &self.last
    }

    pub fn format_iso8601(&self) -> String<32> {
        let mut s = String::new();
        let tm = &self.last;
        let _ = core::write!(
            s,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            tm.full_year(),
            tm.month + 1,
            tm.mday,
            tm.hour,
            tm.minute,
            tm.second
        );

        let offset = self.driver.config().utc_offset_secs;
        if offset == 0 {
            let _ = s.push('Z');
        } else {
            let sign = if offset < 0 { '-' } else { '+' };
            let minutes = offset.unsigned_abs() / 60;
            let _ = core::write!(s, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::pcf85263::Config;
    use crate::drivers::test_bus::{BusFault, FakeBus};

    const JUNE_2000: [u8; 7] = [0x45, 0x30, 0x12, 0x15, 0x04, 0x06, 0x32];

    #[test]
    fn test_now_before_initialize() {
        let mut rtc: Pcf85263<FakeBus> = Pcf85263::new(Config::default());
        let mut api = RtcApi::new(&mut rtc);

        let (tm, status) = api.now();
        assert_eq!(tm, CalendarTime::epoch(true));
        assert!(status.unwrap_err().is_retryable());
        assert_eq!(api.format_iso8601().as_str(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_now_tracks_last_reading() {
        let mut bus = FakeBus::default();
        bus.queue(&JUNE_2000).queue(&[0x45]);
        let mut rtc = Pcf85263::new(Config::default());
        rtc.initialize(bus);
        let mut api = RtcApi::new(&mut rtc);

        let (tm, status) = api.now();
        assert_eq!(status, Ok(()));
        assert_eq!(tm.full_year(), 2000);
        assert_eq!(api.last(), &tm);
        assert_eq!(api.format_iso8601().as_str(), "2000-06-15T12:30:45Z");
    }

    #[test]
    fn test_now_keeps_last_reading_on_bus_error() {
        let mut bus = FakeBus { fail_on: Some(1), ..FakeBus::default() };
        bus.queue(&JUNE_2000).queue(&[0x45]);
        let mut rtc = Pcf85263::new(Config::default());
        rtc.initialize(bus);
        let mut api = RtcApi::new(&mut rtc);

        let (first, _) = api.now();
        let (tm, status) = api.now();
        assert_eq!(tm, first);
        assert_eq!(status, Err(RtcError::I2c(BusFault)));
    }

    #[test]
    fn test_timestamp_honours_offset() {
        let mut bus = FakeBus::default();
        bus.queue(&[0x00, 0x00, 0x01, 0x01, 0x04, 0x01, 0x02]).queue(&[0x00]);
        let config = Config { utc_offset_secs: 3600, ..Config::default() };
        let mut rtc = Pcf85263::new(config);
        rtc.initialize(bus);
        let mut api = RtcApi::new(&mut rtc);

        assert_eq!(api.timestamp(), Ok(0));
        assert_eq!(api.format_iso8601().as_str(), "1970-01-01T01:00:00+01:00");
    }

    #[test]
    fn test_set_time_before_initialize() {
        let mut rtc: Pcf85263<FakeBus> = Pcf85263::new(Config::default());
        let mut api = RtcApi::new(&mut rtc);
        assert_eq!(api.set_time(0, 0), Err(RtcError::NotReady));
    }

    #[test]
    fn test_set_time_writes_through() {
        let mut bus = FakeBus::default();
        bus.queue(&[0x00]);
        let mut rtc = Pcf85263::new(Config::default());
        rtc.initialize(bus);

        RtcApi::new(&mut rtc).set_time(946_684_800, 0).unwrap();
        assert_eq!(rtc.release().unwrap().log.len(), 2);
    }
}
