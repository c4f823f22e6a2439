//! PCF85263 Real-Time Clock driver
//!
//! Blocking I2C driver for the date/time registers of the NXP PCF85263
//! (RTC mode, 24-hour time only).
//!
//! Features:
//! - Read the current date/time as a `CalendarTime`
//! - Set the date/time from a Unix timestamp or a `CalendarTime`
//! - Both directions detect a seconds rollover during the transfer and retry
//!
//! Notes:
//! - The chip year register counts from 1968 (a leap year, like 2000), so the
//!   representable range is 1968..=2067.
//! - The 100ths register is cleared on every write and never read back.
//! - Alarms, timestamps, battery switch-over and the RAM byte are not touched.

use embedded_hal::i2c::{I2c, Operation};

use super::bcd::{bcd_to_bin, bin_to_bcd};
use super::calendar::CalendarTime;

pub const PCF85263_ADDR: u8 = 0x51;

/// Register map (RTC time subset)
pub mod reg {
    pub const HUNDREDTHS: u8 = 0x00; // 0-99 BCD
    pub const SECONDS: u8 = 0x01;    // 0-59 BCD, bit7 is oscillator stop (OS)
    pub const MINUTES: u8 = 0x02;    // 0-59 BCD, bit7 is EMON
    pub const HOURS: u8 = 0x03;      // 0-23 BCD (24h mode)
    pub const DAYS: u8 = 0x04;       // 1-31 BCD
    pub const WEEKDAYS: u8 = 0x05;   // 0-6
    pub const MONTHS: u8 = 0x06;     // 1-12 BCD
    pub const YEARS: u8 = 0x07;      // 0-99 BCD, years since 1968
}

/// Significant bits of each time register
pub mod mask {
    pub const SECONDS: u8 = 0x7F;
    pub const MINUTES: u8 = 0x7F;
    pub const HOURS24: u8 = 0x3F;
    pub const DAYS: u8 = 0x3F;
    pub const WEEKDAYS: u8 = 0x07;
    pub const MONTHS: u8 = 0x1F;
    pub const YEARS: u8 = 0xFF;
}

/// Chip years count from 1968; `CalendarTime` years count from 1900.
const YEAR_OFFSET: i32 = 68;
const TIME_REGS: usize = 7;
const IMAGE_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// 7-bit bus address.
    pub address: u8,
    /// Offset applied when breaking out timestamps; 0 keeps the chip in UTC.
    pub utc_offset_secs: i32,
    /// Carry weekday and day-of-year through `CalendarTime`.
    pub extended_fields: bool,
    /// Transfers attempted before a repeating rollover is reported.
    pub max_attempts: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: PCF85263_ADDR,
            utc_offset_secs: 0,
            extended_fields: true,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Bus transfer failed; the bus error is passed through untouched.
    I2c(E),
    /// Driver used before `initialize`. Retry once the bus is wired up.
    NotReady,
    /// Seconds kept rolling over for `max_attempts` transfers in a row.
    RolloverExceeded,
    /// Timestamp cannot be broken out into calendar fields.
    InvalidTime,
    /// A calendar field does not fit the chip registers.
    OutOfRange,
}

impl<E> Error<E> {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotReady)
    }
}

// Bus errors are not required to implement Format, so only the kind is logged.
#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::I2c(_) => defmt::write!(f, "I2c"),
            Error::NotReady => defmt::write!(f, "NotReady"),
            Error::RolloverExceeded => defmt::write!(f, "RolloverExceeded"),
            Error::InvalidTime => defmt::write!(f, "InvalidTime"),
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
        }
    }
}

/// PCF85263 driver. Holds no bus until `initialize` is called; until then
/// every operation reports `Error::NotReady` without touching hardware.
pub struct Pcf85263<I2C> {
    i2c: Option<I2C>,
    config: Config,
}

impl<I2C, E> Pcf85263<I2C>
where
    I2C: I2c<Error = E>,
{
    pub const fn new(config: Config) -> Self {
        Self { i2c: None, config }
    }

    /// Hand the bus to the driver and enable it. Calling again replaces the bus.
    pub fn initialize(&mut self, i2c: I2C) {
        self.i2c = Some(i2c);
        info!("PCF85263 enabled at address {}", self.config.address);
    }

    pub fn is_enabled(&self) -> bool {
        self.i2c.is_some()
    }

    /// Disable the driver and give the bus back.
    pub fn release(&mut self) -> Option<I2C> {
        self.i2c.take()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the current date/time.
    ///
    /// The seven time registers and then the seconds register again are read
    /// in one bus transaction. If the block's seconds are ahead of the second
    /// read, the clock ticked over in between and the whole transaction is
    /// repeated.
    pub fn get_time(&mut self) -> Result<CalendarTime, Error<E>> {
        let Config { address, extended_fields, max_attempts, .. } = self.config;
        let Some(i2c) = self.i2c.as_mut() else {
            return Err(Error::NotReady);
        };

        let mut block = [0u8; TIME_REGS];
        let mut guard = [0u8; 1];

        for attempt in 1..=max_attempts.max(1) {
            i2c.transaction(
                address,
                &mut [
                    Operation::Write(&[reg::SECONDS]),
                    Operation::Read(&mut block),
                    Operation::Write(&[reg::SECONDS]),
                    Operation::Read(&mut guard),
                ],
            )
            .map_err(|e| {
                error!("PCF85263 time read failed");
                Error::I2c(e)
            })?;

            if block[0] & mask::SECONDS <= guard[0] & mask::SECONDS {
                let tm = decode_time(&block, extended_fields);
                debug!("PCF85263 time read: {}", tm);
                return Ok(tm);
            }
            warn!("PCF85263 seconds rolled over during read (attempt {})", attempt);
        }

        Err(Error::RolloverExceeded)
    }

    /// Set the date/time from a Unix timestamp. Fractions of half a second
    /// or more round up to the next second.
    pub fn set_time(&mut self, seconds: i64, nanos: u32) -> Result<(), Error<E>> {
        if !self.is_enabled() {
            return Err(Error::NotReady);
        }

        let tm = CalendarTime::from_timestamp(
            seconds,
            nanos,
            self.config.utc_offset_secs,
            self.config.extended_fields,
        )
        .ok_or_else(|| {
            error!("PCF85263 cannot break out timestamp {}", seconds);
            Error::InvalidTime
        })?;

        self.set_calendar(&tm)
    }

    /// Write a calendar time.
    ///
    /// After the 9-byte register write the seconds register is read back. If
    /// it is now lower than what was written, the seconds rolled over while
    /// the write was in flight and the write is repeated.
    pub fn set_calendar(&mut self, tm: &CalendarTime) -> Result<(), Error<E>> {
        let Config { address, extended_fields, max_attempts, .. } = self.config;
        let Some(i2c) = self.i2c.as_mut() else {
            return Err(Error::NotReady);
        };

        debug!("PCF85263 setting time: {}", tm);
        let image = encode_image(tm, extended_fields).ok_or(Error::OutOfRange)?;
        let mut seconds = [0u8; 1];

        for attempt in 1..=max_attempts.max(1) {
            i2c.write(address, &image).map_err(|e| {
                error!("PCF85263 time write failed");
                Error::I2c(e)
            })?;
            i2c.write_read(address, &[reg::SECONDS], &mut seconds)
                .map_err(|e| {
                    error!("PCF85263 seconds read-back failed");
                    Error::I2c(e)
                })?;

            if image[2] & mask::SECONDS <= seconds[0] & mask::SECONDS {
                return Ok(());
            }
            warn!("PCF85263 seconds rolled over during write (attempt {})", attempt);
        }

        Err(Error::RolloverExceeded)
    }
}

/// Decode the seven registers starting at `reg::SECONDS`.
fn decode_time(block: &[u8; TIME_REGS], extended: bool) -> CalendarTime {
    let mut tm = CalendarTime {
        second: bcd_to_bin(block[0] & mask::SECONDS),
        minute: bcd_to_bin(block[1] & mask::MINUTES),
        hour: bcd_to_bin(block[2] & mask::HOURS24),
        mday: bcd_to_bin(block[3] & mask::DAYS),
        // Chip months are 1-12; a zeroed register reads as January
        month: bcd_to_bin(block[5] & mask::MONTHS).saturating_sub(1),
        year: i32::from(bcd_to_bin(block[6] & mask::YEARS)) + YEAR_OFFSET,
        weekday: None,
        yday: None,
    };

    if extended {
        tm.weekday = Some(bcd_to_bin(block[4] & mask::WEEKDAYS)).filter(|d| *d <= 6);
        tm.yday = tm.to_naive().map(|dt| chrono::Datelike::ordinal0(&dt) as u16);
    }

    tm
}

/// Build the write image: start address, cleared 100ths, then the seven
/// time registers. `None` if a field cannot be represented by the chip.
/// Leap seconds are stored as 59; the seconds register only counts to 59.
fn encode_image(tm: &CalendarTime, extended: bool) -> Option<[u8; IMAGE_LEN]> {
    let year = tm
        .year
        .checked_sub(YEAR_OFFSET)
        .and_then(|y| u8::try_from(y).ok())
        .filter(|y| *y <= 99)?;
    let weekday = if extended { tm.weekday.unwrap_or(0) } else { 0 };

    if tm.second > 61
        || tm.minute > 59
        || tm.hour > 23
        || tm.mday == 0
        || tm.mday > 31
        || tm.month > 11
        || weekday > 6
    {
        return None;
    }

    Some([
        reg::HUNDREDTHS,
        0,
        bin_to_bcd(tm.second.min(59)),
        bin_to_bcd(tm.minute),
        bin_to_bcd(tm.hour),
        bin_to_bcd(tm.mday),
        bin_to_bcd(weekday),
        bin_to_bcd(tm.month + 1),
        bin_to_bcd(year),
    ])
}
