use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use num_integer::Integer;

use crate::ion_eq::IonEq;
use crate::result::{decoding_error, IonResult};
use crate::types::decimal::Decimal;

/// Indicates the most precise time unit that a [Timestamp] stores. Fields beyond the stated
/// precision are unpopulated; a timestamp with (say) `Day` precision has no time-of-day at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
    HourAndMinute,
    Second,
}

/// A calendar instant: a date (and possibly a time of day) of bounded precision, with an
/// optional UTC offset.
///
/// Two timestamps are `==` only if their precisions, offsets, and every populated field
/// (including the fractional seconds) agree. To ask whether two timestamps name the same point
/// on the UTC timeline regardless of offset and precision, use [Timestamp::instant_equals].
#[derive(Debug, Clone)]
pub struct Timestamp {
    // Fields beyond the precision hold their minimum legal values (month/day: 1, time: 0)
    pub(crate) date_time: NaiveDateTime,
    pub(crate) offset: Option<FixedOffset>,
    pub(crate) precision: Precision,
    // Only present at Second precision; always in [0, 1) with a non-positive exponent
    pub(crate) fractional_seconds: Option<Decimal>,
}

impl Timestamp {
    /// Begins building a timestamp from its most significant field.
    pub fn with_year(year: u32) -> TimestampBuilder {
        TimestampBuilder {
            year,
            ..Default::default()
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The local offset in minutes east of UTC, or `None` if the offset is unknown (`-00:00`).
    pub fn offset_minutes(&self) -> Option<i32> {
        self.offset.map(|offset| offset.local_minus_utc() / 60)
    }

    pub fn year(&self) -> u32 {
        self.date_time.year() as u32
    }

    pub fn month(&self) -> u32 {
        self.date_time.month()
    }

    pub fn day(&self) -> u32 {
        self.date_time.day()
    }

    pub fn hour(&self) -> u32 {
        self.date_time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.date_time.minute()
    }

    pub fn second(&self) -> u32 {
        self.date_time.second()
    }

    pub fn fractional_seconds(&self) -> Option<&Decimal> {
        self.fractional_seconds.as_ref()
    }

    // This timestamp's date and time re-expressed on the UTC timeline. An unknown offset is
    // treated as UTC, which is what instant comparison requires.
    fn to_utc(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => {
                self.date_time - Duration::seconds(offset.local_minus_utc() as i64)
            }
            None => self.date_time,
        }
    }

    /// Compares two timestamps as points on the UTC timeline, ignoring offset and precision.
    pub fn compare_instant(&self, other: &Timestamp) -> Ordering {
        self.to_utc().cmp(&other.to_utc()).then_with(|| {
            let zero = Decimal::new(0u64, 0);
            let fraction_self = self.fractional_seconds.as_ref().unwrap_or(&zero);
            let fraction_other = other.fractional_seconds.as_ref().unwrap_or(&zero);
            fraction_self.cmp(fraction_other)
        })
    }

    pub fn instant_equals(&self, other: &Timestamp) -> bool {
        self.compare_instant(other) == Ordering::Equal
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        if self.precision != other.precision
            || self.offset != other.offset
            || self.date_time != other.date_time
        {
            return false;
        }
        match (&self.fractional_seconds, &other.fractional_seconds) {
            (None, None) => true,
            (Some(f1), Some(f2)) => f1.ion_eq(f2),
            _ => false,
        }
    }
}

impl Eq for Timestamp {}

impl IonEq for Timestamp {
    fn ion_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            Precision::Year => return write!(f, "{:04}T", self.year()),
            Precision::Month => return write!(f, "{:04}-{:02}T", self.year(), self.month()),
            Precision::Day => {
                return write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
            }
            Precision::HourAndMinute | Precision::Second => {}
        }

        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute()
        )?;
        if self.precision == Precision::Second {
            write!(f, ":{:02}", self.second())?;
            if let Some(fraction) = &self.fractional_seconds {
                let digits = fraction.coefficient().magnitude().to_string();
                let width = (-fraction.exponent()) as usize;
                write!(f, ".{digits:0>width$}")?;
            }
        }
        match self.offset_minutes() {
            None => write!(f, "-00:00"),
            Some(0) => write!(f, "Z"),
            Some(offset_minutes) => {
                let sign = if offset_minutes < 0 { "-" } else { "+" };
                let (hours, minutes) = offset_minutes.abs().div_rem(&60);
                write!(f, "{sign}{hours:02}:{minutes:02}")
            }
        }
    }
}

/// Accumulates timestamp fields most-significant first, then validates and assembles them.
#[derive(Debug, Default)]
pub struct TimestampBuilder {
    year: u32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    fractional_seconds: Option<Decimal>,
}

impl TimestampBuilder {
    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_hour_and_minute(mut self, hour: u32, minute: u32) -> Self {
        self.hour = Some(hour);
        self.minute = Some(minute);
        self
    }

    pub fn with_second(mut self, second: u32) -> Self {
        self.second = Some(second);
        self
    }

    pub fn with_fractional_seconds(mut self, fraction: Decimal) -> Self {
        self.fractional_seconds = Some(fraction);
        self
    }

    /// Builds a timestamp whose offset is known, expressed in minutes east of UTC.
    /// Offsets are only meaningful for timestamps with a time component; for date-only
    /// precisions the offset is recorded as unknown.
    pub fn build_at_offset(self, offset_minutes: i32) -> IonResult<Timestamp> {
        if self.hour.is_none() {
            return self.build_at_unknown_offset();
        }
        let offset_seconds = offset_minutes.checked_mul(60).unwrap_or(i32::MAX);
        let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            crate::result::decoding_error_raw(format!(
                "invalid timestamp offset: {offset_minutes} minutes"
            ))
        })?;
        self.build_internal(Some(offset))
    }

    /// Builds a timestamp whose local offset is unknown (`-00:00`).
    pub fn build_at_unknown_offset(self) -> IonResult<Timestamp> {
        self.build_internal(None)
    }

    /// Builds a date-only timestamp (one with no time component).
    pub fn build(self) -> IonResult<Timestamp> {
        if self.hour.is_some() {
            return decoding_error("a timestamp with a time component requires an offset");
        }
        self.build_internal(None)
    }

    fn build_internal(self, offset: Option<FixedOffset>) -> IonResult<Timestamp> {
        // Precision is determined by the deepest contiguous run of populated fields
        let precision = match (self.month, self.day, self.hour, self.second) {
            (None, None, None, None) => Precision::Year,
            (Some(_), None, None, None) => Precision::Month,
            (Some(_), Some(_), None, None) => Precision::Day,
            (Some(_), Some(_), Some(_), None) => Precision::HourAndMinute,
            (Some(_), Some(_), Some(_), Some(_)) => Precision::Second,
            _ => return decoding_error("timestamp fields must be populated most-significant-first"),
        };

        if !(1..=9999).contains(&self.year) {
            return decoding_error(format!("timestamp year {} is out of range", self.year));
        }
        let date = NaiveDate::from_ymd_opt(
            self.year as i32,
            self.month.unwrap_or(1),
            self.day.unwrap_or(1),
        )
        .ok_or_else(|| {
            crate::result::decoding_error_raw(format!(
                "invalid date in timestamp: {:04}-{:02}-{:02}",
                self.year,
                self.month.unwrap_or(1),
                self.day.unwrap_or(1)
            ))
        })?;
        let date_time = date
            .and_hms_opt(
                self.hour.unwrap_or(0),
                self.minute.unwrap_or(0),
                self.second.unwrap_or(0),
            )
            .ok_or_else(|| {
                crate::result::decoding_error_raw(format!(
                    "invalid time in timestamp: {:02}:{:02}:{:02}",
                    self.hour.unwrap_or(0),
                    self.minute.unwrap_or(0),
                    self.second.unwrap_or(0)
                ))
            })?;

        if let Some(fraction) = &self.fractional_seconds {
            if precision != Precision::Second {
                return decoding_error("fractional seconds require whole seconds");
            }
            if !fraction_is_valid(fraction) {
                return decoding_error(format!(
                    "invalid fractional seconds in timestamp: {fraction}"
                ));
            }
        }

        Ok(Timestamp {
            date_time,
            offset,
            precision,
            fractional_seconds: self.fractional_seconds,
        })
    }
}

// A legal fractional-seconds value is non-negative and less than one: its exponent must be
// negative and its digits must fit within that scale.
fn fraction_is_valid(fraction: &Decimal) -> bool {
    use crate::types::coefficient::Sign;
    if fraction.coefficient().sign() == Sign::Negative && !fraction.coefficient().is_zero() {
        return false;
    }
    let exponent = fraction.exponent();
    if exponent >= 0 {
        return false;
    }
    let digits = fraction.coefficient().magnitude().number_of_decimal_digits() as i64;
    fraction.coefficient().is_zero() || digits <= -exponent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn second_precision(offset_minutes: Option<i32>) -> Timestamp {
        let builder = Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(0, 0)
            .with_second(0);
        match offset_minutes {
            Some(minutes) => builder.build_at_offset(minutes).unwrap(),
            None => builder.build_at_unknown_offset().unwrap(),
        }
    }

    #[test]
    fn utc_and_unknown_offset_are_distinct_but_name_the_same_instant() {
        let utc = second_precision(Some(0));
        let unknown = second_precision(None);
        assert_ne!(utc, unknown);
        assert!(utc.instant_equals(&unknown));
    }

    #[test]
    fn offsets_shift_the_instant() {
        let in_utc = Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(5, 0)
            .with_second(0)
            .build_at_offset(0)
            .unwrap();
        let in_minus_five = Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(0, 0)
            .with_second(0)
            .build_at_offset(-300)
            .unwrap();
        assert!(in_utc.instant_equals(&in_minus_five));
        assert_ne!(in_utc, in_minus_five);
    }

    #[test]
    fn equality_considers_fractional_precision() {
        let tenths = Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(0, 0)
            .with_second(0)
            .with_fractional_seconds(Decimal::new(3u64, -1))
            .build_at_offset(0)
            .unwrap();
        let hundredths = Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(0, 0)
            .with_second(0)
            .with_fractional_seconds(Decimal::new(30u64, -2))
            .build_at_offset(0)
            .unwrap();
        // 0.3 and 0.30 seconds: the same instant, different data-model values
        assert_ne!(tenths, hundredths);
        assert!(tenths.instant_equals(&hundredths));
    }

    #[test]
    fn display_follows_precision() {
        assert_eq!(
            Timestamp::with_year(2021).build().unwrap().to_string(),
            "2021T"
        );
        assert_eq!(
            Timestamp::with_year(2021)
                .with_month(2)
                .build()
                .unwrap()
                .to_string(),
            "2021-02T"
        );
        assert_eq!(
            Timestamp::with_year(2021)
                .with_month(2)
                .with_day(3)
                .build()
                .unwrap()
                .to_string(),
            "2021-02-03"
        );
        assert_eq!(
            Timestamp::with_year(2021)
                .with_month(2)
                .with_day(3)
                .with_hour_and_minute(4, 5)
                .build_at_offset(-480)
                .unwrap()
                .to_string(),
            "2021-02-03T04:05-08:00"
        );
        assert_eq!(
            Timestamp::with_year(2021)
                .with_month(2)
                .with_day(3)
                .with_hour_and_minute(4, 5)
                .with_second(6)
                .with_fractional_seconds(Decimal::new(25u64, -3))
                .build_at_offset(0)
                .unwrap()
                .to_string(),
            "2021-02-03T04:05:06.025Z"
        );
        assert_eq!(
            second_precision(None).to_string(),
            "2020-01-01T00:00:00-00:00"
        );
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(Timestamp::with_year(2020).with_month(13).build().is_err());
        assert!(Timestamp::with_year(2019)
            .with_month(2)
            .with_day(29)
            .build()
            .is_err());
        assert!(Timestamp::with_year(2020)
            .with_month(2)
            .with_day(29)
            .build()
            .is_ok());
        assert!(Timestamp::with_year(2020)
            .with_month(1)
            .with_day(1)
            .with_hour_and_minute(24, 0)
            .build_at_offset(0)
            .is_err());
        assert!(Timestamp::with_year(0).build().is_err());
    }

    #[test]
    fn rejects_malformed_fractions() {
        let builder = || {
            Timestamp::with_year(2020)
                .with_month(1)
                .with_day(1)
                .with_hour_and_minute(0, 0)
                .with_second(0)
        };
        // A whole second's worth of fraction
        assert!(builder()
            .with_fractional_seconds(Decimal::new(10u64, -1))
            .build_at_offset(0)
            .is_err());
        // Non-negative exponent
        assert!(builder()
            .with_fractional_seconds(Decimal::new(1u64, 0))
            .build_at_offset(0)
            .is_err());
        assert!(builder()
            .with_fractional_seconds(Decimal::new(999u64, -3))
            .build_at_offset(0)
            .is_ok());
    }

    #[test]
    fn date_only_timestamps_never_carry_an_offset() {
        let date = Timestamp::with_year(2020)
            .with_month(6)
            .with_day(15)
            .build_at_offset(120)
            .unwrap();
        assert_eq!(date.offset_minutes(), None);
    }
}
