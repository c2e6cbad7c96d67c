use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

/// Seconds in one UTC calendar day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// UTC calendar day, rendered as `YYYY-MM-DD`.
///
/// This is the only temporal index used by the store and the query service.
/// Arithmetic always moves in whole days, so DST and month lengths never
/// come into play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(Date);

impl DateKey {
    /// Current UTC day.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDateKey {
                value: input.to_owned(),
            })
    }

    /// Floor a unix timestamp (seconds) to its UTC day.
    pub fn from_unix_timestamp(timestamp: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(timestamp)
            .map(|value| Self(value.date()))
            .map_err(|_| ValidationError::TimestampOutOfRange { value: timestamp })
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    /// Unix timestamp of 00:00:00 UTC on this day.
    pub fn start_timestamp(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// Unix timestamp of 00:00:00 UTC on the following day.
    pub fn end_timestamp(self) -> i64 {
        self.start_timestamp() + SECONDS_PER_DAY
    }

    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    pub fn previous(self) -> Option<Self> {
        self.0.previous_day().map(Self)
    }

    /// Shift by a signed number of whole days.
    pub fn offset_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(Duration::days(days)).map(Self)
    }

    /// Whole days from `self` to `other` (negative when `other` is earlier).
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for DateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
