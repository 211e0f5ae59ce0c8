//! Time and timestamp helpers.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;

/// UTC timestamp used for schedule fire times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse a 24-hour `HH:MM` time of day. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTime`] unless the text is two digits,
/// a colon and two digits within `00:00..=23:59`.
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::InvalidTime(text.to_string());
    let (hour, minute) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hour = two_digits(hour).ok_or_else(invalid)?;
    let minute = two_digits(minute).ok_or_else(invalid)?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

fn two_digits(text: &str) -> Option<u32> {
    match text.as_bytes() {
        [tens, units] if tens.is_ascii_digit() && units.is_ascii_digit() => {
            Some(u32::from(tens - b'0') * 10 + u32::from(units - b'0'))
        }
        _ => None,
    }
}

/// First occurrence of `time` (wall clock in `now`'s zone) that lies strictly
/// after `now`: today when still ahead, tomorrow otherwise.
///
/// Returns `None` only when the local time does not exist on either day
/// (a DST gap hit twice in a row).
#[must_use]
pub fn next_occurrence<Tz: TimeZone>(time: NaiveTime, now: &DateTime<Tz>) -> Option<Timestamp> {
    let zone = now.timezone();
    let today = now.date_naive().and_time(time);
    let candidate = zone
        .from_local_datetime(&today)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc));

    let now_utc = now.with_timezone(&Utc);
    match candidate {
        Some(at) if at > now_utc => Some(at),
        Some(at) => Some(at + Duration::hours(24)),
        None => zone
            .from_local_datetime(&(today + Duration::hours(24)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
