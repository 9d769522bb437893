//! Resolve parsed clock/calendar components into zone-aware instants
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Explicit IANA zone end-to-end, UTC storage form
//! - 1.0.0: Calendar and "tomorrow" resolution

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::core::error::{AssistantError, AssistantResult};

/// Storage form: UTC, second precision, fixed width
const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Accepts `am`/`pm` in any case with or without dots (`p.m`, `pm.`), or 午前/午後
    pub fn parse(token: &str) -> Option<Self> {
        let normalized: String = token
            .trim()
            .chars()
            .filter(|c| *c != '.')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "am" | "午前" => Some(Self::Am),
            "pm" | "午後" => Some(Self::Pm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAnchor {
    Today,
    Tomorrow,
}

impl DayAnchor {
    fn offset_days(self) -> i64 {
        match self {
            Self::Today => 0,
            Self::Tomorrow => 1,
        }
    }
}

/// Clock reading as the user wrote it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: Option<u32>,
    pub meridiem: Option<Meridiem>,
}

impl ClockTime {
    pub fn new(hour: u32, minute: Option<u32>, meridiem: Option<Meridiem>) -> Self {
        Self {
            hour,
            minute,
            meridiem,
        }
    }

    /// 24-hour (hour, minute); a missing minute means :00
    pub fn to_24_hour(self) -> (u32, u32) {
        let hour = match (self.meridiem, self.hour) {
            (Some(Meridiem::Pm), h) if h != 12 => h + 12,
            (Some(Meridiem::Am), 12) => 0,
            (_, h) => h,
        };
        (hour, self.minute.unwrap_or(0))
    }
}

/// `month/day hour:minute` in the current year of `now`, in `now`'s zone
pub fn resolve_calendar(
    now: &DateTime<Tz>,
    month: u32,
    day: u32,
    hour: u32,
    minute: Option<u32>,
) -> AssistantResult<DateTime<Tz>> {
    let date = NaiveDate::from_ymd_opt(now.year(), month, day).ok_or_else(|| {
        AssistantError::malformed_time(format!("no such date {}/{}/{}", now.year(), month, day))
    })?;
    localize(now.timezone(), date, hour, minute.unwrap_or(0))
}

/// Clock time on today's or tomorrow's date in `now`'s zone
pub fn resolve_relative(
    now: &DateTime<Tz>,
    anchor: DayAnchor,
    clock: ClockTime,
) -> AssistantResult<DateTime<Tz>> {
    let date = now.date_naive() + Duration::days(anchor.offset_days());
    let (hour, minute) = clock.to_24_hour();
    localize(now.timezone(), date, hour, minute)
}

fn localize(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> AssistantResult<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AssistantError::malformed_time(format!("no such time {hour}:{minute:02}")))?;
    let naive = NaiveDateTime::new(date, time);

    // Ambiguous wall times (DST fall-back) take the earlier instant; skipped ones are errors
    tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        AssistantError::malformed_time(format!("{naive} does not exist in {}", tz.name()))
    })
}

/// Current instant in `tz`
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Serialize for storage; lexicographic order of the output is chronological order
pub fn to_storage(instant: &DateTime<Tz>) -> String {
    instant.with_timezone(&Utc).format(STORAGE_FORMAT).to_string()
}

/// Parse a stored instant back into `tz`
pub fn from_storage(value: &str, tz: Tz) -> AssistantResult<DateTime<Tz>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&tz))
        .map_err(|e| AssistantError::CorruptRecord(format!("bad instant {value:?}: {e}")))
}

/// Human-facing form used in confirmations
pub fn display(instant: &DateTime<Tz>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}
