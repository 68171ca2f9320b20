use crate::constants::{CLOSING_DATE_FORMAT, CLOSING_SOON_HOURS, UNKNOWN_CLOSING_DATE};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Naive layouts accepted after RFC 3339; they are read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A vacancy's closing time, or the lack of a usable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingDate {
    Known(DateTime<FixedOffset>),
    Unknown,
}

impl ClosingDate {
    /// Parses the raw `closes` value of a vacancy.
    ///
    /// Missing or unparseable values become [`ClosingDate::Unknown`]; this is the
    /// one parse failure in the pipeline that is not an error.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::Unknown;
        };

        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Self::Known(at);
        }

        let naive = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            });

        match naive {
            Some(naive) => Self::Known(naive.and_utc().fixed_offset()),
            None => {
                debug!(closes = raw, "Unparseable closing date");
                Self::Unknown
            }
        }
    }

    /// Human-readable closing time, e.g. `Fri, 01 Mar 2024, 12:00 PM`.
    pub fn display(&self) -> String {
        match self {
            Self::Known(at) => at.format(CLOSING_DATE_FORMAT).to_string(),
            Self::Unknown => UNKNOWN_CLOSING_DATE.to_string(),
        }
    }

    /// True if the vacancy closes less than 48 hours after `now`.
    ///
    /// Vacancies that have already closed count as closing soon; unknown dates never do.
    pub fn closes_soon(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Known(at) => at.with_timezone(&Utc) - now < Duration::hours(CLOSING_SOON_HOURS),
            Self::Unknown => false,
        }
    }
}
