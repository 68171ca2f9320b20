use super::{stage, Stage};
use crate::errors::{AppError, AppResult};
use crate::models::{RunOutcome, SkipReason};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Where the bank-holiday calendar is published and which division applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSource {
    pub url: String,
    pub division: String,
}

#[derive(Debug, Deserialize)]
struct CalendarDivision {
    events: Vec<CalendarEvent>,
}

#[derive(Debug, Deserialize)]
struct CalendarEvent {
    date: NaiveDate,
}

/// Dates on which the office is closed for a public holiday.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankHolidays(BTreeSet<NaiveDate>);

impl BankHolidays {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.0.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NaiveDate> for BankHolidays {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses the published calendar (`{"<division>": {"events": [{"date": ...}]}}`)
/// and keeps the dates of one division.
///
/// # Errors
///
/// Returns `ParseError` if the JSON is malformed or the division is absent.
pub fn parse_bank_holidays(json: &str, division: &str) -> AppResult<BankHolidays> {
    let mut divisions: HashMap<String, CalendarDivision> = serde_json::from_str(json)?;
    let selected = divisions.remove(division).ok_or_else(|| {
        AppError::ParseError(format!(
            "Bank-holiday calendar has no '{division}' division"
        ))
    })?;

    Ok(selected.events.into_iter().map(|event| event.date).collect())
}

/// Downloads the bank-holiday calendar. It is fetched on every gated run and
/// never cached.
pub async fn fetch_bank_holidays(
    client: &reqwest::Client,
    source: &CalendarSource,
) -> AppResult<BankHolidays> {
    let body = client
        .get(source.url.as_str())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let holidays = parse_bank_holidays(&body, &source.division)?;
    info!(
        division = %source.division,
        holidays = holidays.len(),
        "Bank-holiday calendar fetched"
    );
    Ok(holidays)
}

/// A working day is a weekday that is neither a bank holiday nor inside the
/// Christmas closedown (25 to 31 December).
pub fn is_working_day(day: NaiveDate, holidays: &BankHolidays) -> bool {
    let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
    let closedown = day.month() == 12 && (25..=31).contains(&day.day());
    !weekend && !holidays.contains(day) && !closedown
}

/// Whether a gated run should go ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Run,
    Skip(SkipReason),
}

/// Decides whether `today` is the first working day of its week (weeks start on Monday).
pub fn first_working_day_check(today: NaiveDate, holidays: &BankHolidays) -> GateDecision {
    if !is_working_day(today, holidays) {
        return GateDecision::Skip(SkipReason::NotWorkingDay(today));
    }

    let days_since_monday = i64::from(today.weekday().num_days_from_monday());
    (1..=days_since_monday)
        .rev()
        .map(|back| today - Duration::days(back))
        .find(|earlier| is_working_day(*earlier, holidays))
        .map_or(GateDecision::Run, |earlier| {
            GateDecision::Skip(SkipReason::EarlierWorkingDay(earlier))
        })
}

/// Gate that only lets `next` run on the first working day of the week.
///
/// The calendar is fetched when the stage runs; a skipped run performs no other
/// side effects.
pub fn only_first_working_day<'a>(
    client: &'a reqwest::Client,
    source: CalendarSource,
    today: NaiveDate,
    next: Stage<'a>,
) -> Stage<'a> {
    stage(move || async move {
        let holidays = fetch_bank_holidays(client, &source).await?;
        match first_working_day_check(today, &holidays) {
            GateDecision::Run => {
                info!(%today, "First working day of the week; continuing");
                next().await
            }
            GateDecision::Skip(reason) => {
                info!(%reason, "Not the first working day of the week; not continuing");
                Ok(RunOutcome::Skipped(reason))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-05-06 is a Monday and the Early May bank holiday
    const CALENDAR: &str = r#"{
        "england-and-wales": {
            "division": "england-and-wales",
            "events": [
                {"title": "Early May bank holiday", "date": "2024-05-06", "notes": "", "bunting": true},
                {"title": "Spring bank holiday", "date": "2024-05-27", "notes": "", "bunting": true}
            ]
        },
        "scotland": {
            "division": "scotland",
            "events": [
                {"title": "2nd January", "date": "2024-01-02", "notes": "", "bunting": true}
            ]
        }
    }"#;

    fn holidays() -> BankHolidays {
        parse_bank_holidays(CALENDAR, "england-and-wales").unwrap()
    }

    #[test]
    fn calendar_division_is_selected() {
        let holidays = holidays();
        assert_eq!(holidays.len(), 2);
        assert!(holidays.contains(date(2024, 5, 6)));
        assert!(!holidays.contains(date(2024, 1, 2)));

        let scotland = parse_bank_holidays(CALENDAR, "scotland").unwrap();
        assert!(scotland.contains(date(2024, 1, 2)));
    }

    #[test]
    fn missing_division_errors() {
        assert!(matches!(
            parse_bank_holidays(CALENDAR, "wales"),
            Err(AppError::ParseError(_))
        ));
        assert!(parse_bank_holidays("not json", "scotland").is_err());
    }

    #[test]
    fn working_day_rules() {
        let holidays = holidays();
        assert!(is_working_day(date(2024, 5, 7), &holidays)); // Tuesday
        assert!(!is_working_day(date(2024, 5, 6), &holidays)); // bank holiday
        assert!(!is_working_day(date(2024, 5, 11), &holidays)); // Saturday
        assert!(!is_working_day(date(2024, 5, 12), &holidays)); // Sunday
        assert!(!is_working_day(date(2024, 12, 27), &holidays)); // closedown Friday
        assert!(is_working_day(date(2024, 12, 24), &holidays));
    }

    #[test]
    fn monday_working_day_runs() {
        let decision = first_working_day_check(date(2024, 5, 13), &holidays());
        assert_eq!(decision, GateDecision::Run);
    }

    #[test]
    fn wednesday_after_working_monday_and_tuesday_skips() {
        let decision = first_working_day_check(date(2024, 5, 15), &holidays());
        assert_eq!(
            decision,
            GateDecision::Skip(SkipReason::EarlierWorkingDay(date(2024, 5, 13)))
        );
    }

    #[test]
    fn tuesday_after_bank_holiday_monday_runs() {
        let decision = first_working_day_check(date(2024, 5, 7), &holidays());
        assert_eq!(decision, GateDecision::Run);
    }

    #[test]
    fn non_working_day_skips() {
        let decision = first_working_day_check(date(2024, 5, 6), &holidays());
        assert_eq!(
            decision,
            GateDecision::Skip(SkipReason::NotWorkingDay(date(2024, 5, 6)))
        );
    }

    #[test]
    fn first_week_after_closedown_runs_on_first_working_day() {
        // 2025-01-01 is a Wednesday bank holiday; 2024-12-30 and 31 are closedown
        let holidays: BankHolidays = [date(2025, 1, 1)].into_iter().collect();
        assert_eq!(
            first_working_day_check(date(2025, 1, 2), &holidays),
            GateDecision::Run
        );
        assert!(matches!(
            first_working_day_check(date(2025, 1, 3), &holidays),
            GateDecision::Skip(SkipReason::EarlierWorkingDay(_))
        ));
    }
}
