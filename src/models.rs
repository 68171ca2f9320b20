use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// A single vacancy as it appears in the feed.
///
/// Built fresh from the fetched document on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vacancy {
    /// Identifier, unique within one feed snapshot
    pub id: String,
    /// Job title
    pub label: String,
    /// Human-readable salary band
    pub salary: String,
    /// Raw closing timestamp, if the feed carries one
    pub closes: Option<String>,
    /// Public page describing the vacancy
    pub webpage: String,
    /// The `text/html` description, still HTML
    pub description_html: String,
}

/// Collects the identifiers of a feed snapshot in sorted order.
pub fn vacancy_ids(vacancies: &[Vacancy]) -> BTreeSet<String> {
    vacancies.iter().map(|v| v.id.clone()).collect()
}

/// Why a gated run did not go ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Today is a weekend, a bank holiday or inside the Christmas closedown
    NotWorkingDay(NaiveDate),
    /// An earlier day this week was already a working day
    EarlierWorkingDay(NaiveDate),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotWorkingDay(day) => write!(f, "{day} is not a working day"),
            SkipReason::EarlierWorkingDay(day) => write!(f, "{day} was a working day"),
        }
    }
}

/// Result of one invocation of the (possibly gated) pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Sent {
        vacancies: usize,
        new_vacancies: usize,
    },
    Skipped(SkipReason),
}
