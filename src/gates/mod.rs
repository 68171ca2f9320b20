//! Optional stages wrapped around the core pipeline.
//!
//! A [`Stage`] is a deferred run of everything downstream. Gates take the next
//! stage and return a new one that may decide not to call it. The chain is
//! assembled once at startup by [`compose`].

mod working_day;

use crate::errors::AppResult;
use crate::models::RunOutcome;
use chrono::NaiveDate;
use futures::future::LocalBoxFuture;
use std::future::Future;

// Re-export public API
pub use working_day::{
    fetch_bank_holidays, first_working_day_check, is_working_day, only_first_working_day,
    parse_bank_holidays, BankHolidays, CalendarSource, GateDecision,
};

/// Future produced by running a stage.
pub type RunFuture<'a> = LocalBoxFuture<'a, AppResult<RunOutcome>>;

/// A deferred, single-use run of the pipeline from some point onwards.
///
/// Stages run on the single-threaded runtime, so neither they nor their futures
/// need to be `Send`.
pub type Stage<'a> = Box<dyn FnOnce() -> RunFuture<'a> + 'a>;

/// Boxes an async closure as a [`Stage`].
pub fn stage<'a, F, Fut>(run: F) -> Stage<'a>
where
    F: FnOnce() -> Fut + 'a,
    Fut: Future<Output = AppResult<RunOutcome>> + 'a,
{
    Box::new(move || -> RunFuture<'a> { Box::pin(run()) })
}

/// Settings for the first-working-day gate.
#[derive(Debug, Clone)]
pub struct WorkingDayGate<'a> {
    pub client: &'a reqwest::Client,
    pub source: CalendarSource,
    /// Local calendar date the decision is made for
    pub today: NaiveDate,
}

/// Wraps `core` in the gates enabled for this invocation.
///
/// Only the first-working-day gate wraps the run; the dry-run switch replaces
/// the send step inside the core and is not a stage.
pub fn compose<'a>(core: Stage<'a>, working_day_gate: Option<WorkingDayGate<'a>>) -> Stage<'a> {
    match working_day_gate {
        Some(gate) => only_first_working_day(gate.client, gate.source, gate.today, core),
        None => core,
    }
}
