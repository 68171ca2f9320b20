use crate::config::MailerConfig;
use crate::errors::{AppError, AppResult};
use crate::gates::{self, CalendarSource, WorkingDayGate};
use crate::mailer::Delivery;
use crate::models::RunOutcome;
use crate::pipeline::Pipeline;
use crate::seen::SeenTracker;
use crate::telemetry;
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing::level_filters::LevelFilter;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Options taken from the command line; everything else comes from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub log_level: Option<LevelFilter>,
    /// Print the email instead of sending it
    pub dry_run: bool,
    /// Only send on the first working day of the week
    pub first_working_day: bool,
    /// File holding the vacancy ids seen on the previous run
    pub seen_before: Option<String>,
}

/// Builds the argument parser. There are no subcommands.
pub fn build_command() -> Command<'static> {
    Command::new("vacancy-mailer")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .after_help(
            "Feed, addresses, relay and templates are read from FEED_URL, EMAIL_FROM,\n\
             EMAIL_TO, EMAIL_SUBJECT, SMTP_SERVER, HTML_PREAMBLE_FILE, HTML_CSS_FILE\n\
             and TEXT_PREAMBLE_FILE.\nExample:\n  vacancy-mailer -w -s ~/.vacancies-seen -l info",
        )
        .arg(
            Arg::new("log_level")
                .short('l')
                .long("log-level")
                .help("Logging level (trace, debug, info, warning, error)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("dry_run")
                .short('d')
                .long("dry-run")
                .help("Print email instead of emailing it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("first_working_day")
                .short('w')
                .long("only-first-working-day")
                .help("Only send if today is the first working day of the week")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seen_before")
                .short('s')
                .long("seen-before")
                .help("File containing vacancies seen before")
                .action(ArgAction::Set),
        )
}

/// Extracts [`CliOptions`] from parsed arguments.
///
/// # Errors
///
/// Returns `InvalidInput` if the log level is not recognised.
pub fn options_from_matches(matches: &ArgMatches) -> AppResult<CliOptions> {
    let log_level = matches
        .get_one::<String>("log_level")
        .map(|level| telemetry::parse_log_level(level))
        .transpose()?;

    Ok(CliOptions {
        log_level,
        dry_run: matches.get_flag("dry_run"),
        first_working_day: matches.get_flag("first_working_day"),
        seen_before: matches.get_one::<String>("seen_before").cloned(),
    })
}

/// Parses the process arguments, loads configuration and runs once.
///
/// An invalid log level prints a message to stderr and exits with status 1.
/// Every other failure is returned to `main`.
pub async fn cli() -> AppResult<RunOutcome> {
    let matches = build_command().get_matches();
    let options = match options_from_matches(&matches) {
        Ok(options) => options,
        Err(AppError::InvalidInput(msg)) => {
            eprintln!("{msg}");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    telemetry::init(options.log_level)?;
    let config = MailerConfig::from_env()?;

    run_workflow(&config, &options, Utc::now(), Local::now().date_naive()).await
}

/// Wires the pipeline and its gates for one invocation and runs it.
///
/// `now` drives the closing-soon badges and `today` the working-day gate.
pub async fn run_workflow(
    config: &MailerConfig,
    options: &CliOptions,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> AppResult<RunOutcome> {
    let delivery = Delivery::for_run(options.dry_run, config)?;
    let seen = SeenTracker::new(options.seen_before.as_deref());
    let client = reqwest::Client::new();

    info!(
        dry_run = options.dry_run,
        first_working_day = options.first_working_day,
        seen_before = options.seen_before.as_deref().unwrap_or("none"),
        "Starting vacancy mailer"
    );

    let core = Pipeline {
        config,
        client: &client,
        delivery: &delivery,
        seen: &seen,
        now,
    }
    .into_stage();

    let working_day_gate = options.first_working_day.then(|| WorkingDayGate {
        client: &client,
        source: CalendarSource {
            url: config.bank_holidays_url.clone(),
            division: config.bank_holiday_division.clone(),
        },
        today,
    });

    let outcome = gates::compose(core, working_day_gate)().await?;

    match &outcome {
        RunOutcome::Sent {
            vacancies,
            new_vacancies,
        } => info!(
            vacancies = *vacancies,
            new_vacancies = *new_vacancies,
            "Vacancy email dispatched"
        ),
        RunOutcome::Skipped(reason) => info!(%reason, "Vacancy email skipped"),
    }

    Ok(outcome)
}
