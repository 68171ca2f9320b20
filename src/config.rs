use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::mailer::SmtpRelay;
use lettre::message::{Mailbox, Mailboxes};
use std::env;
use std::fs;
use std::path::Path;
use url::Url;

/// Settings for one run, resolved from the environment at startup.
///
/// Every required value is checked and every referenced file is read when the
/// configuration is built, so a misconfigured deployment fails before the feed
/// is fetched.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Location of the vacancy XML feed
    pub feed_url: Url,
    /// Sender mailbox, also used for the SMTP envelope
    pub email_from: Mailbox,
    /// Recipient mailboxes, also used for the SMTP envelope
    pub email_to: Mailboxes,
    pub email_subject: String,
    /// Relay to submit through; only needed when actually sending
    pub smtp_server: Option<SmtpRelay>,
    /// HTML fragment placed above the vacancy list
    pub html_preamble: String,
    /// Stylesheet inlined into the HTML body
    pub html_css: String,
    /// Plain text placed above the vacancy list
    pub text_preamble: String,
    /// Prefix for the "More details" link in the text body
    pub details_base_url: String,
    pub bank_holidays_url: String,
    /// Division of the bank-holiday calendar to honour
    pub bank_holiday_division: String,
}

impl MailerConfig {
    /// Loads configuration from the process environment.
    ///
    /// A `.env` file in the working directory is honoured if present; variables
    /// already set in the environment take precedence over it.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or empty, or if a
    /// URL, mailbox or relay address does not parse. Returns `IoError` if one of
    /// the preamble or stylesheet files cannot be read.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> AppResult<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::ConfigError(format!("{key} is not set")))
        };

        let feed_url = Url::parse(&required(FEED_URL_VAR)?)
            .map_err(|e| AppError::ConfigError(format!("{FEED_URL_VAR} is not a valid URL: {e}")))?;

        let email_from: Mailbox = required(EMAIL_FROM_VAR)?
            .parse()
            .map_err(|e| AppError::ConfigError(format!("{EMAIL_FROM_VAR} is not a mailbox: {e}")))?;
        let email_to: Mailboxes = required(EMAIL_TO_VAR)?
            .parse()
            .map_err(|e| AppError::ConfigError(format!("{EMAIL_TO_VAR} is not a mailbox list: {e}")))?;
        let email_subject = required(EMAIL_SUBJECT_VAR)?;

        let smtp_server = lookup(SMTP_SERVER_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<SmtpRelay>())
            .transpose()?;

        let html_preamble = read_file(HTML_PREAMBLE_FILE_VAR, &required(HTML_PREAMBLE_FILE_VAR)?)?;
        let html_css = read_file(HTML_CSS_FILE_VAR, &required(HTML_CSS_FILE_VAR)?)?;
        let text_preamble = read_file(TEXT_PREAMBLE_FILE_VAR, &required(TEXT_PREAMBLE_FILE_VAR)?)?;

        let details_base_url = lookup(DETAILS_BASE_URL_VAR)
            .unwrap_or_else(|| DEFAULT_DETAILS_BASE_URL.to_string());
        let bank_holidays_url = lookup(BANK_HOLIDAYS_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BANK_HOLIDAYS_URL.to_string());
        let bank_holiday_division = lookup(BANK_HOLIDAY_DIVISION_VAR)
            .unwrap_or_else(|| DEFAULT_BANK_HOLIDAY_DIVISION.to_string());

        Ok(Self {
            feed_url,
            email_from,
            email_to,
            email_subject,
            smtp_server,
            html_preamble,
            html_css,
            text_preamble,
            details_base_url,
            bank_holidays_url,
            bank_holiday_division,
        })
    }

    /// Returns the SMTP relay, failing if none was configured.
    pub fn require_smtp_server(&self) -> AppResult<&SmtpRelay> {
        self.smtp_server
            .as_ref()
            .ok_or_else(|| AppError::ConfigError(format!("{SMTP_SERVER_VAR} is not set")))
    }
}

fn read_file(key: &str, path: &str) -> AppResult<String> {
    fs::read_to_string(Path::new(path))
        .map_err(|e| AppError::IoError(format!("Failed to read {key} ({path}): {e}")))
}
