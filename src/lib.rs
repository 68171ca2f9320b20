//! vacancy-mailer library
//!
//! This crate provides the core functionality for the `vacancy-mailer` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! One run is a linear pipeline with optional stages around it:
//!
//! - [`feed`] - Fetches the vacancy XML feed and parses it into [`models::Vacancy`] values
//! - [`seen`] - Loads and rewrites the seen-before file and computes newly appeared vacancies
//! - [`render`] - Renders the HTML (with inlined CSS) and plain-text email bodies
//! - [`mailer`] - Composes the multipart email and sends it over SMTP or prints it
//! - [`gates`] - Optional stages, such as only running on the first working day of the week
//! - [`pipeline`] - The core fetch → render → send → persist run
//! - [`cli`] - Command-line interface wiring the above together
//! - [`config`] - Environment-driven configuration
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use vacancy_mailer::{cli, config::MailerConfig, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! let config = MailerConfig::from_env()?;
//! let options = cli::CliOptions {
//!     dry_run: true,
//!     ..Default::default()
//! };
//! let outcome = cli::run_workflow(
//!     &config,
//!     &options,
//!     chrono::Utc::now(),
//!     chrono::Local::now().date_naive(),
//! )
//! .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod feed;
pub mod gates;
pub mod mailer;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod seen;
pub mod telemetry;
