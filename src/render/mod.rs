//! Rendering of the vacancy list into the two email bodies.
//!
//! Each vacancy is summarised once ([`RenderedVacancy`]) and the same summary
//! feeds both the HTML body and the plain-text body, so the two always list the
//! same vacancies in feed order.

mod closing;
mod description;
mod html;
mod inline_css;
mod text;

use crate::errors::AppResult;
use crate::models::Vacancy;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

// Re-export public API
pub use closing::ClosingDate;
pub use description::{summarize_description, DescriptionSummary, Tags};
pub use inline_css::{inline_css, parse_stylesheet, CssRule};
pub use text::wrap_text;

/// Inputs to rendering that do not come from the feed.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub html_preamble: &'a str,
    pub css: &'a str,
    pub text_preamble: &'a str,
    pub details_base_url: &'a str,
    /// Reference instant for the closing-soon check
    pub now: DateTime<Utc>,
}

/// Both bodies of the digest email, UTF-8 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailBodies {
    pub html: String,
    pub text: String,
}

/// Everything derived from one vacancy that either body needs.
#[derive(Debug, Clone)]
pub struct RenderedVacancy<'a> {
    pub vacancy: &'a Vacancy,
    pub summary: DescriptionSummary,
    pub closing: ClosingDate,
    pub closes_soon: bool,
    /// Appeared since the previous run; only the HTML body shows this
    pub is_new: bool,
}

impl<'a> RenderedVacancy<'a> {
    pub fn new(
        vacancy: &'a Vacancy,
        new_vacancies: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let summary = summarize_description(&vacancy.id, &vacancy.description_html)?;
        let closing = ClosingDate::parse(vacancy.closes.as_deref());

        Ok(Self {
            vacancy,
            summary,
            closes_soon: closing.closes_soon(now),
            closing,
            is_new: new_vacancies.contains(&vacancy.id),
        })
    }
}

/// Renders the HTML and plain-text bodies for `vacancies`.
///
/// `new_vacancies` only controls the "new" badge; every vacancy is rendered.
///
/// # Errors
///
/// Returns `RenderError` if a description has no usable summary paragraph or
/// the HTML cannot be rewritten.
pub fn render_bodies(
    vacancies: &[Vacancy],
    new_vacancies: &BTreeSet<String>,
    context: &RenderContext<'_>,
) -> AppResult<EmailBodies> {
    let rendered = vacancies
        .iter()
        .map(|vacancy| RenderedVacancy::new(vacancy, new_vacancies, context.now))
        .collect::<AppResult<Vec<_>>>()?;

    debug!(
        vacancies = rendered.len(),
        new_vacancies = rendered.iter().filter(|v| v.is_new).count(),
        closing_soon = rendered.iter().filter(|v| v.closes_soon).count(),
        "Rendering email bodies"
    );

    Ok(EmailBodies {
        html: html::render_html(context.css, context.html_preamble, &rendered)?,
        text: text::render_text(context.text_preamble, &rendered, context.details_base_url),
    })
}
