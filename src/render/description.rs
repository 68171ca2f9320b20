use crate::constants::*;
use crate::errors::{AppError, AppResult};
use scraper::Html;
use std::fmt;

/// Annotations derived from markers in a vacancy description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags {
    pub internal_only: bool,
    pub readvertisement: bool,
}

impl Tags {
    /// Detects markers anywhere in the description text.
    pub fn from_text(text: &str) -> Self {
        Self {
            internal_only: text.contains(INTERNAL_MARKER),
            readvertisement: text.contains(READVERTISEMENT_MARKER),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.internal_only && !self.readvertisement
    }

    /// Formats the tags as a byline suffix, including the leading space.
    /// Empty when no marker is present.
    pub fn suffix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" {self}")
        }
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = [
            (self.internal_only, INTERNAL_TAG),
            (self.readvertisement, READVERTISEMENT_TAG),
        ]
        .into_iter()
        .filter_map(|(present, tag)| present.then_some(tag))
        .collect();

        if tags.is_empty() {
            Ok(())
        } else {
            write!(f, "({})", tags.join(", "))
        }
    }
}

/// The parts of an HTML description shown in the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionSummary {
    /// First meaningful text node, trimmed
    pub first_paragraph: String,
    pub tags: Tags,
}

/// Extracts the summary paragraph and tags from a vacancy's HTML description.
///
/// The summary is the first text node that is not blank and carries neither the
/// `INTERNAL` nor the `ADVERTISEMENT` marker.
///
/// # Errors
///
/// Returns `RenderError` if the description has no such text node.
pub fn summarize_description(vacancy_id: &str, html: &str) -> AppResult<DescriptionSummary> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let first_paragraph = root
        .text()
        .map(str::trim)
        .find(|text| {
            !text.is_empty()
                && !text.contains(INTERNAL_MARKER)
                && !text.contains(READVERTISEMENT_MARKER)
        })
        .ok_or_else(|| {
            AppError::RenderError(format!(
                "Vacancy {vacancy_id} has no summary paragraph in its description"
            ))
        })?
        .to_string();

    let full_text: String = root.text().collect();

    Ok(DescriptionSummary {
        first_paragraph,
        tags: Tags::from_text(&full_text),
    })
}
