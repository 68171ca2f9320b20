use crate::config::MailerConfig;
use crate::errors::AppResult;
use crate::feed::fetch_vacancies;
use crate::gates::{stage, Stage};
use crate::mailer::{compose_email, Delivery};
use crate::models::{vacancy_ids, RunOutcome};
use crate::render::{render_bodies, RenderContext};
use crate::seen::{new_vacancies, SeenTracker};
use chrono::{DateTime, Utc};
use tracing::info;

/// The core fetch, render, send and persist run.
pub struct Pipeline<'a> {
    pub config: &'a MailerConfig,
    pub client: &'a reqwest::Client,
    pub delivery: &'a Delivery,
    pub seen: &'a SeenTracker,
    /// Reference instant for closing-soon badges
    pub now: DateTime<Utc>,
}

impl<'a> Pipeline<'a> {
    /// Runs the pipeline once.
    ///
    /// Every vacancy in the feed is rendered; the seen-before file only decides
    /// which ones carry a "new" badge. The file is rewritten after the send step
    /// returns successfully, which includes a dry run. Any failure before that
    /// leaves the file untouched.
    pub async fn run(&self) -> AppResult<RunOutcome> {
        let vacancies = fetch_vacancies(self.client, &self.config.feed_url).await?;
        let current = vacancy_ids(&vacancies);

        let seen = self.seen.load().await?;
        let new = new_vacancies(&current, seen.as_ref());
        info!(
            vacancies = vacancies.len(),
            new_vacancies = new.len(),
            "Computed new vacancies"
        );

        let context = RenderContext {
            html_preamble: &self.config.html_preamble,
            css: &self.config.html_css,
            text_preamble: &self.config.text_preamble,
            details_base_url: &self.config.details_base_url,
            now: self.now,
        };
        let bodies = render_bodies(&vacancies, &new, &context)?;

        let message = compose_email(self.config, &bodies)?;
        self.delivery.send(message).await?;

        self.seen.persist(&current).await?;

        Ok(RunOutcome::Sent {
            vacancies: vacancies.len(),
            new_vacancies: new.len(),
        })
    }

    /// Defers the run so gates can wrap it.
    pub fn into_stage(self) -> Stage<'a> {
        stage(move || async move { self.run().await })
    }
}
