use super::xml_parser::parse_feed_bytes;
use crate::errors::AppResult;
use crate::models::Vacancy;
use tracing::{debug, info};
use url::Url;

/// Downloads the raw feed document.
///
/// # Errors
///
/// Returns `NetworkError` if the request fails or the server answers with a
/// 4xx/5xx status.
pub async fn fetch_feed(client: &reqwest::Client, feed_url: &Url) -> AppResult<Vec<u8>> {
    let body = client
        .get(feed_url.as_str())
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    debug!(bytes = body.len(), "Feed downloaded");
    Ok(body.to_vec())
}

/// Fetches the feed and parses it into vacancies, in feed order.
///
/// Any network or parse failure aborts the run; nothing is sent for a partial feed.
pub async fn fetch_vacancies(client: &reqwest::Client, feed_url: &Url) -> AppResult<Vec<Vacancy>> {
    info!(url = %feed_url, "Fetching vacancy feed");
    let body = fetch_feed(client, feed_url).await?;
    let vacancies = parse_feed_bytes(&body)?;
    info!(vacancies = vacancies.len(), "Vacancy feed parsed");
    Ok(vacancies)
}
