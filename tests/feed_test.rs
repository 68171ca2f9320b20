//! Integration tests for feed fetching

#[path = "common/mod.rs"]
mod common;

use common::*;
use url::Url;
use vacancy_mailer::errors::AppError;
use vacancy_mailer::feed;

#[tokio::test]
async fn test_fetch_vacancies_over_http() {
    let base = serve(vec![Route::ok("/vacancies.xml", SAMPLE_FEED)]).await;
    let client = reqwest::Client::new();
    let url = Url::parse(&format!("{base}/vacancies.xml")).unwrap();

    let vacancies = feed::fetch_vacancies(&client, &url).await.unwrap();

    assert_eq!(vacancies.len(), 2);
    assert_eq!(vacancies[0].id, "170001");
    assert_eq!(vacancies[0].salary, "Grade 7: \u{a3}36,024 - \u{a3}44,263 p.a.");
    assert_eq!(vacancies[1].label, "Library Assistant");
    assert!(vacancies[1].description_html.starts_with("<p>INTERNAL"));
}

#[tokio::test]
async fn test_fetch_feed_http_error_is_network_error() {
    let base = serve(vec![]).await;
    let client = reqwest::Client::new();
    let url = Url::parse(&format!("{base}/vacancies.xml")).unwrap();

    let err = feed::fetch_vacancies(&client, &url).await.unwrap_err();
    assert!(matches!(err, AppError::NetworkError(_)));
}

#[tokio::test]
async fn test_fetch_feed_malformed_body_is_parse_error() {
    let base = serve(vec![Route::ok("/vacancies.xml", "<vacancies><vacancy id=\"1\">")]).await;
    let client = reqwest::Client::new();
    let url = Url::parse(&format!("{base}/vacancies.xml")).unwrap();

    let err = feed::fetch_vacancies(&client, &url).await.unwrap_err();
    assert!(matches!(err, AppError::ParseError(_)));
}
