//! Common test utilities for integration tests

use std::collections::BTreeSet;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use vacancy_mailer::config::MailerConfig;

/// A canned HTTP response for one request path
#[allow(dead_code)]
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

#[allow(dead_code)]
impl Route {
    pub fn ok(path: &'static str, body: &str) -> Self {
        Self {
            path,
            status: 200,
            body: body.to_string(),
        }
    }
}

/// Serves `routes` over plain HTTP on an ephemeral local port until the test ends.
/// Unknown paths answer 404. Returns the base URL, e.g. `http://127.0.0.1:40000`.
#[allow(dead_code)]
pub async fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }

            let request = String::from_utf8_lossy(&request);
            let path = request.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes
                .iter()
                .find(|route| route.path == path)
                .map(|route| (route.status, route.body.as_str()))
                .unwrap_or((404, "not found"));

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}

/// Configuration pointing at `base_url`, with inline templates.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> MailerConfig {
    MailerConfig {
        feed_url: Url::parse(&format!("{base_url}/vacancies.xml")).unwrap(),
        email_from: "Vacancies <vacancies@example.com>".parse().unwrap(),
        email_to: "staff@example.com".parse().unwrap(),
        email_subject: "Current vacancies".to_string(),
        smtp_server: None,
        html_preamble: "<p class=\"intro\">Current vacancies</p>".to_string(),
        html_css: "h1 { font-size: 16px; } .intro { color: grey; }".to_string(),
        text_preamble: "Current vacancies\n\n".to_string(),
        details_base_url: "https://data.ox.ac.uk/v/".to_string(),
        bank_holidays_url: format!("{base_url}/bank-holidays.json"),
        bank_holiday_division: "england-and-wales".to_string(),
    }
}

#[allow(dead_code)]
pub fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Sample feed with two vacancies
#[allow(dead_code)]
pub const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<vacancies>
  <vacancy id="170001">
    <label>Research Associate in Immunology</label>
    <salary><label>Grade 7: &#163;36,024 - &#163;44,263 p.a.</label></salary>
    <closes>2024-05-20T12:00:00+01:00</closes>
    <webpage>https://example.com/vacancies/170001</webpage>
    <description media_type="text/html">&lt;div&gt;&lt;p&gt;We seek a research associate to study T cells.&lt;/p&gt;&lt;/div&gt;</description>
  </vacancy>
  <vacancy id="170002">
    <label>Library Assistant</label>
    <salary><label>Grade 3</label></salary>
    <closes>unknown</closes>
    <webpage>https://example.com/vacancies/170002</webpage>
    <description media_type="text/html">&lt;p&gt;INTERNAL CANDIDATES ONLY&lt;/p&gt;&lt;p&gt;Help readers find books.&lt;/p&gt;</description>
  </vacancy>
</vacancies>"#;

/// Calendar with no relevant holidays
#[allow(dead_code)]
pub const EMPTY_CALENDAR: &str =
    r#"{"england-and-wales": {"division": "england-and-wales", "events": []}}"#;
