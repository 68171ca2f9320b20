use crate::constants::HTML_MEDIA_TYPE;
use crate::errors::{AppError, AppResult};
use crate::models::Vacancy;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::Cursor;

/// Represents the vacancy field whose text is currently being collected
#[derive(Clone, Copy)]
enum VacancyField {
    Label,
    Salary,
    Closes,
    Webpage,
    Description,
}

/// Builder for constructing Vacancy structs during XML parsing.
/// Tracks the element path below the current `<vacancy>` so that the title
/// (`label`) and the salary (`salary/label`) are told apart.
struct VacancyBuilder {
    id: Option<String>,
    label: Option<String>,
    salary: Option<String>,
    closes: Option<String>,
    webpage: Option<String>,
    description_html: Option<String>,
    path: Vec<Vec<u8>>,
    current_field: Option<(VacancyField, usize)>,
    text: String,
}

impl VacancyBuilder {
    fn new() -> Self {
        Self {
            id: None,
            label: None,
            salary: None,
            closes: None,
            webpage: None,
            description_html: None,
            path: Vec::new(),
            current_field: None,
            text: String::new(),
        }
    }

    fn reset(&mut self, id: Option<String>) {
        self.id = id;
        self.label = None;
        self.salary = None;
        self.closes = None;
        self.webpage = None;
        self.description_html = None;
        self.path.clear();
        self.current_field = None;
        self.text.clear();
    }

    fn is_at_vacancy_level(&self) -> bool {
        self.path.is_empty()
    }

    fn enter(&mut self, element: &BytesStart<'_>) {
        self.path.push(element.name().as_ref().to_vec());
        if self.current_field.is_some() {
            return;
        }

        let names: Vec<&[u8]> = self.path.iter().map(Vec::as_slice).collect();
        let field = match names.as_slice() {
            [b"label"] => Some(VacancyField::Label),
            [b"salary", b"label"] => Some(VacancyField::Salary),
            [b"closes"] => Some(VacancyField::Closes),
            [b"webpage"] => Some(VacancyField::Webpage),
            // Only the first text/html description is used
            [b"description"]
                if self.description_html.is_none()
                    && attribute(element, b"media_type").as_deref() == Some(HTML_MEDIA_TYPE) =>
            {
                Some(VacancyField::Description)
            }
            _ => None,
        };

        if let Some(field) = field {
            self.current_field = Some((field, self.path.len()));
            self.text.clear();
        }
    }

    fn leave(&mut self) {
        if let Some((field, depth)) = self.current_field {
            if depth == self.path.len() {
                let value = self.text.trim().to_string();
                match field {
                    VacancyField::Label => self.label = Some(value),
                    VacancyField::Salary => self.salary = Some(value),
                    VacancyField::Closes => self.closes = Some(value).filter(|v| !v.is_empty()),
                    VacancyField::Webpage => self.webpage = Some(value),
                    VacancyField::Description => self.description_html = Some(value),
                }
                self.current_field = None;
                self.text.clear();
            }
        }
        self.path.pop();
    }

    fn is_capturing(&self) -> bool {
        self.current_field.is_some()
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn build(&mut self, position: usize) -> AppResult<Vacancy> {
        let id = self.id.take().ok_or_else(|| {
            AppError::ParseError(format!("Vacancy #{position} has no id attribute"))
        })?;
        let missing =
            |what: &str| AppError::ParseError(format!("Vacancy {id} has no {what}"));

        Ok(Vacancy {
            label: self.label.take().ok_or_else(|| missing("<label>"))?,
            salary: self.salary.take().ok_or_else(|| missing("<salary><label>"))?,
            closes: self.closes.take(),
            webpage: self.webpage.take().ok_or_else(|| missing("<webpage>"))?,
            description_html: self
                .description_html
                .take()
                .ok_or_else(|| missing("text/html <description>"))?,
            id,
        })
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn resolve_reference(reference: &BytesRef<'_>) -> AppResult<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| AppError::ParseError(format!("Invalid character reference: {e}")))?
    {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| AppError::ParseError(format!("Failed to decode XML reference: {e}")))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| AppError::ParseError(format!("Unknown entity &{name};")))
}

/// Parses a `<vacancies>` document into vacancies, preserving feed order.
///
/// # Errors
///
/// Returns `ParseError` if the document is not well-formed XML or a vacancy is
/// missing its id, title, salary, webpage or `text/html` description.
pub fn parse_feed_bytes(content: &[u8]) -> AppResult<Vec<Vacancy>> {
    let mut reader = Reader::from_reader(Cursor::new(content));
    let mut buf = Vec::with_capacity(8192);
    let mut result = Vec::new();

    // Depth of the element stack outside any vacancy
    let mut depth = 0usize;
    let mut root_is_vacancies = false;
    let mut inside_vacancy = false;
    let mut builder = VacancyBuilder::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if inside_vacancy {
                    builder.enter(&e);
                } else if depth == 1 && root_is_vacancies && e.name().as_ref() == b"vacancy" {
                    inside_vacancy = true;
                    builder.reset(attribute(&e, b"id"));
                } else {
                    if depth == 0 {
                        root_is_vacancies = e.name().as_ref() == b"vacancies";
                    }
                    depth += 1;
                }
            }
            Event::Empty(e) => {
                // A self-closing vacancy carries no fields and fails to build
                if !inside_vacancy
                    && depth == 1
                    && root_is_vacancies
                    && e.name().as_ref() == b"vacancy"
                {
                    builder.reset(attribute(&e, b"id"));
                    result.push(builder.build(result.len() + 1)?);
                }
            }
            Event::End(_) => {
                if inside_vacancy {
                    if builder.is_at_vacancy_level() {
                        inside_vacancy = false;
                        result.push(builder.build(result.len() + 1)?);
                    } else {
                        builder.leave();
                    }
                } else {
                    depth = depth.saturating_sub(1);
                }
            }
            Event::Text(e) if builder.is_capturing() => {
                let txt = e
                    .decode()
                    .map_err(|e| AppError::ParseError(format!("Failed to decode XML text: {e}")))?;
                builder.push_text(&txt);
            }
            Event::CData(e) if builder.is_capturing() => {
                let txt = e
                    .decode()
                    .map_err(|e| AppError::ParseError(format!("Failed to decode CDATA: {e}")))?;
                builder.push_text(&txt);
            }
            Event::GeneralRef(e) if builder.is_capturing() => {
                let txt = resolve_reference(&e)?;
                builder.push_text(&txt);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if inside_vacancy {
        return Err(AppError::ParseError(
            "Feed ended inside a <vacancy> element".into(),
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<vacancies>
  <vacancy id="123456">
    <label>Research Assistant in Ecology</label>
    <salary><label>Grade 7: &#163;36,024 - &#163;44,263 p.a.</label></salary>
    <closes>2024-03-01T12:00:00+00:00</closes>
    <webpage>https://example.com/vacancies/123456</webpage>
    <description media_type="text/plain">Plain summary</description>
    <description media_type="text/html">&lt;div&gt;&lt;p&gt;Join the team.&lt;/p&gt;&lt;/div&gt;</description>
  </vacancy>
  <vacancy id="123457">
    <label>Lab Technician &amp; Safety Officer</label>
    <salary><label>Grade 5</label></salary>
    <closes></closes>
    <webpage>https://example.com/vacancies/123457</webpage>
    <description media_type="text/html"><![CDATA[<p>INTERNAL CANDIDATES ONLY</p><p>Run the lab.</p>]]></description>
  </vacancy>
</vacancies>"#;

    #[test]
    fn test_parse_feed_all_fields_populated() {
        let result = parse_feed_bytes(FEED.as_bytes()).unwrap();
        assert_eq!(result.len(), 2);

        let first = &result[0];
        assert_eq!(first.id, "123456");
        assert_eq!(first.label, "Research Assistant in Ecology");
        assert_eq!(first.salary, "Grade 7: \u{a3}36,024 - \u{a3}44,263 p.a.");
        assert_eq!(first.closes.as_deref(), Some("2024-03-01T12:00:00+00:00"));
        assert_eq!(first.webpage, "https://example.com/vacancies/123456");
        assert_eq!(first.description_html, "<div><p>Join the team.</p></div>");
    }

    #[test]
    fn test_parse_feed_entities_cdata_and_empty_closes() {
        let result = parse_feed_bytes(FEED.as_bytes()).unwrap();
        let second = &result[1];
        assert_eq!(second.label, "Lab Technician & Safety Officer");
        assert_eq!(second.closes, None);
        assert_eq!(
            second.description_html,
            "<p>INTERNAL CANDIDATES ONLY</p><p>Run the lab.</p>"
        );
    }

    #[test]
    fn test_parse_feed_preserves_order() {
        let ids: Vec<_> = parse_feed_bytes(FEED.as_bytes())
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["123456", "123457"]);
    }

    #[test]
    fn test_parse_feed_no_vacancies() {
        let result = parse_feed_bytes(b"<?xml version=\"1.0\"?><vacancies></vacancies>").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_feed_ignores_vacancies_under_other_roots() {
        let xml = r#"<feed><vacancy id="1"><label>x</label></vacancy></feed>"#;
        assert!(parse_feed_bytes(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_missing_id_errors() {
        let xml = r#"<vacancies>
  <vacancy>
    <label>No id</label>
    <salary><label>Grade 1</label></salary>
    <webpage>https://example.com/</webpage>
    <description media_type="text/html">&lt;p&gt;x&lt;/p&gt;</description>
  </vacancy>
</vacancies>"#;
        let err = parse_feed_bytes(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::ParseError(ref msg) if msg.contains("id")));
    }

    #[test]
    fn test_parse_feed_missing_html_description_errors() {
        let xml = r#"<vacancies>
  <vacancy id="9">
    <label>Plain only</label>
    <salary><label>Grade 1</label></salary>
    <webpage>https://example.com/</webpage>
    <description media_type="text/plain">x</description>
  </vacancy>
</vacancies>"#;
        let err = parse_feed_bytes(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::ParseError(ref msg) if msg.contains("description")));
    }

    #[test]
    fn test_parse_feed_malformed() {
        let xml = r#"<vacancies><vacancy id="1"><label>unclosed</vacancy></vacancies>"#;
        assert!(parse_feed_bytes(xml.as_bytes()).is_err());
    }
}
