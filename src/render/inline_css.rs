//! Copies stylesheet rules into `style` attributes.
//!
//! Many mail clients drop `<style>` blocks, so every rule the HTML rewriter can
//! match is written onto the elements it selects.

use crate::errors::{AppError, AppResult};
use lol_html::html_content::Element;
use lol_html::{ElementContentHandlers, HandlerResult, HtmlRewriter, Selector, Settings};
use quick_xml::escape::unescape;
use regex::Regex;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

const CSS_COMMENT_PATTERN: &str = r"(?s)/\*.*?\*/";
/// Marks elements matched by at least one rule, indexing their collected declarations
const INLINE_ID_ATTR: &str = "data-inline-style-id";

static CSS_COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();

/// One `selector { declarations }` rule, split per selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
}

/// Parses the plain rules of a stylesheet, in source order.
///
/// At-rules (`@media`, `@font-face`, ...) are skipped with their whole block.
/// A selector list becomes one rule per selector.
pub fn parse_stylesheet(css: &str) -> Vec<CssRule> {
    let comments = CSS_COMMENT_REGEX.get_or_init(|| {
        Regex::new(CSS_COMMENT_PATTERN).expect("CSS_COMMENT_PATTERN is a valid regex pattern")
    });
    let css = comments.replace_all(css, "");

    let mut rules = Vec::new();
    let mut rest: &str = &css;

    while let Some(open) = rest.find('{') {
        let prelude = rest[..open].trim();
        let body_start = open + 1;

        if prelude.starts_with('@') {
            rest = skip_block(&rest[body_start..]);
            continue;
        }

        let Some(close) = rest[body_start..].find('}') else {
            break;
        };
        let body = &rest[body_start..body_start + close];
        let declarations = parse_declarations(body);

        if !declarations.is_empty() {
            rules.extend(
                prelude
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|selector| CssRule {
                        selector: selector.to_string(),
                        declarations: declarations.clone(),
                    }),
            );
        }
        rest = &rest[body_start + close + 1..];
    }

    rules
}

/// Returns what follows the block whose opening brace was just consumed.
fn skip_block(after_open: &str) -> &str {
    let mut depth = 1usize;
    for (i, ch) in after_open.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &after_open[i + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

/// Parses `prop: value; prop: value` into ordered pairs; property names are lowercased.
///
/// Semicolons inside quotes or parentheses belong to the value, as in
/// `url(data:image/png;base64,...)`.
pub fn parse_declarations(body: &str) -> Vec<(String, String)> {
    split_declarations(body)
        .into_iter()
        .filter_map(|decl| decl.split_once(':'))
        .map(|(prop, value)| (prop.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(prop, value)| !prop.is_empty() && !value.is_empty())
        .collect()
}

fn split_declarations(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in body.char_indices() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

/// Later declarations replace earlier ones for the same property.
fn merge_declarations(target: &mut Vec<(String, String)>, incoming: &[(String, String)]) {
    for (prop, value) in incoming {
        match target.iter_mut().find(|(existing, _)| existing == prop) {
            Some(slot) => slot.1 = value.clone(),
            None => target.push((prop.clone(), value.clone())),
        }
    }
}

fn format_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(prop, value)| format!("{prop}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[inline]
fn element_handler<F>(handler: F) -> F
where
    F: FnMut(&mut Element<'_, '_>) -> HandlerResult,
{
    handler
}

fn rewrite<F>(html: &str, selector: &Selector, handler: F) -> AppResult<String>
where
    F: FnMut(&mut Element<'_, '_>) -> HandlerResult,
{
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![(
                Cow::Borrowed(selector),
                ElementContentHandlers::default().element(handler),
            )],
            ..Settings::new()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| AppError::RenderError(format!("Failed to inline CSS: {e}")))?;
    rewriter
        .end()
        .map_err(|e| AppError::RenderError(format!("Failed to inline CSS: {e}")))?;

    String::from_utf8(output)
        .map_err(|e| AppError::RenderError(format!("Inlined HTML is not UTF-8: {e}")))
}

/// Undoes the entity escaping the rewriter leaves in raw attribute values.
fn decode_attribute(value: &str) -> String {
    unescape(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Inlines `css` into `html`.
///
/// Rules are applied in stylesheet order and declarations already present in an
/// element's `style` attribute take precedence over all of them. Selectors the
/// rewriter does not support are skipped. Matched declarations are collected per
/// element and each `style` attribute is written once, at the end.
///
/// # Errors
///
/// Returns `RenderError` if the HTML cannot be rewritten.
pub fn inline_css(html: &str, css: &str) -> AppResult<String> {
    let mut collected: Vec<Vec<(String, String)>> = Vec::new();
    let mut html = html.to_string();

    for rule in parse_stylesheet(css) {
        let selector = match Selector::from_str(&rule.selector) {
            Ok(selector) => selector,
            Err(e) => {
                debug!(selector = %rule.selector, error = %e, "Skipping CSS rule");
                continue;
            }
        };

        html = rewrite(
            &html,
            &selector,
            element_handler(|el| {
                let known = el
                    .get_attribute(INLINE_ID_ATTR)
                    .and_then(|value| value.parse::<usize>().ok())
                    .filter(|id| *id < collected.len());
                let id = match known {
                    Some(id) => id,
                    None => {
                        let id = collected.len();
                        el.set_attribute(INLINE_ID_ATTR, &id.to_string())?;
                        collected.push(Vec::new());
                        id
                    }
                };
                merge_declarations(&mut collected[id], &rule.declarations);
                Ok(())
            }),
        )?;
    }

    if collected.is_empty() {
        return Ok(html);
    }

    let tagged = Selector::from_str(&format!("[{INLINE_ID_ATTR}]"))
        .map_err(|e| AppError::RenderError(format!("Invalid attribute selector: {e}")))?;

    rewrite(
        &html,
        &tagged,
        element_handler(|el| {
            let matched = el
                .get_attribute(INLINE_ID_ATTR)
                .and_then(|value| value.parse::<usize>().ok())
                .and_then(|id| collected.get(id))
                .cloned();
            el.remove_attribute(INLINE_ID_ATTR);

            let Some(mut declarations) = matched else {
                return Ok(());
            };
            if let Some(own) = el.get_attribute("style") {
                merge_declarations(&mut declarations, &parse_declarations(&decode_attribute(&own)));
            }
            el.set_attribute("style", &format_declarations(&declarations))?;
            Ok(())
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prop: &str, value: &str) -> (String, String) {
        (prop.to_string(), value.to_string())
    }

    #[test]
    fn parse_stylesheet_splits_selector_lists_and_skips_at_rules() {
        let css = r#"
            /* heading { colour } */
            h1, .title { color: navy; FONT-SIZE: 18px }
            @media (max-width: 600px) { h1 { font-size: 12px; } }
            .salary { font-weight: bold; }
        "#;
        let rules = parse_stylesheet(css);

        let selectors: Vec<_> = rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec!["h1", ".title", ".salary"]);
        assert_eq!(
            rules[0].declarations,
            vec![decl("color", "navy"), decl("font-size", "18px")]
        );
    }

    #[test]
    fn parse_declarations_keeps_colons_in_values() {
        assert_eq!(
            parse_declarations("background: url(http://example.com/a.png); ;bad"),
            vec![decl("background", "url(http://example.com/a.png)")]
        );
    }

    #[test]
    fn rules_are_inlined_onto_matching_elements() {
        let html = r#"<div class="vacancy"><h1>Title</h1><span class="salary">Grade 6</span></div>"#;
        let css = "h1 { color: navy; } .vacancy .salary { font-weight: bold; }";

        let out = inline_css(html, css).unwrap();
        assert!(out.contains(r#"<h1 style="color: navy">Title</h1>"#));
        assert!(out.contains(r#"<span class="salary" style="font-weight: bold">"#));
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        let out = inline_css(
            "<p class=\"x\">a</p>",
            "p { color: red; margin: 0 } .x { color: blue }",
        )
        .unwrap();
        assert!(out.contains(r#"style="color: blue; margin: 0""#));
    }

    #[test]
    fn existing_inline_style_wins() {
        let out = inline_css(
            r#"<p style="color: green">a</p>"#,
            "p { color: red; padding: 1px }",
        )
        .unwrap();
        assert!(out.contains(r#"style="color: green; padding: 1px""#));
        assert!(!out.contains(INLINE_ID_ATTR));
    }

    #[test]
    fn quoted_values_survive_several_matching_rules() {
        let out = inline_css(
            "<h1 class=\"t\">x</h1>",
            "h1 { font-family: \"Helvetica Neue\", Arial } .t { color: navy }",
        )
        .unwrap();
        assert!(out.contains(
            r#"style="font-family: &quot;Helvetica Neue&quot;, Arial; color: navy""#
        ));
    }

    #[test]
    fn own_quoted_style_is_decoded_before_merging() {
        let out = inline_css(
            r#"<p style='font-family: "Gill Sans"; color: green'>a</p>"#,
            "p { color: red; margin: 0 }",
        )
        .unwrap();
        assert!(out.contains(
            r#"style="color: green; margin: 0; font-family: &quot;Gill Sans&quot;""#
        ));
    }

    #[test]
    fn data_uris_keep_their_semicolons() {
        let out = inline_css(
            "<div class=\"logo\">x</div>",
            "div { background: url(data:image/png;base64,iVBORw0KGgo=) } .logo { color: red }",
        )
        .unwrap();
        assert!(out.contains(
            r#"style="background: url(data:image/png;base64,iVBORw0KGgo=); color: red""#
        ));
    }

    #[test]
    fn parse_declarations_ignores_semicolons_in_quotes_and_parens() {
        assert_eq!(
            parse_declarations("content: 'a;b'; background: url(x;y) no-repeat"),
            vec![decl("content", "'a;b'"), decl("background", "url(x;y) no-repeat")]
        );
    }

    #[test]
    fn unsupported_selectors_are_skipped() {
        let out = inline_css("<a href=\"#\">x</a>", "a:hover { color: red } a { color: blue }").unwrap();
        assert!(out.contains(r#"style="color: blue""#));
    }

    #[test]
    fn elements_without_rules_are_untouched() {
        let html = "<div><em>plain</em></div>";
        assert_eq!(inline_css(html, "h1 { color: navy }").unwrap(), html);
    }
}
