use super::inline_css::inline_css;
use super::RenderedVacancy;
use crate::constants::{MORE_DETAILS_LABEL, NEW_BADGE};
use crate::errors::AppResult;
use quick_xml::escape::escape;

/// Renders one `<div class="vacancy">` block.
pub(super) fn render_vacancy(vacancy: &RenderedVacancy<'_>) -> String {
    let new_badge = if vacancy.is_new {
        format!(r#" <span class="new">{NEW_BADGE}</span>"#)
    } else {
        String::new()
    };
    let closes_class = if vacancy.closes_soon {
        "closes closes-soon"
    } else {
        "closes"
    };

    format!(
        concat!(
            r#"<div class="vacancy">"#,
            r#"<h1>{title}{new_badge}</h1>"#,
            r#"<div class="byline"><span class="salary">{salary}</span>; closes: "#,
            r#"<span class="{closes_class}">{closes}</span>{tags}</div>"#,
            r#"<div class="description">{summary}</div>"#,
            r#"<div><a href="{webpage}">{more}</a></div>"#,
            r#"</div>"#,
        ),
        title = escape(vacancy.vacancy.label.as_str()),
        new_badge = new_badge,
        salary = escape(vacancy.vacancy.salary.as_str()),
        closes_class = closes_class,
        closes = escape(vacancy.closing.display()),
        tags = escape(vacancy.summary.tags.suffix()),
        summary = escape(vacancy.summary.first_paragraph.as_str()),
        webpage = escape(vacancy.vacancy.webpage.as_str()),
        more = MORE_DETAILS_LABEL,
    )
}

/// Assembles the HTML body and inlines `css` into it.
///
/// The stylesheet is also kept in `<head>` for clients that honour it, which
/// covers rules that cannot be inlined such as pseudo-classes.
pub(super) fn render_html(
    css: &str,
    preamble: &str,
    vacancies: &[RenderedVacancy<'_>],
) -> AppResult<String> {
    let blocks: String = vacancies.iter().map(render_vacancy).collect();
    let document = format!(
        r#"<html><head><style type="text/css">{css}</style></head><body>{preamble}<div>{blocks}</div></body></html>"#
    );
    inline_css(&document, css)
}
