use super::RenderedVacancy;
use crate::constants::TEXT_WIDTH;

/// Fills `text` into lines of at most `width` characters.
///
/// Whitespace runs collapse to single spaces. Lines break between words or
/// after a hyphen inside a word (`well-` / `organised`), and a piece longer
/// than `width` is split across lines.
pub fn wrap_text(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        for (index, piece) in hyphen_pieces(word).into_iter().enumerate() {
            // Pieces after the first continue the same word, so no space before them
            let mut gap = usize::from(index == 0 && line_len > 0);
            let mut chars: Vec<char> = piece.chars().collect();

            loop {
                if line_len + gap + chars.len() <= width {
                    if gap > 0 {
                        line.push(' ');
                    }
                    line.extend(chars.iter());
                    line_len += gap + chars.len();
                    break;
                }

                if chars.len() > width {
                    let room = width.saturating_sub(line_len + gap);
                    if room > 0 {
                        if gap > 0 {
                            line.push(' ');
                        }
                        line.extend(chars.drain(..room));
                    }
                }

                lines.push(std::mem::take(&mut line));
                line_len = 0;
                gap = 0;
            }
        }
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines.join("\n")
}

/// Splits `word` after each hyphen that sits between a letter or digit and a letter.
fn hyphen_pieces(word: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut previous: Option<char> = None;
    let mut chars = word.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let next_is_letter = chars.peek().is_some_and(|&(_, next)| next.is_alphabetic());
        if ch == '-' && previous.is_some_and(char::is_alphanumeric) && next_is_letter {
            pieces.push(&word[start..=i]);
            start = i + 1;
        }
        previous = Some(ch);
    }
    pieces.push(&word[start..]);
    pieces
}

/// Renders one vacancy block of the plain-text body.
pub(super) fn render_vacancy(vacancy: &RenderedVacancy<'_>, details_base_url: &str) -> String {
    format!(
        "{rule}\n\n{title}\n\n{salary}\nCloses: {closes}{tags}\n\n{summary}\n\nMore details: {base}{id}\n",
        rule = "_".repeat(TEXT_WIDTH),
        title = wrap_text(&format!("*{}*", vacancy.vacancy.label), TEXT_WIDTH),
        salary = vacancy.vacancy.salary,
        closes = vacancy.closing.display(),
        tags = vacancy.summary.tags.suffix(),
        summary = wrap_text(&vacancy.summary.first_paragraph, TEXT_WIDTH),
        base = details_base_url,
        id = vacancy.vacancy.id,
    )
}

/// Assembles the plain-text body: the preamble followed by one block per vacancy.
pub(super) fn render_text(
    preamble: &str,
    vacancies: &[RenderedVacancy<'_>],
    details_base_url: &str,
) -> String {
    let mut body = String::from(preamble);
    for vacancy in vacancies {
        body.push_str(&render_vacancy(vacancy, details_base_url));
    }
    body
}
