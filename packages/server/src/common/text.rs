//! Text normalization for human-authored data files and chat input.

/// Characters that render as nothing and only get in the way of matching.
const INVISIBLE: &[char] = &['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}'];

/// Normalize a raw text blob.
///
/// - strips BOM and zero-width characters
/// - NBSP becomes a regular space
/// - CRLF and lone CR become LF
/// - surrounding whitespace is trimmed
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if INVISIBLE.contains(&c) => {}
            '\u{00A0}' => out.push(' '),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Normalize a single line: tabs become spaces, then [`normalize_text`].
pub fn normalize_line(line: &str) -> String {
    normalize_text(&line.replace('\t', " "))
}

/// Lowercase and collapse everything that isn't alphanumeric into single
/// spaces. Used for loose name and keyword comparisons.
pub fn fold_for_matching(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}
