//! Jurisdiction signal.

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::us_states::{canonical_code, code_for_name, US_STATES};

/// Codes that are also everyday English words or abbreviations. These only
/// count when written in uppercase in the original text ("OR" yes, "or" no).
const AMBIGUOUS_CODES: &[&str] = &[
    "AL", "AR", "CO", "DE", "GA", "HI", "ID", "IN", "LA", "MA", "MD", "ME", "MO", "MS", "OH", "OK",
    "OR", "PA",
];

lazy_static! {
    static ref STATE_NAME: Regex = {
        let mut names: Vec<&str> = US_STATES.iter().map(|(_, name)| *name).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let alternation = names
            .iter()
            .map(|name| name.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b({})\b", alternation)).unwrap()
    };
    static ref TWO_LETTER: Regex = Regex::new(r"\b([A-Za-z]{2})\b").unwrap();
}

/// Every state mention in `text` as `(byte offset, code)`, in text order.
pub fn find_state_mentions(text: &str) -> Vec<(usize, &'static str)> {
    let mut mentions: Vec<(usize, &'static str)> = STATE_NAME
        .find_iter(text)
        .filter_map(|m| {
            let name = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
            code_for_name(&name).map(|code| (m.start(), code))
        })
        .collect();

    for m in TWO_LETTER.find_iter(text) {
        let token = m.as_str();
        let Some(code) = canonical_code(token) else {
            continue;
        };
        if AMBIGUOUS_CODES.contains(&code) && token != code {
            continue;
        }
        mentions.push((m.start(), code));
    }

    mentions.sort_by_key(|(pos, _)| *pos);
    mentions
}

/// The last state mentioned in `text`.
pub fn detect_state(text: &str) -> Option<&'static str> {
    find_state_mentions(text).last().map(|(_, code)| *code)
}
