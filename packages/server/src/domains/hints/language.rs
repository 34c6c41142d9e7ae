//! Language preference signal.

use lazy_static::lazy_static;
use regex::Regex;

/// (pattern, label) pairs; labels match how the directory lists languages.
const LANGUAGES: &[(&str, &str)] = &[
    (r"spanish|espa[nñ]ol", "Spanish"),
    (r"english", "English"),
    (r"french", "French"),
    (r"portuguese", "Portuguese"),
    (r"mandarin", "Mandarin"),
    (r"cantonese", "Cantonese"),
    (r"vietnamese", "Vietnamese"),
    (r"korean", "Korean"),
    (r"japanese", "Japanese"),
    (r"tagalog|filipino", "Tagalog"),
    (r"arabic", "Arabic"),
    (r"russian", "Russian"),
    (r"hindi", "Hindi"),
    (r"urdu", "Urdu"),
    (r"farsi|persian", "Farsi"),
    (r"german", "German"),
    (r"italian", "Italian"),
    (r"hebrew", "Hebrew"),
    (r"somali", "Somali"),
    (r"navajo", "Navajo"),
    (r"asl|american\s+sign\s+language|sign\s+language", "ASL"),
];

lazy_static! {
    static ref LANGUAGE_PATTERNS: Vec<(Regex, &'static str)> = LANGUAGES
        .iter()
        .map(|(pattern, label)| (Regex::new(&format!(r"(?i)\b({})\b", pattern)).unwrap(), *label))
        .collect();
}

/// The last language mentioned in `text`.
pub fn detect_language(text: &str) -> Option<&'static str> {
    LANGUAGE_PATTERNS
        .iter()
        .flat_map(|(re, label)| re.find_iter(text).map(move |m| (m.start(), *label)))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, label)| label)
}
