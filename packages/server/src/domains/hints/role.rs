//! Care-type signal: therapy, psychiatry, or both.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolePreference {
    Therapist,
    Psychiatrist,
    Both,
}

impl RolePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Therapist => "therapist",
            Self::Psychiatrist => "psychiatrist",
            Self::Both => "both",
        }
    }
}

lazy_static! {
    static ref PSYCHIATRY: Regex = Regex::new(
        r"(?i)\b(psychiatr\w*|medications?|meds|med\s*management|med\s*mgmt|prescri\w*)\b"
    )
    .unwrap();
    static ref THERAPY: Regex =
        Regex::new(r"(?i)\b(therap\w*|counsel\w*|talk\s+to\s+someone)\b").unwrap();
    static ref BOTH: Regex = Regex::new(r"(?i)\bboth\b").unwrap();
}

/// Care-type preference expressed in `text`. No signal means no preference;
/// this never guesses.
pub fn detect_role(text: &str) -> Option<RolePreference> {
    if BOTH.is_match(text) {
        return Some(RolePreference::Both);
    }
    match (PSYCHIATRY.is_match(text), THERAPY.is_match(text)) {
        (true, true) => Some(RolePreference::Both),
        (true, false) => Some(RolePreference::Psychiatrist),
        (false, true) => Some(RolePreference::Therapist),
        (false, false) => None,
    }
}
