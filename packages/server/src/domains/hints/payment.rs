//! Payment signal: a named insurer or cash pay.

use crate::domains::providers::insurers::find_insurer_mentions;

/// The last payment preference mentioned in `text`, as a normalized token.
pub fn detect_insurer(text: &str) -> Option<&'static str> {
    find_insurer_mentions(text).last().map(|(_, token)| *token)
}
