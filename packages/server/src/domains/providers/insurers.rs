//! Payment vocabulary shared by the directory parser and hint extraction.
//!
//! Named insurers and cash-pay synonyms normalize to short tokens
//! (`bcbs`, `aetna`, ..., `cashpay`). Anything unrecognized keeps a folded
//! slug of its own text so it can still be compared.

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::fold_for_matching;

/// Canonical token for all cash / self-pay synonyms.
pub const CASH_PAY: &str = "cashpay";

lazy_static! {
    static ref INSURER_PATTERNS: Vec<(&'static str, Regex)> = vec![
        (
            "bcbs",
            Regex::new(r"(?i)\b(bcbs|blue\s*cross(\s*(and|&)?\s*blue\s*shield)?|blue\s*shield|anthem)\b")
                .unwrap(),
        ),
        ("aetna", Regex::new(r"(?i)\baetna\b").unwrap()),
        ("cigna", Regex::new(r"(?i)\bcigna\b").unwrap()),
        (
            "uhc",
            Regex::new(r"(?i)\b(uhc|united\s*health\s*care|unitedhealthcare|united\s*healthcare|optum)\b")
                .unwrap(),
        ),
        ("medicare", Regex::new(r"(?i)\bmedicare\b").unwrap()),
        ("medicaid", Regex::new(r"(?i)\b(medicaid|ahcccs)\b").unwrap()),
        ("tricare", Regex::new(r"(?i)\btricare\b").unwrap()),
        ("humana", Regex::new(r"(?i)\bhumana\b").unwrap()),
        (
            CASH_PAY,
            Regex::new(r"(?i)\b(cash([\s-]*pay)?|self[\s-]*pay|out[\s-]*of[\s-]*pocket|private[\s-]*pay)\b")
                .unwrap(),
        ),
    ];
}

/// Normalize one directory insurer entry ("Blue Cross Blue Shield",
/// "Cash Pay", "Oscar Health") to a comparison token.
pub fn canonical_insurer(entry: &str) -> String {
    INSURER_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(entry))
        .map(|(token, _)| token.to_string())
        .unwrap_or_else(|| fold_for_matching(entry).replace(' ', "_"))
}

/// Every payment mention in free text as `(byte offset, token)`, in text order.
pub fn find_insurer_mentions(text: &str) -> Vec<(usize, &'static str)> {
    let mut mentions: Vec<(usize, &'static str)> = INSURER_PATTERNS
        .iter()
        .flat_map(|(token, re)| re.find_iter(text).map(move |m| (m.start(), *token)))
        .collect();
    mentions.sort_by_key(|(pos, _)| *pos);
    mentions
}

/// Whether a directory entry is a cash / self-pay option.
pub fn is_cash_pay(entry: &str) -> bool {
    canonical_insurer(entry) == CASH_PAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_named_insurers() {
        assert_eq!(canonical_insurer("Blue Cross Blue Shield"), "bcbs");
        assert_eq!(canonical_insurer("BCBS of Arizona"), "bcbs");
        assert_eq!(canonical_insurer("UnitedHealthcare"), "uhc");
        assert_eq!(canonical_insurer("AHCCCS"), "medicaid");
        assert_eq!(canonical_insurer("Aetna"), "aetna");
    }

    #[test]
    fn test_cash_synonyms_share_one_token() {
        for entry in ["Cash", "Cash Pay", "cash-pay", "Self-Pay", "out of pocket", "Private pay"] {
            assert_eq!(canonical_insurer(entry), CASH_PAY, "{}", entry);
        }
        assert!(is_cash_pay("Self Pay"));
        assert!(!is_cash_pay("Cigna"));
    }

    #[test]
    fn test_unknown_insurer_keeps_slug() {
        assert_eq!(canonical_insurer("Oscar Health"), "oscar_health");
    }

    #[test]
    fn test_find_mentions_in_order() {
        let mentions = find_insurer_mentions("I had Cigna but now I'll pay out of pocket");
        assert_eq!(
            mentions.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
            vec!["cigna", CASH_PAY]
        );
    }
}
