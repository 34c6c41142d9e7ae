//! What the user is asking for right now: a list of providers, or a
//! provider's appointment times.
//!
//! Both look only at the latest message.

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRequest {
    /// Show the soonest times.
    Show,
    /// Page forward past the last times already shown.
    More,
}

lazy_static! {
    static ref WANTS_LIST: Regex = Regex::new(
        r"(?i)\b(list|options|show\s+me|who\s+(is|are)\s+available|which\s+providers?|any\s+providers?|recommend\w*|suggest\w*|matches|see\s+(some\s+)?(providers?|therapists?|psychiatrists?))\b"
    )
    .unwrap();
    static ref MORE_SLOTS: Regex = Regex::new(
        r"(?i)\b((more|other|later|additional|next)\s+(times?|slots?|openings?|availability|appointments?|dates?)|anything\s+later|any\s+later|later\s+(on|in\s+the\s+week)|show\s+more)\b"
    )
    .unwrap();
    static ref SHOW_SLOTS: Regex = Regex::new(
        r"(?i)\b((what|which)\s+(times?|days?|slots?)|(show|see|list)\s+(me\s+)?(the\s+|their\s+|his\s+|her\s+)?(times?|slots?|openings?|availability)|availability|available\s+times?|open\s+(times?|slots?)|when\s+(is|are|can)\b[^?]*\b(available|free|open|see\s+me))"
    )
    .unwrap();
}

/// Whether the user wants an enumerated set of providers now.
pub fn wants_list(message: &str) -> bool {
    WANTS_LIST.is_match(message)
}

/// Whether the message explicitly asks for appointment times.
pub fn detect_slot_request(message: &str) -> Option<SlotRequest> {
    if MORE_SLOTS.is_match(message) {
        Some(SlotRequest::More)
    } else if SHOW_SLOTS.is_match(message) {
        Some(SlotRequest::Show)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_list() {
        assert!(wants_list("Can you show me some options?"));
        assert!(wants_list("who is available in AZ"));
        assert!(wants_list("please list psychiatrists"));
        assert!(!wants_list("I've been feeling down"));
    }

    #[test]
    fn test_show_slots() {
        assert_eq!(detect_slot_request("what times does Smith have?"), Some(SlotRequest::Show));
        assert_eq!(detect_slot_request("show me Allison Hill's availability"), Some(SlotRequest::Show));
        assert_eq!(detect_slot_request("when is she available?"), Some(SlotRequest::Show));
    }

    #[test]
    fn test_more_slots() {
        assert_eq!(detect_slot_request("any later times?"), Some(SlotRequest::More));
        assert_eq!(detect_slot_request("show more"), Some(SlotRequest::More));
        assert_eq!(detect_slot_request("other times for her?"), Some(SlotRequest::More));
    }

    #[test]
    fn test_not_a_slot_request() {
        assert_eq!(detect_slot_request("I need a therapist in AZ"), None);
        assert_eq!(detect_slot_request("Tell me about Allison Hill"), None);
    }
}
