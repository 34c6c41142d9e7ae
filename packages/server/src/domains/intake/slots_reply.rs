//! Deterministic replies for explicit "what times does X have" requests.
//!
//! When the latest message asks for a provider's times and the provider can
//! be pinned down, the reply is rendered straight from the schedule instead
//! of asking the model.

use chrono::NaiveDateTime;

use crate::common::{last_assistant_turn, ConversationTurn};
use crate::data::DirectorySnapshot;
use crate::domains::hints::{detect_slot_request, Hints, SlotRequest};
use crate::domains::matching::{MatchConstraints, MentionSource, ProviderResolver, Resolution};
use crate::domains::providers::Provider;
use crate::domains::schedules::{checklist_item, format_datetime, latest_shown_timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotReply {
    pub text: String,
    pub provider_ids: Vec<String>,
}

/// Where "future" starts: now, or for "more" the latest time already shown
/// in the previous assistant turn when that is later.
pub fn pagination_anchor(
    request: SlotRequest,
    history: &[ConversationTurn],
    now: NaiveDateTime,
) -> NaiveDateTime {
    if request != SlotRequest::More {
        return now;
    }
    last_assistant_turn(history)
        .and_then(|turn| latest_shown_timestamp(&turn.content))
        .map_or(now, |shown| shown.max(now))
}

/// None when the message isn't a times request or names nobody we can find.
pub fn try_slot_reply(
    message: &str,
    history: &[ConversationTurn],
    snapshot: &DirectorySnapshot,
    hints: &Hints,
    now: NaiveDateTime,
    slots_per_provider: usize,
) -> Option<SlotReply> {
    let request = detect_slot_request(message)?;
    let resolver = ProviderResolver::new(&snapshot.providers, &snapshot.schedule, now);

    let (resolution, source) =
        resolver.resolve_with_source(message, history, &MatchConstraints::from_hints(hints));

    match resolution {
        Resolution::Resolved(provider) => {
            let anchor = pagination_anchor(request, history, now);
            Some(SlotReply {
                text: render_openings(provider, snapshot, request, anchor, now, slots_per_provider),
                provider_ids: vec![provider.id.clone()],
            })
        }
        Resolution::Ambiguous(candidates) => Some(SlotReply {
            text: render_clarification(&candidates, source, snapshot, now),
            provider_ids: candidates.iter().map(|p| p.id.clone()).collect(),
        }),
        Resolution::Unresolved => None,
    }
}

fn render_openings(
    provider: &Provider,
    snapshot: &DirectorySnapshot,
    request: SlotRequest,
    anchor: NaiveDateTime,
    now: NaiveDateTime,
    limit: usize,
) -> String {
    let name = provider.display_name();
    let slots = snapshot.schedule.soonest_slots_for(&provider.id, anchor, limit.max(1));

    if slots.is_empty() {
        return if anchor > now {
            format!(
                "I don't see any more openings for {} after {}. Would you like me to suggest \
                 another provider?",
                name,
                format_datetime(anchor)
            )
        } else {
            format!(
                "{} has no upcoming openings listed right now. Would you like me to suggest \
                 another provider?",
                name
            )
        };
    }

    let lead = match request {
        SlotRequest::More => format!("Here are later openings for {}:", name),
        SlotRequest::Show => format!("Here are the next openings for {}:", name),
    };
    let items: Vec<String> = slots.iter().map(|slot| checklist_item(slot)).collect();

    format!(
        "{}\n{}\n\nDo any of these work for you? Say \"more times\" to see later openings.",
        lead,
        items.join("\n")
    )
}

fn render_clarification(
    candidates: &[&Provider],
    source: MentionSource,
    snapshot: &DirectorySnapshot,
    now: NaiveDateTime,
) -> String {
    let lines: Vec<String> = candidates
        .iter()
        .map(|p| {
            let next = snapshot
                .schedule
                .next_slot(&p.id, now)
                .map(|slot| format!("next opening {}", format_datetime(slot.starts_at)))
                .unwrap_or_else(|| "no upcoming openings listed".to_string());
            let states = if p.licensed_states.is_empty() {
                String::new()
            } else {
                format!(", {}", p.licensed_states.join("/"))
            };
            format!("- {} ({}{}), {}", p.display_name(), p.role.label(), states, next)
        })
        .collect();

    let lead = match source {
        MentionSource::Message => "I found more than one provider by that name. Which one did you mean?",
        MentionSource::RecentTurns => "We've talked about a few providers. Which one would you like times for?",
    };
    format!("{}\n{}", lead, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DIRECTORY: &str = "\
prov_001 Allison Hill (PsyD) — Therapy
Licensed states: AZ, NM

prov_002 John Smith, MD - Psychiatry
Licensed states: TX

prov_003 Karen Smith (LCSW) - Therapy
Licensed states: AZ";

    const SCHEDULE: &str = "\
prov_001|2025-09-22|09:00
prov_001|2025-09-23|13:00
prov_001|2025-09-24|10:00
prov_001|2025-09-25|11:30
prov_001|2025-09-26|08:00
prov_003|2025-09-24|15:00";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 22)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn snapshot() -> DirectorySnapshot {
        DirectorySnapshot::from_text(Some(DIRECTORY), Some(SCHEDULE))
    }

    #[test]
    fn test_lists_next_future_slots() {
        let reply = try_slot_reply(
            "What times does Allison Hill have?",
            &[],
            &snapshot(),
            &Hints::default(),
            now(),
            2,
        )
        .unwrap();

        assert_eq!(reply.provider_ids, vec!["prov_001"]);
        assert!(!reply.text.contains("09/22/2025"));
        assert!(reply.text.contains("- [ ] 1:00 PM, Tuesday, 09/23/2025"));
        assert!(reply.text.contains("- [ ] 10:00 AM, Wednesday, 09/24/2025"));
        assert!(!reply.text.contains("09/25/2025"));
    }

    #[test]
    fn test_more_pages_forward_from_last_shown() {
        let history = vec![
            ConversationTurn::user("What times does Allison Hill have?"),
            ConversationTurn::assistant(
                "Here are the next openings for Allison Hill, PsyD:\n\
                 - [ ] 1:00 PM, Tuesday, 09/23/2025\n\
                 - [ ] 10:00 AM, Wednesday, 09/24/2025",
            ),
        ];
        let reply = try_slot_reply("any later times?", &history, &snapshot(), &Hints::default(), now(), 2).unwrap();

        assert!(reply.text.starts_with("Here are later openings for Allison Hill, PsyD:"));
        assert!(reply.text.contains("11:30 AM, Thursday, 09/25/2025"));
        assert!(reply.text.contains("8:00 AM, Friday, 09/26/2025"));
        assert!(!reply.text.contains("09/24/2025"));
    }

    #[test]
    fn test_more_past_the_end_says_so() {
        let history = vec![ConversationTurn::assistant(
            "Allison Hill: - [ ] 8:00 AM, Friday, 09/26/2025",
        )];
        let reply = try_slot_reply("more times for Allison Hill", &history, &snapshot(), &Hints::default(), now(), 3)
            .unwrap();

        assert!(reply.text.starts_with("I don't see any more openings for Allison Hill, PsyD after"));
    }

    #[test]
    fn test_ambiguous_name_asks_which() {
        let reply = try_slot_reply(
            "what times does Smith have?",
            &[],
            &snapshot(),
            &Hints::default(),
            now(),
            3,
        )
        .unwrap();

        assert_eq!(reply.provider_ids, vec!["prov_003", "prov_002"]);
        assert!(reply.text.starts_with("I found more than one provider by that name."));
        assert!(reply.text.contains("- Karen Smith, LCSW (Therapist, AZ), next opening 3:00 PM, Wednesday, 09/24/2025"));
        assert!(reply.text.contains("John Smith, MD (Psychiatrist, TX), no upcoming openings listed"));
    }

    #[test]
    fn test_candidates_from_earlier_turns_are_not_called_a_shared_name() {
        let history = vec![ConversationTurn::assistant(
            "Karen Smith and John Smith both see patients.",
        )];
        let reply = try_slot_reply("what times do they have?", &history, &snapshot(), &Hints::default(), now(), 3)
            .unwrap();

        assert_eq!(reply.provider_ids, vec!["prov_003", "prov_002"]);
        assert!(reply.text.starts_with("We've talked about a few providers."));
        assert!(!reply.text.contains("by that name"));
    }

    #[test]
    fn test_not_a_times_request() {
        assert!(try_slot_reply("Tell me about Allison Hill", &[], &snapshot(), &Hints::default(), now(), 3).is_none());
        assert!(try_slot_reply("what times are open?", &[], &snapshot(), &Hints::default(), now(), 3).is_none());
    }

    #[test]
    fn test_anchor_never_moves_backward() {
        let history = vec![ConversationTurn::assistant("- [ ] 9:00 AM, Monday, 09/01/2025")];
        assert_eq!(pagination_anchor(SlotRequest::More, &history, now()), now());
        assert_eq!(pagination_anchor(SlotRequest::Show, &history, now()), now());
    }
}
