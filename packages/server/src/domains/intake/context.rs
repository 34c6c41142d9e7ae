//! Renders the matched providers into the text block the model sees.
//!
//! The block only ever restates parsed records. Cards are appended while
//! they fit the character budget and the provider cap; the budget is
//! checked before each append, so the block overshoots by at most one card.
//! The hidden availability index is kept apart, under its own budget.

use chrono::NaiveDateTime;
use typed_builder::TypedBuilder;

use crate::domains::matching::{MatchConstraints, Selection};
use crate::domains::providers::Provider;
use crate::domains::schedules::{checklist_item, ScheduleIndex, Slot};

#[derive(Clone, Debug, TypedBuilder)]
pub struct ContextOptions {
    /// Soonest future slots shown per provider
    #[builder(default = 3)]
    pub slots_per_provider: usize,
    /// Character budget for the visible provider block
    #[builder(default = 9000)]
    pub char_budget: usize,
    /// Hard cap on rendered providers
    #[builder(default = 12)]
    pub max_providers: usize,
    /// Character budget for the hidden availability index
    #[builder(default = 4000)]
    pub index_char_budget: usize,
    #[builder(default = true)]
    pub include_index: bool,
    /// The user asked to see providers now rather than keep screening
    #[builder(default = false)]
    pub wants_list: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContext {
    /// Provider cards, bounded by `char_budget`
    pub text: String,
    /// Compact timestamps per rendered provider, bounded by `index_char_budget`
    pub availability_index: Option<String>,
    pub rendered_ids: Vec<String>,
    /// Matched providers left out for budget or cap
    pub omitted: usize,
}

impl RenderedContext {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn index_char_len(&self) -> usize {
        self.availability_index.as_ref().map_or(0, |i| i.chars().count())
    }
}

const PROVIDERS_HEADER: &str =
    "# Matched providers (use ONLY these entries; never invent providers, times, or details)";

const LIST_DIRECTIVE: &str = "The user asked to see providers now: list each provider below by name with \
role, states, payment and next openings before asking anything else.";

const INDEX_HEADER: &str = "# Availability index (for internal reasoning only; do not quote verbatim)\n\
# Format: provider_id: YYYY-MM-DD HH:MM, YYYY-MM-DD HH:MM, ...";

/// One provider as a multiline card with its soonest slots as checklist items.
pub fn render_provider_card(provider: &Provider, slots: &[&Slot]) -> String {
    let mut lines = vec![format!("### {} ({})", provider.display_name(), provider.id)];

    lines.push(format!("- Role: {}", provider.role.label()));
    if !provider.licensed_states.is_empty() {
        lines.push(format!("- States: {}", provider.licensed_states.join(", ")));
    }
    let payment = provider.payment_labels();
    if !payment.is_empty() {
        lines.push(format!("- Payment: {}", payment.join(", ")));
    }
    let languages = provider.language_labels();
    if !languages.is_empty() {
        lines.push(format!("- Languages: {}", languages.join(", ")));
    }
    if !provider.lived_experience.is_empty() {
        lines.push(format!("- Lived experience: {}", provider.lived_experience.join(", ")));
    }
    if !provider.styles.is_empty() {
        lines.push(format!("- Styles: {}", provider.styles));
    }
    if let Some(email) = &provider.email {
        lines.push(format!("- Email: {}", email));
    }

    if slots.is_empty() {
        lines.push("- Next openings: none currently listed".to_string());
    } else {
        lines.push("- Next openings:".to_string());
        lines.extend(slots.iter().map(|slot| format!("  {}", checklist_item(slot))));
    }

    lines.join("\n")
}

fn describe_constraints(constraints: &MatchConstraints) -> String {
    let mut parts = Vec::new();
    if let Some(state) = &constraints.state {
        parts.push(format!("state={}", state));
    }
    if let Some(insurer) = &constraints.insurer {
        parts.push(format!("payment={}", insurer));
    }
    if let Some(role) = &constraints.role {
        parts.push(format!("care={}", role.as_str()));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// Render the selection. `anchor` is the moment slots must come after: now,
/// or the last slot already shown when the user is paging forward.
pub fn build_context(
    selection: &Selection<'_>,
    schedule: &ScheduleIndex,
    anchor: NaiveDateTime,
    now: NaiveDateTime,
    options: &ContextOptions,
) -> RenderedContext {
    let mut text = format!(
        "{}\nFilters applied: {}",
        PROVIDERS_HEADER,
        describe_constraints(&selection.constraints)
    );

    if selection.is_empty() {
        text.push_str(
            "\nNo providers in the directory match these filters. Say so plainly, do not invent \
             providers, and offer to broaden the search (for example another payment option).",
        );
        return RenderedContext {
            text,
            availability_index: None,
            rendered_ids: Vec::new(),
            omitted: 0,
        };
    }

    if selection.relaxed {
        text.push_str(
            "\nNote: nobody matched the requested payment option. These providers match the state \
             and care type but not the payment; tell the user that before listing them.",
        );
    }

    if options.wants_list {
        text.push('\n');
        text.push_str(LIST_DIRECTIVE);
    }

    let mut used = text.chars().count();
    let mut rendered_ids: Vec<String> = Vec::new();
    let mut omitted = 0usize;

    for group in &selection.groups {
        let mut heading = Some(format!("\n\n## {}", group.category.heading()));

        for scored in &group.providers {
            let provider = scored.provider;
            let full = rendered_ids.len() >= options.max_providers;

            let slots = schedule.soonest_slots_for(&provider.id, anchor, options.slots_per_provider);
            let card = render_provider_card(provider, &slots);
            let piece = match &heading {
                Some(h) => format!("{}\n\n{}", h, card),
                None => format!("\n\n{}", card),
            };
            let piece_len = piece.chars().count();

            let over_budget = !rendered_ids.is_empty() && used + piece_len > options.char_budget;
            if full || over_budget {
                omitted += 1;
                continue;
            }

            text.push_str(&piece);
            used += piece_len;
            heading = None;
            rendered_ids.push(provider.id.clone());
        }

        if heading.is_some() && group.providers.is_empty() {
            text.push_str(&format!(
                "\n\n## {}\nNo matching providers in this category.",
                group.category.heading()
            ));
        }
    }

    if omitted > 0 {
        text.push_str(&format!(
            "\n\n({} more matching provider{} not shown; ask the user to narrow the search.)",
            omitted,
            if omitted == 1 { "" } else { "s" }
        ));
    }

    let availability_index = if options.include_index {
        let ids: Vec<&str> = rendered_ids.iter().map(String::as_str).collect();
        build_availability_index(&ids, schedule, now, options.index_char_budget)
    } else {
        None
    };

    RenderedContext {
        text,
        availability_index,
        rendered_ids,
        omitted,
    }
}

/// Compact `provider_id: timestamps` lines for the given providers, future
/// slots only, cut at `budget` characters. None when nothing is listed.
pub fn build_availability_index(
    provider_ids: &[&str],
    schedule: &ScheduleIndex,
    now: NaiveDateTime,
    budget: usize,
) -> Option<String> {
    let mut out = INDEX_HEADER.to_string();
    let mut used = out.chars().count();
    let mut rows = 0usize;

    'providers: for id in provider_ids {
        let mut stamps = schedule.future_slots(id, now).map(Slot::timestamp);
        let Some(first) = stamps.next() else {
            continue;
        };

        let mut line = format!("\n{}: {}", id, first);
        if used + line.chars().count() > budget {
            break;
        }
        for stamp in stamps {
            let more = format!(", {}", stamp);
            if used + line.chars().count() + more.chars().count() > budget {
                out.push_str(&line);
                rows += 1;
                break 'providers;
            }
            line.push_str(&more);
        }

        used += line.chars().count();
        out.push_str(&line);
        rows += 1;
    }

    (rows > 0).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::hints::{Hints, RolePreference};
    use crate::domains::matching::{MatchingEngine, ScoringWeights};
    use crate::domains::providers::parse_providers;
    use crate::domains::schedules::parse_schedule;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 22)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn directory(n: usize) -> String {
        (1..=n)
            .map(|i| {
                format!(
                    "prov_{:03} Person Number{} (LPC) - Therapy\nLicensed states: AZ\nInsurance: Aetna, Cash Pay\nStyles: {}",
                    i,
                    i,
                    "CBT, ".repeat(20)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_end_to_end_single_provider() {
        let providers = parse_providers(
            "prov_001 Allison Hill (PsyD) — Therapy\nLicensed states: AZ, NM\nInsurance: Aetna, Cash",
        );
        let schedule = ScheduleIndex::build(&parse_schedule("prov_001|2099-01-01|09:00"));
        let hints = Hints {
            state: Some("AZ".into()),
            ..Default::default()
        };
        let engine = MatchingEngine::new(ScoringWeights::default(), 4);
        let selection = engine.select(&providers, &hints, &schedule, now());

        assert_eq!(selection.provider_ids(), vec!["prov_001"]);

        let rendered = build_context(&selection, &schedule, now(), now(), &ContextOptions::default());

        assert_eq!(rendered.rendered_ids, vec!["prov_001"]);
        assert_eq!(rendered.text.matches("### ").count(), 1);
        assert!(rendered.text.contains("- States: AZ, NM"));
        assert!(rendered.text.contains("- Payment: Cash, Aetna"));
        assert!(rendered.text.contains("- [ ] 9:00 AM, Thursday, 01/01/2099"));
        let index = rendered.availability_index.as_deref().unwrap();
        assert!(index.contains("prov_001: 2099-01-01 09:00"));
        assert!(index.contains("do not quote verbatim"));
        assert!(!rendered.text.contains("do not quote verbatim"));
    }

    #[test]
    fn test_past_slots_never_render() {
        let providers = parse_providers("prov_001 Allison Hill (PsyD) — Therapy\nLicensed states: AZ");
        let schedule = ScheduleIndex::build(&parse_schedule(
            "prov_001|2025-09-22|09:00\nprov_001|2025-09-22|12:00\nprov_001|2025-09-23|10:00",
        ));
        let selection = MatchingEngine::new(ScoringWeights::default(), 4).select(
            &providers,
            &Hints::default(),
            &schedule,
            now(),
        );

        let rendered = build_context(&selection, &schedule, now(), now(), &ContextOptions::default());

        assert!(!rendered.text.contains("09/22/2025"));
        assert!(rendered.text.contains("10:00 AM, Tuesday, 09/23/2025"));
        assert!(!rendered.availability_index.unwrap().contains("2025-09-22"));
    }

    #[test]
    fn test_budget_checked_before_append() {
        let providers = parse_providers(&directory(30));
        let schedule = ScheduleIndex::default();
        let hints = Hints {
            role_preference: Some(RolePreference::Therapist),
            ..Default::default()
        };
        let selection = MatchingEngine::new(ScoringWeights::default(), 30).select(
            &providers,
            &hints,
            &schedule,
            now(),
        );
        let options = ContextOptions::builder()
            .char_budget(1200)
            .include_index(false)
            .build();

        let rendered = build_context(&selection, &schedule, now(), now(), &options);
        let card_len = render_provider_card(&providers[0], &[]).chars().count();

        assert!(rendered.rendered_ids.len() < 30);
        assert!(rendered.omitted > 0);
        assert_eq!(rendered.rendered_ids.len() + rendered.omitted, 30);
        // omission note is short; one card of slack covers it
        assert!(rendered.char_len() <= options.char_budget + card_len + 120);
        assert!(rendered.text.contains("more matching providers not shown"));
    }

    #[test]
    fn test_index_does_not_eat_card_budget() {
        let providers = parse_providers(&directory(10));
        let rows: Vec<String> = (1..=10)
            .flat_map(|p| (1..=28).map(move |d| format!("prov_{:03}|2099-02-{:02}|09:00", p, d)))
            .collect();
        let schedule = ScheduleIndex::build(&parse_schedule(&rows.join("\n")));
        let hints = Hints {
            role_preference: Some(RolePreference::Therapist),
            ..Default::default()
        };
        let selection = MatchingEngine::new(ScoringWeights::default(), 10).select(
            &providers,
            &hints,
            &schedule,
            now(),
        );
        let options = ContextOptions::builder().char_budget(1200).build();

        let rendered = build_context(&selection, &schedule, now(), now(), &options);
        let first = schedule.soonest_slots_for("prov_001", now(), options.slots_per_provider);
        let card_len = render_provider_card(&providers[0], &first).chars().count();

        assert!(rendered.char_len() <= options.char_budget + card_len + 120);
        assert!(rendered.index_char_len() > 0);
        assert!(rendered.index_char_len() <= options.index_char_budget);
        assert!(rendered.char_len() + rendered.index_char_len()
            <= options.char_budget + card_len + 120 + options.index_char_budget);
    }

    #[test]
    fn test_list_directive_only_when_asked() {
        let providers = parse_providers(&directory(2));
        let selection = MatchingEngine::new(ScoringWeights::default(), 4).select(
            &providers,
            &Hints::default(),
            &ScheduleIndex::default(),
            now(),
        );

        let plain = build_context(&selection, &ScheduleIndex::default(), now(), now(), &ContextOptions::default());
        assert!(!plain.text.contains(LIST_DIRECTIVE));

        let options = ContextOptions::builder().wants_list(true).build();
        let listed = build_context(&selection, &ScheduleIndex::default(), now(), now(), &options);
        let directive = listed.text.find(LIST_DIRECTIVE).unwrap();
        assert!(directive < listed.text.find("### ").unwrap());
    }

    #[test]
    fn test_first_card_always_renders() {
        let providers = parse_providers(&directory(2));
        let selection = MatchingEngine::new(ScoringWeights::default(), 4).select(
            &providers,
            &Hints::default(),
            &ScheduleIndex::default(),
            now(),
        );
        let options = ContextOptions::builder().char_budget(10).build();

        let rendered = build_context(&selection, &ScheduleIndex::default(), now(), now(), &options);
        assert_eq!(rendered.rendered_ids, vec!["prov_001"]);
    }

    #[test]
    fn test_provider_cap() {
        let providers = parse_providers(&directory(10));
        let selection = MatchingEngine::new(ScoringWeights::default(), 10).select(
            &providers,
            &Hints::default(),
            &ScheduleIndex::default(),
            now(),
        );
        let options = ContextOptions::builder().char_budget(1_000_000).max_providers(3).build();

        let rendered = build_context(&selection, &ScheduleIndex::default(), now(), now(), &options);
        assert_eq!(rendered.rendered_ids.len(), 3);
        assert_eq!(rendered.omitted, 7);
    }

    #[test]
    fn test_no_match_renders_explicit_absence() {
        let providers = parse_providers(&directory(2));
        let hints = Hints {
            state: Some("WY".into()),
            ..Default::default()
        };
        let selection = MatchingEngine::new(ScoringWeights::default(), 4).select(
            &providers,
            &hints,
            &ScheduleIndex::default(),
            now(),
        );

        let rendered = build_context(&selection, &ScheduleIndex::default(), now(), now(), &ContextOptions::default());
        assert!(rendered.rendered_ids.is_empty());
        assert!(rendered.text.contains("No providers in the directory match"));
        assert!(rendered.text.contains("state=WY"));
    }

    #[test]
    fn test_pagination_anchor_moves_forward() {
        let providers = parse_providers("prov_001 Allison Hill (PsyD) — Therapy");
        let schedule = ScheduleIndex::build(&parse_schedule(
            "prov_001|2099-01-01|09:00\nprov_001|2099-01-02|09:00\nprov_001|2099-01-03|09:00",
        ));
        let selection = MatchingEngine::new(ScoringWeights::default(), 4).select(
            &providers,
            &Hints::default(),
            &schedule,
            now(),
        );
        let anchor = schedule.slots_for("prov_001")[0].starts_at;
        let options = ContextOptions::builder().slots_per_provider(1).build();

        let rendered = build_context(&selection, &schedule, anchor, now(), &options);
        assert!(rendered.text.contains("- [ ] 9:00 AM, Friday, 01/02/2099"));
        assert!(!rendered.text.contains("- [ ] 9:00 AM, Thursday, 01/01/2099"));
    }

    #[test]
    fn test_index_respects_budget() {
        let schedule = ScheduleIndex::build(&parse_schedule(
            "prov_001|2099-01-01|09:00\nprov_001|2099-01-02|09:00\nprov_002|2099-01-03|09:00",
        ));
        let full = build_availability_index(&["prov_001", "prov_002"], &schedule, now(), 10_000).unwrap();
        assert!(full.contains("prov_001: 2099-01-01 09:00, 2099-01-02 09:00"));
        assert!(full.contains("prov_002: 2099-01-03 09:00"));

        let tight_budget = INDEX_HEADER.chars().count() + 30;
        let tight = build_availability_index(&["prov_001", "prov_002"], &schedule, now(), tight_budget).unwrap();
        assert!(tight.chars().count() <= tight_budget);
        assert!(!tight.contains("prov_002"));

        assert!(build_availability_index(&["prov_009"], &schedule, now(), 10_000).is_none());
    }
}
