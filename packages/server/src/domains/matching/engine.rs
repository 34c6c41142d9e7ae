//! Filter, relax, rank and cap providers against the request's constraints.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::domains::hints::{Hints, RolePreference};
use crate::domains::matching::weights::{MatchSignals, ScoringWeights};
use crate::domains::providers::Provider;
use crate::domains::schedules::ScheduleIndex;

/// Hard constraints for the primary filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchConstraints {
    pub state: Option<String>,
    pub insurer: Option<String>,
    pub role: Option<RolePreference>,
}

impl MatchConstraints {
    pub fn from_hints(hints: &Hints) -> Self {
        Self {
            state: hints.state.clone(),
            insurer: hints.insurer.clone(),
            role: hints.role_preference,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.insurer.is_none() && self.role.is_none()
    }

    pub fn without_insurer(&self) -> Self {
        Self {
            insurer: None,
            ..self.clone()
        }
    }

    pub fn admits(&self, provider: &Provider) -> bool {
        role_matches(provider, self.role)
            && self
                .state
                .as_deref()
                .map_or(true, |state| provider.is_licensed_in(state))
            && self
                .insurer
                .as_deref()
                .map_or(true, |insurer| provider.accepts(insurer))
    }
}

/// A therapist preference takes therapists (and dual-role providers); a
/// psychiatrist preference takes anyone who can prescribe. "Both" and no
/// preference filter nothing.
pub fn role_matches(provider: &Provider, role: Option<RolePreference>) -> bool {
    match role {
        Some(RolePreference::Therapist) => provider.is_therapist(),
        Some(RolePreference::Psychiatrist) => provider.is_prescriber(),
        Some(RolePreference::Both) | None => true,
    }
}

/// Result of the primary filter plus relaxation.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub providers: Vec<&'a Provider>,
    /// The insurer constraint was dropped to find these.
    pub relaxed: bool,
}

/// Providers passing every constraint, in directory order. When none do and
/// a state or role was given, payment is the constraint that gives.
pub fn filter_providers<'a>(
    providers: &'a [Provider],
    constraints: &MatchConstraints,
) -> FilterOutcome<'a> {
    let exact: Vec<&Provider> = providers.iter().filter(|p| constraints.admits(p)).collect();

    let can_relax = constraints.insurer.is_some()
        && (constraints.state.is_some() || constraints.role.is_some());

    if exact.is_empty() && can_relax {
        let relaxed_constraints = constraints.without_insurer();
        let relaxed: Vec<&Provider> = providers
            .iter()
            .filter(|p| relaxed_constraints.admits(p))
            .collect();
        if !relaxed.is_empty() {
            return FilterOutcome {
                providers: relaxed,
                relaxed: true,
            };
        }
    }

    FilterOutcome {
        providers: exact,
        relaxed: false,
    }
}

#[derive(Debug, Clone)]
pub struct ScoredProvider<'a> {
    pub provider: &'a Provider,
    pub score: u32,
}

/// Which ranking dimensions `provider` satisfies for these hints.
pub fn match_signals(
    provider: &Provider,
    hints: &Hints,
    has_availability: bool,
) -> MatchSignals {
    MatchSignals {
        state: hints
            .state
            .as_deref()
            .is_some_and(|s| provider.is_licensed_in(s)),
        payment: hints
            .insurer
            .as_deref()
            .is_some_and(|i| provider.accepts(i)),
        role: hints.role_preference.is_some() && role_matches(provider, hints.role_preference),
        language: hints.language.as_deref().is_some_and(|l| provider.speaks(l)),
        availability: has_availability,
    }
}

/// Highest score first; equal scores keep directory order.
pub fn rank_providers<'a>(
    providers: &[&'a Provider],
    hints: &Hints,
    weights: &ScoringWeights,
    schedule: &ScheduleIndex,
    now: NaiveDateTime,
) -> Vec<ScoredProvider<'a>> {
    let mut scored: Vec<ScoredProvider<'a>> = providers
        .iter()
        .copied()
        .map(|provider| {
            let available = schedule.has_future_slot(&provider.id, now);
            ScoredProvider {
                provider,
                score: weights.score(match_signals(provider, hints, available)),
            }
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Category a group of providers is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Therapy,
    Psychiatry,
}

impl ProviderCategory {
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Therapy => "Therapists",
            Self::Psychiatry => "Psychiatry / medication management",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderGroup<'a> {
    pub category: ProviderCategory,
    pub providers: Vec<ScoredProvider<'a>>,
}

/// Everything the context builder needs about the match.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub constraints: MatchConstraints,
    pub groups: Vec<ProviderGroup<'a>>,
    pub relaxed: bool,
}

impl<'a> Selection<'a> {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.providers.is_empty())
    }

    /// Selected providers across groups, in render order.
    pub fn providers(&self) -> impl Iterator<Item = &'a Provider> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.providers.iter().map(|s| s.provider))
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers().map(|p| p.id.clone()).collect()
    }
}

/// Filters, ranks and caps providers per care category.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    weights: ScoringWeights,
    per_category_cap: usize,
}

impl MatchingEngine {
    pub fn new(weights: ScoringWeights, per_category_cap: usize) -> Self {
        Self {
            weights,
            per_category_cap: per_category_cap.max(1),
        }
    }

    pub fn select<'a>(
        &self,
        providers: &'a [Provider],
        hints: &Hints,
        schedule: &ScheduleIndex,
        now: NaiveDateTime,
    ) -> Selection<'a> {
        let constraints = MatchConstraints::from_hints(hints);
        let outcome = filter_providers(providers, &constraints);
        let ranked = rank_providers(&outcome.providers, hints, &self.weights, schedule, now);

        let categories: &[ProviderCategory] = match hints.role_preference {
            Some(RolePreference::Therapist) => &[ProviderCategory::Therapy],
            Some(RolePreference::Psychiatrist) => &[ProviderCategory::Psychiatry],
            Some(RolePreference::Both) | None => {
                &[ProviderCategory::Therapy, ProviderCategory::Psychiatry]
            }
        };

        let groups: Vec<ProviderGroup<'a>> = categories
            .iter()
            .map(|category| ProviderGroup {
                category: *category,
                providers: ranked
                    .iter()
                    .filter(|s| belongs_to(s.provider, *category, categories.len() == 1))
                    .take(self.per_category_cap)
                    .cloned()
                    .collect(),
            })
            .collect();

        let selection = Selection {
            constraints,
            groups,
            relaxed: outcome.relaxed,
        };

        debug!(
            candidates = outcome.providers.len(),
            selected = selection.providers().count(),
            relaxed = selection.relaxed,
            "Matched providers"
        );

        selection
    }
}

/// With a single category everything the filter let through belongs to it.
/// With two, prescribers go under psychiatry and everyone else under therapy.
fn belongs_to(provider: &Provider, category: ProviderCategory, only_category: bool) -> bool {
    if only_category {
        return true;
    }
    match category {
        ProviderCategory::Psychiatry => provider.is_prescriber(),
        ProviderCategory::Therapy => !provider.is_prescriber(),
    }
}
