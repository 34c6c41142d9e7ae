//! Map a mention in free text ("Dr. Hill", "prov_014", "Smith") back to a
//! provider in the directory.
//!
//! Name matching is heuristic. When several providers fit, the caller gets all
//! of them back rather than an arbitrary pick.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

use crate::common::{fold_for_matching, ConversationTurn};
use crate::domains::matching::engine::MatchConstraints;
use crate::domains::providers::Provider;
use crate::domains::schedules::ScheduleIndex;

/// How many earlier turns are searched when the message names nobody.
pub const RECENCY_TURNS: usize = 6;

lazy_static! {
    static ref PROVIDER_ID: Regex = Regex::new(r"(?i)\bprov_\d+\b").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved(&'a Provider),
    /// Several candidates, soonest upcoming slot first.
    Ambiguous(Vec<&'a Provider>),
    Unresolved,
}

/// Where the candidates were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionSource {
    /// Named in the latest message
    Message,
    /// Carried over from recent turns; the message named nobody
    RecentTurns,
}

impl<'a> Resolution<'a> {
    pub fn resolved(&self) -> Option<&'a Provider> {
        match self {
            Resolution::Resolved(p) => Some(*p),
            _ => None,
        }
    }
}

pub struct ProviderResolver<'a> {
    providers: &'a [Provider],
    schedule: &'a ScheduleIndex,
    now: NaiveDateTime,
}

impl<'a> ProviderResolver<'a> {
    pub fn new(providers: &'a [Provider], schedule: &'a ScheduleIndex, now: NaiveDateTime) -> Self {
        Self {
            providers,
            schedule,
            now,
        }
    }

    /// Providers mentioned in `text`, from the most specific tier that hits:
    /// explicit id, full name, first + last name, last name alone. A bare
    /// last name must be capitalized so surnames like "Park" or "Hill" don't
    /// match ordinary words.
    pub fn mentions(&self, text: &str) -> Vec<&'a Provider> {
        let ids: Vec<String> = PROVIDER_ID
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        let by_id = self.find_all(|p| ids.contains(&p.id));
        if !by_id.is_empty() {
            return by_id;
        }

        let words = format!(" {} ", fold_for_matching(text));
        let has_word = |word: &str| words.contains(&format!(" {} ", word));

        let full_name = self.find_all(|p| {
            let tokens = p.name_tokens();
            tokens.len() >= 2 && has_word(&tokens.join(" "))
        });
        if !full_name.is_empty() {
            return full_name;
        }

        let first_last = self.find_all(|p| {
            let tokens = p.name_tokens();
            match (tokens.first(), tokens.last()) {
                (Some(first), Some(last)) if tokens.len() >= 2 => {
                    has_word(first.as_str()) && has_word(last.as_str())
                }
                _ => false,
            }
        });
        if !first_last.is_empty() {
            return first_last;
        }

        let capitalized: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().next().is_some_and(char::is_uppercase))
            .map(fold_for_matching)
            .collect();
        self.find_all(|p| {
            p.name_tokens()
                .last()
                .is_some_and(|last| capitalized.iter().any(|word| word == last))
        })
    }

    /// Resolve the provider the latest message is about. Falls back to the
    /// last few turns, the user's own first, when the message names nobody.
    pub fn resolve(
        &self,
        message: &str,
        history: &[ConversationTurn],
        constraints: &MatchConstraints,
    ) -> Resolution<'a> {
        self.resolve_with_source(message, history, constraints).0
    }

    pub fn resolve_with_source(
        &self,
        message: &str,
        history: &[ConversationTurn],
        constraints: &MatchConstraints,
    ) -> (Resolution<'a>, MentionSource) {
        let mut candidates = self.mentions(message);
        let mut source = MentionSource::Message;

        if candidates.is_empty() {
            source = MentionSource::RecentTurns;
            let recent: Vec<&ConversationTurn> =
                history.iter().rev().take(RECENCY_TURNS).collect();
            let (user, assistant): (Vec<&ConversationTurn>, Vec<&ConversationTurn>) =
                recent.into_iter().partition(|turn| turn.is_user());

            candidates = user
                .into_iter()
                .chain(assistant)
                .map(|turn| self.mentions(&turn.content))
                .find(|found| !found.is_empty())
                .unwrap_or_default();
        }

        (self.disambiguate(candidates, constraints), source)
    }

    /// Narrow by active constraints, then by soonest slot. With no
    /// constraints at all the candidate set is returned as-is.
    pub fn disambiguate(
        &self,
        mut candidates: Vec<&'a Provider>,
        constraints: &MatchConstraints,
    ) -> Resolution<'a> {
        match candidates.len() {
            0 => return Resolution::Unresolved,
            1 => return Resolution::Resolved(candidates[0]),
            _ => {}
        }

        self.sort_by_soonest(&mut candidates);

        if constraints.is_empty() {
            return Resolution::Ambiguous(candidates);
        }

        let narrowed: Vec<&'a Provider> = candidates
            .iter()
            .copied()
            .filter(|p| constraints.admits(p))
            .collect();
        let remaining = if narrowed.is_empty() { candidates } else { narrowed };

        if remaining.len() == 1 {
            return Resolution::Resolved(remaining[0]);
        }

        // Sorted, so a unique soonest slot sits at the front
        let first = self.schedule.next_slot(&remaining[0].id, self.now);
        let second = self.schedule.next_slot(&remaining[1].id, self.now);
        match (first, second) {
            (Some(a), Some(b)) if a.starts_at < b.starts_at => Resolution::Resolved(remaining[0]),
            (Some(_), None) => Resolution::Resolved(remaining[0]),
            _ => Resolution::Ambiguous(remaining),
        }
    }

    fn find_all(&self, matches: impl Fn(&Provider) -> bool) -> Vec<&'a Provider> {
        let mut found: Vec<&'a Provider> = Vec::new();
        for provider in self.providers.iter().filter(|p| matches(p)) {
            if !found.iter().any(|f| f.id == provider.id) {
                found.push(provider);
            }
        }
        found
    }

    fn sort_by_soonest(&self, candidates: &mut [&'a Provider]) {
        candidates.sort_by(|a, b| {
            let a = self.schedule.next_slot(&a.id, self.now);
            let b = self.schedule.next_slot(&b.id, self.now);
            match (a, b) {
                (Some(a), Some(b)) => a.starts_at.cmp(&b.starts_at),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }
}
