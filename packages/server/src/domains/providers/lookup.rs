//! Loose directory filtering for the `/api/providers` fallback.

use crate::common::us_states::resolve_state;
use crate::domains::providers::insurers::canonical_insurer;
use crate::domains::providers::models::{Provider, ProviderRole};

/// Case-insensitive "contains" filters. Blank filters match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryFilter<'a> {
    pub insurance: Option<&'a str>,
    pub specialty: Option<&'a str>,
    pub location: Option<&'a str>,
}

impl<'a> DirectoryFilter<'a> {
    pub fn matches(&self, provider: &Provider) -> bool {
        active(self.insurance).map_or(true, |q| insurance_matches(provider, &q))
            && active(self.specialty).map_or(true, |q| specialty_matches(provider, &q))
            && active(self.location).map_or(true, |q| location_matches(provider, &q))
    }

    pub fn apply<'p>(&self, providers: &'p [Provider]) -> Vec<&'p Provider> {
        providers.iter().filter(|p| self.matches(p)).collect()
    }
}

fn active(filter: Option<&str>) -> Option<String> {
    filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
}

fn insurance_matches(provider: &Provider, query: &str) -> bool {
    let token = canonical_insurer(query);
    provider.insurers_raw.to_lowercase().contains(query)
        || provider.insurers.iter().any(|i| i.contains(query) || *i == token)
}

/// "therapy" should find therapists, so the query is also read as a role tag.
fn specialty_matches(provider: &Provider, query: &str) -> bool {
    if provider.role.label().to_lowercase().contains(query) || provider.role.to_string().contains(query) {
        return true;
    }
    match ProviderRole::from_tag(query) {
        ProviderRole::Provider => false,
        wanted => provider.role == wanted || provider.role == ProviderRole::Both,
    }
}

fn location_matches(provider: &Provider, query: &str) -> bool {
    provider
        .licensed_states
        .iter()
        .any(|s| s.to_lowercase().contains(query))
        || resolve_state(query).is_some_and(|code| provider.is_licensed_in(code))
}
