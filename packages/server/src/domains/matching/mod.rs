//! Matching domain - provider filtering, ranking and name resolution.

pub mod engine;
pub mod resolver;
pub mod weights;

pub use engine::{
    filter_providers, rank_providers, role_matches, FilterOutcome, MatchConstraints,
    MatchingEngine, ProviderCategory, ProviderGroup, ScoredProvider, Selection,
};
pub use resolver::{MentionSource, ProviderResolver, Resolution};
pub use weights::{MatchSignals, ScoringWeights};
