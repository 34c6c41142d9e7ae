//! Point weights for ranking providers.
//!
//! Primary constraints (state, payment, care type) outweigh secondary ones
//! (language, having any upcoming opening).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub state: u32,
    pub payment: u32,
    pub role: u32,
    pub language: u32,
    pub availability: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            state: 4,
            payment: 3,
            role: 3,
            language: 1,
            availability: 1,
        }
    }
}

/// Which dimensions a provider satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSignals {
    pub state: bool,
    pub payment: bool,
    pub role: bool,
    pub language: bool,
    pub availability: bool,
}

impl ScoringWeights {
    pub fn score(&self, signals: MatchSignals) -> u32 {
        [
            (signals.state, self.state),
            (signals.payment, self.payment),
            (signals.role, self.role),
            (signals.language, self.language),
            (signals.availability, self.availability),
        ]
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, points)| points)
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_outweighs_secondary() {
        let w = ScoringWeights::default();
        assert!(w.state > w.language);
        assert!(w.payment > w.availability);
        assert!(w.role > w.language);
    }

    #[test]
    fn test_score_is_additive() {
        let w = ScoringWeights::default();
        let none = MatchSignals::default();
        let all = MatchSignals {
            state: true,
            payment: true,
            role: true,
            language: true,
            availability: true,
        };
        assert_eq!(w.score(none), 0);
        assert_eq!(w.score(all), 12);
        assert_eq!(
            w.score(MatchSignals {
                state: true,
                language: true,
                ..Default::default()
            }),
            5
        );
    }

    #[test]
    fn test_custom_weights() {
        let w = ScoringWeights {
            availability: 10,
            ..Default::default()
        };
        let signals = MatchSignals {
            availability: true,
            ..Default::default()
        };
        assert_eq!(w.score(signals), 10);
    }
}
