use serde::{Deserialize, Serialize};

use crate::common::{fold_for_matching, us_states};
use crate::domains::providers::insurers::{is_cash_pay, CASH_PAY};

/// Credentials that imply prescribing authority.
const PRESCRIBING_CREDENTIALS: &[&str] = &["md", "do", "pmhnp", "aprn", "np"];

/// Honorifics ignored when tokenizing names.
const NAME_TITLES: &[&str] = &["dr", "mr", "mrs", "ms", "mx", "prof"];

/// Clinical role as tagged in the directory header
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    Therapist,
    Psychiatrist,
    Both,
    /// A role tag was present but not recognized
    Provider,
}

impl ProviderRole {
    /// Map a free-text role tag ("Therapy", "Psychiatry / Med Management",
    /// "Therapy + Psychiatry") to a role.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        let psych = tag.contains("psychiat") || tag.contains("medication") || tag.contains("prescrib");
        let therapy = tag.contains("therap") || tag.contains("counsel");

        if tag.contains("both") || (psych && therapy) {
            ProviderRole::Both
        } else if psych {
            ProviderRole::Psychiatrist
        } else if therapy {
            ProviderRole::Therapist
        } else {
            ProviderRole::Provider
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderRole::Therapist => "Therapist",
            ProviderRole::Psychiatrist => "Psychiatrist",
            ProviderRole::Both => "Therapist & Psychiatrist",
            ProviderRole::Provider => "Provider",
        }
    }
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderRole::Therapist => write!(f, "therapist"),
            ProviderRole::Psychiatrist => write!(f, "psychiatrist"),
            ProviderRole::Both => write!(f, "both"),
            ProviderRole::Provider => write!(f, "provider"),
        }
    }
}

/// Provider model - one clinician parsed from the directory text.
///
/// Providers are rebuilt from source text on every parse and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub role: ProviderRole,
    pub credentials: Option<String>,

    // Licensure and payment
    pub licensed_states: Vec<String>,
    /// Normalized payment tokens (`aetna`, `bcbs`, `cashpay`, ...)
    pub insurers: Vec<String>,
    /// Insurance line exactly as written
    pub insurers_raw: String,

    // Profile
    pub languages: Vec<String>,
    pub lived_experience: Vec<String>,
    pub styles: String,
    pub email: Option<String>,
}

impl Provider {
    /// Licensed in `state`, given as a two-letter code. Full state names in
    /// the directory are resolved too.
    pub fn is_licensed_in(&self, state: &str) -> bool {
        self.licensed_states.iter().any(|s| {
            s.eq_ignore_ascii_case(state)
                || us_states::code_for_name(s).is_some_and(|code| code.eq_ignore_ascii_case(state))
        })
    }

    /// Accepts the normalized payment token.
    pub fn accepts(&self, insurer: &str) -> bool {
        self.insurers.iter().any(|i| i == insurer)
    }

    pub fn accepts_cash(&self) -> bool {
        self.accepts(CASH_PAY)
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l.eq_ignore_ascii_case(language))
    }

    /// Holds a credential that implies prescribing authority.
    pub fn has_prescribing_credential(&self) -> bool {
        self.credentials.as_deref().is_some_and(credentials_imply_prescriber)
    }

    /// Can see clients for medication management.
    pub fn is_prescriber(&self) -> bool {
        matches!(self.role, ProviderRole::Psychiatrist | ProviderRole::Both)
            || self.has_prescribing_credential()
    }

    /// Offers talk therapy.
    pub fn is_therapist(&self) -> bool {
        matches!(self.role, ProviderRole::Therapist | ProviderRole::Both)
    }

    /// Name with credentials, e.g. "Allison Hill, PsyD".
    pub fn display_name(&self) -> String {
        match &self.credentials {
            Some(creds) => format!("{}, {}", self.name, creds),
            None => self.name.clone(),
        }
    }

    /// Insurance entries as written, cash-pay options first.
    pub fn payment_labels(&self) -> Vec<String> {
        let entries: Vec<String> = split_list(&self.insurers_raw);
        let (cash, other): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| is_cash_pay(e));
        cash.into_iter().chain(other).collect()
    }

    /// Languages with English first when listed.
    pub fn language_labels(&self) -> Vec<String> {
        let (english, other): (Vec<_>, Vec<_>) = self
            .languages
            .iter()
            .cloned()
            .partition(|l| l.eq_ignore_ascii_case("english"));
        english.into_iter().chain(other).collect()
    }

    /// Lowercase name tokens without honorifics ("Dr. Ann Lee" -> ["ann", "lee"]).
    pub fn name_tokens(&self) -> Vec<String> {
        fold_for_matching(&self.name)
            .split(' ')
            .filter(|t| !t.is_empty() && !NAME_TITLES.contains(t))
            .map(str::to_string)
            .collect()
    }
}

/// Whether a credentials string contains a prescribing credential.
pub fn credentials_imply_prescriber(credentials: &str) -> bool {
    credentials
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| PRESCRIBING_CREDENTIALS.contains(&token.to_lowercase().as_str()))
}

/// Split a list field on commas and semicolons, trimming and dropping empties.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
