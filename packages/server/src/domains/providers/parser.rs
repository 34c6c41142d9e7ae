//! Provider directory parser.
//!
//! The directory is a human-authored text file, one block per provider:
//!
//! ```text
//! prov_001  Allison Hill (PsyD) — Therapy
//! Styles: CBT, ACT
//! Lived Experience: Veteran
//! Languages: English, Spanish
//! Licensed States: AZ, NM
//! Insurance: Aetna, Cash
//! Email: allison.hill@example.com
//! ```
//!
//! Blocks are usually separated by blank lines, but a line that starts with a
//! provider id always begins a new block, so directories missing separators
//! still parse. Blocks without a usable header are skipped.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::common::{normalize_line, normalize_text};
use crate::domains::providers::insurers::canonical_insurer;
use crate::domains::providers::models::{
    credentials_imply_prescriber, split_list, Provider, ProviderRole,
};

lazy_static! {
    static ref HEADER_START: Regex = Regex::new(r"(?i)^prov_\d+\b").unwrap();
    static ref HEADER: Regex = Regex::new(r"(?i)^(prov_\d+)\s+(.+)$").unwrap();
    // Spaced hyphen, or an en/em dash with optional spacing
    static ref ROLE_SEPARATOR: Regex = Regex::new(r"\s+-+\s+|\s*[–—]\s*").unwrap();
    // Unspaced hyphen after a credential paren, or before a role tag ending the line
    static ref TIGHT_ROLE_SEPARATOR: Regex = Regex::new(
        r"(?i)\)\s*-+\s*|-+\s*(?:therap|psychiat|counsel|medication|prescrib|both)[a-z &/]*$"
    )
    .unwrap();
    static ref PAREN_CREDENTIALS: Regex = Regex::new(r"^(.*?)\s*\(([^)]*)\)\s*$").unwrap();
    static ref FIELD: Regex = Regex::new(
        r"(?i)^(styles|lived experience|languages?|licensed states?|insurance|email)\s*:\s*(.*)$"
    )
    .unwrap();
}

/// Parse the full directory text into providers, in source order.
///
/// Duplicate ids are kept; malformed blocks are dropped silently.
pub fn parse_providers(raw: &str) -> Vec<Provider> {
    let text = normalize_text(raw);
    if text.is_empty() {
        return Vec::new();
    }

    let blocks = segment_blocks(&text);
    let total = blocks.len();
    let providers: Vec<Provider> = blocks.iter().filter_map(|b| parse_block(b)).collect();

    debug!(
        blocks = total,
        providers = providers.len(),
        skipped = total - providers.len(),
        "Parsed provider directory"
    );

    providers
}

/// Split into header-led blocks. A blank line ends a block and a header line
/// starts one; lines outside any block are discarded.
fn segment_blocks(text: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for raw_line in text.split('\n') {
        let line = normalize_line(raw_line);

        if line.is_empty() {
            blocks.extend(current.take());
        } else if HEADER_START.is_match(&line) {
            blocks.extend(current.take());
            current = Some(vec![line]);
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }
    blocks.extend(current);

    blocks
}

#[derive(Default)]
struct Fields {
    styles: String,
    lived: String,
    languages: String,
    licensed_states: String,
    insurance: String,
    email: String,
}

fn parse_block(lines: &[String]) -> Option<Provider> {
    let header = parse_header(lines.first()?)?;

    let mut fields = Fields::default();
    for line in &lines[1..] {
        read_field(line, &mut fields);
    }

    let licensed_states = dedup(
        split_list(&fields.licensed_states)
            .into_iter()
            .map(|s| if s.chars().count() == 2 { s.to_uppercase() } else { s })
            .collect(),
    );
    let insurers = dedup(
        split_list(&fields.insurance)
            .iter()
            .map(|entry| canonical_insurer(entry))
            .collect(),
    );

    Some(Provider {
        id: header.id,
        name: header.name,
        role: header.role,
        credentials: header.credentials,
        licensed_states,
        insurers,
        insurers_raw: fields.insurance,
        languages: split_list(&fields.languages),
        lived_experience: split_list(&fields.lived),
        styles: fields.styles,
        email: Some(fields.email).filter(|e| !e.is_empty()),
    })
}

struct Header {
    id: String,
    name: String,
    role: ProviderRole,
    credentials: Option<String>,
}

/// `<id> <name>[ <dash> <role tag>]`
fn parse_header(line: &str) -> Option<Header> {
    let caps = HEADER.captures(line)?;
    let id = caps[1].to_lowercase();
    let rest = caps[2].trim();

    let (name_part, role_tag) = match ROLE_SEPARATOR.find_iter(rest).last() {
        Some(sep) => (rest[..sep.start()].trim(), rest[sep.end()..].trim()),
        None => split_tight_role(rest),
    };

    let (name, credentials) = split_credentials(name_part);
    if name.is_empty() {
        return None;
    }

    let role = if !role_tag.is_empty() {
        ProviderRole::from_tag(role_tag)
    } else if credentials.as_deref().is_some_and(credentials_imply_prescriber)
        || bare_prescriber_suffix(&name)
    {
        ProviderRole::Psychiatrist
    } else {
        ProviderRole::Therapist
    };

    Some(Header {
        id,
        name,
        role,
        credentials,
    })
}

/// "Marcus Reed (MD)-Psychiatry" or "Ann Lee-Therapy". A hyphen inside a
/// name ("Mary-Jane") is only a separator when a role tag follows it.
fn split_tight_role(rest: &str) -> (&str, &str) {
    let Some(sep) = TIGHT_ROLE_SEPARATOR.find(rest) else {
        return (rest, "");
    };
    let hyphen = sep.start() + sep.as_str().find('-').unwrap_or(0);
    let role_tag = rest[hyphen..].trim_start_matches(|c: char| c == '-' || c.is_whitespace());
    // Keep the closing paren with the name so credentials still split off
    (rest[..hyphen].trim(), role_tag.trim())
}

/// "Allison Hill (PsyD)" or "Jane Doe, LCSW, PMHNP" -> (name, credentials)
fn split_credentials(name_part: &str) -> (String, Option<String>) {
    if let Some(caps) = PAREN_CREDENTIALS.captures(name_part) {
        let creds = caps[2].trim();
        return (
            caps[1].trim().to_string(),
            Some(creds.to_string()).filter(|c| !c.is_empty()),
        );
    }

    if let Some((name, tail)) = name_part.split_once(',') {
        if tail.split(',').all(looks_like_credential) {
            return (name.trim().to_string(), Some(tail.trim().to_string()));
        }
    }

    (name_part.trim().to_string(), None)
}

/// "LCSW", "PMHNP-BC", "Ph.D." - short, letters only, mostly uppercase.
fn looks_like_credential(token: &str) -> bool {
    let token = token.trim();
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty()
        && letters.len() <= 8
        && token.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '/'))
        && letters.iter().filter(|c| c.is_uppercase()).count() >= 2
}

/// Uppercase prescriber credential written straight after the name ("Ann Lee MD").
fn bare_prescriber_suffix(name: &str) -> bool {
    name.split_whitespace()
        .skip(1)
        .any(|t| matches!(t.trim_matches('.'), "MD" | "DO" | "PMHNP" | "APRN" | "NP"))
}

fn read_field(line: &str, fields: &mut Fields) {
    if let Some(caps) = FIELD.captures(line) {
        let value = caps[2].trim().to_string();
        let label = caps[1].to_lowercase();
        match label.as_str() {
            "styles" => fields.styles = value,
            "lived experience" => fields.lived = value,
            "language" | "languages" => fields.languages = value,
            "licensed state" | "licensed states" => fields.licensed_states = value,
            "insurance" => fields.insurance = value,
            "email" => fields.email = value,
            _ => {}
        }
        return;
    }

    // Tolerate drift like "Our Licensed States - AZ: NM" or "Insurance accepted: ..."
    // ASCII folding keeps byte offsets aligned with `line`.
    let lower = line.to_ascii_lowercase();
    if fields.licensed_states.is_empty() && lower.contains("licensed states") {
        fields.licensed_states = value_after_keyword(line, &lower, "licensed states");
    } else if fields.insurance.is_empty() && lower.contains("insurance") {
        fields.insurance = value_after_keyword(line, &lower, "insurance");
    }
}

/// Text after the first colon, or after the keyword when there is no colon.
fn value_after_keyword(line: &str, lower: &str, keyword: &str) -> String {
    match line.split_once(':') {
        Some((_, value)) => value.trim().to_string(),
        None => lower
            .find(keyword)
            .map(|pos| line[pos + keyword.len()..].trim().to_string())
            .unwrap_or_default(),
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
