//! Schedule file parser.
//!
//! One slot per line: `prov_039|2025-09-22|09:00`. Rows that don't have
//! exactly three fields, or whose id/date/time fail validation, are dropped.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::common::normalize_text;
use crate::domains::schedules::models::Slot;

lazy_static! {
    static ref PROVIDER_ID: Regex = Regex::new(r"(?i)^prov_\d+$").unwrap();
    static ref DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref TIME: Regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();
}

/// Parse schedule text into slots sorted ascending by date and time.
pub fn parse_schedule(raw: &str) -> Vec<Slot> {
    let text = normalize_text(raw);
    let mut rows = 0usize;

    let mut slots: Vec<Slot> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .inspect(|_| rows += 1)
        .filter_map(parse_row)
        .collect();

    slots.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));

    debug!(rows, slots = slots.len(), "Parsed provider schedule");

    slots
}

fn parse_row(line: &str) -> Option<Slot> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let [id, date, time] = parts.as_slice() else {
        return None;
    };

    if !PROVIDER_ID.is_match(id) || !DATE.is_match(date) || !TIME.is_match(time) {
        return None;
    }

    // Shape alone lets through 2025-02-30 or 25:00
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let at = NaiveTime::parse_from_str(time, "%H:%M").ok()?;

    Some(Slot {
        provider_id: id.to_lowercase(),
        date: date.to_string(),
        time: time.to_string(),
        starts_at: day.and_time(at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_sorts() {
        let raw = "prov_002|2025-09-23|13:00\r\nprov_001|2025-09-22|09:00\nprov_001|2025-09-23|08:30\n";
        let slots = parse_schedule(raw);

        let keys: Vec<String> = slots.iter().map(|s| s.sort_key()).collect();
        assert_eq!(keys, vec!["2025-09-2209:00", "2025-09-2308:30", "2025-09-2313:00"]);
        assert_eq!(slots[2].provider_id, "prov_002");
    }

    #[test]
    fn test_drops_malformed_rows() {
        let raw = "\
prov_001|2025-09-22|09:00
prov_001|2025-09-22
prov_001|2025-09-22|09:00|extra
doctor_1|2025-09-22|09:00
prov_001|22/09/2025|09:00
prov_001|2025-09-22|9:00
prov_001|2025-02-30|09:00
prov_001|2025-09-22|25:00
garbage line";
        let slots = parse_schedule(raw);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].timestamp(), "2025-09-22 09:00");
    }

    #[test]
    fn test_provider_id_is_case_insensitive() {
        let slots = parse_schedule("PROV_007 | 2025-10-01 | 10:15");
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].provider_id, "prov_007");
    }

    #[test]
    fn test_reparse_is_identical() {
        let raw = "prov_003|2025-09-24|11:00\nprov_001|2025-09-22|09:00";
        assert_eq!(parse_schedule(raw), parse_schedule(raw));
    }
}
