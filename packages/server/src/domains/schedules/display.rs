//! How slots are shown to patients, and how to read them back out of a
//! previous assistant reply.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::domains::schedules::models::Slot;

/// "1:00 PM, Tuesday, 09/23/2025"
pub const DISPLAY_FORMAT: &str = "%-I:%M %p, %A, %m/%d/%Y";

lazy_static! {
    static ref DISPLAY_STAMP: Regex = Regex::new(
        r"(?i)\b(\d{1,2}):(\d{2})\s*([ap])\.?m\.?\s*,\s*[a-z]+\s*,\s*(\d{1,2})/(\d{1,2})/(\d{4})"
    )
    .unwrap();
    static ref ISO_STAMP: Regex =
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2})\b").unwrap();
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format(DISPLAY_FORMAT).to_string()
}

pub fn format_slot(slot: &Slot) -> String {
    format_datetime(slot.starts_at)
}

/// Markdown checklist line, e.g. "- [ ] 9:00 AM, Monday, 09/22/2025".
pub fn checklist_item(slot: &Slot) -> String {
    format!("- [ ] {}", format_slot(slot))
}

/// Every timestamp found in `text`, in order of appearance. Understands the
/// display format and "YYYY-MM-DD HH:MM".
pub fn parse_shown_timestamps(text: &str) -> Vec<NaiveDateTime> {
    let mut found: Vec<(usize, NaiveDateTime)> = Vec::new();

    for caps in DISPLAY_STAMP.captures_iter(text) {
        let parsed = (|| {
            let mut hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps[2].parse().ok()?;
            let pm = caps[3].eq_ignore_ascii_case("p");
            if hour == 0 || hour > 12 {
                return None;
            }
            hour %= 12;
            if pm {
                hour += 12;
            }
            let month: u32 = caps[4].parse().ok()?;
            let day: u32 = caps[5].parse().ok()?;
            let year: i32 = caps[6].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(date.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?))
        })();
        if let (Some(at), Some(m)) = (parsed, caps.get(0)) {
            found.push((m.start(), at));
        }
    }

    for caps in ISO_STAMP.captures_iter(text) {
        let parsed = (|| {
            let date = NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )?;
            let time = NaiveTime::from_hms_opt(caps[4].parse().ok()?, caps[5].parse().ok()?, 0)?;
            Some(date.and_time(time))
        })();
        if let (Some(at), Some(m)) = (parsed, caps.get(0)) {
            found.push((m.start(), at));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, at)| at).collect()
}

/// Latest timestamp shown in `text`, if any.
pub fn latest_shown_timestamp(text: &str) -> Option<NaiveDateTime> {
    parse_shown_timestamps(text).into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::schedules::parser::parse_schedule;

    #[test]
    fn test_format_slot() {
        let slot = &parse_schedule("prov_001|2025-09-23|13:00")[0];
        assert_eq!(format_slot(slot), "1:00 PM, Tuesday, 09/23/2025");
        assert_eq!(checklist_item(slot), "- [ ] 1:00 PM, Tuesday, 09/23/2025");
    }

    #[test]
    fn test_format_morning_slot() {
        let slot = &parse_schedule("prov_001|2025-09-22|09:05")[0];
        assert_eq!(format_slot(slot), "9:05 AM, Monday, 09/22/2025");
    }

    #[test]
    fn test_parse_round_trips_display_format() {
        let slot = &parse_schedule("prov_001|2025-09-23|00:30")[0];
        let text = format!("Here you go:\n{}\n", checklist_item(slot));
        assert_eq!(parse_shown_timestamps(&text), vec![slot.starts_at]);
    }

    #[test]
    fn test_latest_across_formats() {
        let text = "Options:\n- [ ] 9:00 AM, Monday, 09/22/2025\n- [ ] 2025-09-24 16:00\n- [ ] 12:15 PM, Tuesday, 09/23/2025";
        let latest = latest_shown_timestamp(text).unwrap();
        assert_eq!(latest.format("%Y-%m-%d %H:%M").to_string(), "2025-09-24 16:00");
        assert_eq!(parse_shown_timestamps(text).len(), 3);
    }

    #[test]
    fn test_no_timestamps() {
        assert!(latest_shown_timestamp("How can I help you today?").is_none());
    }
}
