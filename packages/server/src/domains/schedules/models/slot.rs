use chrono::NaiveDateTime;
use serde::Serialize;

/// One bookable appointment time for a provider.
///
/// `provider_id` is not checked against the directory; slots for unknown
/// providers are kept and simply never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    #[serde(rename = "id")]
    pub provider_id: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, 24-hour
    pub time: String,
    #[serde(skip)]
    pub starts_at: NaiveDateTime,
}

impl Slot {
    /// Concatenated date+time; orders correctly as a plain string.
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.date, self.time)
    }

    /// "YYYY-MM-DD HH:MM"
    pub fn timestamp(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    pub fn is_after(&self, anchor: NaiveDateTime) -> bool {
        self.starts_at > anchor
    }
}
