use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domains::schedules::models::Slot;

/// Slots grouped by provider id, each list ascending by time.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    by_provider: HashMap<String, Vec<Slot>>,
}

impl ScheduleIndex {
    /// Build from an already sorted slot list; per-provider order follows it.
    pub fn build(slots: &[Slot]) -> Self {
        let mut by_provider: HashMap<String, Vec<Slot>> = HashMap::new();
        for slot in slots {
            by_provider
                .entry(slot.provider_id.clone())
                .or_default()
                .push(slot.clone());
        }
        Self { by_provider }
    }

    pub fn slots_for(&self, provider_id: &str) -> &[Slot] {
        self.by_provider
            .get(provider_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All timestamps for a provider, "YYYY-MM-DD HH:MM".
    pub fn timestamps(&self, provider_id: &str) -> Vec<String> {
        self.slots_for(provider_id)
            .iter()
            .map(Slot::timestamp)
            .collect()
    }

    /// Slots strictly after `anchor`, soonest first.
    pub fn future_slots<'a>(
        &'a self,
        provider_id: &str,
        anchor: NaiveDateTime,
    ) -> impl Iterator<Item = &'a Slot> + 'a {
        self.slots_for(provider_id)
            .iter()
            .filter(move |slot| slot.is_after(anchor))
    }

    pub fn soonest_slots_for(
        &self,
        provider_id: &str,
        anchor: NaiveDateTime,
        limit: usize,
    ) -> Vec<&Slot> {
        self.future_slots(provider_id, anchor).take(limit).collect()
    }

    pub fn next_slot(&self, provider_id: &str, anchor: NaiveDateTime) -> Option<&Slot> {
        self.future_slots(provider_id, anchor).next()
    }

    pub fn has_future_slot(&self, provider_id: &str, anchor: NaiveDateTime) -> bool {
        self.next_slot(provider_id, anchor).is_some()
    }

    pub fn provider_count(&self) -> usize {
        self.by_provider.len()
    }

    pub fn slot_count(&self) -> usize {
        self.by_provider.values().map(Vec::len).sum()
    }
}
