// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-Slot Scheduler (C5, spec §4.4).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ErrorCode};

/// Fixed daily slot start hours. Eight 2-hour blocks starting at 07:00 local.
pub const SLOT_START_HOURS: [u32; 8] = [7, 9, 11, 13, 15, 17, 19, 21];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSlot {
    pub id: String,
    pub driver_id: String,
    pub date: chrono::NaiveDate,
    pub start_hour: u32,
    pub label: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub status: SlotStatus,
    pub is_selected: bool,
    pub customer_id: Option<String>,
}

pub fn slot_id(driver_id: &str, date: chrono::NaiveDate, start_hour: u32) -> String {
    format!("{driver_id}_{}_{start_hour:02}-{:02}", date.format("%Y-%m-%d"), start_hour + 2)
}

/// Generate the eight canonical slot rows for `(driver_id, date)`.
///
/// Idempotent by construction: calling this twice produces byte-identical
/// rows (aside from `is_selected`, which generation always resets to
/// `false`), so the caller's delete-then-insert batch (store layer) is safe
/// to repeat (spec P4).
pub fn generate_daily_slots(driver_id: &str, date: chrono::NaiveDate) -> Vec<WorkSlot> {
    SLOT_START_HOURS
        .iter()
        .map(|&start_hour| {
            let start_time = date
                .and_hms_opt(start_hour, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc());
            let end_time = start_time + chrono::Duration::hours(2);
            WorkSlot {
                id: slot_id(driver_id, date, start_hour),
                driver_id: driver_id.to_owned(),
                date,
                start_hour,
                label: format!("{start_hour:02}:00 - {:02}:00", start_hour + 2),
                start_time,
                end_time,
                status: SlotStatus::Available,
                is_selected: false,
                customer_id: None,
            }
        })
        .collect()
}

/// I5: a slot whose `startTime <= now` cannot be deselected.
pub fn set_selected(
    slot: &mut WorkSlot,
    driver_id: &str,
    is_selected: bool,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), CoreError> {
    if slot.driver_id != driver_id {
        return Err(CoreError::Validation("slot is not owned by this driver".into()));
    }
    if !is_selected && slot.is_selected && slot.start_time <= now {
        return Err(CoreError::SlotAlreadyStarted);
    }
    slot.is_selected = is_selected;
    Ok(())
}

/// Batch variant: silently skips slots that would violate the time guard,
/// returning the ids that were actually changed.
pub fn set_selected_batch(
    slots: &mut [WorkSlot],
    driver_id: &str,
    slot_ids: &[String],
    is_selected: bool,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<String> {
    let wanted: std::collections::HashSet<&String> = slot_ids.iter().collect();
    let mut changed = Vec::new();
    for slot in slots.iter_mut().filter(|s| wanted.contains(&s.id)) {
        if set_selected(slot, driver_id, is_selected, now).is_ok() {
            changed.push(slot.id.clone());
        }
    }
    changed
}

/// Book an `available` slot for a customer.
pub fn book_slot(slot: &mut WorkSlot, customer_id: &str) -> Result<(), ErrorCode> {
    if slot.status != SlotStatus::Available {
        return Err(ErrorCode::SlotNotAvailable);
    }
    slot.status = SlotStatus::Booked;
    slot.customer_id = Some(customer_id.to_owned());
    Ok(())
}

/// Process-local guard preventing duplicate concurrent slot generation for
/// the same driver (spec §4.4's "concurrency guard").
///
/// A second `try_acquire` for the same driver within [`GUARD_WINDOW`] is
/// rejected; after that the prior attempt is considered stuck and replaced.
pub struct SlotGenerationGuard {
    inflight: Mutex<HashMap<String, Instant>>,
}

const GUARD_WINDOW: Duration = Duration::from_secs(5);

impl Default for SlotGenerationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotGenerationGuard {
    pub fn new() -> Self {
        Self { inflight: Mutex::new(HashMap::new()) }
    }

    /// Attempt to acquire the generation guard for `driver_id`. Returns
    /// `Err(GenerationInProgress)` if another generation is already within
    /// the guard window; otherwise marks this driver in-flight.
    pub fn try_acquire(&self, driver_id: &str) -> Result<(), CoreError> {
        let mut map = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(started) = map.get(driver_id) {
            if started.elapsed() < GUARD_WINDOW {
                return Err(CoreError::GenerationInProgress);
            }
        }
        map.insert(driver_id.to_owned(), Instant::now());
        Ok(())
    }

    pub fn release(&self, driver_id: &str) {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner()).remove(driver_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn generation_produces_eight_canonical_slots() {
        let slots = generate_daily_slots("d1", date());
        assert_eq!(slots.len(), 8);
        let ids: std::collections::HashSet<_> = slots.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(slots[0].id, "d1_2025-03-01_07-09");
    }

    #[test]
    fn repeated_generation_is_byte_identical() {
        let a = generate_daily_slots("d1", date());
        let b = generate_daily_slots("d1", date());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.start_time, y.start_time);
        }
    }

    #[test]
    fn deselect_after_start_is_rejected() {
        let mut slots = generate_daily_slots("d1", date());
        slots[0].is_selected = true;
        let now = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let err = set_selected(&mut slots[0], "d1", false, now).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SlotAlreadyStarted);
        assert!(slots[0].is_selected);
    }

    #[test]
    fn deselect_before_start_succeeds() {
        let mut slots = generate_daily_slots("d1", date());
        slots[0].is_selected = true;
        let now = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
        set_selected(&mut slots[0], "d1", false, now).unwrap();
        assert!(!slots[0].is_selected);
    }

    #[test]
    fn batch_select_skips_started_slots() {
        let mut slots = generate_daily_slots("d1", date());
        slots[0].is_selected = true;
        slots[1].is_selected = true;
        let now = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let ids = vec![slots[0].id.clone(), slots[1].id.clone()];
        let changed = set_selected_batch(&mut slots, "d1", &ids, false, now);
        assert_eq!(changed, vec![slots[1].id.clone()]);
    }

    #[test]
    fn guard_rejects_concurrent_generation() {
        let guard = SlotGenerationGuard::new();
        guard.try_acquire("d1").unwrap();
        let err = guard.try_acquire("d1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::GenerationInProgress);
    }

    #[test]
    fn guard_allows_after_release() {
        let guard = SlotGenerationGuard::new();
        guard.try_acquire("d1").unwrap();
        guard.release("d1");
        guard.try_acquire("d1").unwrap();
    }
}
