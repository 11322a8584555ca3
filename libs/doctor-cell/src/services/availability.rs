use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use security_cell::{ValidationIssue, ValidationService};
use shared_database::{decode, Collection, DocumentStore};

use crate::models::{DayAvailability, DayOfWeek, Doctor, DoctorError, TimeSlot};

/// Decides whether an instant falls inside a doctor's weekly availability.
///
/// Weekday and time of day are both read in the clinic's reference
/// timezone, the zone the `HH:MM` slots are authored in.
pub struct AvailabilityService {
    store: Arc<dyn DocumentStore>,
    timezone: Tz,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn DocumentStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// `Ok(false)` is a normal negative answer; a missing doctor is `NotFound`.
    #[instrument(skip(self))]
    pub async fn is_available(&self, doctor_id: Uuid, desired: DateTime<Utc>) -> Result<bool, DoctorError> {
        let row = self
            .store
            .get(Collection::Doctors, &doctor_id.to_string())
            .await?
            .ok_or(DoctorError::NotFound)?;
        let doctor: Doctor = decode(row)?;

        let available = is_within_availability(&doctor.availability, desired, self.timezone);
        debug!("Doctor {} available at {}: {}", doctor_id, desired, available);
        Ok(available)
    }
}

fn parse_slot(slot: &TimeSlot) -> Result<(NaiveTime, NaiveTime), ValidationIssue> {
    let start = ValidationService::parse_time_of_day(&slot.start, "start")?;
    let end = ValidationService::parse_time_of_day(&slot.end, "end")?;
    Ok((start, end))
}

/// Pure slot test used by the resolver.
pub fn is_within_availability(availability: &[DayAvailability], desired: DateTime<Utc>, timezone: Tz) -> bool {
    let local = desired.with_timezone(&timezone);
    let weekday = DayOfWeek::from(local.weekday());
    let time_of_day = local.time();

    let Some(day) = availability.iter().find(|entry| entry.day == weekday) else {
        return false;
    };

    day.time_slots.iter().any(|slot| match parse_slot(slot) {
        Ok((start, end)) => start <= time_of_day && time_of_day < end,
        Err(issue) => {
            warn!("Skipping unreadable {:?} slot: {}", weekday, issue);
            false
        }
    })
}

// ==============================================================================
// WRITE-SIDE RULES
// ==============================================================================

/// One entry per weekday; every slot well formed with `start < end`; no
/// two slots of the same day overlapping.
pub fn validate_weekly_availability(availability: &[DayAvailability]) -> Result<(), ValidationIssue> {
    let mut seen = HashSet::new();

    for day in availability {
        if !seen.insert(day.day) {
            return Err(ValidationIssue::InvalidRange {
                field: "availability".to_string(),
                detail: format!("{:?} is listed more than once", day.day),
            });
        }

        let mut ranges = Vec::with_capacity(day.time_slots.len());
        for slot in &day.time_slots {
            let (start, end) = parse_slot(slot)?;
            if start >= end {
                return Err(ValidationIssue::InvalidRange {
                    field: "timeSlots".to_string(),
                    detail: format!("{:?} slot {}-{} must start before it ends", day.day, slot.start, slot.end),
                });
            }
            ranges.push((start, end));
        }

        ranges.sort();
        if let Some(pair) = ranges.windows(2).find(|pair| pair[1].0 < pair[0].1) {
            return Err(ValidationIssue::InvalidRange {
                field: "timeSlots".to_string(),
                detail: format!(
                    "{:?} slots {}-{} and {}-{} overlap",
                    day.day,
                    pair[0].0.format("%H:%M"),
                    pair[0].1.format("%H:%M"),
                    pair[1].0.format("%H:%M"),
                    pair[1].1.format("%H:%M")
                ),
            });
        }
    }

    Ok(())
}

/// Days present in `updates` replace the existing day's slots; new days are
/// appended in the order given.
pub fn merge_availability(existing: Vec<DayAvailability>, updates: Vec<DayAvailability>) -> Vec<DayAvailability> {
    let mut merged = existing;
    for update in updates {
        match merged.iter_mut().find(|entry| entry.day == update.day) {
            Some(entry) => entry.time_slots = update.time_slots,
            None => merged.push(update),
        }
    }
    merged
}
