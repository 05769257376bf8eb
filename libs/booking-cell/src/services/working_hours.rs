// libs/booking-cell/src/services/working_hours.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseStore};

use crate::models::{BookingError, SlotKey, WorkingSlot};

/// Registry of recurring weekly working hours, the candidate universe the
/// availability resolver draws from.
pub struct WorkingHoursService {
    store: Arc<SupabaseStore>,
}

impl WorkingHoursService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(SupabaseStore::new(config)),
        }
    }

    /// Add recurring slots for a barber. Entries must be unique per
    /// (barber, weekday, time_of_day); a duplicate rejects the request.
    pub async fn add_slots(
        &self,
        barber_id: Uuid,
        entries: &[SlotKey],
        auth_token: Option<&str>,
    ) -> Result<Vec<WorkingSlot>, BookingError> {
        debug!("Adding {} working slot(s) for barber {}", entries.len(), barber_id);

        if entries.is_empty() {
            return Err(BookingError::ValidationError("no slots provided".to_string()));
        }
        for entry in entries {
            validate_weekday(entry.weekday)?;
        }

        let existing: Vec<WorkingSlot> = self
            .store
            .find(
                "working_slots",
                &[("barber_id", format!("eq.{}", barber_id))],
                None,
                auth_token,
            )
            .await?;

        let mut taken: HashSet<(i16, NaiveTime)> = existing
            .iter()
            .map(|slot| (slot.weekday, slot.time_of_day))
            .collect();

        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            if !taken.insert((entry.weekday, entry.time_of_day)) {
                return Err(BookingError::SlotExists);
            }

            let slot_data = json!({
                "barber_id": barber_id,
                "weekday": entry.weekday,
                "time_of_day": entry.time_of_day.format("%H:%M").to_string(),
                "created_at": Utc::now().to_rfc3339()
            });

            let slot = match self
                .store
                .create::<WorkingSlot>("working_slots", slot_data, auth_token)
                .await
            {
                Ok(slot) => slot,
                // Unique (barber_id, weekday, time_of_day) index in the store.
                Err(StoreError::Conflict(_)) => return Err(BookingError::SlotExists),
                Err(e) => return Err(e.into()),
            };

            created.push(slot);
        }

        info!("Created {} working slot(s) for barber {}", created.len(), barber_id);
        Ok(created)
    }

    /// The barber's full recurring schedule, ordered by weekday then time.
    pub async fn list_slots(
        &self,
        barber_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<WorkingSlot>, BookingError> {
        let slots = self
            .store
            .find(
                "working_slots",
                &[("barber_id", format!("eq.{}", barber_id))],
                Some("weekday.asc,time_of_day.asc"),
                auth_token,
            )
            .await?;

        Ok(slots)
    }
}

pub(crate) fn validate_weekday(weekday: i16) -> Result<(), BookingError> {
    if !(0..=6).contains(&weekday) {
        return Err(BookingError::ValidationError(
            "weekday must be between 0 (Sunday) and 6 (Saturday)".to_string(),
        ));
    }
    Ok(())
}
