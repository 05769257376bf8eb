// libs/booking-cell/src/services/cascade.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseStore;

use crate::models::{weekday_index, Appointment, AppointmentStatus, BookingError, SlotKey};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::working_hours::validate_weekday;

/// Compensating action for schedule mutation: removing a recurring slot must
/// not leave confirmed bookings referencing a slot that no longer exists.
pub struct ScheduleCascadeService {
    store: Arc<SupabaseStore>,
    lifecycle: AppointmentLifecycleService,
}

impl ScheduleCascadeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(SupabaseStore::new(config)),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Delete the named recurring slots and cancel every Confirmed
    /// appointment that depended on them. Returns how many appointments were
    /// cancelled.
    ///
    /// Cancellations are independent per-appointment transitions: a failure
    /// partway through leaves the earlier ones in place, and re-running the
    /// cascade over already-cancelled rows is a no-op contributing zero.
    pub async fn remove_working_slots(
        &self,
        barber_id: Uuid,
        entries: &[SlotKey],
        auth_token: Option<&str>,
    ) -> Result<u64, BookingError> {
        for entry in entries {
            validate_weekday(entry.weekday)?;
        }

        let mut cancelled_total = 0u64;

        for entry in entries {
            let time = entry.time_of_day.format("%H:%M").to_string();

            let removed = self
                .store
                .delete_many(
                    "working_slots",
                    &[
                        ("barber_id", format!("eq.{}", barber_id)),
                        ("weekday", format!("eq.{}", entry.weekday)),
                        ("time_of_day", format!("eq.{}", time)),
                    ],
                    auth_token,
                )
                .await?;

            debug!(
                "Removed {} working slot(s) at weekday {} {} for barber {}",
                removed, entry.weekday, time, barber_id
            );

            // Confirmed appointments at this time of day; the weekday match
            // is recomputed from each stored date, past dates included.
            let holders: Vec<Appointment> = self
                .store
                .find(
                    "appointments",
                    &[
                        ("barber_id", format!("eq.{}", barber_id)),
                        ("time_of_day", format!("eq.{}", time)),
                        ("status", format!("eq.{}", AppointmentStatus::Confirmed)),
                    ],
                    None,
                    auth_token,
                )
                .await?;

            for appointment in holders {
                if weekday_index(appointment.date) != entry.weekday {
                    continue;
                }

                self.lifecycle
                    .validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

                // Guarded on the Confirmed status: if a concurrent run (or the
                // customer) already moved the record, this updates nothing.
                let updated: Vec<Appointment> = self
                    .store
                    .update(
                        "appointments",
                        &[
                            ("id", format!("eq.{}", appointment.id)),
                            ("status", format!("eq.{}", AppointmentStatus::Confirmed)),
                        ],
                        json!({
                            "status": AppointmentStatus::Cancelled.to_string(),
                            "updated_at": Utc::now().to_rfc3339()
                        }),
                        auth_token,
                    )
                    .await?;

                if !updated.is_empty() {
                    cancelled_total += 1;
                }
            }
        }

        info!(
            "Schedule cascade for barber {} cancelled {} appointment(s)",
            barber_id, cancelled_total
        );
        Ok(cancelled_total)
    }
}
