// libs/booking-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseStore;

use crate::models::{weekday_index, Appointment, BookingError, DayAvailability, WorkingSlot};

pub struct AvailabilityService {
    store: Arc<SupabaseStore>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(SupabaseStore::new(config)),
        }
    }

    /// Compute the bookable slots for a barber on a specific date.
    ///
    /// `now` is passed in explicitly so callers control the clock; it only
    /// matters when `date` is the calendar date of `now`, in which case slots
    /// at or before the current time of day are no longer offered.
    ///
    /// The result is a point-in-time snapshot: a slot listed here can still
    /// lose a subsequent booking race.
    pub async fn resolve_available_slots(
        &self,
        barber_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
        auth_token: Option<&str>,
    ) -> Result<DayAvailability, BookingError> {
        let weekday = weekday_index(date);
        debug!("Resolving availability for barber {} on {} (weekday {})", barber_id, date, weekday);

        let candidates: Vec<WorkingSlot> = self
            .store
            .find(
                "working_slots",
                &[
                    ("barber_id", format!("eq.{}", barber_id)),
                    ("weekday", format!("eq.{}", weekday)),
                ],
                Some("time_of_day.asc"),
                auth_token,
            )
            .await?;

        // No template entries: the barber does not work this day, which is a
        // different answer than "fully booked".
        if candidates.is_empty() {
            return Ok(DayAvailability::NotWorking);
        }

        let appointments: Vec<Appointment> = self
            .store
            .find(
                "appointments",
                &[
                    ("barber_id", format!("eq.{}", barber_id)),
                    ("date", format!("eq.{}", date)),
                ],
                None,
                auth_token,
            )
            .await?;

        // Cancelled appointments do not occupy their slot.
        let occupied: HashSet<NaiveTime> = appointments
            .iter()
            .filter(|appointment| appointment.status.occupies_slot())
            .map(|appointment| appointment.time_of_day)
            .collect();

        let mut open: Vec<NaiveTime> = candidates
            .into_iter()
            .map(|slot| slot.time_of_day)
            .filter(|time| !occupied.contains(time))
            .collect();

        // Same-day cutoff: slots that have already elapsed are not offered.
        if date == now.date_naive() {
            let cutoff = now.time();
            open.retain(|time| *time > cutoff);
        }

        open.sort();
        open.dedup();

        debug!("Found {} open slots for barber {} on {}", open.len(), barber_id, date);
        Ok(DayAvailability::Open(open))
    }
}
