// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseStore};

use crate::models::{
    Appointment, AppointmentStatus, BookSlotRequest, BookingError, CustomerIdentity,
};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct BookingService {
    store: Arc<SupabaseStore>,
    lifecycle: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(SupabaseStore::new(config)),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a slot for a barber on a concrete date.
    ///
    /// The check-then-create below gives callers a friendly conflict answer,
    /// but serialization of concurrent attempts rests on the store's partial
    /// uniqueness constraint over (barber_id, date, time_of_day) for
    /// non-cancelled rows: of N concurrent attempts on the same key exactly
    /// one insert commits, the rest surface as SlotTaken.
    pub async fn book_slot(
        &self,
        request: BookSlotRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking slot for barber {} on {} at {}",
            request.barber_id,
            request.date,
            request.time_of_day.format("%H:%M")
        );

        self.validate_booking_request(&request)?;

        // **Step 1: Look up an active appointment holding this key**
        // A cancelled appointment does not hold the slot; a fresh record is
        // created next to it rather than reusing it.
        let holder: Option<Appointment> = self
            .store
            .find_one(
                "appointments",
                &[
                    ("barber_id", format!("eq.{}", request.barber_id)),
                    ("date", format!("eq.{}", request.date)),
                    ("time_of_day", format!("eq.{}", request.time_of_day.format("%H:%M"))),
                    ("status", "neq.cancelled".to_string()),
                ],
                auth_token,
            )
            .await?;

        if let Some(existing) = holder {
            warn!(
                "Slot already booked: barber {} on {} at {} held by appointment {}",
                request.barber_id,
                request.date,
                request.time_of_day.format("%H:%M"),
                existing.id
            );
            return Err(BookingError::SlotTaken);
        }

        // **Step 2: Insert a fresh Confirmed record**
        let now = Utc::now();
        let appointment_data = json!({
            "barber_id": request.barber_id,
            "shop_id": request.shop_id,
            "service_id": request.service_id,
            "customer_id": request.customer.as_uuid(),
            "date": request.date.to_string(),
            "time_of_day": request.time_of_day.format("%H:%M").to_string(),
            "status": AppointmentStatus::Confirmed.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let appointment = match self
            .store
            .create::<Appointment>("appointments", appointment_data, auth_token)
            .await
        {
            Ok(appointment) => appointment,
            Err(StoreError::Conflict(msg)) => {
                // Lost the race against a concurrent booking on the same key.
                warn!("Booking race lost for barber {}: {}", request.barber_id, msg);
                return Err(BookingError::SlotTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!("Appointment {} booked for barber {}", appointment.id, appointment.barber_id);
        Ok(appointment)
    }

    /// Get appointment by ID.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        debug!("Fetching appointment: {}", appointment_id);

        self.store
            .find_one(
                "appointments",
                &[("id", format!("eq.{}", appointment_id))],
                auth_token,
            )
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// List a barber's appointments, optionally narrowed to one date.
    pub async fn list_for_barber(
        &self,
        barber_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let mut filters = vec![("barber_id", format!("eq.{}", barber_id))];
        if let Some(date) = date {
            filters.push(("date", format!("eq.{}", date)));
        }

        let appointments = self
            .store
            .find(
                "appointments",
                &filters,
                Some("date.asc,time_of_day.asc"),
                auth_token,
            )
            .await?;

        Ok(appointments)
    }

    /// Apply a status transition through the central lifecycle table.
    ///
    /// The update is guarded by the status the record was read with, so a
    /// concurrent transition cannot double-apply; losing the guard re-reads
    /// and reports the real current status.
    pub async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        target_status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        debug!("Transitioning appointment {} to {}", appointment_id, target_status);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        self.lifecycle
            .validate_status_transition(&current.status, &target_status)?;

        let updated: Vec<Appointment> = self
            .store
            .update(
                "appointments",
                &[
                    ("id", format!("eq.{}", appointment_id)),
                    ("status", format!("eq.{}", current.status)),
                ],
                json!({
                    "status": target_status.to_string(),
                    "updated_at": Utc::now().to_rfc3339()
                }),
                auth_token,
            )
            .await?;

        match updated.into_iter().next() {
            Some(appointment) => {
                info!("Appointment {} transitioned to {}", appointment_id, appointment.status);
                Ok(appointment)
            }
            None => {
                // A concurrent transition won; report the status that beat us.
                let latest = self.get_appointment(appointment_id, auth_token).await?;
                Err(BookingError::InvalidStatusTransition(latest.status))
            }
        }
    }

    /// Physically remove a Cancelled appointment. The only path that deletes
    /// appointment rows; anything not yet cancelled is refused.
    pub async fn purge_cancelled(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.status != AppointmentStatus::Cancelled {
            return Err(BookingError::InvalidStatusTransition(appointment.status));
        }

        self.store
            .delete_many(
                "appointments",
                &[
                    ("id", format!("eq.{}", appointment_id)),
                    ("status", "eq.cancelled".to_string()),
                ],
                auth_token,
            )
            .await?;

        info!("Purged cancelled appointment {}", appointment_id);
        Ok(())
    }

    fn validate_booking_request(&self, request: &BookSlotRequest) -> Result<(), BookingError> {
        if request.barber_id.is_nil() {
            return Err(BookingError::ValidationError("barber_id must not be empty".to_string()));
        }
        if request.shop_id.is_nil() {
            return Err(BookingError::ValidationError("shop_id must not be empty".to_string()));
        }
        if request.service_id.is_nil() {
            return Err(BookingError::ValidationError("service_id must not be empty".to_string()));
        }
        // The guest sentinel is reserved; a registered customer id must be real.
        if let CustomerIdentity::Registered(customer_id) = request.customer {
            if customer_id.is_nil() {
                return Err(BookingError::ValidationError(
                    "customer_id must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
