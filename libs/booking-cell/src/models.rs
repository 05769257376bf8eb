// libs/booking-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reserved identity for walk-in bookings made without an account.
pub const GUEST_CUSTOMER_ID: Uuid = Uuid::nil();

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// A concrete booking: one barber, one calendar date, one slot time.
///
/// At most one non-cancelled appointment may exist per
/// (barber_id, date, time_of_day); cancelled records accumulate freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub shop_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_guest_booking(&self) -> bool {
        self.customer_id == GUEST_CUSTOMER_ID
    }

    /// Weekday of the concrete date, 0 = Sunday .. 6 = Saturday. Never stored
    /// redundantly on the record.
    pub fn weekday(&self) -> i16 {
        weekday_index(self.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and Cancelled are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Whether an appointment in this status keeps its slot out of the
    /// availability pool. Cancellation fully frees the slot; completion does
    /// not, so booked history cannot be overwritten.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One entry of a barber's recurring weekly schedule: "works Tuesdays at
/// 14:00". Unique per (barber_id, weekday, time_of_day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSlot {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub weekday: i16,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// A (weekday, time-of-day) pair addressing one recurring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub weekday: i16,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
}

/// Who a booking is for. Guest resolves to the reserved sentinel identity;
/// the booking logic is otherwise identical for both cases.
#[derive(Debug, Clone, Copy)]
pub enum CustomerIdentity {
    Registered(Uuid),
    Guest,
}

impl CustomerIdentity {
    pub fn as_uuid(&self) -> Uuid {
        match self {
            CustomerIdentity::Registered(id) => *id,
            CustomerIdentity::Guest => GUEST_CUSTOMER_ID,
        }
    }
}

/// Result of resolving a barber's day: not working at all is a different
/// answer than working but fully booked.
#[derive(Debug, Clone, PartialEq)]
pub enum DayAvailability {
    NotWorking,
    Open(Vec<NaiveTime>),
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Service-level booking input, assembled by the handlers.
#[derive(Debug, Clone)]
pub struct BookSlotRequest {
    pub barber_id: Uuid,
    pub shop_id: Uuid,
    pub service_id: Uuid,
    pub customer: CustomerIdentity,
    pub date: NaiveDate,
    pub time_of_day: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub barber_id: Uuid,
    pub shop_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestAppointmentRequest {
    pub barber_id: Uuid,
    pub shop_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionAppointmentRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkingSlotsRequest {
    pub slots: Vec<SlotKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveWorkingSlotsRequest {
    pub entries: Vec<SlotKey>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Slot already booked")]
    SlotTaken,

    #[error("Working slot already exists")]
    SlotExists,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<shared_database::StoreError> for BookingError {
    fn from(err: shared_database::StoreError) -> Self {
        use shared_database::StoreError;
        match err {
            StoreError::Conflict(_) => BookingError::SlotTaken,
            StoreError::Unavailable(msg) => BookingError::StoreUnavailable(msg),
            other => BookingError::DatabaseError(other.to_string()),
        }
    }
}

// ==============================================================================
// WIRE-FORMAT HELPERS
// ==============================================================================

/// Weekday of a calendar date, 0 = Sunday .. 6 = Saturday, matching the
/// weekday assignment of the working-slot registry.
pub fn weekday_index(date: NaiveDate) -> i16 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Serde adapter for the zero-padded "HH:MM" 24-hour wire format. The
/// zero-padding makes lexicographic order equal temporal order, which the
/// store relies on for time filters. Accepts "HH:MM:SS" on input.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
