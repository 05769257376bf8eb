// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{DateTime, NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    BookSlotRequest, BookingError, CreateAppointmentRequest, CreateWorkingSlotsRequest,
    CustomerIdentity, DayAvailability, GuestAppointmentRequest, RemoveWorkingSlotsRequest,
    TransitionAppointmentRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;
use crate::services::cascade::ScheduleCascadeService;
use crate::services::working_hours::WorkingHoursService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub date: NaiveDate,
    /// Current moment for the same-day cutoff; defaults to the server clock.
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct BarberAppointmentsParams {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

/// Public: the open slots of a barber on a given date.
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Path(barber_id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);
    let now = params.now.unwrap_or_else(Utc::now);

    let availability = availability_service
        .resolve_available_slots(barber_id, params.date, now, None)
        .await
        .map_err(map_booking_error)?;

    let (works_this_day, open_slots) = match availability {
        DayAvailability::NotWorking => (false, vec![]),
        DayAvailability::Open(slots) => (true, slots),
    };

    Ok(Json(json!({
        "success": true,
        "barber_id": barber_id,
        "date": params.date,
        "works_this_day": works_this_day,
        "available": open_slots
            .iter()
            .map(|time| time.format("%H:%M").to_string())
            .collect::<Vec<_>>()
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

/// Authenticated booking: customers book their own slot, barbers and admins
/// may book on a customer's behalf.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_customer = request.customer_id.to_string() == user.id;
    let is_staff = matches!(user.role.as_deref(), Some("admin") | Some("barber"));

    if !is_customer && !is_staff {
        return Err(AppError::Auth(
            "Not authorized to book an appointment for this customer".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_slot(
            BookSlotRequest {
                barber_id: request.barber_id,
                shop_id: request.shop_id,
                service_id: request.service_id,
                customer: CustomerIdentity::Registered(request.customer_id),
                date: request.date,
                time_of_day: request.time_of_day,
            },
            Some(token),
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// Public walk-in booking under the reserved guest identity. Same booking
/// logic as the authenticated path.
#[axum::debug_handler]
pub async fn book_guest_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<GuestAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_slot(
            BookSlotRequest {
                barber_id: request.barber_id,
                shop_id: request.shop_id,
                service_id: request.service_id,
                customer: CustomerIdentity::Guest,
                date: request.date,
                time_of_day: request.time_of_day,
            },
            None,
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Guest appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, Some(token))
        .await
        .map_err(map_booking_error)?;

    let is_owner = appointment.customer_id.to_string() == user.id
        || appointment.barber_id.to_string() == user.id;
    let is_admin = user.role.as_deref() == Some("admin");

    if !is_owner && !is_admin {
        return Err(AppError::Auth("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// Apply a status transition (complete or cancel). Barber or admin only.
#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<TransitionAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !matches!(user.role.as_deref(), Some("admin") | Some("barber")) {
        return Err(AppError::Auth("Not authorized to transition appointments".to_string()));
    }

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .transition_appointment(appointment_id, request.status, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment status updated"
    })))
}

/// Admin purge of an already-cancelled appointment record.
#[axum::debug_handler]
pub async fn purge_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Auth("Not authorized to purge appointments".to_string()));
    }

    let booking_service = BookingService::new(&state);

    booking_service
        .purge_cancelled(appointment_id, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Cancelled appointment purged"
    })))
}

#[axum::debug_handler]
pub async fn list_barber_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(barber_id): Path<Uuid>,
    Query(params): Query<BarberAppointmentsParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !can_manage_schedule(&user, &barber_id) {
        return Err(AppError::Auth("Not authorized to view this barber's appointments".to_string()));
    }

    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .list_for_barber(barber_id, params.date, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

// ==============================================================================
// WORKING-HOURS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_working_slots(
    State(state): State<Arc<AppConfig>>,
    Path(barber_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !can_manage_schedule(&user, &barber_id) {
        return Err(AppError::Auth("Not authorized to view this schedule".to_string()));
    }

    let working_hours_service = WorkingHoursService::new(&state);

    let slots = working_hours_service
        .list_slots(barber_id, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "working_slots": slots
    })))
}

#[axum::debug_handler]
pub async fn add_working_slots(
    State(state): State<Arc<AppConfig>>,
    Path(barber_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateWorkingSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !can_manage_schedule(&user, &barber_id) {
        return Err(AppError::Auth("Not authorized to modify this schedule".to_string()));
    }

    let working_hours_service = WorkingHoursService::new(&state);

    let slots = working_hours_service
        .add_slots(barber_id, &request.slots, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "working_slots": slots,
        "message": "Working slots created"
    })))
}

/// Remove recurring slots; confirmed appointments that depended on them are
/// cancelled and the count is returned.
#[axum::debug_handler]
pub async fn remove_working_slots(
    State(state): State<Arc<AppConfig>>,
    Path(barber_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RemoveWorkingSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !can_manage_schedule(&user, &barber_id) {
        return Err(AppError::Auth("Not authorized to modify this schedule".to_string()));
    }

    let cascade_service = ScheduleCascadeService::new(&state);

    let cancelled = cascade_service
        .remove_working_slots(barber_id, &request.entries, Some(token))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "cancelled_appointments": cancelled,
        "message": "Working slots removed"
    })))
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn can_manage_schedule(user: &User, barber_id: &Uuid) -> bool {
    match user.role.as_deref() {
        Some("admin") => true,
        Some("barber") => user.id == barber_id.to_string(),
        _ => false,
    }
}

fn map_booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::SlotTaken => {
            AppError::Conflict("Slot already booked".to_string())
        }
        BookingError::SlotExists => {
            AppError::Conflict("Working slot already exists".to_string())
        }
        BookingError::InvalidStatusTransition(status) => {
            AppError::InvalidState(format!("Appointment cannot leave the {} status", status))
        }
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
        BookingError::StoreUnavailable(msg) => AppError::Unavailable(msg),
    }
}
