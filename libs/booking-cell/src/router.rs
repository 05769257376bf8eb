// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    // Availability browsing and walk-in bookings are open to the public
    let public_routes = Router::new()
        .route("/availability/{barber_id}", get(handlers::get_availability))
        .route("/appointments/guest", post(handlers::book_guest_appointment));

    let protected_routes = Router::new()
        .route("/appointments", post(handlers::book_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment).delete(handlers::purge_appointment),
        )
        .route(
            "/appointments/{appointment_id}/transition",
            post(handlers::transition_appointment),
        )
        .route(
            "/barbers/{barber_id}/appointments",
            get(handlers::list_barber_appointments),
        )
        .route(
            "/barbers/{barber_id}/working-slots",
            get(handlers::list_working_slots)
                .post(handlers::add_working_slots)
                .delete(handlers::remove_working_slots),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
