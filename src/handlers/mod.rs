pub mod admin;
pub mod events;
pub mod public;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/slots", get(public::list_dates))
        .route("/api/slots/:date", get(public::day_slots))
        .route("/api/contacts/check", post(public::check_contact))
        .route("/api/bookings", post(public::submit_booking))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/accept",
            post(admin::accept_booking),
        )
        .route(
            "/api/admin/bookings/:id/decline",
            post(admin::decline_booking),
        )
        .route(
            "/api/admin/contacts",
            get(admin::get_contacts).post(admin::add_contact),
        )
        .route("/api/admin/contacts/:id", delete(admin::remove_contact))
        .route("/api/admin/availability", get(admin::get_availability))
        .route(
            "/api/admin/availability/:date/toggle",
            post(admin::toggle_date),
        )
        .route(
            "/api/admin/availability/:date/slots/:time/toggle",
            post(admin::toggle_slot),
        )
        .route(
            "/api/admin/webhook",
            get(admin::get_webhook).post(admin::set_webhook),
        )
        .route("/api/admin/refresh", post(admin::refresh))
        .route("/api/admin/events", get(events::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
