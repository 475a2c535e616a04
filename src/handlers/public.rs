use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::availability::normalize_date;
use crate::models::{Booking, BookingRequest};
use crate::services::calendar::{generate_dates, generate_time_slots};
use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// GET /api/slots
#[derive(Serialize)]
pub struct DateEntry {
    date: NaiveDate,
    blocked: bool,
}

pub async fn list_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DateEntry>>, AppError> {
    let today = Utc::now().date_naive();
    let window = generate_dates(today, state.config.booking_window_days);
    let store = state.store()?;

    let dates = window
        .into_iter()
        .map(|date| DateEntry {
            blocked: store.overrides().is_date_blocked(&date),
            date,
        })
        .collect();

    Ok(Json(dates))
}

// GET /api/slots/:date
#[derive(Serialize)]
pub struct SlotEntry {
    time: String,
    available: bool,
}

#[derive(Serialize)]
pub struct DaySlotsResponse {
    date: NaiveDate,
    blocked: bool,
    slots: Vec<SlotEntry>,
}

pub async fn day_slots(
    State(state): State<Arc<AppState>>,
    Path(raw_date): Path<String>,
) -> Result<Json<DaySlotsResponse>, AppError> {
    let date = normalize_date(&raw_date).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let store = state.store()?;

    let slots = generate_time_slots()
        .into_iter()
        .map(|time| SlotEntry {
            available: store.is_available(&date, &time),
            time,
        })
        .collect();

    Ok(Json(DaySlotsResponse {
        date,
        blocked: store.overrides().is_date_blocked(&date),
        slots,
    }))
}

// POST /api/contacts/check
#[derive(Deserialize)]
pub struct ContactCheckRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

pub async fn check_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactCheckRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let known = state.store()?.is_known_contact(&body.email, &body.phone);
    Ok(Json(serde_json::json!({ "known": known })))
}

// POST /api/bookings
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.store()?.submit(body)?;
    Ok((StatusCode::CREATED, Json(booking)))
}
