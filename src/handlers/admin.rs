use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    AvailabilityOverrides, Booking, BookingStatus, Contact, DayOverride, Decision, NewContact,
};
use crate::services::poller::refresh_once;
use crate::state::AppState;

pub(crate) fn check_auth(headers: &HeaderMap, state: &AppState) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if !state.auth.authorize(token) {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.auth.authorize(&body.password) {
        tracing::warn!("rejected admin login");
        return Err(AppError::Unauthorized);
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state)?;

    let store = state.store()?;
    let bookings = match query.status.as_deref() {
        None | Some("all") => store.bookings().to_vec(),
        Some(raw) => match BookingStatus::parse(raw) {
            Some(BookingStatus::Pending) => store.list_pending(),
            Some(BookingStatus::Accepted) => store.list_accepted(),
            Some(BookingStatus::Declined) => store
                .bookings()
                .iter()
                .filter(|b| b.status == BookingStatus::Declined)
                .cloned()
                .collect(),
            None => return Err(AppError::BadRequest(format!("unknown status: {raw}"))),
        },
    };

    Ok(Json(bookings))
}

// POST /api/admin/bookings/:id/accept
pub async fn accept_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state)?;
    let booking = state.store()?.decide(&id, Decision::Accepted)?;
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/decline
pub async fn decline_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state)?;
    let booking = state.store()?.decide(&id, Decision::Declined)?;
    Ok(Json(booking))
}

// GET /api/admin/contacts
pub async fn get_contacts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Contact>>, AppError> {
    check_auth(&headers, &state)?;
    let contacts = state.store()?.contacts().to_vec();
    Ok(Json(contacts))
}

// POST /api/admin/contacts
pub async fn add_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewContact>,
) -> Result<Json<Contact>, AppError> {
    check_auth(&headers, &state)?;
    let contact = state.store()?.add_contact(body)?;
    Ok(Json(contact))
}

// DELETE /api/admin/contacts/:id
pub async fn remove_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state)?;
    state.store()?.remove_contact(&id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AvailabilityOverrides>, AppError> {
    check_auth(&headers, &state)?;
    let overrides = state.store()?.overrides().clone();
    Ok(Json(overrides))
}

// POST /api/admin/availability/:date/toggle
pub async fn toggle_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(date): Path<String>,
) -> Result<Json<DayOverride>, AppError> {
    check_auth(&headers, &state)?;
    let day = state.store()?.toggle_date(&date)?;
    Ok(Json(day))
}

// POST /api/admin/availability/:date/slots/:time/toggle
pub async fn toggle_slot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((date, time)): Path<(String, String)>,
) -> Result<Json<DayOverride>, AppError> {
    check_auth(&headers, &state)?;
    let day = state.store()?.toggle_slot(&date, &time)?;
    Ok(Json(day))
}

// GET /api/admin/webhook
#[derive(Serialize, Deserialize)]
pub struct WebhookSettings {
    pub url: String,
}

pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WebhookSettings>, AppError> {
    check_auth(&headers, &state)?;
    let url = state
        .store()?
        .webhook_url()
        .unwrap_or_else(|| state.config.webhook_url.clone());
    Ok(Json(WebhookSettings { url }))
}

// POST /api/admin/webhook
pub async fn set_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<WebhookSettings>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state)?;
    state.store()?.set_webhook_url(&body.url)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/admin/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state)?;
    let source = state
        .remote
        .clone()
        .ok_or_else(|| AppError::BadRequest("no remote booking source configured".to_string()))?;

    let summary = refresh_once(&state.store, source.as_ref())
        .await
        .map_err(|e| AppError::Remote(e.to_string()))?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "added": summary.added,
        "updated": summary.updated,
        "skipped": summary.skipped,
    })))
}
