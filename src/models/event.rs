use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Booking;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BookingCreated,
    BookingAccepted,
    BookingDeclined,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BookingCreated => "booking_created",
            EventKind::BookingAccepted => "booking_accepted",
            EventKind::BookingDeclined => "booking_declined",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_timestamp: Option<DateTime<Utc>>,
}

/// Outbound record of a booking state transition; the wire body of the workflow webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleEvent {
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    pub data: EventData,
}

impl LifecycleEvent {
    pub fn created(booking: &Booking) -> Self {
        Self {
            event: EventKind::BookingCreated,
            timestamp: Utc::now(),
            data: EventData {
                booking: booking.clone(),
                action_timestamp: None,
            },
        }
    }

    pub fn decided(kind: EventKind, booking: &Booking) -> Self {
        let now = Utc::now();
        Self {
            event: kind,
            timestamp: now,
            data: EventData {
                booking: booking.clone(),
                action_timestamp: Some(now),
            },
        }
    }
}
