use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub person_type: String,
    pub reason: String,
    pub contact_method: String,
    pub date: NaiveDate,
    pub time: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn occupies(&self, date: &NaiveDate, time: &str) -> bool {
        self.status == BookingStatus::Accepted && self.date == *date && self.time == time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "declined" => Some(BookingStatus::Declined),
            _ => None,
        }
    }
}

/// Administrative outcome for a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Declined,
}

impl Decision {
    pub fn status(&self) -> BookingStatus {
        match self {
            Decision::Accepted => BookingStatus::Accepted,
            Decision::Declined => BookingStatus::Declined,
        }
    }
}

/// A public booking submission before it has been assigned an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub person_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_contact_method")]
    pub contact_method: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

fn default_contact_method() -> String {
    "WhatsApp".to_string()
}
