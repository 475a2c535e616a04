use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::availability::{normalize_date, normalize_time};
use crate::models::{Booking, BookingStatus, Contact};

/// A remote system of record for bookings and known contacts.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn fetch_bookings(&self) -> anyhow::Result<Vec<Booking>>;
    async fn fetch_contacts(&self) -> anyhow::Result<Option<Vec<Contact>>>;
}

/// Workflow-backed source exposing `get-bookings` and `get-contacts` endpoints.
pub struct HttpBookingSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBookingSource {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build remote source client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json(&self, endpoint: &str) -> anyhow::Result<Value> {
        let url = format!("{}/{endpoint}", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to call {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("{endpoint} returned error"))?
            .json()
            .await
            .with_context(|| format!("failed to parse {endpoint} response"))
    }
}

#[async_trait]
impl BookingSource for HttpBookingSource {
    async fn fetch_bookings(&self) -> anyhow::Result<Vec<Booking>> {
        let data = self.get_json("get-bookings").await?;
        parse_bookings_response(&data)
    }

    async fn fetch_contacts(&self) -> anyhow::Result<Option<Vec<Contact>>> {
        let data = self.get_json("get-contacts").await?;
        Ok(parse_contacts_response(&data))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BookingRow {
    #[serde(rename = "ID", default)]
    id: Value,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    email: Value,
    #[serde(default)]
    phone: Value,
    #[serde(default)]
    person_type: Value,
    #[serde(default)]
    reason: Value,
    #[serde(default)]
    contact_method: Value,
    #[serde(default)]
    date: Value,
    #[serde(default)]
    time: Value,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    created_at: Value,
}

/// Maps `{"booking": [{"json": {...}}]}`. Rows that cannot form a valid booking are skipped.
pub fn parse_bookings_response(data: &Value) -> anyhow::Result<Vec<Booking>> {
    let rows = data
        .get("booking")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("bookings response has no booking array"))?;

    let mut bookings = Vec::with_capacity(rows.len());
    for item in rows {
        let fields = item.get("json").unwrap_or(item);
        let row: BookingRow = match serde_json::from_value(fields.clone()) {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed booking row");
                continue;
            }
        };
        match row_to_booking(row) {
            Ok(booking) => bookings.push(booking),
            Err(e) => tracing::warn!(error = %e, "skipping invalid booking row"),
        }
    }
    Ok(bookings)
}

fn row_to_booking(row: BookingRow) -> anyhow::Result<Booking> {
    let id = text(&row.id);
    if id.is_empty() {
        anyhow::bail!("booking row has no ID");
    }
    let date = normalize_date(&text(&row.date))?;
    let time = normalize_time(&text(&row.time))?;
    let status_text = text(&row.status);
    let status = BookingStatus::parse(&status_text)
        .ok_or_else(|| anyhow::anyhow!("unknown status {status_text:?} for booking {id}"))?;

    Ok(Booking {
        name: text(&row.name),
        email: text(&row.email),
        phone: text(&row.phone),
        person_type: text(&row.person_type),
        reason: text(&row.reason),
        contact_method: text(&row.contact_method),
        date,
        time,
        status,
        created_at: timestamp(&text(&row.created_at))
            .or_else(|| id.parse().ok().and_then(DateTime::<Utc>::from_timestamp_millis))
            .unwrap_or_else(Utc::now),
        id,
    })
}

/// Maps `{"contacts": [[id, email, phone, tag, addedAt], ...]}`; `None` when the key is absent.
pub fn parse_contacts_response(data: &Value) -> Option<Vec<Contact>> {
    let rows = data.get("contacts")?.as_array()?;

    Some(
        rows.iter()
            .filter_map(Value::as_array)
            .filter_map(|row| {
                let cell = |i: usize| row.get(i).map(text).unwrap_or_default();
                let id = cell(0);
                if id.is_empty() {
                    return None;
                }
                Some(Contact {
                    id,
                    email: cell(1),
                    phone: cell(2),
                    tag: cell(3),
                    added_at: timestamp(&cell(4)).unwrap_or_else(Utc::now),
                })
            })
            .collect(),
    )
}

/// Spreadsheet cells arrive as strings or numbers; both become trimmed text.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_bookings_normalizes_rows() {
        let data = json!({
            "booking": [
                {"json": {
                    "ID": 1730624400000_i64,
                    "Name": "Ada",
                    "Email": "ada@example.com",
                    "Phone": 2348000000001_i64,
                    "PersonType": "Founder",
                    "Reason": "Website",
                    "ContactMethod": "Email",
                    "Date": "2025-11-03",
                    "Time": "9:30",
                    "Status": "accepted",
                    "CreatedAt": "2025-11-01T08:00:00.000Z"
                }}
            ]
        });

        let bookings = parse_bookings_response(&data).unwrap();
        assert_eq!(bookings.len(), 1);
        let b = &bookings[0];
        assert_eq!(b.id, "1730624400000");
        assert_eq!(b.phone, "2348000000001");
        assert_eq!(b.time, "09:30");
        assert_eq!(b.date.to_string(), "2025-11-03");
        assert_eq!(b.status, BookingStatus::Accepted);
        assert_eq!(b.created_at.to_rfc3339(), "2025-11-01T08:00:00+00:00");
    }

    #[test]
    fn test_parse_bookings_skips_invalid_rows() {
        let data = json!({
            "booking": [
                {"json": {"ID": "1", "Date": "2025-11-03", "Time": "10:00", "Status": "pending"}},
                {"json": {"ID": "", "Date": "2025-11-03", "Time": "10:00", "Status": "pending"}},
                {"json": {"ID": "3", "Date": "someday", "Time": "10:00", "Status": "pending"}},
                {"json": {"ID": "4", "Date": "2025-11-03", "Time": "10:00", "Status": "maybe"}}
            ]
        });
        let bookings = parse_bookings_response(&data).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, "1");
    }

    #[test]
    fn test_missing_created_at_is_stable() {
        let data = json!({
            "booking": [
                {"json": {"ID": 1730624400000_i64, "Date": "2025-11-03", "Time": "10:00", "Status": "pending"}}
            ]
        });
        let first = parse_bookings_response(&data).unwrap();
        let second = parse_bookings_response(&data).unwrap();
        assert_eq!(first[0].created_at, second[0].created_at);
        assert_eq!(first[0].created_at.timestamp_millis(), 1730624400000);
    }

    #[test]
    fn test_parse_bookings_requires_array() {
        assert!(parse_bookings_response(&json!({"rows": []})).is_err());
    }

    #[test]
    fn test_parse_contacts_rows() {
        let data = json!({
            "contacts": [
                ["c1", "a@b.com", "", "friend", "2025-10-01T00:00:00Z"],
                ["c2", "", 2348000000001_i64, "client"],
                ["", "ghost@b.com"]
            ]
        });
        let contacts = parse_contacts_response(&data).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].email, "a@b.com");
        assert_eq!(contacts[1].phone, "2348000000001");
        assert_eq!(contacts[1].tag, "client");
        assert!(parse_contacts_response(&json!({})).is_none());
    }

    #[tokio::test]
    async fn test_http_source_fetches_both_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-bookings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "booking": [{"json": {"ID": "7", "Date": "2025-11-03", "Time": "11:00", "Status": "pending"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/get-contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contacts": [["c1", "a@b.com", "", "", ""]]
            })))
            .mount(&server)
            .await;

        let source = HttpBookingSource::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let bookings = source.fetch_bookings().await.unwrap();
        assert_eq!(bookings[0].id, "7");
        let contacts = source.fetch_contacts().await.unwrap().unwrap();
        assert_eq!(contacts[0].email, "a@b.com");
    }

    #[tokio::test]
    async fn test_http_source_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpBookingSource::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(source.fetch_bookings().await.is_err());
    }
}
