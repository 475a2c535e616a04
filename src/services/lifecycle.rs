use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::storage::{
    Storage, AVAILABILITY_KEY, BOOKINGS_KEY, CONTACTS_KEY, WEBHOOK_URL_KEY,
};
use crate::models::availability::{normalize_date, normalize_time};
use crate::models::{
    AvailabilityOverrides, Booking, BookingRequest, BookingStatus, Contact, DayOverride,
    Decision, EventKind, LifecycleEvent, NewContact,
};
use crate::services::calendar::is_time_slot;
use crate::services::contacts::is_known_contact;
use crate::services::notify::EventSink;
use crate::services::scheduling::{check_slot, Unavailable};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },

    #[error("known contacts do not need to book; you will be contacted directly")]
    KnownContact,

    #[error("{date} {time} is unavailable: {reason}")]
    SlotUnavailable {
        date: NaiveDate,
        time: String,
        reason: Unavailable,
    },

    #[error("{date} {time} already has an accepted booking")]
    SlotTaken { date: NaiveDate, time: String },

    #[error("booking {id} is already {from}, cannot mark it {to}")]
    IllegalTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Authoritative booking, contact and override state. Single writer: callers hold it behind a lock.
pub struct BookingStore {
    storage: Arc<dyn Storage>,
    sink: Box<dyn EventSink>,
    bookings: Vec<Booking>,
    contacts: Vec<Contact>,
    overrides: AvailabilityOverrides,
    last_id: i64,
}

impl BookingStore {
    /// Loads persisted collections; an unreadable value starts that collection empty.
    pub fn load(storage: Arc<dyn Storage>, sink: Box<dyn EventSink>) -> Self {
        let bookings: Vec<Booking> = load_collection(storage.as_ref(), BOOKINGS_KEY);
        let contacts: Vec<Contact> = load_collection(storage.as_ref(), CONTACTS_KEY);
        let overrides: AvailabilityOverrides = load_collection(storage.as_ref(), AVAILABILITY_KEY);
        let last_id = max_numeric_id(&bookings);

        tracing::info!(
            bookings = bookings.len(),
            contacts = contacts.len(),
            "booking store loaded"
        );

        Self {
            storage,
            sink,
            bookings,
            contacts,
            overrides,
            last_id,
        }
    }

    // ── Public flow ──

    pub fn submit(&mut self, request: BookingRequest) -> Result<Booking, LifecycleError> {
        let date = request
            .date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(LifecycleError::MissingField("date"))?;
        let time = request
            .time
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(LifecycleError::MissingField("time"))?;
        let date = parse_date(date)?;
        let time = parse_slot(time)?;

        for (field, value) in [
            ("name", &request.name),
            ("email", &request.email),
            ("phone", &request.phone),
        ] {
            if value.trim().is_empty() {
                return Err(LifecycleError::MissingField(field));
            }
        }

        if is_known_contact(&request.email, &request.phone, &self.contacts) {
            tracing::info!(email = %request.email, "known contact used public booking form");
            return Err(LifecycleError::KnownContact);
        }

        check_slot(&date, &time, &self.overrides, &self.bookings).map_err(|reason| {
            LifecycleError::SlotUnavailable {
                date,
                time: time.clone(),
                reason,
            }
        })?;

        let now = Utc::now();
        let numeric_id = self.next_id(now.timestamp_millis());
        let id = match numeric_id {
            Some(id) => id.to_string(),
            None => {
                tracing::warn!(last_id = self.last_id, "numeric booking ids exhausted, using a uuid");
                uuid::Uuid::new_v4().to_string()
            }
        };
        let booking = Booking {
            id,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            person_type: request.person_type,
            reason: request.reason,
            contact_method: request.contact_method,
            date,
            time,
            status: BookingStatus::Pending,
            created_at: now,
        };

        let mut bookings = self.bookings.clone();
        bookings.push(booking.clone());
        save_collection(self.storage.as_ref(), BOOKINGS_KEY, &bookings)?;
        self.bookings = bookings;
        if let Some(id) = numeric_id {
            self.last_id = id;
        }

        tracing::info!(
            booking_id = %booking.id,
            date = %booking.date,
            time = %booking.time,
            "booking submitted"
        );
        self.sink.emit(LifecycleEvent::created(&booking));

        Ok(booking)
    }

    // ── Admin flow ──

    /// Pending moves once to accepted or declined. Re-applying the current decision is allowed
    /// and re-emits the event; flipping an already-decided booking is rejected.
    pub fn decide(&mut self, id: &str, decision: Decision) -> Result<Booking, LifecycleError> {
        let index = self
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LifecycleError::NotFound(format!("booking {id}")))?;

        let target = decision.status();
        let current = &self.bookings[index];

        if current.status != BookingStatus::Pending && current.status != target {
            return Err(LifecycleError::IllegalTransition {
                id: id.to_string(),
                from: current.status.as_str(),
                to: target.as_str(),
            });
        }

        if target == BookingStatus::Accepted
            && self
                .bookings
                .iter()
                .any(|b| b.id != id && b.occupies(&current.date, &current.time))
        {
            return Err(LifecycleError::SlotTaken {
                date: current.date,
                time: current.time.clone(),
            });
        }

        let mut bookings = self.bookings.clone();
        bookings[index].status = target;
        save_collection(self.storage.as_ref(), BOOKINGS_KEY, &bookings)?;
        self.bookings = bookings;

        let booking = self.bookings[index].clone();
        let kind = match decision {
            Decision::Accepted => EventKind::BookingAccepted,
            Decision::Declined => EventKind::BookingDeclined,
        };

        tracing::info!(booking_id = %booking.id, status = target.as_str(), "booking decided");
        self.sink.emit(LifecycleEvent::decided(kind, &booking));

        Ok(booking)
    }

    pub fn list_pending(&self) -> Vec<Booking> {
        let mut pending: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        pending.sort_by_key(|b| b.created_at);
        pending
    }

    pub fn list_accepted(&self) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Accepted)
            .cloned()
            .collect()
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn get(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    // ── Availability ──

    pub fn overrides(&self) -> &AvailabilityOverrides {
        &self.overrides
    }

    pub fn is_available(&self, date: &NaiveDate, time: &str) -> bool {
        check_slot(date, time, &self.overrides, &self.bookings).is_ok()
    }

    pub fn toggle_date(&mut self, date: &str) -> Result<DayOverride, LifecycleError> {
        let date = parse_date(date)?;
        let mut overrides = self.overrides.clone();
        let day = overrides.toggle_date(&date);
        save_collection(self.storage.as_ref(), AVAILABILITY_KEY, &overrides)?;
        self.overrides = overrides;

        tracing::info!(date = %date, blocked = day.blocked, "date availability toggled");
        Ok(day)
    }

    pub fn toggle_slot(&mut self, date: &str, time: &str) -> Result<DayOverride, LifecycleError> {
        let date = parse_date(date)?;
        let time = parse_slot(time)?;
        let mut overrides = self.overrides.clone();
        let day = overrides.toggle_slot(&date, &time);
        save_collection(self.storage.as_ref(), AVAILABILITY_KEY, &overrides)?;
        self.overrides = overrides;

        tracing::info!(date = %date, time = %time, "slot availability toggled");
        Ok(day)
    }

    // ── Known contacts ──

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn is_known_contact(&self, email: &str, phone: &str) -> bool {
        is_known_contact(email, phone, &self.contacts)
    }

    pub fn add_contact(&mut self, new: NewContact) -> Result<Contact, LifecycleError> {
        let email = new.email.trim().to_string();
        let phone = new.phone.trim().to_string();
        if email.is_empty() && phone.is_empty() {
            return Err(LifecycleError::MissingField("email or phone"));
        }

        let contact = Contact {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            phone,
            tag: new.tag.trim().to_string(),
            added_at: Utc::now(),
        };

        let mut contacts = self.contacts.clone();
        contacts.push(contact.clone());
        save_collection(self.storage.as_ref(), CONTACTS_KEY, &contacts)?;
        self.contacts = contacts;

        tracing::info!(contact_id = %contact.id, "known contact added");
        Ok(contact)
    }

    pub fn remove_contact(&mut self, id: &str) -> Result<Contact, LifecycleError> {
        let index = self
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| LifecycleError::NotFound(format!("contact {id}")))?;

        let mut contacts = self.contacts.clone();
        let removed = contacts.remove(index);
        save_collection(self.storage.as_ref(), CONTACTS_KEY, &contacts)?;
        self.contacts = contacts;

        tracing::info!(contact_id = %removed.id, "known contact removed");
        Ok(removed)
    }

    // ── Settings ──

    pub fn webhook_url(&self) -> Option<String> {
        match self.storage.get(WEBHOOK_URL_KEY) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "failed to read webhook url");
                None
            }
        }
    }

    pub fn set_webhook_url(&mut self, url: &str) -> Result<(), LifecycleError> {
        let url = url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LifecycleError::Invalid {
                field: "webhook url",
                value: url.to_string(),
            });
        }
        self.storage.set(WEBHOOK_URL_KEY, url)?;
        tracing::info!(configured = !url.is_empty(), "webhook url updated");
        Ok(())
    }

    // ── Remote refresh ──

    /// Merges a remote snapshot by id. Bookings the snapshot lacks are kept and a decided
    /// booking never changes status again. No lifecycle events are emitted for refreshed records.
    pub fn merge_from_remote(
        &mut self,
        remote: Vec<Booking>,
        contacts: Option<Vec<Contact>>,
    ) -> Result<MergeSummary, LifecycleError> {
        let mut summary = MergeSummary::default();
        let mut bookings = self.bookings.clone();

        for incoming in remote {
            let existing = bookings.iter().position(|b| b.id == incoming.id);
            if let Some(index) = existing {
                let local = &bookings[index];
                if local.status != BookingStatus::Pending {
                    if incoming.status != local.status {
                        tracing::debug!(
                            booking_id = %local.id,
                            local = local.status.as_str(),
                            remote = incoming.status.as_str(),
                            "keeping local decision over remote row"
                        );
                    }
                    continue;
                }
            }

            if slot_held_by_other(&bookings, &incoming) {
                tracing::warn!(
                    booking_id = %incoming.id,
                    date = %incoming.date,
                    time = %incoming.time,
                    "remote row accepts a slot that is already taken, skipping"
                );
                summary.skipped += 1;
                continue;
            }

            match existing {
                Some(index) => {
                    let merged = Booking {
                        created_at: bookings[index].created_at,
                        ..incoming
                    };
                    if bookings[index] != merged {
                        bookings[index] = merged;
                        summary.updated += 1;
                    }
                }
                None => {
                    bookings.push(incoming);
                    summary.added += 1;
                }
            }
        }

        let contacts = contacts.map(|remote| merge_contacts(&self.contacts, remote));

        if summary.added + summary.updated > 0 {
            save_collection(self.storage.as_ref(), BOOKINGS_KEY, &bookings)?;
        }
        if let Some(contacts) = contacts.as_ref().filter(|c| **c != self.contacts) {
            save_collection(self.storage.as_ref(), CONTACTS_KEY, contacts)?;
        }

        self.last_id = self.last_id.max(max_numeric_id(&bookings));
        self.bookings = bookings;
        if let Some(contacts) = contacts {
            self.contacts = contacts;
        }

        tracing::info!(
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            "merged remote bookings"
        );
        Ok(summary)
    }

    /// Millisecond timestamp ids, bumped past the last issued id so they stay unique.
    /// `None` once the numeric range is exhausted.
    fn next_id(&self, now_millis: i64) -> Option<i64> {
        self.last_id
            .checked_add(1)
            .map(|next| now_millis.max(next))
    }
}

/// Outcome of one remote merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

fn slot_held_by_other(bookings: &[Booking], incoming: &Booking) -> bool {
    incoming.status == BookingStatus::Accepted
        && bookings
            .iter()
            .any(|b| b.id != incoming.id && b.occupies(&incoming.date, &incoming.time))
}

/// Upserts remote contacts by id; local-only contacts stay and known ones keep `added_at`.
fn merge_contacts(local: &[Contact], remote: Vec<Contact>) -> Vec<Contact> {
    let mut merged = local.to_vec();
    for incoming in remote {
        match merged.iter_mut().find(|c| c.id == incoming.id) {
            Some(existing) => {
                *existing = Contact {
                    added_at: existing.added_at,
                    ..incoming
                };
            }
            None => merged.push(incoming),
        }
    }
    merged
}

fn parse_date(s: &str) -> Result<NaiveDate, LifecycleError> {
    normalize_date(s).map_err(|_| LifecycleError::Invalid {
        field: "date",
        value: s.to_string(),
    })
}

fn parse_slot(s: &str) -> Result<String, LifecycleError> {
    let invalid = || LifecycleError::Invalid {
        field: "time",
        value: s.to_string(),
    };
    let time = normalize_time(s).map_err(|_| invalid())?;
    if !is_time_slot(&time) {
        return Err(invalid());
    }
    Ok(time)
}

fn max_numeric_id(bookings: &[Booking]) -> i64 {
    bookings
        .iter()
        .filter_map(|b| b.id.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}

fn load_collection<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, key, "stored value is not valid, starting empty");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::error!(error = %e, key, "failed to read storage, starting empty");
            T::default()
        }
    }
}

fn save_collection<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw).map_err(|e| {
        tracing::error!(error = %e, key, "failed to persist collection");
        e
    })
}
