use chrono::NaiveDate;

use crate::models::{AvailabilityOverrides, Booking};

/// Why a slot cannot be booked, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    DateBlocked,
    SlotBlocked,
    Booked,
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::DateBlocked => write!(f, "that date is not open for bookings"),
            Unavailable::SlotBlocked => write!(f, "that time is not open for bookings"),
            Unavailable::Booked => write!(f, "that time slot is already booked"),
        }
    }
}

/// Evaluated fresh on every call; overrides and bookings change between reads.
pub fn check_slot(
    date: &NaiveDate,
    time: &str,
    overrides: &AvailabilityOverrides,
    bookings: &[Booking],
) -> Result<(), Unavailable> {
    if overrides.is_date_blocked(date) {
        return Err(Unavailable::DateBlocked);
    }
    if overrides.is_slot_blocked(date, time) {
        return Err(Unavailable::SlotBlocked);
    }
    if bookings.iter().any(|b| b.occupies(date, time)) {
        return Err(Unavailable::Booked);
    }
    Ok(())
}

pub fn is_available(
    date: &NaiveDate,
    time: &str,
    overrides: &AvailabilityOverrides,
    bookings: &[Booking],
) -> bool {
    check_slot(date, time, overrides, bookings).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use crate::services::calendar::generate_time_slots;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booking(id: &str, date: &str, time: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555".to_string(),
            person_type: String::new(),
            reason: String::new(),
            contact_method: "WhatsApp".to_string(),
            date: d(date),
            time: time.to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    fn overrides(json: &str) -> AvailabilityOverrides {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_open_when_nothing_configured() {
        let empty = AvailabilityOverrides::default();
        assert!(is_available(&d("2025-11-03"), "09:00", &empty, &[]));
    }

    #[test]
    fn test_every_slot_open_without_override() {
        let empty = AvailabilityOverrides::default();
        let bookings = vec![booking("1", "2025-11-04", "09:00", BookingStatus::Accepted)];
        for time in generate_time_slots() {
            assert!(is_available(&d("2025-11-03"), &time, &empty, &bookings));
        }
    }

    #[test]
    fn test_accepted_booking_takes_only_its_slot() {
        let empty = AvailabilityOverrides::default();
        let bookings = vec![booking("1", "2025-11-03", "09:00", BookingStatus::Accepted)];
        assert!(!is_available(&d("2025-11-03"), "09:00", &empty, &bookings));
        assert!(is_available(&d("2025-11-03"), "09:30", &empty, &bookings));
        for time in generate_time_slots().iter().filter(|t| *t != "09:00") {
            assert!(is_available(&d("2025-11-03"), time, &empty, &bookings));
        }
    }

    #[test]
    fn test_pending_and_declined_do_not_take_slot() {
        let empty = AvailabilityOverrides::default();
        let bookings = vec![
            booking("1", "2025-11-03", "09:00", BookingStatus::Pending),
            booking("2", "2025-11-03", "09:00", BookingStatus::Declined),
        ];
        assert!(is_available(&d("2025-11-03"), "09:00", &empty, &bookings));
    }

    #[test]
    fn test_blocked_date_closes_every_slot() {
        let blocked = overrides(r#"{"2025-11-03":{"blocked":true}}"#);
        for time in generate_time_slots() {
            assert_eq!(
                check_slot(&d("2025-11-03"), &time, &blocked, &[]),
                Err(Unavailable::DateBlocked)
            );
        }
        assert!(is_available(&d("2025-11-04"), "09:00", &blocked, &[]));
    }

    #[test]
    fn test_blocked_slot_only() {
        let o = overrides(r#"{"2025-11-03":{"blocked":false,"blockedSlots":["10:00"]}}"#);
        assert_eq!(
            check_slot(&d("2025-11-03"), "10:00", &o, &[]),
            Err(Unavailable::SlotBlocked)
        );
        assert!(is_available(&d("2025-11-03"), "10:30", &o, &[]));
    }

    #[test]
    fn test_date_block_checked_before_bookings() {
        let blocked = overrides(r#"{"2025-11-03":{"blocked":true}}"#);
        let bookings = vec![booking("1", "2025-11-03", "09:00", BookingStatus::Accepted)];
        assert_eq!(
            check_slot(&d("2025-11-03"), "09:00", &blocked, &bookings),
            Err(Unavailable::DateBlocked)
        );
    }
}
