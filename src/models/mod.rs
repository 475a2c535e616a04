pub mod availability;
pub mod booking;
pub mod contact;
pub mod event;

pub use availability::{AvailabilityOverrides, DayOverride};
pub use booking::{Booking, BookingRequest, BookingStatus, Decision};
pub use contact::{Contact, NewContact};
pub use event::{EventData, EventKind, LifecycleEvent};
