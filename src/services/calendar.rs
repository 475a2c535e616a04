use chrono::{Days, NaiveDate};

pub const DEFAULT_WINDOW_DAYS: u32 = 14;
pub const MAX_WINDOW_DAYS: u32 = 366;

const FIRST_HOUR: u32 = 9;
const LAST_HOUR: u32 = 17;

/// Consecutive bookable dates starting at `today` (inclusive), capped at `MAX_WINDOW_DAYS`.
pub fn generate_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days.min(MAX_WINDOW_DAYS))
        .map_while(|offset| today.checked_add_days(Days::new(offset.into())))
        .collect()
}

/// The fixed daily grid: 09:00 through 17:30 in 30-minute steps.
pub fn generate_time_slots() -> Vec<String> {
    (FIRST_HOUR..=LAST_HOUR)
        .flat_map(|hour| [format!("{hour:02}:00"), format!("{hour:02}:30")])
        .collect()
}

pub fn is_time_slot(time: &str) -> bool {
    generate_time_slots().iter().any(|slot| slot == time)
}
