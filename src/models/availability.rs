use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Admin exception for a single date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayOverride {
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub blocked_slots: BTreeSet<String>,
}

/// Per-date overrides keyed by `YYYY-MM-DD`. A missing date is fully open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AvailabilityOverrides {
    days: BTreeMap<String, DayOverride>,
}

impl AvailabilityOverrides {
    pub fn get(&self, date: &NaiveDate) -> Option<&DayOverride> {
        self.days.get(&date_key(date))
    }

    pub fn is_date_blocked(&self, date: &NaiveDate) -> bool {
        self.get(date).map(|d| d.blocked).unwrap_or(false)
    }

    pub fn is_slot_blocked(&self, date: &NaiveDate, time: &str) -> bool {
        self.get(date)
            .map(|d| d.blocked_slots.contains(time))
            .unwrap_or(false)
    }

    /// Flips the date-level block, keeping any slot-level blocks.
    pub fn toggle_date(&mut self, date: &NaiveDate) -> DayOverride {
        let day = self.days.entry(date_key(date)).or_default();
        day.blocked = !day.blocked;
        day.clone()
    }

    pub fn toggle_slot(&mut self, date: &NaiveDate, time: &str) -> DayOverride {
        let day = self.days.entry(date_key(date)).or_default();
        if !day.blocked_slots.remove(time) {
            day.blocked_slots.insert(time.to_string());
        }
        day.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DayOverride)> {
        self.days.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub fn date_key(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts `YYYY-MM-DD`, optionally followed by an ISO time part.
pub fn normalize_date(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    let day_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date: {s}"))
}

/// Normalizes `H:MM` and `HH:MM` into two-digit-hour `HH:MM`.
pub fn normalize_time(s: &str) -> anyhow::Result<String> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 || parts[1].len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(format!("{hour:02}:{minute:02}"))
}
