//! Technician duty lookup.
//!
//! Maps a date + time of day to a coarse time slot, then asks the schedule
//! source for a single-slot override before falling back to the weekly roster.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::enums::TimeSlot;
use crate::models::Technician;

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("Unrecognized time of day: {0}")]
    InvalidTime(String),

    #[error("Schedule lookup failed: {0}")]
    Source(#[from] DatabaseError),
}

/// Read access to roster data.
pub trait ScheduleSource {
    /// Override for exactly this date and slot, most recent first.
    fn override_for(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Technician>, DatabaseError>;

    /// Active technicians whose active weekly shift covers this weekday and slot.
    fn scheduled_for(
        &self,
        weekday: Weekday,
        slot: TimeSlot,
    ) -> Result<Vec<Technician>, DatabaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DutySource {
    Override,
    WeeklySchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyMatch {
    pub technician: Technician,
    pub slot: TimeSlot,
    pub source: DutySource,
}

struct SlotException {
    weekday: Weekday,
    hour: u32,
    minute: u32,
    slot: TimeSlot,
}

/// Named exceptions checked before the hourly slot bands.
const SLOT_EXCEPTIONS: &[SlotException] = &[SlotException {
    weekday: Weekday::Sat,
    hour: 11,
    minute: 10,
    slot: TimeSlot::LateMorning,
}];

const TIME_FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"];

/// Parse "11:10 AM", "11:10am" or "14:30".
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, DutyError> {
    let normalized = raw.trim().to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
        .ok_or_else(|| DutyError::InvalidTime(raw.to_string()))
}

/// Slot bands: morning 8–10, late-morning 10–12, afternoon 12–17.
pub fn time_slot_for(date: NaiveDate, time: NaiveTime) -> Option<TimeSlot> {
    let weekday = date.weekday();
    if let Some(exception) = SLOT_EXCEPTIONS
        .iter()
        .find(|e| e.weekday == weekday && e.hour == time.hour() && e.minute == time.minute())
    {
        return Some(exception.slot);
    }

    match time.hour() {
        8 | 9 => Some(TimeSlot::Morning),
        10 | 11 => Some(TimeSlot::LateMorning),
        12..=16 => Some(TimeSlot::Afternoon),
        _ => None,
    }
}

/// Find the technician on duty for a date and a time string.
pub fn find_on_duty<S: ScheduleSource + ?Sized>(
    source: &S,
    date: NaiveDate,
    time: &str,
) -> Result<Option<DutyMatch>, DutyError> {
    let time = parse_clock_time(time)?;
    find_on_duty_at(source, date, time)
}

/// Overrides win over the weekly roster; `None` means the slot is uncovered.
pub fn find_on_duty_at<S: ScheduleSource + ?Sized>(
    source: &S,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Option<DutyMatch>, DutyError> {
    let Some(slot) = time_slot_for(date, time) else {
        tracing::debug!(%date, %time, "Time falls outside every duty slot");
        return Ok(None);
    };

    if let Some(technician) = source.override_for(date, slot)? {
        tracing::debug!(%date, slot = slot.as_str(), technician = %technician.id, "Duty from override");
        return Ok(Some(DutyMatch {
            technician,
            slot,
            source: DutySource::Override,
        }));
    }

    let scheduled = source.scheduled_for(date.weekday(), slot)?.into_iter().next();
    match scheduled {
        Some(technician) => Ok(Some(DutyMatch {
            technician,
            slot,
            source: DutySource::WeeklySchedule,
        })),
        None => {
            tracing::warn!(%date, slot = slot.as_str(), "No technician on duty");
            Ok(None)
        }
    }
}
