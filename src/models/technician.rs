use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TimeSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
}

/// One recurring slot in a technician's weekly roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyShift {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub weekday: Weekday,
    pub slot: TimeSlot,
    pub active: bool,
}

/// Single-slot replacement of the weekly roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub technician_id: Uuid,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}
