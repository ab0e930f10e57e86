//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `rusqlite::Connection`; callers own
//! connection lifetime and transactions.

mod alert;
mod client;
mod confirmation;
mod medication;
mod schedule;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use uuid::Uuid;

use super::DatabaseError;

pub use alert::*;
pub use client::*;
pub use confirmation::*;
pub use drug_test::*;
pub use medication::*;
pub use schedule::*;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date '{s}': {e}")))
}

pub(crate) fn parse_time(s: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad time '{s}': {e}")))
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp '{s}': {e}")))
}

pub(crate) fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub(crate) fn fmt_time(t: NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

pub(crate) fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Current local time at the precision stored in the database.
pub fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, Weekday};
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::models::enums::{MedicationStatus, TimeSlot};
    use crate::models::{Client, Medication, ReferralContact, Technician, WeeklyShift};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn client(conn: &Connection, with_referral: bool) -> Client {
        let client = Client {
            id: Uuid::new_v4(),
            name: "Jordan Reyes".into(),
            email: Some("jordan@example.com".into()),
            referral: with_referral.then(|| ReferralContact {
                name: "County Drug Court".into(),
                email: "court@example.org".into(),
            }),
        };
        insert_client(conn, &client).unwrap();
        client
    }

    pub fn medication(
        conn: &Connection,
        client_id: Uuid,
        name: &str,
        detected_as: &[&str],
        require_confirmation: bool,
    ) -> Medication {
        let med = Medication {
            id: Uuid::new_v4(),
            client_id,
            name: name.into(),
            start_date: date("2025-01-01"),
            end_date: None,
            status: MedicationStatus::Active,
            detected_as: detected_as.iter().map(|s| s.to_string()).collect(),
            require_confirmation,
        };
        insert_medication(conn, &med).unwrap();
        med
    }

    pub fn technician(conn: &Connection, name: &str, shifts: &[(Weekday, TimeSlot)]) -> Technician {
        let tech = Technician {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            active: true,
        };
        insert_technician(conn, &tech).unwrap();
        for (weekday, slot) in shifts {
            insert_weekly_shift(
                conn,
                &WeeklyShift {
                    id: Uuid::new_v4(),
                    technician_id: tech.id,
                    weekday: *weekday,
                    slot: *slot,
                    active: true,
                },
            )
            .unwrap();
        }
        tech
    }
}
