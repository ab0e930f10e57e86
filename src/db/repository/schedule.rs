use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::duty::ScheduleSource;
use crate::models::enums::TimeSlot;
use crate::models::{ScheduleOverride, Technician, WeeklyShift};

use super::{fmt_date, fmt_datetime, parse_date, parse_datetime, parse_uuid};

pub fn insert_technician(conn: &Connection, tech: &Technician) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO technicians (id, name, email, active) VALUES (?1, ?2, ?3, ?4)",
        params![tech.id.to_string(), tech.name, tech.email, tech.active as i32],
    )?;
    Ok(())
}

pub fn get_technician(conn: &Connection, id: &Uuid) -> Result<Option<Technician>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, active FROM technicians WHERE id = ?1",
            params![id.to_string()],
            technician_row,
        )
        .optional()?;
    row.map(technician_from_row).transpose()
}

pub fn insert_weekly_shift(conn: &Connection, shift: &WeeklyShift) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO technician_shifts (id, technician_id, weekday, slot, active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            shift.id.to_string(),
            shift.technician_id.to_string(),
            shift.weekday.num_days_from_monday(),
            shift.slot.as_str(),
            shift.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_weekly_shifts(
    conn: &Connection,
    technician_id: &Uuid,
) -> Result<Vec<WeeklyShift>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, technician_id, weekday, slot, active FROM technician_shifts
         WHERE technician_id = ?1 ORDER BY weekday, slot",
    )?;
    let rows = stmt.query_map(params![technician_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i32>(4)?,
        ))
    })?;

    let mut shifts = Vec::new();
    for row in rows {
        let (id, tech_id, weekday, slot, active) = row?;
        shifts.push(WeeklyShift {
            id: parse_uuid(&id)?,
            technician_id: parse_uuid(&tech_id)?,
            weekday: weekday_from_index(weekday)?,
            slot: TimeSlot::from_str(&slot)?,
            active: active != 0,
        });
    }
    Ok(shifts)
}

pub fn insert_schedule_override(
    conn: &Connection,
    entry: &ScheduleOverride,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO schedule_overrides (id, date, slot, technician_id, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id.to_string(),
            fmt_date(entry.date),
            entry.slot.as_str(),
            entry.technician_id.to_string(),
            entry.note,
            fmt_datetime(entry.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_schedule_overrides(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<ScheduleOverride>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, slot, technician_id, note, created_at FROM schedule_overrides
         WHERE date = ?1 ORDER BY slot, created_at",
    )?;
    let rows = stmt.query_map(params![fmt_date(date)], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut overrides = Vec::new();
    for row in rows {
        let (id, date, slot, tech_id, note, created_at) = row?;
        overrides.push(ScheduleOverride {
            id: parse_uuid(&id)?,
            date: parse_date(&date)?,
            slot: TimeSlot::from_str(&slot)?,
            technician_id: parse_uuid(&tech_id)?,
            note,
            created_at: parse_datetime(&created_at)?,
        });
    }
    Ok(overrides)
}

/// `ScheduleSource` backed by the roster tables.
pub struct SqliteSchedule<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSchedule<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleSource for SqliteSchedule<'_> {
    fn override_for(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Technician>, DatabaseError> {
        // Several overrides for one slot are not merged: the latest write wins.
        let row = self
            .conn
            .query_row(
                "SELECT t.id, t.name, t.email, t.active
                 FROM schedule_overrides o JOIN technicians t ON t.id = o.technician_id
                 WHERE o.date = ?1 AND o.slot = ?2
                 ORDER BY o.created_at DESC, o.rowid DESC LIMIT 1",
                params![fmt_date(date), slot.as_str()],
                technician_row,
            )
            .optional()?;
        row.map(technician_from_row).transpose()
    }

    fn scheduled_for(
        &self,
        weekday: Weekday,
        slot: TimeSlot,
    ) -> Result<Vec<Technician>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT t.id, t.name, t.email, t.active
             FROM technician_shifts s JOIN technicians t ON t.id = s.technician_id
             WHERE s.weekday = ?1 AND s.slot = ?2 AND s.active = 1 AND t.active = 1
             ORDER BY t.name, t.id",
        )?;
        let rows = stmt.query_map(
            params![weekday.num_days_from_monday(), slot.as_str()],
            technician_row,
        )?;

        let mut techs = Vec::new();
        for row in rows {
            techs.push(technician_from_row(row?)?);
        }
        Ok(techs)
    }
}

type TechnicianRow = (String, String, Option<String>, i32);

fn technician_row(row: &rusqlite::Row<'_>) -> Result<TechnicianRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn technician_from_row((id, name, email, active): TechnicianRow) -> Result<Technician, DatabaseError> {
    Ok(Technician {
        id: parse_uuid(&id)?,
        name,
        email,
        active: active != 0,
    })
}

fn weekday_from_index(index: u32) -> Result<Weekday, DatabaseError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(DatabaseError::InvalidEnum {
            field: "Weekday".into(),
            value: other.to_string(),
        }),
    }
}
