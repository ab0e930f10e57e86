use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::MedicationStatus;
use crate::models::Medication;

use super::{fmt_date, parse_date, parse_uuid};

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, client_id, name, start_date, end_date, status,
         detected_as, require_confirmation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            med.id.to_string(),
            med.client_id.to_string(),
            med.name,
            fmt_date(med.start_date),
            med.end_date.map(fmt_date),
            med.status.as_str(),
            serde_json::to_string(&med.detected_as)?,
            med.require_confirmation as i32,
        ],
    )?;
    Ok(())
}

/// All medications on file for a client, any status, oldest first.
pub fn get_client_medications(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, name, start_date, end_date, status, detected_as, require_confirmation
         FROM medications WHERE client_id = ?1 ORDER BY start_date, name",
    )?;

    let rows = stmt.query_map(params![client_id.to_string()], |row| {
        Ok(medication_row_from_rusqlite(row))
    })?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row??)?);
    }
    Ok(meds)
}

/// Discontinue a medication. History is kept; drug tests hold their own snapshot.
pub fn discontinue_medication(
    conn: &Connection,
    med_id: &Uuid,
    end_date: NaiveDate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medications SET status = ?1, end_date = ?2 WHERE id = ?3",
        params![
            MedicationStatus::Discontinued.as_str(),
            fmt_date(end_date),
            med_id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Medication".into(),
            id: med_id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    client_id: String,
    name: String,
    start_date: String,
    end_date: Option<String>,
    status: String,
    detected_as: Option<String>,
    require_confirmation: i32,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        status: row.get(5)?,
        detected_as: row.get(6)?,
        require_confirmation: row.get(7)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    // A malformed detected_as column explains no substances rather than failing the read.
    let detected_as = row
        .detected_as
        .as_deref()
        .and_then(|json| serde_json::from_str::<Vec<String>>(json).ok())
        .unwrap_or_default();

    Ok(Medication {
        id: parse_uuid(&row.id)?,
        client_id: parse_uuid(&row.client_id)?,
        name: row.name,
        start_date: parse_date(&row.start_date)?,
        end_date: row.end_date.as_deref().map(parse_date).transpose()?,
        status: MedicationStatus::from_str(&row.status)?,
        detected_as,
        require_confirmation: row.require_confirmation != 0,
    })
}
