use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ConfirmationVerdict;
use crate::models::ConfirmationResult;

use super::{fmt_datetime, parse_datetime, parse_uuid};

/// Record a lab verdict. A second verdict for the same substance replaces the first.
pub fn upsert_confirmation_result(
    conn: &Connection,
    result: &ConfirmationResult,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO confirmation_results (id, drug_test_id, substance, verdict, notes, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(drug_test_id, substance) DO UPDATE SET
            verdict = excluded.verdict,
            notes = excluded.notes,
            recorded_at = excluded.recorded_at",
        params![
            result.id.to_string(),
            result.drug_test_id.to_string(),
            result.substance,
            result.verdict.as_str(),
            result.notes,
            fmt_datetime(result.recorded_at),
        ],
    )?;
    Ok(())
}

pub fn get_confirmation_results(
    conn: &Connection,
    drug_test_id: &Uuid,
) -> Result<Vec<ConfirmationResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, drug_test_id, substance, verdict, notes, recorded_at
         FROM confirmation_results WHERE drug_test_id = ?1 ORDER BY substance",
    )?;

    let rows = stmt.query_map(params![drug_test_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, test_id, substance, verdict, notes, recorded_at) = row?;
        results.push(ConfirmationResult {
            id: parse_uuid(&id)?,
            drug_test_id: parse_uuid(&test_id)?,
            substance,
            verdict: ConfirmationVerdict::from_str(&verdict)?,
            notes,
            recorded_at: parse_datetime(&recorded_at)?,
        });
    }
    Ok(results)
}
