use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::RecipientKind;
use crate::models::NotificationAlert;

use super::{fmt_datetime, parse_datetime, parse_uuid};

pub fn insert_notification_alert(
    conn: &Connection,
    alert: &NotificationAlert,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notification_alerts (id, drug_test_id, recipient_kind, recipient, error,
         created_at, resolved)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            alert.id.to_string(),
            alert.drug_test_id.to_string(),
            alert.recipient_kind.as_str(),
            alert.recipient,
            alert.error,
            fmt_datetime(alert.created_at),
            alert.resolved as i32,
        ],
    )?;
    Ok(())
}

pub fn list_unresolved_notification_alerts(
    conn: &Connection,
) -> Result<Vec<NotificationAlert>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, drug_test_id, recipient_kind, recipient, error, created_at, resolved
         FROM notification_alerts WHERE resolved = 0 ORDER BY created_at",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, i32>(6)?,
        ))
    })?;

    let mut alerts = Vec::new();
    for row in rows {
        let (id, test_id, kind, recipient, error, created_at, resolved) = row?;
        alerts.push(NotificationAlert {
            id: parse_uuid(&id)?,
            drug_test_id: parse_uuid(&test_id)?,
            recipient_kind: RecipientKind::from_str(&kind)?,
            recipient,
            error,
            created_at: parse_datetime(&created_at)?,
            resolved: resolved != 0,
        });
    }
    Ok(alerts)
}

pub fn resolve_notification_alert(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notification_alerts SET resolved = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "NotificationAlert".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
