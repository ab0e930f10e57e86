use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Client, ReferralContact};

use super::parse_uuid;

pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clients (id, name, email, referral_name, referral_email)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            client.id.to_string(),
            client.name,
            client.email,
            client.referral.as_ref().map(|r| r.name.as_str()),
            client.referral.as_ref().map(|r| r.email.as_str()),
        ],
    )?;
    Ok(())
}

pub fn get_client(conn: &Connection, id: &Uuid) -> Result<Option<Client>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, referral_name, referral_email FROM clients WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, name, email, referral_name, referral_email)| {
        Ok(Client {
            id: parse_uuid(&id)?,
            name,
            email,
            referral: match (referral_name, referral_email) {
                (Some(name), Some(email)) => Some(ReferralContact { name, email }),
                (None, Some(email)) => Some(ReferralContact { name: String::new(), email }),
                _ => None,
            },
        })
    })
    .transpose()
}
