//! User Storage
//! Mission: Keep user profile documents keyed by email

use super::{decode_doc, encode_doc, new_object_id, now_rfc3339, Database, UpdateResult};
use crate::auth::models::User;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};
use tracing::info;

/// User storage over the shared document database
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Merge `fields` into the user stored under `email`, creating it if absent.
    ///
    /// The path email always wins over an `email` in the body, and a body
    /// `_id` is ignored.
    pub fn upsert_by_email(
        &self,
        email: &str,
        mut fields: Map<String, Value>,
    ) -> Result<UpdateResult> {
        fields.remove("_id");
        fields.remove("email");

        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT doc_json FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        let result = match existing {
            Some(doc_json) => {
                let mut doc = decode_doc(&doc_json)?;
                let before = doc.clone();
                doc.extend(fields);

                let modified = doc != before;
                if modified {
                    tx.execute(
                        "UPDATE users SET doc_json = ?1 WHERE email = ?2",
                        params![encode_doc(&doc)?, email],
                    )
                    .context("Failed to update user")?;
                }
                UpdateResult::matched(modified)
            }
            None => {
                let id = new_object_id();
                tx.execute(
                    "INSERT INTO users (id, email, doc_json, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, email, encode_doc(&fields)?, now_rfc3339()],
                )
                .context("Failed to insert user")?;

                info!("✅ Registered user: {}", email);
                UpdateResult::upserted(id)
            }
        };

        tx.commit()?;
        Ok(result)
    }

    /// Get user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.conn();

        let row_result: rusqlite::Result<(String, String, String)> = conn.query_row(
            "SELECT id, email, doc_json FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        );

        match row_result {
            Ok(row) => Ok(Some(user_from_row(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all users in registration order
    pub fn list_all(&self) -> Result<Vec<User>> {
        let conn = self.db.conn();

        let mut stmt = conn.prepare("SELECT id, email, doc_json FROM users ORDER BY seq")?;

        let rows: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(user_from_row).collect()
    }
}

fn user_from_row((id, email, doc_json): (String, String, String)) -> Result<User> {
    Ok(User {
        id,
        email,
        profile: decode_doc(&doc_json)?,
    })
}
