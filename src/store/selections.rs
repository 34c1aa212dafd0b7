//! Selection Storage
//! Mission: Per-user shortlist, capped at two houses with no repeats
//!
//! The cap and the duplicate check are a single conditional insert under the
//! `UNIQUE (email, house_id)` constraint, run in an immediate transaction.

use super::{
    decode_doc, encode_doc, new_object_id, now_rfc3339, Database, DeleteResult, InsertResult,
};
use anyhow::{Context, Result};
use rusqlite::{params, ErrorCode, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Maximum selections a single user may hold
pub const MAX_SELECTIONS_PER_USER: i64 = 2;

/// A shortlisted house as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "houseId")]
    pub house_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Selection to be stored for `email`
#[derive(Debug, Clone)]
pub struct NewSelection {
    pub email: String,
    pub house_id: String,
    /// Remaining client fields (house name, price snapshot, ...)
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Inserted(InsertResult),
    LimitReached,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(DeleteResult),
    /// The selection exists but belongs to another user
    NotOwner,
}

/// Selection storage over the shared document database
pub struct SelectionStore {
    db: Database,
}

impl SelectionStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// All selections of `email` in the order they were made
    pub fn list_for_user(&self, email: &str) -> Result<Vec<Selection>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, email, house_id, doc_json FROM selections
             WHERE email = ?1 ORDER BY seq",
        )?;

        let rows: Vec<(String, String, String, String)> = stmt
            .query_map(params![email], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(selection_from_row).collect()
    }

    /// Store a selection unless the user is at the cap or already picked the house.
    ///
    /// The cap is checked first: a user at the limit gets `LimitReached` even
    /// for a house they already selected.
    pub fn create(&self, selection: NewSelection) -> Result<CreateOutcome> {
        let NewSelection {
            email,
            house_id,
            mut fields,
        } = selection;
        for key in ["_id", "id", "email", "houseId"] {
            fields.remove(key);
        }

        let id = new_object_id();
        let doc_json = encode_doc(&fields)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO selections (id, email, house_id, doc_json, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE (SELECT COUNT(*) FROM selections WHERE email = ?2) < ?6",
            params![
                id,
                email,
                house_id,
                doc_json,
                now_rfc3339(),
                MAX_SELECTIONS_PER_USER
            ],
        );

        let outcome = match inserted {
            Ok(0) => {
                warn!("Selection limit reached for {}", email);
                CreateOutcome::LimitReached
            }
            Ok(_) => {
                info!("⭐ {} selected house {}", email, house_id);
                CreateOutcome::Inserted(InsertResult::new(id))
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                warn!("Duplicate selection of house {} by {}", house_id, email);
                CreateOutcome::Duplicate
            }
            Err(e) => return Err(e).context("Failed to insert selection"),
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Delete a selection by id, but only on behalf of its owner
    pub fn delete_owned(&self, id: &str, email: &str) -> Result<DeleteOutcome> {
        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT email FROM selections WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match owner {
            None => DeleteOutcome::Deleted(DeleteResult::new(0)),
            Some(owner) if owner != email => {
                warn!("{} tried to delete selection {} owned by {}", email, id, owner);
                DeleteOutcome::NotOwner
            }
            Some(_) => {
                let rows_affected = tx
                    .execute("DELETE FROM selections WHERE id = ?1", params![id])
                    .context("Failed to delete selection")?;
                info!("🗑️  {} removed selection {}", email, id);
                DeleteOutcome::Deleted(DeleteResult::new(rows_affected))
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

fn selection_from_row(
    (id, email, house_id, doc_json): (String, String, String, String),
) -> Result<Selection> {
    Ok(Selection {
        id,
        email,
        house_id,
        fields: decode_doc(&doc_json)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_store() -> SelectionStore {
        Database::in_memory().unwrap().selections()
    }

    fn pick(email: &str, house_id: &str) -> NewSelection {
        NewSelection {
            email: email.to_string(),
            house_id: house_id.to_string(),
            fields: Map::new(),
        }
    }

    fn inserted_id(outcome: CreateOutcome) -> String {
        match outcome {
            CreateOutcome::Inserted(result) => result.inserted_id,
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_create_and_list_for_user() {
        let store = create_test_store();
        let mut selection = pick("r@example.com", "h1");
        selection.fields = json!({"name": "Lake House", "price": 900})
            .as_object()
            .cloned()
            .unwrap();

        let id = inserted_id(store.create(selection).unwrap());
        store.create(pick("other@example.com", "h1")).unwrap();

        let mine = store.list_for_user("r@example.com").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);
        assert_eq!(mine[0].house_id, "h1");
        assert_eq!(mine[0].fields["name"], "Lake House");
    }

    #[test]
    fn test_third_selection_rejected() {
        let store = create_test_store();
        inserted_id(store.create(pick("r@example.com", "h1")).unwrap());
        inserted_id(store.create(pick("r@example.com", "h2")).unwrap());

        let outcome = store.create(pick("r@example.com", "h3")).unwrap();
        assert_eq!(outcome, CreateOutcome::LimitReached);
        assert_eq!(store.list_for_user("r@example.com").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_selection_rejected() {
        let store = create_test_store();
        inserted_id(store.create(pick("r@example.com", "h1")).unwrap());

        let outcome = store.create(pick("r@example.com", "h1")).unwrap();
        assert_eq!(outcome, CreateOutcome::Duplicate);
        assert_eq!(store.list_for_user("r@example.com").unwrap().len(), 1);
    }

    #[test]
    fn test_limit_checked_before_duplicate() {
        let store = create_test_store();
        inserted_id(store.create(pick("r@example.com", "h1")).unwrap());
        inserted_id(store.create(pick("r@example.com", "h2")).unwrap());

        let outcome = store.create(pick("r@example.com", "h1")).unwrap();
        assert_eq!(outcome, CreateOutcome::LimitReached);
    }

    #[test]
    fn test_cap_is_per_user() {
        let store = create_test_store();
        inserted_id(store.create(pick("a@example.com", "h1")).unwrap());
        inserted_id(store.create(pick("a@example.com", "h2")).unwrap());

        inserted_id(store.create(pick("b@example.com", "h1")).unwrap());
        inserted_id(store.create(pick("b@example.com", "h2")).unwrap());
    }

    #[test]
    fn test_concurrent_creates_respect_cap() {
        let store = Arc::new(create_test_store());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .create(pick("racer@example.com", &format!("h{}", i)))
                        .unwrap()
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| matches!(o, CreateOutcome::Inserted(_)))
            .count();

        assert_eq!(inserted, 2);
        assert_eq!(store.list_for_user("racer@example.com").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_own_selection() {
        let store = create_test_store();
        let id = inserted_id(store.create(pick("r@example.com", "h1")).unwrap());

        let outcome = store.delete_owned(&id, "r@example.com").unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(DeleteResult::new(1)));
        assert!(store.list_for_user("r@example.com").unwrap().is_empty());

        // the freed slot can be used again
        inserted_id(store.create(pick("r@example.com", "h1")).unwrap());
    }

    #[test]
    fn test_delete_someone_elses_selection_refused() {
        let store = create_test_store();
        let id = inserted_id(store.create(pick("owner@example.com", "h1")).unwrap());

        let outcome = store.delete_owned(&id, "intruder@example.com").unwrap();
        assert_eq!(outcome, DeleteOutcome::NotOwner);
        assert_eq!(store.list_for_user("owner@example.com").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unknown_selection_is_zero() {
        let store = create_test_store();
        let outcome = store.delete_owned("missing", "r@example.com").unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(DeleteResult::new(0)));
    }
}
