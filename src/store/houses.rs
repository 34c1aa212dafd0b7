//! Listing Storage
//! Mission: CRUD over house listing documents

use super::{
    decode_doc, encode_doc, new_object_id, now_rfc3339, Database, DeleteResult, InsertResult,
    UpdateResult,
};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::info;

/// A listing as returned to clients: the stored document plus its `_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct House {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The four fields an owner may edit after publishing
#[derive(Debug, Clone, PartialEq)]
pub struct HouseUpdate {
    pub name: Value,
    pub address: Value,
    pub city: Value,
    pub price: f64,
}

impl HouseUpdate {
    fn apply(&self, doc: &mut Map<String, Value>) {
        doc.insert("name".to_string(), self.name.clone());
        doc.insert("address".to_string(), self.address.clone());
        doc.insert("city".to_string(), self.city.clone());
        doc.insert("price".to_string(), price_value(self.price));
    }
}

/// Read a price given either as a JSON number or as a numeric string.
///
/// Returns `None` for anything that is not a finite number.
pub fn parse_price(input: &Value) -> Option<f64> {
    let price = match input {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

/// Whole prices are stored as integers so `1200` and `"1200"` compare equal
fn price_value(price: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if price.fract() == 0.0 && price.abs() <= MAX_SAFE_INTEGER {
        Value::from(price as i64)
    } else {
        Number::from_f64(price).map_or(Value::Null, Value::Number)
    }
}

/// Listing storage over the shared document database
pub struct ListingStore {
    db: Database,
}

impl ListingStore {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a listing as-is; any client-supplied `_id` is replaced
    pub fn create(&self, mut fields: Map<String, Value>) -> Result<InsertResult> {
        fields.remove("_id");
        let id = new_object_id();

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO houses (id, doc_json, created_at) VALUES (?1, ?2, ?3)",
            params![id, encode_doc(&fields)?, now_rfc3339()],
        )
        .context("Failed to insert house")?;

        info!("🏠 Listed house {}", id);
        Ok(InsertResult::new(id))
    }

    /// Every listing in insertion order
    pub fn list_all(&self) -> Result<Vec<House>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare("SELECT id, doc_json FROM houses ORDER BY seq")?;

        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(house_from_row).collect()
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<House>> {
        let conn = self.db.conn();
        let doc_json: Option<String> = conn
            .query_row(
                "SELECT doc_json FROM houses WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match doc_json {
            Some(doc_json) => Ok(Some(house_from_row((id.to_string(), doc_json))?)),
            None => Ok(None),
        }
    }

    /// Overwrite name/address/city/price; unknown ids match nothing
    pub fn update_by_id(&self, id: &str, update: &HouseUpdate) -> Result<UpdateResult> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT doc_json FROM houses WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(doc_json) = existing else {
            return Ok(UpdateResult::unmatched());
        };

        let mut doc = decode_doc(&doc_json)?;
        let before = doc.clone();
        update.apply(&mut doc);

        let modified = doc != before;
        if modified {
            tx.execute(
                "UPDATE houses SET doc_json = ?1 WHERE id = ?2",
                params![encode_doc(&doc)?, id],
            )
            .context("Failed to update house")?;
            info!("✏️  Updated house {}", id);
        }

        tx.commit()?;
        Ok(UpdateResult::matched(modified))
    }

    pub fn delete_by_id(&self, id: &str) -> Result<DeleteResult> {
        let conn = self.db.conn();
        let rows_affected = conn
            .execute("DELETE FROM houses WHERE id = ?1", params![id])
            .context("Failed to delete house")?;

        if rows_affected > 0 {
            info!("🗑️  Deleted house {}", id);
        }
        Ok(DeleteResult::new(rows_affected))
    }
}

fn house_from_row((id, doc_json): (String, String)) -> Result<House> {
    Ok(House {
        id,
        fields: decode_doc(&doc_json)?,
    })
}
