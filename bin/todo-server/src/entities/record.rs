//! SQLite implementation of [`RecordStore`].
//!
//! Every collection shares the `records` table; a row keeps the record id
//! and owner in their own columns (for filtering) and the remaining fields
//! as a JSON object in `doc`. Sorting goes through `json_extract`, with
//! insertion order as tie-breaker.
//!
//! The `sqlx::query` (runtime-verified) form is used so that no
//! `DATABASE_URL` environment variable is needed at compile time.

use serde_json::Value;
use sqlx::SqlitePool;

use super::{Document, Filter, Page, RecordStore, Sort};
use crate::models::payload::{KEY_ID, KEY_UID};
use crate::models::ObjectId;

const MATCHES: &str = "collection = ?1 AND (?2 IS NULL OR id = ?2) AND (?3 IS NULL OR uid = ?3)";

#[derive(Clone, Debug)]
pub struct RecordCollection {
    pool: SqlitePool,
    name: &'static str,
}

impl RecordCollection {
    pub fn new(pool: SqlitePool, name: &'static str) -> Self {
        Self { pool, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Round-trip to the database without touching any record.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn filter_binds(filter: &Filter) -> (Option<String>, Option<String>) {
    (
        filter.id.map(|id| id.to_hex()),
        filter.uid.map(|uid| uid.to_hex()),
    )
}

/// `$."field"` so keys with dots or spaces address a single top-level field.
fn json_path(sort: &Sort) -> String {
    format!("$.\"{}\"", sort.field)
}

fn decode(raw: &str) -> Result<Document, sqlx::Error> {
    serde_json::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn encode(doc: &Document) -> Result<String, sqlx::Error> {
    serde_json::to_string(doc).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn owner_of(doc: &Document) -> String {
    doc.get(KEY_UID)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Put `id` in front of the stored fields.
fn with_id(id: String, doc: Document) -> Document {
    let mut out = Document::new();
    out.insert(KEY_ID.to_owned(), Value::String(id));
    out.extend(doc.into_iter().filter(|(k, _)| k != KEY_ID));
    out
}

impl RecordStore for RecordCollection {
    async fn insert_one(&self, mut doc: Document) -> Result<ObjectId, sqlx::Error> {
        doc.remove(KEY_ID);
        let id = ObjectId::new();
        sqlx::query("INSERT INTO records (collection, id, uid, doc) VALUES (?1, ?2, ?3, ?4)")
            .bind(self.name)
            .bind(id.to_hex())
            .bind(owner_of(&doc))
            .bind(encode(&doc)?)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_one(&self, filter: Filter, sort: Sort) -> Result<Option<Document>, sqlx::Error> {
        let (id, uid) = filter_binds(&filter);
        let row: Option<(String, String)> = sqlx::query_as(&format!(
            "SELECT id, doc FROM records WHERE {MATCHES} \
             ORDER BY json_extract(doc, ?4) DESC, seq DESC LIMIT 1"
        ))
        .bind(self.name)
        .bind(id)
        .bind(uid)
        .bind(json_path(&sort))
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(id, raw)| decode(&raw).map(|doc| with_id(id, doc)))
            .transpose()
    }

    async fn find_many(
        &self,
        filter: Filter,
        sort: Sort,
        page: Page,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let (id, uid) = filter_binds(&filter);
        // SQLite treats a negative LIMIT as unbounded.
        let limit = if page.limit == 0 { -1 } else { page.limit.min(i64::MAX as u64) as i64 };
        let offset = page.skip.min(i64::MAX as u64) as i64;
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT id, doc FROM records WHERE {MATCHES} \
             ORDER BY json_extract(doc, ?4) DESC, seq DESC LIMIT ?5 OFFSET ?6"
        ))
        .bind(self.name)
        .bind(id)
        .bind(uid)
        .bind(json_path(&sort))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(id, raw)| decode(&raw).map(|doc| with_id(id, doc)))
            .collect()
    }

    async fn update_one_and_return(
        &self,
        filter: Filter,
        set: Document,
    ) -> Result<Option<Document>, sqlx::Error> {
        let (id, uid) = filter_binds(&filter);
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading so the merge cannot interleave
        // with another writer.
        sqlx::query("UPDATE records SET seq = seq WHERE 0")
            .execute(&mut *tx)
            .await?;

        let row: Option<(i64, String, String)> = sqlx::query_as(&format!(
            "SELECT seq, id, doc FROM records WHERE {MATCHES} ORDER BY seq LIMIT 1"
        ))
        .bind(self.name)
        .bind(id)
        .bind(uid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((seq, record_id, raw)) = row else {
            return Ok(None);
        };

        let mut doc = decode(&raw)?;
        doc.extend(set.into_iter().filter(|(k, _)| k != KEY_ID));

        sqlx::query("UPDATE records SET doc = ?1, uid = ?2 WHERE seq = ?3")
            .bind(encode(&doc)?)
            .bind(owner_of(&doc))
            .bind(seq)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(with_id(record_id, doc)))
    }

    async fn delete_one_and_return(&self, filter: Filter) -> Result<Option<Document>, sqlx::Error> {
        let (id, uid) = filter_binds(&filter);
        let row: Option<(String, String)> = sqlx::query_as(&format!(
            "DELETE FROM records WHERE seq = \
             (SELECT seq FROM records WHERE {MATCHES} ORDER BY seq LIMIT 1) \
             RETURNING id, doc"
        ))
        .bind(self.name)
        .bind(id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(id, raw)| decode(&raw).map(|doc| with_id(id, doc)))
            .transpose()
    }

    async fn count(&self, filter: Filter) -> Result<u64, sqlx::Error> {
        let (id, uid) = filter_binds(&filter);
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM records WHERE {MATCHES}"))
            .bind(self.name)
            .bind(id)
            .bind(uid)
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }
}
