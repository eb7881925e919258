//! Database abstraction layer.
//!
//! [`RecordStore`] is the document-collection interface the handlers
//! consume. The default implementation is [`record::RecordCollection`], one
//! named collection inside a SQLite database opened by [`SqliteStore`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod record;

use std::future::Future;
use std::str::FromStr;

use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::ObjectId;

pub use record::RecordCollection;

/// A stored record: client fields plus the server-stamped ones.
pub type Document = Map<String, Value>;

/// The fixed filter shapes a collection understands.
///
/// Unset parts match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub id: Option<ObjectId>,
    pub uid: Option<ObjectId>,
}

impl Filter {
    pub fn owner(uid: ObjectId) -> Self {
        Self { id: None, uid: Some(uid) }
    }

    pub fn id(id: ObjectId) -> Self {
        Self { id: Some(id), uid: None }
    }

    pub fn owned_by(self, uid: ObjectId) -> Self {
        Self { uid: Some(uid), ..self }
    }
}

/// Descending order on one top-level document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
}

impl Sort {
    pub fn descending(field: &'static str) -> Self {
        Self { field }
    }
}

/// `0` means "no skip" / "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

pub trait RecordStore: Send + Sync + 'static {
    /// Insert a new document and return its generated id.
    fn insert_one(
        &self,
        doc: Document,
    ) -> impl Future<Output = Result<ObjectId, sqlx::Error>> + Send;

    fn find_one(
        &self,
        filter: Filter,
        sort: Sort,
    ) -> impl Future<Output = Result<Option<Document>, sqlx::Error>> + Send;

    fn find_many(
        &self,
        filter: Filter,
        sort: Sort,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Document>, sqlx::Error>> + Send;

    /// Merge `set` into the first matching document (`$set` semantics) and
    /// return the result, or `None` if nothing matched.
    fn update_one_and_return(
        &self,
        filter: Filter,
        set: Document,
    ) -> impl Future<Output = Result<Option<Document>, sqlx::Error>> + Send;

    fn delete_one_and_return(
        &self,
        filter: Filter,
    ) -> impl Future<Output = Result<Option<Document>, sqlx::Error>> + Send;

    fn count(&self, filter: Filter) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

/// Connection pool over the SQLite database holding every collection.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://todo.db"`
    /// or `"sqlite::memory:"` for tests. In-memory databases live only as
    /// long as their connection, so they are pinned to a single one.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn collection(&self, name: &'static str) -> RecordCollection {
        RecordCollection::new(self.pool.clone(), name)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
