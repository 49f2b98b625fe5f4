//! Document store abstraction.
//!
//! Posts live in an ordinary document store with CRUD semantics; the vector
//! index is written separately and best-effort. `PostgresStore` is the real
//! backend, `MemoryStore` serves mock mode and the pipeline tests.

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::errors::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post's author, populated from its reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A blog post as the rest of the system sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author: Option<Author>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// The text that gets embedded and chunked for this post
    pub fn indexable_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All posts, newest first, authors populated
    async fn list(&self) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Posts matching the given ids, in no particular order
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError>;

    async fn insert(&self, post: NewPost) -> Result<Document, AppError>;

    /// Returns the updated post, or None if the id is unknown
    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Option<Document>, AppError>;

    /// Returns whether a post was actually removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    /// Connectivity probe for readiness checks
    async fn ping(&self) -> Result<(), AppError>;
}
