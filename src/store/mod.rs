//! Access to the hosted content store
//!
//! Page handlers only see the [`ContentStore`] trait. [`ContentClient`] talks
//! to the real HTTP API; [`MemoryStore`] serves fixture documents for local
//! development and tests.

mod client;
mod memory;
pub mod query;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::{NewComment, Post, PostSummary};

pub use client::ContentClient;
pub use memory::MemoryStore;
pub use query::{ModerationGate, Query};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("query failed with status {status}: {message}")]
    Query { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("a write token is required to create documents (set SANITY_API_TOKEN)")]
    MissingToken,
    #[error("failed to load fixtures from {path}: {message}")]
    Fixtures { path: String, message: String },
}

/// Read and write operations the site needs from the content backend
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Summaries of every post, newest first
    async fn fetch_posts(&self) -> Result<Vec<PostSummary>, StoreError>;

    /// Slugs of every post
    async fn fetch_slugs(&self) -> Result<Vec<String>, StoreError>;

    /// One post with its approved comments, `None` if no post has this slug
    async fn fetch_post(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    /// Store a reader comment as an unapproved document
    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError>;
}
