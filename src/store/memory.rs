//! In-memory content store backed by a JSON fixture file
//!
//! Fixture format:
//!
//! ```json
//! { "posts": [ { "_id": "...", "slug": { "current": "..." }, ... } ],
//!   "comments": [ { "_id": "...", "approved": true, "post": { "_ref": "..." }, ... } ] }
//! ```
//!
//! Posts carry their author inline, as the store returns them after
//! dereferencing. Comments are joined to posts through [`ModerationGate`],
//! the same rule the HTTP store applies in its detail query.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::query::ModerationGate;
use super::{ContentStore, StoreError};
use crate::content::{Comment, NewComment, Post, PostSummary, Reference};

#[derive(Debug, Default, Deserialize)]
struct Fixtures {
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// Content store holding every document in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Posts keyed by id, in insertion order
    posts: RwLock<IndexMap<String, Post>>,
    comments: RwLock<Vec<Comment>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load posts and comments from a fixture file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let fixture_error = |message: String| StoreError::Fixtures {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let fixtures: Fixtures =
            serde_json::from_str(&content).map_err(|e| fixture_error(e.to_string()))?;

        let mut posts = IndexMap::new();
        for mut post in fixtures.posts {
            post.comments.clear();
            posts.insert(post.id.clone(), post);
        }
        tracing::info!(
            "Loaded {} posts and {} comments from {}",
            posts.len(),
            fixtures.comments.len(),
            path.display()
        );
        Ok(Self {
            posts: RwLock::new(posts),
            comments: RwLock::new(fixtures.comments),
            next_id: AtomicU64::new(0),
        })
    }

    pub async fn insert_post(&self, mut post: Post) {
        post.comments.clear();
        self.posts.write().await.insert(post.id.clone(), post);
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.comments.write().await.push(comment);
    }

    /// Every stored comment, approved or not
    pub async fn comments(&self) -> Vec<Comment> {
        self.comments.read().await.clone()
    }

    /// Moderator action: flip a comment's approved flag
    pub async fn set_approved(&self, comment_id: &str, approved: bool) -> bool {
        let mut comments = self.comments.write().await;
        match comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => {
                comment.approved = approved;
                true
            }
            None => false,
        }
    }
}

/// Draft documents share the published id behind a `drafts.` prefix
fn is_published(post: &Post) -> bool {
    !post.id.starts_with("drafts.")
}

fn is_listed(post: &Post) -> bool {
    is_published(post) && !post.slug.as_str().is_empty()
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_posts(&self) -> Result<Vec<PostSummary>, StoreError> {
        let posts = self.posts.read().await;
        let mut summaries: Vec<PostSummary> = posts
            .values()
            .filter(|p| is_listed(p))
            .map(Post::summary)
            .collect();
        // Stable, so equal timestamps keep insertion order
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn fetch_slugs(&self) -> Result<Vec<String>, StoreError> {
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|p| is_listed(p))
            .map(|p| p.slug.current.clone())
            .collect())
    }

    async fn fetch_post(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let posts = self.posts.read().await;
        let Some(post) = posts
            .values()
            .find(|p| is_published(p) && p.slug.as_str() == slug)
        else {
            return Ok(None);
        };
        let mut post = post.clone();

        let comments = self.comments.read().await;
        let mut visible: Vec<Comment> = comments
            .iter()
            .filter(|c| ModerationGate::admits(c, &post.id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        post.comments = visible;

        Ok(Some(post))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = Comment {
            id: format!("comment-{}", n),
            created_at: Some(Utc::now()),
            name: comment.name.clone(),
            email: comment.email.clone(),
            comment: comment.comment.clone(),
            approved: false,
            post: Some(Reference::to(comment.post_id.clone())),
        };
        tracing::debug!(comment_id = %stored.id, post_id = %comment.post_id, "Stored comment");
        self.comments.write().await.push(stored);
        Ok(())
    }
}
