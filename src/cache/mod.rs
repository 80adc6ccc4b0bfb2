//! Regeneration cache for post pages
//!
//! Each entry keeps the fetched post and its rendered page. An entry younger
//! than the revalidation interval is served as is; an older one is refetched,
//! and kept in service when the refetch fails. Missing posts are never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::content::Post;

/// One rendered post page
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub post: Arc<Post>,
    pub html: Arc<str>,
    rendered_at: Instant,
}

impl CachedPage {
    pub fn new(post: Post, html: String) -> Self {
        Self {
            post: Arc::new(post),
            html: Arc::from(html),
            rendered_at: Instant::now(),
        }
    }

    fn age(&self) -> Duration {
        self.rendered_at.elapsed()
    }
}

/// What the cache holds for a slug
#[derive(Debug, Clone)]
pub enum Lookup {
    Fresh(CachedPage),
    Stale(CachedPage),
    Missing,
}

/// Post pages keyed by slug
#[derive(Debug)]
pub struct PageCache {
    revalidate: Duration,
    pages: RwLock<HashMap<String, CachedPage>>,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            revalidate,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub async fn lookup(&self, slug: &str) -> Lookup {
        let pages = self.pages.read().await;
        match pages.get(slug) {
            Some(page) if page.age() < self.revalidate => Lookup::Fresh(page.clone()),
            Some(page) => Lookup::Stale(page.clone()),
            None => Lookup::Missing,
        }
    }

    pub async fn insert(&self, slug: &str, page: CachedPage) {
        self.pages.write().await.insert(slug.to_string(), page);
    }

    /// Forget a post that no longer exists
    pub async fn remove(&self, slug: &str) -> bool {
        self.pages.write().await.remove(slug).is_some()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
