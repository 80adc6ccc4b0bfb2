//! medium-blog: a server-rendered blog backed by a hosted content store
//!
//! Posts and comments live in the content store. This crate queries it,
//! renders list and detail pages with Tera templates and forwards reader
//! comments back as unapproved documents. Only approved comments are ever
//! shown.

pub mod cache;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod helpers;
pub mod pages;
pub mod server;
pub mod store;
pub mod templates;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use store::{ContentClient, ContentStore, MemoryStore};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Static assets served as fallback
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)
                .with_context(|| format!("Failed to load {}", config_path.display()))?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Content store for this blog: fixtures when given, the HTTP API otherwise
    pub fn store(&self, fixtures: Option<&Path>) -> Result<Arc<dyn ContentStore>> {
        if let Some(path) = fixtures {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.base_dir.join(path)
            };
            return Ok(Arc::new(MemoryStore::from_file(path)?));
        }

        if self.config.content.token.is_none() {
            tracing::warn!("No write token configured; comment submissions will fail");
        }
        Ok(Arc::new(ContentClient::new(&self.config.content)?))
    }

    /// Start the HTTP server
    pub async fn serve(&self, store: Arc<dyn ContentStore>, ip: &str, port: u16) -> Result<()> {
        server::start(self, store, ip, port).await
    }
}
