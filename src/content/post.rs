//! Post and Author models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::comment::Comment;
use super::image::ImageSource;
use super::nullable;

/// URL slug as stored by the content backend (`{ "current": "..." }`)
///
/// A missing or null slug decodes to an empty one; such posts cannot be linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "nullable")]
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.current
    }
}

/// Post author, dereferenced from the post's `author` reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageSource>,
}

/// The fields shown on a post card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, deserialize_with = "nullable")]
    pub slug: Slug,

    #[serde(default, deserialize_with = "nullable")]
    pub description: String,

    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageSource>,

    #[serde(default, deserialize_with = "nullable")]
    pub author: Author,
}

impl PostSummary {
    /// Path of the detail page
    pub fn path(&self) -> String {
        crate::helpers::post_path(self.slug.as_str())
    }
}

/// A fully fetched post
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, deserialize_with = "nullable")]
    pub slug: Slug,

    #[serde(default, deserialize_with = "nullable")]
    pub description: String,

    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageSource>,

    #[serde(default, deserialize_with = "nullable")]
    pub author: Author,

    /// Rich-text body
    #[serde(default, deserialize_with = "nullable")]
    pub body: Vec<Block>,

    /// Approved comments; only populated by the detail fetch
    #[serde(default, deserialize_with = "nullable")]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Drop the body and comments
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            main_image: self.main_image.clone(),
            author: self.author.clone(),
        }
    }
}
