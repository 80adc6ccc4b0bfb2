//! Content module - posts, comments, rich-text blocks and images

pub mod block;
mod comment;
pub mod image;
pub mod portable_text;
mod post;

use serde::{Deserialize, Deserializer};

pub use block::{Block, BlockKind};
pub use comment::{Comment, NewComment, Reference, COMMENT_TYPE};
pub use image::{ImageSource, ImageUrlBuilder};
pub use portable_text::{RenderContext, RichTextRenderer};
pub use post::{Author, Post, PostSummary, Slug};

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
