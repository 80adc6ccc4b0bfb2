//! Render one post page

use anyhow::{anyhow, Result};

use crate::comments::FormState;
use crate::pages::PageBuilder;
use crate::store::ContentStore;
use crate::Blog;

/// Detail page HTML for `slug`
pub async fn run(blog: &Blog, store: &dyn ContentStore, slug: &str) -> Result<String> {
    let post = store
        .fetch_post(slug)
        .await?
        .ok_or_else(|| anyhow!("No post with slug `{}`", slug))?;
    let pages = PageBuilder::new(&blog.config)?;
    Ok(pages.render_post(&post, &FormState::new(post.id.clone()))?)
}
