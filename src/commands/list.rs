//! List posts in the content store

use anyhow::Result;
use std::io::Write;

use crate::store::ContentStore;

/// Print every post, newest first
pub async fn run<W: Write>(store: &dyn ContentStore, out: &mut W) -> Result<()> {
    let posts = store.fetch_posts().await?;
    writeln!(out, "Posts ({}):", posts.len())?;
    for post in posts {
        let date = post
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        writeln!(out, "  {} - {} [{}]", date, post.title, post.slug.as_str())?;
    }
    Ok(())
}
