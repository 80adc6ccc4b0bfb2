//! Write a static snapshot of the blog

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::comments::FormState;
use crate::pages::PageBuilder;
use crate::store::ContentStore;
use crate::Blog;

/// Write `index.html`, `404.html` and `post/<slug>/index.html` into `out_dir`,
/// then copy static assets. Returns the number of post pages written.
pub async fn run(blog: &Blog, store: &dyn ContentStore, out_dir: &Path) -> Result<usize> {
    let pages = PageBuilder::new(&blog.config)?;
    fs::create_dir_all(out_dir)?;

    let posts = store.fetch_posts().await?;
    fs::write(out_dir.join("index.html"), pages.render_index(&posts)?)?;
    fs::write(out_dir.join("404.html"), pages.render_not_found()?)?;

    let mut written = 0;
    for slug in store.fetch_slugs().await? {
        if !is_safe_segment(&slug) {
            tracing::warn!(slug, "Skipping slug that is not a single path segment");
            continue;
        }
        let Some(post) = store.fetch_post(&slug).await? else {
            tracing::warn!(slug, "Slug has no post");
            continue;
        };
        let html = pages.render_post(&post, &FormState::new(post.id.clone()))?;
        let dir = out_dir.join("post").join(&slug);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("index.html"), html)?;
        tracing::debug!("Generated: post/{}/index.html", slug);
        written += 1;
    }

    if blog.public_dir.exists() && blog.public_dir != out_dir {
        copy_assets(&blog.public_dir, out_dir)?;
    }

    tracing::info!("Exported {} posts to {}", written, out_dir.display());
    Ok(written)
}

fn is_safe_segment(slug: &str) -> bool {
    !slug.is_empty() && slug != "." && slug != ".." && !slug.contains(['/', '\\'])
}

/// Copy static assets into the output directory
fn copy_assets(public_dir: &Path, out_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(public_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(public_dir)?;
        let dest = out_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest)?;
    }
    Ok(())
}
