//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template since comment text comes straight from readers; markup
//! produced by the rich-text renderer is marked `| safe` where it is used.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tera::{Context, Tera};
use thiserror::Error;

use crate::comments::Field;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("medium/layout.html")),
            ("index.html", include_str!("medium/index.html")),
            ("post.html", include_str!("medium/post.html")),
            ("not_found.html", include_str!("medium/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("medium/partials/header.html"),
            ),
            (
                "partials/banner.html",
                include_str!("medium/partials/banner.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("medium/partials/post_card.html"),
            ),
            (
                "partials/comments.html",
                include_str!("medium/partials/comments.html"),
            ),
            (
                "partials/comment_form.html",
                include_str!("medium/partials/comment_form.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String, RenderError> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
    }
}

/// Site-wide values available to every template as `site`
///
/// URL-valued fields across these structs hold attribute-escaped text and are
/// emitted with `| safe`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub banner: String,
    pub favicon: String,
    pub generator: String,
}

/// One card on the post list
#[derive(Debug, Clone, Serialize)]
pub struct PostCardData {
    pub id: String,
    pub href: String,
    pub title: String,
    pub description: String,
    pub author_name: String,
    pub author_image: String,
    pub main_image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_name: String,
    pub author_image: String,
    pub main_image: String,
    /// `<time>` element, or empty when the post has no timestamp
    pub published: String,
    /// Rendered rich text
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentData {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldErrorsData {
    pub name: bool,
    pub email: bool,
    pub comment: bool,
}

impl From<&BTreeSet<Field>> for FieldErrorsData {
    fn from(fields: &BTreeSet<Field>) -> Self {
        Self {
            name: fields.contains(&Field::Name),
            email: fields.contains(&Field::Email),
            comment: fields.contains(&Field::Comment),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormData {
    pub thanked: bool,
    pub action: String,
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub has_errors: bool,
    pub errors: FieldErrorsData,
}
