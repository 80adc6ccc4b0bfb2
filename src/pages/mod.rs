//! Page builder
//!
//! Turns fetched content into view data and renders it through the embedded
//! templates. Builders never touch the store: callers fetch first, so each
//! page costs at most one content round trip.

use chrono_tz::Tz;
use tera::Context;

use crate::comments::FormState;
use crate::config::SiteConfig;
use crate::content::image::Fit;
use crate::content::{
    Comment, ImageSource, ImageUrlBuilder, Post, PostSummary, RenderContext, RichTextRenderer,
};
use crate::helpers::{format_local, html_escape, meta_generator, post_path, time_tag};
use crate::templates::{
    CommentData, FieldErrorsData, FormData, PostCardData, PostPageData, RenderError, SiteData,
    TemplateRenderer,
};

/// Renders the list, detail and not-found pages
pub struct PageBuilder {
    renderer: TemplateRenderer,
    rich_text: RichTextRenderer,
    images: ImageUrlBuilder,
    site: SiteData,
    date_format: String,
    tz: Tz,
}

impl PageBuilder {
    pub fn new(config: &SiteConfig) -> Result<Self, RenderError> {
        Ok(Self {
            renderer: TemplateRenderer::new()?,
            rich_text: RichTextRenderer::new(),
            images: ImageUrlBuilder::new(&config.content.project_id, &config.content.dataset),
            site: SiteData {
                title: config.title.clone(),
                description: config.description.clone(),
                banner: html_escape(&config.banner),
                favicon: html_escape(&config.favicon),
                generator: meta_generator(),
            },
            date_format: config.date_format.clone(),
            tz: config.tz(),
        })
    }

    /// Swap the rich-text rule set
    pub fn with_rich_text(mut self, rich_text: RichTextRenderer) -> Self {
        self.rich_text = rich_text;
        self
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }

    /// Post list, one card per post in the given order
    pub fn render_index(&self, posts: &[PostSummary]) -> Result<String, RenderError> {
        let cards: Vec<PostCardData> = posts.iter().map(|p| self.card(p)).collect();
        let mut context = self.base_context();
        context.insert("cards", &cards);
        self.renderer.render("index.html", &context)
    }

    fn card(&self, post: &PostSummary) -> PostCardData {
        let main_image = match post.main_image.as_ref().map(|src| self.images.image(src)) {
            Some(Ok(url)) => {
                html_escape(&url.width(800).height(480).fit(Fit::Crop).auto_format().to_string())
            }
            Some(Err(e)) => {
                tracing::warn!(post_id = %post.id, "Unresolvable main image: {}", e);
                String::new()
            }
            None => String::new(),
        };
        PostCardData {
            id: post.id.clone(),
            href: html_escape(&post.path()),
            title: post.title.clone(),
            description: post.description.clone(),
            author_name: post.author.name.clone(),
            author_image: self.avatar(post.author.image.as_ref(), 96),
            main_image,
        }
    }

    fn avatar(&self, source: Option<&ImageSource>, size: u32) -> String {
        match source.map(|src| self.images.image(src)) {
            Some(Ok(url)) => html_escape(
                &url.width(size)
                    .height(size)
                    .fit(Fit::Crop)
                    .auto_format()
                    .to_string(),
            ),
            Some(Err(e)) => {
                tracing::warn!("Unresolvable author image: {}", e);
                String::new()
            }
            None => String::new(),
        }
    }

    /// Detail page with its comment section in `form` state
    pub fn render_post(&self, post: &Post, form: &FormState) -> Result<String, RenderError> {
        let ctx = RenderContext {
            images: &self.images,
        };
        let page = PostPageData {
            id: post.id.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            author_name: post.author.name.clone(),
            author_image: self.avatar(post.author.image.as_ref(), 80),
            main_image: html_escape(&self.images.url_or_empty(post.main_image.as_ref())),
            published: post
                .created_at
                .map(|date| time_tag(&date, self.tz, &self.date_format))
                .unwrap_or_default(),
            body: self.rich_text.render(&post.body, &ctx),
        };
        let comments: Vec<CommentData> = post.comments.iter().map(|c| self.comment(c)).collect();

        let mut context = self.base_context();
        context.insert("post", &page);
        context.insert("comments", &comments);
        context.insert("form", &form_data(post, form));
        self.renderer.render("post.html", &context)
    }

    fn comment(&self, comment: &Comment) -> CommentData {
        CommentData {
            id: comment.id.clone(),
            name: comment.name.clone(),
            comment: comment.comment.clone(),
            date: comment
                .created_at
                .map(|date| format_local(&date, self.tz, &self.date_format))
                .unwrap_or_default(),
        }
    }

    pub fn render_not_found(&self) -> Result<String, RenderError> {
        self.renderer.render("not_found.html", &self.base_context())
    }
}

fn form_data(post: &Post, form: &FormState) -> FormData {
    let action = html_escape(&post_path(post.slug.as_str()));
    match form {
        FormState::Form { values, errors } => FormData {
            thanked: false,
            action,
            post_id: post.id.clone(),
            name: values.name.clone(),
            email: values.email.clone(),
            comment: values.comment.clone(),
            has_errors: !errors.is_empty(),
            errors: FieldErrorsData::from(errors),
        },
        // The write is already detached by the time a page is rendered
        FormState::Submitting(_) | FormState::Thanked => FormData {
            thanked: true,
            action,
            post_id: post.id.clone(),
            name: String::new(),
            email: String::new(),
            comment: String::new(),
            has_errors: false,
            errors: FieldErrorsData::default(),
        },
    }
}
