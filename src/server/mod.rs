//! Blog HTTP server

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{CachedPage, Lookup, PageCache};
use crate::comments::{CommentFields, CommentWriter, Field, FormState};
use crate::content::Post;
use crate::pages::PageBuilder;
use crate::store::{ContentStore, StoreError};
use crate::templates::RenderError;
use crate::Blog;

/// Errors that end a request with a 500 page
#[derive(Debug, Error)]
pub enum AppError {
    #[error("content store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>500</h1><p>Internal Server Error</p>"),
        )
            .into_response()
    }
}

/// Shared server state
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub pages: PageBuilder,
    pub cache: PageCache,
    pub writer: CommentWriter,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        pages: PageBuilder,
        revalidate: Duration,
        public_dir: PathBuf,
    ) -> Self {
        Self {
            writer: CommentWriter::new(store.clone()),
            store,
            pages,
            cache: PageCache::new(revalidate),
            public_dir,
        }
    }

    pub fn from_blog(blog: &Blog, store: Arc<dyn ContentStore>) -> Result<Self, RenderError> {
        Ok(Self::new(
            store,
            PageBuilder::new(&blog.config)?,
            Duration::from_secs(blog.config.revalidate_secs),
            blog.public_dir.clone(),
        ))
    }

    fn render_page(&self, post: Post) -> Result<CachedPage, RenderError> {
        let html = self.pages.render_post(&post, &FormState::new(post.id.clone()))?;
        Ok(CachedPage::new(post, html))
    }

    /// Cached page for `slug`, regenerated when stale
    ///
    /// A failed fetch is logged and treated as not found, unless a stale page
    /// is on hand, in which case that page keeps being served.
    pub async fn load_page(&self, slug: &str) -> Result<Option<CachedPage>, RenderError> {
        let stale = match self.cache.lookup(slug).await {
            Lookup::Fresh(page) => return Ok(Some(page)),
            Lookup::Stale(page) => Some(page),
            Lookup::Missing => None,
        };

        match self.store.fetch_post(slug).await {
            Ok(Some(post)) => {
                let page = self.render_page(post)?;
                self.cache.insert(slug, page.clone()).await;
                Ok(Some(page))
            }
            Ok(None) => {
                if stale.is_some() {
                    tracing::info!(slug, "Post removed from store");
                    self.cache.remove(slug).await;
                }
                Ok(None)
            }
            Err(e) => {
                tracing::error!(slug, error = %e, "Failed to fetch post");
                if stale.is_some() {
                    tracing::warn!(slug, "Serving stale page");
                }
                Ok(stale)
            }
        }
    }

    /// Render every post into the cache, one fetch at a time
    pub async fn warm(&self) -> Result<usize, StoreError> {
        let slugs = self.store.fetch_slugs().await?;
        let mut rendered = 0;
        for slug in slugs {
            match self.store.fetch_post(&slug).await {
                Ok(Some(post)) => match self.render_page(post) {
                    Ok(page) => {
                        self.cache.insert(&slug, page).await;
                        rendered += 1;
                    }
                    Err(e) => tracing::warn!(slug, "Failed to render post: {}", e),
                },
                Ok(None) => tracing::debug!(slug, "Slug has no post"),
                Err(e) => tracing::warn!(slug, "Failed to fetch post: {}", e),
            }
        }
        Ok(rendered)
    }

    fn not_found(&self) -> Result<Response, AppError> {
        let html = self.pages.render_not_found()?;
        Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler).post(comment_form_handler))
        .route("/api/createComment", post(create_comment_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, store: Arc<dyn ContentStore>, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::from_blog(blog, store)?);

    match state.warm().await {
        Ok(count) => tracing::info!("Pre-rendered {} post pages", count),
        Err(e) => tracing::warn!("Could not pre-render post pages: {}", e),
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Post list, fetched fresh on every request
async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let posts = state.store.fetch_posts().await?;
    Ok(Html(state.pages.render_index(&posts)?))
}

async fn post_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    match state.load_page(&slug).await? {
        Some(page) => Ok(Html(page.html.to_string()).into_response()),
        None => state.not_found(),
    }
}

/// Comment form submission; re-renders the post in the resulting form state
async fn comment_form_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(mut values): Form<CommentFields>,
) -> Result<Response, AppError> {
    let Some(page) = state.load_page(&slug).await? else {
        return state.not_found();
    };

    if values.post_id != page.post.id {
        tracing::debug!(slug, submitted = %values.post_id, "Form post id does not match page");
        values.post_id = page.post.id.clone();
    }

    let (form, _task) = FormState::submit(values).dispatch(&state.writer);
    let status = if form.is_thanked() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let html = state.pages.render_post(&page.post, &form)?;
    Ok((status, Html(html)).into_response())
}

/// JSON write endpoint; unlike the form, the write is awaited
async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    Json(values): Json<CommentFields>,
) -> Response {
    let missing_post = values.post_id.trim().is_empty();
    let comment = match values.into_comment() {
        Ok(comment) if !missing_post => comment,
        result => {
            let mut fields: Vec<&str> = Vec::new();
            if missing_post {
                fields.push("_id");
            }
            if let Err(missing) = result {
                fields.extend(missing.into_iter().map(Field::name));
            }
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Missing required fields", "fields": fields })),
            )
                .into_response();
        }
    };

    match state.store.create_comment(&comment).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Comment submitted" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(post_id = %comment.post_id, error = %e, "Couldn't submit comment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Couldn't submit comment", "err": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Static assets from the public directory, else the not-found page
async fn fallback_handler(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Response, AppError> {
    let mut service = ServeDir::new(&state.public_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => Ok(response.into_response()),
        Ok(_) => state.not_found(),
        Err(_) => Ok((StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()),
    }
}
