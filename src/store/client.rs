//! HTTP client for the content store's query and mutation APIs

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::query::{ModerationGate, Query};
use super::{ContentStore, StoreError};
use crate::config::ContentConfig;
use crate::content::{NewComment, Post, PostSummary};

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Client for one project and dataset
#[derive(Clone, Debug)]
pub struct ContentClient {
    http: Client,
    config: ContentConfig,
}

impl ContentClient {
    pub fn new(config: &ContentConfig) -> Result<Self, StoreError> {
        let http = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("medium-blog/", env!("CARGO_PKG_VERSION"))
    }

    /// Full GET URL for a query
    pub fn query_url(&self, query: &Query) -> String {
        format!(
            "{}/{}/data/query/{}?{}",
            self.config.query_host(),
            self.config.version_segment(),
            self.config.dataset,
            query.to_query_string()
        )
    }

    fn mutate_url(&self) -> String {
        format!(
            "{}/{}/data/mutate/{}",
            self.config.mutate_host(),
            self.config.version_segment(),
            self.config.dataset
        )
    }

    /// Run a query and decode its `result`
    ///
    /// Reads are anonymous; the token is only sent with mutations.
    pub async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<T, StoreError> {
        let url = self.query_url(query);
        tracing::debug!("Querying content store: {}", query.groq());

        let resp = self.http.get(url).send().await?;
        let bytes = Self::check(resp).await?;
        let envelope: QueryResponse<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.result)
    }

    /// Submit a mutation batch
    pub async fn mutate(&self, mutations: Vec<Value>) -> Result<(), StoreError> {
        let token = self.config.token.as_ref().ok_or(StoreError::MissingToken)?;
        let resp = self
            .http
            .post(self.mutate_url())
            .bearer_auth(token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn check(resp: Response) -> Result<Vec<u8>, StoreError> {
        let status = resp.status();
        let bytes = resp.bytes().await?.to_vec();
        if !status.is_success() {
            return Err(StoreError::Query {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }
        Ok(bytes)
    }
}

/// Best-effort description from an error body
fn error_message(body: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let described = parsed.as_ref().and_then(|v| {
        v.pointer("/error/description")
            .or_else(|| v.pointer("/message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    described.unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[async_trait]
impl ContentStore for ContentClient {
    async fn fetch_posts(&self) -> Result<Vec<PostSummary>, StoreError> {
        let posts: Option<Vec<PostSummary>> = self.fetch(&Query::list()).await?;
        Ok(posts
            .unwrap_or_default()
            .into_iter()
            .filter(|post| {
                let linkable = !post.slug.as_str().is_empty();
                if !linkable {
                    tracing::warn!(post_id = %post.id, "Skipping post without a slug");
                }
                linkable
            })
            .collect())
    }

    async fn fetch_slugs(&self) -> Result<Vec<String>, StoreError> {
        let slugs: Option<Vec<Option<String>>> = self.fetch(&Query::slugs()).await?;
        Ok(slugs.unwrap_or_default().into_iter().flatten().collect())
    }

    async fn fetch_post(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let post: Option<Post> = self.fetch(&Query::detail(slug)).await?;
        Ok(post.map(|mut post| {
            ModerationGate::apply(&mut post);
            post
        }))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError> {
        self.mutate(vec![json!({ "create": comment.to_document() })])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::PUBLISHED_ONLY;
    use axum::extract::{Query as QueryParams, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        params: Vec<HashMap<String, String>>,
        query_auth: Vec<Option<String>>,
        mutations: Vec<Value>,
        auth: Vec<Option<String>>,
    }

    fn authorization(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    type Shared = Arc<Mutex<Recorded>>;

    async fn query_handler(
        State(rec): State<Shared>,
        headers: HeaderMap,
        QueryParams(params): QueryParams<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let groq = params.get("query").cloned().unwrap_or_default();
        {
            let mut rec = rec.lock().unwrap();
            rec.params.push(params.clone());
            rec.query_auth.push(authorization(&headers));
        }

        if groq.contains("broken") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "description": "expected ']'" } })),
            );
        }
        let result = if groq.contains("$slug") {
            if params.get("$slug").map(String::as_str) == Some("\"hello\"") {
                json!({
                    "_id": "p1",
                    "_createdAt": "2022-01-01T00:00:00Z",
                    "title": "Hello",
                    "slug": { "current": "hello" },
                    "author": { "name": "Ada" },
                    "body": [],
                    "comments": [
                        { "_id": "c1", "name": "Bob", "comment": "ok", "approved": true, "post": { "_ref": "p1" } },
                        { "_id": "c2", "name": "Eve", "comment": "spam", "approved": false, "post": { "_ref": "p1" } }
                    ]
                })
            } else {
                Value::Null
            }
        } else if groq.contains("[].slug.current") {
            json!(["hello", null, "world"])
        } else {
            json!([
                { "_id": "p1", "title": "Hello", "slug": { "current": "hello" } },
                { "_id": "p2", "title": "Untitled", "slug": null },
                { "_id": "p3", "title": "No current", "slug": { "_type": "slug" } },
                { "_id": "p4", "title": "Empty", "slug": { "current": "" } }
            ])
        };
        (StatusCode::OK, Json(json!({ "ms": 1, "query": groq, "result": result })))
    }

    async fn mutate_handler(
        State(rec): State<Shared>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let mut rec = rec.lock().unwrap();
        rec.auth.push(authorization(&headers));
        rec.mutations.push(body);
        Json(json!({ "transactionId": "t1", "results": [] }))
    }

    async fn mock_store() -> (String, Shared) {
        let rec: Shared = Arc::default();
        let app = Router::new()
            .route("/v2021-10-21/data/query/production", get(query_handler))
            .route("/v2021-10-21/data/mutate/production", post(mutate_handler))
            .with_state(rec.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), rec)
    }

    fn client(host: &str, token: Option<&str>) -> ContentClient {
        ContentClient::new(&ContentConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            token: token.map(str::to_string),
            api_host: Some(host.to_string()),
            ..ContentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_query_url() {
        let client = ContentClient::new(&ContentConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            use_cdn: true,
            ..ContentConfig::default()
        })
        .unwrap();
        let url = client.query_url(&Query::new("*"));
        assert_eq!(
            url,
            "https://abc123.apicdn.sanity.io/v2021-10-21/data/query/production?query=%2A"
        );
    }

    #[tokio::test]
    async fn test_fetch_posts_skips_posts_without_slug() {
        let (host, _) = mock_store().await;
        let posts = client(&host, None).fetch_posts().await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
        assert_eq!(posts[0].slug.as_str(), "hello");
    }

    #[tokio::test]
    async fn test_reads_never_send_the_write_token() {
        let (host, rec) = mock_store().await;
        let client = client(&host, Some("write-token"));
        client.fetch_posts().await.unwrap();
        client.fetch_slugs().await.unwrap();
        client.fetch_post("hello").await.unwrap();

        let rec = rec.lock().unwrap();
        assert_eq!(rec.query_auth.len(), 3);
        assert!(rec.query_auth.iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_read_queries_exclude_drafts() {
        let (host, rec) = mock_store().await;
        let client = client(&host, None);
        client.fetch_posts().await.unwrap();
        client.fetch_slugs().await.unwrap();
        client.fetch_post("hello").await.unwrap();

        let rec = rec.lock().unwrap();
        for params in &rec.params {
            assert!(params["query"].contains(PUBLISHED_ONLY), "{}", params["query"]);
        }
    }

    #[tokio::test]
    async fn test_fetch_slugs_skips_nulls() {
        let (host, _) = mock_store().await;
        let slugs = client(&host, None).fetch_slugs().await.unwrap();
        assert_eq!(slugs, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn test_fetch_post_sends_slug_and_applies_gate() {
        let (host, rec) = mock_store().await;
        let post = client(&host, None).fetch_post("hello").await.unwrap().unwrap();
        assert_eq!(post.title, "Hello");
        let ids: Vec<_> = post.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);

        let rec = rec.lock().unwrap();
        let params = rec.params.last().unwrap();
        assert_eq!(params.get("$slug").map(String::as_str), Some("\"hello\""));
        assert!(params["query"].contains(ModerationGate::FILTER));
    }

    #[tokio::test]
    async fn test_fetch_missing_post_is_none() {
        let (host, _) = mock_store().await;
        let post = client(&host, None).fetch_post("nope").await.unwrap();
        assert!(post.is_none());
    }

    #[tokio::test]
    async fn test_query_error_carries_description() {
        let (host, _) = mock_store().await;
        let err = client(&host, None)
            .fetch::<Value>(&Query::new("*[broken"))
            .await
            .unwrap_err();
        match err {
            StoreError::Query { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "expected ']'");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_comment_posts_unapproved_document() {
        let (host, rec) = mock_store().await;
        let comment = NewComment {
            post_id: "p1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            comment: "hi".to_string(),
        };
        client(&host, Some("secret"))
            .create_comment(&comment)
            .await
            .unwrap();

        let rec = rec.lock().unwrap();
        assert_eq!(rec.auth[0].as_deref(), Some("Bearer secret"));
        let created = &rec.mutations[0]["mutations"][0]["create"];
        assert_eq!(created["_type"], "comment");
        assert_eq!(created["approved"], false);
        assert_eq!(created["post"]["_ref"], "p1");
    }

    #[tokio::test]
    async fn test_create_comment_without_token() {
        let (host, rec) = mock_store().await;
        let comment = NewComment {
            post_id: "p1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            comment: "hi".to_string(),
        };
        let err = client(&host, None).create_comment(&comment).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingToken));
        assert!(rec.lock().unwrap().mutations.is_empty());
    }

    #[tokio::test]
    async fn test_network_error() {
        let err = client("http://127.0.0.1:1", None)
            .fetch_posts()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }
}
