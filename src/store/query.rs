//! GROQ queries and the comment moderation gate

use serde_json::Value;

use crate::content::{Comment, Post};
use crate::helpers::encode_url;

/// Excludes draft documents, which authenticated reads would otherwise see
pub const PUBLISHED_ONLY: &str = r#"!(_id in path("drafts.**"))"#;

/// Card fields of every linkable published post, newest first
pub const POST_LIST_QUERY: &str = r#"*[_type == "post" && !(_id in path("drafts.**")) && defined(slug.current)] | order(_createdAt desc) {
  _id,
  _createdAt,
  title,
  slug,
  author -> {
    name,
    image
  },
  description,
  mainImage
}"#;

/// Slug of every post
pub const POST_SLUGS_QUERY: &str =
    r#"*[_type == "post" && !(_id in path("drafts.**")) && defined(slug.current)][].slug.current"#;

/// Which comments may be shown under a post
///
/// The rule exists in two forms that must agree: a GROQ filter embedded in
/// the detail query, evaluated by the store, and a predicate for documents
/// already in memory.
pub struct ModerationGate;

impl ModerationGate {
    /// GROQ filter, evaluated inside the post projection (`^` is the post)
    pub const FILTER: &'static str =
        r#"_type == "comment" && post._ref == ^._id && approved == true"#;

    /// Sub-query selecting a post's visible comments, oldest first
    pub fn subquery() -> String {
        format!(
            "*[{}] | order(_createdAt asc) {{\n    _id,\n    _createdAt,\n    name,\n    comment,\n    approved,\n    post\n  }}",
            Self::FILTER
        )
    }

    /// Predicate form of [`ModerationGate::FILTER`]
    pub fn admits(comment: &Comment, post_id: &str) -> bool {
        comment.approved && comment.post_id() == Some(post_id)
    }

    /// Drop anything the store returned that the gate would not admit
    pub fn apply(post: &mut Post) {
        let before = post.comments.len();
        let post_id = post.id.clone();
        post.comments.retain(|c| Self::admits(c, &post_id));
        let dropped = before - post.comments.len();
        if dropped > 0 {
            tracing::warn!(
                post_id = %post_id,
                dropped,
                "Store returned comments outside the moderation gate"
            );
        }
    }
}

/// Full fields of the post with slug `$slug`, plus its approved comments
pub fn post_detail_query() -> String {
    format!(
        r#"*[_type == "post" && {} && slug.current == $slug][0] {{
  _id,
  _createdAt,
  title,
  author -> {{
    name,
    image
  }},
  'comments': {},
  description,
  mainImage,
  slug,
  body
}}"#,
        PUBLISHED_ONLY,
        ModerationGate::subquery()
    )
}

/// A GROQ query with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    groq: String,
    params: Vec<(String, Value)>,
}

impl Query {
    pub fn new(groq: impl Into<String>) -> Self {
        Self {
            groq: groq.into(),
            params: Vec::new(),
        }
    }

    /// Bind `$name`; values travel JSON-encoded
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn groq(&self) -> &str {
        &self.groq
    }

    /// `query=...&$name=...` with every component percent-encoded
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![format!("query={}", encode_url(&self.groq))];
        for (name, value) in &self.params {
            pairs.push(format!(
                "{}={}",
                encode_url(&format!("${}", name)),
                encode_url(&value.to_string())
            ));
        }
        pairs.join("&")
    }

    pub fn list() -> Self {
        Self::new(POST_LIST_QUERY)
    }

    pub fn slugs() -> Self {
        Self::new(POST_SLUGS_QUERY)
    }

    pub fn detail(slug: &str) -> Self {
        Self::new(post_detail_query()).param("slug", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Reference, Slug};

    fn comment(id: &str, post: &str, approved: bool) -> Comment {
        Comment {
            id: id.to_string(),
            created_at: None,
            name: "n".to_string(),
            email: String::new(),
            comment: "c".to_string(),
            approved,
            post: Some(Reference::to(post)),
        }
    }

    #[test]
    fn test_detail_query_embeds_gate() {
        let query = post_detail_query();
        assert!(query.contains("slug.current == $slug"));
        assert!(query.contains(&format!("'comments': *[{}]", ModerationGate::FILTER)));
        assert!(query.contains("approved == true"));
        assert!(query.contains("post._ref == ^._id"));
    }

    #[test]
    fn test_comment_projection_omits_email() {
        assert!(!ModerationGate::subquery().contains("email"));
    }

    #[test]
    fn test_read_queries_are_published_only() {
        let queries = [
            POST_LIST_QUERY.to_string(),
            POST_SLUGS_QUERY.to_string(),
            post_detail_query(),
        ];
        for query in queries {
            assert!(query.contains(PUBLISHED_ONLY), "{}", query);
        }
        assert!(POST_LIST_QUERY.contains("defined(slug.current)"));
    }

    #[test]
    fn test_list_query_is_ordered_and_has_no_comments() {
        assert!(POST_LIST_QUERY.contains("order(_createdAt desc)"));
        assert!(!POST_LIST_QUERY.contains("comments"));
    }

    #[test]
    fn test_admits() {
        assert!(ModerationGate::admits(&comment("c1", "p1", true), "p1"));
        assert!(!ModerationGate::admits(&comment("c2", "p1", false), "p1"));
        assert!(!ModerationGate::admits(&comment("c3", "p2", true), "p1"));
        let mut orphan = comment("c4", "p1", true);
        orphan.post = None;
        assert!(!ModerationGate::admits(&orphan, "p1"));
    }

    #[test]
    fn test_apply_filters_post_comments() {
        let mut post = Post {
            id: "p1".to_string(),
            created_at: None,
            title: "t".to_string(),
            slug: Slug::new("t"),
            description: String::new(),
            main_image: None,
            author: Default::default(),
            body: Vec::new(),
            comments: vec![
                comment("c1", "p1", true),
                comment("c2", "p1", false),
                comment("c3", "p2", true),
            ],
        };
        ModerationGate::apply(&mut post);
        let ids: Vec<_> = post.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);
    }

    #[test]
    fn test_query_string_encodes_params_as_json() {
        let query = Query::new("*[slug.current == $slug]").param("slug", "hello world");
        assert_eq!(
            query.to_query_string(),
            "query=%2A%5Bslug%2Ecurrent%20%3D%3D%20%24slug%5D&%24slug=%22hello%20world%22"
        );
    }
}
