//! Reader comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;

/// Document type name of comments in the store
pub const COMMENT_TYPE: &str = "comment";

/// A reference to another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
    #[serde(rename = "_ref")]
    pub target: String,
}

fn reference_type() -> String {
    "reference".to_string()
}

impl Reference {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            kind: reference_type(),
            target: target.into(),
        }
    }
}

/// A stored comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "nullable")]
    pub name: String,

    #[serde(default, deserialize_with = "nullable")]
    pub email: String,

    #[serde(default, deserialize_with = "nullable")]
    pub comment: String,

    /// Set by a moderator; a missing flag means not approved
    #[serde(default, deserialize_with = "nullable")]
    pub approved: bool,

    #[serde(default)]
    pub post: Option<Reference>,
}

impl Comment {
    /// Id of the post this comment belongs to
    pub fn post_id(&self) -> Option<&str> {
        self.post.as_ref().map(|r| r.target.as_str())
    }
}

/// A comment as submitted by a reader, before it is stored
///
/// The wire format is the one the comment form and `/api/createComment`
/// exchange: `{ "_id": <post id>, "name", "email", "comment" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(rename = "_id")]
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl NewComment {
    /// The document to create; new comments always start unapproved
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "_type": COMMENT_TYPE,
            "post": Reference::to(self.post_id.clone()),
            "name": self.name,
            "email": self.email,
            "comment": self.comment,
            "approved": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_document_is_unapproved() {
        let submission = NewComment {
            post_id: "post-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            comment: "Nice read".to_string(),
        };
        let doc = submission.to_document();
        assert_eq!(doc["_type"], "comment");
        assert_eq!(doc["approved"], false);
        assert_eq!(doc["post"]["_type"], "reference");
        assert_eq!(doc["post"]["_ref"], "post-1");
        assert_eq!(doc["comment"], "Nice read");
    }

    #[test]
    fn test_wire_format_uses_underscore_id() {
        let submission: NewComment = serde_json::from_str(
            r#"{"_id":"post-1","name":"Ada","email":"a@b.c","comment":"hi"}"#,
        )
        .unwrap();
        assert_eq!(submission.post_id, "post-1");
    }

    #[test]
    fn test_missing_approved_flag_means_unapproved() {
        let comment: Comment = serde_json::from_str(
            r#"{"_id":"c1","name":"Bob","comment":"hi","post":{"_ref":"post-1"}}"#,
        )
        .unwrap();
        assert!(!comment.approved);
        assert_eq!(comment.post_id(), Some("post-1"));

        let comment: Comment =
            serde_json::from_str(r#"{"_id":"c2","approved":null}"#).unwrap();
        assert!(!comment.approved);
        assert_eq!(comment.post_id(), None);
    }
}
