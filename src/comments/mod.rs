//! Reader comment submission
//!
//! A page view moves through [`FormState::Form`] → [`FormState::Submitting`] →
//! [`FormState::Thanked`]. Submitting hands the comment to a detached task and
//! moves straight on to `Thanked`: the reader is never told whether the write
//! succeeded, failures only reach the log.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::content::NewComment;
use crate::store::ContentStore;

/// A required form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Comment,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::Comment];

    pub fn name(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Comment => "comment",
        }
    }
}

/// Raw values as posted by the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentFields {
    #[serde(rename = "_id", default)]
    pub post_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

impl CommentFields {
    pub fn for_post(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            ..Self::default()
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Comment => &self.comment,
        }
    }

    /// Fields left empty or blank
    pub fn missing(&self) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.value(*f).trim().is_empty())
            .collect()
    }

    /// Trimmed comment, or the set of missing fields
    pub fn into_comment(self) -> Result<NewComment, BTreeSet<Field>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(NewComment {
            post_id: self.post_id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            comment: self.comment.trim().to_string(),
        })
    }
}

/// Where a comment form stands for one page view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Waiting for input; `errors` marks required fields left empty
    Form {
        values: CommentFields,
        errors: BTreeSet<Field>,
    },
    /// Validated and about to be written
    Submitting(NewComment),
    /// Terminal until the page is loaded again
    Thanked,
}

impl FormState {
    /// A blank form for a post
    pub fn new(post_id: impl Into<String>) -> Self {
        FormState::Form {
            values: CommentFields::for_post(post_id),
            errors: BTreeSet::new(),
        }
    }

    /// Validate submitted values
    pub fn submit(values: CommentFields) -> Self {
        match values.clone().into_comment() {
            Ok(comment) => FormState::Submitting(comment),
            Err(errors) => FormState::Form { values, errors },
        }
    }

    /// Start the write for a `Submitting` form and move to `Thanked`
    ///
    /// Other states are returned unchanged with no task.
    pub fn dispatch(self, writer: &CommentWriter) -> (Self, Option<JoinHandle<()>>) {
        match self {
            FormState::Submitting(comment) => {
                let handle = writer.spawn(comment);
                (FormState::Thanked, Some(handle))
            }
            other => (other, None),
        }
    }

    pub fn is_thanked(&self) -> bool {
        matches!(self, FormState::Thanked)
    }

    /// Fields currently marked as required
    pub fn errors(&self) -> BTreeSet<Field> {
        match self {
            FormState::Form { errors, .. } => errors.clone(),
            _ => BTreeSet::new(),
        }
    }
}

/// Fire-and-forget comment writes
#[derive(Clone)]
pub struct CommentWriter {
    store: Arc<dyn ContentStore>,
}

impl CommentWriter {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Write in the background; the outcome is only logged
    pub fn spawn(&self, comment: NewComment) -> JoinHandle<()> {
        let store = self.store.clone();
        let span = tracing::info_span!("create_comment", post_id = %comment.post_id);
        tokio::spawn(
            async move {
                match store.create_comment(&comment).await {
                    Ok(()) => tracing::info!("Comment stored, awaiting approval"),
                    Err(e) => tracing::error!(error = %e, "Failed to store comment"),
                }
            }
            .instrument(span),
        )
    }
}
