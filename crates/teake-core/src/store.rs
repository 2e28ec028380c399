//! Storage traits and the guy search query.
//!
//! Traits are implemented by storage backends (`teake-store-sqlite`,
//! `teake-store-fs`). Higher layers (`teake-post`, `teake-api`) depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::{
  guy::{Guy, NewGuy},
  story::{NewStory, Story},
  user::{NewUser, UserRecord, VerificationStatus},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`PostStore::search_guys`].
///
/// Criteria are OR-combined: a guy matches if any present criterion matches.
/// Blank criteria are never added, so a query built from absent fields has no
/// criteria at all and matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuyQuery {
  /// Case-insensitive substring of the guy's name.
  pub name_contains:    Option<String>,
  /// Exact match on the canonical phone form.
  pub phone_equals:     Option<String>,
  /// Case-insensitive substring of the guy's socials.
  pub socials_contains: Option<String>,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}

impl GuyQuery {
  pub fn new() -> Self { Self::default() }

  pub fn name_contains(mut self, name: impl Into<String>) -> Self {
    self.name_contains = non_blank(name.into());
    self
  }

  /// `phone` must already be in canonical form.
  pub fn phone_equals(mut self, phone: impl Into<String>) -> Self {
    self.phone_equals = non_blank(phone.into());
    self
  }

  pub fn socials_contains(mut self, socials: impl Into<String>) -> Self {
    self.socials_contains = non_blank(socials.into());
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  /// True if the query carries no criteria.
  pub fn is_empty(&self) -> bool {
    self.name_contains.is_none()
      && self.phone_equals.is_none()
      && self.socials_contains.is_none()
  }

  /// Evaluate the query against a single guy. Backends that filter in SQL
  /// must agree with this.
  pub fn matches(&self, guy: &Guy) -> bool {
    let contains = |field: &Option<String>, needle: &str| {
      field
        .as_deref()
        .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
    };

    self
      .name_contains
      .as_deref()
      .is_some_and(|n| contains(&guy.name, n))
      || self
        .phone_equals
        .as_deref()
        .is_some_and(|p| guy.phone.as_deref() == Some(p))
      || self
        .socials_contains
        .as_deref()
        .is_some_and(|s| contains(&guy.socials, s))
  }
}

fn non_blank(s: String) -> Option<String> {
  if s.trim().is_empty() { None } else { Some(s) }
}

// ─── Record storage ──────────────────────────────────────────────────────────

/// Abstraction over guy and story storage.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Guys ──────────────────────────────────────────────────────────────

  /// Guys matching `query`, in insertion order. An empty query returns no
  /// guys.
  fn search_guys<'a>(
    &'a self,
    query: &'a GuyQuery,
  ) -> impl Future<Output = Result<Vec<Guy>, Self::Error>> + Send + 'a;

  fn insert_guy(
    &self,
    input: NewGuy,
  ) -> impl Future<Output = Result<Guy, Self::Error>> + Send + '_;

  /// Remove a guy. Only used to undo a guy created by a failed submission.
  /// Returns `false` if no such guy existed.
  fn delete_guy(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_guy(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Guy>, Self::Error>> + Send + '_;

  // ── Stories ───────────────────────────────────────────────────────────

  fn insert_story(
    &self,
    input: NewStory,
  ) -> impl Future<Output = Result<Story, Self::Error>> + Send + '_;

  fn get_story(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;

  /// All stories about a guy, newest first.
  fn list_stories_for_guy(
    &self,
    guy_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Story>, Self::Error>> + Send + '_;

  /// Record an uploaded image on an existing story. Returns `None` if the
  /// story does not exist.
  fn set_story_image(
    &self,
    story_id: Uuid,
    image_url: String,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;
}

/// Abstraction over user accounts and their session tokens.
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Returns `None` if the user does not exist.
  fn set_verification(
    &self,
    id: Uuid,
    status: VerificationStatus,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Bind a session token digest to a user. Raw tokens are never stored.
  fn insert_session(
    &self,
    token_digest: String,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn user_for_session<'a>(
    &'a self,
    token_digest: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;
}

// ─── Object storage ──────────────────────────────────────────────────────────

/// Failures reported by an [`ObjectStore`].
#[derive(Debug, Error)]
pub enum ObjectStoreError {
  /// The target path is taken and the upload did not allow overwriting.
  #[error("object already exists: {bucket}/{path}")]
  AlreadyExists { bucket: String, path: String },

  #[error("invalid object path: {0:?}")]
  InvalidPath(String),

  #[error("object storage failed: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Options for [`ObjectStore::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
  pub content_type: String,
  /// Replace an existing object at the same path.
  pub upsert:       bool,
}

/// Binary object storage with public URLs.
pub trait ObjectStore: Send + Sync {
  /// Store `body` at `path` inside `bucket` and return the stored path.
  fn upload<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a str,
    body: Vec<u8>,
    options: UploadOptions,
  ) -> impl Future<Output = Result<String, ObjectStoreError>> + Send + 'a;

  /// The publicly resolvable URL of a stored object.
  fn public_url(&self, bucket: &str, path: &str) -> String;
}
