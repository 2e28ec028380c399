//! JSON REST API for TeaKE.
//!
//! Exposes an axum [`Router`] backed by any record store implementing
//! [`PostStore`] and [`UserStore`], and any [`ObjectStore`] for images. TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", teake_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod guys;
pub mod posts;
pub mod stories;
pub mod views;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use teake_core::store::{ObjectStore, PostStore, UserStore};
use teake_post::PostService;

pub use error::ApiError;

/// Largest accepted story image upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, O> {
  pub posts:       PostService<S, O>,
  pub store:       Arc<S>,
  /// Accounts with this email may review verifications.
  pub admin_email: Arc<str>,
}

impl<S, O> Clone for AppState<S, O> {
  fn clone(&self) -> Self {
    Self {
      posts:       self.posts.clone(),
      store:       Arc::clone(&self.store),
      admin_email: Arc::clone(&self.admin_email),
    }
  }
}

impl<S, O> AppState<S, O>
where
  S: PostStore + UserStore,
  O: ObjectStore,
{
  /// Share the service's store with the handlers that bypass the workflow.
  pub fn new(posts: PostService<S, O>, admin_email: impl Into<Arc<str>>) -> Self {
    let store = Arc::clone(posts.store());
    Self { posts, store, admin_email: admin_email.into() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, O>(state: AppState<S, O>) -> Router<()>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  Router::new()
    // Posts
    .route("/posts", post(posts::create::<S, O>))
    // Stories
    .route("/stories/{id}", get(stories::get_one::<S, O>))
    .route(
      "/stories/{id}/image",
      post(stories::upload_image::<S, O>).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
    )
    // Guys
    .route("/guys", get(guys::search::<S, O>))
    .route("/guys/{id}", get(guys::get_one::<S, O>))
    .route("/guys/{id}/stories", get(guys::stories::<S, O>))
    // Admin
    .route(
      "/admin/users/{id}/verification",
      put(admin::set_verification::<S, O>),
    )
    .with_state(state)
}
