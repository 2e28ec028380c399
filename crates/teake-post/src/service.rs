//! [`PostService`] construction and collaborators.

use std::sync::Arc;

use mockable::Clock;
use teake_core::store::{ObjectStore, PostStore};

/// Where story images are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
  pub bucket:       String,
  /// Folder prefix inside the bucket.
  pub folder:       String,
  pub content_type: String,
  pub extension:    String,
}

impl Default for UploadConfig {
  fn default() -> Self {
    Self {
      bucket:       "story-images".to_owned(),
      folder:       "stories".to_owned(),
      content_type: "image/jpeg".to_owned(),
      extension:    "jpg".to_owned(),
    }
  }
}

/// The post-submission workflow, bound to its storage backends.
///
/// Cheap to clone; every collaborator is behind an `Arc`.
pub struct PostService<S, O> {
  pub(crate) store:   Arc<S>,
  pub(crate) objects: Arc<O>,
  pub(crate) clock:   Arc<dyn Clock + Send + Sync>,
  pub(crate) upload:  UploadConfig,
}

impl<S, O> Clone for PostService<S, O> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      objects: Arc::clone(&self.objects),
      clock:   Arc::clone(&self.clock),
      upload:  self.upload.clone(),
    }
  }
}

impl<S, O> PostService<S, O>
where
  S: PostStore,
  O: ObjectStore,
{
  pub fn new(
    store: Arc<S>,
    objects: Arc<O>,
    clock: Arc<dyn Clock + Send + Sync>,
  ) -> Self {
    Self { store, objects, clock, upload: UploadConfig::default() }
  }

  pub fn with_upload_config(mut self, upload: UploadConfig) -> Self {
    self.upload = upload;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }
}
