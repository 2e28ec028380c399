//! Story image upload.
//!
//! Uploads never overwrite: every upload gets a fresh name derived from the
//! story id and the current time, and the object store is asked to refuse an
//! existing path. Uploading is not linked to story creation; the URL is
//! attached to the story with a separate write.

use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use teake_core::{
  store::{ObjectStore, ObjectStoreError, PostStore, UploadOptions},
  story::Story,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{PostService, UploadError};

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
  /// A local file.
  Path(PathBuf),
  /// A `data:<mime>;base64,<payload>` URI.
  DataUri(String),
  /// Bytes already in memory.
  Bytes(Vec<u8>),
}

impl ImageSource {
  /// Interpret an image reference as handed over by the app: a data URI, a
  /// `file://` URI, or a plain path.
  pub fn from_reference(reference: &str) -> Self {
    if reference.starts_with("data:") {
      Self::DataUri(reference.to_owned())
    } else if let Some(path) = reference.strip_prefix("file://") {
      Self::Path(PathBuf::from(path))
    } else {
      Self::Path(PathBuf::from(reference))
    }
  }

  /// Read the whole image into memory.
  pub async fn read(self) -> Result<Vec<u8>, UploadError> {
    match self {
      Self::Bytes(bytes) => Ok(bytes),
      Self::Path(path) => tokio::fs::read(&path).await.map_err(|source| {
        UploadError::Read { reference: path.display().to_string(), source }
      }),
      Self::DataUri(uri) => decode_data_uri(&uri),
    }
  }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, UploadError> {
  let (header, payload) = uri
    .strip_prefix("data:")
    .and_then(|rest| rest.split_once(','))
    .ok_or_else(|| UploadError::Decode("malformed data URI".to_owned()))?;

  if !header.ends_with(";base64") {
    return Err(UploadError::Decode("data URI is not base64-encoded".to_owned()));
  }

  let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
  B64
    .decode(compact)
    .map_err(|e| UploadError::Decode(e.to_string()))
}

impl<S, O> PostService<S, O>
where
  S: PostStore,
  O: ObjectStore,
{
  /// Store an image for `story_id` and return its public URL.
  pub async fn upload_story_image(
    &self,
    source: ImageSource,
    story_id: Uuid,
  ) -> Result<String, UploadError> {
    info!(%story_id, "starting story image upload");
    self
      .try_upload(source, story_id)
      .await
      .inspect(|url| info!(%story_id, %url, "story image uploaded"))
      .inspect_err(|e| error!(%story_id, error = %e, "story image upload failed"))
  }

  /// Like [`upload_story_image`](Self::upload_story_image), for callers that
  /// only care whether a URL came back.
  pub async fn upload_story_image_url(
    &self,
    source: ImageSource,
    story_id: Uuid,
  ) -> Option<String> {
    self.upload_story_image(source, story_id).await.ok()
  }

  /// Record an uploaded image URL on a story. Returns `None` if the story
  /// does not exist.
  pub async fn attach_story_image(
    &self,
    story_id: Uuid,
    image_url: String,
  ) -> Result<Option<Story>, S::Error> {
    self.store.set_story_image(story_id, image_url).await
  }

  /// The object path for a new upload. Unique per story and millisecond.
  pub fn story_image_path(&self, story_id: Uuid) -> String {
    let millis = self.clock.utc().timestamp_millis();
    format!(
      "{}/story-{story_id}-{millis}.{}",
      self.upload.folder, self.upload.extension
    )
  }

  async fn try_upload(
    &self,
    source: ImageSource,
    story_id: Uuid,
  ) -> Result<String, UploadError> {
    let bytes = source.read().await?;
    if bytes.is_empty() {
      return Err(UploadError::EmptyImage);
    }

    let path = self.story_image_path(story_id);
    let options = UploadOptions {
      content_type: self.upload.content_type.clone(),
      upsert:       false,
    };

    let stored = self
      .objects
      .upload(&self.upload.bucket, &path, bytes, options)
      .await
      .map_err(|e| match e {
        ObjectStoreError::AlreadyExists { .. } => UploadError::Collision(path.clone()),
        other => UploadError::Storage(other),
      })?;

    Ok(self.objects.public_url(&self.upload.bucket, &stored))
  }
}
