//! [`FsObjectStore`], the filesystem implementation of [`ObjectStore`].

use std::{
  io::ErrorKind,
  path::{Component, Path, PathBuf},
};

use teake_core::store::{ObjectStore, ObjectStoreError, UploadOptions};
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{Error, Result};

/// Stores objects under `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
  root:            PathBuf,
  public_base_url: String,
}

impl FsObjectStore {
  /// `public_base_url` is the URL at which `root` is served, e.g.
  /// `http://localhost:8080/objects`.
  pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
    Self {
      root:            root.into(),
      public_base_url: public_base_url.into(),
    }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `bucket`/`path` to a location below the root, rejecting
  /// anything that could escape it.
  fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
    let mut out = self.root.clone();
    for part in [bucket, path] {
      let rel = Path::new(part);
      if part.is_empty() || part.contains('\\') {
        return Err(Error::InvalidPath(format!("{bucket}/{path}")));
      }
      for component in rel.components() {
        match component {
          Component::Normal(c) => out.push(c),
          _ => return Err(Error::InvalidPath(format!("{bucket}/{path}"))),
        }
      }
    }
    Ok(out)
  }

  async fn write(
    &self,
    bucket: &str,
    path: &str,
    body: &[u8],
    upsert: bool,
  ) -> Result<()> {
    let target = self.object_path(bucket, path)?;
    let io_err = |source| Error::Io { path: target.clone(), source };

    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    if upsert {
      return fs::write(&target, body).await.map_err(io_err);
    }

    // `create_new` makes the existence check and the create one atomic step.
    let mut file = match fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&target)
      .await
    {
      Ok(f) => f,
      Err(e) if e.kind() == ErrorKind::AlreadyExists => {
        return Err(Error::AlreadyExists {
          bucket: bucket.to_owned(),
          path:   path.to_owned(),
        });
      }
      Err(e) => return Err(io_err(e)),
    };

    let written = async {
      file.write_all(body).await?;
      file.sync_all().await
    }
    .await;

    if let Err(e) = written {
      drop(file);
      let _ = fs::remove_file(&target).await;
      return Err(io_err(e));
    }
    Ok(())
  }
}

impl ObjectStore for FsObjectStore {
  async fn upload(
    &self,
    bucket: &str,
    path: &str,
    body: Vec<u8>,
    options: UploadOptions,
  ) -> Result<String, ObjectStoreError> {
    self.write(bucket, path, &body, options.upsert).await?;
    Ok(path.to_owned())
  }

  fn public_url(&self, bucket: &str, path: &str) -> String {
    format!(
      "{}/{bucket}/{path}",
      self.public_base_url.trim_end_matches('/')
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn jpeg() -> UploadOptions {
    UploadOptions { content_type: "image/jpeg".into(), upsert: false }
  }

  fn store(dir: &tempfile::TempDir) -> FsObjectStore {
    FsObjectStore::new(dir.path(), "http://localhost:8080/objects/")
  }

  #[tokio::test]
  async fn upload_writes_file_and_returns_path() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    let path = s
      .upload("story-images", "stories/a.jpg", vec![1, 2, 3], jpeg())
      .await
      .unwrap();
    assert_eq!(path, "stories/a.jpg");

    let bytes = std::fs::read(dir.path().join("story-images/stories/a.jpg")).unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn second_upload_to_same_path_fails_without_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    s.upload("story-images", "stories/a.jpg", vec![1], jpeg()).await.unwrap();
    let second = s
      .upload("story-images", "stories/a.jpg", vec![2], jpeg())
      .await;
    assert!(matches!(second, Err(ObjectStoreError::AlreadyExists { .. })));

    let bytes = std::fs::read(dir.path().join("story-images/stories/a.jpg")).unwrap();
    assert_eq!(bytes, vec![1], "original object must be untouched");
  }

  #[tokio::test]
  async fn upsert_replaces() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);
    let upsert = UploadOptions { upsert: true, ..jpeg() };

    s.upload("b", "x.jpg", vec![1], upsert.clone()).await.unwrap();
    s.upload("b", "x.jpg", vec![2], upsert).await.unwrap();
    assert_eq!(std::fs::read(dir.path().join("b/x.jpg")).unwrap(), vec![2]);
  }

  #[tokio::test]
  async fn traversal_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    for (bucket, path) in [("b", "../escape.jpg"), ("..", "x.jpg"), ("b", "/abs.jpg"), ("b", "")] {
      let result = s.upload(bucket, path, vec![1], jpeg()).await;
      assert!(
        matches!(result, Err(ObjectStoreError::InvalidPath(_))),
        "{bucket}/{path} should be rejected"
      );
    }
  }

  #[test]
  fn public_url_joins_base_bucket_and_path() {
    let s = FsObjectStore::new("/tmp/unused", "http://localhost:8080/objects/");
    assert_eq!(
      s.public_url("story-images", "stories/a.jpg"),
      "http://localhost:8080/objects/story-images/stories/a.jpg"
    );
  }
}
