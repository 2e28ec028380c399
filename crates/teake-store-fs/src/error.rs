//! Error type for `teake-store-fs`.

use std::path::PathBuf;

use teake_core::store::ObjectStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error at {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("object already exists: {bucket}/{path}")]
  AlreadyExists { bucket: String, path: String },

  #[error("invalid object path: {0:?}")]
  InvalidPath(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for ObjectStoreError {
  fn from(e: Error) -> Self {
    match e {
      Error::AlreadyExists { bucket, path } => {
        ObjectStoreError::AlreadyExists { bucket, path }
      }
      Error::InvalidPath(p) => ObjectStoreError::InvalidPath(p),
      other => ObjectStoreError::Backend(Box::new(other)),
    }
  }
}
