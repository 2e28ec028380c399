//! Error types for `teake-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown tag: {0:?}")]
  UnknownTag(String),

  #[error("unknown verification status: {0:?}")]
  UnknownVerificationStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
