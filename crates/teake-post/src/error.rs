//! Workflow error types.
//!
//! The `Display` form of a [`PostError`] is the message shown to the user.

use teake_core::{store::ObjectStoreError, user::VerificationStatus};
use thiserror::Error;

/// Shown when a storage error carries no message of its own.
pub const STORAGE_FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Shown for any failure that is not one of the expected outcomes.
pub const UNEXPECTED_MESSAGE: &str = "Failed to create post. Please try again.";

/// Why a submission was refused or failed.
#[derive(Debug, Error)]
pub enum PostError {
  #[error("You must be logged in to create a post")]
  NotAuthenticated,

  #[error("{0}")]
  NotVerified(Unverified),

  #[error("Story text is required")]
  EmptyStoryText,

  #[error("At least one tag is required")]
  NoTags,

  #[error("Please provide at least the guy's name, phone, or social handle")]
  NoGuyIdentifier,

  /// A storage write failed; carries the backend's message.
  #[error("{0}")]
  Storage(String),

  #[error("{}", UNEXPECTED_MESSAGE)]
  Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PostError {
  /// Wrap a storage error, keeping its message for the user.
  pub fn storage(e: &(dyn std::error::Error + 'static)) -> Self {
    let message = e.to_string();
    if message.trim().is_empty() {
      Self::Storage(STORAGE_FALLBACK_MESSAGE.to_owned())
    } else {
      Self::Storage(message)
    }
  }

  /// True for failures caused by the submitted data rather than the caller or
  /// the backend.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::EmptyStoryText | Self::NoTags | Self::NoGuyIdentifier
    )
  }
}

/// A verification state that does not allow posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unverified {
  #[error("Your verification is still pending. Please wait for approval.")]
  Pending,
  #[error("Your verification was rejected. Please re-upload your ID.")]
  Rejected,
  #[error("Please verify your identity by uploading your ID to post stories.")]
  NoId,
}

impl Unverified {
  /// `None` for [`VerificationStatus::Approved`].
  pub fn from_status(status: VerificationStatus) -> Option<Self> {
    match status {
      VerificationStatus::Approved => None,
      VerificationStatus::Pending => Some(Self::Pending),
      VerificationStatus::Rejected => Some(Self::Rejected),
      VerificationStatus::Unset => Some(Self::NoId),
    }
  }
}

/// Why a story image upload failed.
#[derive(Debug, Error)]
pub enum UploadError {
  #[error("failed to read image {reference}: {source}")]
  Read {
    reference: String,
    #[source]
    source:    std::io::Error,
  },

  #[error("failed to decode image data: {0}")]
  Decode(String),

  #[error("image is empty")]
  EmptyImage,

  /// An object already exists under the generated name.
  #[error("an image already exists at {0}")]
  Collision(String),

  #[error("image upload failed: {0}")]
  Storage(#[source] ObjectStoreError),
}
