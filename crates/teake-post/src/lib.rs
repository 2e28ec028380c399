//! The TeaKE post-submission workflow.
//!
//! [`PostService`] turns a submitted story into a persisted guy and story
//! ([`PostService::add_post`]) and stores story images
//! ([`PostService::upload_story_image`]). Storage, object storage and the
//! clock are injected; the caller's session is passed per call.

pub mod error;
pub mod post;
pub mod service;
pub mod upload;

pub use error::{PostError, Unverified, UploadError};
pub use post::{CreatePostData, CreatedPost, PostResponse};
pub use service::{PostService, UploadConfig};
pub use upload::ImageSource;

#[cfg(test)]
mod tests;
