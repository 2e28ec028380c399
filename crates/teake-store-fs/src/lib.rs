//! Directory-backed object storage for story images.
//!
//! Each bucket is a subdirectory of the store root. Objects are served by
//! whatever sits in front of that directory; the store only knows the public
//! base URL.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FsObjectStore;
