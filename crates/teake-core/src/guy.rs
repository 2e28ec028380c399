//! The guy: the subject a story is about.
//!
//! Guys are created lazily the first time a post describes someone who does
//! not match an existing record. The post workflow never updates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted subject record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guy {
  pub guy_id:             Uuid,
  pub name:               Option<String>,
  /// Always stored in canonical form, see [`crate::phone::format_phone_number`].
  pub phone:              Option<String>,
  pub socials:            Option<String>,
  pub location:           Option<String>,
  pub age:                Option<u16>,
  pub created_by_user_id: Uuid,
  pub created_at:         DateTime<Utc>,
}

/// Input for [`PostStore::insert_guy`](crate::store::PostStore::insert_guy).
/// The id and creation timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuy {
  pub name:               Option<String>,
  pub phone:              Option<String>,
  pub socials:            Option<String>,
  pub location:           Option<String>,
  pub age:                Option<u16>,
  pub created_by_user_id: Uuid,
}

impl NewGuy {
  /// True if at least one of name, phone or socials carries a value.
  pub fn has_identifier(&self) -> bool {
    [&self.name, &self.phone, &self.socials]
      .into_iter()
      .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
  }
}
