//! Users as seen by the post workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Identity verification state of an account. Only [`Approved`] accounts may
/// post.
///
/// [`Approved`]: VerificationStatus::Approved
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
  Approved,
  Pending,
  Rejected,
  /// No ID has been uploaded yet.
  #[default]
  Unset,
}

impl VerificationStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownVerificationStatus(s.to_owned()))
  }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub user_id:             Uuid,
  pub email:               Option<String>,
  /// Shown on non-anonymous stories when the author gives no nickname.
  pub nickname:            String,
  pub verification_status: VerificationStatus,
  pub created_at:          DateTime<Utc>,
}

/// Input for [`UserStore::create_user`](crate::store::UserStore::create_user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  pub email:    Option<String>,
  pub nickname: String,
}

/// True if `email` is the configured admin address (case-insensitive).
pub fn is_user_admin(email: Option<&str>, admin_email: &str) -> bool {
  match email {
    Some(e) if !e.is_empty() => e.to_lowercase() == admin_email.to_lowercase(),
    _ => false,
  }
}
