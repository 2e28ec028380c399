//! Stories and their tag vocabulary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// The fixed set of categories a story can be tagged with.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tag {
  RedFlag,
  GreenFlag,
  Ghosting,
  Cheating,
  LoveBombing,
  Catfish,
  Manipulative,
  Aggressive,
  Respectful,
  GoodCommunicator,
}

impl Tag {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownTag(s.to_owned()))
  }
}

/// A persisted story about a guy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
  pub story_id:   Uuid,
  pub guy_id:     Uuid,
  pub user_id:    Uuid,
  pub text:       String,
  pub tags:       BTreeSet<Tag>,
  pub image_url:  Option<String>,
  pub anonymous:  bool,
  /// `None` whenever `anonymous` is set.
  pub nickname:   Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input for [`PostStore::insert_story`](crate::store::PostStore::insert_story).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
  pub guy_id:    Uuid,
  pub user_id:   Uuid,
  pub text:      String,
  pub tags:      BTreeSet<Tag>,
  pub image_url: Option<String>,
  pub anonymous: bool,
  pub nickname:  Option<String>,
}
