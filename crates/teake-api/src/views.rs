//! Public read models.
//!
//! Stories are published anonymously or under a nickname, so views never
//! carry the author's or the guy's creator's account id.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use teake_core::{
  guy::Guy,
  story::{Story, Tag},
};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct GuyView {
  pub guy_id:     Uuid,
  pub name:       Option<String>,
  pub phone:      Option<String>,
  pub socials:    Option<String>,
  pub location:   Option<String>,
  pub age:        Option<u16>,
  pub created_at: DateTime<Utc>,
}

impl From<Guy> for GuyView {
  fn from(g: Guy) -> Self {
    Self {
      guy_id:     g.guy_id,
      name:       g.name,
      phone:      g.phone,
      socials:    g.socials,
      location:   g.location,
      age:        g.age,
      created_at: g.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
  pub story_id:   Uuid,
  pub guy_id:     Uuid,
  pub text:       String,
  pub tags:       BTreeSet<Tag>,
  pub image_url:  Option<String>,
  pub anonymous:  bool,
  pub nickname:   Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<Story> for StoryView {
  fn from(s: Story) -> Self {
    Self {
      story_id:   s.story_id,
      guy_id:     s.guy_id,
      text:       s.text,
      tags:       s.tags,
      image_url:  s.image_url,
      anonymous:  s.anonymous,
      nickname:   s.nickname,
      created_at: s.created_at,
    }
  }
}
