//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Tag sets are stored as
//! compact JSON arrays. UUIDs are stored as hyphenated lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use teake_core::{
  guy::Guy,
  story::{Story, Tag},
  user::{UserRecord, VerificationStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &BTreeSet<Tag>) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<BTreeSet<Tag>> {
  let names: Vec<String> = serde_json::from_str(s)?;
  names
    .iter()
    .map(|n| Tag::parse(n).map_err(Error::from))
    .collect()
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Case folding for the `*_folded` search columns. Must match the folding in
/// [`GuyQuery::matches`](teake_core::store::GuyQuery::matches).
pub fn fold_case(s: &str) -> String { s.to_lowercase() }

/// Build a `%needle%` pattern for `LIKE ... ESCAPE '\'` against a `*_folded`
/// column.
pub fn contains_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in fold_case(needle).chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const GUY_COLUMNS: &str =
  "guy_id, name, phone, socials, location, age, created_by_user_id, created_at";

/// Raw values read directly from a `guys` row.
pub struct RawGuy {
  pub guy_id:             String,
  pub name:               Option<String>,
  pub phone:              Option<String>,
  pub socials:            Option<String>,
  pub location:           Option<String>,
  pub age:                Option<u16>,
  pub created_by_user_id: String,
  pub created_at:         String,
}

impl RawGuy {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      guy_id:             row.get(0)?,
      name:               row.get(1)?,
      phone:              row.get(2)?,
      socials:            row.get(3)?,
      location:           row.get(4)?,
      age:                row.get(5)?,
      created_by_user_id: row.get(6)?,
      created_at:         row.get(7)?,
    })
  }

  pub fn into_guy(self) -> Result<Guy> {
    Ok(Guy {
      guy_id:             decode_uuid(&self.guy_id)?,
      name:               self.name,
      phone:              self.phone,
      socials:            self.socials,
      location:           self.location,
      age:                self.age,
      created_by_user_id: decode_uuid(&self.created_by_user_id)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub const STORY_COLUMNS: &str =
  "story_id, guy_id, user_id, text, tags, image_url, anonymous, nickname, created_at";

/// Raw values read directly from a `stories` row.
pub struct RawStory {
  pub story_id:   String,
  pub guy_id:     String,
  pub user_id:    String,
  pub text:       String,
  pub tags:       String,
  pub image_url:  Option<String>,
  pub anonymous:  bool,
  pub nickname:   Option<String>,
  pub created_at: String,
}

impl RawStory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      story_id:   row.get(0)?,
      guy_id:     row.get(1)?,
      user_id:    row.get(2)?,
      text:       row.get(3)?,
      tags:       row.get(4)?,
      image_url:  row.get(5)?,
      anonymous:  row.get(6)?,
      nickname:   row.get(7)?,
      created_at: row.get(8)?,
    })
  }

  pub fn into_story(self) -> Result<Story> {
    Ok(Story {
      story_id:   decode_uuid(&self.story_id)?,
      guy_id:     decode_uuid(&self.guy_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      text:       self.text,
      tags:       decode_tags(&self.tags)?,
      image_url:  self.image_url,
      anonymous:  self.anonymous,
      nickname:   self.nickname,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const USER_COLUMNS: &str =
  "user_id, email, nickname, verification_status, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:             String,
  pub email:               Option<String>,
  pub nickname:            String,
  pub verification_status: String,
  pub created_at:          String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:             row.get(0)?,
      email:               row.get(1)?,
      nickname:            row.get(2)?,
      verification_status: row.get(3)?,
      created_at:          row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:             decode_uuid(&self.user_id)?,
      email:               self.email,
      nickname:            self.nickname,
      verification_status: VerificationStatus::parse(&self.verification_status)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}
