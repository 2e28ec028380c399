//! [`SqliteStore`], the SQLite implementation of [`PostStore`] and
//! [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use teake_core::{
  guy::{Guy, NewGuy},
  store::{GuyQuery, PostStore, UserStore},
  story::{NewStory, Story},
  user::{NewUser, UserRecord, VerificationStatus},
};

use crate::{
  Result,
  encode::{
    GUY_COLUMNS, RawGuy, RawStory, RawUser, STORY_COLUMNS, USER_COLUMNS,
    contains_pattern, encode_dt, encode_tags, encode_uuid, fold_case,
  },
  error::Error,
  schema::SCHEMA,
};

const DEFAULT_SEARCH_LIMIT: usize = 100;

/// SQLite reads a negative `LIMIT` as "no limit", so saturate instead of
/// wrapping.
fn to_sql_count(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A TeaKE record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = Error;

  // ── Guys ──────────────────────────────────────────────────────────────────

  async fn search_guys(&self, query: &GuyQuery) -> Result<Vec<Guy>> {
    if query.is_empty() {
      return Ok(Vec::new());
    }

    let name_pattern    = query.name_contains.as_deref().map(contains_pattern);
    let phone           = query.phone_equals.clone();
    let socials_pattern = query.socials_contains.as_deref().map(contains_pattern);
    let limit_val       = to_sql_count(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
    let offset_val      = to_sql_count(query.offset.unwrap_or(0));

    let raws: Vec<RawGuy> = self
      .conn
      .call(move |conn| {
        // Only present criteria are OR-ed together.
        let mut conds: Vec<&'static str> = vec![];
        if name_pattern.is_some() {
          conds.push("name_folded LIKE ?1 ESCAPE '\\'");
        }
        if phone.is_some() {
          conds.push("phone = ?2");
        }
        if socials_pattern.is_some() {
          conds.push("socials_folded LIKE ?3 ESCAPE '\\'");
        }

        let sql = format!(
          "SELECT {GUY_COLUMNS} FROM guys
           WHERE {}
           ORDER BY seq
           LIMIT ?4 OFFSET ?5",
          conds.join(" OR ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              name_pattern.as_deref(),
              phone.as_deref(),
              socials_pattern.as_deref(),
              limit_val,
              offset_val,
            ],
            RawGuy::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGuy::into_guy).collect()
  }

  async fn insert_guy(&self, input: NewGuy) -> Result<Guy> {
    let guy = Guy {
      guy_id:             Uuid::new_v4(),
      name:               input.name,
      phone:              input.phone,
      socials:            input.socials,
      location:           input.location,
      age:                input.age,
      created_by_user_id: input.created_by_user_id,
      created_at:         Utc::now(),
    };

    let id_str         = encode_uuid(guy.guy_id);
    let creator_str    = encode_uuid(guy.created_by_user_id);
    let at_str         = encode_dt(guy.created_at);
    let name           = guy.name.clone();
    let phone          = guy.phone.clone();
    let socials        = guy.socials.clone();
    let name_folded    = guy.name.as_deref().map(fold_case);
    let socials_folded = guy.socials.as_deref().map(fold_case);
    let location       = guy.location.clone();
    let age            = guy.age;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO guys (
             guy_id, name, phone, socials, location, age,
             created_by_user_id, created_at, name_folded, socials_folded
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            name,
            phone,
            socials,
            location,
            age,
            creator_str,
            at_str,
            name_folded,
            socials_folded,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(guy)
  }

  async fn delete_guy(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM guys WHERE guy_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn get_guy(&self, id: Uuid) -> Result<Option<Guy>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGuy> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {GUY_COLUMNS} FROM guys WHERE guy_id = ?1"),
            rusqlite::params![id_str],
            RawGuy::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGuy::into_guy).transpose()
  }

  // ── Stories ───────────────────────────────────────────────────────────────

  async fn insert_story(&self, input: NewStory) -> Result<Story> {
    let story = Story {
      story_id:   Uuid::new_v4(),
      guy_id:     input.guy_id,
      user_id:    input.user_id,
      text:       input.text,
      tags:       input.tags,
      image_url:  input.image_url,
      anonymous:  input.anonymous,
      nickname:   input.nickname,
      created_at: Utc::now(),
    };

    let story_id_str = encode_uuid(story.story_id);
    let guy_id_str   = encode_uuid(story.guy_id);
    let user_id_str  = encode_uuid(story.user_id);
    let tags_str     = encode_tags(&story.tags)?;
    let at_str       = encode_dt(story.created_at);
    let text         = story.text.clone();
    let image_url    = story.image_url.clone();
    let anonymous    = story.anonymous;
    let nickname     = story.nickname.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO stories (
             story_id, guy_id, user_id, text, tags,
             image_url, anonymous, nickname, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            story_id_str,
            guy_id_str,
            user_id_str,
            text,
            tags_str,
            image_url,
            anonymous,
            nickname,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(story)
  }

  async fn get_story(&self, id: Uuid) -> Result<Option<Story>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStory> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_id = ?1"),
            rusqlite::params![id_str],
            RawStory::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStory::into_story).transpose()
  }

  async fn list_stories_for_guy(&self, guy_id: Uuid) -> Result<Vec<Story>> {
    let id_str = encode_uuid(guy_id);

    let raws: Vec<RawStory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STORY_COLUMNS} FROM stories
           WHERE guy_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawStory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStory::into_story).collect()
  }

  async fn set_story_image(
    &self,
    story_id:  Uuid,
    image_url: String,
  ) -> Result<Option<Story>> {
    let id_str = encode_uuid(story_id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE stories SET image_url = ?2 WHERE story_id = ?1",
          rusqlite::params![id_str, image_url],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_story(story_id).await
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser) -> Result<UserRecord> {
    let user = UserRecord {
      user_id:             Uuid::new_v4(),
      email:               input.email,
      nickname:            input.nickname,
      verification_status: VerificationStatus::Unset,
      created_at:          Utc::now(),
    };

    let id_str     = encode_uuid(user.user_id);
    let email      = user.email.clone();
    let nickname   = user.nickname.clone();
    let status_str = user.verification_status.as_str();
    let at_str     = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, nickname, verification_status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, nickname, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn set_verification(
    &self,
    id:     Uuid,
    status: VerificationStatus,
  ) -> Result<Option<UserRecord>> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_str();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET verification_status = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn insert_session(&self, token_digest: String, user_id: Uuid) -> Result<()> {
    if self.get_user(user_id).await?.is_none() {
      return Err(Error::UserNotFound(user_id));
    }

    let user_id_str = encode_uuid(user_id);
    let at_str      = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_digest, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_digest, user_id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_for_session(&self, token_digest: &str) -> Result<Option<UserRecord>> {
    let digest = token_digest.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.email, u.nickname, u.verification_status, u.created_at
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token_digest = ?1",
            rusqlite::params![digest],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}
