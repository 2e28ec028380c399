//! Story submission: authenticate, validate, resolve or create the guy, then
//! create the story.
//!
//! The guy insert and the story insert are two separate writes. If the story
//! insert fails after this call created the guy, the guy is deleted again.
//! Between those two writes a concurrent submission may match the new guy and
//! attach its own story to it; the compensating delete then fails on the
//! foreign key and the guy is kept, which is the correct outcome.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use teake_core::{
  guy::NewGuy,
  phone::format_phone_number,
  session::SessionProvider,
  store::{GuyQuery, ObjectStore, PostStore},
  story::{NewStory, Tag},
  user::UserRecord,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{PostError, PostService, Unverified};

// ─── Input / output ──────────────────────────────────────────────────────────

/// A story as submitted by the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostData {
  pub guy_name:     Option<String>,
  pub guy_phone:    Option<String>,
  pub guy_socials:  Option<String>,
  pub guy_location: Option<String>,
  pub guy_age:      Option<u16>,
  pub story_text:   String,
  #[serde(default)]
  pub tags:         BTreeSet<Tag>,
  pub image_url:    Option<String>,
  #[serde(default)]
  pub anonymous:    bool,
  pub nickname:     Option<String>,
}

/// Identities of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedPost {
  pub post_id: Uuid,
  pub guy_id:  Uuid,
}

/// The workflow's result as reported to the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub guy_id:  Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

impl From<Result<CreatedPost, PostError>> for PostResponse {
  fn from(result: Result<CreatedPost, PostError>) -> Self {
    match result {
      Ok(created) => Self {
        success: true,
        post_id: Some(created.post_id),
        guy_id:  Some(created.guy_id),
        error:   None,
      },
      Err(e) => Self::failed(e.to_string()),
    }
  }
}

impl PostResponse {
  /// A failure carrying `message` for the user.
  pub fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      post_id: None,
      guy_id:  None,
      error:   Some(message.into()),
    }
  }
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Submitted guy fields with blanks removed and the phone canonicalised.
struct GuyFields {
  name:     Option<String>,
  phone:    Option<String>,
  socials:  Option<String>,
  location: Option<String>,
  age:      Option<u16>,
}

impl GuyFields {
  fn has_identifier(&self) -> bool {
    self.name.is_some() || self.phone.is_some() || self.socials.is_some()
  }

  fn query(&self) -> GuyQuery {
    let mut query = GuyQuery::new().limit(1);
    if let Some(name) = &self.name {
      query = query.name_contains(name.as_str());
    }
    if let Some(phone) = &self.phone {
      query = query.phone_equals(phone.as_str());
    }
    if let Some(socials) = &self.socials {
      query = query.socials_contains(socials.as_str());
    }
    query
  }
}

/// The guy a story will be linked to.
struct ResolvedGuy {
  guy_id:  Uuid,
  /// Created by this submission, so it must be removed if the story fails.
  created: bool,
}

fn present(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

impl<S, O> PostService<S, O>
where
  S: PostStore,
  O: ObjectStore,
{
  /// Submit a story. Never fails: every error is reported in the response.
  pub async fn add_post<P>(&self, session: &P, data: CreatePostData) -> PostResponse
  where
    P: SessionProvider,
  {
    let result = self.try_add_post(session, data).await;
    if let Err(e) = &result {
      match e {
        PostError::Storage(_) | PostError::Unexpected(_) => {
          error!(error = ?e, "error creating post");
        }
        _ => info!(reason = %e, "post rejected"),
      }
    }
    PostResponse::from(result)
  }

  /// Submit a story, returning the typed error on failure.
  pub async fn try_add_post<P>(
    &self,
    session: &P,
    data: CreatePostData,
  ) -> Result<CreatedPost, PostError>
  where
    P: SessionProvider,
  {
    let user = session
      .current_user()
      .await
      .map_err(|e| PostError::Unexpected(Box::new(e)))?
      .ok_or(PostError::NotAuthenticated)?;

    if let Some(reason) = Unverified::from_status(user.verification_status) {
      return Err(PostError::NotVerified(reason));
    }

    let text = data.story_text.trim();
    if text.is_empty() {
      return Err(PostError::EmptyStoryText);
    }

    if data.tags.is_empty() {
      return Err(PostError::NoTags);
    }

    let fields = GuyFields {
      name:     present(data.guy_name),
      phone:    present(data.guy_phone).map(|p| format_phone_number(&p)),
      socials:  present(data.guy_socials),
      location: present(data.guy_location),
      age:      data.guy_age,
    };
    if !fields.has_identifier() {
      return Err(PostError::NoGuyIdentifier);
    }

    let guy = self.resolve_guy(&user, fields).await?;

    let nickname = if data.anonymous {
      None
    } else {
      present(data.nickname).or_else(|| Some(user.nickname.clone()))
    };

    let story = NewStory {
      guy_id: guy.guy_id,
      user_id: user.user_id,
      text: text.to_owned(),
      tags: data.tags,
      image_url: present(data.image_url),
      anonymous: data.anonymous,
      nickname,
    };

    match self.store.insert_story(story).await {
      Ok(story) => Ok(CreatedPost { post_id: story.story_id, guy_id: guy.guy_id }),
      Err(e) => {
        if guy.created {
          self.remove_orphaned_guy(guy.guy_id).await;
        }
        Err(PostError::storage(&e))
      }
    }
  }

  /// Reuse the first guy matching any supplied identifier, or create one.
  /// A failed search is treated as "no match".
  async fn resolve_guy(
    &self,
    user: &UserRecord,
    fields: GuyFields,
  ) -> Result<ResolvedGuy, PostError> {
    let query = fields.query();
    match self.store.search_guys(&query).await {
      Ok(guys) => {
        if let Some(existing) = guys.into_iter().next() {
          return Ok(ResolvedGuy { guy_id: existing.guy_id, created: false });
        }
      }
      Err(e) => warn!(error = %e, "guy search failed, creating a new guy"),
    }

    let guy = self
      .store
      .insert_guy(NewGuy {
        name:               fields.name,
        phone:              fields.phone,
        socials:            fields.socials,
        location:           fields.location,
        age:                fields.age,
        created_by_user_id: user.user_id,
      })
      .await
      .map_err(|e| PostError::storage(&e))?;

    Ok(ResolvedGuy { guy_id: guy.guy_id, created: true })
  }

  async fn remove_orphaned_guy(&self, guy_id: Uuid) {
    match self.store.delete_guy(guy_id).await {
      Ok(true) => info!(%guy_id, "removed guy created by failed post"),
      Ok(false) => warn!(%guy_id, "guy created by failed post was already gone"),
      Err(e) => warn!(%guy_id, error = %e, "failed to remove guy created by failed post"),
    }
  }
}
