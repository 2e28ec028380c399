//! Handlers for `/stories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stories/:id` | 404 if not found |
//! | `POST` | `/stories/:id/image` | Raw image bytes; author only; returns `{"url": ...}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use serde_json::json;
use teake_core::store::{ObjectStore, PostStore, UserStore};
use teake_post::{ImageSource, UploadError};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError, views::StoryView};

/// `GET /stories/:id`
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  let story = state
    .store
    .get_story(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("story {id} not found")))?;
  Ok(Json(StoryView::from(story)))
}

/// `POST /stories/:id/image`: uploads the body and attaches the URL to the
/// story. 400 on an empty body, 409 on a name collision.
pub async fn upload_image<S, O>(
  State(state): State<AppState<S, O>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  let story = state
    .store
    .get_story(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("story {id} not found")))?;

  if story.user_id != user.user_id {
    return Err(ApiError::Forbidden(
      "only the author can add an image to a story".to_owned(),
    ));
  }

  let url = state
    .posts
    .upload_story_image(ImageSource::Bytes(body.to_vec()), id)
    .await
    .map_err(|e| match e {
      UploadError::EmptyImage | UploadError::Decode(_) => {
        ApiError::BadRequest(e.to_string())
      }
      UploadError::Collision(_) => ApiError::Conflict(e.to_string()),
      UploadError::Read { .. } | UploadError::Storage(_) => ApiError::store(e),
    })?;

  state
    .posts
    .attach_story_image(id, url.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("story {id} not found")))?;

  Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}
