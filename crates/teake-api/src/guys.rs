//! Handlers for `/guys` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/guys` | `?name`, `?phone`, `?socials` (OR-combined), `?limit`, `?offset` |
//! | `GET`  | `/guys/:id` | 404 if not found |
//! | `GET`  | `/guys/:id/stories` | Newest first |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use teake_core::{
  phone::format_phone_number,
  store::{GuyQuery, ObjectStore, PostStore, UserStore},
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  views::{GuyView, StoryView},
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub name:    Option<String>,
  /// Any format; normalized before matching.
  pub phone:   Option<String>,
  pub socials: Option<String>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

impl SearchParams {
  fn into_query(self) -> GuyQuery {
    let mut query = GuyQuery::new();
    if let Some(name) = self.name {
      query = query.name_contains(name);
    }
    if let Some(phone) = self.phone {
      query = query.phone_equals(format_phone_number(&phone));
    }
    if let Some(socials) = self.socials {
      query = query.socials_contains(socials);
    }
    query.limit = self.limit;
    query.offset = self.offset;
    query
  }
}

/// `GET /guys?name=...&phone=...&socials=...`
pub async fn search<S, O>(
  State(state): State<AppState<S, O>>,
  _user: CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GuyView>>, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  let query = params.into_query();
  if query.is_empty() {
    return Err(ApiError::BadRequest(
      "provide at least one of name, phone or socials".to_owned(),
    ));
  }

  let guys = state
    .store
    .search_guys(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(guys.into_iter().map(GuyView::from).collect()))
}

/// `GET /guys/:id`
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<GuyView>, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  let guy = state
    .store
    .get_guy(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("guy {id} not found")))?;
  Ok(Json(GuyView::from(guy)))
}

/// `GET /guys/:id/stories`
pub async fn stories<S, O>(
  State(state): State<AppState<S, O>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoryView>>, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  if state.store.get_guy(id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("guy {id} not found")));
  }

  let stories = state
    .store
    .list_stories_for_guy(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stories.into_iter().map(StoryView::from).collect()))
}
