//! Verification review.
//!
//! `PUT /admin/users/:id/verification` with `{"status":"approved"}`. Only the
//! account whose email matches the configured admin email may call it.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use teake_core::{
  store::{ObjectStore, PostStore, UserStore},
  user::{UserRecord, VerificationStatus, is_user_admin},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct VerificationBody {
  pub status: VerificationStatus,
}

/// `PUT /admin/users/:id/verification`
pub async fn set_verification<S, O>(
  State(state): State<AppState<S, O>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<VerificationBody>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  if !is_user_admin(caller.email.as_deref(), &state.admin_email) {
    return Err(ApiError::Forbidden("admin access required".to_owned()));
  }

  let user = state
    .store
    .set_verification(id, body.status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

  tracing::info!(user_id = %id, status = %body.status, "verification status updated");
  Ok(Json(user))
}
