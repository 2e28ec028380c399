//! Bearer-token sessions.
//!
//! Clients send `Authorization: Bearer <token>`. Tokens are random 32-byte
//! values, hex encoded; the store only ever sees their SHA-256 digest.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use teake_core::{
  session::SessionProvider,
  store::{ObjectStore, PostStore, UserStore},
  user::UserRecord,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// A fresh, unguessable session token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The form in which a token is stored.
pub fn digest_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Create a session for `user_id` and return the raw token. The token is not
/// recoverable afterwards.
pub async fn issue_session<S: UserStore>(
  store: &S,
  user_id: Uuid,
) -> Result<String, S::Error> {
  let token = generate_token();
  store.insert_session(digest_token(&token), user_id).await?;
  Ok(token)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Session provider ─────────────────────────────────────────────────────────

/// The session of the current request. Resolving the user is deferred to
/// [`SessionProvider::current_user`], so a missing or unknown token is not a
/// rejection by itself.
pub struct BearerSession<S> {
  store:        Arc<S>,
  token_digest: Option<String>,
}

impl<S: UserStore> SessionProvider for BearerSession<S> {
  type Error = <S as UserStore>::Error;

  async fn current_user(&self) -> Result<Option<UserRecord>, Self::Error> {
    match &self.token_digest {
      Some(digest) => self.store.user_for_session(digest).await,
      None => Ok(None),
    }
  }
}

impl<S, O> FromRequestParts<AppState<S, O>> for BearerSession<S>
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    Ok(BearerSession {
      store:        Arc::clone(&state.store),
      token_digest: bearer_token(&parts.headers).map(digest_token),
    })
  }
}

// ─── Required user ────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a valid session.
pub struct CurrentUser(pub UserRecord);

impl<S, O> FromRequestParts<AppState<S, O>> for CurrentUser
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    let Some(token) = bearer_token(&parts.headers) else {
      return Err(ApiError::Unauthorized);
    };
    state
      .store
      .user_for_session(&digest_token(token))
      .await
      .map_err(ApiError::store)?
      .map(CurrentUser)
      .ok_or(ApiError::Unauthorized)
  }
}
