//! Handler for `POST /posts`.
//!
//! Body: [`CreatePostData`] (camelCase JSON). The response is always a
//! [`PostResponse`], including for bodies that fail to parse; the status code
//! tells why a submission failed.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use teake_core::{
  session::SessionProvider,
  store::{ObjectStore, PostStore, UserStore},
};
use teake_post::{CreatePostData, CreatedPost, PostError, PostResponse, Unverified};

use crate::{AppState, auth::BearerSession};

type PostReply = (StatusCode, Json<PostResponse>);

fn status_for(e: &PostError) -> StatusCode {
  match e {
    PostError::NotAuthenticated => StatusCode::UNAUTHORIZED,
    PostError::NotVerified(_) => StatusCode::FORBIDDEN,
    e if e.is_validation() => StatusCode::BAD_REQUEST,
    _ => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn reply(result: Result<CreatedPost, PostError>) -> PostReply {
  let status = match &result {
    Ok(_) => StatusCode::CREATED,
    Err(e) => {
      let status = status_for(e);
      if status.is_server_error() {
        tracing::error!(error = ?e, "error creating post");
      }
      status
    }
  };
  (status, Json(PostResponse::from(result)))
}

/// `POST /posts`: 201 + `{success, postId, guyId}` on success.
pub async fn create<S, O>(
  State(state): State<AppState<S, O>>,
  session: BearerSession<S>,
  body: Result<Json<CreatePostData>, JsonRejection>,
) -> PostReply
where
  S: PostStore + UserStore + 'static,
  O: ObjectStore + 'static,
{
  match body {
    Ok(Json(data)) => reply(state.posts.try_add_post(&session, data).await),
    Err(rejection) => rejected_body(&session, rejection).await,
  }
}

/// Session and verification checks still come before the body error.
async fn rejected_body<S: UserStore>(
  session: &BearerSession<S>,
  rejection: JsonRejection,
) -> PostReply {
  match session.current_user().await {
    Ok(None) => reply(Err(PostError::NotAuthenticated)),
    Ok(Some(user)) => match Unverified::from_status(user.verification_status) {
      Some(reason) => reply(Err(PostError::NotVerified(reason))),
      None => {
        tracing::info!(reason = %rejection.body_text(), "post body rejected");
        (
          StatusCode::BAD_REQUEST,
          Json(PostResponse::failed(rejection.body_text())),
        )
      }
    },
    Err(e) => reply(Err(PostError::Unexpected(Box::new(e)))),
  }
}
