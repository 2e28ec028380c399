//! The session seam: who is calling.
//!
//! Authentication itself happens elsewhere (an OAuth identity provider). The
//! post workflow only asks the current session for its user.

use std::{convert::Infallible, future::Future};

use crate::user::UserRecord;

/// Resolves the user behind the current session.
pub trait SessionProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The logged-in user, or `None` if the session is anonymous.
  fn current_user(
    &self,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;
}

/// An already-resolved session.
impl SessionProvider for Option<UserRecord> {
  type Error = Infallible;

  async fn current_user(&self) -> Result<Option<UserRecord>, Self::Error> {
    Ok(self.clone())
  }
}
