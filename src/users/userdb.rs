use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::users::session::{SessionId, UserSession};
use crate::users::user::{UserCredentials, UserId, UserRegistration};
use crate::util::user_input::Validated;

/// Pushed on sign-in, sign-out and session expiry. `None` means the
/// process is anonymous from now on.
pub type SessionChange = Option<UserSession>;

#[async_trait]
pub trait UserDb: Send + Sync {
    /// Registers a user by providing `UserRegistration` parameters
    ///
    /// # Errors
    ///
    /// This call fails if the `UserRegistration` is invalid.
    ///
    async fn register(&mut self, user: Validated<UserRegistration>) -> Result<UserId>;

    /// Creates a `UserSession` by providing `UserCredentials`
    ///
    /// # Errors
    ///
    /// This call fails if the `UserCredentials` are invalid.
    ///
    async fn login(&mut self, credentials: UserCredentials) -> Result<UserSession>;

    /// Removes a session from the `UserDb`
    ///
    /// # Errors
    ///
    /// This call fails if the session is invalid.
    ///
    async fn logout(&mut self, session: SessionId) -> Result<()>;

    /// Restores the `UserSession` behind a session id
    ///
    /// # Errors
    ///
    /// This call fails if the session is unknown or expired.
    ///
    async fn session(&self, session: SessionId) -> Result<UserSession>;

    /// Subscribes to the provider's session-change notifications.
    /// Fires on login and logout, in no guaranteed order relative to
    /// one-shot [`UserDb::session`] queries.
    fn session_changes(&self) -> broadcast::Receiver<SessionChange>;
}
