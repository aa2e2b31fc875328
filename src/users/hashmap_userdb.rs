use std::collections::HashMap;

use async_trait::async_trait;
use pwhash::bcrypt;
use snafu::ensure;
use tokio::sync::broadcast;

use crate::config;
use crate::error;
use crate::error::Result;
use crate::users::session::{SessionId, UserInfo, UserSession};
use crate::users::user::{User, UserCredentials, UserId, UserRegistration};
use crate::users::userdb::{SessionChange, UserDb};
use crate::util::user_input::Validated;
use crate::util::Identifier;

const SESSION_CHANGE_CAPACITY: usize = 16;

pub struct HashMapUserDb {
    users: HashMap<String, User>,
    sessions: HashMap<SessionId, UserSession>,
    session_changes: broadcast::Sender<SessionChange>,
}

impl Default for HashMapUserDb {
    fn default() -> Self {
        let (session_changes, _) = broadcast::channel(SESSION_CHANGE_CAPACITY);
        Self {
            users: HashMap::new(),
            sessions: HashMap::new(),
            session_changes,
        }
    }
}

#[async_trait]
impl UserDb for HashMapUserDb {
    /// Register a user
    async fn register(&mut self, user_registration: Validated<UserRegistration>) -> Result<UserId> {
        let user_registration = user_registration.user_input;
        ensure!(
            !self.users.contains_key(&user_registration.email),
            error::RegistrationFailedSnafu {
                reason: "E-mail already exists"
            }
        );

        let user = User::from_registration(user_registration)?;
        let id = user.id;
        self.users.insert(user.email.clone(), user);
        Ok(id)
    }

    /// Log user in
    async fn login(&mut self, credentials: UserCredentials) -> Result<UserSession> {
        match self.users.get(&credentials.email) {
            Some(user) if bcrypt::verify(credentials.password, &user.password_hash) => {
                let validity_minutes = config::get_config_element::<config::Session>()
                    .map(|session| session.validity_minutes)
                    .unwrap_or(60);

                let session = UserSession {
                    id: SessionId::new(),
                    user: UserInfo {
                        id: user.id,
                        email: Some(user.email.clone()),
                    },
                    created: chrono::Utc::now(),
                    valid_until: chrono::Utc::now() + chrono::Duration::minutes(validity_minutes),
                };

                self.sessions.insert(session.id, session.clone());
                let _ = self.session_changes.send(Some(session.clone()));
                Ok(session)
            }
            _ => Err(error::Error::LoginFailed),
        }
    }

    /// Log user out
    async fn logout(&mut self, session: SessionId) -> Result<()> {
        match self.sessions.remove(&session) {
            Some(_) => {
                let _ = self.session_changes.send(None);
                Ok(())
            }
            None => Err(error::Error::LogoutFailed),
        }
    }

    async fn session(&self, session: SessionId) -> Result<UserSession> {
        match self.sessions.get(&session) {
            Some(session) if session.is_valid_at(chrono::Utc::now()) => Ok(session.clone()),
            _ => Err(error::Error::InvalidSession),
        }
    }

    fn session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.session_changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::user_input::UserInput;

    fn registration() -> Validated<UserRegistration> {
        UserRegistration {
            email: "foo@agency.example".into(),
            password: "secret123".into(),
        }
        .validated()
        .unwrap()
    }

    #[tokio::test]
    async fn register() {
        let mut user_db = HashMapUserDb::default();

        assert!(user_db.register(registration()).await.is_ok());
    }

    #[tokio::test]
    async fn register_duplicate_email_fails() {
        let mut user_db = HashMapUserDb::default();

        assert!(user_db.register(registration()).await.is_ok());
        assert!(user_db.register(registration()).await.is_err());
    }

    #[tokio::test]
    async fn login() {
        let mut user_db = HashMapUserDb::default();

        assert!(user_db.register(registration()).await.is_ok());

        let credentials = UserCredentials {
            email: "foo@agency.example".into(),
            password: "secret123".into(),
        };

        assert!(user_db.login(credentials).await.is_ok());
    }

    #[tokio::test]
    async fn login_wrong_password_is_rejected() {
        let mut user_db = HashMapUserDb::default();

        assert!(user_db.register(registration()).await.is_ok());

        let credentials = UserCredentials {
            email: "foo@agency.example".into(),
            password: "wrong password".into(),
        };

        assert!(matches!(
            user_db.login(credentials).await,
            Err(error::Error::LoginFailed)
        ));
    }

    #[tokio::test]
    async fn logout() {
        let mut user_db = HashMapUserDb::default();

        assert!(user_db.register(registration()).await.is_ok());

        let session = user_db
            .login(UserCredentials {
                email: "foo@agency.example".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();

        assert!(user_db.logout(session.id).await.is_ok());
        assert!(user_db.session(session.id).await.is_err());
    }

    #[tokio::test]
    async fn session_changes_fire_on_login_and_logout() {
        let mut user_db = HashMapUserDb::default();
        let mut changes = user_db.session_changes();

        assert!(user_db.register(registration()).await.is_ok());

        let session = user_db
            .login(UserCredentials {
                email: "foo@agency.example".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();

        assert_eq!(changes.recv().await.unwrap(), Some(session.clone()));

        user_db.logout(session.id).await.unwrap();

        assert_eq!(changes.recv().await.unwrap(), None);
    }
}
