use pwhash::bcrypt;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error;
use crate::error::{Error, Result};
use crate::identifier;
use crate::util::identifiers::Identifier;
use crate::util::user_input::UserInput;

identifier!(UserId);

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Hash)]
pub struct UserRegistration {
    pub email: String,
    pub password: String,
}

impl UserInput for UserRegistration {
    fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.email.contains('@'),
            error::RegistrationFailedSnafu {
                reason: "Invalid e-mail address"
            }
        );

        ensure!(
            self.password.len() >= 8,
            error::RegistrationFailedSnafu {
                reason: "Password must have at least 8 characters"
            }
        );

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Hash)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
}

impl User {
    pub fn from_registration(registration: UserRegistration) -> Result<Self> {
        let password_hash = bcrypt::hash(&registration.password).map_err(|_error| {
            Error::RegistrationFailed {
                reason: "Unable to hash password".to_string(),
            }
        })?;

        Ok(Self {
            id: UserId::new(),
            email: registration.email,
            password_hash,
            active: true,
        })
    }
}
