use std::fmt;
use std::str::FromStr;

use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{self, Error, Result};
use crate::users::session::SessionId;

pub mod blog;
pub mod portfolio;
pub mod session;
pub mod upload;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    /// Assert that a `Response` has a certain `status` and `error` message.
    ///
    /// # Panics
    /// Panics if `status` or `error` do not match.
    ///
    pub async fn assert(res: ServiceResponse, status: u16, error: &str, message: &str) {
        assert_eq!(res.status(), status);

        let body: Self = test::read_body_json(res).await;
        assert_eq!(
            body,
            Self {
                error: error.to_string(),
                message: message.to_string(),
            }
        );
    }
}

impl actix_web::ResponseError for ErrorResponse {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, _f: &mut fmt::Formatter) -> fmt::Result {
        unimplemented!("required by ResponseError")
    }
}

/// Extracts the session token from the `Authorization: Bearer` header.
pub fn get_token(req: &HttpRequest) -> Result<SessionId> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(Error::MissingAuthorizationHeader)?;

    let scheme = header
        .to_str()
        .map_err(|_| Error::InvalidAuthorizationScheme)?;

    let token = scheme
        .strip_prefix("Bearer ")
        .ok_or(Error::InvalidAuthorizationScheme)?;

    SessionId::from_str(token)
        .map_err(Box::new)
        .context(error::AuthorizationSnafu)
}
