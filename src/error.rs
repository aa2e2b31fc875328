use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use snafu::Snafu;
use strum::IntoStaticStr;

use crate::handlers::ErrorResponse;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Registration failed: {reason}"))]
    RegistrationFailed {
        reason: String,
    },
    #[snafu(display("User does not exist or password is wrong."))]
    LoginFailed,
    LogoutFailed,
    #[snafu(display("The session id is invalid."))]
    InvalidSession,
    #[snafu(display("Header with authorization token not provided."))]
    MissingAuthorizationHeader,
    #[snafu(display("Authentication scheme must be Bearer."))]
    InvalidAuthorizationScheme,

    #[snafu(display("Authorization error: {source}"))]
    Authorization {
        source: Box<Error>,
    },

    #[snafu(display("Role lookup failed for user {user}"))]
    RoleLookupFailed {
        user: crate::users::UserId,
    },

    #[snafu(display("Validation failed: {reason}"))]
    ValidationFailed {
        reason: String,
    },

    #[snafu(display("There is no portfolio item with the given id."))]
    UnknownPortfolioItemId,
    #[snafu(display("There is no blog post with the given id."))]
    UnknownBlogPostId,

    #[snafu(display("A file part must provide a file name."))]
    UploadFieldMissingFileName,
    #[snafu(display("Only image uploads are accepted."))]
    UploadNotAnImage,
    #[snafu(display("Upload failed: {message}"))]
    Multipart {
        message: String,
    },

    #[snafu(display("Identifier does not have the right format."))]
    InvalidUuid,

    Io {
        source: std::io::Error,
    },
    SerdeJson {
        source: serde_json::Error,
    },
    Config {
        source: config::ConfigError,
    },
    ConfigLockFailed,
    MissingWorkingDirectory {
        source: std::io::Error,
    },
    MissingSettingsDirectory,
    UrlParse {
        source: url::ParseError,
    },
    TokioJoin {
        source: tokio::task::JoinError,
    },
}

impl From<actix_multipart::MultipartError> for Error {
    fn from(e: actix_multipart::MultipartError) -> Self {
        Self::Multipart {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::SerdeJson { source: e }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::UrlParse { source: e }
    }
}

impl actix_web::ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: Into::<&str>::into(self).to_string(),
            message: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::LoginFailed
            | Error::LogoutFailed
            | Error::InvalidSession
            | Error::MissingAuthorizationHeader
            | Error::InvalidAuthorizationScheme
            | Error::Authorization { .. }
            | Error::RoleLookupFailed { .. } => StatusCode::UNAUTHORIZED,

            Error::RegistrationFailed { .. }
            | Error::ValidationFailed { .. }
            | Error::UploadFieldMissingFileName
            | Error::UploadNotAnImage
            | Error::Multipart { .. }
            | Error::InvalidUuid => StatusCode::BAD_REQUEST,

            Error::UnknownPortfolioItemId | Error::UnknownBlogPostId => StatusCode::NOT_FOUND,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
