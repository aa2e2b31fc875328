use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::{err, LocalBoxFuture};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::contexts::{Context, InMemoryContext};
use crate::error;
use crate::handlers::get_token;
use crate::identifier;

identifier!(SessionId);

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Hash)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: super::UserId,
    pub email: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: SessionId,
    pub user: UserInfo,
    pub created: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl UserSession {
    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        self.valid_until > instant
    }
}

impl FromRequest for UserSession {
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = match get_token(req) {
            Ok(token) => token,
            Err(error) => return Box::pin(err(error)),
        };
        let ctx = req
            .app_data::<web::Data<InMemoryContext>>()
            .expect("InMemoryContext must be available")
            .get_ref()
            .clone();
        async move { ctx.session_by_id(token).await }.boxed_local()
    }
}

/// A session whose user holds the admin role. Extraction fails closed:
/// a failing or timed-out role lookup yields an authorization error.
#[derive(Debug, Clone)]
pub struct AdminSession(pub UserSession);

impl FromRequest for AdminSession {
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session_future = UserSession::from_request(req, payload);
        let ctx = req
            .app_data::<web::Data<InMemoryContext>>()
            .expect("InMemoryContext must be available")
            .get_ref()
            .clone();
        async move {
            let session = session_future.await?;
            if ctx.is_admin(session.user.id).await {
                Ok(AdminSession(session))
            } else {
                Err(error::Error::Authorization {
                    source: Box::new(error::Error::RoleLookupFailed {
                        user: session.user.id,
                    }),
                })
            }
        }
        .boxed_local()
    }
}
