use actix_web::{web, HttpResponse, Responder};
use snafu::ResultExt;

use crate::contexts::Context;
use crate::error::{self, Result};
use crate::users::session::UserSession;
use crate::users::user::UserCredentials;
use crate::users::userdb::UserDb;

pub(crate) fn init_session_routes<C>(cfg: &mut web::ServiceConfig)
where
    C: Context,
{
    cfg.service(web::resource("/login").route(web::post().to(login_handler::<C>)))
        .service(web::resource("/logout").route(web::post().to(logout_handler::<C>)))
        .service(web::resource("/session").route(web::get().to(session_handler)));
}

/// Creates a session by providing user credentials. The session's id serves
/// as a Bearer token for subsequent requests.
///
/// # Errors
///
/// This call fails if the credentials do not match an active account.
pub(crate) async fn login_handler<C: Context>(
    credentials: web::Json<UserCredentials>,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    let session = ctx
        .user_db_ref_mut()
        .await
        .login(credentials.into_inner())
        .await
        .map_err(Box::new)
        .context(error::AuthorizationSnafu)?;
    Ok(web::Json(session))
}

/// Ends the session belonging to the Bearer token.
///
/// # Errors
///
/// This call fails if the session is invalid.
pub(crate) async fn logout_handler<C: Context>(
    session: UserSession,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    ctx.user_db_ref_mut().await.logout(session.id).await?;
    Ok(HttpResponse::Ok())
}

/// Retrieves details about the current session.
///
/// # Errors
///
/// This call fails if the session is invalid.
#[allow(clippy::unused_async)] // the function signature of request handlers requires it
pub(crate) async fn session_handler(session: UserSession) -> impl Responder {
    web::Json(session)
}
