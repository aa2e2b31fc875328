use actix_web::{web, HttpResponse, Responder};

use crate::content::db::{ContentListOptions, PortfolioDb};
use crate::content::portfolio::{AddPortfolioItem, PortfolioItem, PortfolioItemId};
use crate::contexts::Context;
use crate::error::{Error, Result};
use crate::users::session::AdminSession;
use crate::util::user_input::UserInput;

pub(crate) fn init_portfolio_routes<C>(cfg: &mut web::ServiceConfig)
where
    C: Context,
{
    cfg.service(
        web::resource("/portfolio")
            .route(web::get().to(list_portfolio_items_handler::<C>))
            .route(web::post().to(add_portfolio_item_handler::<C>)),
    )
    .service(
        web::resource("/portfolio/{item}")
            .route(web::get().to(load_portfolio_item_handler::<C>))
            .route(web::put().to(update_portfolio_item_handler::<C>))
            .route(web::delete().to(remove_portfolio_item_handler::<C>)),
    );
}

/// Lists portfolio items, newest first. Drafts are only included for
/// admin callers that request them.
pub(crate) async fn list_portfolio_items_handler<C: Context>(
    session: Option<AdminSession>,
    ctx: web::Data<C>,
    options: web::Query<ContentListOptions>,
) -> Result<impl Responder> {
    let mut options = options.into_inner();
    options.include_unpublished &= session.is_some();

    let listing = ctx.portfolio_db_ref().await.list(options).await?;
    Ok(web::Json(listing))
}

/// Loads a single portfolio item. Drafts are hidden from non-admin callers.
///
/// # Errors
///
/// This call fails if there is no item with the given id.
pub(crate) async fn load_portfolio_item_handler<C: Context>(
    item: web::Path<PortfolioItemId>,
    session: Option<AdminSession>,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    let item = ctx
        .portfolio_db_ref()
        .await
        .load(item.into_inner())
        .await?;

    if !item.published && session.is_none() {
        return Err(Error::UnknownPortfolioItemId);
    }

    Ok(web::Json(item))
}

/// Creates a portfolio item. Requires an admin session.
///
/// # Errors
///
/// This call fails if the payload is invalid.
pub(crate) async fn add_portfolio_item_handler<C: Context>(
    _session: AdminSession,
    ctx: web::Data<C>,
    add: web::Json<AddPortfolioItem>,
) -> Result<impl Responder> {
    let add = add.into_inner().validated()?;
    let item: PortfolioItem = ctx.portfolio_db_ref_mut().await.add(add).await?;
    Ok(web::Json(item))
}

/// Replaces the mutable fields of a portfolio item. Requires an admin
/// session.
///
/// # Errors
///
/// This call fails if the payload is invalid or there is no item with the
/// given id.
pub(crate) async fn update_portfolio_item_handler<C: Context>(
    item: web::Path<PortfolioItemId>,
    _session: AdminSession,
    ctx: web::Data<C>,
    update: web::Json<AddPortfolioItem>,
) -> Result<impl Responder> {
    let update = update.into_inner().validated()?;
    let item = ctx
        .portfolio_db_ref_mut()
        .await
        .update(item.into_inner(), update)
        .await?;
    Ok(web::Json(item))
}

/// Deletes a portfolio item. Requires an admin session.
///
/// # Errors
///
/// This call fails if there is no item with the given id.
pub(crate) async fn remove_portfolio_item_handler<C: Context>(
    item: web::Path<PortfolioItemId>,
    _session: AdminSession,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    ctx.portfolio_db_ref_mut()
        .await
        .remove(item.into_inner())
        .await?;
    Ok(HttpResponse::Ok())
}
