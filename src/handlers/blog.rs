use actix_web::{web, HttpResponse, Responder};

use crate::content::blog::{AddBlogPost, BlogPost, BlogPostId};
use crate::content::db::{BlogDb, ContentListOptions};
use crate::contexts::Context;
use crate::error::{Error, Result};
use crate::users::session::AdminSession;
use crate::util::user_input::UserInput;

pub(crate) fn init_blog_routes<C>(cfg: &mut web::ServiceConfig)
where
    C: Context,
{
    cfg.service(
        web::resource("/blog")
            .route(web::get().to(list_blog_posts_handler::<C>))
            .route(web::post().to(add_blog_post_handler::<C>)),
    )
    .service(
        web::resource("/blog/{post}")
            .route(web::get().to(load_blog_post_handler::<C>))
            .route(web::put().to(update_blog_post_handler::<C>))
            .route(web::delete().to(remove_blog_post_handler::<C>)),
    );
}

/// Lists blog posts, newest first. Drafts are only included for admin
/// callers that request them.
pub(crate) async fn list_blog_posts_handler<C: Context>(
    session: Option<AdminSession>,
    ctx: web::Data<C>,
    options: web::Query<ContentListOptions>,
) -> Result<impl Responder> {
    let mut options = options.into_inner();
    options.include_unpublished &= session.is_some();

    let listing = ctx.blog_db_ref().await.list(options).await?;
    Ok(web::Json(listing))
}

/// Loads a single blog post. Drafts are hidden from non-admin callers.
///
/// # Errors
///
/// This call fails if there is no post with the given id.
pub(crate) async fn load_blog_post_handler<C: Context>(
    post: web::Path<BlogPostId>,
    session: Option<AdminSession>,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    let post = ctx.blog_db_ref().await.load(post.into_inner()).await?;

    if !post.published && session.is_none() {
        return Err(Error::UnknownBlogPostId);
    }

    Ok(web::Json(post))
}

/// Creates a blog post. Requires an admin session.
///
/// # Errors
///
/// This call fails if the payload is invalid.
pub(crate) async fn add_blog_post_handler<C: Context>(
    _session: AdminSession,
    ctx: web::Data<C>,
    add: web::Json<AddBlogPost>,
) -> Result<impl Responder> {
    let add = add.into_inner().validated()?;
    let post: BlogPost = ctx.blog_db_ref_mut().await.add(add).await?;
    Ok(web::Json(post))
}

/// Replaces the mutable fields of a blog post. Requires an admin session.
///
/// # Errors
///
/// This call fails if the payload is invalid or there is no post with the
/// given id.
pub(crate) async fn update_blog_post_handler<C: Context>(
    post: web::Path<BlogPostId>,
    _session: AdminSession,
    ctx: web::Data<C>,
    update: web::Json<AddBlogPost>,
) -> Result<impl Responder> {
    let update = update.into_inner().validated()?;
    let post = ctx
        .blog_db_ref_mut()
        .await
        .update(post.into_inner(), update)
        .await?;
    Ok(web::Json(post))
}

/// Deletes a blog post. Requires an admin session.
///
/// # Errors
///
/// This call fails if there is no post with the given id.
pub(crate) async fn remove_blog_post_handler<C: Context>(
    post: web::Path<BlogPostId>,
    _session: AdminSession,
    ctx: web::Data<C>,
) -> Result<impl Responder> {
    ctx.blog_db_ref_mut().await.remove(post.into_inner()).await?;
    Ok(HttpResponse::Ok())
}
