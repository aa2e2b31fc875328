use actix_multipart::Multipart;
use actix_web::{web, Responder};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::blobs::BlobStore;
use crate::contexts::Context;
use crate::error::{Error, Result};
use crate::users::session::AdminSession;

pub(crate) fn init_upload_routes<C>(cfg: &mut web::ServiceConfig)
where
    C: Context,
{
    cfg.service(web::resource("/upload").route(web::post().to(upload_handler::<C>)));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: Url,
}

/// Uploads an image and returns its public URL. Requires an admin session.
/// The stored file gets a random name; only the extension of the original
/// file name is kept.
///
/// # Errors
///
/// This call fails if no file part is present or the part is not an image.
pub(crate) async fn upload_handler<C: Context>(
    _session: AdminSession,
    ctx: web::Data<C>,
    mut body: Multipart,
) -> Result<impl Responder> {
    let field = body.next().await.ok_or(Error::UploadFieldMissingFileName)?;
    let mut field = field?;

    let file_name = field
        .content_disposition()
        .and_then(|disposition| disposition.get_filename())
        .ok_or(Error::UploadFieldMissingFileName)?
        .to_owned();

    let is_image = field
        .content_type()
        .is_some_and(|content_type| content_type.type_() == mime::IMAGE);
    if !is_image {
        return Err(Error::UploadNotAnImage);
    }

    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        bytes.extend_from_slice(&chunk?);
    }

    let url = ctx.blob_store().put(&file_name, &bytes).await?;

    Ok(web::Json(UploadResponse { url }))
}
