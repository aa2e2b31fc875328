use actix_files::Files;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use log::{debug, info};
use snafu::ResultExt;

use crate::config::{self, get_config_element};
use crate::contexts::InMemoryContext;
use crate::error::{self, Result};
use crate::handlers::{self, ErrorResponse};

/// Starts the webserver for the agency API.
pub async fn start_server() -> Result<()> {
    let web_config: config::Web = get_config_element()?;
    let admin_config: config::Admin = get_config_element()?;
    let upload_config: config::Upload = get_config_element()?;

    info!("Starting server… {}", web_config.external_address()?);

    tokio::fs::create_dir_all(&upload_config.directory)
        .await
        .context(error::IoSnafu)?;

    let ctx = InMemoryContext::from_config()?;
    ctx.seed_admin(&admin_config.email, &admin_config.password)
        .await?;

    let wrapped_ctx = web::Data::new(ctx);

    HttpServer::new(move || {
        App::new()
            .app_data(wrapped_ctx.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_extractors)
            .configure(handlers::blog::init_blog_routes::<InMemoryContext>)
            .configure(handlers::portfolio::init_portfolio_routes::<InMemoryContext>)
            .configure(handlers::session::init_session_routes::<InMemoryContext>)
            .configure(handlers::upload::init_upload_routes::<InMemoryContext>)
            .service(Files::new("/files", upload_config.directory.clone()))
    })
    .bind(web_config.bind_address)
    .context(error::IoSnafu)?
    .run()
    .await
    .context(error::IoSnafu)
}

pub(crate) fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        match err {
            JsonPayloadError::ContentType => InternalError::from_response(
                err,
                HttpResponse::UnsupportedMediaType().json(ErrorResponse {
                    error: "UnsupportedMediaType".to_string(),
                    message: "Unsupported content type header.".to_string(),
                }),
            )
            .into(),
            JsonPayloadError::Overflow { limit } => InternalError::from_response(
                err,
                HttpResponse::PayloadTooLarge().json(ErrorResponse {
                    error: "Overflow".to_string(),
                    message: format!("JSON payload has exceeded limit ({limit} bytes)."),
                }),
            )
            .into(),
            JsonPayloadError::OverflowKnownLength { length, limit } => {
                InternalError::from_response(
                    err,
                    HttpResponse::PayloadTooLarge().json(ErrorResponse {
                        error: "Overflow".to_string(),
                        message: format!(
                            "JSON payload ({length} bytes) is larger than allowed (limit: {limit} bytes)."
                        ),
                    }),
                )
                .into()
            }
            JsonPayloadError::Payload(err) => ErrorResponse {
                error: "Payload".to_string(),
                message: err.to_string(),
            }
            .into(),
            JsonPayloadError::Deserialize(err) => ErrorResponse {
                error: "BodyDeserializeError".to_string(),
                message: err.to_string(),
            }
            .into(),
            JsonPayloadError::Serialize(err) => ErrorResponse {
                error: "BodySerializeError".to_string(),
                message: err.to_string(),
            }
            .into(),
            _ => {
                debug!("Unknown JsonPayloadError variant");
                ErrorResponse {
                    error: "UnknownError".to_string(),
                    message: "Unknown Error".to_string(),
                }
                .into()
            }
        }
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        match err {
            QueryPayloadError::Deserialize(err) => ErrorResponse {
                error: "UnableToParseQueryString".to_string(),
                message: format!("Unable to parse query string: {err}"),
            }
            .into(),
            _ => {
                debug!("Unknown QueryPayloadError variant");
                ErrorResponse {
                    error: "UnknownError".to_string(),
                    message: "Unknown Error".to_string(),
                }
                .into()
            }
        }
    }));
}
