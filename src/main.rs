use agency_services::config::{self, get_config_element};
use agency_services::error::Result;
use agency_services::server::start_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let logging_config: config::Logging = get_config_element()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&logging_config.log_spec).expect("to have a valid log spec"),
        )
        .init();

    start_server().await
}
