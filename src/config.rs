use crate::error::{self, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use snafu::ResultExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{LazyLock, RwLock};
use url::Url;

static SETTINGS: LazyLock<RwLock<Config>> = LazyLock::new(init_settings);

fn init_settings() -> RwLock<Config> {
    let mut settings = Config::builder();

    let dir: PathBuf = retrieve_settings_dir().expect("settings directory should exist");

    #[cfg(test)]
    let files = ["Settings-default.toml", "Settings-test.toml"];

    #[cfg(not(test))]
    let files = ["Settings-default.toml", "Settings.toml"];

    let files: Vec<File<_, _>> = files
        .iter()
        .map(|f| dir.join(f))
        .filter(|p| p.exists())
        .map(File::from)
        .collect();

    settings = settings.add_source(files);

    // Override config with environment variables that start with `AGENCY__`,
    // e.g. `AGENCY__WEB__BIND_ADDRESS=127.0.0.1:8080`.
    // Groups are separated with double underscores because the keys
    // themselves contain underscores.
    settings = settings.add_source(Environment::with_prefix("agency").separator("__"));

    RwLock::new(
        settings
            .build()
            .expect("it should crash the program if this fails"),
    )
}

/// test may run in subdirectory
#[cfg(test)]
fn retrieve_settings_dir() -> Result<PathBuf> {
    use crate::error::Error;

    const MAX_PARENT_DIRS: usize = 1;

    let mut settings_dir = std::env::current_dir().context(error::MissingWorkingDirectorySnafu)?;

    for _ in 0..=MAX_PARENT_DIRS {
        if settings_dir.join("Settings-default.toml").exists() {
            return Ok(settings_dir);
        }

        // go to parent directory
        if !settings_dir.pop() {
            break;
        }
    }

    Err(Error::MissingSettingsDirectory)
}

#[cfg(not(test))]
fn retrieve_settings_dir() -> Result<PathBuf> {
    std::env::current_dir().context(error::MissingWorkingDirectorySnafu)
}

#[cfg(test)]
pub fn set_config<T>(key: &str, value: T) -> Result<()>
where
    T: Into<config::Value>,
{
    let mut settings = SETTINGS
        .write()
        .map_err(|_error| error::Error::ConfigLockFailed)?;

    let builder = Config::builder()
        .add_source(settings.clone())
        .set_override(key, value)
        .context(error::ConfigSnafu)?;

    *settings = builder.build().context(error::ConfigSnafu)?;
    Ok(())
}

pub fn get_config<'a, T>(key: &str) -> Result<T>
where
    T: Deserialize<'a>,
{
    SETTINGS
        .read()
        .map_err(|_error| error::Error::ConfigLockFailed)?
        .get::<T>(key)
        .context(error::ConfigSnafu)
}

pub fn get_config_element<'a, T>() -> Result<T>
where
    T: ConfigElement + Deserialize<'a>,
{
    get_config(T::KEY)
}

pub trait ConfigElement {
    const KEY: &'static str;
}

#[derive(Debug, Deserialize)]
pub struct Web {
    pub bind_address: SocketAddr,
    pub external_address: Option<Url>,
}

impl Web {
    /// The public address of the server ending in a slash.
    pub fn external_address(&self) -> Result<Url> {
        match &self.external_address {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!("http://{}/", self.bind_address))?),
        }
    }
}

impl ConfigElement for Web {
    const KEY: &'static str = "web";
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub validity_minutes: i64,
}

impl ConfigElement for Session {
    const KEY: &'static str = "session";
}

#[derive(Debug, Deserialize)]
pub struct RoleLookup {
    /// role lookups that take longer than this are treated as non-admin
    pub timeout_seconds: u64,
}

impl ConfigElement for RoleLookup {
    const KEY: &'static str = "roles";
}

#[derive(Debug, Deserialize)]
pub struct Upload {
    pub directory: PathBuf,
    pub public_base_url: Url,
}

impl ConfigElement for Upload {
    const KEY: &'static str = "upload";
}

#[derive(Debug, Deserialize)]
pub struct Admin {
    pub email: String,
    pub password: String,
}

impl ConfigElement for Admin {
    const KEY: &'static str = "admin";
}

#[derive(Debug, Deserialize)]
pub struct Logging {
    pub log_spec: String,
}

impl ConfigElement for Logging {
    const KEY: &'static str = "logging";
}
