use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ResultExt;
use url::Url;
use uuid::Uuid;

use crate::config;
use crate::error;
use crate::error::Result;

/// Object storage for uploaded images. Files are stored under a randomly
/// generated name and served from a public base URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under a random file name that preserves the extension
    /// of `original_name` and returns the public URL.
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<Url>;

    fn public_url(&self, file_name: &str) -> Result<Url>;
}

pub struct FileSystemBlobStore {
    directory: PathBuf,
    public_base_url: Url,
}

impl FileSystemBlobStore {
    pub fn new(directory: PathBuf, public_base_url: Url) -> Self {
        Self {
            directory,
            public_base_url,
        }
    }

    pub fn from_config() -> Result<Self> {
        let upload: config::Upload = config::get_config_element()?;
        Ok(Self::new(upload.directory, upload.public_base_url))
    }

    /// Random file name, original extension kept. Collisions are not
    /// detected beyond the randomness of the name.
    fn random_file_name(original_name: &str) -> String {
        let id = Uuid::new_v4();
        match Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<Url> {
        let file_name = Self::random_file_name(original_name);

        tokio::fs::create_dir_all(&self.directory)
            .await
            .context(error::IoSnafu)?;
        tokio::fs::write(self.directory.join(&file_name), bytes)
            .await
            .context(error::IoSnafu)?;

        self.public_url(&file_name)
    }

    fn public_url(&self, file_name: &str) -> Result<Url> {
        Ok(self.public_base_url.join(file_name)?)
    }
}
