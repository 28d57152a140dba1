use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Object storage holding generated datasets.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Every key under `prefix`, across all pages.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Fetch one object and write it to `destination`.
    async fn fetch(&self, bucket: &str, key: &str, destination: &Path) -> Result<()>;
}

/// The user's terminal: progress notes go out through `say`, questions through `prompt`.
pub trait Prompter {
    fn say(&self, message: &str);

    fn prompt(&self, message: &str) -> Result<String>;
}
