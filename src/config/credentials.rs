use crate::domain::model::{ApiKey, CompanyInfo, UserInfo};
use crate::utils::error::{Result, SbxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSection {
    pub key: ApiKey,
}

/// Login state persisted by `sbx login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub api: ApiSection,
    pub user: UserInfo,
    pub company: CompanyInfo,
}

impl StoredConfig {
    pub fn new(key: ApiKey, user: UserInfo, company: CompanyInfo) -> Self {
        Self {
            api: ApiSection { key },
            user,
            company,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the stored login, failing with `NotLoggedIn` when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}", path.display());
            return Err(SbxError::NotLoggedIn);
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!("Stored credentials at {}", path.display());
        Ok(())
    }
}
