use crate::utils::error::{Result, SbxError};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use std::env;
use std::path::PathBuf;

pub const PROD_API_URL: &str = "https://app.sbxrobotics.com";
pub const DEV_API_URL: &str = "https://dev.app.sbxrobotics.com";
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 32;

/// Runtime settings taken from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub dev_mode: bool,
    pub verify_tls: bool,
    pub config_path: PathBuf,
    pub download_workers: usize,
    pub show_progress: bool,
    /// S3-compatible endpoint used for dataset downloads instead of AWS.
    pub s3_endpoint: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dev_mode = lookup("SBX_DEV").is_some_and(|v| !v.is_empty());

        let api_url = lookup("SBX_API_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                if dev_mode {
                    DEV_API_URL.to_string()
                } else {
                    PROD_API_URL.to_string()
                }
            })
            .trim_end_matches('/')
            .to_string();

        let config_path = match lookup("SBX_CONFIG_PATH").filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        };

        let download_workers = match lookup("SBX_DOWNLOAD_WORKERS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| SbxError::InvalidConfigValueError {
                    field: "SBX_DOWNLOAD_WORKERS".to_string(),
                    value: raw.clone(),
                    reason: "Expected a positive integer".to_string(),
                })?,
            None => DEFAULT_DOWNLOAD_WORKERS,
        };

        let s3_endpoint = lookup("SBX_S3_ENDPOINT")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            api_url,
            dev_mode,
            verify_tls: !dev_mode,
            config_path,
            download_workers,
            show_progress: true,
            s3_endpoint,
        })
    }

    /// Settings pointing at an explicit API and config file, without progress output.
    pub fn for_endpoint(api_url: &str, config_path: PathBuf) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            dev_mode: false,
            verify_tls: true,
            config_path,
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
            show_progress: false,
            s3_endpoint: None,
        }
    }

    pub fn settings_url(&self) -> String {
        format!("{}/settings/account", self.api_url)
    }
}

/// `~/.config/sbx/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".config").join("sbx").join("config.toml"))
        .ok_or_else(|| SbxError::MissingConfigError {
            field: "home directory (set SBX_CONFIG_PATH)".to_string(),
        })
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("SBX_API_URL", &self.api_url)?;
        validate_path("SBX_CONFIG_PATH", &self.config_path.to_string_lossy())?;
        validate_range("SBX_DOWNLOAD_WORKERS", self.download_workers, 1, 256)?;
        if let Some(endpoint) = &self.s3_endpoint {
            validate_url("SBX_S3_ENDPOINT", endpoint)?;
        }

        tracing::debug!("Settings validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_to_production() {
        let s = settings(&[("SBX_CONFIG_PATH", "/tmp/sbx.toml")]).unwrap();
        assert_eq!(s.api_url, PROD_API_URL);
        assert!(!s.dev_mode);
        assert!(s.verify_tls);
        assert_eq!(s.download_workers, 32);
        assert_eq!(s.config_path, PathBuf::from("/tmp/sbx.toml"));
        assert_eq!(s.s3_endpoint, None);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_dev_mode_switches_url_and_tls() {
        let s = settings(&[("SBX_DEV", "1"), ("SBX_CONFIG_PATH", "/tmp/sbx.toml")]).unwrap();
        assert!(s.dev_mode);
        assert!(!s.verify_tls);
        assert_eq!(s.api_url, DEV_API_URL);
        assert_eq!(
            s.settings_url(),
            "https://dev.app.sbxrobotics.com/settings/account"
        );
    }

    #[test]
    fn test_empty_dev_flag_is_off() {
        let s = settings(&[("SBX_DEV", ""), ("SBX_CONFIG_PATH", "/tmp/sbx.toml")]).unwrap();
        assert!(!s.dev_mode);
    }

    #[test]
    fn test_api_url_override() {
        let s = settings(&[
            ("SBX_API_URL", "http://127.0.0.1:9000/"),
            ("SBX_CONFIG_PATH", "/tmp/sbx.toml"),
        ])
        .unwrap();
        assert_eq!(s.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_worker_count() {
        assert!(settings(&[("SBX_DOWNLOAD_WORKERS", "many")]).is_err());

        let s = settings(&[
            ("SBX_DOWNLOAD_WORKERS", "0"),
            ("SBX_CONFIG_PATH", "/tmp/sbx.toml"),
        ])
        .unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_s3_endpoint_override() {
        let s = settings(&[
            ("SBX_S3_ENDPOINT", "http://127.0.0.1:9000/"),
            ("SBX_CONFIG_PATH", "/tmp/sbx.toml"),
        ])
        .unwrap();
        assert_eq!(s.s3_endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert!(s.validate().is_ok());

        let s = settings(&[
            ("SBX_S3_ENDPOINT", "minio:9000"),
            ("SBX_CONFIG_PATH", "/tmp/sbx.toml"),
        ])
        .unwrap();
        assert!(s.validate().is_err());
    }
}
