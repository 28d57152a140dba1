use thiserror::Error;

#[derive(Error, Debug)]
pub enum SbxError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Config file write error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Malformed API key")]
    InvalidApiKey,

    #[error("Malformed id: {value}")]
    MalformedId { value: String },

    #[error("Malformed dataset job id: {value}")]
    MalformedJobId { value: String },

    #[error("Unauthorized: {body}")]
    Unauthorized { body: String, settings_url: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Internal server error")]
    ServerError,

    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Unexpected API response: {message}")]
    UnexpectedResponse { message: String },

    #[error("S3 error: {message}")]
    S3Error { message: String },

    #[error("{failed} of {total} downloads failed")]
    DownloadFailed { failed: usize, total: usize },

    #[error("Failed to launch `{program}`: {source}")]
    InstallerSpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Input,
    Configuration,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SbxError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SbxError::ApiError(_)
            | SbxError::ServerError
            | SbxError::HttpStatus { .. }
            | SbxError::UnexpectedResponse { .. } => ErrorCategory::Network,
            SbxError::NotLoggedIn | SbxError::Unauthorized { .. } => {
                ErrorCategory::Authentication
            }
            SbxError::InvalidApiKey
            | SbxError::MalformedId { .. }
            | SbxError::MalformedJobId { .. }
            | SbxError::BadRequest { .. } => ErrorCategory::Input,
            SbxError::InvalidConfigValueError { .. }
            | SbxError::MissingConfigError { .. }
            | SbxError::TomlParseError(_)
            | SbxError::TomlWriteError(_)
            | SbxError::UrlError(_) => ErrorCategory::Configuration,
            SbxError::S3Error { .. } | SbxError::DownloadFailed { .. } => ErrorCategory::Storage,
            SbxError::IoError(_)
            | SbxError::SerializationError(_)
            | SbxError::InstallerSpawnError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SbxError::ServerError
            | SbxError::ApiError(_)
            | SbxError::S3Error { .. }
            | SbxError::DownloadFailed { .. } => ErrorSeverity::Medium,
            SbxError::IoError(_) | SbxError::InstallerSpawnError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SbxError::InstallerSpawnError { .. } => 127,
            _ => match self.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SbxError::NotLoggedIn => {
                "It looks like you're not logged in. Please `sbx login` first.".to_string()
            }
            SbxError::InvalidApiKey => "Please enter a well-formed API key".to_string(),
            SbxError::MalformedId { .. } => "Ooops, malformed id".to_string(),
            SbxError::MalformedJobId { .. } => {
                "Ooops, malformed dataset job id. make sure to enter an id from `sbx job list`"
                    .to_string()
            }
            SbxError::Unauthorized { body, .. } => body.clone(),
            SbxError::BadRequest { message } => message.clone(),
            SbxError::ServerError => "Internal Server Error: Please retry in a bit.".to_string(),
            SbxError::DownloadFailed { .. } => "Some downloads have failed. Try rerunning".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SbxError::NotLoggedIn => "Run `sbx login` with an API key from your account settings".to_string(),
            SbxError::InvalidApiKey => "API keys are 40 character hexadecimal strings".to_string(),
            SbxError::MalformedId { .. } => "Ids are 24 character hexadecimal strings".to_string(),
            SbxError::MalformedJobId { .. } => "Copy the id column from `sbx job list`".to_string(),
            SbxError::Unauthorized { settings_url, .. } => format!(
                "Are you using an valid API key for the resource you are trying to access? Please enter a key currently listed at {}",
                settings_url
            ),
            SbxError::ServerError | SbxError::ApiError(_) | SbxError::HttpStatus { .. } => {
                "Check your network connection and retry".to_string()
            }
            SbxError::DownloadFailed { .. } | SbxError::S3Error { .. } => {
                "Rerun the same download; files already on disk are skipped".to_string()
            }
            SbxError::TomlParseError(_) => {
                "Delete the config file and run `sbx login` again".to_string()
            }
            SbxError::InvalidConfigValueError { field, .. }
            | SbxError::MissingConfigError { field } => {
                format!("Check the value of {}", field)
            }
            SbxError::InstallerSpawnError { program, .. } => {
                format!("Make sure `{}` is installed and on your PATH", program)
            }
            _ => "Retry with --verbose for more details".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SbxError>;
