use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Not logged in: {reason}")]
    AuthError { reason: String },

    #[error("Failed to parse {context}: {message}")]
    ParseError { context: String, message: String },

    #[error("Download failed for {url}: {message}")]
    DownloadError { url: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Auth,
    Data,
    Config,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::DownloadError { .. } => ErrorCategory::Network,
            Self::AuthError { .. } => ErrorCategory::Auth,
            Self::SerializationError(_) | Self::UrlError(_) | Self::ParseError { .. } => {
                ErrorCategory::Data
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::HttpError(_) | Self::DownloadError { .. } => ErrorSeverity::Medium,
            Self::AuthError { .. }
            | Self::ParseError { .. }
            | Self::SerializationError(_)
            | Self::UrlError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::HttpError(_) => {
                "Check network connectivity and that the Moodle instance is reachable, then retry"
                    .to_string()
            }
            Self::DownloadError { .. } => {
                "The file may have been removed or the session may have expired; retry the run"
                    .to_string()
            }
            Self::AuthError { .. } => {
                "Log in to Moodle in a browser, copy the MoodleSession cookie and pass it via \
                 --session or the MOODLE_SESSION environment variable"
                    .to_string()
            }
            Self::ParseError { .. } => {
                "The page layout may differ from the expected Moodle theme; rerun with --verbose \
                 and inspect the logs"
                    .to_string()
            }
            Self::SerializationError(_) => {
                "Inspect the scraped data for unexpected values".to_string()
            }
            Self::UrlError(_) => "Check the --base-url value".to_string(),
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration and run again (see --help)".to_string()
            }
            Self::IoError(_) => {
                "Check that the output directories exist and are writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(e) => format!("Could not reach the Moodle server: {}", e),
            Self::DownloadError { url, .. } => format!("Could not download {}", url),
            Self::AuthError { reason } => format!("Moodle session is not valid: {}", reason),
            Self::ParseError { context, .. } => {
                format!("Could not understand the {} page", context)
            }
            Self::SerializationError(_) => "Could not write the JSON dump".to_string(),
            Self::UrlError(e) => format!("Invalid URL: {}", e),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => format!("Missing required option: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid value for {}: {}", field, reason)
            }
            Self::IoError(_) => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
