use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Archive operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Source {source_name} failed: {message}")]
    SourceError {
        source_name: String,
        message: String,
        status: Option<u16>,
    },

    #[error("Job rejected: {reason}")]
    ValidationError { reason: String },

    #[error("Job store error: {message}")]
    StoreError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IngestError {
    pub fn source_failure(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceError {
            source_name: source_name.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::ValidationError {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::SourceError { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ValidationError { .. }
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::ZipError(_) | Self::IoError(_) | Self::StoreError { .. } => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::SourceError { .. } => ErrorSeverity::Medium,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ZipError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_)
            | Self::IoError(_)
            | Self::StoreError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 傳輸錯誤、429 與 5xx 才值得重試
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::SourceError {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check the job board API credentials and network access, then re-run the ingestion"
            }
            ErrorCategory::Configuration => {
                "Review the TOML configuration file and the required environment variables"
            }
            ErrorCategory::Data => "Inspect the source payload; the upstream schema may have changed",
            ErrorCategory::Storage => {
                "Check that the store directory exists and is writable, and that jobs.json is valid JSON"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::SourceError { source_name, .. } => {
                format!("Could not fetch jobs from {}", source_name)
            }
            Self::ApiError(_) => "A job board request failed".to_string(),
            Self::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::StoreError { .. } | Self::IoError(_) => {
                "The job store could not be read or written".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_status_retryability() {
        let throttled = IngestError::SourceError {
            source_name: "adzuna".to_string(),
            message: "HTTP 429".to_string(),
            status: Some(429),
        };
        let unavailable = IngestError::SourceError {
            source_name: "lever".to_string(),
            message: "HTTP 503".to_string(),
            status: Some(503),
        };
        let forbidden = IngestError::SourceError {
            source_name: "usajobs".to_string(),
            message: "HTTP 403".to_string(),
            status: Some(403),
        };

        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!forbidden.is_retryable());
    }

    #[test]
    fn test_severity_by_category() {
        let config = IngestError::MissingConfigError {
            field: "sources.adzuna.app_id".to_string(),
        };
        assert_eq!(config.category(), ErrorCategory::Configuration);
        assert_eq!(config.severity(), ErrorSeverity::Critical);

        let rejected = IngestError::rejected("empty title");
        assert_eq!(rejected.category(), ErrorCategory::Data);
        assert_eq!(rejected.severity(), ErrorSeverity::Low);
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn test_user_friendly_message_names_source() {
        let err = IngestError::source_failure("greenhouse", "bad json");
        assert_eq!(err.user_friendly_message(), "Could not fetch jobs from greenhouse");
    }
}
