use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },

    #[error("Address could not be resolved: {address}")]
    AddressNotResolved { address: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Dataset,
    Geocoding,
    Export,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LookupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::ConfigError { .. }
            | LookupError::MissingConfigError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LookupError::CsvError(_) | LookupError::DatasetError { .. } => ErrorCategory::Dataset,
            LookupError::HttpError(_) | LookupError::AddressNotResolved { .. } => {
                ErrorCategory::Geocoding
            }
            LookupError::ZipError(_)
            | LookupError::IoError(_)
            | LookupError::SerializationError(_) => ErrorCategory::Export,
            LookupError::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // The user can retry with another address or other controls.
            LookupError::AddressNotResolved { .. } | LookupError::ValidationError { .. } => {
                ErrorSeverity::Medium
            }
            LookupError::HttpError(_)
            | LookupError::ZipError(_)
            | LookupError::SerializationError(_) => ErrorSeverity::High,
            LookupError::IoError(_)
            | LookupError::CsvError(_)
            | LookupError::DatasetError { .. }
            | LookupError::ConfigError { .. }
            | LookupError::MissingConfigError { .. }
            | LookupError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::Dataset => {
                "Make sure the dataset file exists and has Latitude/Longitud columns"
            }
            ErrorCategory::Geocoding => "Check the street name and number, then search again",
            ErrorCategory::Export => "Check that the output directory is writable",
            ErrorCategory::Input => "Adjust the search controls to the allowed values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LookupError::AddressNotResolved { .. } => {
                "Address could not be geocoded. Please try again.".to_string()
            }
            LookupError::DatasetError { message } => format!("Could not load dataset: {}", message),
            LookupError::CsvError(e) => format!("Could not read dataset: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
