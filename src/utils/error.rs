use thiserror::Error;

#[derive(Error, Debug)]
pub enum LimsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Unknown record type: {name}")]
    UnknownRecordTypeError { name: String },

    #[error("{record_type} record {id} not found")]
    RecordNotFoundError { record_type: String, id: u64 },

    #[error("Unknown action '{action}' for {record_type}")]
    UnknownActionError { record_type: String, action: String },

    #[error("Print error: {message}")]
    PrintError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Printing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LimsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LimsError::TomlParseError(_)
            | LimsError::ConfigError { .. }
            | LimsError::MissingConfigError { .. }
            | LimsError::InvalidConfigValueError { .. }
            | LimsError::ConfigValidationError { .. }
            | LimsError::UnknownActionError { .. } => ErrorCategory::Configuration,
            LimsError::CsvError(_)
            | LimsError::SerializationError(_)
            | LimsError::UnknownRecordTypeError { .. }
            | LimsError::RecordNotFoundError { .. } => ErrorCategory::Data,
            LimsError::PrintError { .. } => ErrorCategory::Printing,
            LimsError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Printing => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LimsError::TomlParseError(_) => "Check the TOML syntax of the configuration file",
            LimsError::MissingConfigError { .. } | LimsError::ConfigError { .. } => {
                "Add the missing setting to the configuration file"
            }
            LimsError::InvalidConfigValueError { .. } | LimsError::ConfigValidationError { .. } => {
                "Correct the reported value in the configuration file"
            }
            LimsError::UnknownRecordTypeError { .. } => {
                "Use a snake_case record type such as 'sample' or 'extracted_dna'"
            }
            LimsError::UnknownActionError { .. } => {
                "Run the 'actions' command to list the actions of this record type"
            }
            LimsError::RecordNotFoundError { .. } => {
                "Check the selected ids against the record files in data_dir"
            }
            LimsError::CsvError(_) | LimsError::SerializationError(_) => {
                "Check that the record file is well formed and has an 'id' column"
            }
            LimsError::PrintError { .. } => {
                "Install the spooler command or set printing.backend = \"diagnostic\""
            }
            LimsError::IoError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Record data problem: {}", self),
            ErrorCategory::Printing => format!("Printing problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        LimsError::ConfigError {
            message: message.into(),
        }
    }

    pub fn print(message: impl Into<String>) -> Self {
        LimsError::PrintError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LimsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let missing = LimsError::MissingConfigError {
            field: "printers".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert_eq!(missing.severity(), ErrorSeverity::High);

        let io = LimsError::IoError(std::io::Error::other("disk gone"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);

        assert_eq!(LimsError::print("spawn failed").severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_user_friendly_message_mentions_cause() {
        let err = LimsError::RecordNotFoundError {
            record_type: "sample".to_string(),
            id: 7,
        };
        assert_eq!(
            err.user_friendly_message(),
            "Record data problem: sample record 7 not found"
        );
    }
}
