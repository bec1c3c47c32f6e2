use thiserror::Error;

#[derive(Error, Debug)]
pub enum LegalEaseError {
    #[error("All {attempts} credentials were rejected by the generative service")]
    CredentialsExhausted { attempts: usize },

    #[error("Generation failed: {cause}")]
    Generation { cause: String },

    #[error("Document extraction failed: {message}")]
    Extraction { message: String },

    #[error("Report rendering failed: {message}")]
    Render { message: String },

    #[error("A question is required before asking the assistant")]
    EmptyQuestion,

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Service,
    Input,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LegalEaseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LegalEaseError::CredentialsExhausted { .. }
            | LegalEaseError::Generation { .. }
            | LegalEaseError::ApiError(_)
            | LegalEaseError::SerializationError(_) => ErrorCategory::Service,
            LegalEaseError::Extraction { .. } | LegalEaseError::EmptyQuestion => {
                ErrorCategory::Input
            }
            LegalEaseError::Render { .. }
            | LegalEaseError::IoError(_)
            | LegalEaseError::PdfError(_) => ErrorCategory::Output,
            LegalEaseError::TomlError(_)
            | LegalEaseError::ConfigError { .. }
            | LegalEaseError::MissingConfigError { .. }
            | LegalEaseError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 額度用盡或服務暫時失敗，稍後重試即可；空白問題也是被拒絕的請求
            LegalEaseError::EmptyQuestion
            | LegalEaseError::CredentialsExhausted { .. }
            | LegalEaseError::Generation { .. }
            | LegalEaseError::ApiError(_) => ErrorSeverity::Medium,
            LegalEaseError::Extraction { .. }
            | LegalEaseError::SerializationError(_)
            | LegalEaseError::PdfError(_) => ErrorSeverity::High,
            LegalEaseError::Render { .. }
            | LegalEaseError::IoError(_)
            | LegalEaseError::TomlError(_)
            | LegalEaseError::ConfigError { .. }
            | LegalEaseError::MissingConfigError { .. }
            | LegalEaseError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LegalEaseError::CredentialsExhausted { .. } => {
                "Every API key is over quota or invalid. Try again later or add another key (GENAI_API_KEY_N)."
            }
            LegalEaseError::Generation { .. } | LegalEaseError::ApiError(_) => {
                "Check your network connection and the document content, then retry the action."
            }
            LegalEaseError::Extraction { .. } => {
                "Make sure the upload is a readable, non-encrypted PDF file."
            }
            LegalEaseError::EmptyQuestion => "Type a question before asking for an answer.",
            LegalEaseError::Render { .. } | LegalEaseError::PdfError(_) => {
                "Report generation failed; retry the export."
            }
            LegalEaseError::IoError(_) => "Check that the output directory exists and is writable.",
            LegalEaseError::SerializationError(_) => {
                "The generative service returned an unexpected response; retry later."
            }
            LegalEaseError::TomlError(_)
            | LegalEaseError::ConfigError { .. }
            | LegalEaseError::MissingConfigError { .. }
            | LegalEaseError::InvalidConfigValueError { .. } => {
                "Review the settings file and the GENAI_API_KEY_* environment variables."
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LegalEaseError::CredentialsExhausted { .. } => {
                "The AI service is busy right now. Please try again later.".to_string()
            }
            LegalEaseError::Generation { cause } => format!("The AI request failed: {}", cause),
            LegalEaseError::EmptyQuestion => "Please type a question first.".to_string(),
            LegalEaseError::Extraction { .. } => "The uploaded document could not be read.".to_string(),
            other => other.to_string(),
        }
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// The two lines printed to stderr when a command fails.
    pub fn cli_report(&self) -> [String; 2] {
        [
            format!("❌ {}", self.user_friendly_message()),
            format!("💡 Suggestion: {}", self.recovery_suggestion()),
        ]
    }
}

pub type Result<T> = std::result::Result<T, LegalEaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_is_retryable_service_error() {
        let err = LegalEaseError::CredentialsExhausted { attempts: 3 };
        assert_eq!(err.category(), ErrorCategory::Service);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("try again later"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = LegalEaseError::MissingConfigError {
            field: "GENAI_API_KEY_1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_blank_question_exits_with_failure() {
        let err = LegalEaseError::EmptyQuestion;
        assert!(err.severity() > ErrorSeverity::Low);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_cli_report_lines() {
        let [message, suggestion] = LegalEaseError::EmptyQuestion.cli_report();
        assert_eq!(message, "❌ Please type a question first.");
        assert_eq!(
            suggestion,
            "💡 Suggestion: Type a question before asking for an answer."
        );
        assert!(!suggestion.contains("建議"));
    }
}
