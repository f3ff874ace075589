use thiserror::Error;

pub type CopilotResult<T> = Result<T, CopilotError>;

#[derive(Error, Debug, Clone)]
pub enum CopilotError {
    #[error("Template '{name}' not found")]
    TemplateNotFound { name: String },

    #[error("Template error in '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Unknown template block '{{{{#{block}}}}}' in '{template}'")]
    UnknownBlock { template: String, block: String },

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Schema lookup failed: {0}")]
    Schema(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for CopilotError {
    fn from(err: serde_json::Error) -> Self {
        CopilotError::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for CopilotError {
    fn from(err: serde_yaml::Error) -> Self {
        CopilotError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CopilotError {
    fn from(err: std::io::Error) -> Self {
        CopilotError::Io(err.to_string())
    }
}
