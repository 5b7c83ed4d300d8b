use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session expired or invalid token")]
    Unauthorized,

    #[error("Request rejected: {message}")]
    Rejected { kind: Option<String>, message: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        existing_dates: Vec<String>,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }

    /// Text shown to the operator in a notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message, .. } if !message.is_empty() => message.clone(),
            AppError::Api { status, .. } => format!("Request failed with status {}", status),
            AppError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            AppError::Rejected { message, .. } => message.clone(),
            AppError::Conflict {
                message,
                existing_dates,
            } => {
                if existing_dates.is_empty() {
                    format!("Shipment conflicts with an existing record: {}", message)
                } else {
                    format!(
                        "Shipment conflicts with an existing record ({}). Existing dates: {}",
                        message,
                        existing_dates.join(", ")
                    )
                }
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::Forbidden(msg) => format!("You are not allowed to {}", msg),
            AppError::NotFound(msg) => format!("{} not found", msg),
            AppError::Http(_) | AppError::Json(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
