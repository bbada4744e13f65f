//! Error taxonomy for the editor core

use thiserror::Error;

use crate::model::ViewName;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors raised by the view store, navigation and export pipeline
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input at a boundary (unknown view id, malformed document)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A capability needed for the whole operation is missing
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Capturing a single view failed; the export carries on without it
    #[error("Failed to capture view {view}: {message}")]
    PerViewCapture { view: ViewName, message: String },

    /// Durable storage write failed; in-memory state is still valid
    #[error("Persistence write failed: {0}")]
    PersistenceWrite(String),

    /// Programmer error in how the core is being driven
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
}

impl AppError {
    pub fn capture(view: ViewName, message: impl Into<String>) -> Self {
        AppError::PerViewCapture {
            view,
            message: message.into(),
        }
    }

    /// Errors the user should see in a blocking dialog
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::ResourceUnavailable(_)
        )
    }
}
