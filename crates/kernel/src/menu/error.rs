//! Menu store error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by [`MenuStore`](super::MenuStore) operations.
#[derive(Debug, Error)]
pub enum MenuError {
    /// The proposed state breaks a menu rule. `field` names the offending input field.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// No menu item with this id exists.
    #[error("menu item {0} not found")]
    NotFound(Uuid),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl MenuError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        MenuError::Validation {
            field,
            message: message.into(),
        }
    }

    /// The offending field, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            MenuError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MenuError::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MenuError::NotFound(_))
    }
}

/// Result type alias using MenuError.
pub type MenuResult<T> = Result<T, MenuError>;
