//! Error taxonomy for assumption validation and engine calls

use thiserror::Error;

/// Errors raised by the projection core
///
/// Both variants are terminal: the engine is deterministic, so retrying the
/// same call always fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Malformed or out-of-range assumption field, including event period
    /// indices outside `[0, horizon)`
    #[error("invalid assumption `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Structurally impossible call (empty sequence, zero horizon, bad multiplier)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ModelError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_field() {
        let err = ModelError::validation("tax_rate", "must lie in [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "invalid assumption `tax_rate`: must lie in [0, 1], got 1.5"
        );
        assert!(err.is_validation());
        assert!(!err.is_invalid_input());
    }
}
