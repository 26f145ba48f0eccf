//! CLI error type.

use bookshop_client::{ApiError, ConfigError, SessionError};
use bookshop_core::Route;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Not logged in. Run `bookshop login` first.")]
    NotLoggedIn,

    #[error("The {role} role has no access to {route}")]
    Forbidden { route: Route, role: String },

    #[error("The {role} role cannot make changes")]
    ReadOnly { role: String },

    #[error("{0}")]
    InvalidInput(String),
}

impl CliError {
    /// One-line message for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_use_notice_text() {
        let err = CliError::from(ApiError::Validation("Please select a customer".to_string()));
        assert_eq!(err.user_message(), "Please select a customer");
    }

    #[test]
    fn test_forbidden_names_role_and_route() {
        let err = CliError::Forbidden {
            route: Route::Users,
            role: "seller".to_string(),
        };
        assert_eq!(err.user_message(), "The seller role has no access to users");
    }
}
