//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// Route identifier used when a failure concerns the generator options.
pub const OPTIONS_CONTEXT: &str = "<options>";

/// Route identifier used when a failure is found in the composed document.
pub const DOCUMENT_CONTEXT: &str = "<document>";

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A malformed route, shape, or option. Always fatal for the generation call.
    #[from(ignore)]
    #[display("Configuration Error in route '{route}': {message}")]
    Configuration {
        /// The offending route's operationId (or a context marker such as `<options>`).
        route: String,
        /// Which invariant was violated.
        message: String,
    },

    /// Generic errors (parsing, serialization).
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Builds a configuration error for the given route.
    pub fn config(route: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Configuration {
            route: route.into(),
            message: message.into(),
        }
    }

    /// Returns the offending route identifier for configuration errors.
    pub fn route(&self) -> Option<&str> {
        match self {
            AppError::Configuration { route, .. } => Some(route),
            AppError::General(_) => None,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
