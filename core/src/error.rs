//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Every variant except `Json` and `General` describes a configuration or
//! programmer error: generation stops and the caller must fix its input.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// The converter was asked to map a rule kind it has no mapper for.
    #[from(ignore)]
    #[display("Converter not initialized: {_0}")]
    NotInitialized(String),

    /// A multipart upload route was bound to a root-level rule schema.
    #[from(ignore)]
    #[display("Multipart route '{_0}' cannot use a root-level rule schema")]
    MultipartRootSchema(String),

    /// A generated `$ref` points at a component that is not stored.
    #[from(ignore)]
    #[display("Unresolved component reference: {_0}")]
    UnresolvedReference(String),

    /// A request body had to be generated for a route without an action.
    #[from(ignore)]
    #[display("Route '{_0}' requires a request body but has no bound action")]
    MissingAction(String),

    /// The requested OpenAPI version is not supported.
    #[from(ignore)]
    #[display("Unsupported OpenAPI version: {_0}")]
    UnsupportedVersion(String),

    /// A rule could not be read from its JSON / shorthand form.
    #[from(ignore)]
    #[display("Invalid rule: {_0}")]
    InvalidRule(String),

    /// Wrapper for serde_json errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));
    }

    #[test]
    fn test_fatal_variant_messages() {
        let err = AppError::MultipartRootSchema("/upload".into());
        assert_eq!(
            format!("{}", err),
            "Multipart route '/upload' cannot use a root-level rule schema"
        );
        let err = AppError::UnsupportedVersion("2.0".into());
        assert_eq!(format!("{}", err), "Unsupported OpenAPI version: 2.0");
    }
}
