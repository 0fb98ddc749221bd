//! # OpenAPI Versions
//!
//! The document generator targets the 3.0 and 3.1 lines of the OpenAPI
//! specification. They differ in how examples, exclusive bounds and
//! nullability are spelled, so rendering is version-aware.

use crate::error::{AppError, AppResult};
use std::fmt;

/// A supported major.minor line of the OpenAPI specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenApiVersion {
    /// OpenAPI 3.0.x (JSON Schema "wright-00" subset).
    V3_0,
    /// OpenAPI 3.1.x (JSON Schema 2020-12).
    V3_1,
}

impl OpenApiVersion {
    /// Parses a full version string such as `"3.0.3"` or `"3.1.0"`.
    pub fn parse(version: &str) -> AppResult<Self> {
        let trimmed = version.trim();
        if trimmed == "3.0" || trimmed.starts_with("3.0.") {
            Ok(Self::V3_0)
        } else if trimmed == "3.1" || trimmed.starts_with("3.1.") {
            Ok(Self::V3_1)
        } else {
            Err(AppError::UnsupportedVersion(version.to_string()))
        }
    }

    /// Whether example values are emitted as an `examples` array.
    pub fn uses_examples_array(self) -> bool {
        matches!(self, Self::V3_1)
    }

    /// Whether `exclusiveMinimum` / `exclusiveMaximum` carry the bound itself.
    pub fn numeric_exclusive_bounds(self) -> bool {
        matches!(self, Self::V3_1)
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V3_0 => write!(f, "3.0"),
            Self::V3_1 => write!(f, "3.1"),
        }
    }
}
