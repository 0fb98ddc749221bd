#![deny(missing_docs)]

//! # Validoc Core
//!
//! Converts validation rules into OpenAPI 3.x schemas and assembles one
//! document from a list of routes.

/// Shared error types.
pub mod error;

/// Validation-rule model and parsing.
pub mod rules;

/// Schema fragments produced by conversion.
pub mod fragment;

/// Supported OpenAPI versions.
pub mod version;

/// Rule -> schema conversion.
pub mod converter;

/// Named, reusable component schemas.
pub mod components;

/// Route model consumed by the generator.
pub mod routes;

/// Per-operation parameter and body extraction.
pub mod params;

/// Document assembly.
pub mod generator;

/// Non-fatal generation warnings.
pub mod warning;

pub use components::ComponentStore;
pub use converter::{ConvertContext, KindMapper, MapperTable, RuleConverter};
pub use error::{AppError, AppResult};
pub use fragment::{Fragment, Schema, SchemaObject, SchemaType};
pub use generator::{
    ComponentLifetime, DocumentGenerator, GeneratorSettings, SummaryContext, SummaryTemplate,
};
pub use params::{ExtractedParameters, Parameter, ParameterExtractor, RequestBody};
pub use routes::{
    BodyParser, HttpMethod, MultipartOptions, OperationDocs, ParamLocation, PathParameter,
    Route, RouteKind, Server, ServiceInfo, Tag,
};
pub use rules::{Rule, RuleKind, RuleKindTag, RuleMeta, RuleSchema};
pub use version::OpenApiVersion;
pub use warning::GenerationWarning;
