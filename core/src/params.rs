#![deny(missing_docs)]

//! # Parameter Extraction
//!
//! Derives the path parameters, query parameters and request body of one
//! operation from its route and the bound action's rule schema.
//!
//! - **Path**: explicit overrides verbatim, else one required string per
//!   `{name}` placeholder.
//! - **Stream** routes: a single binary body; fields become query parameters.
//! - **Multipart** routes: a file field plus the action's fields, combined
//!   with `allOf`.
//! - **Standard** routes: each field goes to the query or to one body
//!   component named after the action, by override or by HTTP method.

use crate::components::ComponentStore;
use crate::converter::RuleConverter;
use crate::error::{AppError, AppResult};
use crate::fragment::{Fragment, Schema, SchemaObject, SchemaType};
use crate::generator::GeneratorSettings;
use crate::routes::{
    path_placeholders, HttpMethod, MultipartOptions, OperationDocs, ParamLocation, Route,
    RouteKind,
};
use crate::rules::{Rule, RuleKind, RuleMeta, RuleSchema};
use crate::version::OpenApiVersion;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterIn {
    /// URL path segment.
    Path,
    /// Query string.
    Query,
}

impl ParameterIn {
    fn as_str(self) -> &'static str {
        match self {
            ParameterIn::Path => "path",
            ParameterIn::Query => "query",
        }
    }
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location.
    pub location: ParameterIn,
    /// Must be sent.
    pub required: bool,
    /// Human description.
    pub description: Option<String>,
    /// Value schema.
    pub schema: Schema,
    /// Serialized with `style: deepObject, explode: true`.
    pub deep_object: bool,
}

impl Parameter {
    /// A required string path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterIn::Path,
            required: true,
            description: None,
            schema: Schema::typed(SchemaType::String),
            deep_object: false,
        }
    }

    /// JSON form.
    pub fn to_value(&self, version: OpenApiVersion) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name));
        map.insert("in".to_string(), json!(self.location.as_str()));
        map.insert("required".to_string(), json!(self.required));
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        if self.deep_object {
            map.insert("style".to_string(), json!("deepObject"));
            map.insert("explode".to_string(), json!(true));
        }
        map.insert("schema".to_string(), self.schema.to_value(version));
        Value::Object(map)
    }
}

/// An operation request body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    /// Accepted content types, each with the same schema.
    pub content_types: Vec<String>,
    /// Body schema.
    pub schema: Schema,
    /// Must be sent.
    pub required: bool,
}

impl RequestBody {
    /// JSON form.
    pub fn to_value(&self, version: OpenApiVersion) -> Value {
        let schema = self.schema.to_value(version);
        let content = self
            .content_types
            .iter()
            .map(|ct| (ct.clone(), json!({ "schema": schema.clone() })))
            .collect::<Map<_, _>>();
        json!({ "required": self.required, "content": content })
    }
}

/// Result of [`ParameterExtractor::extract`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedParameters {
    /// Path parameters in placeholder order.
    pub path_parameters: Vec<Parameter>,
    /// Query parameters in field order.
    pub query_parameters: Vec<Parameter>,
    /// Request body, if any.
    pub request_body: Option<RequestBody>,
}

impl ExtractedParameters {
    /// Path then query parameters.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.path_parameters.iter().chain(&self.query_parameters)
    }
}

/// Derives parameters and bodies for single operations.
pub struct ParameterExtractor<'a> {
    converter: &'a RuleConverter,
    settings: &'a GeneratorSettings,
}

impl<'a> ParameterExtractor<'a> {
    /// Creates an extractor.
    pub fn new(converter: &'a RuleConverter, settings: &'a GeneratorSettings) -> Self {
        Self {
            converter,
            settings,
        }
    }

    /// Extracts the parameters of `method` on `route`.
    ///
    /// `full_path` is the normalised path, `docs` the merged documentation
    /// of the route. Generated components go into `store`.
    pub fn extract(
        &self,
        method: HttpMethod,
        full_path: &str,
        route: &Route,
        docs: &OperationDocs,
        store: &mut ComponentStore,
    ) -> AppResult<ExtractedParameters> {
        let placeholders = path_placeholders(full_path);
        let mut extracted = ExtractedParameters {
            path_parameters: self.path_parameters(&placeholders, route, docs, store)?,
            ..ExtractedParameters::default()
        };
        if route.joker && route.action.is_none() {
            return Ok(extracted);
        }

        match &route.kind {
            RouteKind::Stream => {
                extracted.request_body = Some(RequestBody {
                    content_types: vec!["application/octet-stream".to_string()],
                    schema: Schema::Object(Box::new(SchemaObject::formatted("binary"))),
                    required: true,
                });
                if let Some((fields, _)) = route.params.as_ref().and_then(field_rules) {
                    let converted = self.fields_without(fields, &placeholders)?;
                    for (name, fragment) in converted {
                        let param = query_parameter(route, full_path, name, fragment, store);
                        extracted.query_parameters.push(param);
                    }
                }
            }
            RouteKind::Multipart(options) => {
                extracted.request_body =
                    Some(self.multipart_body(full_path, route, options, &placeholders, store)?);
            }
            RouteKind::Standard => {
                self.standard(method, full_path, route, docs, &placeholders, store, &mut extracted)?;
            }
        }
        Ok(extracted)
    }

    fn path_parameters(
        &self,
        placeholders: &[String],
        route: &Route,
        docs: &OperationDocs,
        store: &mut ComponentStore,
    ) -> AppResult<Vec<Parameter>> {
        let Some(overrides) = &docs.path_parameters else {
            return Ok(placeholders.iter().map(Parameter::path).collect());
        };

        let mut params = Vec::with_capacity(overrides.len());
        for declared in overrides {
            let mut param = Parameter::path(declared.name.clone());
            param.description = declared.description.clone();
            if let Some(rule) = &declared.rule {
                if let Some(fragment) = self.converter.convert_rule(rule)? {
                    let name = format!("{}.{}", component_prefix(route, "path"), declared.name);
                    param.schema = store.lift(fragment.schema, &name);
                }
            }
            params.push(param);
        }
        Ok(params)
    }

    fn fields_without(
        &self,
        fields: &IndexMap<String, Rule>,
        placeholders: &[String],
    ) -> AppResult<IndexMap<String, Fragment>> {
        let mut converted = self.converter.convert_fields(fields)?;
        converted.retain(|name, _| !placeholders.contains(name));
        Ok(converted)
    }

    fn multipart_body(
        &self,
        full_path: &str,
        route: &Route,
        options: &MultipartOptions,
        placeholders: &[String],
        store: &mut ComponentStore,
    ) -> AppResult<RequestBody> {
        let fields = match &route.params {
            Some(params) => match field_rules(params) {
                Some(fields) => Some(fields),
                // Object without declared properties: only the file part.
                None if is_object_rule(params) => None,
                None => return Err(AppError::MultipartRootSchema(full_path.to_string())),
            },
            None => None,
        };

        let file_field = options
            .file_field
            .clone()
            .unwrap_or_else(|| self.settings.multipart_file_field.clone());
        let binary = SchemaObject::formatted("binary");
        let file_schema = if options.max_files == Some(1) {
            binary
        } else {
            SchemaObject {
                items: Some(Box::new(Schema::Object(Box::new(binary)))),
                max_items: options.max_files,
                ..SchemaObject::typed(SchemaType::Array)
            }
        };
        let mut file_object = SchemaObject::typed(SchemaType::Object);
        file_object
            .properties
            .insert(file_field.clone(), Schema::Object(Box::new(file_schema)));
        file_object.required.push(file_field);

        let mut schema = Schema::Object(Box::new(file_object));
        if let Some((fields, meta)) = fields {
            let converted = self.fields_without(fields, placeholders)?;
            if !converted.is_empty() {
                let action = required_action(route, full_path)?;
                let reference = store.register_object(action, converted, meta);
                schema = Schema::Object(Box::new(SchemaObject {
                    all_of: vec![schema, reference],
                    ..SchemaObject::default()
                }));
            }
        }

        Ok(RequestBody {
            content_types: vec!["multipart/form-data".to_string()],
            schema,
            required: true,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn standard(
        &self,
        method: HttpMethod,
        full_path: &str,
        route: &Route,
        docs: &OperationDocs,
        placeholders: &[String],
        store: &mut ComponentStore,
        extracted: &mut ExtractedParameters,
    ) -> AppResult<()> {
        let Some(params) = &route.params else {
            return Ok(());
        };
        let carries_body = self.settings.body_methods.contains(&method);

        let Some((fields, meta)) = field_rules(params) else {
            // Root schema that is not an object: the whole body or nothing.
            let RuleSchema::Root(rule) = params else {
                return Ok(());
            };
            if !carries_body {
                tracing::debug!(path = full_path, %method, "root schema without body ignored");
                return Ok(());
            }
            if let Some(fragment) = self.converter.convert_rule(rule)? {
                let action = required_action(route, full_path)?;
                extracted.request_body = Some(RequestBody {
                    content_types: self.content_types(route),
                    schema: store.lift(fragment.schema, action),
                    required: !fragment.optional,
                });
            }
            return Ok(());
        };

        let mut body_fields = IndexMap::new();
        for (name, fragment) in self.fields_without(fields, placeholders)? {
            let location = docs
                .parameter_locations
                .get(&name)
                .copied()
                .unwrap_or(if carries_body {
                    ParamLocation::Body
                } else {
                    ParamLocation::Query
                });
            match location {
                ParamLocation::Query => {
                    let param = query_parameter(route, full_path, name, fragment, store);
                    extracted.query_parameters.push(param);
                }
                ParamLocation::Body => {
                    body_fields.insert(name, fragment);
                }
            }
        }

        if !body_fields.is_empty() {
            let action = required_action(route, full_path)?;
            let reference = store.register_object(action, body_fields, meta);
            let required = !store.resolve(&reference)?.required.is_empty();
            extracted.request_body = Some(RequestBody {
                content_types: self.content_types(route),
                schema: reference,
                required,
            });
        }
        Ok(())
    }

    fn content_types(&self, route: &Route) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for parser in &route.body_parsers {
            let mime = parser.mime();
            if !types.iter().any(|t| t == mime) {
                types.push(mime.to_string());
            }
        }
        if types.is_empty() {
            types = self.settings.default_content_types.clone();
        }
        types
    }
}

/// The named fields of a schema: a field map, or the properties of a root
/// object rule.
fn field_rules(schema: &RuleSchema) -> Option<(&IndexMap<String, Rule>, &RuleMeta)> {
    match schema {
        RuleSchema::Fields { fields, meta } => Some((fields, meta)),
        RuleSchema::Root(rule) => match &rule.kind {
            RuleKind::Object(object) => object.properties.as_ref().map(|p| (p, &rule.meta)),
            _ => None,
        },
    }
}

fn is_object_rule(schema: &RuleSchema) -> bool {
    matches!(schema, RuleSchema::Root(rule) if matches!(rule.kind, RuleKind::Object(_)))
}

fn query_parameter(
    route: &Route,
    full_path: &str,
    name: String,
    fragment: Fragment,
    store: &mut ComponentStore,
) -> Parameter {
    let deep_object = fragment
        .schema
        .as_object()
        .is_some_and(SchemaObject::is_object);
    let component = format!("{}.{}", component_prefix(route, full_path), name);
    Parameter {
        schema: store.lift(fragment.schema, &component),
        required: !fragment.optional,
        location: ParameterIn::Query,
        description: None,
        deep_object,
        name,
    }
}

fn component_prefix<'r>(route: &'r Route, fallback: &'r str) -> &'r str {
    route.action.as_deref().unwrap_or(fallback)
}

fn required_action<'r>(route: &'r Route, full_path: &str) -> AppResult<&'r str> {
    route
        .action
        .as_deref()
        .ok_or_else(|| AppError::MissingAction(full_path.to_string()))
}
