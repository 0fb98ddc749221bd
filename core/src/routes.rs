#![deny(missing_docs)]

//! # Route Model
//!
//! The unit the generator consumes. Routes are supplied fully formed by the
//! routing layer (or deserialized from an input file) and only read here.
//!
//! Documentation overrides exist on four levels, merged in ascending
//! precedence: service < route < action < alias.

use crate::error::{AppError, AppResult};
use crate::rules::{Rule, RuleSchema};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// HTTP methods that can carry an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
}

impl HttpMethod {
    /// What a `*` route method expands to.
    pub const ANY: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Key of the operation inside a path item.
    pub fn path_item_key(self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(AppError::General(format!("Unknown HTTP method: {}", other))),
        }
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodList {
    One(String),
    Many(Vec<String>),
}

/// Accepts `"GET"`, `"*"` or a list of either; `*` expands to [`HttpMethod::ANY`].
fn deserialize_methods<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<HttpMethod>, D::Error> {
    let names = match MethodList::deserialize(deserializer)? {
        MethodList::One(name) => vec![name],
        MethodList::Many(names) => names,
    };
    let mut methods = Vec::new();
    for name in names {
        let expanded = if name.trim() == "*" {
            HttpMethod::ANY.to_vec()
        } else {
            vec![name.parse().map_err(serde::de::Error::custom)?]
        };
        for method in expanded {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
    }
    Ok(methods)
}

/// Where a top-level field of an ordinary route is documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Query string parameter.
    Query,
    /// Property of the request body.
    Body,
}

/// A body parser configured on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyParser {
    /// JSON bodies.
    Json,
    /// URL-encoded forms.
    Urlencoded,
    /// Plain text.
    Text,
    /// Raw bytes.
    Raw,
}

impl BodyParser {
    /// MIME type accepted by this parser.
    pub fn mime(self) -> &'static str {
        match self {
            BodyParser::Json => "application/json",
            BodyParser::Urlencoded => "application/x-www-form-urlencoded",
            BodyParser::Text => "text/plain",
            BodyParser::Raw => "application/octet-stream",
        }
    }
}

/// Multipart upload configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultipartOptions {
    /// Name of the file field; the generator setting applies when unset.
    pub file_field: Option<String>,
    /// Maximum file count. `1` documents a single file, anything else an array.
    pub max_files: Option<u64>,
}

/// How the request body of a route is produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouteKind {
    /// Parameters and body derived from the action's rule schema.
    #[default]
    Standard,
    /// `multipart/form-data` file upload.
    Multipart(MultipartOptions),
    /// Raw binary stream.
    Stream,
}

/// A server entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Server {
    /// Base URL.
    pub url: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Server {
    /// A server without description.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    /// JSON form.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("url".to_string(), json!(self.url));
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        Value::Object(map)
    }
}

/// A tag definition for the document's global tag list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Tag {
    /// A tag without description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// JSON form.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name));
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        Value::Object(map)
    }
}

/// An explicit path parameter, replacing the one derived from the URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PathParameter {
    /// Placeholder name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Rule describing the value; a plain string when absent.
    #[serde(default)]
    pub rule: Option<Rule>,
}

/// Documentation overrides of one level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationDocs {
    /// Operation summary, also `{{summary}}` in the summary template.
    pub summary: Option<String>,
    /// Operation description.
    pub description: Option<String>,
    /// Explicit `operationId`.
    pub operation_id: Option<String>,
    /// Deprecation flag.
    pub deprecated: Option<bool>,
    /// Tag names of the operation.
    pub tags: Option<Vec<String>>,
    /// Tag definitions for the global tag list.
    pub tag_definitions: Vec<Tag>,
    /// Explicit path parameters.
    pub path_parameters: Option<Vec<PathParameter>>,
    /// Per-field query / body placement.
    pub parameter_locations: IndexMap<String, ParamLocation>,
    /// Raw responses object.
    pub responses: Option<Value>,
    /// Raw security requirements.
    pub security: Option<Value>,
    /// Any other operation keys, copied verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationDocs {
    /// Overlays `higher` onto `self`: every value set on `higher` wins.
    pub fn merge(&mut self, higher: &OperationDocs) {
        fn overlay<T: Clone>(slot: &mut Option<T>, higher: &Option<T>) {
            if higher.is_some() {
                slot.clone_from(higher);
            }
        }

        overlay(&mut self.summary, &higher.summary);
        overlay(&mut self.description, &higher.description);
        overlay(&mut self.operation_id, &higher.operation_id);
        overlay(&mut self.deprecated, &higher.deprecated);
        overlay(&mut self.tags, &higher.tags);
        overlay(&mut self.path_parameters, &higher.path_parameters);
        overlay(&mut self.responses, &higher.responses);
        overlay(&mut self.security, &higher.security);
        self.tag_definitions
            .extend(higher.tag_definitions.iter().cloned());
        for (field, location) in &higher.parameter_locations {
            self.parameter_locations.insert(field.clone(), *location);
        }
        for (key, value) in &higher.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// The service owning a route's action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Service name; the fallback tag.
    pub name: String,
    /// Service-level documentation.
    pub docs: OperationDocs,
}

/// One registered route (alias).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    /// Declared methods; empty means `*`.
    #[serde(deserialize_with = "deserialize_methods")]
    pub methods: Vec<HttpMethod>,
    /// Full URL template, `{param}` or `:param` placeholders.
    pub path: String,
    /// Bound action name.
    pub action: Option<String>,
    /// The action's rule schema.
    pub params: Option<RuleSchema>,
    /// Body production mode.
    pub kind: RouteKind,
    /// Wildcard / pass-through route intentionally without an action.
    pub joker: bool,
    /// Route created automatically from the action list.
    pub auto_alias: bool,
    /// Server this route is exposed on.
    pub server: Option<Server>,
    /// Configured body parsers.
    pub body_parsers: Vec<BodyParser>,
    /// Owning service.
    pub service: Option<ServiceInfo>,
    /// Route-level documentation.
    pub route_docs: OperationDocs,
    /// Action-level documentation.
    pub action_docs: OperationDocs,
    /// Alias-level documentation, the strongest level.
    pub alias_docs: OperationDocs,
}

impl Route {
    /// A route for one method.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            methods: vec![method],
            path: path.into(),
            ..Self::default()
        }
    }

    /// Replaces the declared methods.
    pub fn with_methods(mut self, methods: &[HttpMethod]) -> Self {
        self.methods = methods.to_vec();
        self
    }

    /// Binds an action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the action's rule schema.
    pub fn with_params(mut self, params: RuleSchema) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the body production mode.
    pub fn with_kind(mut self, kind: RouteKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the route as a joker route.
    pub fn joker(mut self) -> Self {
        self.joker = true;
        self
    }

    /// Exposes the route on `server`.
    pub fn with_server(mut self, server: Server) -> Self {
        self.server = Some(server);
        self
    }

    /// Sets the body parsers.
    pub fn with_body_parsers(mut self, parsers: &[BodyParser]) -> Self {
        self.body_parsers = parsers.to_vec();
        self
    }

    /// Sets the owning service.
    pub fn with_service(mut self, service: ServiceInfo) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets route-level documentation.
    pub fn with_route_docs(mut self, docs: OperationDocs) -> Self {
        self.route_docs = docs;
        self
    }

    /// Sets action-level documentation.
    pub fn with_action_docs(mut self, docs: OperationDocs) -> Self {
        self.action_docs = docs;
        self
    }

    /// Sets alias-level documentation.
    pub fn with_alias_docs(mut self, docs: OperationDocs) -> Self {
        self.alias_docs = docs;
        self
    }

    /// Methods to document, `*` expanded.
    pub fn effective_methods(&self) -> Vec<HttpMethod> {
        if self.methods.is_empty() {
            HttpMethod::ANY.to_vec()
        } else {
            self.methods.clone()
        }
    }

    /// Normalised URL template.
    pub fn full_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Docs of every level merged in precedence order.
    pub fn merged_docs(&self) -> OperationDocs {
        let mut docs = self
            .service
            .as_ref()
            .map(|service| service.docs.clone())
            .unwrap_or_default();
        docs.merge(&self.route_docs);
        docs.merge(&self.action_docs);
        docs.merge(&self.alias_docs);
        docs
    }
}

/// Rewrites `:param` placeholders to `{param}`, collapses repeated slashes
/// and drops a trailing slash.
pub fn normalize_path(path: &str) -> String {
    static COLON_RE: OnceLock<Regex> = OnceLock::new();
    let colon_re =
        COLON_RE.get_or_init(|| Regex::new(r":([A-Za-z0-9_]+)").expect("Invalid regex"));

    let braced = colon_re.replace_all(path.trim(), "{$1}");
    let mut normalized = String::with_capacity(braced.len() + 1);
    if !braced.starts_with('/') {
        normalized.push('/');
    }
    for c in braced.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Placeholder names of a normalised path, in order of appearance.
pub fn path_placeholders(path: &str) -> Vec<String> {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    let placeholder_re =
        PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^}/]+)\}").expect("Invalid regex"));

    placeholder_re
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/users/:id"), "/users/{id}");
        assert_eq!(normalize_path("api//users/"), "/api/users");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/a/:b/c/:d_e"), "/a/{b}/c/{d_e}");
    }

    #[test]
    fn test_path_placeholders_in_order() {
        assert_eq!(
            path_placeholders("/orgs/{org}/users/{id}"),
            vec!["org".to_string(), "id".to_string()]
        );
        assert!(path_placeholders("/users").is_empty());
    }

    #[test]
    fn test_methods_deserialize_wildcard_and_lists() {
        let route: Route = serde_json::from_value(json!({ "methods": "*", "path": "/x" })).unwrap();
        assert_eq!(route.methods, HttpMethod::ANY.to_vec());

        let route: Route =
            serde_json::from_value(json!({ "methods": ["get", "POST", "get"], "path": "/x" }))
                .unwrap();
        assert_eq!(route.methods, vec![HttpMethod::Get, HttpMethod::Post]);

        let bad = serde_json::from_value::<Route>(json!({ "methods": "FETCH" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_route_deserializes_kind_and_docs() {
        let route: Route = serde_json::from_value(json!({
            "methods": "POST",
            "path": "/upload",
            "action": "files.upload",
            "kind": { "type": "multipart", "maxFiles": 1 },
            "bodyParsers": ["json", "urlencoded"],
            "aliasDocs": { "summary": "Upload", "x-internal": true }
        }))
        .unwrap();
        assert_eq!(
            route.kind,
            RouteKind::Multipart(MultipartOptions {
                file_field: None,
                max_files: Some(1)
            })
        );
        assert_eq!(route.body_parsers[1].mime(), "application/x-www-form-urlencoded");
        assert_eq!(route.alias_docs.summary.as_deref(), Some("Upload"));
        assert_eq!(route.alias_docs.extra["x-internal"], true);
    }

    #[test]
    fn test_docs_precedence() {
        let route = Route::new(HttpMethod::Get, "/x")
            .with_service(ServiceInfo {
                name: "users".into(),
                docs: OperationDocs {
                    summary: Some("service".into()),
                    description: Some("from service".into()),
                    ..OperationDocs::default()
                },
            })
            .with_route_docs(OperationDocs {
                summary: Some("route".into()),
                ..OperationDocs::default()
            })
            .with_action_docs(OperationDocs {
                summary: Some("action".into()),
                deprecated: Some(true),
                ..OperationDocs::default()
            })
            .with_alias_docs(OperationDocs {
                summary: Some("alias".into()),
                ..OperationDocs::default()
            });

        let docs = route.merged_docs();
        assert_eq!(docs.summary.as_deref(), Some("alias"));
        assert_eq!(docs.description.as_deref(), Some("from service"));
        assert_eq!(docs.deprecated, Some(true));
    }

    #[test]
    fn test_empty_methods_mean_any() {
        let route = Route::default();
        assert_eq!(route.effective_methods().len(), 5);
    }
}
