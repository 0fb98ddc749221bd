#![deny(missing_docs)]

//! # Document Generator
//!
//! Assembles one OpenAPI document from a list of routes.
//!
//! 1. Seed the document from the base skeleton (its `openapi` field is
//!    discarded, the version argument is authoritative).
//! 2. Walk the routes sorted by normalised path.
//! 3. Per route and method: build the operation into a staging component
//!    store, then accept it, append a new server to an identical existing
//!    operation, or drop it as a duplicate.
//! 4. Render summaries through the configured [`SummaryTemplate`].
//! 5. Sort tags, merge components (base entries win) and strip reserved
//!    `$$` keys.

use crate::components::ComponentStore;
use crate::converter::RuleConverter;
use crate::error::{AppError, AppResult};
use crate::fragment::SchemaObject;
use crate::params::{ExtractedParameters, ParameterExtractor};
use crate::routes::{HttpMethod, OperationDocs, Route, Server, Tag};
use crate::rules::parse::RESERVED_PREFIX;
use crate::version::OpenApiVersion;
use crate::warning::GenerationWarning;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Template used when none is configured.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "{{summary}}\n            ({{action}}){{autoAlias}}";

/// Values available to summary rendering.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    /// Merged docs summary, empty when unset.
    pub summary: &'a str,
    /// Bound action name.
    pub action: &'a str,
    /// The auto-alias suffix on auto-aliased routes, empty otherwise.
    pub auto_alias: &'a str,
}

/// Callback form of a summary template.
pub type SummaryFn = dyn Fn(&SummaryContext<'_>) -> String + Send + Sync;

/// How operation summaries are produced.
#[derive(Clone)]
pub enum SummaryTemplate {
    /// `{{summary}}`, `{{action}}` and `{{autoAlias}}` are substituted.
    Template(String),
    /// Called with the same values.
    Function(Arc<SummaryFn>),
}

impl SummaryTemplate {
    /// Wraps a callback.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&SummaryContext<'_>) -> String + Send + Sync + 'static,
    {
        SummaryTemplate::Function(Arc::new(f))
    }

    /// Renders the summary; the result is trimmed.
    pub fn render(&self, ctx: &SummaryContext<'_>) -> String {
        match self {
            SummaryTemplate::Function(f) => f(ctx).trim().to_string(),
            SummaryTemplate::Template(template) => {
                static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
                let placeholder_re = PLACEHOLDER_RE
                    .get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("Invalid regex"));

                placeholder_re
                    .replace_all(template, |caps: &regex::Captures<'_>| match &caps[1] {
                        "summary" => ctx.summary.to_string(),
                        "action" => ctx.action.to_string(),
                        "autoAlias" => ctx.auto_alias.to_string(),
                        _ => caps[0].to_string(),
                    })
                    .trim()
                    .to_string()
            }
        }
    }
}

impl Default for SummaryTemplate {
    fn default() -> Self {
        SummaryTemplate::Template(DEFAULT_SUMMARY_TEMPLATE.to_string())
    }
}

impl fmt::Debug for SummaryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryTemplate::Template(template) => {
                f.debug_tuple("Template").field(template).finish()
            }
            SummaryTemplate::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for SummaryTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SummaryTemplate::Template)
    }
}

/// Lifetime of generated components on a generator instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentLifetime {
    /// Cleared at the start of every `generate()` call.
    #[default]
    PerCall,
    /// Kept across calls; later registrations overwrite with a warning.
    Persistent,
}

/// Generator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Summary template or callback.
    pub summary_template: SummaryTemplate,
    /// Request content types when a route has no body parsers.
    pub default_content_types: Vec<String>,
    /// Name of the multipart file field.
    pub multipart_file_field: String,
    /// Responses used when no docs level defines any.
    pub default_responses: Value,
    /// Methods whose fields default to the request body.
    pub body_methods: Vec<HttpMethod>,
    /// Component store lifetime.
    pub component_lifetime: ComponentLifetime,
    /// Substituted for `{{autoAlias}}` on auto-aliased routes.
    pub auto_alias_suffix: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            summary_template: SummaryTemplate::default(),
            default_content_types: vec!["application/json".to_string()],
            multipart_file_field: "file".to_string(),
            default_responses: json!({ "200": { "description": "" } }),
            body_methods: vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch],
            component_lifetime: ComponentLifetime::PerCall,
            auto_alias_suffix: " [autoAlias]".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Operation {
    summary: Option<String>,
    description: Option<String>,
    operation_id: Option<String>,
    deprecated: Option<bool>,
    tags: Vec<String>,
    parameters: ExtractedParameters,
    responses: Value,
    security: Option<Value>,
    extra: Map<String, Value>,
    servers: Vec<Server>,
    claimed_by: String,
}

impl Operation {
    /// Equal in everything but the server list.
    fn same_definition(&self, other: &Operation) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.servers.clear();
        b.servers.clear();
        a == b
    }

    fn to_value(&self, version: OpenApiVersion) -> Value {
        let mut map = Map::new();
        if !self.tags.is_empty() {
            map.insert("tags".to_string(), json!(self.tags));
        }
        if let Some(summary) = &self.summary {
            map.insert("summary".to_string(), json!(summary));
        }
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        if let Some(operation_id) = &self.operation_id {
            map.insert("operationId".to_string(), json!(operation_id));
        }
        if let Some(deprecated) = self.deprecated {
            map.insert("deprecated".to_string(), json!(deprecated));
        }
        let parameters = self
            .parameters
            .parameters()
            .map(|p| p.to_value(version))
            .collect::<Vec<_>>();
        if !parameters.is_empty() {
            map.insert("parameters".to_string(), Value::Array(parameters));
        }
        if let Some(body) = &self.parameters.request_body {
            map.insert("requestBody".to_string(), body.to_value(version));
        }
        map.insert("responses".to_string(), self.responses.clone());
        if let Some(security) = &self.security {
            map.insert("security".to_string(), security.clone());
        }
        if !self.servers.is_empty() {
            let servers = self.servers.iter().map(Server::to_value).collect();
            map.insert("servers".to_string(), Value::Array(servers));
        }
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(map)
    }
}

/// Builds documents from route lists.
#[derive(Debug, Clone, Default)]
pub struct DocumentGenerator {
    settings: GeneratorSettings,
    converter: RuleConverter,
    base: Map<String, Value>,
    components: ComponentStore,
    warnings: Vec<GenerationWarning>,
}

impl DocumentGenerator {
    /// A generator with default settings and the built-in converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator with the given settings.
    pub fn with_settings(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Uses `converter` instead of the built-in one.
    pub fn with_converter(mut self, converter: RuleConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Sets the skeleton (info, security schemes, ...) generated content is
    /// merged into. Must be a JSON object.
    pub fn with_base_document(mut self, base: Value) -> AppResult<Self> {
        match base {
            Value::Object(map) => {
                self.base = map;
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(AppError::General(format!(
                "Base document must be an object, found {}",
                other
            ))),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Warnings recorded by the last `generate()` call.
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    /// The component store.
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Clears stored components regardless of the configured lifetime.
    pub fn reset_components(&mut self) {
        self.components.clear();
    }

    /// Generates the document for `version` from `routes`.
    ///
    /// Fails on the first fatal condition; no partial document is returned.
    pub fn generate(&mut self, version: &str, routes: &[Route]) -> AppResult<Value> {
        let oas_version = OpenApiVersion::parse(version)?;
        self.warnings.clear();
        if self.settings.component_lifetime == ComponentLifetime::PerCall {
            self.components.clear();
        }

        let mut base = self.base.clone();
        if let Some(previous) = base.remove("openapi") {
            let previous = previous
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| previous.to_string());
            tracing::warn!(version = %previous, "base document version discarded");
            self.warnings
                .push(GenerationWarning::DiscardedBaseVersion { version: previous });
        }
        let mut tags = Vec::new();
        if let Some(base_tags) = base.remove("tags") {
            for tag in serde_json::from_value::<Vec<Tag>>(base_tags)? {
                register_tag(&mut tags, tag);
            }
        }
        let mut servers = Vec::new();
        if let Some(base_servers) = base.remove("servers") {
            for server in serde_json::from_value::<Vec<Server>>(base_servers)? {
                add_server(&mut servers, &server);
            }
        }

        let mut ordered = routes.iter().collect::<Vec<_>>();
        ordered.sort_by_cached_key(|route| route.full_path());

        let mut paths: BTreeMap<String, BTreeMap<HttpMethod, Operation>> = BTreeMap::new();
        for route in ordered {
            if route.action.is_none() && !route.joker {
                tracing::debug!(path = %route.path, "route without action skipped");
                continue;
            }
            let full_path = route.full_path();
            let docs = route.merged_docs();
            tracing::debug!(path = %full_path, action = ?route.action, "documenting route");

            // Components this route already added for an earlier method.
            let mut contributed: IndexMap<String, SchemaObject> = IndexMap::new();
            for method in route.effective_methods() {
                let claimed = paths
                    .get_mut(&full_path)
                    .and_then(|item| item.get_mut(&method));
                if let Some(existing) = claimed {
                    if let Some(server) =
                        self.shared_server(existing, method, &full_path, route, &docs)
                    {
                        existing.servers.push(server.clone());
                        add_server(&mut servers, server);
                        continue;
                    }
                    tracing::warn!(
                        path = %full_path,
                        %method,
                        claimed_by = %existing.claimed_by,
                        "operation already generated, later route dropped"
                    );
                    self.warnings.push(GenerationWarning::DuplicateOperation {
                        path: full_path.clone(),
                        method: method.to_string(),
                        claimed_by: existing.claimed_by.clone(),
                    });
                    continue;
                }

                let mut staging = ComponentStore::new();
                let operation =
                    self.build_operation(method, &full_path, route, &docs, &mut staging)?;
                staging.retain(|name, object| contributed.get(name) != Some(object));
                contributed.extend(
                    staging
                        .iter()
                        .map(|(name, object)| (name.clone(), object.clone())),
                );
                self.components.absorb(staging);
                self.warnings.extend(self.components.take_warnings());
                for tag in &docs.tag_definitions {
                    register_tag(&mut tags, tag.clone());
                }
                for name in &operation.tags {
                    register_tag(&mut tags, Tag::new(name.clone()));
                }
                if let Some(server) = &route.server {
                    add_server(&mut servers, server);
                }
                paths
                    .entry(full_path.clone())
                    .or_default()
                    .insert(method, operation);
            }
        }

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        let mut document = Map::new();
        document.insert("openapi".to_string(), json!(version));
        let base_paths = base.remove("paths");
        let base_components = base.remove("components");
        for (key, value) in base {
            document.insert(key, value);
        }
        document.insert(
            "tags".to_string(),
            Value::Array(tags.iter().map(Tag::to_value).collect()),
        );
        document.insert(
            "servers".to_string(),
            Value::Array(servers.iter().map(Server::to_value).collect()),
        );
        document.insert(
            "paths".to_string(),
            render_paths(base_paths, &paths, oas_version),
        );
        document.insert(
            "components".to_string(),
            self.render_components(base_components, oas_version),
        );

        let mut document = Value::Object(document);
        strip_reserved(&mut document);
        Ok(document)
    }

    fn build_operation(
        &self,
        method: HttpMethod,
        full_path: &str,
        route: &Route,
        docs: &OperationDocs,
        staging: &mut ComponentStore,
    ) -> AppResult<Operation> {
        let extractor = ParameterExtractor::new(&self.converter, &self.settings);
        let parameters = extractor.extract(method, full_path, route, docs, staging)?;
        let action = route.action.as_deref();

        let summary = match action {
            Some(action) => {
                let auto_alias = if route.auto_alias {
                    self.settings.auto_alias_suffix.as_str()
                } else {
                    ""
                };
                Some(self.settings.summary_template.render(&SummaryContext {
                    summary: docs.summary.as_deref().unwrap_or(""),
                    action,
                    auto_alias,
                }))
            }
            None => docs.summary.clone(),
        }
        .filter(|summary| !summary.is_empty());
        let responses = docs
            .responses
            .clone()
            .unwrap_or_else(|| self.settings.default_responses.clone());
        let servers = route.server.iter().cloned().collect();
        let claimed_by = action.unwrap_or(full_path).to_string();

        if action.is_none() {
            return Ok(Operation {
                summary,
                description: None,
                operation_id: None,
                deprecated: None,
                tags: Vec::new(),
                parameters,
                responses,
                security: None,
                extra: Map::new(),
                servers,
                claimed_by,
            });
        }

        let tags = docs
            .tags
            .clone()
            .or_else(|| {
                route
                    .service
                    .as_ref()
                    .filter(|service| !service.name.is_empty())
                    .map(|service| vec![service.name.clone()])
            })
            .unwrap_or_default();
        Ok(Operation {
            summary,
            description: docs.description.clone(),
            operation_id: docs
                .operation_id
                .clone()
                .or_else(|| action.map(str::to_string)),
            deprecated: docs.deprecated,
            tags,
            parameters,
            responses,
            security: docs.security.clone(),
            extra: docs.extra.clone(),
            servers,
            claimed_by,
        })
    }

    /// The route's server, when the route documents exactly `existing` and
    /// the server is not listed yet. A route that fails to build never
    /// matches.
    fn shared_server<'r>(
        &self,
        existing: &Operation,
        method: HttpMethod,
        full_path: &str,
        route: &'r Route,
        docs: &OperationDocs,
    ) -> Option<&'r Server> {
        let server = route
            .server
            .as_ref()
            .filter(|server| !existing.servers.contains(server))?;
        let mut staging = ComponentStore::new();
        match self.build_operation(method, full_path, route, docs, &mut staging) {
            Ok(operation) => existing.same_definition(&operation).then_some(server),
            Err(err) => {
                tracing::debug!(path = full_path, error = %err, "duplicate route does not build");
                None
            }
        }
    }

    fn render_components(&self, base: Option<Value>, version: OpenApiVersion) -> Value {
        let mut components = match base {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut schemas = match components.remove("schemas") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (name, schema) in self.components.to_value(version) {
            schemas.entry(name).or_insert(schema);
        }
        components.insert("schemas".to_string(), Value::Object(schemas));
        Value::Object(components)
    }
}

/// First definition of a name wins, except that a described tag replaces a
/// bare name registered earlier.
fn register_tag(tags: &mut Vec<Tag>, tag: Tag) {
    match tags.iter_mut().find(|t| t.name == tag.name) {
        Some(existing) => {
            if existing.description.is_none() && tag.description.is_some() {
                *existing = tag;
            }
        }
        None => tags.push(tag),
    }
}

fn add_server(servers: &mut Vec<Server>, server: &Server) {
    if !servers.iter().any(|s| s.url == server.url) {
        servers.push(server.clone());
    }
}

fn render_paths(
    base: Option<Value>,
    generated: &BTreeMap<String, BTreeMap<HttpMethod, Operation>>,
    version: OpenApiVersion,
) -> Value {
    let mut paths = match base {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (path, operations) in generated {
        let Value::Object(item) = paths
            .entry(path.clone())
            .or_insert_with(|| Value::Object(Map::new()))
        else {
            continue;
        };
        for (method, operation) in operations {
            item.entry(method.path_item_key())
                .or_insert_with(|| operation.to_value(version));
        }
    }

    let mut sorted = paths.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
    Value::Object(sorted.into_iter().collect())
}

/// Removes every key carrying the reserved prefix, recursively.
fn strip_reserved(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with(RESERVED_PREFIX));
            for child in map.values_mut() {
                strip_reserved(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_reserved),
        _ => {}
    }
}
