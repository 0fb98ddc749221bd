#![deny(missing_docs)]

//! # Schema Fragments
//!
//! Output unit of rule conversion. A [`Fragment`] pairs the public
//! [`Schema`] with bookkeeping that never reaches the document (the
//! optional marker), so nothing has to be stripped after assembly.
//!
//! A [`Schema`] is either a reference to a named component or an inline
//! [`SchemaObject`]; rendering to JSON is version-aware.

use crate::version::OpenApiVersion;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Prefix of every generated schema reference.
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// A converted rule: public schema plus internal markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The schema emitted into the document.
    pub schema: Schema,
    /// The described value may be absent.
    pub optional: bool,
}

impl Fragment {
    /// Wraps an inline schema object as a required fragment.
    pub fn new(object: SchemaObject) -> Self {
        Self {
            schema: Schema::Object(Box::new(object)),
            optional: false,
        }
    }
}

/// Either a component reference or an inline description, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Reference to `#/components/schemas/<name>`.
    Ref(String),
    /// Inline schema.
    Object(Box<SchemaObject>),
}

impl Schema {
    /// Inline schema of the given type.
    pub fn typed(schema_type: SchemaType) -> Self {
        Schema::Object(Box::new(SchemaObject::typed(schema_type)))
    }

    /// Returns the inline object, if any.
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Object(obj) => Some(obj),
            Schema::Ref(_) => None,
        }
    }

    /// Returns the inline object mutably, if any.
    pub fn as_object_mut(&mut self) -> Option<&mut SchemaObject> {
        match self {
            Schema::Object(obj) => Some(obj),
            Schema::Ref(_) => None,
        }
    }

    /// Returns the referenced component name, if any.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Schema::Ref(name) => Some(name),
            Schema::Object(_) => None,
        }
    }

    /// Renders the schema as JSON for the given OpenAPI version.
    pub fn to_value(&self, version: OpenApiVersion) -> Value {
        match self {
            Schema::Ref(name) => json!({ "$ref": format!("{}{}", COMPONENT_REF_PREFIX, name) }),
            Schema::Object(obj) => obj.to_value(version),
        }
    }
}

/// Structural JSON types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl SchemaType {
    /// The JSON Schema keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

/// `additionalProperties` value.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `true` / `false`.
    Allowed(bool),
    /// Schema every extra entry must match.
    Schema(Box<Schema>),
}

/// An inline schema description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaObject {
    /// Structural type; `None` accepts any value.
    pub schema_type: Option<SchemaType>,
    /// Named format (`email`, `uuid`, `binary`, ...).
    pub format: Option<String>,
    /// Human description.
    pub description: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Deprecation flag.
    pub deprecated: Option<bool>,
    /// `null` is accepted.
    pub nullable: bool,
    /// Default value.
    pub default: Option<Value>,
    /// Representative values.
    pub examples: Vec<Value>,
    /// Allowed values.
    pub enum_values: Option<Vec<Value>>,
    /// Regular expression.
    pub pattern: Option<String>,
    /// Minimum string length.
    pub min_length: Option<u64>,
    /// Maximum string length.
    pub max_length: Option<u64>,
    /// Inclusive lower bound.
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    pub maximum: Option<f64>,
    /// Exclusive lower bound.
    pub exclusive_minimum: Option<f64>,
    /// Exclusive upper bound.
    pub exclusive_maximum: Option<f64>,
    /// Array item schema.
    pub items: Option<Box<Schema>>,
    /// Minimum item count.
    pub min_items: Option<u64>,
    /// Maximum item count.
    pub max_items: Option<u64>,
    /// Items must be distinct.
    pub unique_items: Option<bool>,
    /// Named properties in declaration order.
    pub properties: IndexMap<String, Schema>,
    /// Names of required properties.
    pub required: Vec<String>,
    /// Schema or switch for unnamed properties.
    pub additional_properties: Option<AdditionalProperties>,
    /// Minimum property count.
    pub min_properties: Option<u64>,
    /// Maximum property count.
    pub max_properties: Option<u64>,
    /// Exactly one member matches.
    pub one_of: Vec<Schema>,
    /// At least one member matches.
    pub any_of: Vec<Schema>,
    /// Every member matches.
    pub all_of: Vec<Schema>,
}

impl SchemaObject {
    /// An unconstrained schema of the given type.
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// A string schema with a named format.
    pub fn formatted(format: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::String),
            format: Some(format.to_string()),
            ..Self::default()
        }
    }

    /// Whether this object is stored as a component when nested.
    pub fn is_named_object(&self) -> bool {
        self.schema_type == Some(SchemaType::Object) && !self.properties.is_empty()
    }

    /// Whether this object is any object-typed schema.
    pub fn is_object(&self) -> bool {
        self.schema_type == Some(SchemaType::Object)
    }

    /// Renders the object as JSON for the given OpenAPI version.
    pub fn to_value(&self, version: OpenApiVersion) -> Value {
        let mut map = Map::new();

        if let Some(ty) = self.schema_type {
            if self.nullable && version == OpenApiVersion::V3_1 {
                map.insert("type".to_string(), json!([ty.as_str(), "null"]));
            } else {
                map.insert("type".to_string(), json!(ty.as_str()));
            }
        }
        if self.nullable && version == OpenApiVersion::V3_0 {
            map.insert("nullable".to_string(), json!(true));
        }
        insert_opt(&mut map, "format", self.format.as_ref().map(|f| json!(f)));
        insert_opt(
            &mut map,
            "description",
            self.description.as_ref().map(|d| json!(d)),
        );
        insert_opt(&mut map, "summary", self.summary.as_ref().map(|s| json!(s)));
        insert_opt(&mut map, "deprecated", self.deprecated.map(|d| json!(d)));
        insert_opt(&mut map, "default", self.default.clone());
        insert_opt(&mut map, "enum", self.enum_values.clone().map(Value::Array));
        insert_opt(&mut map, "pattern", self.pattern.as_ref().map(|p| json!(p)));
        insert_opt(&mut map, "minLength", self.min_length.map(|v| json!(v)));
        insert_opt(&mut map, "maxLength", self.max_length.map(|v| json!(v)));
        self.insert_bounds(&mut map, version);

        insert_opt(
            &mut map,
            "items",
            self.items.as_ref().map(|items| items.to_value(version)),
        );
        insert_opt(&mut map, "minItems", self.min_items.map(|v| json!(v)));
        insert_opt(&mut map, "maxItems", self.max_items.map(|v| json!(v)));
        insert_opt(&mut map, "uniqueItems", self.unique_items.map(|v| json!(v)));

        if !self.properties.is_empty() {
            let props = self
                .properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_value(version)))
                .collect::<Map<_, _>>();
            map.insert("properties".to_string(), Value::Object(props));
        }
        if !self.required.is_empty() {
            map.insert("required".to_string(), json!(self.required));
        }
        match &self.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                map.insert("additionalProperties".to_string(), json!(allowed));
            }
            Some(AdditionalProperties::Schema(schema)) => {
                map.insert(
                    "additionalProperties".to_string(),
                    schema.to_value(version),
                );
            }
            None => {}
        }
        insert_opt(&mut map, "minProperties", self.min_properties.map(|v| json!(v)));
        insert_opt(&mut map, "maxProperties", self.max_properties.map(|v| json!(v)));

        insert_members(&mut map, "oneOf", &self.one_of, version);
        insert_members(&mut map, "anyOf", &self.any_of, version);
        insert_members(&mut map, "allOf", &self.all_of, version);

        if !self.examples.is_empty() {
            if version.uses_examples_array() {
                map.insert("examples".to_string(), Value::Array(self.examples.clone()));
            } else {
                map.insert("example".to_string(), self.examples[0].clone());
            }
        }

        Value::Object(map)
    }

    fn insert_bounds(&self, map: &mut Map<String, Value>, version: OpenApiVersion) {
        if version.numeric_exclusive_bounds() {
            insert_opt(map, "minimum", self.minimum.map(number_value));
            insert_opt(map, "maximum", self.maximum.map(number_value));
            insert_opt(map, "exclusiveMinimum", self.exclusive_minimum.map(number_value));
            insert_opt(map, "exclusiveMaximum", self.exclusive_maximum.map(number_value));
            return;
        }

        // 3.0 spells exclusive bounds as a flag on minimum / maximum.
        match self.exclusive_minimum {
            Some(bound) => {
                map.insert("minimum".to_string(), number_value(bound));
                map.insert("exclusiveMinimum".to_string(), json!(true));
            }
            None => insert_opt(map, "minimum", self.minimum.map(number_value)),
        }
        match self.exclusive_maximum {
            Some(bound) => {
                map.insert("maximum".to_string(), number_value(bound));
                map.insert("exclusiveMaximum".to_string(), json!(true));
            }
            None => insert_opt(map, "maximum", self.maximum.map(number_value)),
        }
    }
}

/// Renders a float as an integer literal when it has no fractional part.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn insert_members(
    map: &mut Map<String, Value>,
    key: &str,
    members: &[Schema],
    version: OpenApiVersion,
) {
    if !members.is_empty() {
        let values = members.iter().map(|m| m.to_value(version)).collect();
        map.insert(key.to_string(), Value::Array(values));
    }
}
