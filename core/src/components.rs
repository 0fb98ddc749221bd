#![deny(missing_docs)]

//! # Component Store
//!
//! Named, reusable schema objects referenced from operations through
//! `#/components/schemas/<name>`.
//!
//! Naming is path-like and deterministic:
//! - a nested object field is stored as `<parent>.<field>`,
//! - an object-typed array item is stored under the parent name itself,
//! - object members of `oneOf` / `anyOf` / `allOf` are stored as `<parent>.<index>`.
//!
//! Registering an existing name replaces the stored schema and records a
//! [`GenerationWarning::ComponentCollision`].

use crate::error::{AppError, AppResult};
use crate::fragment::{AdditionalProperties, Fragment, Schema, SchemaObject, SchemaType};
use crate::rules::RuleMeta;
use crate::version::OpenApiVersion;
use crate::warning::GenerationWarning;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Holds generated components in registration order.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    schemas: IndexMap<String, SchemaObject>,
    warnings: Vec<GenerationWarning>,
}

impl ComponentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object built from converted fields and returns a reference
    /// to it.
    ///
    /// `required` lists every field whose fragment is not optional. Nested
    /// objects found in the fields are lifted into their own components.
    /// `defaults` supplies the object's description / summary / deprecation.
    pub fn register_object(
        &mut self,
        name: &str,
        fields: IndexMap<String, Fragment>,
        defaults: &RuleMeta,
    ) -> Schema {
        let mut object = SchemaObject::typed(SchemaType::Object);
        for (field, fragment) in fields {
            if !fragment.optional {
                object.required.push(field.clone());
            }
            let schema = self.lift(fragment.schema, &format!("{}.{}", name, field));
            object.properties.insert(field, schema);
        }
        object.description = defaults.description.clone();
        object.summary = defaults.summary.clone();
        object.deprecated = defaults.deprecated;
        self.store(name, object)
    }

    /// Stores an already converted object under `name` (lifting its nested
    /// objects) and returns a reference to it.
    pub fn register_schema(&mut self, name: &str, mut object: SchemaObject) -> Schema {
        self.lift_children(&mut object, name);
        self.store(name, object)
    }

    /// Replaces every nested named object inside `schema` with a reference,
    /// storing the objects. A named object at the top is itself stored as
    /// `name`.
    pub fn lift(&mut self, schema: Schema, name: &str) -> Schema {
        match schema {
            Schema::Ref(_) => schema,
            Schema::Object(object) if object.is_named_object() => {
                self.register_schema(name, *object)
            }
            Schema::Object(mut object) => {
                self.lift_children(&mut object, name);
                Schema::Object(object)
            }
        }
    }

    fn lift_children(&mut self, object: &mut SchemaObject, name: &str) {
        let properties = std::mem::take(&mut object.properties);
        object.properties = properties
            .into_iter()
            .map(|(field, schema)| {
                let lifted = self.lift(schema, &format!("{}.{}", name, field));
                (field, lifted)
            })
            .collect();

        if let Some(items) = object.items.take() {
            object.items = Some(Box::new(self.lift(*items, name)));
        }
        object.additional_properties = match object.additional_properties.take() {
            Some(AdditionalProperties::Schema(value)) => Some(AdditionalProperties::Schema(
                Box::new(self.lift(*value, name)),
            )),
            other => other,
        };
        for members in [&mut object.one_of, &mut object.any_of, &mut object.all_of] {
            let taken = std::mem::take(members);
            *members = taken
                .into_iter()
                .enumerate()
                .map(|(index, member)| self.lift(member, &format!("{}.{}", name, index)))
                .collect();
        }
    }

    fn store(&mut self, name: &str, object: SchemaObject) -> Schema {
        if self.schemas.insert(name.to_string(), object).is_some() {
            self.collision(name);
        }
        Schema::Ref(name.to_string())
    }

    fn collision(&mut self, name: &str) {
        tracing::warn!(component = name, "component registered twice, overwriting");
        self.warnings.push(GenerationWarning::ComponentCollision {
            name: name.to_string(),
        });
    }

    /// Returns the stored component.
    pub fn get(&self, name: &str) -> Option<&SchemaObject> {
        self.schemas.get(name)
    }

    /// Resolves a schema to its object: inline objects as-is, references
    /// through the store.
    pub fn resolve<'a>(&'a self, schema: &'a Schema) -> AppResult<&'a SchemaObject> {
        match schema {
            Schema::Object(object) => Ok(object),
            Schema::Ref(name) => self
                .schemas
                .get(name)
                .ok_or_else(|| AppError::UnresolvedReference(name.clone())),
        }
    }

    /// Moves every component of `other` into this store, with the usual
    /// collision handling, and keeps its recorded warnings.
    pub fn absorb(&mut self, other: ComponentStore) {
        self.warnings.extend(other.warnings);
        for (name, object) in other.schemas {
            if self.schemas.insert(name.clone(), object).is_some() {
                self.collision(&name);
            }
        }
    }

    /// Keeps only the components for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &SchemaObject) -> bool) {
        self.schemas.retain(|name, object| keep(name, object));
    }

    /// Removes every component and warning.
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.warnings.clear();
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Iterates over components in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaObject)> {
        self.schemas.iter()
    }

    /// Drains the warnings recorded since the last call.
    pub fn take_warnings(&mut self) -> Vec<GenerationWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Renders every component for the given version.
    pub fn to_value(&self, version: OpenApiVersion) -> Map<String, Value> {
        self.schemas
            .iter()
            .map(|(name, object)| (name.clone(), object.to_value(version)))
            .collect()
    }
}
