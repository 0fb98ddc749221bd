#![deny(missing_docs)]

//! # Rule Converter
//!
//! Maps one validation rule to one schema fragment (or to nothing, for
//! kinds that cannot be documented).
//!
//! Dispatch goes through a [`MapperTable`] holding one [`KindMapper`] per
//! [`RuleKindTag`]. Unknown kinds (`RuleKind::Other`) use the string mapper.
//! A table missing the mapper a rule needs is a configuration error and
//! surfaces as [`AppError::NotInitialized`].

pub mod formats;
pub mod mappers;

use crate::error::{AppError, AppResult};
use crate::fragment::{Fragment, Schema, SchemaObject};
use crate::rules::{Rule, RuleKind, RuleKindTag, RuleMeta};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Converts one rule kind into an inline schema.
///
/// Returning `Ok(None)` means "this field does not appear in the document".
pub trait KindMapper: Send + Sync {
    /// Maps `rule`. `converter` is available for recursion into child rules.
    fn map(
        &self,
        rule: &Rule,
        converter: &RuleConverter,
        ctx: &ConvertContext<'_>,
    ) -> AppResult<Option<SchemaObject>>;
}

impl<F> KindMapper for F
where
    F: Fn(&Rule, &RuleConverter, &ConvertContext<'_>) -> AppResult<Option<SchemaObject>>
        + Send
        + Sync,
{
    fn map(
        &self,
        rule: &Rule,
        converter: &RuleConverter,
        ctx: &ConvertContext<'_>,
    ) -> AppResult<Option<SchemaObject>> {
        self(rule, converter, ctx)
    }
}

/// Lookup table from rule kind to mapper.
#[derive(Clone, Default)]
pub struct MapperTable {
    mappers: HashMap<RuleKindTag, Arc<dyn KindMapper>>,
}

impl fmt::Debug for MapperTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds = self.mappers.keys().map(|tag| tag.name()).collect::<Vec<_>>();
        kinds.sort_unstable();
        f.debug_struct("MapperTable").field("kinds", &kinds).finish()
    }
}

impl MapperTable {
    /// A table with no mappers. Converting anything with it fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in mapper for every known kind.
    pub fn builtin() -> Self {
        use mappers::*;

        let mut table = Self::empty();
        table.insert(RuleKindTag::Any, map_any);
        table.insert(RuleKindTag::Array, map_array);
        table.insert(RuleKindTag::Boolean, map_boolean);
        table.insert(RuleKindTag::Class, map_omitted);
        table.insert(RuleKindTag::Currency, map_currency);
        table.insert(RuleKindTag::Custom, map_omitted);
        table.insert(RuleKindTag::Date, map_date);
        table.insert(RuleKindTag::Email, map_email);
        table.insert(RuleKindTag::Enum, map_enum);
        table.insert(RuleKindTag::Equal, map_equal);
        table.insert(RuleKindTag::Forbidden, map_omitted);
        table.insert(RuleKindTag::Function, map_omitted);
        table.insert(RuleKindTag::Luhn, map_luhn);
        table.insert(RuleKindTag::Mac, map_mac);
        table.insert(RuleKindTag::Multi, map_multi);
        table.insert(RuleKindTag::Number, map_number);
        table.insert(RuleKindTag::Object, map_object);
        table.insert(RuleKindTag::ObjectId, map_object_id);
        table.insert(RuleKindTag::Record, map_record);
        table.insert(RuleKindTag::String, map_string);
        table.insert(RuleKindTag::Tuple, map_tuple);
        table.insert(RuleKindTag::Url, map_url);
        table.insert(RuleKindTag::Uuid, map_uuid);
        table
    }

    /// Registers (or replaces) the mapper for `tag`.
    pub fn insert<M>(&mut self, tag: RuleKindTag, mapper: M)
    where
        M: KindMapper + 'static,
    {
        self.mappers.insert(tag, Arc::new(mapper));
    }

    /// Builder form of [`MapperTable::insert`].
    pub fn with_mapper<M>(mut self, tag: RuleKindTag, mapper: M) -> Self
    where
        M: KindMapper + 'static,
    {
        self.insert(tag, mapper);
        self
    }

    /// Returns the mapper registered for `tag`.
    pub fn get(&self, tag: RuleKindTag) -> Option<&dyn KindMapper> {
        self.mappers.get(&tag).map(|m| m.as_ref())
    }

    /// Whether a mapper is registered for `tag`.
    pub fn contains(&self, tag: RuleKindTag) -> bool {
        self.mappers.contains_key(&tag)
    }
}

/// Conversion scope: the enclosing object's fields, for `equal` rules that
/// point at a sibling field.
#[derive(Debug, Clone, Default)]
pub struct ConvertContext<'a> {
    siblings: Option<&'a IndexMap<String, Rule>>,
    resolving: Vec<String>,
}

impl<'a> ConvertContext<'a> {
    /// A context without siblings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose sibling scope is `siblings`.
    pub fn with_siblings(siblings: &'a IndexMap<String, Rule>) -> Self {
        Self {
            siblings: Some(siblings),
            resolving: Vec::new(),
        }
    }

    /// Looks up a sibling field rule.
    pub fn sibling(&self, name: &str) -> Option<&'a Rule> {
        self.siblings.and_then(|fields| fields.get(name))
    }

    /// Context used while converting sibling `field` on behalf of an `equal`
    /// rule. `None` when `field` is already being resolved (a cycle).
    pub fn resolving(&self, field: &str) -> Option<Self> {
        if self.resolving.iter().any(|f| f == field) {
            return None;
        }
        let mut next = self.clone();
        next.resolving.push(field.to_string());
        Some(next)
    }
}

/// Converts rules to fragments through a [`MapperTable`].
#[derive(Debug, Clone)]
pub struct RuleConverter {
    table: MapperTable,
}

impl Default for RuleConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleConverter {
    /// A converter with the built-in mappers.
    pub fn new() -> Self {
        Self::with_table(MapperTable::builtin())
    }

    /// A converter over a custom table.
    pub fn with_table(table: MapperTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub fn table(&self) -> &MapperTable {
        &self.table
    }

    /// The string mapper, which also serves unknown kinds and `enum`.
    pub fn base_mapper(&self) -> AppResult<&dyn KindMapper> {
        self.table.get(RuleKindTag::String).ok_or_else(|| {
            AppError::NotInitialized("base string mapper is not registered".into())
        })
    }

    fn mapper_for(&self, kind: &RuleKind) -> AppResult<&dyn KindMapper> {
        let tag = kind.tag();
        if let Some(mapper) = self.table.get(tag) {
            return Ok(mapper);
        }
        if tag == RuleKindTag::Other {
            return self.base_mapper();
        }
        Err(AppError::NotInitialized(format!(
            "no mapper registered for '{}' rules",
            tag
        )))
    }

    /// Converts `rule`.
    ///
    /// `defaults` fills documentation fields the rule leaves unset; `ctx`
    /// carries the sibling scope for `equal` rules.
    pub fn convert(
        &self,
        rule: &Rule,
        defaults: Option<&RuleMeta>,
        ctx: &ConvertContext<'_>,
    ) -> AppResult<Option<Fragment>> {
        let mapper = self.mapper_for(&rule.kind)?;
        let Some(mut object) = mapper.map(rule, self, ctx)? else {
            return Ok(None);
        };

        let mut meta = rule.meta.clone();
        if let Some(defaults) = defaults {
            meta.inherit(defaults);
        }
        if let Some(description) = meta.description {
            object.description = Some(description);
        }
        if let Some(summary) = meta.summary {
            object.summary = Some(summary);
        }
        if let Some(deprecated) = meta.deprecated {
            object.deprecated = Some(deprecated);
        }
        if rule.nullable {
            object.nullable = true;
        }
        if let Some(default) = &rule.default {
            object.default = Some(default.clone());
        }

        Ok(Some(Fragment {
            schema: Schema::Object(Box::new(object)),
            optional: rule.is_optional(),
        }))
    }

    /// Converts a standalone rule without sibling scope.
    pub fn convert_rule(&self, rule: &Rule) -> AppResult<Option<Fragment>> {
        self.convert(rule, None, &ConvertContext::new())
    }

    /// Converts every field of an object scope. Omitted fields are dropped,
    /// declaration order is kept.
    pub fn convert_fields(
        &self,
        fields: &IndexMap<String, Rule>,
    ) -> AppResult<IndexMap<String, Fragment>> {
        let ctx = ConvertContext::with_siblings(fields);
        let mut converted = IndexMap::with_capacity(fields.len());
        for (name, rule) in fields {
            if let Some(fragment) = self.convert(rule, None, &ctx)? {
                converted.insert(name.clone(), fragment);
            }
        }
        Ok(converted)
    }
}
