//! Reading rules from the JSON / YAML form of the rule language.
//!
//! Accepted shapes:
//! - `"string|optional|min:3"`: shorthand, flags become `true`;
//! - `{ "type": "number", "min": 1 }`: typed object;
//! - `{ "name": "string", "$$type": "object|optional" }`: nested object;
//! - `["string", "number"]`: one-of-N.
//!
//! Keys with the reserved `$$` prefix never become fields.

use super::{
    ArrayRule, CurrencyRule, DateRule, EnumRule, EqualRule, NumberRule, ObjectRule, RecordRule,
    Rule, RuleKind, RuleMeta, RuleSchema, StringRule, UuidRule,
};
use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

/// Key of the documentation side channel.
pub const META_KEY: &str = "$$oa";
/// Prefix shared by every reserved key.
pub const RESERVED_PREFIX: &str = "$$";

const ROOT_KEY: &str = "$$root";
const NESTED_TYPE_KEY: &str = "$$type";

impl Rule {
    /// Reads a rule from any accepted JSON shape.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        match value {
            Value::String(text) => Rule::from_shorthand(text),
            Value::Array(items) => {
                let rules = items
                    .iter()
                    .map(Rule::from_value)
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(Rule::new(RuleKind::Multi(rules)))
            }
            Value::Object(map) => match map.get("type") {
                Some(Value::String(ty)) => parse_typed(ty, map),
                Some(other) => Err(AppError::InvalidRule(format!(
                    "'type' must be a string, found {}",
                    other
                ))),
                None => parse_nested_object(map),
            },
            other => Err(AppError::InvalidRule(format!(
                "expected a string, array or object rule, found {}",
                other
            ))),
        }
    }

    /// Reads a shorthand rule such as `"number|optional|min:1"` or `"string[]"`.
    pub fn from_shorthand(text: &str) -> AppResult<Self> {
        let mut parts = text.split('|').map(str::trim);
        let head = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidRule("empty shorthand rule".into()))?;

        let mut map = Map::new();
        for part in parts.filter(|p| !p.is_empty()) {
            match part.split_once(':') {
                Some((key, value)) => {
                    map.insert(key.trim().to_string(), shorthand_value(value.trim()));
                }
                None => {
                    map.insert(part.to_string(), Value::Bool(true));
                }
            }
        }

        if let Some(item_type) = head.strip_suffix("[]") {
            let mut rule = parse_typed("array", &map)?;
            if let RuleKind::Array(array) = &mut rule.kind {
                array.items = Some(Box::new(parse_typed(item_type, &Map::new())?));
            }
            return Ok(rule);
        }

        parse_typed(head, &map)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Rule::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl RuleSchema {
    /// Reads an action's rule schema. `$$root: true` selects a root schema.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let Value::Object(map) = value else {
            return Err(AppError::InvalidRule(format!(
                "a rule schema must be an object, found {}",
                value
            )));
        };

        if map.get(ROOT_KEY).and_then(Value::as_bool) == Some(true) {
            let mut inner = map.clone();
            inner.remove(ROOT_KEY);
            return Ok(RuleSchema::Root(Rule::from_value(&Value::Object(inner))?));
        }

        Ok(RuleSchema::Fields {
            fields: parse_fields(map)?,
            meta: parse_meta(map)?,
        })
    }

    /// Reads a rule schema from YAML (JSON is valid YAML).
    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::InvalidRule(format!("Failed to parse rule YAML: {}", e)))?;
        RuleSchema::from_value(&value)
    }
}

impl<'de> Deserialize<'de> for RuleSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RuleSchema::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn parse_typed(ty: &str, map: &Map<String, Value>) -> AppResult<Rule> {
    let kind = match ty {
        "any" => RuleKind::Any,
        "boolean" => RuleKind::Boolean,
        "class" => RuleKind::Class,
        "custom" => RuleKind::Custom,
        "email" => RuleKind::Email,
        "forbidden" => RuleKind::Forbidden,
        "function" => RuleKind::Function,
        "luhn" => RuleKind::Luhn,
        "mac" => RuleKind::Mac,
        "objectID" => RuleKind::ObjectId,
        "url" => RuleKind::Url,
        "array" => RuleKind::Array(parse_array(map)?),
        "currency" => RuleKind::Currency(parse_currency(map)?),
        "date" => RuleKind::Date(DateRule {
            convert: bool_field(map, "convert")?.unwrap_or(false),
        }),
        "enum" => RuleKind::Enum(EnumRule {
            values: values_field(map, "values")?.unwrap_or_default(),
        }),
        "equal" => RuleKind::Equal(EqualRule {
            value: map.get("value").cloned(),
            field: string_field(map, "field")?,
            strict: bool_field(map, "strict")?.unwrap_or(false),
        }),
        "multi" => RuleKind::Multi(rules_field(map, "rules")?),
        "number" => RuleKind::Number(parse_number(map)?),
        "object" => RuleKind::Object(parse_object(map)?),
        "record" => RuleKind::Record(RecordRule {
            key: rule_field(map, "key")?,
            value: rule_field(map, "value")?,
        }),
        "string" => RuleKind::String(parse_string(map)?),
        "tuple" => RuleKind::Tuple(rules_field(map, "items")?),
        "uuid" => RuleKind::Uuid(UuidRule {
            version: u64_field(map, "version")?
                .map(|v| u8::try_from(v).unwrap_or(u8::MAX)),
        }),
        other => RuleKind::Other(other.to_string()),
    };

    let mut rule = Rule::new(kind);
    apply_common(&mut rule, map)?;
    Ok(rule)
}

fn parse_nested_object(map: &Map<String, Value>) -> AppResult<Rule> {
    let mut rule = match map.get(NESTED_TYPE_KEY) {
        Some(Value::String(shorthand)) => {
            let own = Rule::from_shorthand(shorthand)?;
            let mut object = Rule::new(RuleKind::Object(ObjectRule::default()));
            object.optional = own.optional;
            object.nullable = own.nullable;
            object.default = own.default;
            object.meta = own.meta;
            object
        }
        Some(other) => {
            return Err(AppError::InvalidRule(format!(
                "'{}' must be a shorthand string, found {}",
                NESTED_TYPE_KEY, other
            )))
        }
        None => Rule::new(RuleKind::Object(ObjectRule::default())),
    };

    if let RuleKind::Object(object) = &mut rule.kind {
        object.properties = Some(parse_fields(map)?);
    }
    let meta = parse_meta(map)?;
    if !meta.is_empty() {
        rule.meta = meta;
    }
    Ok(rule)
}

fn apply_common(rule: &mut Rule, map: &Map<String, Value>) -> AppResult<()> {
    rule.optional = bool_field(map, "optional")?.unwrap_or(false);
    rule.nullable = bool_field(map, "nullable")?.unwrap_or(false);
    rule.default = map.get("default").cloned();
    rule.meta = parse_meta(map)?;
    Ok(())
}

fn parse_fields(map: &Map<String, Value>) -> AppResult<IndexMap<String, Rule>> {
    map.iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .map(|(key, value)| {
            let rule = Rule::from_value(value).map_err(|e| match e {
                AppError::InvalidRule(msg) => {
                    AppError::InvalidRule(format!("field '{}': {}", key, msg))
                }
                other => other,
            })?;
            Ok((key.clone(), rule))
        })
        .collect()
}

fn parse_meta(map: &Map<String, Value>) -> AppResult<RuleMeta> {
    match map.get(META_KEY) {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| AppError::InvalidRule(format!("invalid '{}': {}", META_KEY, e))),
        None => Ok(RuleMeta::default()),
    }
}

fn parse_string(map: &Map<String, Value>) -> AppResult<StringRule> {
    Ok(StringRule {
        min: u64_field(map, "min")?,
        max: u64_field(map, "max")?,
        length: u64_field(map, "length")?,
        pattern: string_field(map, "pattern")?,
        contains: string_field(map, "contains")?,
        enum_values: values_field(map, "enum")?,
        alpha: bool_field(map, "alpha")?.unwrap_or(false),
        numeric: bool_field(map, "numeric")?.unwrap_or(false),
        alphanum: bool_field(map, "alphanum")?.unwrap_or(false),
        alphadash: bool_field(map, "alphadash")?.unwrap_or(false),
        hex: bool_field(map, "hex")?.unwrap_or(false),
        base64: bool_field(map, "base64")?.unwrap_or(false),
        single_line: bool_field(map, "singleLine")?.unwrap_or(false),
        empty: bool_field(map, "empty")?,
    })
}

fn parse_number(map: &Map<String, Value>) -> AppResult<NumberRule> {
    Ok(NumberRule {
        min: f64_field(map, "min")?,
        max: f64_field(map, "max")?,
        equal: f64_field(map, "equal")?,
        not_equal: f64_field(map, "notEqual")?,
        integer: bool_field(map, "integer")?.unwrap_or(false),
        positive: bool_field(map, "positive")?.unwrap_or(false),
        negative: bool_field(map, "negative")?.unwrap_or(false),
    })
}

fn parse_array(map: &Map<String, Value>) -> AppResult<ArrayRule> {
    Ok(ArrayRule {
        items: rule_field(map, "items")?,
        min: u64_field(map, "min")?,
        max: u64_field(map, "max")?,
        length: u64_field(map, "length")?,
        unique: bool_field(map, "unique")?.unwrap_or(false),
        contains: map.get("contains").cloned(),
        enum_values: values_field(map, "enum")?,
        empty: bool_field(map, "empty")?,
    })
}

fn parse_object(map: &Map<String, Value>) -> AppResult<ObjectRule> {
    let props = map.get("properties").or_else(|| map.get("props"));
    let properties = match props {
        Some(Value::Object(fields)) => Some(parse_fields(fields)?),
        Some(other) => {
            return Err(AppError::InvalidRule(format!(
                "object 'properties' must be a map, found {}",
                other
            )))
        }
        None => None,
    };
    // `strict: "remove"` strips unknown keys instead of rejecting them.
    let strict = matches!(map.get("strict"), Some(Value::Bool(true)));
    Ok(ObjectRule {
        properties,
        strict,
        min_props: u64_field(map, "minProps")?,
        max_props: u64_field(map, "maxProps")?,
    })
}

fn parse_currency(map: &Map<String, Value>) -> AppResult<CurrencyRule> {
    Ok(CurrencyRule {
        currency_symbol: string_field(map, "currencySymbol")?,
        symbol_optional: bool_field(map, "symbolOptional")?.unwrap_or(false),
        thousand_separator: string_field(map, "thousandSeparator")?,
        decimal_separator: string_field(map, "decimalSeparator")?,
        custom_regex: string_field(map, "customRegex")?,
    })
}

fn shorthand_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(float) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    Value::String(raw.to_string())
}

fn bool_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(invalid_field(key, "a boolean", other)),
    }
}

fn u64_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .map(Some)
            .ok_or_else(|| invalid_field(key, "a non-negative integer", value)),
    }
}

fn f64_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid_field(key, "a number", value)),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_field(key, "a string", other)),
    }
}

fn values_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<Vec<Value>>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values.clone())),
        Some(other) => Err(invalid_field(key, "a list", other)),
    }
}

fn rule_field(map: &Map<String, Value>, key: &str) -> AppResult<Option<Box<Rule>>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(Box::new(Rule::from_value(value)?))),
    }
}

fn rules_field(map: &Map<String, Value>, key: &str) -> AppResult<Vec<Rule>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(Rule::from_value).collect(),
        Some(other) => Err(invalid_field(key, "a list of rules", other)),
    }
}

fn invalid_field(key: &str, expected: &str, found: &Value) -> AppError {
    AppError::InvalidRule(format!("'{}' must be {}, found {}", key, expected, found))
}
