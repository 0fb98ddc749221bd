//! Built-in mapper per rule kind.
//!
//! Each mapper receives the whole rule but only reads its own constraints;
//! optional / nullable / default / metadata are applied afterwards by
//! [`RuleConverter::convert`].

use super::formats;
use super::{ConvertContext, RuleConverter};
use crate::error::AppResult;
use crate::fragment::{number_value, AdditionalProperties, Fragment, Schema, SchemaObject, SchemaType};
use crate::rules::{Rule, RuleKind, StringRule};
use serde_json::{json, Value};
use std::borrow::Cow;

type MapResult = AppResult<Option<SchemaObject>>;

/// `any`: an unconstrained schema.
pub fn map_any(_rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    Ok(Some(SchemaObject::default()))
}

/// `forbidden`, `function`, `class`, `custom`: never documented.
pub fn map_omitted(
    _rule: &Rule,
    _converter: &RuleConverter,
    _ctx: &ConvertContext<'_>,
) -> MapResult {
    Ok(None)
}

/// `boolean`
pub fn map_boolean(
    _rule: &Rule,
    _converter: &RuleConverter,
    _ctx: &ConvertContext<'_>,
) -> MapResult {
    Ok(Some(SchemaObject::typed(SchemaType::Boolean)))
}

/// `number`: bounds, sign and integer constraints.
pub fn map_number(rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let RuleKind::Number(n) = &rule.kind else {
        return Ok(Some(SchemaObject::typed(SchemaType::Number)));
    };

    let mut obj = SchemaObject::typed(if n.integer {
        SchemaType::Integer
    } else {
        SchemaType::Number
    });
    obj.minimum = n.min;
    obj.maximum = n.max;
    if n.positive && n.min.map_or(true, |min| min <= 0.0) {
        obj.minimum = None;
        obj.exclusive_minimum = Some(0.0);
    }
    if n.negative && n.max.map_or(true, |max| max >= 0.0) {
        obj.maximum = None;
        obj.exclusive_maximum = Some(0.0);
    }
    if let Some(equal) = n.equal {
        obj.enum_values = Some(vec![number_value(equal)]);
    }
    Ok(Some(obj))
}

/// `string`, and the base mapper for `enum` and unknown kinds.
pub fn map_string(rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let constraints = match &rule.kind {
        RuleKind::String(s) => Cow::Borrowed(s),
        RuleKind::Enum(e) => Cow::Owned(StringRule {
            enum_values: Some(e.values.clone()),
            ..StringRule::default()
        }),
        _ => Cow::Owned(StringRule::default()),
    };
    Ok(Some(string_schema(&constraints)))
}

fn string_schema(s: &StringRule) -> SchemaObject {
    let mut obj = SchemaObject::typed(SchemaType::String);
    match s.length {
        Some(length) => {
            obj.min_length = Some(length);
            obj.max_length = Some(length);
        }
        None => {
            obj.min_length = s.min;
            obj.max_length = s.max;
        }
    }
    if s.empty == Some(false) && obj.min_length.map_or(true, |min| min == 0) {
        obj.min_length = Some(1);
    }
    obj.pattern = s
        .pattern
        .clone()
        .or_else(|| flag_pattern(s).map(str::to_string))
        .or_else(|| {
            s.contains
                .as_ref()
                .map(|needle| format!(".*{}.*", regex::escape(needle)))
        });
    if s.base64 {
        obj.format = Some("byte".to_string());
    }
    obj.enum_values = s.enum_values.clone();
    obj
}

fn flag_pattern(s: &StringRule) -> Option<&'static str> {
    [
        (s.alpha, formats::ALPHA_PATTERN),
        (s.numeric, formats::NUMERIC_PATTERN),
        (s.alphanum, formats::ALPHANUM_PATTERN),
        (s.alphadash, formats::ALPHADASH_PATTERN),
        (s.hex, formats::HEX_PATTERN),
        (s.base64, formats::BASE64_PATTERN),
        (s.single_line, formats::SINGLE_LINE_PATTERN),
    ]
    .into_iter()
    .find_map(|(set, pattern)| set.then_some(pattern))
}

/// `enum`: the string mapper with the allowed values injected.
pub fn map_enum(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    converter.base_mapper()?.map(rule, converter, ctx)
}

/// `array`: items, counts and uniqueness.
pub fn map_array(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    let mut obj = SchemaObject::typed(SchemaType::Array);
    let RuleKind::Array(a) = &rule.kind else {
        return Ok(Some(obj));
    };

    if let Some(items) = &a.items {
        obj.items = converter
            .convert(items, None, ctx)?
            .map(|fragment| Box::new(fragment.schema));
    }
    match a.length {
        Some(length) => {
            obj.min_items = Some(length);
            obj.max_items = Some(length);
        }
        None => {
            obj.min_items = a.min;
            obj.max_items = a.max;
        }
    }
    if a.empty == Some(false) && obj.min_items.map_or(true, |min| min == 0) {
        obj.min_items = Some(1);
    }
    if a.unique {
        obj.unique_items = Some(true);
    }
    if let Some(values) = &a.enum_values {
        match obj.items.as_deref_mut() {
            Some(Schema::Object(items)) => items.enum_values = Some(values.clone()),
            Some(Schema::Ref(_)) => {}
            None => {
                obj.items = Some(Box::new(Schema::Object(Box::new(SchemaObject {
                    enum_values: Some(values.clone()),
                    ..SchemaObject::default()
                }))))
            }
        }
    }
    Ok(Some(obj))
}

/// `object`: one property per converted field, `required` from the
/// optional markers. Naming nested objects is left to the component store.
pub fn map_object(rule: &Rule, converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let mut obj = SchemaObject::typed(SchemaType::Object);
    let RuleKind::Object(o) = &rule.kind else {
        return Ok(Some(obj));
    };

    if let Some(properties) = &o.properties {
        for (name, fragment) in converter.convert_fields(properties)? {
            if !fragment.optional {
                obj.required.push(name.clone());
            }
            obj.properties.insert(name, fragment.schema);
        }
    }
    if o.strict {
        obj.additional_properties = Some(AdditionalProperties::Allowed(false));
    }
    obj.min_properties = o.min_props;
    obj.max_properties = o.max_props;
    Ok(Some(obj))
}

/// `record`: the value rule becomes `additionalProperties`.
pub fn map_record(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    let mut obj = SchemaObject::typed(SchemaType::Object);
    let value = match &rule.kind {
        RuleKind::Record(record) => match &record.value {
            Some(value) => converter.convert(value, None, ctx)?,
            None => None,
        },
        _ => None,
    };
    obj.additional_properties = Some(match value {
        Some(fragment) => AdditionalProperties::Schema(Box::new(fragment.schema)),
        None => AdditionalProperties::Allowed(true),
    });
    Ok(Some(obj))
}

/// `tuple`: a fixed-length array whose items are one of the member schemas.
pub fn map_tuple(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    let mut obj = SchemaObject::typed(SchemaType::Array);
    let RuleKind::Tuple(members) = &rule.kind else {
        return Ok(Some(obj));
    };

    let count = members.len() as u64;
    obj.min_items = Some(count);
    obj.max_items = Some(count);
    let schemas = convert_members(members, converter, ctx)?;
    if !schemas.is_empty() {
        obj.items = Some(Box::new(Schema::Object(Box::new(SchemaObject {
            one_of: schemas,
            ..SchemaObject::default()
        }))));
    }
    Ok(Some(obj))
}

/// `multi`: one of the member schemas. Omitted when no member is documentable.
pub fn map_multi(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    let RuleKind::Multi(members) = &rule.kind else {
        return Ok(None);
    };
    let schemas = convert_members(members, converter, ctx)?;
    if schemas.is_empty() {
        return Ok(None);
    }
    Ok(Some(SchemaObject {
        one_of: schemas,
        ..SchemaObject::default()
    }))
}

fn convert_members(
    members: &[Rule],
    converter: &RuleConverter,
    ctx: &ConvertContext<'_>,
) -> AppResult<Vec<Schema>> {
    let mut schemas = Vec::with_capacity(members.len());
    for member in members {
        if let Some(fragment) = converter.convert(member, None, ctx)? {
            schemas.push(fragment.schema);
        }
    }
    Ok(schemas)
}

/// `equal`: the sibling's schema when `field` resolves, else the type of
/// `value` (exact when `strict`, string otherwise).
pub fn map_equal(rule: &Rule, converter: &RuleConverter, ctx: &ConvertContext<'_>) -> MapResult {
    let RuleKind::Equal(eq) = &rule.kind else {
        return Ok(Some(SchemaObject::typed(SchemaType::String)));
    };

    if let Some(field) = &eq.field {
        if let (Some(sibling), Some(nested)) = (ctx.sibling(field), ctx.resolving(field)) {
            if let Some(object) = converter
                .convert(sibling, None, &nested)?
                .and_then(into_object)
            {
                return Ok(Some(object));
            }
        }
    }

    let mut obj = SchemaObject::default();
    match (&eq.value, eq.strict) {
        (Some(value), true) => {
            obj.schema_type = value_type(value);
            obj.examples = vec![value.clone()];
        }
        (Some(value), false) => {
            obj.schema_type = Some(SchemaType::String);
            let text = value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            obj.examples = vec![json!(text)];
        }
        (None, _) => obj.schema_type = Some(SchemaType::String),
    }
    Ok(Some(obj))
}

fn into_object(fragment: Fragment) -> Option<SchemaObject> {
    match fragment.schema {
        Schema::Object(object) => Some(*object),
        Schema::Ref(_) => None,
    }
}

fn value_type(value: &Value) -> Option<SchemaType> {
    match value {
        Value::Bool(_) => Some(SchemaType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(SchemaType::Integer),
        Value::Number(_) => Some(SchemaType::Number),
        Value::String(_) => Some(SchemaType::String),
        Value::Array(_) => Some(SchemaType::Array),
        Value::Object(_) => Some(SchemaType::Object),
        Value::Null => None,
    }
}

/// `date`: only documentable when the validator converts input.
pub fn map_date(rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let convert = matches!(&rule.kind, RuleKind::Date(date) if date.convert);
    if !convert {
        return Ok(None);
    }

    let mut iso = SchemaObject::formatted("date-time");
    iso.examples = vec![json!(formats::DATE_ISO_EXAMPLE)];
    let mut epoch = SchemaObject::typed(SchemaType::Number);
    epoch.examples = vec![json!(formats::DATE_EPOCH_EXAMPLE)];
    Ok(Some(SchemaObject {
        one_of: vec![
            Schema::Object(Box::new(iso)),
            Schema::Object(Box::new(epoch)),
        ],
        ..SchemaObject::default()
    }))
}

/// `email`
pub fn map_email(_rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    Ok(Some(with_example(
        SchemaObject::formatted("email"),
        formats::EMAIL_EXAMPLE,
    )))
}

/// `url`
pub fn map_url(_rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    Ok(Some(with_example(
        SchemaObject::formatted("uri"),
        formats::URL_EXAMPLE,
    )))
}

/// `uuid`: version-specific pattern and exemplar.
pub fn map_uuid(rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let version = match &rule.kind {
        RuleKind::Uuid(uuid) => uuid.version,
        _ => None,
    };
    let mut obj = SchemaObject::formatted("uuid");
    obj.pattern = Some(formats::uuid_pattern(version));
    Ok(Some(with_example(obj, formats::uuid_example(version))))
}

/// `mac`
pub fn map_mac(_rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    Ok(Some(patterned(formats::MAC_PATTERN, formats::MAC_EXAMPLE)))
}

/// `luhn`
pub fn map_luhn(_rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    Ok(Some(patterned(formats::LUHN_PATTERN, formats::LUHN_EXAMPLE)))
}

/// `objectID`
pub fn map_object_id(
    _rule: &Rule,
    _converter: &RuleConverter,
    _ctx: &ConvertContext<'_>,
) -> MapResult {
    Ok(Some(patterned(
        formats::OBJECT_ID_PATTERN,
        formats::OBJECT_ID_EXAMPLE,
    )))
}

/// `currency`: pattern from symbol and separators.
pub fn map_currency(rule: &Rule, _converter: &RuleConverter, _ctx: &ConvertContext<'_>) -> MapResult {
    let mut obj = SchemaObject::typed(SchemaType::String);
    if let RuleKind::Currency(currency) = &rule.kind {
        obj.pattern = Some(formats::currency_pattern(currency));
        if let Some(example) = formats::currency_example(currency) {
            obj.examples = vec![json!(example)];
        }
    }
    Ok(Some(obj))
}

fn patterned(pattern: &str, example: &str) -> SchemaObject {
    let mut obj = SchemaObject::typed(SchemaType::String);
    obj.pattern = Some(pattern.to_string());
    with_example(obj, example)
}

fn with_example(mut obj: SchemaObject, example: &str) -> SchemaObject {
    obj.examples = vec![json!(example)];
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{
        ArrayRule, DateRule, EnumRule, EqualRule, NumberRule, ObjectRule, RecordRule, UuidRule,
    };
    use crate::version::OpenApiVersion;
    use indexmap::IndexMap;

    fn render(rule: &Rule) -> Option<Value> {
        RuleConverter::new()
            .convert_rule(rule)
            .unwrap()
            .map(|f| f.schema.to_value(OpenApiVersion::V3_1))
    }

    fn fields(entries: Vec<(&str, Rule)>) -> IndexMap<String, Rule> {
        entries
            .into_iter()
            .map(|(name, rule)| (name.to_string(), rule))
            .collect()
    }

    #[test]
    fn test_unconstrained_kinds_are_minimal() {
        assert_eq!(render(&Rule::string()).unwrap(), json!({ "type": "string" }));
        assert_eq!(render(&Rule::number()).unwrap(), json!({ "type": "number" }));
        assert_eq!(render(&Rule::boolean()).unwrap(), json!({ "type": "boolean" }));
        assert_eq!(render(&Rule::new(RuleKind::Any)).unwrap(), json!({}));
        assert_eq!(
            render(&Rule::new(RuleKind::Array(ArrayRule::default()))).unwrap(),
            json!({ "type": "array" })
        );
        assert_eq!(
            render(&Rule::new(RuleKind::Object(ObjectRule::default()))).unwrap(),
            json!({ "type": "object" })
        );
    }

    #[test]
    fn test_undocumentable_kinds_are_omitted() {
        for kind in [
            RuleKind::Forbidden,
            RuleKind::Function,
            RuleKind::Class,
            RuleKind::Custom,
            RuleKind::Date(DateRule { convert: false }),
        ] {
            assert!(render(&Rule::new(kind)).is_none());
        }
    }

    #[test]
    fn test_string_constraints() {
        let rule = Rule::new(RuleKind::String(StringRule {
            min: Some(2),
            max: Some(10),
            alpha: true,
            ..StringRule::default()
        }));
        let value = render(&rule).unwrap();
        assert_eq!(value["minLength"], 2);
        assert_eq!(value["maxLength"], 10);
        assert_eq!(value["pattern"], formats::ALPHA_PATTERN);
    }

    #[test]
    fn test_string_exact_length_and_contains() {
        let rule = Rule::new(RuleKind::String(StringRule {
            min: Some(1),
            length: Some(8),
            contains: Some("a.b".into()),
            ..StringRule::default()
        }));
        let value = render(&rule).unwrap();
        assert_eq!(value["minLength"], 8);
        assert_eq!(value["maxLength"], 8);
        assert_eq!(value["pattern"], r".*a\.b.*");
    }

    #[test]
    fn test_number_sign_and_equal() {
        let rule = Rule::new(RuleKind::Number(NumberRule {
            positive: true,
            integer: true,
            max: Some(100.0),
            equal: Some(42.0),
            ..NumberRule::default()
        }));
        let value = render(&rule).unwrap();
        assert_eq!(value["type"], "integer");
        assert_eq!(value["exclusiveMinimum"], 0);
        assert_eq!(value["maximum"], 100);
        assert_eq!(value["enum"], json!([42]));
    }

    #[test]
    fn test_array_length_overrides_min_max() {
        let rule = Rule::new(RuleKind::Array(ArrayRule {
            items: Some(Box::new(Rule::string())),
            min: Some(1),
            max: Some(9),
            length: Some(3),
            unique: true,
            ..ArrayRule::default()
        }));
        let value = render(&rule).unwrap();
        assert_eq!(value["items"], json!({ "type": "string" }));
        assert_eq!(value["minItems"], 3);
        assert_eq!(value["maxItems"], 3);
        assert_eq!(value["uniqueItems"], true);
    }

    #[test]
    fn test_object_required_follows_optional_marker() {
        let rule = Rule::object(fields(vec![
            ("name", Rule::string()),
            ("nick", Rule::string().optional()),
            ("role", Rule::string().with_default(json!("user"))),
        ]));
        let value = render(&rule).unwrap();
        assert_eq!(value["required"], json!(["name"]));
        assert_eq!(value["properties"]["role"]["default"], "user");
    }

    #[test]
    fn test_enum_uses_string_mapper() {
        let rule = Rule::new(RuleKind::Enum(EnumRule {
            values: vec![json!("red"), json!("green")],
        }));
        assert_eq!(
            render(&rule).unwrap(),
            json!({ "type": "string", "enum": ["red", "green"] })
        );
    }

    #[test]
    fn test_equal_resolves_sibling() {
        let password = Rule::new(RuleKind::String(StringRule {
            min: Some(8),
            ..StringRule::default()
        }));
        let confirm = Rule::new(RuleKind::Equal(EqualRule {
            field: Some("password".into()),
            ..EqualRule::default()
        }));
        let value = render(&Rule::object(fields(vec![
            ("password", password),
            ("confirm", confirm),
        ])))
        .unwrap();
        assert_eq!(value["properties"]["confirm"], json!({ "type": "string", "minLength": 8 }));
    }

    #[test]
    fn test_equal_cycle_falls_back_to_value_type() {
        let a = Rule::new(RuleKind::Equal(EqualRule {
            field: Some("b".into()),
            ..EqualRule::default()
        }));
        let b = Rule::new(RuleKind::Equal(EqualRule {
            field: Some("a".into()),
            ..EqualRule::default()
        }));
        let value = render(&Rule::object(fields(vec![("a", a), ("b", b)]))).unwrap();
        assert_eq!(value["properties"]["a"]["type"], "string");
        assert_eq!(value["properties"]["b"]["type"], "string");
    }

    #[test]
    fn test_equal_infers_value_type() {
        let strict = Rule::new(RuleKind::Equal(EqualRule {
            value: Some(json!(true)),
            strict: true,
            field: None,
        }));
        assert_eq!(
            render(&strict).unwrap(),
            json!({ "type": "boolean", "examples": [true] })
        );
        let loose = Rule::new(RuleKind::Equal(EqualRule {
            value: Some(json!(5)),
            strict: false,
            field: None,
        }));
        assert_eq!(
            render(&loose).unwrap(),
            json!({ "type": "string", "examples": ["5"] })
        );
    }

    #[test]
    fn test_multi_skips_omitted_members() {
        let rule = Rule::new(RuleKind::Multi(vec![
            Rule::string(),
            Rule::new(RuleKind::Forbidden),
            Rule::number(),
        ]));
        assert_eq!(
            render(&rule).unwrap(),
            json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] })
        );
        let nothing = Rule::new(RuleKind::Multi(vec![Rule::new(RuleKind::Function)]));
        assert!(render(&nothing).is_none());
    }

    #[test]
    fn test_record_wraps_value_rule() {
        let rule = Rule::new(RuleKind::Record(RecordRule {
            key: Some(Box::new(Rule::string())),
            value: Some(Box::new(Rule::number())),
        }));
        assert_eq!(
            render(&rule).unwrap(),
            json!({ "type": "object", "additionalProperties": { "type": "number" } })
        );
    }

    #[test]
    fn test_tuple_is_fixed_length_one_of() {
        let rule = Rule::new(RuleKind::Tuple(vec![Rule::string(), Rule::number()]));
        let value = render(&rule).unwrap();
        assert_eq!(value["minItems"], 2);
        assert_eq!(value["maxItems"], 2);
        assert_eq!(
            value["items"]["oneOf"],
            json!([{ "type": "string" }, { "type": "number" }])
        );
    }

    #[test]
    fn test_converted_date_has_iso_and_epoch_examples() {
        let value = render(&Rule::new(RuleKind::Date(DateRule { convert: true }))).unwrap();
        assert_eq!(value["oneOf"][0]["format"], "date-time");
        assert_eq!(value["oneOf"][0]["examples"][0], formats::DATE_ISO_EXAMPLE);
        assert_eq!(value["oneOf"][1]["examples"][0], formats::DATE_EPOCH_EXAMPLE);
    }

    #[test]
    fn test_string_variants_have_examples() {
        let email = render(&Rule::new(RuleKind::Email)).unwrap();
        assert_eq!(email["format"], "email");
        assert_eq!(email["examples"][0], formats::EMAIL_EXAMPLE);

        let uuid = render(&Rule::new(RuleKind::Uuid(UuidRule { version: Some(5) }))).unwrap();
        assert_eq!(uuid["examples"][0], formats::UUID_EXAMPLES[4]);

        let oid = render(&Rule::new(RuleKind::ObjectId)).unwrap();
        assert_eq!(oid["pattern"], formats::OBJECT_ID_PATTERN);
    }

    #[test]
    fn test_nullable_and_default_are_applied() {
        let rule = Rule::string().nullable().with_default(json!("x"));
        let fragment = RuleConverter::new().convert_rule(&rule).unwrap().unwrap();
        assert!(fragment.optional);
        let value = fragment.schema.to_value(OpenApiVersion::V3_0);
        assert_eq!(value["nullable"], true);
        assert_eq!(value["default"], "x");
    }
}
