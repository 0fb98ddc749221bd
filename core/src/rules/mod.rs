#![deny(missing_docs)]

//! # Validation Rules
//!
//! Strongly typed model of the tagged-union validation-rule language.
//!
//! - **Rule**: one node; a kind plus the flags every kind may carry.
//! - **RuleKind**: the closed set of kinds with their constraints.
//! - **RuleMeta**: documentation-only side channel (`$$oa`), kept apart from
//!   the validation constraints.
//! - **RuleSchema**: the whole input description of an action, either a map
//!   of named fields or a single root rule.
//!
//! Parsing from the JSON / shorthand form lives in [`parse`].

pub mod parse;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Documentation metadata attached to a rule. Never used for validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuleMeta {
    /// Long-form description copied onto the generated fragment.
    pub description: Option<String>,
    /// Short summary copied onto the generated fragment.
    pub summary: Option<String>,
    /// Marks the documented value as deprecated.
    pub deprecated: Option<bool>,
}

impl RuleMeta {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.summary.is_none() && self.deprecated.is_none()
    }

    /// Fills every unset field from `defaults`.
    pub fn inherit(&mut self, defaults: &RuleMeta) {
        if self.description.is_none() {
            self.description = defaults.description.clone();
        }
        if self.summary.is_none() {
            self.summary = defaults.summary.clone();
        }
        if self.deprecated.is_none() {
            self.deprecated = defaults.deprecated;
        }
    }
}

/// One node of the validation-rule language.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Kind and kind-specific constraints.
    pub kind: RuleKind,
    /// The value may be absent.
    pub optional: bool,
    /// The value may be `null`.
    pub nullable: bool,
    /// Value substituted by the validator when absent.
    pub default: Option<Value>,
    /// Documentation side channel.
    pub meta: RuleMeta,
}

impl Rule {
    /// Creates a required rule of the given kind.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            default: None,
            meta: RuleMeta::default(),
        }
    }

    /// An unconstrained string rule.
    pub fn string() -> Self {
        Self::new(RuleKind::String(StringRule::default()))
    }

    /// An unconstrained number rule.
    pub fn number() -> Self {
        Self::new(RuleKind::Number(NumberRule::default()))
    }

    /// A boolean rule.
    pub fn boolean() -> Self {
        Self::new(RuleKind::Boolean)
    }

    /// An object rule with the given fields.
    pub fn object(fields: IndexMap<String, Rule>) -> Self {
        Self::new(RuleKind::Object(ObjectRule {
            properties: Some(fields),
            ..ObjectRule::default()
        }))
    }

    /// An array rule over the given item rule.
    pub fn array(items: Rule) -> Self {
        Self::new(RuleKind::Array(ArrayRule {
            items: Some(Box::new(items)),
            ..ArrayRule::default()
        }))
    }

    /// Marks the rule optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the rule nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Replaces the documentation metadata.
    pub fn with_meta(mut self, meta: RuleMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the documented description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// A field is optional when flagged so or when the validator fills a default.
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }
}

/// The closed set of rule kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Accepts anything.
    Any,
    /// Homogeneous list.
    Array(ArrayRule),
    /// `true` / `false`.
    Boolean,
    /// Instance of a runtime class. Not documentable.
    Class,
    /// Formatted currency amount.
    Currency(CurrencyRule),
    /// Custom validator function. Not documentable.
    Custom,
    /// Date value.
    Date(DateRule),
    /// E-mail address.
    Email,
    /// One of a fixed set of values.
    Enum(EnumRule),
    /// Equal to a constant or to a sibling field.
    Equal(EqualRule),
    /// The field must be absent. Not documentable.
    Forbidden,
    /// Function value. Not documentable.
    Function,
    /// Digits passing the Luhn checksum.
    Luhn,
    /// MAC address.
    Mac,
    /// Matches one of several sub-rules.
    Multi(Vec<Rule>),
    /// Numeric value.
    Number(NumberRule),
    /// Nested object.
    Object(ObjectRule),
    /// 24 hex digit object identifier.
    ObjectId,
    /// String-keyed map.
    Record(RecordRule),
    /// Text value.
    String(StringRule),
    /// Fixed positional list.
    Tuple(Vec<Rule>),
    /// URL.
    Url,
    /// UUID.
    Uuid(UuidRule),
    /// A kind name this model does not know.
    Other(String),
}

impl RuleKind {
    /// Payload-free discriminant used to look up mappers.
    pub fn tag(&self) -> RuleKindTag {
        match self {
            RuleKind::Any => RuleKindTag::Any,
            RuleKind::Array(_) => RuleKindTag::Array,
            RuleKind::Boolean => RuleKindTag::Boolean,
            RuleKind::Class => RuleKindTag::Class,
            RuleKind::Currency(_) => RuleKindTag::Currency,
            RuleKind::Custom => RuleKindTag::Custom,
            RuleKind::Date(_) => RuleKindTag::Date,
            RuleKind::Email => RuleKindTag::Email,
            RuleKind::Enum(_) => RuleKindTag::Enum,
            RuleKind::Equal(_) => RuleKindTag::Equal,
            RuleKind::Forbidden => RuleKindTag::Forbidden,
            RuleKind::Function => RuleKindTag::Function,
            RuleKind::Luhn => RuleKindTag::Luhn,
            RuleKind::Mac => RuleKindTag::Mac,
            RuleKind::Multi(_) => RuleKindTag::Multi,
            RuleKind::Number(_) => RuleKindTag::Number,
            RuleKind::Object(_) => RuleKindTag::Object,
            RuleKind::ObjectId => RuleKindTag::ObjectId,
            RuleKind::Record(_) => RuleKindTag::Record,
            RuleKind::String(_) => RuleKindTag::String,
            RuleKind::Tuple(_) => RuleKindTag::Tuple,
            RuleKind::Url => RuleKindTag::Url,
            RuleKind::Uuid(_) => RuleKindTag::Uuid,
            RuleKind::Other(_) => RuleKindTag::Other,
        }
    }
}

/// Discriminant of [`RuleKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKindTag {
    /// See [`RuleKind::Any`].
    Any,
    /// See [`RuleKind::Array`].
    Array,
    /// See [`RuleKind::Boolean`].
    Boolean,
    /// See [`RuleKind::Class`].
    Class,
    /// See [`RuleKind::Currency`].
    Currency,
    /// See [`RuleKind::Custom`].
    Custom,
    /// See [`RuleKind::Date`].
    Date,
    /// See [`RuleKind::Email`].
    Email,
    /// See [`RuleKind::Enum`].
    Enum,
    /// See [`RuleKind::Equal`].
    Equal,
    /// See [`RuleKind::Forbidden`].
    Forbidden,
    /// See [`RuleKind::Function`].
    Function,
    /// See [`RuleKind::Luhn`].
    Luhn,
    /// See [`RuleKind::Mac`].
    Mac,
    /// See [`RuleKind::Multi`].
    Multi,
    /// See [`RuleKind::Number`].
    Number,
    /// See [`RuleKind::Object`].
    Object,
    /// See [`RuleKind::ObjectId`].
    ObjectId,
    /// See [`RuleKind::Record`].
    Record,
    /// See [`RuleKind::String`].
    String,
    /// See [`RuleKind::Tuple`].
    Tuple,
    /// See [`RuleKind::Url`].
    Url,
    /// See [`RuleKind::Uuid`].
    Uuid,
    /// See [`RuleKind::Other`].
    Other,
}

impl RuleKindTag {
    /// Every tag with a dedicated kind.
    pub const KNOWN: [RuleKindTag; 23] = [
        RuleKindTag::Any,
        RuleKindTag::Array,
        RuleKindTag::Boolean,
        RuleKindTag::Class,
        RuleKindTag::Currency,
        RuleKindTag::Custom,
        RuleKindTag::Date,
        RuleKindTag::Email,
        RuleKindTag::Enum,
        RuleKindTag::Equal,
        RuleKindTag::Forbidden,
        RuleKindTag::Function,
        RuleKindTag::Luhn,
        RuleKindTag::Mac,
        RuleKindTag::Multi,
        RuleKindTag::Number,
        RuleKindTag::Object,
        RuleKindTag::ObjectId,
        RuleKindTag::Record,
        RuleKindTag::String,
        RuleKindTag::Tuple,
        RuleKindTag::Url,
        RuleKindTag::Uuid,
    ];

    /// The `type` name used by the rule language.
    pub fn name(self) -> &'static str {
        match self {
            RuleKindTag::Any => "any",
            RuleKindTag::Array => "array",
            RuleKindTag::Boolean => "boolean",
            RuleKindTag::Class => "class",
            RuleKindTag::Currency => "currency",
            RuleKindTag::Custom => "custom",
            RuleKindTag::Date => "date",
            RuleKindTag::Email => "email",
            RuleKindTag::Enum => "enum",
            RuleKindTag::Equal => "equal",
            RuleKindTag::Forbidden => "forbidden",
            RuleKindTag::Function => "function",
            RuleKindTag::Luhn => "luhn",
            RuleKindTag::Mac => "mac",
            RuleKindTag::Multi => "multi",
            RuleKindTag::Number => "number",
            RuleKindTag::Object => "object",
            RuleKindTag::ObjectId => "objectID",
            RuleKindTag::Record => "record",
            RuleKindTag::String => "string",
            RuleKindTag::Tuple => "tuple",
            RuleKindTag::Url => "url",
            RuleKindTag::Uuid => "uuid",
            RuleKindTag::Other => "other",
        }
    }

    /// Looks a tag up by its `type` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN.iter().copied().find(|tag| tag.name() == name)
    }
}

impl fmt::Display for RuleKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Constraints of a `string` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRule {
    /// Minimum length.
    pub min: Option<u64>,
    /// Maximum length.
    pub max: Option<u64>,
    /// Exact length.
    pub length: Option<u64>,
    /// Regular expression the value must match.
    pub pattern: Option<String>,
    /// Substring the value must contain.
    pub contains: Option<String>,
    /// Allowed values.
    pub enum_values: Option<Vec<Value>>,
    /// Letters only.
    pub alpha: bool,
    /// Numeric text only.
    pub numeric: bool,
    /// Letters and digits only.
    pub alphanum: bool,
    /// Letters, digits, dashes and underscores only.
    pub alphadash: bool,
    /// Hexadecimal digits only.
    pub hex: bool,
    /// Base64 text.
    pub base64: bool,
    /// No line breaks.
    pub single_line: bool,
    /// Whether the empty string is accepted.
    pub empty: Option<bool>,
}

/// Constraints of a `number` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRule {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// The only accepted value.
    pub equal: Option<f64>,
    /// A rejected value.
    pub not_equal: Option<f64>,
    /// Whole numbers only.
    pub integer: bool,
    /// Strictly greater than zero.
    pub positive: bool,
    /// Strictly less than zero.
    pub negative: bool,
}

/// Constraints of an `array` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayRule {
    /// Rule every item must satisfy.
    pub items: Option<Box<Rule>>,
    /// Minimum item count.
    pub min: Option<u64>,
    /// Maximum item count.
    pub max: Option<u64>,
    /// Exact item count.
    pub length: Option<u64>,
    /// Items must be distinct.
    pub unique: bool,
    /// Value that must appear in the list.
    pub contains: Option<Value>,
    /// Allowed item values.
    pub enum_values: Option<Vec<Value>>,
    /// Whether the empty list is accepted.
    pub empty: Option<bool>,
}

/// Constraints of an `object` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRule {
    /// Named field rules. `None` accepts any object.
    pub properties: Option<IndexMap<String, Rule>>,
    /// Unknown fields are rejected.
    pub strict: bool,
    /// Minimum number of fields.
    pub min_props: Option<u64>,
    /// Maximum number of fields.
    pub max_props: Option<u64>,
}

/// Constraints of a `record` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordRule {
    /// Rule for the keys.
    pub key: Option<Box<Rule>>,
    /// Rule for the values.
    pub value: Option<Box<Rule>>,
}

/// Constraints of an `enum` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumRule {
    /// Allowed values.
    pub values: Vec<Value>,
}

/// Constraints of an `equal` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqualRule {
    /// Constant the value must equal.
    pub value: Option<Value>,
    /// Sibling field the value must equal.
    pub field: Option<String>,
    /// Compare with type identity.
    pub strict: bool,
}

/// Constraints of a `date` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRule {
    /// The validator converts strings and epochs into dates.
    pub convert: bool,
}

/// Constraints of a `uuid` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UuidRule {
    /// Required UUID version (0 accepts any).
    pub version: Option<u8>,
}

/// Constraints of a `currency` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyRule {
    /// Symbol in front of the amount, e.g. `$`.
    pub currency_symbol: Option<String>,
    /// The symbol may be omitted.
    pub symbol_optional: bool,
    /// Thousands separator, `,` when unset.
    pub thousand_separator: Option<String>,
    /// Decimal separator, `.` when unset.
    pub decimal_separator: Option<String>,
    /// Replaces the synthesized pattern entirely.
    pub custom_regex: Option<String>,
}

/// The input description of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleSchema {
    /// A map of named top-level fields.
    Fields {
        /// Field rules in declaration order.
        fields: IndexMap<String, Rule>,
        /// Documentation for the schema as a whole.
        meta: RuleMeta,
    },
    /// A single rule describing the whole input (`$$root`).
    Root(Rule),
}

impl RuleSchema {
    /// A field map without schema-level metadata.
    pub fn fields(fields: IndexMap<String, Rule>) -> Self {
        RuleSchema::Fields {
            fields,
            meta: RuleMeta::default(),
        }
    }

    /// Whether this is a root-level schema.
    pub fn is_root(&self) -> bool {
        matches!(self, RuleSchema::Root(_))
    }
}
