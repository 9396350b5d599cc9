//! Models for the source specification schema.
//!
//! Every tagged node in the document carries a `kind` discriminant. Decoding is
//! two-pass: read the tag, then dispatch to the variant's structural decode.
//! Unrecognized tags fail the whole decode; `request`/`response` definitions
//! are recognized and dropped on purpose (they never reach the output graph).

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, UNKNOWN_TYPE_KIND, UNKNOWN_VALUE_KIND};

// ————————————————————————————————————————————————————————————————————————————
// IDENTITY
// ————————————————————————————————————————————————————————————————————————————

/// Global identity of a declarable type: `(namespace, name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeName {
    pub namespace: String,
    pub name: String,
}

impl TypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE DEFINITION SET
// ————————————————————————————————————————————————————————————————————————————

/// Ordered collection of declarable types, keyed by identity.
///
/// Duplicate names in the document are last-write-wins (the source behavior);
/// order is the first occurrence's document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub types: IndexMap<TypeName, TypeDefinition>,
}

impl Model {
    pub fn get(&self, name: &TypeName) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }
}

/// One top-level named declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefinition {
    Interface(Interface),
    Enum(Enum),
    TypeAlias(TypeAlias),
}

impl TypeDefinition {
    pub fn name(&self) -> &TypeName {
        match self {
            Self::Interface(o) => &o.name,
            Self::Enum(o) => &o.name,
            Self::TypeAlias(o) => &o.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Interface(_) => "interface",
            Self::Enum(_) => "enum",
            Self::TypeAlias(_) => "type_alias",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interface {
    pub name: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    /// Generic *parameter* names (binders, not references).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<TypeName>,
    /// Single inheritance parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits: Option<Inherits>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<Inherits>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<Inherits>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached_behaviors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_property: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub codegen_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Variants>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Enum {
    pub name: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<EnumMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub codegen_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumMember {
    pub name: String,
    /// Overrides the generated constant name when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeAlias {
    pub name: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<TypeName>,
    /// The Value this alias is bound to.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub typ: Option<ValueOf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub codegen_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    /// Present when the alias encodes a discriminated union.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Variants>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_location: Option<String>,
}

/// Inheritance/implements/behavior edge: a target plus generic arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inherits {
    #[serde(rename = "type")]
    pub type_name: TypeName,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<ValueOf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub typ: Option<ValueOf>,
    /// Absent means optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codegen_name: Option<String>,
    /// The property wraps a nested shape rather than a scalar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_property: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
}

impl Property {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Variants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tag: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub non_exhaustive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Deprecation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_flag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Availabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serverless: Option<Availability>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE GRAMMAR
// ————————————————————————————————————————————————————————————————————————————

/// What can appear where a type is expected. Exactly one variant per instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOf {
    /// Reference to a named type, optionally with one generic argument.
    InstanceOf(InstanceOf),
    /// Ordered sequence of one element shape.
    ArrayOf(ArrayOf),
    /// Discriminated or positional union.
    UnionOf(UnionOf),
    /// Key/value mapping; `single_key` marks the degenerate one-entry form.
    DictionaryOf(DictionaryOf),
    /// Opaque escape hatch, no further structure.
    UserDefinedValue,
    /// Inline constant, echoed verbatim downstream.
    LiteralValue(LiteralValue),
    /// A bare JSON sequence at a Value position. The container owns the
    /// elements, so the Value decoder accepts it as "unset" and carries the
    /// raw sequence along verbatim for re-encoding.
    Unset(Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceOf {
    #[serde(rename = "type")]
    pub type_name: TypeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<Box<ValueOf>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayOf {
    pub value: Box<ValueOf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnionOf {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ValueOf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryOf {
    pub key: Box<ValueOf>,
    pub value: Box<ValueOf>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub single_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralValue {
    /// Kept as raw JSON so numeric constants are never squeezed through f64.
    pub value: Value,
}

impl ValueOf {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InstanceOf(_) => "instance_of",
            Self::ArrayOf(_) => "array_of",
            Self::UnionOf(_) => "union_of",
            Self::DictionaryOf(_) => "dictionary_of",
            Self::UserDefinedValue => "user_defined_value",
            Self::LiteralValue(_) => "literal_value",
            Self::Unset(_) => "",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE (kind dispatch)
// ————————————————————————————————————————————————————————————————————————————

/// Decode a whole specification document.
///
/// Fail-fast: any unrecognized discriminant or structural mismatch aborts with
/// no partial model. Diagnostics carry the JSON path of the failure.
pub fn decode_model(src: &str) -> Result<Model, Error> {
    let document: Value = serde_json::from_str(src).map_err(Error::MalformedInput)?;
    serde_path_to_error::deserialize::<_, Model>(&document)
        .map_err(|err| Error::classify_decode(err.path().to_string(), err.into_inner()))
}

/// Re-encode a model to a document structurally equivalent to its input.
pub fn encode_model(model: &Model) -> Result<Value, Error> {
    serde_json::to_value(model).map_err(Error::MalformedInput)
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Document<'a> {
            types: Vec<&'a TypeDefinition>,
        }
        Document { types: self.types.values().collect() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            types: Vec<DecodedDefinition>,
        }

        let document = Document::deserialize(deserializer)?;
        let mut types = IndexMap::new();
        for decoded in document.types {
            if let DecodedDefinition::Kept(def) = decoded {
                // Last write wins on duplicate names, keeping the first slot.
                types.insert(def.name().clone(), def);
            }
        }
        Ok(Model { types })
    }
}

/// Decode outcome for one top-level entry: a kept definition, or a kind that
/// is recognized but intentionally contributes nothing.
#[derive(Debug)]
pub(crate) enum DecodedDefinition {
    Kept(TypeDefinition),
    Skipped,
}

impl<'de> Deserialize<'de> for DecodedDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::custom("type definition is missing its `kind` tag"))?;

        let def = match kind {
            "interface" => TypeDefinition::Interface(decode_variant(&raw)?),
            "enum" => TypeDefinition::Enum(decode_variant(&raw)?),
            "type_alias" => TypeDefinition::TypeAlias(decode_variant(&raw)?),
            // Explicit no-op branch: these exist in the document but never
            // participate in the output graph.
            "request" | "response" => return Ok(Self::Skipped),
            other => {
                return Err(de::Error::custom(format!("{UNKNOWN_TYPE_KIND} {other:?}")));
            }
        };
        Ok(Self::Kept(def))
    }
}

impl<'de> Deserialize<'de> for ValueOf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        if let Value::Array(elements) = &raw {
            // Sequence at a Value position: the container owns the elements.
            return Ok(Self::Unset(elements.clone()));
        }
        let kind = raw
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::custom("value is missing its `kind` tag"))?;

        match kind {
            "instance_of" => decode_variant(&raw).map(Self::InstanceOf),
            "array_of" => decode_variant(&raw).map(Self::ArrayOf),
            "union_of" => decode_variant(&raw).map(Self::UnionOf),
            "dictionary_of" => decode_variant(&raw).map(Self::DictionaryOf),
            "user_defined_value" => Ok(Self::UserDefinedValue),
            "literal_value" => decode_variant(&raw).map(Self::LiteralValue),
            other => Err(de::Error::custom(format!("{UNKNOWN_VALUE_KIND} {other:?}"))),
        }
    }
}

fn decode_variant<'de, T, E>(raw: &'de Value) -> Result<T, E>
where
    T: Deserialize<'de>,
    E: de::Error,
{
    T::deserialize(raw).map_err(de::Error::custom)
}

impl Serialize for ValueOf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        /// Re-attaches the `kind` tag the dispatch stripped on the way in.
        #[derive(Serialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        enum Tagged<'a> {
            InstanceOf(&'a InstanceOf),
            ArrayOf(&'a ArrayOf),
            UnionOf(&'a UnionOf),
            DictionaryOf(&'a DictionaryOf),
            UserDefinedValue,
            LiteralValue(&'a LiteralValue),
        }

        match self {
            Self::InstanceOf(v) => Tagged::InstanceOf(v).serialize(serializer),
            Self::ArrayOf(v) => Tagged::ArrayOf(v).serialize(serializer),
            Self::UnionOf(v) => Tagged::UnionOf(v).serialize(serializer),
            Self::DictionaryOf(v) => Tagged::DictionaryOf(v).serialize(serializer),
            Self::UserDefinedValue => Tagged::UserDefinedValue.serialize(serializer),
            Self::LiteralValue(v) => Tagged::LiteralValue(v).serialize(serializer),
            Self::Unset(elements) => elements.serialize(serializer),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
