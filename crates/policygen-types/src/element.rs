//! Element items: the typed, configurable value slots of a policy.
//!
//! [`ElementItem`] is closed over the seven element shapes. Renderers match
//! it exhaustively; the `as_*` casts are unchecked and panic when called on
//! the wrong variant, because callers are expected to test with `is_*` first.

use serde::{Deserialize, Serialize};

use crate::value::RegistryValue;

// ── Variants ───────────────────────────────────────────────────────────

/// On/off element writing one of two registry values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default = "default_true_value")]
    pub true_value: RegistryValue,
    #[serde(default = "default_false_value")]
    pub false_value: RegistryValue,
}

fn default_true_value() -> RegistryValue {
    RegistryValue::Decimal(1)
}

fn default_false_value() -> RegistryValue {
    RegistryValue::Decimal(0)
}

/// Bounded 32-bit numeric element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_value: u32,
    #[serde(default = "u32_max")]
    pub max_value: u32,
    #[serde(default)]
    pub store_as_text: bool,
    #[serde(default)]
    pub soft: bool,
}

fn u32_max() -> u32 {
    u32::MAX
}

/// Bounded 64-bit numeric element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongDecimalElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_value: u64,
    #[serde(default = "u64_max")]
    pub max_value: u64,
    #[serde(default)]
    pub store_as_text: bool,
    #[serde(default)]
    pub soft: bool,
}

fn u64_max() -> u64 {
    u64::MAX
}

/// One permitted value of an enumeration element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationItem {
    pub id: String,
    pub display_name: String,
    pub value: RegistryValue,
}

/// Choice among a fixed set of values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub required: bool,
    pub items: Vec<EnumerationItem>,
}

/// Set of name/value entries written under a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value_prefix: Option<String>,
    #[serde(default)]
    pub additive: bool,
    #[serde(default)]
    pub explicit_value: bool,
    #[serde(default)]
    pub expandable: bool,
}

/// Multi-line string element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTextElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default)]
    pub max_strings: u32,
}

/// Single-line string element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default)]
    pub expandable: bool,
}

fn default_max_length() -> u32 {
    1023
}

// ── Element Item ───────────────────────────────────────────────────────

/// Discriminant of [`ElementItem`], matching its serialized `kind` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Boolean,
    Decimal,
    LongDecimal,
    Enumeration,
    List,
    MultiText,
    Text,
}

impl ElementKind {
    /// Every kind, in declaration order.
    pub const ALL: [ElementKind; 7] = [
        Self::Boolean,
        Self::Decimal,
        Self::LongDecimal,
        Self::Enumeration,
        Self::List,
        Self::MultiText,
        Self::Text,
    ];

    /// Serialized tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::LongDecimal => "long_decimal",
            Self::Enumeration => "enumeration",
            Self::List => "list",
            Self::MultiText => "multi_text",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One configurable value slot of a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementItem {
    Boolean(BooleanElement),
    Decimal(DecimalElement),
    LongDecimal(LongDecimalElement),
    Enumeration(EnumerationElement),
    List(ListElement),
    MultiText(MultiTextElement),
    Text(TextElement),
}

macro_rules! element_casts {
    ($($variant:ident => $ty:ty, $is:ident, $as:ident;)*) => {
        impl ElementItem {
            $(
                #[doc = concat!("Whether this is a `", stringify!($variant), "` element.")]
                pub fn $is(&self) -> bool {
                    matches!(self, Self::$variant(_))
                }

                #[doc = concat!("Unchecked downcast to [`", stringify!($ty), "`].")]
                ///
                /// # Panics
                ///
                /// Panics when called on any other variant.
                pub fn $as(&self) -> &$ty {
                    match self {
                        Self::$variant(inner) => inner,
                        other => panic!(
                            concat!(stringify!($as), " called on a {} element"),
                            other.kind()
                        ),
                    }
                }
            )*
        }
    };
}

element_casts! {
    Boolean => BooleanElement, is_boolean, as_boolean;
    Decimal => DecimalElement, is_decimal, as_decimal;
    LongDecimal => LongDecimalElement, is_long_decimal, as_long_decimal;
    Enumeration => EnumerationElement, is_enumeration, as_enumeration;
    List => ListElement, is_list, as_list;
    MultiText => MultiTextElement, is_multi_text, as_multi_text;
    Text => TextElement, is_text, as_text;
}

impl ElementItem {
    /// Discriminant of this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Boolean(_) => ElementKind::Boolean,
            Self::Decimal(_) => ElementKind::Decimal,
            Self::LongDecimal(_) => ElementKind::LongDecimal,
            Self::Enumeration(_) => ElementKind::Enumeration,
            Self::List(_) => ElementKind::List,
            Self::MultiText(_) => ElementKind::MultiText,
            Self::Text(_) => ElementKind::Text,
        }
    }

    /// Element identifier, unique within its policy.
    pub fn id(&self) -> &str {
        match self {
            Self::Boolean(e) => &e.id,
            Self::Decimal(e) => &e.id,
            Self::LongDecimal(e) => &e.id,
            Self::Enumeration(e) => &e.id,
            Self::List(e) => &e.id,
            Self::MultiText(e) => &e.id,
            Self::Text(e) => &e.id,
        }
    }
}
