//! Payload values: registry values carried by the model and the literal
//! kinds the formatter turns into C# source.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ── Literal ────────────────────────────────────────────────────────────

/// Every payload kind that can be rendered as a C# literal.
///
/// Serialized externally tagged (`{"u32": 5}`, `{"string": "x"}`,
/// `"delete"`), which is also the shape the `literal` template helper
/// accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// `true` / `false`.
    Bool(bool),
    /// A single UTF-16 code unit (C# `char`).
    Char(u16),
    /// Plain integer, rendered without suffix.
    Int(i64),
    /// `uint`.
    U32(u32),
    /// `ulong`.
    U64(u64),
    /// `float`.
    F32(f32),
    /// `double`.
    F64(f64),
    /// `decimal`.
    Decimal(Decimal),
    /// `string`, rendered verbatim-quoted.
    String(String),
    /// Enumeration member, rendered `TypeName.Member`.
    Enum {
        /// Enumeration type name.
        type_name: String,
        /// Member name.
        member: String,
    },
    /// Delete-sentinel: the value is absent and should be removed.
    Delete,
}

impl Literal {
    /// Whether this is the delete-sentinel.
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Literal {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// ── Registry Value ─────────────────────────────────────────────────────

/// A value written to (or removed from) the registry by a policy state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Literal", try_from = "Literal")]
pub enum RegistryValue {
    /// `REG_DWORD`.
    Decimal(u32),
    /// `REG_QWORD`.
    LongDecimal(u64),
    /// `REG_SZ`.
    String(String),
    /// Delete-sentinel.
    Delete,
}

impl RegistryValue {
    /// Whether this is the delete-sentinel.
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl From<RegistryValue> for Literal {
    fn from(v: RegistryValue) -> Self {
        match v {
            RegistryValue::Decimal(n) => Literal::U32(n),
            RegistryValue::LongDecimal(n) => Literal::U64(n),
            RegistryValue::String(s) => Literal::String(s),
            RegistryValue::Delete => Literal::Delete,
        }
    }
}

impl TryFrom<Literal> for RegistryValue {
    type Error = ModelError;

    fn try_from(v: Literal) -> Result<Self, Self::Error> {
        match v {
            Literal::U32(n) => Ok(Self::Decimal(n)),
            Literal::U64(n) => Ok(Self::LongDecimal(n)),
            Literal::Int(n) => u32::try_from(n)
                .map(Self::Decimal)
                .map_err(|_| ModelError::UnsupportedValue(format!("int {n} out of range"))),
            Literal::String(s) => Ok(Self::String(s)),
            Literal::Delete => Ok(Self::Delete),
            other => Err(ModelError::UnsupportedValue(format!("{other:?}"))),
        }
    }
}
