//! C# literal formatting and resource-reference extraction.

use std::sync::LazyLock;

use policygen_types::Literal;
use regex::Regex;

use crate::escape::{escape_identifier, escape_type};

static RESOURCE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\((?P<type>[^.]+)\.(?P<key>[^)]+)\)").expect("valid resource reference regex")
});

/// Format `value` as C# source text of its natural type.
pub fn literal(value: &Literal) -> String {
    match value {
        Literal::Bool(b) => b.to_string(),
        Literal::Char(unit) => char_literal(*unit),
        Literal::Int(n) => n.to_string(),
        Literal::U32(n) => format!("{n}u"),
        Literal::U64(n) => format!("{n}uL"),
        Literal::F32(f) => non_finite(f64::from(*f), "float").unwrap_or_else(|| format!("{f}f")),
        Literal::F64(f) => non_finite(*f, "double").unwrap_or_else(|| format!("{f}d")),
        Literal::Decimal(d) => format!("{d}m"),
        Literal::String(s) => format!("@\"{}\"", s.replace('"', "\"\"")),
        Literal::Enum { type_name, member } => {
            format!("{}.{}", escape_type(type_name), escape_identifier(member))
        }
        Literal::Delete => "null".to_string(),
    }
}

fn char_literal(unit: u16) -> String {
    match char::from_u32(u32::from(unit)) {
        Some(c) if c.is_alphanumeric() => format!("'{c}'"),
        _ => format!("'\\u{unit:04x}'"),
    }
}

fn non_finite(value: f64, type_name: &str) -> Option<String> {
    let member = if value.is_nan() {
        "NaN"
    } else if value == f64::INFINITY {
        "PositiveInfinity"
    } else if value == f64::NEG_INFINITY {
        "NegativeInfinity"
    } else {
        return None;
    };
    Some(format!("{type_name}.{member}"))
}

/// Key of a `$(type.key)` resource reference, or an empty string when `text`
/// holds none.
pub fn ref_id(text: &str) -> String {
    RESOURCE_REF
        .captures(text)
        .and_then(|caps| caps.name("key"))
        .map(|key| key.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn scalars() {
        assert_eq!(literal(&Literal::Bool(true)), "true");
        assert_eq!(literal(&Literal::Int(-42)), "-42");
        assert_eq!(literal(&Literal::U32(7)), "7u");
        assert_eq!(literal(&Literal::U64(u64::MAX)), "18446744073709551615uL");
        assert_eq!(literal(&Literal::F64(1.5)), "1.5d");
        assert_eq!(literal(&Literal::F32(2.0)), "2f");
        assert_eq!(literal(&Literal::F32(0.1)), "0.1f");
        assert_eq!(
            literal(&Literal::Decimal(Decimal::from_str("12.50").unwrap())),
            "12.50m"
        );
    }

    #[test]
    fn non_finite_floats_use_named_constants() {
        assert_eq!(literal(&Literal::F64(f64::NAN)), "double.NaN");
        assert_eq!(literal(&Literal::F32(f32::INFINITY)), "float.PositiveInfinity");
        assert_eq!(
            literal(&Literal::F64(f64::NEG_INFINITY)),
            "double.NegativeInfinity"
        );
    }

    #[test]
    fn chars() {
        assert_eq!(literal(&Literal::Char(u16::from(b'a'))), "'a'");
        assert_eq!(literal(&Literal::Char(u16::from(b'\''))), "'\\u0027'");
        assert_eq!(literal(&Literal::Char(0xD800)), "'\\ud800'");
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(literal(&Literal::from("C:\\Path")), "@\"C:\\Path\"");
        assert_eq!(literal(&Literal::from("say \"hi\"")), "@\"say \"\"hi\"\"\"");
        assert_eq!(literal(&Literal::from("two\nlines")), "@\"two\nlines\"");
    }

    #[test]
    fn enums_are_escaped() {
        let value = Literal::Enum {
            type_name: "policy-class".into(),
            member: "default".into(),
        };
        assert_eq!(literal(&value), "policyclass._default");
    }

    #[test]
    fn delete_sentinel_renders_null() {
        assert_eq!(literal(&Literal::Delete), "null");
    }

    #[test]
    fn resource_references() {
        assert_eq!(ref_id("$(string.DisableThing)"), "DisableThing");
        assert_eq!(ref_id("$(STRING.Mixed_Case)"), "Mixed_Case");
        assert_eq!(ref_id("prefix $(presentation.P1) suffix"), "P1");
        assert_eq!(ref_id("Plain display name"), "");
        assert_eq!(ref_id("$(string)"), "");
    }
}
