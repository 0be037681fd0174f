//! Identifier, namespace and documentation escaping.
//!
//! Every function here is total and idempotent: escaping an already escaped
//! value returns it unchanged.

use unicode_general_category::{get_general_category, GeneralCategory};

/// C# reserved keywords. Contextual keywords are legal identifiers and are
/// not listed.
const RESERVED: &[&str] = &[
    "__arglist", "__makeref", "__reftype", "__refvalue", "abstract", "as", "base", "bool",
    "break", "byte", "case", "catch", "char", "checked", "class", "const", "continue",
    "decimal", "default", "delegate", "do", "double", "else", "enum", "event", "explicit",
    "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace",
    "new", "null", "object", "operator", "out", "override", "params", "private",
    "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Whether `word` is a C# reserved keyword.
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// ASCII letters and digits, plus the non-ASCII characters C# accepts in
/// identifiers: letters, letter numbers, combining marks and decimal digits.
fn is_fill(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric();
    }
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::LetterNumber
            | GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::DecimalNumber
    )
}

/// Characters that end a line in C# source.
fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn escape_with(name: &str, keep: impl Fn(char) -> bool, underscore_leads: bool) -> String {
    if name.trim().is_empty() {
        return String::new();
    }

    let mut out: String = name.chars().filter(|&c| keep(c)).collect();
    let leads = match out.chars().next() {
        Some(c) => c.is_ascii_alphabetic() || (underscore_leads && c == '_'),
        None => false,
    };
    if !leads || is_reserved(&out) {
        out.insert(0, '_');
    }
    out
}

/// Escape `name` into a legal C# type name.
///
/// Keeps ASCII letters and digits plus non-ASCII identifier characters
/// (letters, marks, digits); everything else,
/// dashes and underscores included, is dropped. A `_` is prefixed when the
/// result does not start with an ASCII letter or is a reserved keyword.
/// Blank input yields an empty string.
pub fn escape_type(name: &str) -> String {
    escape_with(name, is_fill, false)
}

/// Escape `name` into a legal C# member identifier.
///
/// Like [`escape_type`], but underscores are kept and may lead.
pub fn escape_identifier(name: &str) -> String {
    escape_with(name, |c| c == '_' || is_fill(c), true)
}

/// Escape a dot-separated namespace, segment by segment.
///
/// Blank segments are dropped, so `"a..b"` becomes `"a.b"`.
pub fn escape_namespace(name: &str) -> String {
    name.split('.')
        .map(escape_type)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Render free text as `///` documentation lines with XML markup encoded.
///
/// Every C# line terminator starts a new `///` line, so no text can leave
/// the comment.
pub fn escape_xmldoc(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    unified
        .split(is_line_break)
        .map(|line| format!("/// {}", encode_xml(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode_xml(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// C# identifier-start: `_` or a letter-class character.
    fn is_identifier_start(c: char) -> bool {
        use GeneralCategory::*;
        c == '_'
            || matches!(
                get_general_category(c),
                UppercaseLetter
                    | LowercaseLetter
                    | TitlecaseLetter
                    | ModifierLetter
                    | OtherLetter
                    | LetterNumber
            )
    }

    /// C# identifier-part: a start character, or a mark, digit, connector or
    /// formatting character.
    fn is_identifier_part(c: char) -> bool {
        use GeneralCategory::*;
        is_identifier_start(c)
            || matches!(
                get_general_category(c),
                NonspacingMark | SpacingMark | DecimalNumber | ConnectorPunctuation | Format
            )
    }

    fn is_legal_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        is_identifier_start(first) && chars.all(is_identifier_part) && !is_reserved(s)
    }

    #[test]
    fn type_names() {
        assert_eq!(escape_type("My-Type_Name"), "MyTypeName");
        assert_eq!(escape_type("9lives"), "_9lives");
        assert_eq!(escape_type("class"), "_class");
        assert_eq!(escape_type("  "), "");
        assert_eq!(escape_type("!!!"), "_");
        assert_eq!(escape_type("Straße"), "Straße");
        assert_eq!(escape_type("Ünicode"), "_Ünicode");
    }

    #[test]
    fn symbol_letters_are_dropped() {
        // Circled and squared letters are alphabetic but category So.
        assert_eq!(escape_type("A\u{24D0}"), "A");
        assert_eq!(escape_type("\u{1F130}B"), "B");
        assert_eq!(escape_identifier("x\u{24B6}_y"), "x_y");
        assert_eq!(escape_type("\u{24D0}"), "_");
    }

    #[test]
    fn marks_and_digits_are_kept() {
        assert_eq!(escape_type("Cafe\u{301}"), "Cafe\u{301}");
        assert_eq!(escape_type("N\u{0663}"), "N\u{0663}");
    }

    #[test]
    fn identifiers_keep_underscores() {
        assert_eq!(escape_identifier("my_value"), "my_value");
        assert_eq!(escape_identifier("_private"), "_private");
        assert_eq!(escape_identifier("1st"), "_1st");
        assert_eq!(escape_identifier("string"), "_string");
        assert_eq!(escape_identifier("__arglist"), "___arglist");
        assert_eq!(escape_identifier("a b.c"), "abc");
    }

    #[test]
    fn namespaces() {
        assert_eq!(escape_namespace("Windows.Components"), "Windows.Components");
        assert_eq!(escape_namespace("a..b"), "a.b");
        assert_eq!(escape_namespace(".x-y.1z."), "xy._1z");
        assert_eq!(escape_namespace("System.namespace"), "System._namespace");
        assert_eq!(escape_namespace(""), "");
    }

    #[test]
    fn xmldoc_lines() {
        assert_eq!(
            escape_xmldoc("a < b & c\r\nd \"e\"\rf 'g'\nh>"),
            "/// a &lt; b &amp; c\n/// d &quot;e&quot;\n/// f &apos;g&apos;\n/// h&gt;"
        );
        assert_eq!(escape_xmldoc(""), "/// ");
    }

    #[test]
    fn xmldoc_unicode_line_breaks_stay_in_comment() {
        assert_eq!(
            escape_xmldoc("first\u{2028}} class Injected {"),
            "/// first\n/// } class Injected {"
        );
        assert_eq!(escape_xmldoc("a\u{85}b\u{2029}c"), "/// a\n/// b\n/// c");
    }

    proptest! {
        #[test]
        fn type_escape_is_idempotent(s in "\\PC*") {
            let once = escape_type(&s);
            prop_assert_eq!(escape_type(&once), once);
        }

        #[test]
        fn identifier_escape_is_idempotent(s in "\\PC*") {
            let once = escape_identifier(&s);
            prop_assert_eq!(escape_identifier(&once), once);
        }

        #[test]
        fn namespace_escape_is_idempotent(s in "[a-z0-9_.\\- ]{0,24}") {
            let once = escape_namespace(&s);
            prop_assert_eq!(escape_namespace(&once), once);
        }

        #[test]
        fn escaped_names_are_legal(s in "\\PC*") {
            prop_assume!(!s.trim().is_empty());
            prop_assert!(is_legal_identifier(&escape_type(&s)));
            prop_assert!(is_legal_identifier(&escape_identifier(&s)));
        }

        #[test]
        fn xmldoc_preserves_lines_and_hides_markup(
            lines in proptest::collection::vec("[^\r\n\u{85}\u{2028}\u{2029}]{0,16}", 1..6),
            sep in prop_oneof![
                Just("\n"),
                Just("\r\n"),
                Just("\r"),
                Just("\u{85}"),
                Just("\u{2028}"),
                Just("\u{2029}"),
            ],
        ) {
            let text = lines.join(sep);
            let doc = escape_xmldoc(&text);
            // Count lines the way a C# lexer does.
            let doc = doc.replace("\r\n", "\n");
            prop_assert_eq!(doc.split(is_line_break).count(), lines.len());
            for line in doc.split(is_line_break) {
                prop_assert!(line.starts_with("/// "));
                prop_assert!(!line.contains('<'));
                prop_assert!(!line.contains('>'));
            }
        }
    }
}
