//! Deterministic whitespace normalization of generated C# source.
//!
//! Rendering stitches templates together with whatever indentation each one
//! happened to carry. Before compiling, the unit is re-indented from its
//! brace structure alone:
//!
//! - four spaces per open brace, preprocessor directives at column 0;
//! - trailing whitespace trimmed, runs of blank lines collapsed to one;
//! - no blank line directly after `{` or directly before `}`;
//! - LF line endings, exactly one trailing newline.
//!
//! The scan understands comments, strings and char literals, so braces inside
//! them do not count. Lines that begin inside a multi-line verbatim string or
//! block comment are emitted unchanged. A CR ending a line inside a verbatim
//! string is part of the string's value and is kept.

const INDENT: &str = "    ";

/// Lexer state carried from one line to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Carry {
    Code,
    BlockComment,
    Verbatim,
}

/// Normalize `source`. Output is a fixed point: normalizing it again
/// returns it unchanged.
pub fn normalize_source(source: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut depth: usize = 0;
    let mut carry = Carry::Code;
    let mut pending_blank = false;
    let mut after_open = false;

    for raw in source.split_inclusive('\n') {
        let raw = raw.strip_suffix('\n').unwrap_or(raw);

        if carry != Carry::Code {
            carry = scan(raw, carry, &mut depth);
            out.push(line_body(raw, carry).to_string());
            after_open = false;
            continue;
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        let closes_first = trimmed.starts_with('}');
        if pending_blank && !after_open && !closes_first {
            out.push(String::new());
        }
        pending_blank = false;

        if trimmed.starts_with('#') {
            out.push(trimmed.to_string());
            after_open = false;
            continue;
        }

        let leading_closers = trimmed
            .chars()
            .take_while(|c| *c == '}' || c.is_whitespace())
            .filter(|c| *c == '}')
            .count();
        let indent = depth.saturating_sub(leading_closers);

        let content = raw.trim_start();
        carry = scan(content, Carry::Code, &mut depth);
        let content = match carry {
            Carry::Code => content.trim_end(),
            _ => line_body(content, carry),
        };

        out.push(format!("{}{}", INDENT.repeat(indent), content));
        after_open = carry == Carry::Code && content.ends_with('{');
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// `line` without its CR terminator, unless the line ends inside a verbatim
/// string.
fn line_body(line: &str, carry: Carry) -> &str {
    match carry {
        Carry::Verbatim => line,
        _ => line.strip_suffix('\r').unwrap_or(line),
    }
}

/// Scan one line from `carry`, updating brace `depth`. Returns the state the
/// next line starts in.
fn scan(line: &str, mut carry: Carry, depth: &mut usize) -> Carry {
    let chars: Vec<char> = line.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut i = 0;

    while i < chars.len() {
        match carry {
            Carry::BlockComment => {
                if chars[i] == '*' && at(i + 1) == Some('/') {
                    carry = Carry::Code;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            Carry::Verbatim => {
                if chars[i] == '"' {
                    if at(i + 1) == Some('"') {
                        i += 2;
                    } else {
                        carry = Carry::Code;
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            Carry::Code => match (chars[i], at(i + 1), at(i + 2)) {
                ('/', Some('/'), _) => break,
                ('/', Some('*'), _) => {
                    carry = Carry::BlockComment;
                    i += 2;
                }
                ('@', Some('"'), _) => {
                    carry = Carry::Verbatim;
                    i += 2;
                }
                ('@', Some('$'), Some('"')) | ('$', Some('@'), Some('"')) => {
                    carry = Carry::Verbatim;
                    i += 3;
                }
                ('"', _, _) => i = skip_quoted(&chars, i, '"'),
                ('\'', _, _) => i = skip_quoted(&chars, i, '\''),
                ('{', _, _) => {
                    *depth += 1;
                    i += 1;
                }
                ('}', _, _) => {
                    *depth = depth.saturating_sub(1);
                    i += 1;
                }
                _ => i += 1,
            },
        }
    }

    carry
}

/// Index just past the regular string or char literal opening at `start`.
/// Unterminated literals end at the line end.
fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reindents_by_brace_depth() {
        let source = "namespace A {\nclass B\n{\n        void C() { }\n}\n   }";
        assert_eq!(
            normalize_source(source),
            "namespace A {\n    class B\n    {\n        void C() { }\n    }\n}\n"
        );
    }

    #[test]
    fn preprocessor_lines_at_column_zero() {
        let source = "namespace A\n{\n    #pragma warning disable CS0219\n    class B { }\n}\n";
        assert_eq!(
            normalize_source(source),
            "namespace A\n{\n#pragma warning disable CS0219\n    class B { }\n}\n"
        );
    }

    #[test]
    fn blank_lines_collapse_and_hug_braces() {
        let source = "\n\nclass A\n{\n\n\n    int x;\n\n\n\n    int y;\n\n}\n\n\n";
        assert_eq!(
            normalize_source(source),
            "class A\n{\n    int x;\n\n    int y;\n}\n"
        );
    }

    #[test]
    fn braces_in_literals_and_comments_do_not_count() {
        let source = "class A\n{\nstring s = \"{{\";\nchar c = '{';\n// {\n/* { */\nint z;\n}\n";
        assert_eq!(
            normalize_source(source),
            "class A\n{\n    string s = \"{{\";\n    char c = '{';\n    // {\n    /* { */\n    int z;\n}\n"
        );
    }

    #[test]
    fn escaped_quote_in_string() {
        let source = "class A\n{\nstring s = \"\\\"{\";\n}\n";
        assert_eq!(
            normalize_source(source),
            "class A\n{\n    string s = \"\\\"{\";\n}\n"
        );
    }

    #[test]
    fn multiline_verbatim_strings_are_preserved() {
        let source = "class A\n{\nstring s = @\"first {   \n  second \"\" }\n\n   third\";\nint x;\n}\n";
        assert_eq!(
            normalize_source(source),
            "class A\n{\n    string s = @\"first {   \n  second \"\" }\n\n   third\";\n    int x;\n}\n"
        );
    }

    #[test]
    fn block_comment_bodies_are_preserved() {
        let source = "class A\n{\n/* start\n      { keep me }\n   end */\nint x;\n}\n";
        assert_eq!(
            normalize_source(source),
            "class A\n{\n    /* start\n      { keep me }\n   end */\n    int x;\n}\n"
        );
    }

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(normalize_source("class A\r\n{\r\n}\r\n"), "class A\n{\n}\n");
    }

    #[test]
    fn crlf_inside_verbatim_string_is_kept() {
        let source = "class A\r\n{\r\nstring s = @\"a\r\nb\";\r\n/* c\r\nd */\r\n}\r\n";
        let once = normalize_source(source);
        assert_eq!(
            once,
            "class A\n{\n    string s = @\"a\r\nb\";\n    /* c\nd */\n}\n"
        );
        assert_eq!(normalize_source(&once), once);
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        assert_eq!(normalize_source("int x;   \t\n"), "int x;\n");
    }

    fn source_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("{".to_string()),
            Just("}".to_string()),
            Just("".to_string()),
            Just("   ".to_string()),
            Just("#region r".to_string()),
            Just("} else {".to_string()),
            Just("string s = @\"a".to_string()),
            Just("b\";".to_string()),
            Just("string t = @\"x\r".to_string()),
            Just("/* c".to_string()),
            Just("d */".to_string()),
            "[a-z ;(){}\"']{0,12}",
        ]
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(lines in prop::collection::vec(source_line(), 0..24)) {
            let once = normalize_source(&lines.join("\n"));
            let twice = normalize_source(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.ends_with('\n'));
        }
    }
}
