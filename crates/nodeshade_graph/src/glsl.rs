// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL text helpers: literals, generated identifiers and identifier rewriting.

use crate::port::ValueKind;

/// Format a float so GLSL reads it as a float (`1.0`, not `1`)
pub fn float_literal(value: f32) -> String {
    format!("{value:?}")
}

/// Format a vector constructor, e.g. `vec3(1.0, 0.0, 0.0)`
pub fn vector_literal(type_name: &str, components: &[f32]) -> String {
    let parts: Vec<String> = components.iter().map(|c| float_literal(*c)).collect();
    format!("{type_name}({})", parts.join(", "))
}

/// Widen a scalar expression to `to` when needed
pub fn coerce(expr: &str, from: ValueKind, to: ValueKind) -> String {
    if from == ValueKind::Float && to != ValueKind::Float {
        format!("{}({expr})", to.glsl_type())
    } else {
        expr.to_string()
    }
}

/// `PascalCase` stem for generated identifiers: "Scale with Time" -> `ScaleWithTime`.
///
/// The stem contains no underscores, so `<stem>_<n>` never collides across nodes.
pub fn identifier_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for word in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            stem.push(first.to_ascii_uppercase());
            stem.extend(chars);
        }
    }

    if stem.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        stem.insert_str(0, "Node");
    }
    stem
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrite identifiers in a GLSL snippet.
///
/// `map` is called for every identifier outside comments that is not a
/// member access (`v.x`) or part of a number literal. Returning `Ok(None)`
/// keeps the identifier as written.
pub fn rewrite_identifiers<F, E>(code: &str, mut map: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<Option<String>, E>,
{
    let mut out = String::with_capacity(code.len());
    let mut chars = code.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((start, c)) = chars.next() {
        if c == '/' {
            match chars.peek().map(|&(_, next)| next) {
                Some('/') => {
                    let end = code[start..].find('\n').map_or(code.len(), |i| start + i);
                    out.push_str(&code[start..end]);
                    while chars.peek().is_some_and(|&(i, _)| i < end) {
                        chars.next();
                    }
                    prev = None;
                    continue;
                }
                Some('*') => {
                    let end = code[start + 2..]
                        .find("*/")
                        .map_or(code.len(), |i| start + 2 + i + 2);
                    out.push_str(&code[start..end]);
                    while chars.peek().is_some_and(|&(i, _)| i < end) {
                        chars.next();
                    }
                    prev = None;
                    continue;
                }
                _ => {}
            }
        }

        let leading_dot = c == '.'
            && chars.peek().is_some_and(|&(_, n)| n.is_ascii_digit())
            && !prev.is_some_and(is_ident_continue);
        if c.is_ascii_digit() || leading_dot {
            // Number literal, including suffixes and exponents (1.0e-3, 2u).
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = chars.peek() {
                let exponent_sign =
                    (n == '-' || n == '+') && matches!(code[..i].chars().last(), Some('e' | 'E'));
                if n.is_ascii_alphanumeric() || n == '.' || exponent_sign {
                    end = i + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            out.push_str(&code[start..end]);
            prev = code[..end].chars().last();
            continue;
        }

        if is_ident_start(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = chars.peek() {
                if is_ident_continue(n) {
                    end = i + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let ident = &code[start..end];
            let member = prev == Some('.');
            match if member { None } else { map(ident)? } {
                Some(replacement) => out.push_str(&replacement),
                None => out.push_str(ident),
            }
            prev = ident.chars().last();
            continue;
        }

        out.push(c);
        if !c.is_whitespace() {
            prev = Some(c);
        }
    }

    Ok(out)
}

/// Indent every non-empty line of a snippet, dropping blank lines
pub fn indent_lines(code: &str, indent: &str) -> Vec<String> {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{indent}{line}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(code: &str) -> String {
        rewrite_identifiers::<_, ()>(code, |ident| {
            Ok(ident.strip_prefix("in_").map(|rest| format!("N_1_in_{rest}")))
        })
        .unwrap()
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(-0.5), "-0.5");
        assert_eq!(float_literal(0.8), "0.8");
    }

    #[test]
    fn test_identifier_stem() {
        assert_eq!(identifier_stem("Scale with Time"), "ScaleWithTime");
        assert_eq!(identifier_stem("Animation Stack Output"), "AnimationStackOutput");
        assert_eq!(identifier_stem("my_node"), "MyNode");
        assert_eq!(identifier_stem("3D Noise"), "Node3DNoise");
        assert_eq!(identifier_stem(""), "Node");
    }

    #[test]
    fn test_rewrite_identifiers() {
        assert_eq!(rename("in_a * in_b"), "N_1_in_a * N_1_in_b");
        assert_eq!(rename("sin(in_time * 2.0)"), "sin(N_1_in_time * 2.0)");
    }

    #[test]
    fn test_rewrite_skips_members_comments_and_numbers() {
        assert_eq!(rename("v.in_x + in_x"), "v.in_x + N_1_in_x");
        assert_eq!(rename("// in_a stays\nin_a"), "// in_a stays\nN_1_in_a");
        assert_eq!(rename("/* in_a */ in_a"), "/* in_a */ N_1_in_a");
        assert_eq!(rename("1e-3 + in_a"), "1e-3 + N_1_in_a");
        assert_eq!(rename("position.y * 0.3"), "position.y * 0.3");
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("x", ValueKind::Float, ValueKind::Vector3), "vec3(x)");
        assert_eq!(coerce("x", ValueKind::Vector3, ValueKind::Color), "x");
        assert_eq!(coerce("x", ValueKind::Float, ValueKind::Float), "x");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(
            indent_lines("\n  a = 1.0;\n\n  b = 2.0;\n", "    "),
            vec!["    a = 1.0;".to_string(), "    b = 2.0;".to_string()]
        );
    }
}
