//! `{name}` / `{{name}}` template interpolation (spec.md §4.4).

use crate::json::{print, JVal, PrinterOptions};
use crate::namespace::Namespace;

/// Characters that pass through a `-e` shell substitution unescaped; every
/// other byte is backslash-escaped (spec.md §4.4 "Shell interpolation").
const SHELL_SAFE: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-./,:@%+=";

/// Interpolate `{name}`/`{{name}}` tokens against the namespace, substituting
/// `current` for the empty token `{}`/`{{}}`. Unresolved tokens are left
/// untouched.
pub fn interpolate(template: &str, ns: &Namespace, current: Option<&JVal>) -> String {
    interpolate_with(template, ns, current, false)
}

/// Same substitution, but each substituted fragment is shell-quoted
/// afterward (used for `-e`).
pub fn interpolate_shell(template: &str, ns: &Namespace, current: Option<&JVal>) -> String {
    interpolate_with(template, ns, current, true)
}

fn interpolate_with(template: &str, ns: &Namespace, current: Option<&JVal>, quote: bool) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            if chars.get(i + 1) == Some(&'{') {
                if let Some(end) = find_double_close(&chars, i + 2) {
                    let name: String = chars[i + 2..end].iter().collect();
                    match resolve(&name, ns, current) {
                        Some(v) => {
                            let text = print(v, &PrinterOptions::raw());
                            out.push_str(&if quote { shell_quote(&text) } else { text });
                        }
                        None => out.extend(&chars[i..end + 2]),
                    }
                    i = end + 2;
                    continue;
                }
            } else if let Some(end) = find_single_close(&chars, i + 1) {
                let name: String = chars[i + 1..end].iter().collect();
                match resolve(&name, ns, current) {
                    Some(v) => {
                        let text = naked_form(v);
                        out.push_str(&if quote { shell_quote(&text) } else { text });
                    }
                    None => out.extend(&chars[i..=end]),
                }
                i = end + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn resolve<'a>(name: &str, ns: &'a Namespace, current: Option<&'a JVal>) -> Option<&'a JVal> {
    if name.is_empty() {
        current
    } else {
        ns.get(name)
    }
}

fn find_single_close(chars: &[char], start: usize) -> Option<usize> {
    (start..chars.len()).find(|&i| chars[i] == '}')
}

fn find_double_close(chars: &[char], start: usize) -> Option<usize> {
    (start..chars.len().saturating_sub(1)).find(|&i| chars[i] == '}' && chars[i + 1] == '}')
}

/// The "naked" substitution form: strip a string's quotes, or a
/// container's outer brackets, leaving atomics as their canonical text.
fn naked_form(v: &JVal) -> String {
    match v {
        JVal::String(s) => s.clone(),
        JVal::Array(_) | JVal::Object(_) => {
            let full = print(v, &PrinterOptions::raw());
            full[1..full.len() - 1].to_string()
        }
        _ => print(v, &PrinterOptions::raw()),
    }
}

fn shell_quote(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        if SHELL_SAFE.contains(c) {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::JNumber;

    #[test]
    fn naked_form_strips_string_quotes() {
        let mut ns = Namespace::new();
        ns.set_global("name", JVal::String("Al".into()));
        assert_eq!(interpolate("Hi {name}", &ns, None), "Hi Al");
    }

    #[test]
    fn double_brace_preserves_quotes() {
        let mut ns = Namespace::new();
        ns.set_global("name", JVal::String("Al".into()));
        assert_eq!(interpolate("{{name}}", &ns, None), "\"Al\"");
    }

    #[test]
    fn empty_token_uses_current_value() {
        let ns = Namespace::new();
        let current = JVal::Number(JNumber::from_f64(3.0));
        assert_eq!(interpolate("v={}", &ns, Some(&current)), "v=3");
    }

    #[test]
    fn unresolved_token_left_literal() {
        let ns = Namespace::new();
        assert_eq!(interpolate("{missing}", &ns, None), "{missing}");
    }

    #[test]
    fn container_naked_form_strips_outer_brackets() {
        let mut ns = Namespace::new();
        let mut c = crate::json::Container::new_array();
        c.push_back(JVal::Number(JNumber::from_f64(1.0)));
        c.push_back(JVal::Number(JNumber::from_f64(2.0)));
        ns.set_global("xs", JVal::Array(c));
        assert_eq!(interpolate("[{xs}]", &ns, None), "[1,2]");
    }

    #[test]
    fn shell_interpolation_escapes_metacharacters() {
        let mut ns = Namespace::new();
        ns.set_global("name", JVal::String("a b".into()));
        assert_eq!(interpolate_shell("echo {name}", &ns, None), "echo a\\ b");
    }
}
