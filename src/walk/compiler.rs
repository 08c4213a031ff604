//! Compiles a walk-path string into `Vec<Step>` (spec.md §4.2).

use super::lexeme::{RawToken, Tokenizer};
use super::step::{Direction, Directive, JumpKind, SearchKind, SizeMode, Step, StepKind, Subscript};
use regex::Regex;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError, Clone, PartialEq)]
pub enum WalkError {
    #[error("unterminated lexeme at byte {0}")]
    UnterminatedLexeme(usize),
    #[error("unexpected character at byte {0}")]
    UnexpectedChar(usize),
    #[error("suffix '{suffix}' requires non-empty content (byte {offset})")]
    EmptyRequiredContent { suffix: char, offset: usize },
    #[error("invalid quantifier '{text}' at byte {offset}")]
    InvalidQuantifier { text: String, offset: usize },
    #[error("attached label at byte {0} must follow a text subscript immediately before a search")]
    AttachedLabelMisplaced(usize),
    #[error("attached label at byte {0} cannot be combined with a label-matching suffix")]
    AttachedLabelWithLabelSuffix(usize),
    #[error("unknown suffix letter '{0}' at byte {1}")]
    UnknownSuffix(char, usize),
    #[error("':' at byte {0} is not followed by a search lexeme")]
    DanglingColon(usize),
    #[error("invalid regex '{pattern}': {message}")]
    BadRegex { pattern: String, message: String },
    #[error("'{0}' at byte {1} requires a quantifier")]
    MissingQuantifier(char, usize),
}

impl WalkError {
    /// Exit code offset for this subsystem (spec.md §7 band 20-29).
    pub fn exit_code(&self) -> i32 {
        let slot = match self {
            WalkError::UnterminatedLexeme(_) => 0,
            WalkError::UnexpectedChar(_) => 1,
            WalkError::EmptyRequiredContent { .. } => 2,
            WalkError::InvalidQuantifier { .. } => 3,
            WalkError::AttachedLabelMisplaced(_) => 4,
            WalkError::AttachedLabelWithLabelSuffix(_) => 5,
            WalkError::UnknownSuffix(..) => 6,
            WalkError::DanglingColon(_) => 7,
            WalkError::BadRegex { .. } => 8,
            WalkError::MissingQuantifier(..) => 9,
        };
        20 + slot
    }
}

/// Parsed quantifier fields shared by numeric subscripts and search suffixes.
struct Quant {
    offset: i64,
    init: i64,
    range_end: Option<i64>,
    range_step: i64,
}

fn parse_quantifier(text: Option<&str>, at: usize) -> Result<Quant, WalkError> {
    let Some(text) = text else {
        return Ok(Quant {
            offset: 0,
            init: -1,
            range_end: None,
            range_step: 1,
        });
    };
    let invalid = || WalkError::InvalidQuantifier {
        text: text.to_string(),
        offset: at,
    };
    if let Some(rest) = text.strip_prefix('+') {
        let n: i64 = rest.parse().map_err(|_| invalid())?;
        return Ok(Quant {
            offset: n,
            init: n,
            range_end: None,
            range_step: 1,
        });
    }
    let mut parts = text.split(':');
    let n: i64 = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let m = parts.next();
    let s = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }
    match (m, s) {
        (None, _) => Ok(Quant {
            offset: n,
            init: -1,
            range_end: None,
            range_step: 1,
        }),
        (Some(m), step) => {
            let m: i64 = m.parse().map_err(|_| invalid())?;
            let step: i64 = match step {
                Some(s) => s.parse().map_err(|_| invalid())?,
                None => 1,
            };
            if step <= 0 {
                return Err(invalid());
            }
            Ok(Quant {
                offset: n,
                init: n,
                range_end: Some(m),
                range_step: step,
            })
        }
    }
}

fn classify_subscript(content: &str) -> Subscript {
    if let Some(rest) = content.strip_prefix('^') {
        if let Ok(n) = rest.parse::<i64>() {
            return Subscript::Truncate(n);
        }
    }
    if let Some(rest) = content.strip_prefix('-') {
        if let Ok(n) = rest.parse::<i64>() {
            return Subscript::Ascend(n);
        }
    }
    // Accept leading '+' or bare digits as numeric-index grammar; the
    // quantifier fields (iterability) are filled in separately from the
    // same raw text by `compile_subscript`.
    let numeric_part = content.strip_prefix('+').unwrap_or(content);
    let base = numeric_part.split(':').next().unwrap_or("");
    if !base.is_empty() && base.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = base.parse::<i64>() {
            return Subscript::Index(n);
        }
    }
    Subscript::Label(content.to_string())
}

fn requires_nonempty_content(suffix: char) -> bool {
    matches!(suffix, 'r' | 'R' | 'd' | 'D' | 'l' | 'L' | 'j' | 's' | 't')
}

fn is_label_matching_suffix(suffix: char) -> bool {
    matches!(suffix, 'l' | 'L' | 't')
}

fn compile_regex(pattern: &str) -> Result<Regex, WalkError> {
    Regex::new(pattern).map_err(|e| WalkError::BadRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn search_kind(
    suffix: char,
    content: &str,
    offset: usize,
) -> Result<(SearchKind, Option<Regex>), WalkError> {
    if requires_nonempty_content(suffix) && content.is_empty() {
        return Err(WalkError::EmptyRequiredContent { suffix, offset });
    }
    let name_opt = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
    Ok(match suffix {
        'r' => (SearchKind::Regular(content.to_string()), None),
        'R' => (
            SearchKind::Regex(content.to_string()),
            Some(compile_regex(content)?),
        ),
        'P' => (SearchKind::AnyString(name_opt(content)), None),
        'd' => (SearchKind::Digital(content.to_string()), None),
        'D' => (
            SearchKind::DigitalRegex(content.to_string()),
            Some(compile_regex(content)?),
        ),
        'N' => (SearchKind::AnyNumber(name_opt(content)), None),
        'b' => match content {
            "true" => (SearchKind::Boolean(Some(true), None), None),
            "false" => (SearchKind::Boolean(Some(false), None), None),
            _ => (SearchKind::Boolean(None, name_opt(content)), None),
        },
        'n' => (SearchKind::Null(name_opt(content)), None),
        'l' => (SearchKind::LabelExact(content.to_string()), None),
        'L' => (
            SearchKind::LabelRegex(content.to_string()),
            Some(compile_regex(content)?),
        ),
        'a' => (SearchKind::AnyAtomic, None),
        'o' => (SearchKind::AnyObject, None),
        'i' => (SearchKind::AnyArray, None),
        'c' => (SearchKind::AnyContainer, None),
        'e' => (SearchKind::EndNode, None),
        'w' => (SearchKind::Any, None),
        'j' => (SearchKind::JsonLiteral(content.to_string()), None),
        's' => (SearchKind::NamespaceValue(content.to_string()), None),
        't' => (SearchKind::NamespaceKey(content.to_string()), None),
        'q' => (SearchKind::Unique, None),
        'Q' => (SearchKind::Duplicate, None),
        'g' => (SearchKind::Ascending, None),
        'G' => (SearchKind::Descending, None),
        other => return Err(WalkError::UnknownSuffix(other, offset)),
    })
}

fn directive_kind(
    suffix: char,
    content: &str,
    quantifier: Option<&str>,
    offset: usize,
) -> Result<Directive, WalkError> {
    Ok(match suffix {
        'v' => Directive::StoreValue(content.to_string()),
        'k' => Directive::StoreKey(content.to_string()),
        'z' => Directive::Erase(content.to_string()),
        'u' => Directive::Callback,
        'I' => {
            let (inc, mul) = match quantifier {
                None => (1, None),
                Some(q) => {
                    let mut parts = q.split(':');
                    let inc: i64 = parts
                        .next()
                        .filter(|s| !s.is_empty())
                        .ok_or(WalkError::InvalidQuantifier {
                            text: q.to_string(),
                            offset,
                        })?
                        .parse()
                        .map_err(|_| WalkError::InvalidQuantifier {
                            text: q.to_string(),
                            offset,
                        })?;
                    let mul = match parts.next() {
                        Some(m) => Some(m.parse().map_err(|_| WalkError::InvalidQuantifier {
                            text: q.to_string(),
                            offset,
                        })?),
                        None => None,
                    };
                    (inc, mul)
                }
            };
            Directive::Increment {
                name: content.to_string(),
                inc,
                mul,
            }
        }
        'Z' => Directive::StoreSize {
            name: content.to_string(),
            mode: match quantifier {
                Some("1") => SizeMode::StringLength,
                Some("2") => SizeMode::Recursive,
                _ => SizeMode::Default,
            },
        },
        'W' => Directive::StorePath(content.to_string()),
        'f' => Directive::FailSafe,
        other => return Err(WalkError::UnknownSuffix(other, offset)),
    })
}

/// Compile a walk-path string into its sequence of steps.
pub fn compile(path: &str) -> Result<Vec<Step>, WalkError> {
    let mut steps = Vec::new();
    let mut pending_label: Option<(String, usize)> = None;
    let mut tokens = Tokenizer::new(path).peekable();

    while let Some(tok) = tokens.next() {
        let tok = tok?;
        match tok {
            RawToken::Subscript(content) => {
                if let Some((label, offset)) = pending_label.take() {
                    return Err(WalkError::AttachedLabelMisplaced(offset));
                }
                let sub = classify_subscript(&content);
                let text = format!("[{content}]");
                let (offset, init, range_end, range_step) = match &sub {
                    Subscript::Index(_) => {
                        let q = parse_quantifier(Some(&content), 0)?;
                        (q.offset, q.init, q.range_end, q.range_step)
                    }
                    Subscript::Ascend(n) => (*n, -1, None, 1),
                    Subscript::Truncate(n) => (*n, -2, None, 1),
                    Subscript::Label(_) => (0, -1, None, 1),
                };
                steps.push(Step {
                    text,
                    kind: StepKind::Subscript(sub.clone()),
                    content: content.clone(),
                    attached_label: None,
                    regex: None,
                    direction: Direction::Forward,
                    offset,
                    init,
                    range_end,
                    range_step,
                });
                if matches!(sub, Subscript::Label(_)) {
                    if let Some(Ok(RawToken::Colon)) = tokens.peek() {
                        pending_label = Some((content, steps.len() - 1));
                    }
                }
            }
            RawToken::Colon => {
                let Some((label, idx)) = pending_label.take() else {
                    return Err(WalkError::DanglingColon(0));
                };
                match tokens.peek() {
                    Some(Ok(RawToken::Search { .. })) => {
                        // Pop the placeholder subscript step; the label
                        // becomes the attached-label filter on the search
                        // step compiled below.
                        steps.truncate(idx);
                        pending_label = Some((label, idx));
                    }
                    _ => return Err(WalkError::DanglingColon(0)),
                }
            }
            RawToken::Search {
                direction,
                content,
                suffix,
                quantifier,
            } => {
                let attached = pending_label.take().map(|(l, _)| l);
                let suffix = suffix.unwrap_or('w');
                let is_directive = matches!(
                    suffix,
                    'v' | 'k' | 'z' | 'f' | 'F' | 'u' | 'I' | 'Z' | 'W'
                );
                let mut text = match direction {
                    Direction::Forward => format!("<{content}>"),
                    Direction::Backward => format!(">{content}<"),
                };
                text.push(suffix);
                if let Some(q) = &quantifier {
                    text.push_str(q);
                }

                if is_directive {
                    if suffix == 'F' {
                        let jump_kind = match direction {
                            Direction::Forward => JumpKind::NextIteration,
                            Direction::Backward => JumpKind::StopWalking,
                        };
                        let n: i64 = match &quantifier {
                            Some(q) => q.parse().map_err(|_| WalkError::InvalidQuantifier {
                                text: q.clone(),
                                offset: 0,
                            })?,
                            None => 0,
                        };
                        steps.push(Step {
                            text,
                            kind: StepKind::Directive(Directive::Jump(jump_kind, n)),
                            content,
                            attached_label: attached,
                            regex: None,
                            direction,
                            offset: 0,
                            init: -1,
                            range_end: None,
                            range_step: 1,
                        });
                        continue;
                    }
                    if attached.is_some() {
                        return Err(WalkError::AttachedLabelMisplaced(0));
                    }
                    let directive = directive_kind(suffix, &content, quantifier.as_deref(), 0)?;
                    steps.push(Step {
                        text,
                        kind: StepKind::Directive(directive),
                        content,
                        attached_label: None,
                        regex: None,
                        direction,
                        offset: 0,
                        init: -1,
                        range_end: None,
                        range_step: 1,
                    });
                    continue;
                }

                if attached.is_some() && is_label_matching_suffix(suffix) {
                    return Err(WalkError::AttachedLabelWithLabelSuffix(0));
                }
                let (kind, regex) = search_kind(suffix, &content, 0)?;
                let q = parse_quantifier(quantifier.as_deref(), 0)?;
                steps.push(Step {
                    text,
                    kind: StepKind::Search(kind),
                    content,
                    attached_label: attached,
                    regex,
                    direction,
                    offset: q.offset,
                    init: q.init,
                    range_end: q.range_end,
                    range_step: q.range_step,
                });
            }
        }
    }

    if let Some((_, offset)) = pending_label {
        return Err(WalkError::AttachedLabelMisplaced(offset));
    }

    Ok(steps)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compiles_plain_index_subscript() {
        let steps = compile("[0][1]").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].kind, StepKind::Subscript(Subscript::Index(0)));
        assert_eq!(steps[0].init, -1);
    }

    #[test]
    fn compiles_iterable_plus_subscript() {
        let steps = compile("[+0]").unwrap();
        assert_eq!(steps[0].init, 0);
        assert_eq!(steps[0].offset, 0);
    }

    #[test]
    fn compiles_text_label_subscript() {
        let steps = compile("[foo]").unwrap();
        assert_eq!(steps[0].kind, StepKind::Subscript(Subscript::Label("foo".into())));
    }

    #[test]
    fn compiles_truncate_subscript() {
        let steps = compile("[^2]").unwrap();
        assert_eq!(steps[0].kind, StepKind::Subscript(Subscript::Truncate(2)));
        assert_eq!(steps[0].init, -2);
    }

    #[test]
    fn compiles_recursive_search_with_quantifier() {
        let steps = compile("<foo>r+1").unwrap();
        assert_eq!(steps[0].kind, StepKind::Search(SearchKind::Regular("foo".into())));
        assert_eq!(steps[0].offset, 1);
        assert_eq!(steps[0].init, 1);
    }

    #[test]
    fn rejects_empty_content_for_regular_suffix() {
        let err = compile("<>r").unwrap_err();
        assert!(matches!(err, WalkError::EmptyRequiredContent { suffix: 'r', .. }));
    }

    #[test]
    fn attached_label_binds_to_following_search() {
        let steps = compile("[name]:<1>d").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].attached_label.as_deref(), Some("name"));
        assert_eq!(steps[0].kind, StepKind::Search(SearchKind::Digital("1".into())));
    }

    #[test]
    fn attached_label_rejects_label_matching_suffix() {
        let err = compile("[name]:<x>l").unwrap_err();
        assert!(matches!(err, WalkError::AttachedLabelWithLabelSuffix(_)));
    }

    #[test]
    fn compiles_directive_store_value() {
        let steps = compile("<myvar>v").unwrap();
        assert_eq!(
            steps[0].kind,
            StepKind::Directive(Directive::StoreValue("myvar".into()))
        );
    }

    #[test]
    fn compiles_any_suffix_default_when_absent() {
        let steps = compile("<>w").unwrap();
        assert_eq!(steps[0].kind, StepKind::Search(SearchKind::Any));
    }

    #[test]
    fn size_directive_quantifiers_select_distinct_modes() {
        let default = compile("<n>Z").unwrap();
        assert_eq!(
            default[0].kind,
            StepKind::Directive(Directive::StoreSize { name: "n".into(), mode: SizeMode::Default })
        );
        let string_len = compile("<n>Z1").unwrap();
        assert_eq!(
            string_len[0].kind,
            StepKind::Directive(Directive::StoreSize { name: "n".into(), mode: SizeMode::StringLength })
        );
        let recursive = compile("<n>Z2").unwrap();
        assert_eq!(
            recursive[0].kind,
            StepKind::Directive(Directive::StoreSize { name: "n".into(), mode: SizeMode::Recursive })
        );
    }
}
