//! Low-level scanner turning a walk-path string into a flat stream of raw
//! lexeme tokens (spec.md §4.2 "Lexical rules").
//!
//! Mirrors the teacher's `dsl::tokenizer` shape: a `Peekable<Chars>` plus a
//! byte-index tracker, yielding `Result<RawToken, WalkError>`.

use super::compiler::WalkError;
use super::step::Direction;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum RawToken {
    /// `[…]` content (already unescaped).
    Subscript(String),
    /// A literal `:` between a subscript and a following search — the
    /// attached-label marker.
    Colon,
    /// `<…>` or `>…<`, with its optional trailing suffix letter and
    /// quantifier text (still raw, uninterpreted).
    Search {
        direction: Direction,
        content: String,
        suffix: Option<char>,
        quantifier: Option<String>,
    },
}

pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    byte_idx: usize,
}

const SUFFIX_LETTERS: &str = "rRPdDNbnlLaoicewjstqQgGvkzfFuIZW";

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            byte_idx: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.byte_idx += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn scan_bracketed(&mut self, close: char, escapable: char) -> Result<String, WalkError> {
        let mut content = String::new();
        loop {
            match self.advance() {
                None => return Err(WalkError::UnterminatedLexeme(self.byte_idx)),
                Some(c) if c == '\\' => match self.chars.peek() {
                    Some(&n) if n == escapable || n == close => {
                        content.push(n);
                        self.advance();
                    }
                    _ => content.push('\\'),
                },
                Some(c) if c == close => return Ok(content),
                Some(c) => content.push(c),
            }
        }
    }

    fn scan_suffix(&mut self) -> Option<char> {
        match self.chars.peek() {
            Some(&c) if SUFFIX_LETTERS.contains(c) => {
                self.advance();
                Some(c)
            }
            _ => None,
        }
    }

    fn scan_quantifier(&mut self) -> Option<String> {
        let mut text = String::new();
        if matches!(self.chars.peek(), Some('+')) {
            text.push(self.advance().unwrap());
            while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
            return Some(text);
        }
        if matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
            while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
            if matches!(self.chars.peek(), Some(':')) {
                text.push(self.advance().unwrap());
                while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                    text.push(self.advance().unwrap());
                }
                if matches!(self.chars.peek(), Some(':')) {
                    text.push(self.advance().unwrap());
                    while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                        text.push(self.advance().unwrap());
                    }
                }
            }
            return Some(text);
        }
        None
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<RawToken, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_ws();
        match self.chars.peek()? {
            '[' => {
                self.advance();
                match self.scan_bracketed(']', ']') {
                    Ok(content) => Some(Ok(RawToken::Subscript(content))),
                    Err(e) => Some(Err(e)),
                }
            }
            ':' => {
                self.advance();
                Some(Ok(RawToken::Colon))
            }
            '<' => {
                self.advance();
                match self.scan_bracketed('>', '>') {
                    Ok(content) => {
                        let suffix = self.scan_suffix();
                        let quantifier = self.scan_quantifier();
                        Some(Ok(RawToken::Search {
                            direction: Direction::Forward,
                            content,
                            suffix,
                            quantifier,
                        }))
                    }
                    Err(e) => Some(Err(e)),
                }
            }
            '>' => {
                self.advance();
                match self.scan_bracketed('<', '<') {
                    Ok(content) => {
                        let suffix = self.scan_suffix();
                        let quantifier = self.scan_quantifier();
                        Some(Ok(RawToken::Search {
                            direction: Direction::Backward,
                            content,
                            suffix,
                            quantifier,
                        }))
                    }
                    Err(e) => Some(Err(e)),
                }
            }
            _ => Some(Err(WalkError::UnexpectedChar(self.byte_idx))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tokenizes_plain_subscripts() {
        let toks: Vec<_> = Tokenizer::new("[a][b][1]")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            toks,
            vec![
                RawToken::Subscript("a".into()),
                RawToken::Subscript("b".into()),
                RawToken::Subscript("1".into()),
            ]
        );
    }

    #[test]
    fn tokenizes_search_with_suffix_and_quantifier() {
        let toks: Vec<_> = Tokenizer::new("<foo>r+2")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            toks,
            vec![RawToken::Search {
                direction: Direction::Forward,
                content: "foo".into(),
                suffix: Some('r'),
                quantifier: Some("+2".into()),
            }]
        );
    }

    #[test]
    fn tokenizes_attached_label() {
        let toks: Vec<_> = Tokenizer::new("[a]:<1>d")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            toks,
            vec![
                RawToken::Subscript("a".into()),
                RawToken::Colon,
                RawToken::Search {
                    direction: Direction::Forward,
                    content: "1".into(),
                    suffix: Some('d'),
                    quantifier: None,
                },
            ]
        );
    }

    #[test]
    fn handles_escaped_closing_bracket() {
        let toks: Vec<_> = Tokenizer::new(r"[a\]b]").collect::<Result<_, _>>().unwrap();
        assert_eq!(toks, vec![RawToken::Subscript("a]b".into())]);
    }

    #[test]
    fn backward_search_reversed_delimiters() {
        let toks: Vec<_> = Tokenizer::new(">^ba<R").collect::<Result<_, _>>().unwrap();
        assert_eq!(
            toks,
            vec![RawToken::Search {
                direction: Direction::Backward,
                content: "^ba".into(),
                suffix: Some('R'),
                quantifier: None,
            }]
        );
    }
}
