//! Lexical analysis: one input line into a sequence of word tokens.
//!
//! Quoting rules:
//! - runs of unquoted blanks separate tokens and collapse;
//! - `'...'` is copied verbatim, no escapes;
//! - `"..."` recognizes exactly `\"` and `\\`, everything else is literal;
//! - an unquoted backslash escapes the next character, including a blank;
//! - adjacent quoted/unquoted segments concatenate into one token.
//!
//! A missing closing quote or an over-long token is a [`LexError`]; the
//! tokenizer yields the error once and then fuses.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;
use tracing::debug;

/// Longest token text accepted, in bytes.
pub const MAX_TOKEN_LEN: usize = 1024;

/// A word extracted from the input line. Pure text; it lives only for the
/// current command cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A closing `'` or `"` was not found before end of input.
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// Token text exceeded [`MAX_TOKEN_LEN`].
    #[error("token exceeds {MAX_TOKEN_LEN} bytes")]
    TokenTooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Unquoted,
    SingleQuote,
    DoubleQuote,
}

/// Lazy tokenizer over one input line.
///
/// Yields `Result<Token, LexError>` and fuses after the first error: the
/// rest of the line is abandoned, matching the one-cycle-per-line contract.
pub struct Tokenizer<'a> {
    input: Peekable<Chars<'a>>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            input: line.chars().peekable(),
            done: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.input.next()
    }

    fn push(buf: &mut String, ch: char) -> Result<(), LexError> {
        if buf.len() + ch.len_utf8() > MAX_TOKEN_LEN {
            return Err(LexError::TokenTooLong);
        }
        buf.push(ch);
        Ok(())
    }

    /// Scan one token starting at an unquoted non-blank position.
    fn scan_token(&mut self) -> Result<Token, LexError> {
        let mut buf = String::new();
        let mut state = LexState::Unquoted;

        loop {
            let ch = match self.bump() {
                Some(ch) => ch,
                None => match state {
                    LexState::Unquoted => break,
                    _ => return Err(LexError::UnterminatedQuote),
                },
            };

            match state {
                LexState::Unquoted => match ch {
                    ' ' | '\t' => break,
                    '\'' => state = LexState::SingleQuote,
                    '"' => state = LexState::DoubleQuote,
                    '\\' => {
                        // Escape the next raw character; a trailing lone
                        // backslash stays literal.
                        match self.bump() {
                            Some(next) => Self::push(&mut buf, next)?,
                            None => Self::push(&mut buf, '\\')?,
                        }
                    }
                    other => Self::push(&mut buf, other)?,
                },
                LexState::SingleQuote => match ch {
                    '\'' => state = LexState::Unquoted,
                    other => Self::push(&mut buf, other)?,
                },
                LexState::DoubleQuote => match ch {
                    '"' => state = LexState::Unquoted,
                    '\\' if matches!(self.peek(), Some('"') | Some('\\')) => {
                        // Exactly two escapes are recognized here. The
                        // peeked char is consumed and stored unescaped.
                        let next = self.bump().ok_or(LexError::UnterminatedQuote)?;
                        Self::push(&mut buf, next)?;
                    }
                    other => Self::push(&mut buf, other)?,
                },
            }
        }

        Ok(Token { text: buf })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
        if self.peek().is_none() {
            self.done = true;
            return None;
        }
        match self.scan_token() {
            Ok(tok) => {
                debug!(text = %tok.text, "token");
                Some(Ok(tok))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Tokenize a whole line eagerly. Convenience for tests and callers that do
/// not stream.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        split_into_tokens(line)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn splits_on_blank_runs() {
        assert_eq!(texts("echo a b  c"), ["echo", "a", "b", "c"]);
        assert_eq!(texts("  ls   -l  "), ["ls", "-l"]);
        assert_eq!(texts("a\tb"), ["a", "b"]);
    }

    #[test]
    fn empty_and_blank_lines_yield_no_tokens() {
        assert!(texts("").is_empty());
        assert!(texts("     ").is_empty());
    }

    #[test]
    fn token_count_matches_word_runs() {
        for (line, n) in [("one", 1), ("a b c d", 4), ("  x  y ", 2), ("", 0)] {
            assert_eq!(split_into_tokens(line).unwrap().len(), n, "{:?}", line);
        }
    }

    #[test]
    fn single_quotes_are_verbatim() {
        assert_eq!(texts("echo 'a b'"), ["echo", "a b"]);
        // No escapes inside single quotes: backslash is just a character.
        assert_eq!(texts(r"'a\nb'"), [r"a\nb"]);
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(texts(r#"echo "a\"b""#), ["echo", r#"a"b"#]);
        assert_eq!(texts(r#""a\\b""#), [r"a\b"]);
        // Any other backslash sequence stays literal, backslash included.
        assert_eq!(texts(r#""a\nb""#), [r"a\nb"]);
        assert_eq!(texts(r#""a b  c""#), ["a b  c"]);
    }

    #[test]
    fn adjacent_segments_concatenate() {
        assert_eq!(texts(r#"a'b'"c"d"#), ["abcd"]);
        assert_eq!(texts("'a''b'"), ["ab"]);
        assert_eq!(texts(r#""x"'y'"#), ["xy"]);
    }

    #[test]
    fn unquoted_backslash_escapes_next_char() {
        assert_eq!(texts(r"a\ b"), ["a b"]);
        assert_eq!(texts(r"\'"), ["'"]);
        // Trailing backslash is literal.
        assert_eq!(texts(r"a\"), [r"a\"]);
    }

    #[test]
    fn unmatched_quotes_error_without_partial_tokens() {
        assert_eq!(split_into_tokens("echo 'abc"), Err(LexError::UnterminatedQuote));
        assert_eq!(split_into_tokens("echo \"abc"), Err(LexError::UnterminatedQuote));
        assert_eq!(split_into_tokens("'"), Err(LexError::UnterminatedQuote));
    }

    #[test]
    fn over_long_token_errors() {
        let long = "x".repeat(MAX_TOKEN_LEN + 1);
        assert_eq!(split_into_tokens(&long), Err(LexError::TokenTooLong));
        // At the limit it still passes.
        let fits = "x".repeat(MAX_TOKEN_LEN);
        assert_eq!(split_into_tokens(&fits).unwrap().len(), 1);
    }

    #[test]
    fn fuses_after_error() {
        let mut tok = Tokenizer::new("ok 'broken");
        assert_eq!(tok.next().unwrap().unwrap().text, "ok");
        assert!(matches!(tok.next(), Some(Err(LexError::UnterminatedQuote))));
        assert!(tok.next().is_none());
        assert!(tok.next().is_none());
    }

    #[test]
    fn quoted_empty_segment_still_emits_a_token() {
        assert_eq!(texts("''"), [""]);
        assert_eq!(texts("a '' b"), ["a", "", "b"]);
    }
}
