//! Script splitter.
//!
//! Turns one script string into a flat sequence of tokens. Splitting happens
//! on whitespace outside quotes and outside balanced brackets:
//!
//! - `( ... )` nests a call group (tokenized recursively)
//! - `[ ... ]` is a list literal (tokenized recursively)
//! - `{ ... }` is a block: raw script text kept verbatim for later compiling
//! - `"..."` / `'...'` are string literals with backslash escapes
//!
//! A bare word with dots is chain sugar: `a.b.c` is the group `(a b c)`.

use crate::error::SyntaxErrorKind;

/// One token of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Quoted(String),
    Group { tokens: Vec<Token>, raw: String },
    List { tokens: Vec<Token>, raw: String },
    Block(String),
}

impl Token {
    /// Source text for literal-string slots.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Token::Word(s) | Token::Quoted(s) | Token::Block(s) => s,
            Token::Group { raw, .. } | Token::List { raw, .. } => raw,
        }
    }

    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            _ => None,
        }
    }
}

/// Split a script into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxErrorKind> {
    let mut splitter = Splitter { source, pos: 0 };
    let tokens = splitter.sequence(None)?;
    if tokens.is_empty() {
        return Err(SyntaxErrorKind::Empty);
    }
    Ok(tokens)
}

const DELIMITERS: &[char] = &['(', ')', '[', ']', '{', '}', '"', '\''];

struct Splitter<'a> {
    source: &'a str,
    /// Byte offset into `source`.
    pos: usize,
}

impl<'a> Splitter<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Read tokens until `close` (or end of input at the top level).
    fn sequence(&mut self, close: Option<(char, char)>) -> Result<Vec<Token>, SyntaxErrorKind> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return match close {
                    Some((open, _)) => Err(SyntaxErrorKind::UnbalancedBracket(open)),
                    None => Ok(tokens),
                };
            };

            match c {
                ')' | ']' | '}' => {
                    self.bump();
                    return match close {
                        Some((_, expected)) if expected == c => Ok(tokens),
                        Some((_, expected)) => Err(SyntaxErrorKind::MismatchedBracket {
                            expected,
                            found: c,
                        }),
                        None => Err(SyntaxErrorKind::UnbalancedBracket(c)),
                    };
                }
                '(' | '[' => {
                    let start = self.pos;
                    self.bump();
                    let inner_start = self.pos;
                    let closing = if c == '(' { ')' } else { ']' };
                    let inner = self.sequence(Some((c, closing)))?;
                    let raw = self.source[inner_start..self.pos - 1].trim().to_string();
                    if c == '(' {
                        if inner.is_empty() {
                            return Err(SyntaxErrorKind::EmptyToken(start));
                        }
                        tokens.push(Token::Group { tokens: inner, raw });
                    } else {
                        tokens.push(Token::List { tokens: inner, raw });
                    }
                }
                '{' => tokens.push(self.block()?),
                '"' | '\'' => tokens.push(Token::Quoted(self.quoted()?)),
                _ => tokens.push(self.word()?),
            }
        }
    }

    fn block(&mut self) -> Result<Token, SyntaxErrorKind> {
        let start = self.pos;
        self.bump();
        let inner_start = self.pos;
        let mut depth = 1usize;

        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.quoted()?;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let raw = self.source[inner_start..self.pos].trim().to_string();
                        self.bump();
                        if raw.is_empty() {
                            return Err(SyntaxErrorKind::EmptyToken(start));
                        }
                        return Ok(Token::Block(raw));
                    }
                }
                _ => {}
            }
            self.bump();
        }

        Err(SyntaxErrorKind::UnbalancedBracket('{'))
    }

    fn quoted(&mut self) -> Result<String, SyntaxErrorKind> {
        let Some(quote) = self.bump() else {
            return Err(SyntaxErrorKind::UnterminatedString);
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxErrorKind::UnterminatedString),
                Some('\\') => match self.bump() {
                    None => return Err(SyntaxErrorKind::UnterminatedString),
                    Some('n') => out.push('\n'),
                    Some(escaped) => out.push(escaped),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn word(&mut self) -> Result<Token, SyntaxErrorKind> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !DELIMITERS.contains(&c))
        {
            self.bump();
        }
        let word = &self.source[start..self.pos];

        if !is_chain(word) {
            return Ok(Token::Word(word.to_string()));
        }

        let mut parts = Vec::new();
        let mut offset = start;
        for part in word.split('.') {
            if part.is_empty() {
                return Err(SyntaxErrorKind::EmptyToken(offset));
            }
            parts.push(Token::Word(part.to_string()));
            offset += part.len() + 1;
        }
        Ok(Token::Group {
            tokens: parts,
            raw: word.to_string(),
        })
    }
}

/// Dotted words are chains unless they look numeric.
fn is_chain(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    word.contains('.') && !digits.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<Token> {
        list.iter().map(|w| Token::Word((*w).to_string())).collect()
    }

    #[test]
    fn test_split_whitespace() {
        let tokens = tokenize("  target HP   -= 1 ").unwrap();
        assert_eq!(tokens, words(&["target", "HP", "-=", "1"]));
    }

    #[test]
    fn test_nested_groups() {
        let tokens = tokenize("a (b (c d)) e").unwrap();
        assert_eq!(tokens.len(), 3);
        match &tokens[1] {
            Token::Group { tokens: inner, raw } => {
                assert_eq!(raw, "b (c d)");
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[1], Token::Group { .. }));
            }
            other => panic!("Expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_dot_chain() {
        let tokens = tokenize("a.b c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Group {
                    tokens: words(&["a", "b"]),
                    raw: "a.b".into()
                },
                Token::Word("c".into()),
            ]
        );

        let tokens = tokenize("a b.c").unwrap();
        assert_eq!(tokens[0], Token::Word("a".into()));
        assert!(matches!(&tokens[1], Token::Group { tokens, .. } if tokens.len() == 2));
    }

    #[test]
    fn test_numbers_are_not_chains() {
        assert_eq!(tokenize("-1.5").unwrap(), words(&["-1.5"]));
    }

    #[test]
    fn test_quotes_keep_whitespace() {
        let tokens = tokenize(r#"x := "two words" 'it\'s'"#).unwrap();
        assert_eq!(tokens[2], Token::Quoted("two words".into()));
        assert_eq!(tokens[3], Token::Quoted("it's".into()));
    }

    #[test]
    fn test_block_is_raw() {
        let tokens = tokenize("delay 2 { target HP += (1 + 1) }").unwrap();
        assert_eq!(tokens[2], Token::Block("target HP += (1 + 1)".into()));
    }

    #[test]
    fn test_list_literal() {
        let tokens = tokenize("[a b] in x").unwrap();
        assert!(matches!(&tokens[0], Token::List { tokens, .. } if tokens.len() == 2));
        assert!(matches!(tokenize("[]").unwrap()[0], Token::List { .. }));
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(tokenize("a (b"), Err(SyntaxErrorKind::UnbalancedBracket('(')));
        assert_eq!(tokenize("a b)"), Err(SyntaxErrorKind::UnbalancedBracket(')')));
        assert_eq!(tokenize("{a"), Err(SyntaxErrorKind::UnbalancedBracket('{')));
        assert_eq!(
            tokenize("(a]"),
            Err(SyntaxErrorKind::MismatchedBracket {
                expected: ')',
                found: ']'
            })
        );
    }

    #[test]
    fn test_empty_tokens() {
        assert_eq!(tokenize(""), Err(SyntaxErrorKind::Empty));
        assert_eq!(tokenize("a ()"), Err(SyntaxErrorKind::EmptyToken(2)));
        assert!(matches!(tokenize("a..b"), Err(SyntaxErrorKind::EmptyToken(_))));
        assert_eq!(tokenize("\"abc"), Err(SyntaxErrorKind::UnterminatedString));
    }
}
