//! Token-to-expression compiler.
//!
//! Each call group reduces to exactly one node. A group holds at most one
//! keyword; the other tokens bind to the keyword's slots by their signed
//! distance from it. Keyword-less groups are tuples when nested and an error
//! at the top level, since a script must reduce to one call.

use std::collections::BTreeMap;

use super::expr::{Binding, Call, Expr, Literal};
use super::keyword::{Keyword, KeywordRegistry, Slot};
use super::tokenizer::{tokenize, Token};
use crate::error::{CompileError, SyntaxErrorKind};

type Compiled = std::result::Result<Expr, SyntaxErrorKind>;

/// Compiles script text against a keyword registry.
#[derive(Clone, Copy, Debug)]
pub struct Compiler<'r> {
    registry: &'r KeywordRegistry,
}

impl<'r> Compiler<'r> {
    #[must_use]
    pub fn new(registry: &'r KeywordRegistry) -> Self {
        Self { registry }
    }

    /// Compile one script.
    pub fn compile(&self, raw: &str) -> Result<Expr, CompileError> {
        tokenize(raw)
            .and_then(|tokens| self.group(&tokens, true))
            .map_err(|kind| CompileError::new(raw, kind))
    }

    fn group(&self, tokens: &[Token], root: bool) -> Compiled {
        // Redundant parentheses are transparent: ((a b)) == (a b) == a b.
        if let [Token::Group { tokens: inner, .. }] = tokens {
            return self.group(inner, root);
        }

        let peeled = self.peel_prefix(tokens)?;
        let tokens = peeled.as_deref().unwrap_or(tokens);

        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| self.keyword_of(token).is_some())
            .map(|(i, _)| i)
            .collect();

        match positions.as_slice() {
            [] if root => Err(SyntaxErrorKind::NoKeyword),
            [] => Ok(Expr::Tuple(
                tokens
                    .iter()
                    .map(|token| self.classify(token))
                    .collect::<Result<_, _>>()?,
            )),
            [position] => self.call(tokens, *position),
            many => Err(SyntaxErrorKind::TooManyKeywords(
                many.iter()
                    .filter_map(|&i| tokens[i].as_word())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    /// Compact operator form: `-x` is `- x` when `-` is a keyword and `-x`
    /// is not.
    fn peel_prefix(&self, tokens: &[Token]) -> Result<Option<Vec<Token>>, SyntaxErrorKind> {
        let [Token::Word(word)] = tokens else {
            return Ok(None);
        };
        if self.registry.is_keyword(word) {
            return Ok(None);
        }
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            return Ok(None);
        };
        let rest = chars.as_str();
        if rest.is_empty() || !self.registry.is_keyword(first.encode_utf8(&mut [0; 4])) {
            return Ok(None);
        }

        let mut split = vec![Token::Word(first.to_string())];
        split.extend(tokenize(rest)?);
        Ok(Some(split))
    }

    fn keyword_of(&self, token: &Token) -> Option<&'r Keyword> {
        token.as_word().and_then(|word| self.registry.keyword(word))
    }

    fn call(&self, tokens: &[Token], position: usize) -> Compiled {
        let keyword = self
            .keyword_of(&tokens[position])
            .ok_or(SyntaxErrorKind::NoKeyword)?;

        let mut bound: BTreeMap<Slot, &Token> = tokens
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(i, token)| (Slot::between(i, position), token))
            .collect();

        let mut args = Vec::with_capacity(keyword.positional.len());
        for &slot in &keyword.positional {
            let arg = self
                .bind(keyword, slot, &mut bound)?
                .ok_or_else(|| SyntaxErrorKind::MissingArgument {
                    keyword: keyword.name.clone(),
                    slot: slot.to_string(),
                })?;
            args.push(arg);
        }

        let mut kwargs = Vec::new();
        for (name, slot) in &keyword.kwargs {
            if let Some(arg) = self.bind(keyword, *slot, &mut bound)? {
                kwargs.push((name.clone(), arg));
            }
        }

        let mut variadic = Vec::new();
        if !bound.is_empty() {
            if !keyword.variadic {
                return Err(SyntaxErrorKind::UnusedArguments {
                    keyword: keyword.name.clone(),
                    slots: bound.keys().map(Slot::to_string).collect(),
                });
            }
            for (slot, token) in bound {
                variadic.push(self.argument(keyword, slot, token)?);
            }
        }

        Ok(Expr::Call(Call {
            target: keyword.target.clone(),
            args,
            variadic,
            kwargs,
        }))
    }

    fn bind(
        &self,
        keyword: &Keyword,
        slot: Slot,
        bound: &mut BTreeMap<Slot, &Token>,
    ) -> Result<Option<Expr>, SyntaxErrorKind> {
        match bound.remove(&slot) {
            Some(token) => self.argument(keyword, slot, token).map(Some),
            None => Ok(keyword
                .default_for(slot)
                .map(|value| Expr::Literal(value.clone()))),
        }
    }

    fn argument(&self, keyword: &Keyword, slot: Slot, token: &Token) -> Compiled {
        if keyword.is_literal(slot) {
            Ok(Expr::Literal(Literal::Str(token.text().to_string())))
        } else {
            self.classify(token)
        }
    }

    /// Classify a bare token into an expression node.
    fn classify(&self, token: &Token) -> Compiled {
        match token {
            Token::Word(word) => Ok(classify_word(word)),
            Token::Quoted(text) | Token::Block(text) => Ok(Expr::Literal(Literal::Str(text.clone()))),
            Token::Group { tokens, .. } => self.group(tokens, false),
            Token::List { tokens, .. } => Ok(Expr::List(
                tokens
                    .iter()
                    .map(|token| self.classify(token))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

fn classify_word(word: &str) -> Expr {
    if let Ok(n) = word.parse::<i64>() {
        return Expr::Literal(Literal::Int(n));
    }
    match word {
        "true" => Expr::Literal(Literal::Bool(true)),
        "false" => Expr::Literal(Literal::Bool(false)),
        "none" => Expr::Literal(Literal::None),
        _ => match Binding::from_word(word) {
            Some(binding) => Expr::Var(binding),
            None => Expr::Ref(word.to_string()),
        },
    }
}
