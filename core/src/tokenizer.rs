//! Tokenizer for raw command-line input.
//!
//! Input arrives either as a single command-line string or as an already
//! split token list. Both forms are reduced to the same [`Tokens`] output:
//! ordered `(flag, value)` pairs and ordered bare arguments.
//!
//! # Examples
//!
//! ```
//! use argflags_core::{Input, Tokenizer, Value};
//!
//! let tokenizer = Tokenizer::new(|name: &str| name == "verbose");
//! let tokens = tokenizer.tokenize(&Input::from("--verbose build.js -o 'out dir'"));
//!
//! assert_eq!(tokens.pairs[0].flag, "verbose");
//! assert_eq!(tokens.pairs[0].value, Value::Bool(true));
//! assert_eq!(tokens.pairs[1].value, Value::from("out dir"));
//! assert_eq!(tokens.args, vec!["build.js".to_string()]);
//! assert_eq!(tokens.consumed(), 3);
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::Value;
use crate::types::parse_bool;

/// Raw input handed to the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A free-form command-line string; quotes are honored and stripped.
    Line(String),
    /// Pre-split tokens; no quote processing is performed.
    Args(Vec<String>),
}

impl Input {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Line(line) => line.trim().is_empty(),
            Self::Args(args) => args.is_empty(),
        }
    }
}

impl From<&str> for Input {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

impl From<String> for Input {
    fn from(line: String) -> Self {
        Self::Line(line)
    }
}

impl From<Vec<String>> for Input {
    fn from(args: Vec<String>) -> Self {
        Self::Args(args)
    }
}

impl From<&[String]> for Input {
    fn from(args: &[String]) -> Self {
        Self::Args(args.to_vec())
    }
}

impl From<Vec<&str>> for Input {
    fn from(args: Vec<&str>) -> Self {
        Self::Args(args.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Input {
    fn from(args: &[&str]) -> Self {
        Self::Args(args.iter().map(|arg| arg.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Input {
    fn from(args: [&str; N]) -> Self {
        Self::Args(args.iter().map(|arg| arg.to_string()).collect())
    }
}

/// A flag occurrence and the value bound to it.
///
/// `flag` is the name as typed, minus its leading dashes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub flag: String,
    pub value: Value,
    /// The value exactly as typed; `None` when the value is implied.
    pub text: Option<String>,
}

/// Tokenizer output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tokens {
    pub pairs: Vec<Pair>,
    pub args: Vec<String>,
    /// Source text of every matched token, in input order.
    pub raw: Vec<String>,
}

impl Tokens {
    /// Number of logical tokens produced (pairs plus bare arguments).
    pub fn consumed(&self) -> usize {
        self.pairs.len() + self.args.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Flag { name: String, value: Option<String> },
    Arg(String),
}

// A dash-prefixed flag with an optional quoted or unquoted value, then
// standalone quoted arguments, then any other run of non-space characters.
// Dashes alone (`-`, `--`) are arguments.
static PARSER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        -+(?P<flag>[^\s"'-][^\s"']*)
        (?:\s+(?:
            "(?P<dq>(?:\\.|[^"\\])*)"
          | '(?P<sq>(?:\\.|[^'\\])*)'
          | (?P<bare>[^-\s"'][^\s]*)
        ))?
      | "(?P<dqarg>(?:\\.|[^"\\])*)"
      | '(?P<sqarg>(?:\\.|[^'\\])*)'
      | (?P<arg>\S+)
    "#,
    )
    .expect("static regex must compile")
});

/// Splits input into flag/value pairs and bare arguments.
///
/// The `is_boolean` lookup receives a flag name (without dashes) and reports
/// whether it is declared boolean. A boolean flag only takes the following
/// token as its value when that token is `true` or `false`; any other token
/// is left alone and becomes a bare argument.
pub struct Tokenizer<F> {
    is_boolean: F,
}

impl<F: Fn(&str) -> bool> Tokenizer<F> {
    pub fn new(is_boolean: F) -> Self {
        Self { is_boolean }
    }

    pub fn tokenize(&self, input: &Input) -> Tokens {
        let (lexemes, raw) = match input {
            Input::Line(line) => lex_line(line),
            Input::Args(args) => (lex_args(args), args.clone()),
        };

        let mut tokens = Tokens {
            raw,
            ..Tokens::default()
        };
        for lexeme in lexemes {
            trace!(lexeme = ?lexeme, "Tokenized");
            self.bind(lexeme, &mut tokens);
        }
        tokens
    }

    fn bind(&self, lexeme: Lexeme, tokens: &mut Tokens) {
        match lexeme {
            Lexeme::Flag { name, value: None } => tokens.pairs.push(Pair {
                flag: name,
                value: Value::Bool(true),
                text: None,
            }),
            Lexeme::Flag {
                name,
                value: Some(text),
            } => {
                if (self.is_boolean)(&name) {
                    match parse_bool(&text) {
                        Some(b) => tokens.pairs.push(Pair {
                            flag: name,
                            value: Value::Bool(b),
                            text: Some(text),
                        }),
                        None => {
                            tokens.pairs.push(Pair {
                                flag: name,
                                value: Value::Bool(true),
                                text: None,
                            });
                            push_arg(tokens, text);
                        }
                    }
                } else {
                    tokens.pairs.push(Pair {
                        value: Value::from_literal(&text),
                        flag: name,
                        text: Some(text),
                    });
                }
            }
            Lexeme::Arg(text) => push_arg(tokens, text),
        }
    }
}

/// Tokenizes input without any boolean declarations.
pub fn tokenize(input: &Input) -> Tokens {
    Tokenizer::new(|_: &str| false).tokenize(input)
}

fn push_arg(tokens: &mut Tokens, text: String) {
    if !text.is_empty() {
        tokens.args.push(text);
    }
}

fn lex_line(line: &str) -> (Vec<Lexeme>, Vec<String>) {
    let mut lexemes = Vec::new();
    let mut raw = Vec::new();

    for caps in PARSER.captures_iter(line) {
        if let Some(whole) = caps.get(0) {
            raw.push(whole.as_str().to_string());
        }
        lexemes.push(lexeme_from(&caps));
    }

    (lexemes, raw)
}

fn lexeme_from(caps: &Captures<'_>) -> Lexeme {
    if let Some(flag) = caps.name("flag") {
        let value = if let Some(quoted) = caps.name("dq").or_else(|| caps.name("sq")) {
            Some(unescape(quoted.as_str()))
        } else {
            caps.name("bare").map(|bare| bare.as_str().to_string())
        };
        return Lexeme::Flag {
            name: flag.as_str().to_string(),
            value,
        };
    }

    if let Some(quoted) = caps.name("dqarg").or_else(|| caps.name("sqarg")) {
        return Lexeme::Arg(unescape(quoted.as_str()));
    }

    Lexeme::Arg(
        caps.name("arg")
            .map(|arg| arg.as_str().to_string())
            .unwrap_or_default(),
    )
}

fn lex_args(args: &[String]) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut iter = args.iter().peekable();

    while let Some(token) = iter.next() {
        if !is_flag_token(token) {
            lexemes.push(Lexeme::Arg(token.clone()));
            continue;
        }

        let value = iter.next_if(|next| !next.starts_with('-')).cloned();
        lexemes.push(Lexeme::Flag {
            name: token.trim_start_matches('-').to_string(),
            value,
        });
    }

    lexemes
}

/// A dash-prefixed token that has something after the dashes.
fn is_flag_token(token: &str) -> bool {
    token.starts_with('-') && !token.trim_start_matches('-').is_empty()
}

/// Resolves `\"`, `\'` and `\\` inside a quoted value; other escapes are kept.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\'' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }

    out
}
