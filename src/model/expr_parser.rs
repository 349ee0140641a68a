//! Micro-parsers for measure and metric expressions.
//!
//! Measure expressions reference columns as `{[Object].[Column]}`; metric
//! expressions reference measures as `{[Measure Name]}`. Around the
//! placeholders both grammars share arithmetic (`+ - * /`), comparisons,
//! AND/OR/NOT, parentheses, numeric and single-quoted string literals,
//! and `name(...)` function calls.
//!
//! Placeholders are expanded at model-load time; the planner never sees
//! the raw strings.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// `{[Object].[Column]}`
static COLUMN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\[([^\]]+)\]\.\[([^\]]+)\]\}").unwrap());

/// `{[Measure Name]}`
static MEASURE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\[([^\]]+)\]\}").unwrap());

/// Errors raised while parsing a model expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unmatched placeholder brackets at '{fragment}'")]
    UnmatchedBrackets { fragment: String },

    #[error("unknown token at '{fragment}'")]
    UnknownToken { fragment: String },

    #[error("unexpected token '{found}'")]
    UnexpectedToken { found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("column reference {{[{object}].[{column}]}} is not allowed here")]
    ColumnRefNotAllowed { object: String, column: String },

    #[error("measure reference {{[{name}]}} is not allowed here")]
    MeasureRefNotAllowed { name: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parsed model-level expression tree.
///
/// Leaves stay symbolic (column / measure references by display name);
/// the resolver lowers them to physical SQL AST nodes once the target
/// plan shape is known.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelExpr {
    ColumnRef { object: String, column: String },
    MeasureRef(String),
    Int(i64),
    Float(f64),
    Str(String),
    Binary {
        left: Box<ModelExpr>,
        op: BinOp,
        right: Box<ModelExpr>,
    },
    Neg(Box<ModelExpr>),
    Not(Box<ModelExpr>),
    Func { name: String, args: Vec<ModelExpr> },
    Paren(Box<ModelExpr>),
}

/// Binary operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
}

impl ModelExpr {
    /// All `{[Object].[Column]}` references in this tree, in order.
    pub fn column_refs(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let ModelExpr::ColumnRef { object, column } = e {
                out.push((object.as_str(), column.as_str()));
            }
        });
        out
    }

    /// All `{[Measure]}` references in this tree, in order.
    pub fn measure_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let ModelExpr::MeasureRef(name) = e {
                out.push(name.as_str());
            }
        });
        out
    }

    fn walk<'a>(&'a self, f: &mut impl FnMut(&'a ModelExpr)) {
        f(self);
        match self {
            ModelExpr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            ModelExpr::Neg(inner) | ModelExpr::Not(inner) | ModelExpr::Paren(inner) => {
                inner.walk(f)
            }
            ModelExpr::Func { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            _ => {}
        }
    }
}

/// Which placeholder form the expression may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Column,
    Measure,
}

/// Parse a measure expression (or measure filter predicate):
/// `{[Object].[Column]}` placeholders only.
pub fn parse_measure_expr(input: &str) -> ParseResult<ModelExpr> {
    parse(input, RefKind::Column)
}

/// Parse a metric expression: `{[Measure]}` placeholders only.
pub fn parse_metric_expr(input: &str) -> ParseResult<ModelExpr> {
    parse(input, RefKind::Measure)
}

fn parse(input: &str, kind: RefKind) -> ParseResult<ModelExpr> {
    let tokens = tokenize(input, kind)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(ParseError::UnexpectedToken {
            found: format!("{:?}", tok),
        }),
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Column(String, String),
    Measure(String),
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

fn tokenize(input: &str, kind: RefKind) -> ParseResult<Vec<Tok>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let c = bytes[pos] as char;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '{' {
            if let Some(caps) = COLUMN_REF.captures(rest) {
                let object = caps[1].to_string();
                let column = caps[2].to_string();
                if kind != RefKind::Column {
                    return Err(ParseError::ColumnRefNotAllowed { object, column });
                }
                pos += caps[0].len();
                tokens.push(Tok::Column(object, column));
                continue;
            }
            if let Some(caps) = MEASURE_REF.captures(rest) {
                let name = caps[1].to_string();
                if kind != RefKind::Measure {
                    return Err(ParseError::MeasureRefNotAllowed { name });
                }
                pos += caps[0].len();
                tokens.push(Tok::Measure(name));
                continue;
            }
            return Err(ParseError::UnmatchedBrackets {
                fragment: clip(rest),
            });
        }

        if c == '\'' {
            // Single-quoted string; '' escapes an embedded quote.
            let mut value = String::new();
            let mut chars = rest.char_indices().skip(1).peekable();
            let mut closed = None;
            while let Some((i, ch)) = chars.next() {
                if ch == '\'' {
                    if let Some(&(_, '\'')) = chars.peek() {
                        value.push('\'');
                        chars.next();
                        continue;
                    }
                    closed = Some(i);
                    break;
                }
                value.push(ch);
            }
            match closed {
                Some(end) => {
                    pos += end + 1;
                    tokens.push(Tok::Str(value));
                    continue;
                }
                None => {
                    return Err(ParseError::UnknownToken {
                        fragment: clip(rest),
                    })
                }
            }
        }

        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit() && ch != '.')
                .unwrap_or(rest.len());
            let text = &rest[..end];
            pos += end;
            if text.contains('.') {
                let value = text.parse::<f64>().map_err(|_| ParseError::UnknownToken {
                    fragment: text.to_string(),
                })?;
                tokens.push(Tok::Float(value));
            } else {
                let value = text.parse::<i64>().map_err(|_| ParseError::UnknownToken {
                    fragment: text.to_string(),
                })?;
                tokens.push(Tok::Int(value));
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let end = rest
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                .unwrap_or(rest.len());
            tokens.push(Tok::Ident(rest[..end].to_string()));
            pos += end;
            continue;
        }

        // Two-character operators first
        if rest.starts_with("!=") || rest.starts_with("<>") {
            tokens.push(Tok::Ne);
            pos += 2;
            continue;
        }
        if rest.starts_with("<=") {
            tokens.push(Tok::Lte);
            pos += 2;
            continue;
        }
        if rest.starts_with(">=") {
            tokens.push(Tok::Gte);
            pos += 2;
            continue;
        }

        let tok = match c {
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ',' => Tok::Comma,
            '=' => Tok::Eq,
            '<' => Tok::Lt,
            '>' => Tok::Gt,
            _ => {
                return Err(ParseError::UnknownToken {
                    fragment: clip(rest),
                })
            }
        };
        tokens.push(tok);
        pos += 1;
    }

    Ok(tokens)
}

fn clip(s: &str) -> String {
    s.chars().take(16).collect()
}

// =============================================================================
// Recursive-descent parser
// =============================================================================

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(s)) if s.eq_ignore_ascii_case(word))
    }

    fn parse_or(&mut self) -> ParseResult<ModelExpr> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.next();
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<ModelExpr> {
        let mut left = self.parse_not()?;
        while self.peek_keyword("and") {
            self.next();
            let right = self.parse_not()?;
            left = binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<ModelExpr> {
        if self.peek_keyword("not") {
            self.next();
            let inner = self.parse_not()?;
            return Ok(ModelExpr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<ModelExpr> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Tok::Eq) => Some(BinOp::Eq),
            Some(Tok::Ne) => Some(BinOp::Ne),
            Some(Tok::Lt) => Some(BinOp::Lt),
            Some(Tok::Lte) => Some(BinOp::Lte),
            Some(Tok::Gt) => Some(BinOp::Gt),
            Some(Tok::Gte) => Some(BinOp::Gte),
            _ => None,
        };
        match op {
            Some(op) => {
                self.next();
                let right = self.parse_additive()?;
                Ok(binary(left, op, right))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> ParseResult<ModelExpr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<ModelExpr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                _ => break,
            };
            self.next();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<ModelExpr> {
        if matches!(self.peek(), Some(Tok::Minus)) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(ModelExpr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<ModelExpr> {
        match self.next() {
            Some(Tok::Column(object, column)) => Ok(ModelExpr::ColumnRef { object, column }),
            Some(Tok::Measure(name)) => Ok(ModelExpr::MeasureRef(name)),
            Some(Tok::Int(n)) => Ok(ModelExpr::Int(n)),
            Some(Tok::Float(f)) => Ok(ModelExpr::Float(f)),
            Some(Tok::Str(s)) => Ok(ModelExpr::Str(s)),
            Some(Tok::Ident(name)) => {
                // Identifiers are only meaningful as function calls.
                if matches!(self.peek(), Some(Tok::LParen)) {
                    self.next();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Tok::RParen)) {
                        loop {
                            args.push(self.parse_or()?);
                            match self.next() {
                                Some(Tok::Comma) => continue,
                                Some(Tok::RParen) => break,
                                Some(tok) => {
                                    return Err(ParseError::UnexpectedToken {
                                        found: format!("{:?}", tok),
                                    })
                                }
                                None => return Err(ParseError::UnexpectedEnd),
                            }
                        }
                    } else {
                        self.next();
                    }
                    Ok(ModelExpr::Func { name, args })
                } else {
                    Err(ParseError::UnexpectedToken { found: name })
                }
            }
            Some(Tok::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Tok::RParen) => Ok(ModelExpr::Paren(Box::new(inner))),
                    Some(tok) => Err(ParseError::UnexpectedToken {
                        found: format!("{:?}", tok),
                    }),
                    None => Err(ParseError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: format!("{:?}", tok),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

fn binary(left: ModelExpr, op: BinOp, right: ModelExpr) -> ModelExpr {
    ModelExpr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
