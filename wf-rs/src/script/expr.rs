//! Condition lexer, AST, parser, and evaluator.
//!
//! Conditions gate commands in a workflow script.  The language is small and
//! side-effect free: literals, variable paths, arithmetic, comparison, glob
//! (`=~`) and regex (`=/`) matching, and short-circuit logic.
//!
//! Operator precedence (lowest → highest):
//!   or  →  and  →  not  →  relational  →  additive  →  multiplicative  →
//!   unary  →  primary
//!
//! `=` is equality, not assignment; `and`, `or`, `not`, `true` and `false`
//! are reserved words.

use regex::Regex;
use thiserror::Error;

use super::value::Value;
use crate::var::Scope;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a condition could not be evaluated.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("empty condition")]
    Empty,
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unbound variable '{0}'")]
    Unbound(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ── Bindings ──────────────────────────────────────────────────────────────────

/// Variable lookup used by the evaluator.
///
/// [`Scope`] implements this; tests may plug in anything else.
pub trait Bindings {
    /// Resolve a (possibly dotted) variable path.
    fn lookup(&self, path: &str) -> Option<&Value>;
}

impl Bindings for Scope {
    fn lookup(&self, path: &str) -> Option<&Value> {
        self.resolve(path)
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    // Comparison
    Eq, // = or ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,
    GlobMatch,     // =~
    RegexMatch,    // =/
    NotGlobMatch,  // !~
    NotRegexMatch, // !/

    // Logical
    And, // && or `and`
    Or,  // || or `or`
    Not, // `not`, looser than comparison

    LParen,
    RParen,
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> Result<Token, EvaluationError> {
        let mut s = String::from(first);
        let mut is_float = false;

        while let Some(c @ '0'..='9') = self.peek() {
            s.push(c);
            self.pos += 1;
        }
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            s.push('.');
            self.pos += 1;
            while let Some(c @ '0'..='9') = self.peek() {
                s.push(c);
                self.pos += 1;
            }
        }

        let bad = || EvaluationError::Syntax(format!("invalid number '{s}'"));
        if is_float {
            s.parse().map(Token::Float).map_err(|_| bad())
        } else {
            s.parse().map(Token::Int).map_err(|_| bad())
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvaluationError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(EvaluationError::Syntax("unterminated string".into())),
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(EvaluationError::Syntax("unterminated string".into())),
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                s.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        match s.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Ident(s),
        }
    }

    fn next_token(&mut self) -> Result<Token, EvaluationError> {
        self.skip_ws();
        let ch = match self.advance() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        let tok = match ch {
            '0'..='9' => return self.read_number(ch),
            '"' | '\'' => return self.read_string(ch),
            c if c.is_ascii_alphabetic() || c == '_' => self.read_ident(c),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else if self.eat('~') {
                    Token::NotGlobMatch
                } else if self.eat('/') {
                    Token::NotRegexMatch
                } else {
                    Token::Bang
                }
            }
            '&' if self.eat('&') => Token::And,
            '|' if self.eat('|') => Token::Or,
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else if self.eat('>') {
                    Token::Ne
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '=' => {
                if self.eat('~') {
                    Token::GlobMatch
                } else if self.eat('/') {
                    Token::RegexMatch
                } else {
                    self.eat('=');
                    Token::Eq
                }
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            c => {
                return Err(EvaluationError::Syntax(format!(
                    "unexpected character '{c}'"
                )))
            }
        };
        Ok(tok)
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvaluationError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    GlobMatch,
    RegexMatch,
    NotGlobMatch,
    NotRegexMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest allowed nesting of parentheses and prefix operators.
const MAX_DEPTH: usize = 256;
/// Most operator nodes one condition may contain.  Bounds the depth of the
/// tree that `eval_expr` walks.
const MAX_NODES: usize = 1024;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn descend(&mut self) -> Result<(), EvaluationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvaluationError::Syntax(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Result<Expr, EvaluationError> {
        self.count_node()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    /// Parse the operand of a prefix operator one level down.
    fn prefixed(
        &mut self,
        op: UnaryOp,
        operand: fn(&mut Self) -> Result<Expr, EvaluationError>,
    ) -> Result<Expr, EvaluationError> {
        self.count_node()?;
        self.descend()?;
        let inner = operand(self)?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(inner)))
    }

    fn count_node(&mut self) -> Result<(), EvaluationError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(EvaluationError::Syntax(format!(
                "expression has more than {MAX_NODES} operators"
            )));
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_or(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = self.binary(BinOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            lhs = self.binary(BinOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, EvaluationError> {
        if self.eat(&Token::Not) {
            return self.prefixed(UnaryOp::Not, Self::parse_not);
        }
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                Token::GlobMatch => BinOp::GlobMatch,
                Token::RegexMatch => BinOp::RegexMatch,
                Token::NotGlobMatch => BinOp::NotGlobMatch,
                Token::NotRegexMatch => BinOp::NotRegexMatch,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvaluationError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvaluationError> {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                self.prefixed(UnaryOp::Neg, Self::parse_unary)
            }
            Token::Bang => {
                self.pos += 1;
                self.prefixed(UnaryOp::Not, Self::parse_unary)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvaluationError> {
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                _ => Expr::Var(name),
            }),
            Token::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                if !self.eat(&Token::RParen) {
                    return Err(EvaluationError::Syntax("expected ')'".into()));
                }
                Ok(inner)
            }
            Token::Eof => Err(EvaluationError::Syntax(
                "unexpected end of expression".into(),
            )),
            other => Err(EvaluationError::Syntax(format!("unexpected token {other:?}"))),
        }
    }
}

/// Parse a condition into an AST.  The whole input must be consumed.
pub fn parse_expr(src: &str) -> Result<Expr, EvaluationError> {
    if src.trim().is_empty() {
        return Err(EvaluationError::Empty);
    }
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(EvaluationError::Syntax(format!(
            "unexpected trailing token {other:?}"
        ))),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given bindings.
pub fn eval_expr(expr: &Expr, vars: &dyn Bindings) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => vars
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvaluationError::Unbound(name.clone())),

        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, vars)?;
            match op {
                UnaryOp::Neg => v.arith_neg().map_err(EvaluationError::Type),
                UnaryOp::Not => Ok(Value::Bool(!v.as_bool())),
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit: the right operand may reference bindings that
            // only exist when the left one holds.
            match op {
                BinOp::And => {
                    if !eval_expr(lhs, vars)?.as_bool() {
                        return Ok(Value::Bool(false));
                    }
                    return Ok(Value::Bool(eval_expr(rhs, vars)?.as_bool()));
                }
                BinOp::Or => {
                    if eval_expr(lhs, vars)?.as_bool() {
                        return Ok(Value::Bool(true));
                    }
                    return Ok(Value::Bool(eval_expr(rhs, vars)?.as_bool()));
                }
                _ => {}
            }
            let l = eval_expr(lhs, vars)?;
            let r = eval_expr(rhs, vars)?;
            eval_binop(*op, l, r)
        }
    }
}

fn eval_binop(op: BinOp, l: Value, r: Value) -> Result<Value, EvaluationError> {
    use std::cmp::Ordering;

    let ordered = |pred: fn(Ordering) -> bool| -> Result<Value, EvaluationError> {
        match l.cmp_value(&r) {
            Some(ord) => Ok(Value::Bool(pred(ord))),
            None => Err(EvaluationError::Type(format!(
                "cannot order {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        }
    };

    match op {
        BinOp::Add => l.arith_add(&r).map_err(EvaluationError::Type),
        BinOp::Sub => l.arith_sub(&r).map_err(EvaluationError::Type),
        BinOp::Mul => l.arith_mul(&r).map_err(EvaluationError::Type),
        BinOp::Div => l.arith_div(&r).map_err(EvaluationError::Type),
        BinOp::Rem => l.arith_rem(&r).map_err(EvaluationError::Type),

        BinOp::Eq => Ok(Value::Bool(l.loose_eq(&r))),
        BinOp::Ne => Ok(Value::Bool(!l.loose_eq(&r))),
        BinOp::Lt => ordered(|o| o == Ordering::Less),
        BinOp::Le => ordered(|o| o != Ordering::Greater),
        BinOp::Gt => ordered(|o| o == Ordering::Greater),
        BinOp::Ge => ordered(|o| o != Ordering::Less),

        BinOp::GlobMatch => Ok(Value::Bool(glob_match(&r.to_string(), &l.to_string()))),
        BinOp::NotGlobMatch => Ok(Value::Bool(!glob_match(&r.to_string(), &l.to_string()))),
        BinOp::RegexMatch => regex_match(&r.to_string(), &l.to_string()).map(Value::Bool),
        BinOp::NotRegexMatch => {
            regex_match(&r.to_string(), &l.to_string()).map(|m| Value::Bool(!m))
        }

        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

// ── Simple glob matcher ───────────────────────────────────────────────────────

fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match_inner(&p, &t)
}

fn glob_match_inner(p: &[char], t: &[char]) -> bool {
    match (p.first(), t.first()) {
        (None, None) => true,
        (Some('*'), _) => {
            let rest_p = p
                .iter()
                .position(|&c| c != '*')
                .map(|i| &p[i..])
                .unwrap_or(&[]);
            (0..=t.len()).any(|i| glob_match_inner(rest_p, &t[i..]))
        }
        (Some('?'), Some(_)) => glob_match_inner(&p[1..], &t[1..]),
        (Some(pc), Some(tc)) if pc == tc => glob_match_inner(&p[1..], &t[1..]),
        _ => false,
    }
}

fn regex_match(pattern: &str, text: &str) -> Result<bool, EvaluationError> {
    Regex::new(pattern)
        .map(|re| re.is_match(text))
        .map_err(|source| EvaluationError::Pattern {
            pattern: pattern.to_owned(),
            source,
        })
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// A parsed condition, kept alongside its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(src: &str) -> Result<Self, EvaluationError> {
        Ok(Condition {
            source: src.to_owned(),
            expr: parse_expr(src)?,
        })
    }

    /// Evaluate to a verdict.  Pure: the same bindings give the same answer.
    pub fn holds(&self, vars: &dyn Bindings) -> Result<bool, EvaluationError> {
        eval_expr(&self.expr, vars).map(|v| v.as_bool())
    }
}

/// Parse and evaluate a condition string in one step.
pub fn evaluate(src: &str, vars: &dyn Bindings) -> Result<bool, EvaluationError> {
    Condition::parse(src)?.holds(vars)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
