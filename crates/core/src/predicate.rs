// Value predicate - a small boolean expression language operators use
// to narrow resolver output by rule value, e.g.:
//
//     value == 'enabled'
//     value >= '100' OR value == 'unlimited'
//     NOT (value == 'off')
//
// The engine itself is generic over any `Fn(&V) -> bool`; this module
// is the concrete instantiation for JSON payloads. Values are rendered
// to strings for comparison; ordering is lexicographic.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    Bool(bool),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply(self, left: &str, right: &str) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Cmp {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Literal(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Value,
    Literal(String),
}

/// A compiled predicate over an opaque JSON rule value. The only bound
/// identifier is `value`.
#[derive(Debug, Clone)]
pub struct ValuePredicate {
    expr: Expr,
    source: String,
}

impl ValuePredicate {
    /// Compiles an expression; syntax problems are reported as plain
    /// message strings the caller can surface verbatim.
    pub fn compile(source: &str) -> Result<Self, String> {
        let tokens = tokenize(source)
            .map_err(|error| format!("invalid expression '{}': {}", source, error))?;
        let expr = parse(&tokens)
            .map_err(|error| format!("invalid expression '{}': {}", source, error))?;
        Ok(Self {
            expr,
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates against one rule value.
    pub fn eval(&self, value: &Value) -> bool {
        eval_expr(&self.expr, &render_value(value))
    }
}

impl fmt::Display for ValuePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// String form a JSON value is compared under: bare strings drop their
/// quotes, everything else is compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err("expected '==' not '='".to_string());
                }
                tokens.push(Token::Cmp(CmpOp::Eq));
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err("expected '!=' not '!'".to_string());
                }
                tokens.push(Token::Cmp(CmpOp::Ne));
            }
            '<' => {
                chars.next();
                let op = if chars.next_if_eq(&'=').is_some() {
                    CmpOp::Le
                } else {
                    CmpOp::Lt
                };
                tokens.push(Token::Cmp(op));
            }
            '>' => {
                chars.next();
                let op = if chars.next_if_eq(&'=').is_some() {
                    CmpOp::Ge
                } else {
                    CmpOp::Gt
                };
                tokens.push(Token::Cmp(op));
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => literal.push(c),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Literal(literal));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    _ => Token::Ident(word),
                });
            }
            _ => return Err(format!("unexpected character: '{}'", ch)),
        }
    }

    Ok(tokens)
}

fn parse(tokens: &[Token]) -> Result<Expr, String> {
    let mut pos = 0;
    let expr = parse_or(tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(format!("unexpected trailing token {:?}", tokens[pos]));
    }
    Ok(expr)
}

fn parse_or(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let mut left = parse_and(tokens, pos)?;
    while tokens.get(*pos) == Some(&Token::Or) {
        *pos += 1;
        let right = parse_and(tokens, pos)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let mut left = parse_not(tokens, pos)?;
    while tokens.get(*pos) == Some(&Token::And) {
        *pos += 1;
        let right = parse_not(tokens, pos)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    if tokens.get(*pos) == Some(&Token::Not) {
        *pos += 1;
        let inner = parse_not(tokens, pos)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    parse_primary(tokens, pos)
}

fn parse_primary(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    match tokens.get(*pos) {
        None => Err("unexpected end of expression".to_string()),
        Some(Token::LParen) => {
            *pos += 1;
            let expr = parse_or(tokens, pos)?;
            if tokens.get(*pos) != Some(&Token::RParen) {
                return Err("expected ')'".to_string());
            }
            *pos += 1;
            Ok(expr)
        }
        Some(Token::Bool(b)) => {
            *pos += 1;
            Ok(Expr::Literal(*b))
        }
        _ => {
            let left = parse_operand(tokens, pos)?;
            let op = match tokens.get(*pos) {
                Some(Token::Cmp(op)) => *op,
                other => return Err(format!("expected comparison operator, got {:?}", other)),
            };
            *pos += 1;
            let right = parse_operand(tokens, pos)?;
            Ok(Expr::Cmp { left, op, right })
        }
    }
}

fn parse_operand(tokens: &[Token], pos: &mut usize) -> Result<Operand, String> {
    let operand = match tokens.get(*pos) {
        Some(Token::Ident(name)) if name == "value" => Operand::Value,
        Some(Token::Ident(name)) => return Err(format!("unknown identifier '{}'", name)),
        Some(Token::Literal(s)) => Operand::Literal(s.clone()),
        other => return Err(format!("expected 'value' or a literal, got {:?}", other)),
    };
    *pos += 1;
    Ok(operand)
}

fn eval_expr(expr: &Expr, rendered: &str) -> bool {
    match expr {
        Expr::Cmp { left, op, right } => {
            let left = resolve(left, rendered);
            let right = resolve(right, rendered);
            op.apply(left, right)
        }
        Expr::And(left, right) => eval_expr(left, rendered) && eval_expr(right, rendered),
        Expr::Or(left, right) => eval_expr(left, rendered) || eval_expr(right, rendered),
        Expr::Not(inner) => !eval_expr(inner, rendered),
        Expr::Literal(b) => *b,
    }
}

fn resolve<'a>(operand: &'a Operand, rendered: &'a str) -> &'a str {
    match operand {
        Operand::Value => rendered,
        Operand::Literal(s) => s.as_str(),
    }
}
