//! Textual condition expressions.
//!
//! Two notations are accepted wherever a condition id is expected:
//!
//! - shorthand, e.g. `a+!b|c`, where `+` is AND, `|` is OR, `\` is AND-NOT
//!   and a leading `!` negates one operand. Infix operators group to the
//!   right, so `a+b|c` reads as `a && (b || c)`;
//! - full expressions prefixed with `@`, e.g. `@(a || b) && !c`, supporting
//!   `&&`, `||`, `^`, `!` and parentheses with the usual precedence
//!   (NOT, then AND, then XOR, then OR).
//!
//! Every operand names another condition and becomes a [`Condition::Ref`].

use super::condition::Condition;
use super::error::{Result, RulesError};

/// Marker introducing a full expression.
pub const FULL_EXPRESSION_PREFIX: char = '@';

const SHORTHAND_OPERATORS: [char; 3] = ['+', '|', '\\'];

/// Parses `text` as a condition expression.
///
/// Returns `Ok(None)` when `text` is a plain id without any operator, so the
/// caller can treat it as a simple reference.
///
/// # Errors
///
/// Returns [`RulesError::Expression`] when an operand is missing or an `@`
/// expression is malformed.
///
/// # Examples
///
/// ```
/// use instill_common::rules::{parse_expression, Condition};
///
/// let parsed = parse_expression("a+!b").unwrap().unwrap();
/// assert_eq!(
///     parsed,
///     Condition::And(vec![
///         Condition::reference("a"),
///         Condition::not(Condition::reference("b")),
///     ])
/// );
/// assert!(parse_expression("plain.id").unwrap().is_none());
/// ```
pub fn parse_expression(text: &str) -> Result<Option<Condition>> {
    let trimmed = text.trim();
    if let Some(body) = trimmed.strip_prefix(FULL_EXPRESSION_PREFIX) {
        return FullParser::new(trimmed, body)?.parse().map(Some);
    }
    if !trimmed.starts_with('!') && !trimmed.contains(SHORTHAND_OPERATORS) {
        return Ok(None);
    }
    parse_shorthand(trimmed, trimmed).map(Some)
}

fn parse_shorthand(expression: &str, text: &str) -> Result<Condition> {
    let Some(position) = text.find(SHORTHAND_OPERATORS) else {
        return parse_operand(expression, text);
    };
    let left = parse_operand(expression, &text[..position])?;
    let right = parse_shorthand(expression, &text[position + 1..])?;
    Ok(match &text[position..=position] {
        "+" => Condition::And(vec![left, right]),
        "|" => Condition::Or(vec![left, right]),
        _ => Condition::And(vec![left, Condition::not(right)]),
    })
}

fn parse_operand(expression: &str, text: &str) -> Result<Condition> {
    let token = text.trim();
    if let Some(rest) = token.strip_prefix('!') {
        return parse_operand(expression, rest).map(Condition::not);
    }
    if token.is_empty() {
        return Err(invalid(expression, "missing condition id"));
    }
    Ok(Condition::reference(token))
}

fn invalid(expression: &str, reason: impl Into<String>) -> RulesError {
    RulesError::Expression {
        expression: expression.to_owned(),
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Id(String),
    And,
    Or,
    Xor,
    Not,
    Open,
    Close,
}

fn tokenise(expression: &str, body: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '!' => tokens.push(Token::Not),
            '^' => tokens.push(Token::Xor),
            '&' | '|' => {
                if chars.next_if_eq(&c).is_none() {
                    return Err(invalid(expression, format!("expected `{c}{c}`")));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            _ => {
                let mut id = String::from(c);
                while let Some(next) =
                    chars.next_if(|n| !n.is_whitespace() && !"()!^&|".contains(*n))
                {
                    id.push(next);
                }
                tokens.push(Token::Id(id));
            }
        }
    }
    Ok(tokens)
}

struct FullParser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> FullParser<'a> {
    fn new(expression: &'a str, body: &str) -> Result<Self> {
        Ok(Self {
            expression,
            tokens: tokenise(expression, body)?,
            position: 0,
        })
    }

    fn parse(mut self) -> Result<Condition> {
        if self.tokens.is_empty() {
            return Err(invalid(self.expression, "empty expression"));
        }
        let condition = self.or()?;
        match self.tokens.get(self.position) {
            None => Ok(condition),
            Some(token) => Err(invalid(
                self.expression,
                format!("unexpected {token:?} at token {}", self.position + 1),
            )),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.position) == Some(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Condition> {
        let mut left = self.xor()?;
        while self.eat(&Token::Or) {
            left = Condition::Or(vec![left, self.xor()?]);
        }
        Ok(left)
    }

    fn xor(&mut self) -> Result<Condition> {
        let mut left = self.and()?;
        while self.eat(&Token::Xor) {
            left = Condition::Xor(vec![left, self.and()?]);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Condition> {
        let mut left = self.unary()?;
        while self.eat(&Token::And) {
            left = Condition::And(vec![left, self.unary()?]);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Condition> {
        if self.eat(&Token::Not) {
            return self.unary().map(Condition::not);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Condition> {
        if self.eat(&Token::Open) {
            let inner = self.or()?;
            if !self.eat(&Token::Close) {
                return Err(invalid(self.expression, "unbalanced parentheses"));
            }
            return Ok(inner);
        }
        match self.tokens.get(self.position).cloned() {
            Some(Token::Id(id)) => {
                self.position += 1;
                Ok(Condition::Ref(id))
            }
            Some(token) => Err(invalid(
                self.expression,
                format!("expected a condition id, found {token:?}"),
            )),
            None => Err(invalid(self.expression, "unexpected end of expression")),
        }
    }
}
