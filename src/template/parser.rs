/*!
 * Template and expression parser.
 *
 * A template is literal text with `${expr}` placeholders. Expressions are
 * parsed with precedence climbing over a small token stream.
 */

use crate::errors::TemplateError;

use super::ast::{BinaryOperator, Expr, TemplatePart, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Number(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(BinaryOperator),
}

/// Split a template into literal text and parsed placeholders
pub fn parse_template_all(source: &str) -> Result<Vec<TemplatePart>, TemplateError> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(open) = rest.find("${") {
        text.push_str(&rest[..open]);
        let expr_start = open + 2;
        let close = find_placeholder_end(&rest[expr_start..])
            .ok_or(TemplateError::Unterminated(offset + open))?;

        if !text.is_empty() {
            parts.push(TemplatePart::Text(std::mem::take(&mut text)));
        }
        let body = &rest[expr_start..expr_start + close];
        parts.push(TemplatePart::Expr(parse_expression_at(body, offset + expr_start)?));

        let consumed = expr_start + close + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }
    Ok(parts)
}

/// Parse a standalone expression
pub fn parse_expression(source: &str) -> Result<Expr, TemplateError> {
    parse_expression_at(source, 0)
}

fn parse_expression_at(source: &str, base: usize) -> Result<Expr, TemplateError> {
    let tokens = tokenize(source, base)?;
    let mut parser = Parser { tokens, pos: 0, base, end: base + source.len() };
    let expr = parser.parse_binary(0)?;
    if let Some((_, position)) = parser.tokens.get(parser.pos) {
        return Err(TemplateError::Syntax {
            position: *position,
            message: "unexpected trailing input".to_string(),
        });
    }
    Ok(expr)
}

// Byte offset of the `}` closing a placeholder, skipping quoted strings.
fn find_placeholder_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Some(idx),
                _ => {}
            },
        }
    }
    None
}

fn tokenize(source: &str, base: usize) -> Result<Vec<(Token, usize)>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(idx, c)) = chars.peek() {
        let position = base + idx;
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, position));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, position));
            }
            ',' => {
                chars.next();
                tokens.push((Token::Comma, position));
            }
            '+' | '-' | '*' | '/' => {
                chars.next();
                let op = match c {
                    '+' => BinaryOperator::Add,
                    '-' => BinaryOperator::Sub,
                    '*' => BinaryOperator::Mul,
                    _ => BinaryOperator::Div,
                };
                tokens.push((Token::Op(op), position));
            }
            '\'' | '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    if ch == c {
                        closed = true;
                        break;
                    }
                    if ch == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                        continue;
                    }
                    value.push(ch);
                }
                if !closed {
                    return Err(TemplateError::Syntax {
                        position,
                        message: "unterminated string literal".to_string(),
                    });
                }
                tokens.push((Token::Str(value), position));
            }
            c if c.is_ascii_digit() => {
                let mut literal = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal.parse::<f64>().map_err(|_| TemplateError::Syntax {
                    position,
                    message: format!("invalid number '{}'", literal),
                })?;
                tokens.push((Token::Number(number), position));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' || d == '.' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(name), position));
            }
            other => {
                return Err(TemplateError::UnexpectedChar { found: other, position });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    base: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, p)| *p).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn syntax(&self, message: &str) -> TemplateError {
        TemplateError::Syntax { position: self.position(), message: message.to_string() }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, TemplateError> {
        let mut left = self.parse_primary()?;

        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if op.precedence() <= min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(op.precedence())?;
            left = Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, TemplateError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Op(BinaryOperator::Sub)) => match self.parse_primary()? {
                Expr::Literal(Value::Number(n)) => Ok(Expr::Literal(Value::Number(-n))),
                operand => Ok(Expr::BinaryOp {
                    op: BinaryOperator::Sub,
                    left: Box::new(Expr::Literal(Value::Number(0.0))),
                    right: Box::new(operand),
                }),
            },
            Some(Token::LParen) => {
                let inner = self.parse_binary(0)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => {
                        self.pos -= 1;
                        Err(self.syntax("expected ')'"))
                    }
                }
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.syntax("expected a value"))
            }
            None => Err(TemplateError::Syntax {
                position: self.end.max(self.base),
                message: "unexpected end of expression".to_string(),
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, TemplateError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_binary(0)?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => {
                    self.pos -= 1;
                    return Err(self.syntax("expected ',' or ')'"));
                }
            }
        }
    }
}
