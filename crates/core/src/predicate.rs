//! Predicate expression grammar for except cases.
//!
//! Predicates are short boolean expressions over the request context,
//! compiled at load time to a tagged AST and evaluated with no ambient
//! capabilities. This is a deliberately closed language: literals, context
//! field paths, `size(...)`, `exists(...)`, comparisons, and boolean
//! connectives. Nothing else.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | cmp
//! cmp     := term ( ("==" | "!=" | "<" | "<=" | ">" | ">=") term )?
//! term    := literal | path | "size" "(" expr ")" | "exists" "(" path ")"
//!          | "(" expr ")"
//! literal := number | string | "true" | "false" | "null"
//! path    := word with characters [A-Za-z0-9._*-]
//! ```

use std::fmt;

use serde_json::Value;

// ──────────────────────────────────────────────
// AST
// ──────────────────────────────────────────────

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A compiled predicate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A JSON literal (number, string, bool, null).
    Literal(Value),
    /// A dotted field path into the request context.
    Field(String),
    /// Element/key/character count of the operand.
    Size(Box<Predicate>),
    /// Strict existence test on a context path (never undefined).
    Exists(String),
    Compare {
        left: Box<Predicate>,
        op: CompareOp,
        right: Box<Predicate>,
    },
    And {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Or {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Not {
        operand: Box<Predicate>,
    },
}

/// A predicate parse failure, with byte offset into the source string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct PredicateParseError {
    pub message: String,
    pub offset: usize,
}

// ──────────────────────────────────────────────
// Lexer
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Int(i64),
    Float(f64),
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
}

struct Spanned {
    token: Token,
    offset: usize,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-' || b == b'*'
}

fn lex(src: &str) -> Result<Vec<Spanned>, PredicateParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let err = |message: &str, offset: usize| PredicateParseError {
        message: message.to_string(),
        offset,
    };

    while pos < bytes.len() {
        let b = bytes[pos];
        let start = pos;
        match b {
            b' ' | b'\t' => pos += 1,
            b'(' => {
                tokens.push(Spanned { token: Token::LParen, offset: start });
                pos += 1;
            }
            b')' => {
                tokens.push(Spanned { token: Token::RParen, offset: start });
                pos += 1;
            }
            b'=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::EqEq, offset: start });
                    pos += 2;
                } else {
                    return Err(err("expected '==' (single '=' is not assignment)", start));
                }
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::NotEq, offset: start });
                    pos += 2;
                } else {
                    tokens.push(Spanned { token: Token::Bang, offset: start });
                    pos += 1;
                }
            }
            b'<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::Le, offset: start });
                    pos += 2;
                } else {
                    tokens.push(Spanned { token: Token::Lt, offset: start });
                    pos += 1;
                }
            }
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::Ge, offset: start });
                    pos += 2;
                } else {
                    tokens.push(Spanned { token: Token::Gt, offset: start });
                    pos += 1;
                }
            }
            b'&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    tokens.push(Spanned { token: Token::AndAnd, offset: start });
                    pos += 2;
                } else {
                    return Err(err("expected '&&'", start));
                }
            }
            b'|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    tokens.push(Spanned { token: Token::OrOr, offset: start });
                    pos += 2;
                } else {
                    return Err(err("expected '||'", start));
                }
            }
            b'"' | b'\'' => {
                let quote = b;
                pos += 1;
                let text_start = pos;
                while pos < bytes.len() && bytes[pos] != quote {
                    pos += 1;
                }
                if pos >= bytes.len() {
                    return Err(err("unterminated string literal", start));
                }
                tokens.push(Spanned {
                    token: Token::Str(src[text_start..pos].to_string()),
                    offset: start,
                });
                pos += 1;
            }
            b'0'..=b'9' => {
                let mut end = pos;
                let mut is_float = false;
                while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                    if bytes[end] == b'.' {
                        // Two dots would be a path, not a number; numbers
                        // never appear in path position so reject here.
                        if is_float {
                            return Err(err("malformed number", start));
                        }
                        is_float = true;
                    }
                    end += 1;
                }
                let text = &src[pos..end];
                let token = if is_float {
                    Token::Float(
                        text.parse::<f64>()
                            .map_err(|_| err("malformed number", start))?,
                    )
                } else {
                    Token::Int(
                        text.parse::<i64>()
                            .map_err(|_| err("malformed number", start))?,
                    )
                };
                tokens.push(Spanned { token, offset: start });
                pos = end;
            }
            _ if is_word_byte(b) => {
                let mut end = pos;
                while end < bytes.len() && is_word_byte(bytes[end]) {
                    end += 1;
                }
                tokens.push(Spanned {
                    token: Token::Word(src[pos..end].to_string()),
                    offset: start,
                });
                pos = end;
            }
            _ => return Err(err("unexpected character", start)),
        }
    }
    Ok(tokens)
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    src_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.offset)
            .unwrap_or(self.src_len)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|s| s.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), PredicateParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.err(format!("expected {}", what)))
        }
    }

    fn err(&self, message: impl Into<String>) -> PredicateParseError {
        PredicateParseError {
            message: message.into(),
            offset: self.offset(),
        }
    }

    fn parse_expr(&mut self) -> Result<Predicate, PredicateParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Predicate, PredicateParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_and()?;
            left = Predicate::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate, PredicateParseError> {
        let mut left = self.parse_unary()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_unary()?;
            left = Predicate::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Predicate, PredicateParseError> {
        if self.eat(&Token::Bang) {
            let operand = self.parse_unary()?;
            return Ok(Predicate::Not {
                operand: Box::new(operand),
            });
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Predicate, PredicateParseError> {
        let left = self.parse_term()?;
        let op = match self.peek() {
            Some(Token::EqEq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::Ne,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_term()?;
        Ok(Predicate::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_term(&mut self) -> Result<Predicate, PredicateParseError> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Int(n)) => Ok(Predicate::Literal(Value::from(n))),
            Some(Token::Float(x)) => Ok(Predicate::Literal(
                serde_json::Number::from_f64(x)
                    .map(Value::Number)
                    .ok_or_else(|| self.err("non-finite number literal"))?,
            )),
            Some(Token::Str(s)) => Ok(Predicate::Literal(Value::String(s))),
            Some(Token::Word(w)) => match w.as_str() {
                "true" => Ok(Predicate::Literal(Value::Bool(true))),
                "false" => Ok(Predicate::Literal(Value::Bool(false))),
                "null" => Ok(Predicate::Literal(Value::Null)),
                "size" if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let operand = self.parse_expr()?;
                    self.expect(&Token::RParen, "')'")?;
                    Ok(Predicate::Size(Box::new(operand)))
                }
                "exists" if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let path = match self.advance() {
                        Some(Token::Word(p)) => p,
                        _ => return Err(self.err("expected field path in exists(...)")),
                    };
                    self.expect(&Token::RParen, "')'")?;
                    Ok(Predicate::Exists(path))
                }
                _ => Ok(Predicate::Field(w)),
            },
            Some(other) => Err(self.err(format!("unexpected token {:?}", other))),
            None => Err(self.err("unexpected end of predicate")),
        }
    }
}

/// Compile a predicate source string to its AST.
pub fn parse(src: &str) -> Result<Predicate, PredicateParseError> {
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Err(PredicateParseError {
            message: "empty predicate".to_string(),
            offset: 0,
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        src_len: src.len(),
    };
    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(parser.err("trailing input after predicate"));
    }
    Ok(expr)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
