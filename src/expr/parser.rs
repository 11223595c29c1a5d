// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pratt parser for test expressions

use crate::core::{Error, Result, Value};

use super::lexer::{Lexer, Token};

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (`42`, `'draft'`, `null`, `true`)
    Literal(Value),
    /// Property path resolved against the bindings (`author.name`, `ids[0]`)
    Path(String),
    /// Prefix operator
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// Infix operator
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Precedence levels (higher number = higher precedence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Precedence {
    Lowest = 1,
    Or = 2,
    And = 3,
    Equals = 4,
    LessGreater = 5,
    Prefix = 6,
}

impl Precedence {
    fn of(token: &Token) -> Precedence {
        match token {
            Token::Or => Precedence::Or,
            Token::And => Precedence::And,
            Token::Eq | Token::Ne => Precedence::Equals,
            Token::Lt | Token::Le | Token::Gt | Token::Ge => Precedence::LessGreater,
            _ => Precedence::Lowest,
        }
    }
}

/// Parse an expression source into its tree
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, position: 0 };
    let expr = parser.parse_expression(Precedence::Lowest)?;
    parser.expect(Token::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.position += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let token = self.advance();
        if token == expected {
            Ok(())
        } else {
            Err(Error::expression(format!(
                "expected {:?}, found {:?}",
                expected, token
            )))
        }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expr> {
        let mut left = self.parse_prefix()?;
        while precedence < Precedence::of(self.current()) {
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Int(v) => Ok(Expr::Literal(Value::Integer(v))),
            Token::Float(v) => Ok(Expr::Literal(Value::Float(v))),
            Token::Str(s) => Ok(Expr::Literal(Value::text(s))),
            Token::Not => {
                let expr = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                })
            }
            Token::LParen => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(name) => match name.as_str() {
                "null" => Ok(Expr::Literal(Value::Null)),
                "true" => Ok(Expr::Literal(Value::Boolean(true))),
                "false" => Ok(Expr::Literal(Value::Boolean(false))),
                _ => self.parse_path(name),
            },
            other => Err(Error::expression(format!(
                "unexpected token {:?} in expression",
                other
            ))),
        }
    }

    /// Assemble a dotted, optionally indexed property path
    fn parse_path(&mut self, head: String) -> Result<Expr> {
        let mut path = head;
        loop {
            match self.current() {
                Token::Dot => {
                    self.advance();
                    match self.advance() {
                        Token::Ident(segment) => {
                            path.push('.');
                            path.push_str(&segment);
                        }
                        other => {
                            return Err(Error::expression(format!(
                                "expected property name after '.', found {:?}",
                                other
                            )))
                        }
                    }
                }
                Token::LBracket => {
                    self.advance();
                    let index = match self.advance() {
                        Token::Int(i) => i.to_string(),
                        Token::Str(s) => s,
                        Token::Ident(s) => s,
                        other => {
                            return Err(Error::expression(format!(
                                "expected index, found {:?}",
                                other
                            )))
                        }
                    };
                    self.expect(Token::RBracket)?;
                    path.push('[');
                    path.push_str(&index);
                    path.push(']');
                }
                _ => return Ok(Expr::Path(path)),
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr> {
        let token = self.advance();
        let op = match token {
            Token::Eq => BinaryOp::Eq,
            Token::Ne => BinaryOp::Ne,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::And => BinaryOp::And,
            Token::Or => BinaryOp::Or,
            other => {
                return Err(Error::expression(format!(
                    "unexpected infix token {:?}",
                    other
                )))
            }
        };
        let precedence = Precedence::of(&token);
        let right = self.parse_expression(precedence)?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}
