//! Recursive descent parser
//!
//! Precedence, loosest first: `? :`, `or`, `and`, comparisons and `~>`,
//! `&`, path navigation, postfix predicates and calls.

use super::ParseError;
use super::ast::{BinaryOp, Node};
use super::lexer::{Spanned, Token, tokenize};
use regex::RegexBuilder;
use serde_json::{Number, Value};

pub fn parse(input: &str) -> Result<Node, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::new(0, "empty expression"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let node = parser.expression()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|s| s.offset)
            .unwrap_or(self.end);
        ParseError::new(offset, message)
    }

    fn expression(&mut self) -> Result<Node, ParseError> {
        self.conditional()
    }

    fn conditional(&mut self) -> Result<Node, ParseError> {
        let condition = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.conditional()?;
        let otherwise = if self.eat(&Token::Colon) {
            Some(Box::new(self.conditional()?))
        } else {
            None
        };
        Ok(Node::Condition {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise,
        })
    }

    fn or(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.and()?;
        while self.eat_keyword("or") {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.comparison()?;
        while self.eat_keyword("and") {
            let rhs = self.comparison()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.concat()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                Some(Token::Chain) => {
                    self.pos += 1;
                    let rhs = self.concat()?;
                    lhs = Node::Chain {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue;
                }
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.concat()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn concat(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.path()?;
        while self.eat(&Token::Amp) {
            let rhs = self.path()?;
            lhs = binary(BinaryOp::Concat, lhs, rhs);
        }
        Ok(lhs)
    }

    fn path(&mut self) -> Result<Node, ParseError> {
        let first = self.step()?;
        if self.peek() != Some(&Token::Dot) {
            return Ok(first);
        }
        let mut steps = vec![first];
        while self.eat(&Token::Dot) {
            steps.push(self.step()?);
        }
        Ok(Node::Path(steps))
    }

    fn step(&mut self) -> Result<Node, ParseError> {
        let mut node = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::LBracket) => {
                    self.pos += 1;
                    if self.peek() == Some(&Token::RBracket) {
                        return Err(self.error("empty predicate"));
                    }
                    let predicate = self.expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    node = Node::Filter {
                        base: Box::new(node),
                        predicate: Box::new(predicate),
                    };
                }
                Some(Token::LParen) if is_callable(&node) => {
                    self.pos += 1;
                    let args = self.arguments()?;
                    node = Node::Call {
                        callee: Box::new(node),
                        args,
                    };
                }
                _ => return Ok(node),
            }
        }
    }

    /// Comma separated expressions up to the closing parenthesis
    fn arguments(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma, "',' or ')'")?;
        }
    }

    fn primary(&mut self) -> Result<Node, ParseError> {
        if matches!(self.peek(), Some(Token::Name(name)) if name == "function")
            && self.peek_at(1) == Some(&Token::LParen)
        {
            return self.lambda();
        }

        let start = self.pos;
        let token = self
            .next()
            .ok_or_else(|| self.error("unexpected end of expression"))?;

        match token {
            Token::Context => Ok(Node::Context),
            Token::Root => Ok(Node::Root),
            Token::Variable(name) => Ok(Node::Variable(name)),
            Token::Name(name) => Ok(match name.as_str() {
                "true" => Node::Literal(Value::Bool(true)),
                "false" => Node::Literal(Value::Bool(false)),
                "null" => Node::Literal(Value::Null),
                _ => Node::Field(name),
            }),
            Token::Star => Ok(Node::Wildcard),
            Token::Str(value) => Ok(Node::Literal(Value::String(value))),
            Token::Number(n) => Ok(Node::Literal(number(n))),
            Token::Minus => {
                let operand = self.step()?;
                Ok(match operand {
                    Node::Literal(Value::Number(n)) => {
                        Node::Literal(number(-n.as_f64().unwrap_or_default()))
                    }
                    other => Node::Negate(Box::new(other)),
                })
            }
            Token::Regex { pattern, flags } => {
                let mut builder = RegexBuilder::new(&pattern);
                for flag in flags.chars() {
                    match flag {
                        'i' => builder.case_insensitive(true),
                        'm' => builder.multi_line(true),
                        's' => builder.dot_matches_new_line(true),
                        other => {
                            self.pos = start;
                            return Err(self.error(&format!("unsupported regex flag '{}'", other)));
                        }
                    };
                }
                builder.build().map(Node::Regex).map_err(|e| {
                    self.pos = start;
                    self.error(&format!("invalid regex: {}", e))
                })
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if self.eat(&Token::RBracket) {
                    return Ok(Node::Array(items));
                }
                loop {
                    items.push(self.expression()?);
                    if self.eat(&Token::RBracket) {
                        return Ok(Node::Array(items));
                    }
                    self.expect(Token::Comma, "',' or ']'")?;
                }
            }
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => {
                self.pos = start;
                Err(self.error(&format!("unexpected token {:?}", other)))
            }
        }
    }

    fn lambda(&mut self) -> Result<Node, ParseError> {
        // `function` keyword and opening parenthesis
        self.pos += 2;
        let mut params = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                match self.next() {
                    Some(Token::Variable(name)) => params.push(name),
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("expected parameter like '$name'"));
                    }
                }
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        self.expect(Token::LBrace, "'{'")?;
        let body = self.expression()?;
        self.expect(Token::RBrace, "'}'")?;
        Ok(Node::Lambda {
            params,
            body: Box::new(body),
        })
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    Node::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn is_callable(node: &Node) -> bool {
    matches!(
        node,
        Node::Variable(_) | Node::Lambda { .. } | Node::Call { .. }
    )
}

/// Integral literals become JSON integers so they stringify without `.0`
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
