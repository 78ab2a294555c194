//! CQL2 text encoding - lexer and recursive descent parser
//!
//! Grammar (precedence low -> high):
//!
//! ```text
//! or        := and ("OR" and)*
//! and       := not ("AND" not)*
//! not       := "NOT" not | predicate
//! predicate := operand [cmp operand | [NOT] LIKE operand
//!                      | [NOT] BETWEEN operand AND operand
//!                      | [NOT] IN "(" operand ("," operand)* ")"
//!                      | IS [NOT] NULL]
//! operand   := "(" or ")" | literal | geometry | call | property
//! ```
//!
//! Keywords are case-insensitive. Positions in errors are character offsets.

use geo::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Rect,
};
use serde_json::{Number, Value};

use super::spatial::rect_from_numbers;
use super::{CmpOp, Expr, FilterError, Instant, SpatialOp, MAX_NESTING};

const RESERVED: [&str; 7] = ["AND", "OR", "NOT", "LIKE", "BETWEEN", "IN", "IS"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    /// Double-quoted identifier
    Quoted(String),
    Str(String),
    Number(Number),
    LParen,
    RParen,
    Comma,
    Op(CmpOp),
    Eof,
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("'{}'", name),
        Token::Quoted(name) => format!("\"{}\"", name),
        Token::Str(s) => format!("string '{}'", s),
        Token::Number(n) => format!("number {}", n),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Op(op) => format!("'{}'", op.symbol()),
        Token::Eof => "end of input".to_string(),
    }
}

fn syntax(position: usize, message: impl Into<String>) -> FilterError {
    FilterError::Syntax {
        position,
        message: message.into(),
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, FilterError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let next = chars.get(i + 1).copied();

        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push((Token::LParen, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, start));
                i += 1;
            }
            '=' => {
                tokens.push((Token::Op(CmpOp::Eq), start));
                i += 1;
            }
            '<' => match next {
                Some('=') => {
                    tokens.push((Token::Op(CmpOp::Le), start));
                    i += 2;
                }
                Some('>') => {
                    tokens.push((Token::Op(CmpOp::Ne), start));
                    i += 2;
                }
                _ => {
                    tokens.push((Token::Op(CmpOp::Lt), start));
                    i += 1;
                }
            },
            '>' => {
                if next == Some('=') {
                    tokens.push((Token::Op(CmpOp::Ge), start));
                    i += 2;
                } else {
                    tokens.push((Token::Op(CmpOp::Gt), start));
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(syntax(start, "unterminated quoted text")),
                        // doubled quote is an escaped quote
                        Some(&q) if q == quote && chars.get(i + 1) == Some(&quote) => {
                            text.push(quote);
                            i += 2;
                        }
                        Some(&q) if q == quote => {
                            i += 1;
                            break;
                        }
                        Some(&other) => {
                            text.push(other);
                            i += 1;
                        }
                    }
                }
                let token = if quote == '\'' {
                    Token::Str(text)
                } else {
                    Token::Quoted(text)
                };
                tokens.push((token, start));
            }
            c if starts_number(c, next) => {
                let mut end = i + 1;
                while end < chars.len() {
                    let ch = chars[end];
                    let exponent_sign =
                        (ch == '-' || ch == '+') && matches!(chars[end - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || exponent_sign
                    {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..end].iter().collect();
                tokens.push((Token::Number(parse_number(&text, start)?), start));
                i = end;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i + 1;
                while end < chars.len()
                    && (chars[end].is_alphanumeric() || matches!(chars[end], '_' | ':' | '.'))
                {
                    end += 1;
                }
                tokens.push((Token::Ident(chars[start..end].iter().collect()), start));
                i = end;
            }
            other => return Err(syntax(start, format!("unexpected character '{}'", other))),
        }
    }

    tokens.push((Token::Eof, chars.len()));
    Ok(tokens)
}

fn starts_number(c: char, next: Option<char>) -> bool {
    let digit_or_dot = |n: Option<char>| n.is_some_and(|n| n.is_ascii_digit() || n == '.');
    c.is_ascii_digit()
        || (c == '.' && next.is_some_and(|n| n.is_ascii_digit()))
        || ((c == '-' || c == '+') && digit_or_dot(next))
}

fn parse_number(text: &str, position: usize) -> Result<Number, FilterError> {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Number::from(int));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| syntax(position, format!("invalid number '{}'", text)))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    /// Open groups and negations around the current token
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].0
    }

    fn position(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn is_keyword(token: &Token, keyword: &str) -> bool {
        matches!(token, Token::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if Self::is_keyword(self.peek(), keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FilterError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&describe(&expected)))
        }
    }

    fn unexpected(&self, expected: &str) -> FilterError {
        syntax(
            self.position(),
            format!("expected {}, found {}", expected, describe(self.peek())),
        )
    }

    fn descend(&mut self) -> Result<(), FilterError> {
        if self.depth >= MAX_NESTING {
            return Err(syntax(
                self.position(),
                format!("filter nests deeper than {} levels", MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        self.descend()?;
        let expr = self.parse_disjunction();
        self.depth -= 1;
        expr
    }

    fn parse_disjunction(&mut self) -> Result<Expr, FilterError> {
        let mut operands = vec![self.parse_and()?];
        while self.eat_keyword("OR") {
            operands.push(self.parse_and()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Or(operands)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut operands = vec![self.parse_not()?];
        while self.eat_keyword("AND") {
            operands.push(self.parse_not()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::And(operands)
        })
    }

    fn parse_not(&mut self) -> Result<Expr, FilterError> {
        let mut negations = 0;
        while self.eat_keyword("NOT") {
            self.descend()?;
            negations += 1;
        }
        let predicate = self.parse_predicate();
        self.depth -= negations;

        let mut expr = predicate?;
        for _ in 0..negations {
            expr = Expr::Not(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_predicate(&mut self) -> Result<Expr, FilterError> {
        let left = self.parse_operand()?;

        if let Token::Op(op) = *self.peek() {
            self.advance();
            let right = self.parse_operand()?;
            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        let negated = Self::is_keyword(self.peek(), "NOT")
            && ["LIKE", "BETWEEN", "IN"]
                .iter()
                .any(|kw| Self::is_keyword(self.peek_at(1), kw));
        if negated {
            self.advance();
        }

        if self.eat_keyword("LIKE") {
            let pattern = self.parse_operand()?;
            return Ok(Expr::Like {
                expr: Box::new(left),
                pattern: Box::new(pattern),
                negated,
            });
        }

        if self.eat_keyword("BETWEEN") {
            let low = self.parse_operand()?;
            if !self.eat_keyword("AND") {
                return Err(self.unexpected("AND"));
            }
            let high = self.parse_operand()?;
            return Ok(Expr::Between {
                expr: Box::new(left),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }

        if self.eat_keyword("IN") {
            self.expect(Token::LParen)?;
            let mut list = vec![self.parse_operand()?];
            while *self.peek() == Token::Comma {
                self.advance();
                list.push(self.parse_operand()?);
            }
            self.expect(Token::RParen)?;
            return Ok(Expr::In {
                expr: Box::new(left),
                list,
                negated,
            });
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            if !self.eat_keyword("NULL") {
                return Err(self.unexpected("NULL"));
            }
            return Ok(Expr::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        Ok(left)
    }

    fn parse_operand(&mut self) -> Result<Expr, FilterError> {
        let position = self.position();
        match self.advance() {
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Quoted(name) => Ok(Expr::Property(name)),
            Token::Ident(name) => self.parse_identifier(name, position),
            other => Err(syntax(
                position,
                format!("expected an operand, found {}", describe(&other)),
            )),
        }
    }

    fn parse_identifier(&mut self, name: String, position: usize) -> Result<Expr, FilterError> {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "TRUE" => return Ok(Expr::Literal(Value::Bool(true))),
            "FALSE" => return Ok(Expr::Literal(Value::Bool(false))),
            "NULL" => return Ok(Expr::Literal(Value::Null)),
            kw if RESERVED.contains(&kw) => {
                return Err(syntax(
                    position,
                    format!("unexpected keyword '{}'", name),
                ))
            }
            _ => {}
        }

        let opens_call = *self.peek() == Token::LParen;
        let opens_z_geometry =
            Self::is_keyword(self.peek(), "Z") && *self.peek_at(1) == Token::LParen;

        if is_geometry_keyword(&upper) && (opens_call || opens_z_geometry) {
            self.eat_keyword("Z");
            return self.parse_geometry(&upper).map(Expr::Geometry);
        }

        if !opens_call {
            return Ok(Expr::Property(name));
        }

        if upper == "TIMESTAMP" || upper == "DATE" {
            self.expect(Token::LParen)?;
            let value_position = self.position();
            let value = match self.advance() {
                Token::Str(s) => s,
                other => {
                    return Err(syntax(
                        position,
                        format!("{} expects a string, found {}", upper, describe(&other)),
                    ))
                }
            };
            self.expect(Token::RParen)?;
            let instant = if upper == "DATE" {
                Instant::date(&value)
            } else {
                Instant::timestamp(&value)
            };
            return instant.map(Expr::Instant).map_err(|e| {
                syntax(
                    value_position,
                    format!("invalid {} '{}': {}", upper, value, e),
                )
            });
        }

        let args = self.parse_args()?;

        if let Some(op) = SpatialOp::from_name(&name) {
            let [left, right]: [Expr; 2] = args.try_into().map_err(|args: Vec<Expr>| {
                syntax(
                    position,
                    format!("{} expects 2 arguments, got {}", op.name(), args.len()),
                )
            })?;
            return Ok(Expr::Spatial {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(Expr::Function { name, args })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, FilterError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if *self.peek() == Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => break,
                other => {
                    return Err(syntax(
                        self.position(),
                        format!("expected ',' or ')', found {}", describe(&other)),
                    ))
                }
            }
        }
        Ok(args)
    }

    // ─────────────────────────────────────────────────────────────
    // WKT geometry literals
    // ─────────────────────────────────────────────────────────────

    fn parse_geometry(&mut self, keyword: &str) -> Result<Geometry<f64>, FilterError> {
        match keyword {
            "POINT" => {
                self.expect(Token::LParen)?;
                let coord = self.parse_coord()?;
                self.expect(Token::RParen)?;
                Ok(Geometry::Point(Point(coord)))
            }
            "LINESTRING" => Ok(Geometry::LineString(LineString::new(
                self.parse_coord_list()?,
            ))),
            "POLYGON" => Ok(Geometry::Polygon(self.parse_polygon()?)),
            "MULTIPOINT" => {
                self.expect(Token::LParen)?;
                let mut points = vec![self.parse_multipoint_member()?];
                while *self.peek() == Token::Comma {
                    self.advance();
                    points.push(self.parse_multipoint_member()?);
                }
                self.expect(Token::RParen)?;
                Ok(Geometry::MultiPoint(MultiPoint::new(points)))
            }
            "MULTILINESTRING" => {
                let lines = self
                    .parse_ring_list()?
                    .into_iter()
                    .map(LineString::new)
                    .collect();
                Ok(Geometry::MultiLineString(MultiLineString::new(lines)))
            }
            "MULTIPOLYGON" => {
                self.expect(Token::LParen)?;
                let mut polygons = vec![self.parse_polygon()?];
                while *self.peek() == Token::Comma {
                    self.advance();
                    polygons.push(self.parse_polygon()?);
                }
                self.expect(Token::RParen)?;
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
            }
            "BBOX" => {
                let position = self.position();
                let numbers = self.parse_number_list()?;
                rect_from_numbers(&numbers)
                    .map(Geometry::Rect)
                    .map_err(|e| syntax(position, e.to_string()))
            }
            // ENVELOPE(west, east, north, south)
            "ENVELOPE" => {
                let position = self.position();
                let numbers = self.parse_number_list()?;
                match numbers.as_slice() {
                    &[west, east, north, south] => Ok(Geometry::Rect(Rect::new(
                        Coord { x: west, y: south },
                        Coord { x: east, y: north },
                    ))),
                    other => Err(syntax(
                        position,
                        format!("ENVELOPE expects 4 numbers, got {}", other.len()),
                    )),
                }
            }
            other => Err(syntax(
                self.position(),
                format!("unsupported geometry '{}'", other),
            )),
        }
    }

    fn parse_number(&mut self) -> Result<f64, FilterError> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                n.as_f64().ok_or_else(|| self.unexpected("a finite number"))
            }
            _ => Err(self.unexpected("a number")),
        }
    }

    fn parse_number_list(&mut self) -> Result<Vec<f64>, FilterError> {
        self.expect(Token::LParen)?;
        let mut numbers = vec![self.parse_number()?];
        while *self.peek() == Token::Comma {
            self.advance();
            numbers.push(self.parse_number()?);
        }
        self.expect(Token::RParen)?;
        Ok(numbers)
    }

    /// `x y` or `x y z` (z is dropped)
    fn parse_coord(&mut self) -> Result<Coord<f64>, FilterError> {
        let x = self.parse_number()?;
        let y = self.parse_number()?;
        if matches!(self.peek(), Token::Number(_)) {
            self.advance();
        }
        Ok(Coord { x, y })
    }

    fn parse_coord_list(&mut self) -> Result<Vec<Coord<f64>>, FilterError> {
        self.expect(Token::LParen)?;
        let mut coords = vec![self.parse_coord()?];
        while *self.peek() == Token::Comma {
            self.advance();
            coords.push(self.parse_coord()?);
        }
        self.expect(Token::RParen)?;
        Ok(coords)
    }

    fn parse_ring_list(&mut self) -> Result<Vec<Vec<Coord<f64>>>, FilterError> {
        self.expect(Token::LParen)?;
        let mut rings = vec![self.parse_coord_list()?];
        while *self.peek() == Token::Comma {
            self.advance();
            rings.push(self.parse_coord_list()?);
        }
        self.expect(Token::RParen)?;
        Ok(rings)
    }

    fn parse_polygon(&mut self) -> Result<Polygon<f64>, FilterError> {
        let mut rings = self.parse_ring_list()?.into_iter().map(LineString::new);
        let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
        Ok(Polygon::new(exterior, rings.collect()))
    }

    /// MULTIPOINT members may be bare (`x y`) or wrapped (`(x y)`)
    fn parse_multipoint_member(&mut self) -> Result<Point<f64>, FilterError> {
        if *self.peek() == Token::LParen {
            self.advance();
            let coord = self.parse_coord()?;
            self.expect(Token::RParen)?;
            Ok(Point(coord))
        } else {
            Ok(Point(self.parse_coord()?))
        }
    }
}

fn is_geometry_keyword(upper: &str) -> bool {
    matches!(
        upper,
        "POINT"
            | "LINESTRING"
            | "POLYGON"
            | "MULTIPOINT"
            | "MULTILINESTRING"
            | "MULTIPOLYGON"
            | "BBOX"
            | "ENVELOPE"
    )
}

/// Parse a CQL2 text filter
pub fn parse_text(src: &str) -> Result<Expr, FilterError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    if *parser.peek() == Token::Eof {
        return Err(syntax(0, "empty filter"));
    }

    let expr = parser.parse_or()?;
    if *parser.peek() != Token::Eof {
        return Err(parser.unexpected("end of input"));
    }
    Ok(expr)
}
