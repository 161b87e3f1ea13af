use gomory_solver::{Relation, Sense};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Comments are dropped up front; newlines end statements.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Model, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_model()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn peek_text_at(&self, offset: usize) -> Option<&str> {
        self.tokens.get(self.pos + offset).map(|t| t.text.as_str())
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn current_start(&self) -> usize {
        self.current().map(|t| t.span.start).unwrap_or(0)
    }

    fn previous_end(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    /// A statement ends at a newline or the end of input
    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn parse_model(&mut self) -> Result<Model, ParseError> {
        self.skip_newlines();
        let objective = self.parse_objective()?;

        self.skip_newlines();
        self.skip_subject_to()?;

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            constraints.push(self.parse_constraint()?);
        }

        Ok(Model {
            objective,
            constraints,
        })
    }

    fn parse_objective(&mut self) -> Result<ObjectiveDecl, ParseError> {
        let start = self.current_start();
        let sense = match self.peek_kind() {
            TokenKind::Maximize => Sense::Maximize,
            TokenKind::Minimize => Sense::Minimize,
            _ => return Err(self.unexpected("maximize or minimize")),
        };
        self.advance();
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }

        let expr = self.parse_expr()?;
        let end = self.previous_end();
        self.end_of_statement()?;

        Ok(ObjectiveDecl {
            span: Span::new(start, end),
            sense,
            expr,
        })
    }

    /// Optional `subject to`, `st` or `s.t.` header
    fn skip_subject_to(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Subject => {
                self.advance();
                self.expect(TokenKind::To)?;
            }
            TokenKind::St => {
                self.advance();
            }
            TokenKind::Ident
                if self.peek_text_at(0) == Some("s")
                    && self.peek_kind_at(1) == TokenKind::Dot
                    && self.peek_text_at(2) == Some("t") =>
            {
                self.advance();
                self.advance();
                self.advance();
                if self.peek_kind() == TokenKind::Dot {
                    self.advance();
                }
            }
            _ => return Ok(()),
        }
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }
        Ok(())
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let start = self.current_start();

        let mut name = None;
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_at(1) == TokenKind::Colon {
            name = self.advance().map(|t| t.text.clone());
            self.advance();
        }

        let lhs = self.parse_expr()?;
        let relation = self.parse_relation()?;
        self.skip_newlines();
        let rhs = self.parse_expr()?;
        let end = self.previous_end();
        self.end_of_statement()?;

        Ok(ConstraintDecl {
            span: Span::new(start, end),
            name,
            lhs,
            relation,
            rhs,
        })
    }

    fn parse_relation(&mut self) -> Result<Relation, ParseError> {
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::LessEq,
            TokenKind::Ge => Relation::GreaterEq,
            TokenKind::Eq => Relation::Equal,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();
        Ok(relation)
    }

    /// Leading signs, then terms joined by `+`/`-`. A line ending in an
    /// operator continues on the next line.
    fn parse_expr(&mut self) -> Result<LinearExpr, ParseError> {
        let start = self.current_start();
        let mut terms = Vec::new();

        let sign = self.parse_signs();
        terms.push(self.parse_term(sign)?);

        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let sign = self.parse_signs();
            self.skip_newlines();
            terms.push(self.parse_term(sign)?);
        }

        Ok(LinearExpr {
            span: Span::new(start, self.previous_end()),
            terms,
        })
    }

    fn parse_signs(&mut self) -> f64 {
        let mut sign = 1.0;
        loop {
            match self.peek_kind() {
                TokenKind::Plus => {}
                TokenKind::Minus => sign = -sign,
                _ => return sign,
            }
            self.advance();
        }
    }

    /// `number`, `ident`, `number ident` or `number * ident`
    fn parse_term(&mut self, sign: f64) -> Result<Term, ParseError> {
        let start = self.current_start();
        match self.peek_kind() {
            TokenKind::Number => {
                let text = self.current().map(|t| t.text.clone()).unwrap_or_default();
                let value: f64 = text
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(text.clone()))?;
                self.advance();

                if self.peek_kind() == TokenKind::Star {
                    self.advance();
                    let ident = self.expect(TokenKind::Ident)?;
                    return Ok(Term {
                        span: Span::new(start, ident.span.end),
                        coefficient: sign * value,
                        variable: Some(ident.text),
                    });
                }
                if self.peek_kind() == TokenKind::Ident {
                    let ident = self.expect(TokenKind::Ident)?;
                    return Ok(Term {
                        span: Span::new(start, ident.span.end),
                        coefficient: sign * value,
                        variable: Some(ident.text),
                    });
                }
                Ok(Term {
                    span: Span::new(start, self.previous_end()),
                    coefficient: sign * value,
                    variable: None,
                })
            }
            TokenKind::Ident => {
                let ident = self.expect(TokenKind::Ident)?;
                Ok(Term {
                    span: ident.span,
                    coefficient: sign,
                    variable: Some(ident.text),
                })
            }
            _ => Err(self.unexpected("number or variable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(coefficient: f64, variable: &str) -> (f64, Option<String>) {
        (coefficient, Some(variable.to_string()))
    }

    fn terms(expr: &LinearExpr) -> Vec<(f64, Option<String>)> {
        expr.terms
            .iter()
            .map(|t| (t.coefficient, t.variable.clone()))
            .collect()
    }

    #[test]
    fn test_parse_model() {
        let source = r#"
            // scenario from the test suite
            maximize 3 x1 + 2*x2
            subject to
              cap: x1 + x2 <= 4
              x1 + 3x2 <= 6
        "#;
        let model = Parser::parse(source).unwrap();

        assert_eq!(model.objective.sense, Sense::Maximize);
        assert_eq!(terms(&model.objective.expr), vec![term(3.0, "x1"), term(2.0, "x2")]);
        assert_eq!(model.constraints.len(), 2);

        let cap = &model.constraints[0];
        assert_eq!(cap.name.as_deref(), Some("cap"));
        assert_eq!(cap.relation, Relation::LessEq);
        assert_eq!(terms(&cap.lhs), vec![term(1.0, "x1"), term(1.0, "x2")]);
        assert_eq!(terms(&cap.rhs), vec![(4.0, None)]);

        let second = &model.constraints[1];
        assert_eq!(second.name, None);
        assert_eq!(terms(&second.lhs), vec![term(1.0, "x1"), term(3.0, "x2")]);
    }

    #[test]
    fn test_signs_and_relations() {
        let source = "min: -x1 + - 2 x2 - 3\nst\nx1 - x2 >= -2\n2 x1 == 4\nx2 => .5";
        let model = Parser::parse(source).unwrap();

        assert_eq!(model.objective.sense, Sense::Minimize);
        assert_eq!(
            terms(&model.objective.expr),
            vec![term(-1.0, "x1"), term(-2.0, "x2"), (-3.0, None)]
        );
        assert_eq!(model.constraints[0].relation, Relation::GreaterEq);
        assert_eq!(terms(&model.constraints[0].rhs), vec![(-2.0, None)]);
        assert_eq!(model.constraints[1].relation, Relation::Equal);
        assert_eq!(model.constraints[2].relation, Relation::GreaterEq);
        assert_eq!(terms(&model.constraints[2].rhs), vec![(0.5, None)]);
    }

    #[test]
    fn test_s_dot_t_header() {
        let model = Parser::parse("max x\ns.t.\nx <= 3").unwrap();
        assert_eq!(model.constraints.len(), 1);
    }

    #[test]
    fn test_header_is_optional() {
        let model = Parser::parse("max x + y\nx + y <= 3\n").unwrap();
        assert_eq!(model.constraints.len(), 1);
    }

    #[test]
    fn test_continuation_line() {
        let model = Parser::parse("max x + y\nx +\n  y <= 3").unwrap();
        assert_eq!(terms(&model.constraints[0].lhs), vec![term(1.0, "x"), term(1.0, "y")]);
    }

    #[test]
    fn test_missing_objective() {
        let err = Parser::parse("x + y <= 3").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_missing_relation() {
        let err = Parser::parse("max x\nx + y 3").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, span, .. } => {
                assert_eq!(expected, "<=, >= or =");
                assert_eq!(span, Span::new(12, 13));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_truncated_constraint() {
        assert_eq!(Parser::parse("max x\nx <=").unwrap_err(), ParseError::UnexpectedEof);
    }

    #[test]
    fn test_strict_inequality_rejected() {
        assert!(Parser::parse("max x\nx < 3").is_err());
    }
}
