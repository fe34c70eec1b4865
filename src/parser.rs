use std::fmt;

use crate::ast::{Assignment, BinaryOp, Block, Expr, Name, Program, Return, Statement, Tag, UnaryOp};
use crate::token::{BinaryOperation, Lang, Reserved, Span, Token, TokenKind, UnaryOperation};

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// A specific token category.
    Token(TokenKind),
    /// Any statement start.
    Statement,
    /// Any expression start.
    Expression,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(kind) => write!(f, "{kind}"),
            Self::Statement => write!(f, "statement"),
            Self::Expression => write!(f, "expression"),
        }
    }
}

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The next token matches no production expected here.
    UnexpectedToken {
        expected: Expected,
        found: TokenKind,
        lexeme: String,
    },
    /// Input ended in the middle of a construct.
    UnexpectedEof { expected: Expected },
    /// Tokens follow the end-of-input marker.
    TrailingTokens { found: TokenKind },
    /// Blocks, brackets, or operator chains nest past [`MAX_NESTING`].
    NestingTooDeep { limit: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                expected,
                found,
                lexeme,
            } => {
                write!(f, "expected {expected}, found {found} `{lexeme}`")
            }
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            Self::TrailingTokens { found } => {
                write!(f, "unexpected {found} after end of input")
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "nesting deeper than {limit} levels")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Deepest tree the parser builds. Counts blocks, brackets, calls,
/// prefix operators, and every link of a binary or member chain, so
/// later recursive passes over the tree stay bounded too.
pub const MAX_NESTING: usize = 256;

/// Parse a token stream into a `Program` AST.
///
/// The stream is expected to end with a single `Special::Eof`; a
/// missing EOF is treated as end of input.
///
/// # Errors
///
/// Returns `ParseError` on unexpected tokens, truncated input
/// (missing `END`, `)`, or `;`), tokens after EOF, or nesting past
/// [`MAX_NESTING`].
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while !self.at_end() {
            statements.push(self.parse_statement()?);
        }

        // skip the EOF itself
        self.pos += 1;
        if let Some(token) = self.tokens.get(self.pos) {
            return Err(ParseError {
                kind: ParseErrorKind::TrailingTokens { found: token.kind },
                span: token.span,
            });
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Reserved(Reserved::Begin)) => Ok(Statement::Block(self.parse_block()?)),
            Some(TokenKind::Reserved(Reserved::Name)) => Ok(Statement::Name(self.parse_name()?)),
            Some(TokenKind::Reserved(Reserved::Magic)) => {
                self.pos += 1;
                Ok(Statement::Assign(self.parse_assignment(Some(Tag::Magic))?))
            }
            Some(TokenKind::Reserved(Reserved::KeyProtected)) => {
                self.pos += 1;
                Ok(Statement::Assign(
                    self.parse_assignment(Some(Tag::KeyProtected))?,
                ))
            }
            Some(TokenKind::Reserved(Reserved::Return)) => {
                Ok(Statement::Return(self.parse_return()?))
            }
            Some(TokenKind::Word) => Ok(Statement::Assign(self.parse_assignment(None)?)),
            _ => Err(self.unexpected(Expected::Statement)),
        }
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.enter()?;
        self.expect(TokenKind::Reserved(Reserved::Begin))?;

        let mut statements = Vec::new();
        loop {
            if self.at_end() {
                return Err(self.unexpected(Expected::Token(TokenKind::Reserved(Reserved::End))));
            }
            if self.check(TokenKind::Reserved(Reserved::End)) {
                self.pos += 1;
                break;
            }
            statements.push(self.parse_statement()?);
        }

        // `END;` is accepted as well as a bare `END`
        if self.check(TokenKind::Lang(Lang::Semicolon)) {
            self.pos += 1;
        }
        self.depth -= 1;

        Ok(Block { statements })
    }

    fn parse_name(&mut self) -> Result<Name, ParseError> {
        self.expect(TokenKind::Reserved(Reserved::Name))?;
        if self.check(TokenKind::Lang(Lang::Colon)) {
            self.pos += 1;
        }
        let ident = self.expect_word()?;
        self.expect(TokenKind::Lang(Lang::Semicolon))?;
        Ok(Name { ident })
    }

    fn parse_assignment(&mut self, tag: Option<Tag>) -> Result<Assignment, ParseError> {
        let target = self.expect_word()?;
        self.expect(TokenKind::Lang(Lang::Assign))?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Lang(Lang::Semicolon))?;
        Ok(Assignment { target, value, tag })
    }

    fn parse_return(&mut self) -> Result<Return, ParseError> {
        self.expect(TokenKind::Reserved(Reserved::Return))?;
        let value = if self.check(TokenKind::Lang(Lang::Semicolon)) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Lang(Lang::Semicolon))?;
        Ok(Return { value })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_term()?;
        while let Some(op) = self.binary_op(1) {
            self.enter()?;
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.binary_op(2) {
            self.enter()?;
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = depth;
        Ok(lhs)
    }

    /// Prefix position: `+` and `-` become unary here.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            Some(
                TokenKind::BinaryOperation(BinaryOperation::Plus)
                | TokenKind::UnaryOperation(UnaryOperation::Plus),
            ) => UnaryOp::Plus,
            Some(
                TokenKind::BinaryOperation(BinaryOperation::Minus)
                | TokenKind::UnaryOperation(UnaryOperation::Minus),
            ) => UnaryOp::Minus,
            Some(TokenKind::UnaryOperation(UnaryOperation::Not)) => UnaryOp::Not,
            Some(TokenKind::UnaryOperation(UnaryOperation::Fill)) => UnaryOp::Fill,
            _ => return self.parse_postfix(),
        };
        self.enter()?;
        self.pos += 1;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;
        while self.check(TokenKind::Lang(Lang::Dot)) {
            self.enter()?;
            self.pos += 1;
            let field = self.expect_word()?;
            expr = Expr::Member {
                base: Box::new(expr),
                field,
            };
        }
        self.depth = depth;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().filter(|t| !t.is_eof()) else {
            return Err(self.unexpected(Expected::Expression));
        };

        match token.kind {
            TokenKind::Number(_) => {
                let Some(value) = token.value else {
                    return Err(self.unexpected(Expected::Expression));
                };
                self.pos += 1;
                Ok(Expr::Literal(value))
            }
            TokenKind::Word => {
                let ident = token.text.clone();
                self.pos += 1;
                if self.check(TokenKind::Lang(Lang::LeftBracket)) {
                    self.enter()?;
                    self.pos += 1;
                    let args = self.parse_arguments()?;
                    self.depth -= 1;
                    Ok(Expr::Call {
                        callee: ident,
                        args,
                    })
                } else {
                    Ok(Expr::Identifier(ident))
                }
            }
            TokenKind::Lang(Lang::LeftBracket) => {
                self.enter()?;
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::Lang(Lang::RightBracket))?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => Err(self.unexpected(Expected::Expression)),
        }
    }

    /// Arguments after an opening bracket, through the closing one.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::Lang(Lang::RightBracket)) {
            loop {
                args.push(self.parse_expr()?);
                if !self.check(TokenKind::Lang(Lang::Comma)) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.expect(TokenKind::Lang(Lang::RightBracket))?;
        Ok(args)
    }

    /// Infix operator at the given precedence level, if next.
    fn binary_op(&self, precedence: u8) -> Option<BinaryOp> {
        let op = match self.peek_kind()? {
            TokenKind::BinaryOperation(BinaryOperation::Plus) => BinaryOp::Add,
            TokenKind::BinaryOperation(BinaryOperation::Minus) => BinaryOp::Sub,
            TokenKind::BinaryOperation(BinaryOperation::Mul) => BinaryOp::Mul,
            TokenKind::BinaryOperation(BinaryOperation::Div) => BinaryOp::Div,
            _ => return None,
        };
        (op.precedence() == precedence).then_some(op)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at_end(&self) -> bool {
        self.peek().is_none_or(Token::is_eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.is(kind))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if token.is(kind) => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(Expected::Token(kind))),
        }
    }

    fn expect_word(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::Word).map(|t| t.text.clone())
    }

    /// Error for the current token, or `UnexpectedEof` at end of input.
    fn unexpected(&self, expected: Expected) -> ParseError {
        match self.peek() {
            Some(token) if !token.is_eof() => ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected,
                    found: token.kind,
                    lexeme: token.text.clone(),
                },
                span: token.span,
            },
            _ => ParseError {
                kind: ParseErrorKind::UnexpectedEof { expected },
                span: self.current_span(),
            },
        }
    }

    /// One more nesting level, or `NestingTooDeep` at the current token.
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError {
                kind: ParseErrorKind::NestingTooDeep { limit: MAX_NESTING },
                span: self.current_span(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn current_span(&self) -> Span {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(Span { line: 1, column: 1 }, |t| t.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::token::Literal;

    fn parse_input(input: &str) -> Result<Program, ParseError> {
        let tokens = tokenize(input.lines()).expect("tokenize failed");
        parse(&tokens)
    }

    fn int(value: i64) -> Expr {
        Expr::Literal(Literal::Integer(value))
    }

    fn value_of(program: &Program) -> &Expr {
        match &program.statements[0] {
            Statement::Assign(assignment) => &assignment.value,
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn block_with_assignment() {
        let program = parse_input("BEGIN x := 1 + 2; END").expect("parse failed");
        assert_eq!(program.statements.len(), 1);
        let Statement::Block(block) = &program.statements[0] else {
            panic!("expected block");
        };
        assert_eq!(
            block.statements,
            vec![Statement::Assign(Assignment {
                target: "x".to_string(),
                value: Expr::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(int(1)),
                    rhs: Box::new(int(2)),
                },
                tag: None,
            })]
        );
    }

    #[test]
    fn mul_binds_tighter_than_add() {
        let program = parse_input("x := 1 + 2 * 3;").expect("parse failed");
        assert_eq!(
            value_of(&program),
            &Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(int(1)),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(int(2)),
                    rhs: Box::new(int(3)),
                }),
            }
        );
    }

    #[test]
    fn binary_is_left_associative() {
        let program = parse_input("x := 8 - 4 - 2;").expect("parse failed");
        let Expr::Binary { op, lhs, rhs } = value_of(&program) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Sub);
        assert!(matches!(**lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(**rhs, int(2));
    }

    #[test]
    fn leading_minus_is_unary() {
        let program = parse_input("x := -1 - -2;").expect("parse failed");
        assert_eq!(
            value_of(&program),
            &Expr::Binary {
                op: BinaryOp::Sub,
                lhs: Box::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    operand: Box::new(int(1)),
                }),
                rhs: Box::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    operand: Box::new(int(2)),
                }),
            }
        );
    }

    #[test]
    fn unary_binds_tighter_than_mul() {
        let program = parse_input("x := ~a * b;").expect("parse failed");
        let Expr::Binary { op, lhs, .. } = value_of(&program) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(**lhs, Expr::Unary { op: UnaryOp::Fill, .. }));
    }

    #[test]
    fn brackets_override_precedence() {
        let program = parse_input("x := (1 + 2) * 3;").expect("parse failed");
        let Expr::Binary { op, lhs, .. } = value_of(&program) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(**lhs, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn call_and_member() {
        let program = parse_input("x := size(w, -h).width;").expect("parse failed");
        let Expr::Member { base, field } = value_of(&program) else {
            panic!("expected member");
        };
        assert_eq!(field, "width");
        let Expr::Call { callee, args } = &**base else {
            panic!("expected call");
        };
        assert_eq!(callee, "size");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn empty_call() {
        let program = parse_input("x := now();").expect("parse failed");
        assert_eq!(
            value_of(&program),
            &Expr::Call {
                callee: "now".to_string(),
                args: Vec::new(),
            }
        );
    }

    #[test]
    fn name_with_and_without_colon() {
        let program = parse_input("NAME: WindowServer;\nNAME Other;").expect("parse failed");
        assert_eq!(
            program.statements,
            vec![
                Statement::Name(Name {
                    ident: "WindowServer".to_string()
                }),
                Statement::Name(Name {
                    ident: "Other".to_string()
                }),
            ]
        );
    }

    #[test]
    fn tagged_declarations() {
        let program =
            parse_input("MAGIC signature := 320;\nKEYPROTECTED token := seed * 7;")
                .expect("parse failed");
        let tags: Vec<_> = program
            .statements
            .iter()
            .map(|s| match s {
                Statement::Assign(a) => a.tag,
                _ => None,
            })
            .collect();
        assert_eq!(tags, vec![Some(Tag::Magic), Some(Tag::KeyProtected)]);
    }

    #[test]
    fn return_with_and_without_value() {
        let program = parse_input("BEGIN RETURN; RETURN x; END;").expect("parse failed");
        let Statement::Block(block) = &program.statements[0] else {
            panic!("expected block");
        };
        assert_eq!(
            block.statements,
            vec![
                Statement::Return(Return { value: None }),
                Statement::Return(Return {
                    value: Some(Expr::Identifier("x".to_string()))
                }),
            ]
        );
    }

    #[test]
    fn nested_blocks() {
        let program = parse_input("BEGIN\nBEGIN\na := 1;\nEND\nEND").expect("parse failed");
        let Statement::Block(outer) = &program.statements[0] else {
            panic!("expected block");
        };
        assert!(matches!(outer.statements[0], Statement::Block(_)));
    }

    #[test]
    fn empty_stream() {
        let program = parse(&[]).expect("parse failed");
        assert!(program.statements.is_empty());
        let program = parse_input("").expect("parse failed");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn missing_end_is_unexpected_eof() {
        let err = parse_input("BEGIN x := 1;").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedEof {
                expected: Expected::Token(TokenKind::Reserved(Reserved::End))
            }
        );
    }

    #[test]
    fn missing_bracket_is_unexpected_eof() {
        let err = parse_input("x := (1 + 2").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedEof {
                expected: Expected::Token(TokenKind::Lang(Lang::RightBracket))
            }
        );
    }

    #[test]
    fn missing_semicolon_reports_found_token() {
        let err = parse_input("x := 1\ny := 2;").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Token(TokenKind::Lang(Lang::Semicolon)),
                found: TokenKind::Word,
                lexeme: "y".to_string(),
            }
        );
        assert_eq!(err.span, Span { line: 2, column: 1 });
    }

    #[test]
    fn stray_end_is_not_a_statement() {
        let err = parse_input("END").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Statement,
                found: TokenKind::Reserved(Reserved::End),
                ..
            }
        ));
    }

    #[test]
    fn tokens_after_eof_are_rejected() {
        let mut tokens = tokenize(["a := 1;"]).expect("tokenize failed");
        let extra = tokens[0].clone();
        tokens.push(extra);
        let err = parse(&tokens).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::TrailingTokens {
                found: TokenKind::Word
            }
        );
    }

    #[test]
    fn error_display_includes_location() {
        let err = parse_input("x := ;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected expression, found ';' `;` at line 1, column 6"
        );
    }
}
