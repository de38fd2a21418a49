use ecow::EcoString;
use tracing::{debug, warn};

use super::ast::*;
use super::{ParseError, ParseErrorKind, Token, TokenKind, tokenize};

/// Result of parsing a whole source text.
#[derive(Debug, Default)]
pub struct Parsed {
    pub statements: Vec<Stmt>,
    /// Lexical and syntax errors, in source order. Each one caused the
    /// enclosing declaration to be dropped.
    pub errors: Vec<ParseError>,
}

impl Parsed {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses `source` into top-level statements, recovering from errors.
pub fn parse(source: &str) -> Parsed {
    let (tokens, mut errors) = tokenize(source);
    let mut parser = Parser::new(tokens);
    let statements = parser.program();
    errors.append(&mut parser.errors);
    errors.sort_by_key(|e| e.span.0.start);
    for error in &errors {
        warn!(%error, "recovered from parse error");
    }
    debug!(statements = statements.len(), errors = errors.len(), "parsed source");
    Parsed { statements, errors }
}

type PResult<T> = Result<T, ParseError>;

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    current: usize,
    /// Nesting of `{ ... }` statement blocks currently open.
    block_depth: usize,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    fn new(tokens: Vec<Token<'src>>) -> Self {
        Self {
            tokens,
            current: 0,
            block_depth: 0,
            errors: Vec::new(),
        }
    }

    fn program(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let start = self.current;
        let result = if self.matches(TokenKind::Interface) {
            self.interface_declaration()
        } else if self.check(TokenKind::Class) && self.peek_next().is_some_and(Token::is_name) {
            self.advance();
            self.class_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.errors.push(error);
                self.synchronize(start);
                None
            }
        }
    }

    /// Skips to the next likely statement boundary after an error.
    ///
    /// Stops before a statement keyword, before a `}` that closes an
    /// enclosing block, or just after a `}` at the top level.
    fn synchronize(&mut self, start: usize) {
        if self.current == start {
            self.advance();
        }
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Method
                | TokenKind::If
                | TokenKind::Loop
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::Interface => return,
                TokenKind::RBrace if self.block_depth > 0 => return,
                TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // === Declarations ===

    fn interface_declaration(&mut self) -> PResult<Stmt> {
        let name = self.name("Expect interface name")?;
        self.consume(TokenKind::LBrace, "Expect '{' before interface body")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if !self.matches(TokenKind::Method) {
                return Err(self.error_at_current("Interfaces can only contain methods"));
            }
            let (return_type, method_name, params) = self.signature()?;
            methods.push(Function {
                name: method_name,
                params,
                body: Vec::new(),
                return_type,
                visibility: None,
                is_static: false,
            });
        }
        self.consume(TokenKind::RBrace, "Expect '}' after interface body")?;
        Ok(Stmt::Class(Class {
            name,
            superclass: None,
            methods,
            fields: Vec::new(),
            interfaces: Vec::new(),
            is_interface: true,
        }))
    }

    fn class_declaration(&mut self) -> PResult<Stmt> {
        let name = self.name("Expect class name")?;
        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.matches(TokenKind::Extends) {
            superclass = Some(self.name("Expect superclass or interface name")?);
            while self.matches(TokenKind::Comma) {
                interfaces.push(self.name("Expect interface name")?);
            }
        }

        self.consume(TokenKind::LBrace, "Expect '{' before class body")?;
        let mut methods = Vec::new();
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let (visibility, is_static) = self.modifiers();
            if self.matches(TokenKind::Method) {
                methods.push(self.method(visibility, is_static)?);
            } else if self.check(TokenKind::Number) {
                fields.push(self.var_declaration(visibility, is_static)?);
            } else {
                return Err(self.error_at_current("Expect method or field declaration"));
            }
        }
        self.consume(TokenKind::RBrace, "Expect '}' after class body")?;

        Ok(Stmt::Class(Class {
            name,
            superclass,
            methods,
            fields,
            interfaces,
            is_interface: false,
        }))
    }

    /// Member modifiers in any order, each at most once.
    fn modifiers(&mut self) -> (Option<Visibility>, bool) {
        let mut visibility = None;
        let mut is_static = false;
        loop {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Public | TokenKind::Private if visibility.is_none() => {
                    self.advance();
                    visibility = Some(if kind == TokenKind::Private {
                        Visibility::Private
                    } else {
                        Visibility::Public
                    });
                }
                TokenKind::Static if !is_static => {
                    self.advance();
                    is_static = true;
                }
                _ => return (visibility, is_static),
            }
        }
    }

    fn method(&mut self, visibility: Option<Visibility>, is_static: bool) -> PResult<Function> {
        let (return_type, name, params) = self.signature()?;
        self.consume(TokenKind::LBrace, "Expect '{' before method body")?;
        let body = self.block()?;
        Ok(Function {
            name,
            params,
            body,
            return_type,
            visibility,
            is_static,
        })
    }

    /// `TYPE name(TYPE param, ...)`, shared by methods and interface members.
    fn signature(&mut self) -> PResult<(TypeCode, EcoString, Vec<VarDecl>)> {
        let return_type = self.type_code("Expect return type code")?;
        let name = self.name("Expect method name")?;
        self.consume(TokenKind::LParen, "Expect '(' after method name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let type_code = self.type_code("Expect parameter type code")?;
                let name = self.name("Expect parameter name")?;
                params.push(VarDecl {
                    type_code,
                    name,
                    initializer: None,
                    visibility: None,
                    is_static: false,
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "Expect ')' after parameters")?;
        Ok((return_type, name, params))
    }

    fn var_declaration(
        &mut self,
        visibility: Option<Visibility>,
        is_static: bool,
    ) -> PResult<VarDecl> {
        let type_code = self.type_code("Expect type code")?;
        let name = self.name("Expect variable name")?;
        let initializer = if self.matches(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(VarDecl {
            type_code,
            name,
            initializer,
            visibility,
            is_static,
        })
    }

    // === Statements ===

    fn statement(&mut self) -> PResult<Stmt> {
        match self.peek().kind {
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::Return => {
                self.advance();
                Ok(self.return_statement())
            }
            TokenKind::Loop => {
                self.advance();
                self.loop_statement()
            }
            TokenKind::Try => {
                self.advance();
                self.try_statement()
            }
            TokenKind::LBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            TokenKind::Number => Ok(Stmt::Var(self.var_declaration(None, false)?)),
            _ => Ok(Stmt::Expression(self.expression()?)),
        }
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'i'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after if condition")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn loop_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'l'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after loop condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::Loop { condition, body })
    }

    fn try_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LBrace, "Expect '{' before try block")?;
        let body = self.block()?;
        self.consume(TokenKind::Handle, "Expect 'h' after try block")?;
        self.consume(TokenKind::LParen, "Expect '(' after 'h'")?;
        let error_type = self.type_code("Expect exception type code")?;
        let binding = self.name("Expect exception variable name")?;
        self.consume(TokenKind::RParen, "Expect ')' after exception binding")?;
        self.consume(TokenKind::LBrace, "Expect '{' before handle block")?;
        let handler = self.block()?;
        Ok(Stmt::Try {
            body,
            error_type,
            binding,
            handler,
        })
    }

    /// The value is optional: a `}` or anything that does not parse as an
    /// expression ends the statement.
    fn return_statement(&mut self) -> Stmt {
        if self.check(TokenKind::RBrace) {
            return Stmt::Return(None);
        }
        let checkpoint = self.current;
        match self.expression() {
            Ok(value) => Stmt::Return(Some(value)),
            Err(_) => {
                self.current = checkpoint;
                Stmt::Return(None)
            }
        }
    }

    /// Statements up to and including the closing `}`.
    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.block_depth += 1;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.block_depth -= 1;
        self.consume(TokenKind::RBrace, "Expect '}' after block")?;
        Ok(statements)
    }

    // === Expressions ===

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let target = self.or_expr()?;
        if !self.check(TokenKind::Equal) {
            return Ok(target);
        }
        let equals = self.advance().clone();
        let value = Box::new(self.assignment()?);
        match target {
            Expr::Variable(name) => Ok(Expr::Assign { name, value }),
            Expr::Get { object, name } => Ok(Expr::Set {
                object,
                name,
                value,
            }),
            Expr::Index { object, index } => Ok(Expr::IndexSet {
                object,
                index,
                value,
            }),
            _ => Err(ParseError::new(
                ParseErrorKind::InvalidAssignmentTarget,
                equals.span,
                equals.line,
            )),
        }
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        let mut expr = self.and_expr()?;
        while self.matches(TokenKind::OrOr) {
            let right = self.and_expr()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(TokenKind::AndAnd) {
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::EqualEqual => Some(BinaryOp::Eq),
            TokenKind::BangEqual => Some(BinaryOp::Ne),
            _ => None,
        })
    }

    fn comparison(&mut self) -> PResult<Expr> {
        self.binary_level(Self::term, |kind| match kind {
            TokenKind::Greater => Some(BinaryOp::Gt),
            TokenKind::GreaterEqual => Some(BinaryOp::Ge),
            TokenKind::Less => Some(BinaryOp::Lt),
            TokenKind::LessEqual => Some(BinaryOp::Le),
            _ => None,
        })
    }

    fn term(&mut self) -> PResult<Expr> {
        self.binary_level(Self::factor, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn factor(&mut self) -> PResult<Expr> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> PResult<Expr>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> PResult<Expr> {
        let mut expr = operand(self)?;
        while let Some(op) = operator(self.peek().kind) {
            self.advance();
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::At => UnaryOp::At,
            _ => return self.call(),
        };
        self.advance();
        let operand = Box::new(self.unary()?);
        Ok(Expr::Unary { op, operand })
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(TokenKind::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.matches(TokenKind::Dot) {
                let name = self.name("Expect property name after '.'")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(TokenKind::LBracket) {
                let index = self.expression()?;
                self.consume(TokenKind::RBracket, "Expect ']' after index")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions after an opening `(`, through the `)`.
    fn arguments(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "Expect ')' after arguments")?;
        Ok(args)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = token
                    .number()
                    .ok_or_else(|| self.unexpected(&token, "Expect number"))?;
                Ok(Expr::Literal(Literal::Number(value)))
            }
            TokenKind::Str => {
                self.advance();
                let value = token.string().unwrap_or_default();
                Ok(Expr::Literal(Literal::Str(value)))
            }
            TokenKind::System => {
                self.advance();
                Ok(Expr::Variable(token.lexeme.into()))
            }
            TokenKind::New => {
                self.advance();
                let class = self.name("Expect class name after 'n'")?;
                let args = if self.matches(TokenKind::LParen) {
                    self.arguments()?
                } else {
                    Vec::new()
                };
                Ok(Expr::New { class, args })
            }
            _ if token.is_name() => {
                self.advance();
                Ok(Expr::Variable(token.lexeme.into()))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RBracket, "Expect ']' after list elements")?;
                Ok(Expr::List(elements))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        let key = self.expression()?;
                        self.consume(TokenKind::Colon, "Expect ':' after map key")?;
                        let value = self.expression()?;
                        entries.push((key, value));
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RBrace, "Expect '}' after map entries")?;
                Ok(Expr::Map(entries))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RParen, "Expect ')' after expression")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            _ => Err(self.unexpected(&token, "Expect expression")),
        }
    }

    // === Token helpers ===

    fn name(&mut self, expected: &'static str) -> PResult<EcoString> {
        if self.peek().is_name() {
            Ok(self.advance().lexeme.into())
        } else {
            Err(self.error_at_current(expected))
        }
    }

    fn type_code(&mut self, expected: &'static str) -> PResult<TypeCode> {
        let token = self.consume(TokenKind::Number, expected)?.clone();
        token
            .number()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u16::MAX))
            .map(|n| TypeCode(n as u16))
            .ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::InvalidTypeCode(token.lexeme.into()),
                    token.span.clone(),
                    token.line,
                )
            })
    }

    fn consume(&mut self, kind: TokenKind, expected: &'static str) -> PResult<&Token<'src>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(expected))
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// Consumes the current token and returns it. `Eof` is never consumed.
    fn advance(&mut self) -> &Token<'src> {
        let index = self.current;
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[index]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token<'src> {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.current + 1)
    }

    fn error_at_current(&self, expected: &'static str) -> ParseError {
        self.unexpected(self.peek(), expected)
    }

    fn unexpected(&self, token: &Token<'_>, expected: &'static str) -> ParseError {
        let found = match token.kind {
            TokenKind::Eof => EcoString::from("end of input"),
            _ => EcoString::from(token.lexeme),
        };
        ParseError::new(
            ParseErrorKind::UnexpectedToken { expected, found },
            token.span.clone(),
            token.line,
        )
    }
}
