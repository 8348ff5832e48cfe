// ABOUTME: Recursive descent parser turning the token stream into a Program AST

use crate::ast::{BinOp, Expr, ExprKind, Lit, Program, Stmt, StmtKind, TypeHint, UnOp};
use crate::error::HexError;
use crate::token::{Token, TokenKind, TokenValue};

/// Parses tokens into an AST. One token of lookahead, no backtracking.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    /// Parse the whole token stream into a `Program`.
    pub fn parse(mut self) -> Result<Program, HexError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            self.skip_newlines();
            if !self.is_at_end() {
                statements.push(self.statement()?);
            }
        }
        Ok(Program { statements })
    }

    // ============ Statements ============

    fn statement(&mut self) -> Result<Stmt, HexError> {
        self.skip_newlines();

        if self.check(TokenKind::Conjure) || self.check(TokenKind::Summon) {
            return self.var_declaration();
        }
        if self.check(TokenKind::Const) {
            return self.const_declaration();
        }
        if self.check(TokenKind::Transmute) {
            return self.var_assignment();
        }
        if self.check(TokenKind::Vanquish) {
            return self.var_delete();
        }
        if self.check(TokenKind::Spell) || self.check(TokenKind::Incantation) {
            return self.spell_declaration();
        }
        if self.check(TokenKind::Cast) {
            return self.cast_statement();
        }
        if self.check(TokenKind::Prophecy) {
            return self.if_statement();
        }
        if self.check(TokenKind::Patrol) {
            return self.while_statement();
        }
        if self.check(TokenKind::Hunt) {
            return self.for_statement();
        }
        if self.check(TokenKind::Break) {
            let token = self.advance();
            return Ok(Stmt::new(StmtKind::Break, token.line, token.column));
        }
        if self.check(TokenKind::Continue) {
            let token = self.advance();
            return Ok(Stmt::new(StmtKind::Continue, token.line, token.column));
        }

        self.expression_statement()
    }

    /// conjure/summon NAME as [type] EXPR
    fn var_declaration(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        let name = self
            .consume(TokenKind::Identifier, "Expected variable name")?
            .text();
        self.consume(TokenKind::As, "Expected 'as' after variable name")?;

        let type_hint = self.match_type_keyword();
        let value = self.expression()?;

        Ok(Stmt::new(
            StmtKind::VarDecl {
                name,
                type_hint,
                value,
                is_const: false,
            },
            line,
            column,
        ))
    }

    /// const prophecy NAME as EXPR
    fn const_declaration(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        self.consume(TokenKind::Prophecy, "Expected 'prophecy' after 'const'")?;
        let name = self
            .consume(TokenKind::Identifier, "Expected constant name")?
            .text();
        self.consume(TokenKind::As, "Expected 'as' after constant name")?;
        let value = self.expression()?;

        Ok(Stmt::new(
            StmtKind::VarDecl {
                name,
                type_hint: None,
                value,
                is_const: true,
            },
            line,
            column,
        ))
    }

    /// transmute NAME as EXPR, or transmute COLLECTION[INDEX] as EXPR
    fn var_assignment(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        // The target is a full call chain so indexed and nested targets work
        let target = self.call_expr()?;
        self.consume(TokenKind::As, "Expected 'as' after assignment target")?;
        let value = self.expression()?;

        match target.kind {
            ExprKind::Identifier(name) => {
                Ok(Stmt::new(StmtKind::Assign { name, value }, line, column))
            }
            ExprKind::Index { collection, index } => Ok(Stmt::new(
                StmtKind::IndexAssign {
                    collection: *collection,
                    index: *index,
                    value,
                },
                line,
                column,
            )),
            _ => Err(HexError::miscast("Invalid assignment target", line, column)),
        }
    }

    /// vanquish NAME
    fn var_delete(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let name = self
            .consume(TokenKind::Identifier, "Expected variable name to vanquish")?
            .text();
        Ok(Stmt::new(
            StmtKind::Delete { name },
            token.line,
            token.column,
        ))
    }

    /// spell/incantation NAME(PARAMS) { BODY }
    fn spell_declaration(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let auto_speak = token.kind == TokenKind::Incantation;
        let (line, column) = (token.line, token.column);

        let name = self
            .consume(TokenKind::Identifier, "Expected spell name")?
            .text();
        self.consume(TokenKind::LParen, "Expected '(' after spell name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(
                self.consume(TokenKind::Identifier, "Expected parameter name")?
                    .text(),
            );
            while self.match_kind(TokenKind::Comma) {
                params.push(
                    self.consume(TokenKind::Identifier, "Expected parameter name")?
                        .text(),
                );
            }
        }
        self.consume(TokenKind::RParen, "Expected ')' after parameters")?;

        let body = self.block()?;

        Ok(Stmt::new(
            StmtKind::SpellDecl {
                name,
                params,
                body,
                auto_speak,
            },
            line,
            column,
        ))
    }

    /// cast [EXPR]
    fn cast_statement(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let value = if self.check(TokenKind::Newline)
            || self.check(TokenKind::Eof)
            || self.check(TokenKind::RBrace)
        {
            None
        } else {
            Some(self.expression()?)
        };
        Ok(Stmt::new(StmtKind::Cast(value), token.line, token.column))
    }

    /// prophecy reveals COND { } [otherwise prophecy COND { }]* [fate decrees { }]
    fn if_statement(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        self.consume(TokenKind::Reveals, "Expected 'reveals' after 'prophecy'")?;
        let cond = self.expression()?;
        let then_branch = self.block()?;

        let mut elif_branches = Vec::new();
        let mut else_branch = None;

        loop {
            self.skip_newlines();
            if self.check(TokenKind::Otherwise) {
                self.advance();
                self.consume(TokenKind::Prophecy, "Expected 'prophecy' after 'otherwise'")?;
                let elif_cond = self.expression()?;
                let elif_body = self.block()?;
                elif_branches.push((elif_cond, elif_body));
            } else if self.check(TokenKind::Fate) {
                self.advance();
                self.consume(TokenKind::Decrees, "Expected 'decrees' after 'fate'")?;
                else_branch = Some(self.block()?);
                break;
            } else {
                break;
            }
        }

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                elif_branches,
                else_branch,
            },
            line,
            column,
        ))
    }

    /// patrol until COND { BODY }
    fn while_statement(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        self.consume(TokenKind::Until, "Expected 'until' after 'patrol'")?;
        let cond = self.expression()?;
        let body = self.block()?;

        Ok(Stmt::new(StmtKind::While { cond, body }, line, column))
    }

    /// hunt each NAME in EXPR { BODY }
    fn for_statement(&mut self) -> Result<Stmt, HexError> {
        let token = self.advance();
        let (line, column) = (token.line, token.column);

        self.consume(TokenKind::Each, "Expected 'each' after 'hunt'")?;
        let var = self
            .consume(TokenKind::Identifier, "Expected loop variable")?
            .text();
        self.consume(TokenKind::In, "Expected 'in' after loop variable")?;
        let iterable = self.expression()?;
        let body = self.block()?;

        Ok(Stmt::new(
            StmtKind::For {
                var,
                iterable,
                body,
            },
            line,
            column,
        ))
    }

    fn expression_statement(&mut self) -> Result<Stmt, HexError> {
        let expr = self.expression()?;
        let (line, column) = (expr.line, expr.column);
        Ok(Stmt::new(StmtKind::Expr(expr), line, column))
    }

    /// A brace-delimited statement list.
    fn block(&mut self) -> Result<Vec<Stmt>, HexError> {
        let mut statements = Vec::new();

        self.skip_newlines();
        self.consume(TokenKind::LBrace, "Expected '{' to begin block")?;

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            self.skip_newlines();
            if self.check(TokenKind::RBrace) {
                break;
            }
            statements.push(self.statement()?);
            self.skip_newlines();
        }

        self.consume(TokenKind::RBrace, "Expected '}' to end block")?;
        Ok(statements)
    }

    // ============ Expressions ============

    fn expression(&mut self) -> Result<Expr, HexError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, HexError> {
        let mut left = self.and_expr()?;
        while self.match_kind(TokenKind::Or) {
            let right = self.and_expr()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, HexError> {
        let mut left = self.not_expr()?;
        while self.match_kind(TokenKind::And) {
            let right = self.not_expr()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, HexError> {
        if self.match_kind(TokenKind::Not) {
            let token = self.previous().clone();
            let operand = self.not_expr()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                token.line,
                token.column,
            ));
        }
        self.comparison()
    }

    /// Left-associative and chainable: `a is b is c` is `(a is b) is c`.
    fn comparison(&mut self) -> Result<Expr, HexError> {
        let mut left = self.term()?;

        loop {
            let op = if self.match_kind(TokenKind::Is) {
                BinOp::Is
            } else if self.match_kind(TokenKind::Isnt) {
                BinOp::Isnt
            } else if self.match_kind(TokenKind::Exceeds) {
                BinOp::Exceeds
            } else if self.match_kind(TokenKind::Under) {
                BinOp::Under
            } else if self.match_kind(TokenKind::Atleast) {
                BinOp::Atleast
            } else if self.match_kind(TokenKind::Atmost) {
                BinOp::Atmost
            } else {
                break;
            };
            let right = self.term()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, HexError> {
        let mut left = self.factor()?;
        loop {
            let op = if self.match_kind(TokenKind::Plus) {
                BinOp::Add
            } else if self.match_kind(TokenKind::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.factor()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Expr, HexError> {
        let mut left = self.power()?;
        loop {
            let op = if self.match_kind(TokenKind::Star) {
                BinOp::Mul
            } else if self.match_kind(TokenKind::Slash) {
                BinOp::Div
            } else if self.match_kind(TokenKind::Percent) {
                BinOp::Rem
            } else {
                break;
            };
            let right = self.power()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// Right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`.
    fn power(&mut self) -> Result<Expr, HexError> {
        let left = self.unary()?;
        if self.match_kind(TokenKind::Power) {
            let right = self.power()?;
            return Ok(binary(BinOp::Pow, left, right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, HexError> {
        if self.match_kind(TokenKind::Minus) {
            let token = self.previous().clone();
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                },
                token.line,
                token.column,
            ));
        }
        self.call_expr()
    }

    /// Postfix chain: calls, index accesses, and member accesses.
    fn call_expr(&mut self) -> Result<Expr, HexError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.expression()?);
                    while self.match_kind(TokenKind::Comma) {
                        args.push(self.expression()?);
                    }
                }
                self.consume(TokenKind::RParen, "Expected ')' after arguments")?;
                let (line, column) = (expr.line, expr.column);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    line,
                    column,
                );
            } else if self.match_kind(TokenKind::LBracket) {
                let index = self.expression()?;
                self.consume(TokenKind::RBracket, "Expected ']' after index")?;
                let (line, column) = (expr.line, expr.column);
                expr = Expr::new(
                    ExprKind::Index {
                        collection: Box::new(expr),
                        index: Box::new(index),
                    },
                    line,
                    column,
                );
            } else if self.match_kind(TokenKind::Dot) {
                let field = self
                    .consume(TokenKind::Identifier, "Expected member name after '.'")?
                    .text();
                let (line, column) = (expr.line, expr.column);
                expr = Expr::new(
                    ExprKind::Member {
                        target: Box::new(expr),
                        field,
                    },
                    line,
                    column,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, HexError> {
        let token = self.peek().clone();
        let (line, column) = (token.line, token.column);

        // Plain literals
        if self.match_kind(TokenKind::Integer) {
            return Ok(literal(Lit::Int(self.int_value()), line, column));
        }
        if self.match_kind(TokenKind::Float) {
            return Ok(literal(Lit::Float(self.float_value()), line, column));
        }
        if self.match_kind(TokenKind::Str) {
            let text = self.previous().text();
            return Ok(literal(Lit::Str(text), line, column));
        }
        if self.match_kind(TokenKind::True) {
            return Ok(literal(Lit::Bool(true), line, column));
        }
        if self.match_kind(TokenKind::False) {
            return Ok(literal(Lit::Bool(false), line, column));
        }
        if self.match_kind(TokenKind::Void) {
            return Ok(literal(Lit::Void, line, column));
        }

        // Typed literal prefixes
        if self.match_kind(TokenKind::Scroll) {
            let val = self.consume(TokenKind::Str, "Expected string after 'scroll'")?;
            let text = val.text();
            return Ok(literal(Lit::Str(text), line, column));
        }
        if self.match_kind(TokenKind::Rune) {
            self.consume(TokenKind::Integer, "Expected integer after 'rune'")?;
            return Ok(literal(Lit::Int(self.int_value()), line, column));
        }
        if self.match_kind(TokenKind::Potion) {
            // An integer after 'potion' widens to a float
            if self.check(TokenKind::Float) {
                self.advance();
                return Ok(literal(Lit::Float(self.float_value()), line, column));
            }
            self.consume(TokenKind::Integer, "Expected number after 'potion'")?;
            return Ok(literal(Lit::Float(self.int_value() as f64), line, column));
        }
        if self.match_kind(TokenKind::Charm) {
            if self.match_kind(TokenKind::True) {
                return Ok(literal(Lit::Bool(true), line, column));
            }
            if self.match_kind(TokenKind::False) {
                return Ok(literal(Lit::Bool(false), line, column));
            }
            return Err(HexError::miscast(
                "Expected 'true' or 'false' after 'charm'",
                line,
                column,
            ));
        }

        // tome [ ... ] and bare [ ... ]
        if self.match_kind(TokenKind::Tome) {
            self.consume(TokenKind::LBracket, "Expected '[' after 'tome'")?;
            return self.tome_literal(line, column);
        }
        if self.match_kind(TokenKind::LBracket) {
            return self.tome_literal(line, column);
        }

        // grimoire { ... } and bare { ... }
        if self.match_kind(TokenKind::Grimoire) {
            self.consume(TokenKind::LBrace, "Expected '{' after 'grimoire'")?;
            return self.grimoire_literal(line, column);
        }
        if self.match_kind(TokenKind::LBrace) {
            return self.grimoire_literal(line, column);
        }

        if self.match_kind(TokenKind::Identifier) {
            let name = self.previous().text();
            return Ok(Expr::new(ExprKind::Identifier(name), line, column));
        }

        if self.match_kind(TokenKind::LParen) {
            let expr = self.expression()?;
            self.consume(TokenKind::RParen, "Expected ')' after expression")?;
            return Ok(expr);
        }

        Err(HexError::miscast(
            format!("Unexpected token: {:?}", token.kind),
            line,
            column,
        ))
    }

    /// Elements after the opening bracket; a trailing comma is allowed.
    fn tome_literal(&mut self, line: u32, column: u32) -> Result<Expr, HexError> {
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            elements.push(self.expression()?);
            while self.match_kind(TokenKind::Comma) {
                if self.check(TokenKind::RBracket) {
                    break;
                }
                elements.push(self.expression()?);
            }
        }
        self.consume(TokenKind::RBracket, "Expected ']' after list elements")?;
        Ok(Expr::new(ExprKind::TomeLit(elements), line, column))
    }

    /// Pairs after the opening brace; a trailing comma is allowed.
    fn grimoire_literal(&mut self, line: u32, column: u32) -> Result<Expr, HexError> {
        let mut pairs = Vec::new();
        if !self.check(TokenKind::RBrace) {
            pairs.push(self.grimoire_pair()?);
            while self.match_kind(TokenKind::Comma) {
                if self.check(TokenKind::RBrace) {
                    break;
                }
                pairs.push(self.grimoire_pair()?);
            }
        }
        self.consume(TokenKind::RBrace, "Expected '}' after dictionary")?;
        Ok(Expr::new(ExprKind::GrimoireLit(pairs), line, column))
    }

    fn grimoire_pair(&mut self) -> Result<(Expr, Expr), HexError> {
        let key = self.expression()?;
        self.consume(TokenKind::Colon, "Expected ':' after dictionary key")?;
        let value = self.expression()?;
        Ok((key, value))
    }

    // ============ Helpers ============

    fn int_value(&self) -> i64 {
        match self.previous().value {
            TokenValue::Int(n) => n,
            _ => 0,
        }
    }

    fn float_value(&self) -> f64 {
        match self.previous().value {
            TokenValue::Float(n) => n,
            _ => 0.0,
        }
    }

    fn match_type_keyword(&mut self) -> Option<TypeHint> {
        let hint = match self.peek().kind {
            TokenKind::Scroll => TypeHint::Scroll,
            TokenKind::Rune => TypeHint::Rune,
            TokenKind::Potion => TypeHint::Potion,
            TokenKind::Charm => TypeHint::Charm,
            TokenKind::Tome => TypeHint::Tome,
            TokenKind::Grimoire => TypeHint::Grimoire,
            _ => return None,
        };
        self.advance();
        Some(hint)
    }

    fn skip_newlines(&mut self) {
        while self.match_kind(TokenKind::Newline) {}
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, HexError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek();
        Err(HexError::miscast(message, token.line, token.column))
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let (line, column) = (left.line, left.column);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
        column,
    )
}

fn literal(lit: Lit, line: u32, column: u32) -> Expr {
    Expr::new(ExprKind::Literal(lit), line, column)
}
