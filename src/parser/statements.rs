use tracing::trace;

use super::patterns::{CoverGrammar, TargetKind};
use super::scope::{BindingKind, ScopeFlags};
use super::{Label, LabelKind, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseResult};
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    /// StatementListItem: a statement or a declaration. At the top level of a
    /// module this also covers import and export declarations.
    pub(super) fn parse_statement_list_item(&mut self, ctx: Context) -> ParseResult<Statement> {
        trace!(offset = self.token.start, token = %self.token.token, "statement");
        match self.token.token {
            Token::Keyword(Keyword::Function) => {
                let start = self.token.start;
                let decl = self.parse_function_declaration(ctx, start, false, false)?;
                Ok(Statement::FunctionDeclaration(Box::new(decl)))
            }
            Token::Keyword(Keyword::Class) => {
                let decl = self.parse_class_declaration(ctx, false)?;
                Ok(Statement::ClassDeclaration(Box::new(decl)))
            }
            Token::Keyword(Keyword::Const) => self.parse_variable_statement(ctx, VariableKind::Const),
            Token::Keyword(Keyword::Let) if self.is_let_declaration()? => {
                self.parse_variable_statement(ctx, VariableKind::Let)
            }
            Token::Keyword(Keyword::Async) if self.is_async_function()? => {
                let start = self.token.start;
                self.advance()?; // async
                let decl = self.parse_function_declaration(ctx, start, true, false)?;
                Ok(Statement::FunctionDeclaration(Box::new(decl)))
            }
            Token::Keyword(Keyword::Import) if !self.is_import_call()? => {
                self.check_module_item(ctx)?;
                self.parse_import_declaration(ctx)
            }
            Token::Keyword(Keyword::Export) => {
                self.check_module_item(ctx)?;
                self.parse_export_declaration(ctx)
            }
            _ => self.parse_statement(ctx),
        }
    }

    fn check_module_item(&self, ctx: Context) -> ParseResult<()> {
        if !ctx.is_module() {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Cannot use import/export statements outside a module",
            ));
        }
        if !self.scope.at_top_level() {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "'import' and 'export' may only appear at the top level",
            ));
        }
        Ok(())
    }

    /// Whether the current `let` starts a lexical declaration.
    fn is_let_declaration(&self) -> ParseResult<bool> {
        let next = self.peek()?;
        Ok(match next.token {
            Token::LeftBracket | Token::LeftBrace | Token::Identifier(_) => true,
            Token::Keyword(kw) => !matches!(kw, Keyword::In | Keyword::Instanceof),
            _ => false,
        })
    }

    /// `async function` with no line break in between.
    pub(super) fn is_async_function(&self) -> ParseResult<bool> {
        let next = self.peek()?;
        Ok(next.token == Token::Keyword(Keyword::Function) && !next.newline_before())
    }

    /// `import(` or `import.`, which are expressions rather than declarations.
    fn is_import_call(&self) -> ParseResult<bool> {
        let next = self.peek()?;
        Ok(matches!(next.token, Token::LeftParen | Token::Dot))
    }

    /// Statement: everything that may appear where a declaration may not.
    pub(super) fn parse_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        self.nested(|p| p.parse_statement_nested(ctx))
    }

    /// The body of `if`, `with` or a loop, which may not be a labelled
    /// function declaration.
    fn parse_embedded_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let stmt = self.parse_statement(ctx)?;
        if let Some(pos) = labelled_function_start(&stmt) {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                pos,
                "Labelled function declarations cannot be the body of a statement",
            ));
        }
        Ok(stmt)
    }

    fn parse_statement_nested(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        match self.token.token {
            Token::LeftBrace => Ok(Statement::Block(self.parse_block(ctx)?)),
            Token::Semicolon => {
                self.advance()?;
                Ok(Statement::Empty(EmptyStatement {
                    span: self.span_from(start),
                }))
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(ctx, VariableKind::Var),
            Token::Keyword(Keyword::If) => self.parse_if_statement(ctx),
            Token::Keyword(Keyword::For) => self.parse_for_statement(ctx),
            Token::Keyword(Keyword::While) => self.parse_while_statement(ctx),
            Token::Keyword(Keyword::Do) => self.parse_do_while_statement(ctx),
            Token::Keyword(Keyword::Continue) => self.parse_break_continue(ctx, false),
            Token::Keyword(Keyword::Break) => self.parse_break_continue(ctx, true),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(ctx),
            Token::Keyword(Keyword::With) => self.parse_with_statement(ctx),
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement(ctx),
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement(ctx),
            Token::Keyword(Keyword::Try) => self.parse_try_statement(ctx),
            Token::Keyword(Keyword::Debugger) => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Statement::Debugger(DebuggerStatement {
                    span: self.span_from(start),
                }))
            }
            Token::Keyword(Keyword::Function) => Err(self.error(
                ErrorKind::UnexpectedToken,
                "Function declarations are not allowed in a single-statement context",
            )),
            Token::Keyword(Keyword::Class) => Err(self.error(
                ErrorKind::UnexpectedToken,
                "Class declaration cannot appear in a single-statement context",
            )),
            Token::Keyword(Keyword::Const) => Err(self.error(
                ErrorKind::UnexpectedToken,
                "Lexical declaration cannot appear in a single-statement context",
            )),
            Token::Keyword(Keyword::Let) if self.peek()?.token == Token::LeftBracket => Err(self.error(
                ErrorKind::UnexpectedToken,
                "Lexical declaration cannot appear in a single-statement context",
            )),
            Token::Keyword(Keyword::Async) if self.is_async_function()? => Err(self.error(
                ErrorKind::UnexpectedToken,
                "Async functions can only be declared at the top level or inside a block",
            )),
            Token::Keyword(Keyword::Import) if !self.is_import_call()? => Err(self.error(
                ErrorKind::UnexpectedToken,
                "'import' and 'export' may only appear at the top level",
            )),
            Token::Keyword(Keyword::Export) => Err(self.error(
                ErrorKind::UnexpectedToken,
                "'import' and 'export' may only appear at the top level",
            )),
            _ => self.parse_expression_or_labeled_statement(ctx),
        }
    }

    fn parse_expression_or_labeled_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        let maybe_label = self.identifier_text().is_some();
        let expression = self.parse_expression(ctx)?;

        if maybe_label && self.at(&Token::Colon) {
            if let Expression::Identifier(label) = expression {
                if label.span.start == start && !self.is_parenthesized(&label.span) {
                    return self.parse_labeled_statement(ctx, label, start);
                }
                return Err(self.unexpected());
            }
        }

        self.consume_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            directive: None,
            span: self.span_from(start),
        }))
    }

    fn parse_labeled_statement(&mut self, ctx: Context, label: Identifier, start: u32) -> ParseResult<Statement> {
        if self.labels.iter().any(|l| l.name == label.name) {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                label.span.start,
                format!("Label '{}' has already been declared", label.name),
            ));
        }
        self.advance()?; // :

        let kind = if matches!(
            self.token.token,
            Token::Keyword(Keyword::For | Keyword::While | Keyword::Do)
        ) {
            LabelKind::Loop
        } else {
            LabelKind::Other
        };
        // Labels stacked on the same statement share its kind.
        for outer in self.labels.iter_mut().rev() {
            if outer.statement_start != start {
                break;
            }
            outer.statement_start = self.token.start;
            outer.kind = kind;
        }
        self.labels.push(Label {
            name: label.name.clone(),
            kind,
            statement_start: self.token.start,
        });

        let body = if self.at_keyword(Keyword::Function) {
            if !ctx.allows_web_compat() {
                return Err(self.error(
                    ErrorKind::UnexpectedToken,
                    "Labelled function declarations are not allowed in strict mode",
                ));
            }
            let fn_start = self.token.start;
            let decl = self.parse_function_declaration(ctx, fn_start, false, false)?;
            if decl.generator {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    fn_start,
                    "Generators can only be declared at the top level or inside a block",
                ));
            }
            Statement::FunctionDeclaration(Box::new(decl))
        } else {
            self.parse_statement(ctx)?
        };
        self.labels.pop();

        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Box::new(body),
            span: self.span_from(start),
        }))
    }

    /// `{ ... }` in its own block scope.
    pub(super) fn parse_block(&mut self, ctx: Context) -> ParseResult<BlockStatement> {
        self.scope.enter(ScopeFlags::empty());
        let block = self.parse_block_body(ctx)?;
        self.scope.exit();
        Ok(block)
    }

    fn parse_block_body(&mut self, ctx: Context) -> ParseResult<BlockStatement> {
        let start = self.token.start;
        self.expect(&Token::LeftBrace)?;
        let mut body = Vec::new();
        while !self.eat(&Token::RightBrace)? {
            body.push(self.parse_statement_list_item(ctx)?);
        }
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    /// `( Expression )` as used by `if`, `while`, `with` and `switch`.
    fn parse_paren_expression(&mut self, ctx: Context) -> ParseResult<Expression> {
        self.expect(&Token::LeftParen)?;
        let expr = self.parse_expression(ctx)?;
        self.expect(&Token::RightParen)?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // if
        let test = self.parse_paren_expression(ctx)?;
        let consequent = Box::new(self.parse_if_branch(ctx)?);
        let alternate = if self.eat_keyword(Keyword::Else)? {
            Some(Box::new(self.parse_if_branch(ctx)?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    /// A branch of `if`. Sloppy web-compatible code may use a plain function
    /// declaration here, scoped as if wrapped in a block.
    fn parse_if_branch(&mut self, ctx: Context) -> ParseResult<Statement> {
        if !self.at_keyword(Keyword::Function) || !ctx.allows_web_compat() {
            return self.parse_embedded_statement(ctx);
        }
        let start = self.token.start;
        self.scope.enter(ScopeFlags::empty());
        let decl = self.parse_function_declaration(ctx, start, false, false)?;
        self.scope.exit();
        if decl.generator {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                start,
                "Generators can only be declared at the top level or inside a block",
            ));
        }
        Ok(Statement::FunctionDeclaration(Box::new(decl)))
    }

    fn parse_while_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // while
        let test = self.parse_paren_expression(ctx)?;
        let body = Box::new(self.parse_embedded_statement(ctx.with(Context::IN_ITERATION))?);
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // do
        let body = Box::new(self.parse_embedded_statement(ctx.with(Context::IN_ITERATION))?);
        self.expect_keyword(Keyword::While)?;
        let test = self.parse_paren_expression(ctx)?;
        // The semicolon after `do ... while (x)` is always optional.
        self.eat(&Token::Semicolon)?;
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_for_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // for
        let is_await = if self.at_keyword(Keyword::Await) && self.await_allowed(ctx) {
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(&Token::LeftParen)?;
        self.scope.enter(ScopeFlags::empty());
        let result = self.parse_for_head_and_body(ctx, start, is_await);
        self.scope.exit();
        result
    }

    fn parse_for_head_and_body(&mut self, ctx: Context, start: u32, is_await: bool) -> ParseResult<Statement> {
        let head_ctx = ctx.with(Context::DISALLOW_IN);

        if self.at(&Token::Semicolon) {
            if is_await {
                return Err(self.unexpected());
            }
            return self.parse_for_rest(ctx, start, None);
        }

        let declaration_kind = match self.token.token {
            Token::Keyword(Keyword::Var) => Some(VariableKind::Var),
            Token::Keyword(Keyword::Const) => Some(VariableKind::Const),
            Token::Keyword(Keyword::Let) if ctx.is_strict() || self.is_let_declaration()? => Some(VariableKind::Let),
            _ => None,
        };

        if let Some(kind) = declaration_kind {
            let decl_start = self.token.start;
            self.advance()?; // var / let / const
            let declarations = self.parse_variable_declarations(head_ctx, kind, true)?;
            let declaration = VariableDeclaration {
                declarations,
                kind,
                span: self.span_from(decl_start),
            };
            let is_of = self.at_keyword(Keyword::Of);
            if is_of || self.at_keyword(Keyword::In) {
                if is_await && !is_of {
                    return Err(self.unexpected());
                }
                self.check_for_in_of_declaration(ctx, &declaration, is_of)?;
                return self.parse_for_in_of(ctx, start, ForLeft::VariableDeclaration(declaration), is_of, is_await);
            }
            if is_await {
                return Err(self.unexpected());
            }
            for declarator in &declaration.declarations {
                if declarator.init.is_none() {
                    self.check_missing_initializer(kind, &declarator.id)?;
                }
            }
            return self.parse_for_rest(ctx, start, Some(ForInit::VariableDeclaration(declaration)));
        }

        let starts_with_let = self.at_keyword(Keyword::Let);
        let starts_with_async = self.at_keyword(Keyword::Async);
        let mut cover = CoverGrammar::default();
        let init = self.parse_expression_with(head_ctx, Some(&mut cover))?;
        let is_of = self.at_keyword(Keyword::Of);
        if is_of || self.at_keyword(Keyword::In) {
            if is_await && !is_of {
                return Err(self.unexpected());
            }
            if is_of && starts_with_let {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    init.span().start,
                    "The left-hand side of a for-of loop may not start with 'let'",
                ));
            }
            if is_of
                && !is_await
                && starts_with_async
                && matches!(&init, Expression::Identifier(id) if !self.is_parenthesized(&id.span))
            {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    init.span().start,
                    "The left-hand side of a for-of loop may not be 'async'",
                ));
            }
            self.check_pattern_errors(&cover)?;
            let left = self.to_pattern(init, TargetKind::Assignment, ctx)?;
            return self.parse_for_in_of(ctx, start, ForLeft::Pattern(left), is_of, is_await);
        }
        if is_await {
            return Err(self.unexpected());
        }
        self.check_expression_errors(&cover)?;
        self.parse_for_rest(ctx, start, Some(ForInit::Expression(init)))
    }

    /// A declaration heading `for-in`/`for-of` binds exactly one name and has
    /// no initializer, except the legacy `for (var x = 0 in y)`.
    fn check_for_in_of_declaration(
        &self,
        ctx: Context,
        declaration: &VariableDeclaration,
        is_of: bool,
    ) -> ParseResult<()> {
        let loop_kind = if is_of { "for-of" } else { "for-in" };
        if let Some(extra) = declaration.declarations.get(1) {
            return Err(self.error_at(
                ErrorKind::InvalidForHeadBinding,
                extra.span.start,
                format!("Invalid left-hand side in {loop_kind} loop: Must have a single binding."),
            ));
        }
        let Some(declarator) = declaration.declarations.first() else {
            return Ok(());
        };
        if let Some(init) = &declarator.init {
            let legacy = !is_of
                && declaration.kind == VariableKind::Var
                && matches!(declarator.id, Pattern::Identifier(_))
                && ctx.allows_web_compat();
            if !legacy {
                return Err(self.error_at(
                    ErrorKind::InvalidForHeadBinding,
                    init.span().start,
                    format!("{loop_kind} loop variable declaration may not have an initializer."),
                ));
            }
        }
        Ok(())
    }

    fn parse_for_in_of(
        &mut self,
        ctx: Context,
        start: u32,
        left: ForLeft,
        is_of: bool,
        is_await: bool,
    ) -> ParseResult<Statement> {
        self.advance()?; // in / of
        let right = if is_of {
            self.parse_assignment_expression(ctx)?
        } else {
            self.parse_expression(ctx)?
        };
        self.expect(&Token::RightParen)?;
        let body = Box::new(self.parse_embedded_statement(ctx.with(Context::IN_ITERATION))?);
        let span = self.span_from(start);
        Ok(if is_of {
            Statement::ForOf(ForOfStatement {
                left,
                right,
                body,
                is_await,
                span,
            })
        } else {
            Statement::ForIn(ForInStatement {
                left,
                right,
                body,
                span,
            })
        })
    }

    /// `; test ; update ) body` of a classic for loop.
    fn parse_for_rest(&mut self, ctx: Context, start: u32, init: Option<ForInit>) -> ParseResult<Statement> {
        self.expect(&Token::Semicolon)?;
        let test = if self.at(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.expect(&Token::Semicolon)?;
        let update = if self.at(&Token::RightParen) {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.expect(&Token::RightParen)?;
        let body = Box::new(self.parse_embedded_statement(ctx.with(Context::IN_ITERATION))?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_break_continue(&mut self, ctx: Context, is_break: bool) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // break / continue
        let label = if !self.can_insert_semicolon() && self.identifier_text().is_some() {
            Some(self.parse_identifier_reference(ctx)?)
        } else {
            None
        };

        match &label {
            None if is_break && !ctx.intersects(Context::IN_ITERATION | Context::IN_SWITCH) => {
                return Err(self.error_at(ErrorKind::UnexpectedToken, start, "Illegal break statement"));
            }
            None if !is_break && !ctx.contains(Context::IN_ITERATION) => {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    start,
                    "Illegal continue statement: no surrounding iteration statement",
                ));
            }
            None => {}
            Some(label) => match self.labels.iter().find(|l| l.name == label.name) {
                None => {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        label.span.start,
                        format!("Undefined label '{}'", label.name),
                    ));
                }
                Some(target) if !is_break && target.kind != LabelKind::Loop => {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        label.span.start,
                        format!(
                            "Illegal continue statement: '{}' does not denote an iteration statement",
                            label.name
                        ),
                    ));
                }
                Some(_) => {}
            },
        }

        self.consume_semicolon()?;
        let span = self.span_from(start);
        Ok(if is_break {
            Statement::Break(BreakStatement { label, span })
        } else {
            Statement::Continue(ContinueStatement { label, span })
        })
    }

    fn parse_return_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        if !ctx.contains(Context::IN_FUNCTION) {
            return Err(self.error(ErrorKind::UnexpectedToken, "Illegal return statement"));
        }
        self.advance()?; // return
        let argument = if self.at(&Token::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_with_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        if ctx.is_strict() {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Strict mode code may not include a with statement",
            ));
        }
        self.advance()?; // with
        let object = self.parse_paren_expression(ctx)?;
        let body = Box::new(self.parse_embedded_statement(ctx)?);
        Ok(Statement::With(WithStatement {
            object,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // switch
        let discriminant = self.parse_paren_expression(ctx)?;
        self.expect(&Token::LeftBrace)?;
        self.scope.enter(ScopeFlags::empty());
        let case_ctx = ctx.with(Context::IN_SWITCH);

        let mut cases = Vec::new();
        let mut has_default = false;
        while !self.eat(&Token::RightBrace)? {
            let case_start = self.token.start;
            let test = if self.eat_keyword(Keyword::Case)? {
                Some(self.parse_expression(ctx)?)
            } else if self.at_keyword(Keyword::Default) {
                if has_default {
                    return Err(self.error(ErrorKind::UnexpectedToken, "Multiple default clauses"));
                }
                has_default = true;
                self.advance()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(&Token::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.token.token,
                Token::Keyword(Keyword::Case | Keyword::Default) | Token::RightBrace
            ) {
                consequent.push(self.parse_statement_list_item(case_ctx)?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }

        self.scope.exit();
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.span_from(start),
        }))
    }

    fn parse_throw_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // throw
        if self.token.newline_before() {
            return Err(self.error_at(ErrorKind::UnexpectedToken, self.prev_end, "Illegal newline after throw"));
        }
        let argument = self.parse_expression(ctx)?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_try_statement(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // try
        let block = self.parse_block(ctx)?;

        let handler = if self.at_keyword(Keyword::Catch) {
            let catch_start = self.token.start;
            self.advance()?;
            let param = if self.eat(&Token::LeftParen)? {
                let simple = self.identifier_text().is_some();
                self.scope.enter(if simple {
                    ScopeFlags::SIMPLE_CATCH
                } else {
                    ScopeFlags::empty()
                });
                let param = self.parse_binding_pattern(ctx, false)?;
                let kind = if simple {
                    BindingKind::SimpleCatch
                } else {
                    BindingKind::Lexical
                };
                self.declare_pattern(&param, kind)?;
                self.expect(&Token::RightParen)?;
                Some(param)
            } else {
                self.scope.enter(ScopeFlags::empty());
                None
            };
            // The catch body shares the parameter's scope.
            let body = self.parse_block_body(ctx)?;
            self.scope.exit();
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if self.eat_keyword(Keyword::Finally)? {
            Some(self.parse_block(ctx)?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error(ErrorKind::UnexpectedToken, "Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }
}

/// Start of the function a chain of labels ends in, if it ends in one.
fn labelled_function_start(stmt: &Statement) -> Option<u32> {
    let Statement::Labeled(outer) = stmt else {
        return None;
    };
    let mut labeled = outer;
    loop {
        match labeled.body.as_ref() {
            Statement::Labeled(inner) => labeled = inner,
            Statement::FunctionDeclaration(decl) => return Some(decl.span.start),
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::parse_script;

    fn first(src: &str) -> Statement {
        parse_script(src, Context::EMPTY)
            .unwrap()
            .body
            .into_iter()
            .next()
            .unwrap()
    }

    fn error_kind(src: &str, ctx: Context) -> ErrorKind {
        parse_script(src, ctx).unwrap_err().kind
    }

    #[test]
    fn automatic_semicolon_insertion() {
        let program = parse_script("a\nb\n++c", Context::EMPTY).unwrap();
        assert_eq!(program.body.len(), 3);
        assert_eq!(error_kind("a b", Context::EMPTY), ErrorKind::UnexpectedToken);
        let Statement::FunctionDeclaration(f) = first("function f() { return\n1 }") else {
            panic!("expected function");
        };
        assert!(matches!(&f.body.body[0], Statement::Return(r) if r.argument.is_none()));
        assert_eq!(f.body.body.len(), 2);
    }

    #[test]
    fn for_variants() {
        assert!(matches!(first("for (;;) {}"), Statement::For(_)));
        assert!(matches!(first("for (var i = 0; i < 1; i++) {}"), Statement::For(_)));
        assert!(matches!(first("for (x in y) {}"), Statement::ForIn(_)));
        assert!(matches!(first("for (const [a, b] of c) {}"), Statement::ForOf(_)));
        assert!(matches!(first("for ([a, b] of c) {}"), Statement::ForOf(_)));
        assert!(matches!(first("for (let in x) {}"), Statement::ForIn(_)));
        assert!(matches!(first("for (var a = 1 in b) {}"), Statement::ForIn(_)));
        assert!(matches!(first("for (a in b in c) {}"), Statement::ForIn(_)));
    }

    #[test]
    fn for_head_errors() {
        assert_eq!(
            error_kind("for (const [foo] = arr, bar in arr);", Context::EMPTY),
            ErrorKind::InvalidForHeadBinding
        );
        assert_eq!(error_kind("for (let a = 1 of b);", Context::EMPTY), ErrorKind::InvalidForHeadBinding);
        assert_eq!(error_kind("for (var a = 1 in b);", Context::STRICT), ErrorKind::InvalidForHeadBinding);
        assert_eq!(error_kind("for (const a; ;);", Context::EMPTY), ErrorKind::MissingInitializerInConst);
        assert_eq!(error_kind("for (let of x);", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("for (async of x);", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("for (a + b of c);", Context::EMPTY), ErrorKind::InvalidDestructuringTarget);
        assert_eq!(error_kind("for await (x of y);", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn for_await() {
        let program = parse_script("async function f() { for await (x of y); }", Context::EMPTY).unwrap();
        let Statement::FunctionDeclaration(f) = &program.body[0] else {
            panic!("expected function");
        };
        assert!(matches!(&f.body.body[0], Statement::ForOf(s) if s.is_await));
    }

    #[test]
    fn let_as_identifier_in_sloppy_code() {
        assert!(matches!(first("let = 1"), Statement::Expression(_)));
        assert!(matches!(first("let\nx = 1"), Statement::VariableDeclaration(_)));
        assert_eq!(error_kind("if (a) let [b] = c;", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn labels() {
        assert!(matches!(first("a: b: while (1) continue a;"), Statement::Labeled(_)));
        assert_eq!(error_kind("a: { continue a; }", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("break b;", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("a: a: ;", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(
            error_kind("a: while (1) { function f() { break a; } }", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        first("a: { break a; }");
    }

    #[test]
    fn break_and_continue_placement() {
        assert_eq!(error_kind("break;", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("continue;", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(
            error_kind("switch (a) { case 1: continue; }", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        first("switch (a) { case 1: break; default: }");
        first("while (1) { switch (a) { case 1: continue; } }");
    }

    #[test]
    fn labelled_functions_follow_web_compat() {
        first("a: function f() {}");
        assert_eq!(error_kind("a: function f() {}", Context::STRICT), ErrorKind::UnexpectedToken);
        assert_eq!(
            error_kind("a: function f() {}", Context::OPTIONS_DISABLE_WEB_COMPAT),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(error_kind("while (1) function f() {}", Context::EMPTY), ErrorKind::UnexpectedToken);
        first("if (a) function f() {} else function g() {}");
        assert_eq!(error_kind("if (a) function f() {}", Context::STRICT), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn labelled_functions_are_not_statement_bodies() {
        for src in [
            "for (let x in y) label: function f(){}",
            "while (0) a: function f(){}",
            "do a: function f(){} while(0)",
            "for (;;) a: b: function f(){}",
            "if (1) a: function f(){}",
            "if (1) ; else a: function f(){}",
            "for (x of y) a: function f(){}",
            "with (o) a: function f(){}",
        ] {
            assert_eq!(error_kind(src, Context::EMPTY), ErrorKind::UnexpectedToken, "{src}");
        }
        first("while (0) a: b: x;");
        first("if (1) { a: function f(){} }");
        first("for (;;) a: { break a; }");
    }

    #[test]
    fn try_catch_finally() {
        let Statement::Try(stmt) = first("try {} catch ({ a, b }) {} finally {}") else {
            panic!("expected try");
        };
        assert!(matches!(stmt.handler, Some(CatchClause { param: Some(Pattern::Object(_)), .. })));
        assert!(stmt.finalizer.is_some());
        first("try {} catch {}");
        first("try {} catch (e) { var e; }");
        assert_eq!(error_kind("try {} catch (e) { let e; }", Context::EMPTY), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("try {} catch ([e]) { var e; }", Context::EMPTY), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("try {}", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn switch_cases_share_a_scope() {
        assert_eq!(
            error_kind("switch (a) { case 1: let b; case 2: let b; }", Context::EMPTY),
            ErrorKind::DuplicateBinding
        );
        assert_eq!(
            error_kind("switch (a) { default: default: }", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
    }

    #[test]
    fn throw_needs_expression_on_same_line() {
        assert_eq!(error_kind("throw\nx;", Context::EMPTY), ErrorKind::UnexpectedToken);
        first("throw x");
    }

    #[test]
    fn do_while_semicolon_is_optional() {
        let program = parse_script("do x; while (y) z", Context::EMPTY).unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn import_and_export_outside_modules() {
        assert_eq!(error_kind("import x from 'y';", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("export var x;", Context::EMPTY), ErrorKind::UnexpectedToken);
        first("import('y');");
    }
}
