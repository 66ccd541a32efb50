use super::expressions::property_key_is;
use super::scope::{BindingKind, ScopeFlags};
use super::{IdentifierUse, Parser, PrivateNameKind, PrivateScope};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseResult};
use crate::lexer::{Keyword, Token};

/// Context for the parameters and body of a non-arrow function.
fn function_context(ctx: Context, is_async: bool, is_generator: bool) -> Context {
    let mut inner = ctx
        .without(Context::FUNCTION_BOUNDARY | Context::ALLOW_SUPER_CALL | Context::ALLOW_SUPER_PROPERTY)
        .with(Context::IN_FUNCTION | Context::ALLOW_NEW_TARGET);
    if is_async {
        inner = inner.with(Context::IN_ASYNC);
    }
    if is_generator {
        inner = inner.with(Context::IN_GENERATOR);
    }
    inner
}

/// Tokens that can begin a class element name.
fn starts_class_element_name(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::Keyword(_)
            | Token::PrivateName(_)
            | Token::StringLiteral(_)
            | Token::NumericLiteral(_)
            | Token::BigIntLiteral(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral
            | Token::LeftBracket
    )
}

/// What kind of parameter list a function has, for duplicate-name checks.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ParamRules {
    /// Plain functions: duplicates are allowed in sloppy simple lists.
    Plain,
    /// Methods and arrows never allow duplicates.
    Unique,
}

impl<'a> Parser<'a> {
    // ---- variables ---------------------------------------------------------

    /// `var`, `let` or `const` statement; the current token is the keyword.
    pub(super) fn parse_variable_statement(&mut self, ctx: Context, kind: VariableKind) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // var / let / const
        let declarations = self.parse_variable_declarations(ctx, kind, false)?;
        self.consume_semicolon()?;
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            declarations,
            kind,
            span: self.span_from(start),
        }))
    }

    /// The declarator list after the keyword. In a for-head a missing
    /// initializer is judged later, once `in`/`of` has been seen.
    pub(super) fn parse_variable_declarations(
        &mut self,
        ctx: Context,
        kind: VariableKind,
        in_for_head: bool,
    ) -> ParseResult<Vec<VariableDeclarator>> {
        let binding = if kind.is_lexical() {
            BindingKind::Lexical
        } else {
            BindingKind::Var
        };
        let mut declarations = Vec::new();
        loop {
            let start = self.token.start;
            let id = self.parse_binding_pattern(ctx, kind.is_lexical())?;
            self.declare_pattern(&id, binding)?;
            let init = if self.eat(&Token::Assign)? {
                Some(self.parse_assignment_expression(ctx)?)
            } else {
                if !in_for_head {
                    self.check_missing_initializer(kind, &id)?;
                }
                None
            };
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(start),
            });
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        Ok(declarations)
    }

    pub(super) fn check_missing_initializer(&self, kind: VariableKind, id: &Pattern) -> ParseResult<()> {
        if kind == VariableKind::Const {
            return Err(self.error(
                ErrorKind::MissingInitializerInConst,
                "Missing initializer in const declaration",
            ));
        }
        if !matches!(id, Pattern::Identifier(_)) {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Missing initializer in destructuring declaration",
            ));
        }
        Ok(())
    }

    // ---- functions ---------------------------------------------------------

    /// `function` declaration; the current token is `function` and `start`
    /// is where the declaration began (before `async`, if any). The name is
    /// optional only for `export default`.
    pub(super) fn parse_function_declaration(
        &mut self,
        ctx: Context,
        start: u32,
        is_async: bool,
        name_optional: bool,
    ) -> ParseResult<FunctionDeclaration> {
        self.expect_keyword(Keyword::Function)?;
        let generator = self.eat(&Token::Star)?;

        let id = if self.identifier_text().is_some() {
            let id = self.parse_binding_identifier(ctx, false)?;
            let lexical_like = ctx.is_strict()
                || generator
                || is_async
                || ctx.contains(Context::OPTIONS_DISABLE_WEB_COMPAT);
            let kind = match (lexical_like, self.scope.treats_functions_as_var()) {
                (false, _) => BindingKind::Function,
                (true, true) => BindingKind::Var,
                (true, false) => BindingKind::Lexical,
            };
            if !self.scope.declare(&id.name, kind) {
                return Err(self.error_at(
                    ErrorKind::DuplicateBinding,
                    id.span.start,
                    format!("Identifier '{}' has already been declared", id.name),
                ));
            }
            Some(id)
        } else if name_optional {
            None
        } else {
            return Err(self.expected_identifier());
        };

        let fn_ctx = function_context(ctx, is_async, generator);
        let (params, body) = self.parse_function_rest(fn_ctx, id.as_ref(), ParamRules::Plain)?;
        Ok(FunctionDeclaration {
            id,
            params,
            body,
            is_async,
            generator,
            span: self.span_from(start),
        })
    }

    /// `function` expression; the current token is `function`.
    pub(super) fn parse_function_expression(
        &mut self,
        ctx: Context,
        start: u32,
        is_async: bool,
    ) -> ParseResult<Expression> {
        self.expect_keyword(Keyword::Function)?;
        let generator = self.eat(&Token::Star)?;
        let fn_ctx = function_context(ctx, is_async, generator);
        // The name is bound inside the function, so the function's own
        // generator and async modes apply to it.
        let id = if self.identifier_text().is_some() {
            Some(self.parse_binding_identifier(fn_ctx, false)?)
        } else {
            None
        };
        let (params, body) = self.parse_function_rest(fn_ctx, id.as_ref(), ParamRules::Plain)?;
        Ok(Expression::Function(Box::new(FunctionExpression {
            id,
            params,
            body,
            is_async,
            generator,
            span: self.span_from(start),
        })))
    }

    /// Object literal or class method; the current token is `(`. The
    /// resulting function node starts at the parameter list.
    pub(super) fn parse_method(
        &mut self,
        ctx: Context,
        is_async: bool,
        is_generator: bool,
        accessor: PropertyKind,
        super_call: bool,
    ) -> ParseResult<FunctionExpression> {
        let start = self.token.start;
        let mut fn_ctx = function_context(ctx, is_async, is_generator).with(Context::ALLOW_SUPER_PROPERTY);
        if super_call {
            fn_ctx = fn_ctx.with(Context::ALLOW_SUPER_CALL);
        }
        let (params, body) = self.parse_function_rest_checked(fn_ctx, None, ParamRules::Unique, accessor)?;
        Ok(FunctionExpression {
            id: None,
            params,
            body,
            is_async,
            generator: is_generator,
            span: self.span_from(start),
        })
    }

    fn parse_function_rest(
        &mut self,
        fn_ctx: Context,
        id: Option<&Identifier>,
        rules: ParamRules,
    ) -> ParseResult<(Vec<Pattern>, BlockStatement)> {
        self.parse_function_rest_checked(fn_ctx, id, rules, PropertyKind::Init)
    }

    /// Parameters and body in a fresh function scope. Labels and pending
    /// `yield`/`await` positions of the enclosing code do not leak in.
    fn parse_function_rest_checked(
        &mut self,
        fn_ctx: Context,
        id: Option<&Identifier>,
        rules: ParamRules,
        accessor: PropertyKind,
    ) -> ParseResult<(Vec<Pattern>, BlockStatement)> {
        self.scope.enter(ScopeFlags::FUNCTION);
        let labels = std::mem::take(&mut self.labels);
        let old_yield = self.yield_pos.take();
        let old_await = self.await_pos.take();

        let params_start = self.token.start;
        let params = self.parse_formal_parameters(fn_ctx.with(Context::IN_FORMAL_PARAMETERS))?;
        match accessor {
            PropertyKind::Get if !params.is_empty() => {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    params_start,
                    "Getter must not have any formal parameters",
                ));
            }
            PropertyKind::Set if params.len() != 1 || matches!(params[0], Pattern::Rest(_)) => {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    params_start,
                    "Setter must have exactly one formal parameter",
                ));
            }
            _ => {}
        }

        let body_start = self.token.start;
        let (body, use_strict) = self.parse_function_body(fn_ctx)?;
        let simple = params.iter().all(|p| matches!(p, Pattern::Identifier(_)));
        if use_strict && !simple {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                body_start,
                "Illegal 'use strict' directive in function with non-simple parameter list",
            ));
        }
        let strict = fn_ctx.is_strict() || use_strict;
        if rules == ParamRules::Unique || strict || !simple {
            self.check_duplicate_params(&params)?;
        }
        if use_strict && !fn_ctx.is_strict() {
            let strict_ctx = fn_ctx.with(Context::STRICT);
            if let Some(id) = id {
                self.check_identifier(&id.name, id.span.start, strict_ctx, IdentifierUse::Binding)?;
            }
            for param in &params {
                self.check_binding_names(param, strict_ctx)?;
            }
        }

        self.labels = labels;
        self.yield_pos = old_yield;
        self.await_pos = old_await;
        self.scope.exit();
        Ok((params, body))
    }

    /// `( FormalParameters )`, declaring every bound name.
    fn parse_formal_parameters(&mut self, ctx: Context) -> ParseResult<Vec<Pattern>> {
        self.expect(&Token::LeftParen)?;
        let mut params = Vec::new();
        while !self.at(&Token::RightParen) {
            if self.at(&Token::Ellipsis) {
                let rest = self.parse_binding_rest(ctx, false)?;
                params.push(Pattern::Rest(Box::new(rest)));
                break;
            }
            params.push(self.parse_binding_element(ctx, false)?);
            if !self.at(&Token::RightParen) {
                self.expect(&Token::Comma)?;
            }
        }
        self.expect(&Token::RightParen)?;
        for param in &params {
            self.declare_pattern(param, BindingKind::Var)?;
        }
        Ok(params)
    }

    /// `{ FunctionBody }`; also reports whether it opened with `"use strict"`.
    fn parse_function_body(&mut self, ctx: Context) -> ParseResult<(BlockStatement, bool)> {
        let start = self.token.start;
        self.expect(&Token::LeftBrace)?;
        let (body, use_strict) = self.parse_directives_and_statements(ctx, &Token::RightBrace)?;
        self.expect(&Token::RightBrace)?;
        Ok((
            BlockStatement {
                body,
                span: self.span_from(start),
            },
            use_strict,
        ))
    }

    /// Everything from `=>` on. Parameters were already converted to patterns
    /// and validated against the enclosing context.
    pub(super) fn parse_arrow_function(
        &mut self,
        ctx: Context,
        start: u32,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> ParseResult<Expression> {
        self.expect(&Token::Arrow)?;
        let mut arrow_ctx = ctx
            .without(
                Context::IN_GENERATOR
                    | Context::IN_ASYNC
                    | Context::IN_ITERATION
                    | Context::IN_SWITCH
                    | Context::IN_FORMAL_PARAMETERS,
            )
            .with(Context::IN_FUNCTION);
        if is_async {
            arrow_ctx = arrow_ctx.with(Context::IN_ASYNC);
        }

        self.scope.enter(ScopeFlags::FUNCTION);
        self.check_duplicate_params(&params)?;
        for param in &params {
            self.declare_pattern(param, BindingKind::Var)?;
        }
        let labels = std::mem::take(&mut self.labels);
        let old_yield = self.yield_pos.take();
        let old_await = self.await_pos.take();

        let (body, expression) = if self.at(&Token::LeftBrace) {
            let body_start = self.token.start;
            let (block, use_strict) = self.parse_function_body(arrow_ctx.without(Context::DISALLOW_IN))?;
            if use_strict {
                if !params.iter().all(|p| matches!(p, Pattern::Identifier(_))) {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        body_start,
                        "Illegal 'use strict' directive in function with non-simple parameter list",
                    ));
                }
                let strict_ctx = ctx.with(Context::STRICT);
                for param in &params {
                    self.check_binding_names(param, strict_ctx)?;
                }
            }
            (ArrowBody::Block(block), false)
        } else {
            (ArrowBody::Expression(self.parse_maybe_assign(arrow_ctx, None)?), true)
        };

        self.labels = labels;
        self.yield_pos = old_yield;
        self.await_pos = old_await;
        self.scope.exit();
        Ok(Expression::ArrowFunction(Box::new(ArrowFunctionExpression {
            params,
            body,
            is_async,
            expression,
            span: self.span_from(start),
        })))
    }

    // ---- classes -----------------------------------------------------------

    /// `class` declaration; the name is optional only for `export default`.
    pub(super) fn parse_class_declaration(
        &mut self,
        ctx: Context,
        name_optional: bool,
    ) -> ParseResult<ClassDeclaration> {
        let start = self.token.start;
        self.expect_keyword(Keyword::Class)?;
        let class_ctx = ctx.with(Context::STRICT);
        let id = if self.identifier_text().is_some() {
            let id = self.parse_binding_identifier(class_ctx, true)?;
            if !self.scope.declare(&id.name, BindingKind::Lexical) {
                return Err(self.error_at(
                    ErrorKind::DuplicateBinding,
                    id.span.start,
                    format!("Identifier '{}' has already been declared", id.name),
                ));
            }
            Some(id)
        } else if name_optional {
            None
        } else {
            return Err(self.expected_identifier());
        };
        let (super_class, body) = self.parse_class_tail(class_ctx)?;
        Ok(ClassDeclaration {
            id,
            super_class,
            body,
            span: self.span_from(start),
        })
    }

    pub(super) fn parse_class_expression(&mut self, ctx: Context) -> ParseResult<ClassExpression> {
        let start = self.token.start;
        self.expect_keyword(Keyword::Class)?;
        let class_ctx = ctx.with(Context::STRICT);
        let id = if self.identifier_text().is_some() {
            Some(self.parse_binding_identifier(class_ctx, true)?)
        } else {
            None
        };
        let (super_class, body) = self.parse_class_tail(class_ctx)?;
        Ok(ClassExpression {
            id,
            super_class,
            body,
            span: self.span_from(start),
        })
    }

    /// Optional heritage and the class body.
    fn parse_class_tail(&mut self, ctx: Context) -> ParseResult<(Option<Expression>, ClassBody)> {
        let super_class = if self.eat_keyword(Keyword::Extends)? {
            let mut cover = super::patterns::CoverGrammar::default();
            let heritage = self.parse_subscripts_expression(ctx, &mut cover)?;
            self.check_expression_errors(&cover)?;
            Some(heritage)
        } else {
            None
        };
        let body = self.parse_class_body(ctx, super_class.is_some())?;
        Ok((super_class, body))
    }

    fn parse_class_body(&mut self, ctx: Context, derived: bool) -> ParseResult<ClassBody> {
        let start = self.token.start;
        self.expect(&Token::LeftBrace)?;
        self.private_scopes.push(PrivateScope::default());
        let body_ctx = ctx.with(Context::IN_CLASS_BODY);

        let mut elements = Vec::new();
        let mut has_constructor = false;
        while !self.eat(&Token::RightBrace)? {
            if self.eat(&Token::Semicolon)? {
                continue;
            }
            let element = self.parse_class_element(body_ctx, derived)?;
            if let ClassElement::Method(method) = &element {
                if method.kind == MethodKind::Constructor {
                    if has_constructor {
                        return Err(self.error_at(
                            ErrorKind::UnexpectedToken,
                            method.span.start,
                            "Duplicate constructor in the same class",
                        ));
                    }
                    has_constructor = true;
                }
            }
            elements.push(element);
        }
        self.exit_private_scope()?;
        Ok(ClassBody {
            body: elements,
            span: self.span_from(start),
        })
    }

    fn parse_class_element(&mut self, ctx: Context, derived: bool) -> ParseResult<ClassElement> {
        let start = self.token.start;

        let mut is_static = false;
        if self.at_keyword(Keyword::Static) {
            let next = self.peek()?;
            if next.token == Token::LeftBrace {
                if !ctx.allows_next() {
                    return Err(self.unexpected());
                }
                return self.parse_static_block(ctx, start);
            }
            if starts_class_element_name(&next.token) || next.token == Token::Star {
                is_static = true;
                self.advance()?;
            }
        }

        let mut is_async = false;
        if self.at_keyword(Keyword::Async) {
            let next = self.peek()?;
            if !next.newline_before() && (starts_class_element_name(&next.token) || next.token == Token::Star) {
                is_async = true;
                self.advance()?;
            }
        }
        let is_generator = self.eat(&Token::Star)?;

        let mut accessor = PropertyKind::Init;
        if !is_async && !is_generator && (self.at_contextual("get") || self.at_contextual("set")) {
            let next = self.peek()?;
            if starts_class_element_name(&next.token) {
                accessor = if self.at_contextual("get") {
                    PropertyKind::Get
                } else {
                    PropertyKind::Set
                };
                self.advance()?;
            }
        }

        let key_start = self.token.start;
        let (key, computed) = if let Token::PrivateName(name) = &self.token.token {
            if !ctx.allows_next() {
                return Err(self.unexpected());
            }
            if name == "constructor" {
                return Err(self.error(
                    ErrorKind::UnexpectedToken,
                    "Classes can't have an element named '#constructor'",
                ));
            }
            let id = PrivateIdentifier {
                name: name.clone(),
                span: self.span_between(self.token.start, self.token.end),
            };
            self.advance()?;
            (Expression::PrivateIdentifier(id), false)
        } else {
            self.parse_property_name(ctx)?
        };

        if !computed && is_static && property_key_is(&key, "prototype") {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                key_start,
                "Classes may not have a static property named prototype",
            ));
        }

        let is_method = is_async || is_generator || accessor != PropertyKind::Init || self.at(&Token::LeftParen);
        if is_method {
            let is_constructor = !is_static && !computed && property_key_is(&key, "constructor");
            if is_constructor && (accessor != PropertyKind::Init || is_async || is_generator) {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    key_start,
                    "Class constructor may not be an accessor, generator or async method",
                ));
            }
            let kind = match accessor {
                _ if is_constructor => MethodKind::Constructor,
                PropertyKind::Get => MethodKind::Get,
                PropertyKind::Set => MethodKind::Set,
                PropertyKind::Init => MethodKind::Method,
            };
            let value = self.parse_method(ctx, is_async, is_generator, accessor, is_constructor && derived)?;
            if let Expression::PrivateIdentifier(id) = &key {
                let private_kind = match accessor {
                    PropertyKind::Get => PrivateNameKind::Getter,
                    PropertyKind::Set => PrivateNameKind::Setter,
                    PropertyKind::Init => PrivateNameKind::Other,
                };
                let name = id.name.clone();
                self.declare_private_name(&name, private_kind, is_static, key_start)?;
            }
            return Ok(ClassElement::Method(MethodDefinition {
                key,
                value,
                kind,
                computed,
                is_static,
                span: self.span_from(start),
            }));
        }

        if !ctx.allows_next() {
            return Err(self.unexpected());
        }
        if !computed && property_key_is(&key, "constructor") {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                key_start,
                "Classes can't have a field named 'constructor'",
            ));
        }
        let value = if self.eat(&Token::Assign)? {
            let field_ctx = ctx
                .without(Context::FUNCTION_BOUNDARY | Context::ALLOW_SUPER_CALL)
                .with(Context::IN_CLASS_FIELD | Context::ALLOW_SUPER_PROPERTY | Context::ALLOW_NEW_TARGET);
            Some(self.parse_maybe_assign(field_ctx, None)?)
        } else {
            None
        };
        self.consume_semicolon()?;
        if let Expression::PrivateIdentifier(id) = &key {
            let name = id.name.clone();
            self.declare_private_name(&name, PrivateNameKind::Other, is_static, key_start)?;
        }
        Ok(ClassElement::Property(PropertyDefinition {
            key,
            value,
            computed,
            is_static,
            span: self.span_from(start),
        }))
    }

    /// `static { ... }`; the current token is `static`.
    fn parse_static_block(&mut self, ctx: Context, start: u32) -> ParseResult<ClassElement> {
        self.advance()?; // static
        self.expect(&Token::LeftBrace)?;
        let block_ctx = ctx
            .without(Context::FUNCTION_BOUNDARY | Context::ALLOW_SUPER_CALL | Context::IN_FUNCTION)
            .with(Context::IN_STATIC_BLOCK | Context::ALLOW_SUPER_PROPERTY | Context::ALLOW_NEW_TARGET);
        self.scope.enter(ScopeFlags::STATIC_BLOCK);
        let labels = std::mem::take(&mut self.labels);

        let mut body = Vec::new();
        while !self.eat(&Token::RightBrace)? {
            body.push(self.parse_statement_list_item(block_ctx)?);
        }

        self.labels = labels;
        self.scope.exit();
        Ok(ClassElement::StaticBlock(StaticBlock {
            body,
            span: self.span_from(start),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::parse_script;

    fn error_kind(src: &str, ctx: Context) -> ErrorKind {
        parse_script(src, ctx).unwrap_err().kind
    }

    fn class_body(src: &str) -> Vec<ClassElement> {
        let program = parse_script(src, Context::OPTIONS_NEXT).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::ClassDeclaration(class)) => class.body.body,
            other => panic!("expected a class, got {other:?}"),
        }
    }

    #[test]
    fn const_needs_initializer() {
        assert_eq!(error_kind("const a;", Context::EMPTY), ErrorKind::MissingInitializerInConst);
        assert_eq!(error_kind("let [a];", Context::EMPTY), ErrorKind::UnexpectedToken);
        parse_script("let a, b = 1; var c;", Context::EMPTY).unwrap();
    }

    #[test]
    fn let_cannot_bind_let() {
        assert_eq!(error_kind("let let = 1;", Context::EMPTY), ErrorKind::UnexpectedReservedWord);
        assert_eq!(error_kind("const [let] = x;", Context::EMPTY), ErrorKind::UnexpectedReservedWord);
        parse_script("var let = 1;", Context::EMPTY).unwrap();
    }

    #[test]
    fn redeclarations() {
        assert_eq!(error_kind("let a; var a;", Context::EMPTY), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("const a = 1; let a;", Context::EMPTY), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("let a; function a() {}", Context::EMPTY), ErrorKind::DuplicateBinding);
        parse_script("var a; var a; function a() {}", Context::EMPTY).unwrap();
        parse_script("{ function f() {} function f() {} }", Context::EMPTY).unwrap();
        assert_eq!(
            error_kind("{ function f() {} function f() {} }", Context::STRICT),
            ErrorKind::DuplicateBinding
        );
    }

    #[test]
    fn duplicate_parameters() {
        parse_script("function f(a, a) {}", Context::EMPTY).unwrap();
        for src in [
            "'use strict'; function f(a, a) {}",
            "function f(a, a) { 'use strict' }",
            "function f(a, [a]) {}",
            "function f(a, a = 1) {}",
            "({ m(a, a) {} })",
        ] {
            assert_eq!(error_kind(src, Context::EMPTY), ErrorKind::DuplicateBinding, "{src}");
        }
    }

    #[test]
    fn use_strict_in_body_revalidates_names() {
        assert_eq!(
            error_kind("function eval() { 'use strict' }", Context::EMPTY),
            ErrorKind::UnexpectedReservedWord
        );
        assert_eq!(
            error_kind("function f(interface) { 'use strict' }", Context::EMPTY),
            ErrorKind::UnexpectedReservedWord
        );
        assert_eq!(
            error_kind("function f(a = 1) { 'use strict' }", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            error_kind("(eval) => { 'use strict' }", Context::EMPTY),
            ErrorKind::UnexpectedReservedWord
        );
    }

    #[test]
    fn generator_and_async_names() {
        parse_script("function* yield() {}", Context::EMPTY).unwrap();
        assert_eq!(
            error_kind("(function* yield() {})", Context::EMPTY),
            ErrorKind::UnexpectedReservedWord
        );
        assert_eq!(
            error_kind("(async function await() {})", Context::EMPTY),
            ErrorKind::UnexpectedReservedWord
        );
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(error_kind("return;", Context::EMPTY), ErrorKind::UnexpectedToken);
        parse_script("function f() { return; }", Context::EMPTY).unwrap();
    }

    #[test]
    fn class_methods_and_constructor() {
        let body = class_body("class A extends B { constructor() { super(); } static m() {} get x() { return 1; } }");
        assert!(matches!(&body[0], ClassElement::Method(m) if m.kind == MethodKind::Constructor));
        assert!(matches!(&body[1], ClassElement::Method(m) if m.is_static));
        assert!(matches!(&body[2], ClassElement::Method(m) if m.kind == MethodKind::Get));
    }

    #[test]
    fn class_errors() {
        for src in [
            "class A { constructor() {} constructor() {} }",
            "class A { get constructor() {} }",
            "class A { *constructor() {} }",
            "class A { static prototype() {} }",
            "class A { constructor() { super(); } }",
            "class A { m() { super(); } }",
        ] {
            assert_eq!(error_kind(src, Context::OPTIONS_NEXT), ErrorKind::UnexpectedToken, "{src}");
        }
    }

    #[test]
    fn class_body_is_strict() {
        assert_eq!(
            error_kind("class A { m() { with (a) {} } }", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(error_kind("class let {}", Context::EMPTY), ErrorKind::UnexpectedReservedWord);
    }

    #[test]
    fn fields_and_private_names_need_next() {
        assert_eq!(error_kind("class A { x = 1 }", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("class A { #x() {} }", Context::EMPTY), ErrorKind::UnexpectedToken);
        let body = class_body("class A { x = 1; static #y; #z() { return this.#z; } static { this.#y = 1; } }");
        assert_eq!(body.len(), 4);
        assert!(matches!(&body[3], ClassElement::StaticBlock(_)));
    }

    #[test]
    fn private_name_errors() {
        for src in [
            "class A { #x; #x; }",
            "class A { get #x() {} get #x() {} }",
            "class A { static get #x() {} set #x(v) {} }",
        ] {
            assert_eq!(error_kind(src, Context::OPTIONS_NEXT), ErrorKind::DuplicateBinding, "{src}");
        }
        class_body("class A { get #x() {} set #x(v) {} }");
        assert_eq!(
            error_kind("class A { m() { this.#y; } }", Context::OPTIONS_NEXT),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            error_kind("class A { #constructor; }", Context::OPTIONS_NEXT),
            ErrorKind::UnexpectedToken
        );
        class_body("class A { #x; m() { class B { n() { return this.#x; } } } }");
    }

    #[test]
    fn class_field_restrictions() {
        assert_eq!(
            error_kind("class A { constructor = 1 }", Context::OPTIONS_NEXT),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            error_kind("class A { x = arguments }", Context::OPTIONS_NEXT),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            error_kind("class A { static { await; } }", Context::OPTIONS_NEXT),
            ErrorKind::UnexpectedReservedWord
        );
        class_body("class A { static { var x; let y; } x = () => super.y; }");
    }
}
