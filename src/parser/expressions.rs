use num_bigint::BigUint;

use super::patterns::{CoverGrammar, TargetKind};
use super::{PrivateNameKind, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseResult};
use crate::lexer::{Keyword, Token, TokenFlags};

/// One entry of a parenthesized list that may still become arrow parameters.
enum ParenItem {
    Expression(Expression),
    Rest(RestElement),
}

/// Binding power of a binary operator token. `**` is handled with the
/// unary operators since it is right-associative.
fn binary_precedence(token: &Token) -> Option<u8> {
    let prec = match token {
        Token::LogicalOr | Token::NullishCoalescing => 1,
        Token::LogicalAnd => 2,
        Token::Pipe => 3,
        Token::Caret => 4,
        Token::Ampersand => 5,
        Token::Equal | Token::NotEqual | Token::StrictEqual | Token::StrictNotEqual => 6,
        Token::LessThan
        | Token::GreaterThan
        | Token::LessThanEqual
        | Token::GreaterThanEqual
        | Token::Keyword(Keyword::In)
        | Token::Keyword(Keyword::Instanceof) => 7,
        Token::LeftShift | Token::RightShift | Token::UnsignedRightShift => 8,
        Token::Plus | Token::Minus => 9,
        Token::Star | Token::Slash | Token::Percent => 10,
        _ => return None,
    };
    Some(prec)
}

enum BinaryOp {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

fn binary_operator(token: &Token) -> Option<BinaryOp> {
    use BinaryOperator as B;
    let op = match token {
        Token::LogicalOr => return Some(BinaryOp::Logical(LogicalOperator::Or)),
        Token::LogicalAnd => return Some(BinaryOp::Logical(LogicalOperator::And)),
        Token::NullishCoalescing => {
            return Some(BinaryOp::Logical(LogicalOperator::NullishCoalescing));
        }
        Token::Pipe => B::BitwiseOr,
        Token::Caret => B::BitwiseXor,
        Token::Ampersand => B::BitwiseAnd,
        Token::Equal => B::Equal,
        Token::NotEqual => B::NotEqual,
        Token::StrictEqual => B::StrictEqual,
        Token::StrictNotEqual => B::StrictNotEqual,
        Token::LessThan => B::LessThan,
        Token::GreaterThan => B::GreaterThan,
        Token::LessThanEqual => B::LessThanEqual,
        Token::GreaterThanEqual => B::GreaterThanEqual,
        Token::Keyword(Keyword::In) => B::In,
        Token::Keyword(Keyword::Instanceof) => B::Instanceof,
        Token::LeftShift => B::LeftShift,
        Token::RightShift => B::RightShift,
        Token::UnsignedRightShift => B::UnsignedRightShift,
        Token::Plus => B::Add,
        Token::Minus => B::Subtract,
        Token::Star => B::Multiply,
        Token::Slash => B::Divide,
        Token::Percent => B::Remainder,
        _ => return None,
    };
    Some(BinaryOp::Binary(op))
}

fn assignment_operator(token: &Token) -> Option<AssignmentOperator> {
    use AssignmentOperator as A;
    Some(match token {
        Token::Assign => A::Assign,
        Token::PlusAssign => A::AddAssign,
        Token::MinusAssign => A::SubtractAssign,
        Token::StarAssign => A::MultiplyAssign,
        Token::SlashAssign => A::DivideAssign,
        Token::PercentAssign => A::RemainderAssign,
        Token::ExponentAssign => A::ExponentAssign,
        Token::LeftShiftAssign => A::LeftShiftAssign,
        Token::RightShiftAssign => A::RightShiftAssign,
        Token::UnsignedRightShiftAssign => A::UnsignedRightShiftAssign,
        Token::PipeAssign => A::BitwiseOrAssign,
        Token::CaretAssign => A::BitwiseXorAssign,
        Token::AmpersandAssign => A::BitwiseAndAssign,
        Token::LogicalOrAssign => A::OrAssign,
        Token::LogicalAndAssign => A::AndAssign,
        Token::NullishAssign => A::NullishAssign,
        _ => return None,
    })
}

fn unary_operator(token: &Token) -> Option<UnaryOperator> {
    Some(match token {
        Token::Minus => UnaryOperator::Minus,
        Token::Plus => UnaryOperator::Plus,
        Token::Bang => UnaryOperator::Not,
        Token::Tilde => UnaryOperator::BitwiseNot,
        Token::Keyword(Keyword::Typeof) => UnaryOperator::Typeof,
        Token::Keyword(Keyword::Void) => UnaryOperator::Void,
        Token::Keyword(Keyword::Delete) => UnaryOperator::Delete,
        _ => return None,
    })
}

/// Whether `token` can begin the operand of `yield`.
fn starts_expression(token: &Token) -> bool {
    match token {
        Token::Plus | Token::Minus | Token::Slash | Token::SlashAssign => true,
        Token::RightParen
        | Token::RightBracket
        | Token::RightBrace
        | Token::Comma
        | Token::Semicolon
        | Token::Colon
        | Token::Question
        | Token::OptionalChain
        | Token::Dot
        | Token::Ellipsis
        | Token::Arrow
        | Token::Exponent
        | Token::Eof => false,
        other => binary_precedence(other).is_none() && !other.is_assignment_operator(),
    }
}

/// Decimal digits of a BigInt literal written in any radix.
fn bigint_to_decimal(raw: &str) -> String {
    let (digits, radix) = match raw.get(..2) {
        Some("0x" | "0X") => (&raw[2..], 16),
        Some("0o" | "0O") => (&raw[2..], 8),
        Some("0b" | "0B") => (&raw[2..], 2),
        _ => (raw, 10),
    };
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .map(|value| value.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `obj.#x`, possibly inside an optional chain.
fn is_private_member(expr: &Expression) -> bool {
    match expr {
        Expression::Member(member) => matches!(member.property, Expression::PrivateIdentifier(_)),
        Expression::Chain(chain) => is_private_member(&chain.expression),
        _ => false,
    }
}

impl<'a> Parser<'a> {
    /// Expression[+In] unless `ctx` carries `DISALLOW_IN`.
    pub(super) fn parse_expression(&mut self, ctx: Context) -> ParseResult<Expression> {
        self.parse_expression_with(ctx, None)
    }

    pub(super) fn parse_expression_with(
        &mut self,
        ctx: Context,
        mut cover: Option<&mut CoverGrammar>,
    ) -> ParseResult<Expression> {
        let start = self.token.start;
        let first = self.parse_maybe_assign(ctx, cover.as_deref_mut())?;
        if !self.at(&Token::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&Token::Comma)? {
            expressions.push(self.parse_maybe_assign(ctx, cover.as_deref_mut())?);
        }
        Ok(Expression::Sequence(Box::new(SequenceExpression {
            expressions,
            span: self.span_from(start),
        })))
    }

    pub(super) fn parse_assignment_expression(&mut self, ctx: Context) -> ParseResult<Expression> {
        self.parse_maybe_assign(ctx, None)
    }

    /// An arrow function not wrapped in parentheses ends the expression it starts.
    fn is_bare_arrow(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::ArrowFunction(_)) && !self.is_parenthesized(expr.span())
    }

    /// AssignmentExpression. With a caller-provided `cover`, errors that
    /// depend on the literal's eventual role are left for the caller.
    pub(super) fn parse_maybe_assign(
        &mut self,
        ctx: Context,
        cover: Option<&mut CoverGrammar>,
    ) -> ParseResult<Expression> {
        self.nested(|p| p.parse_maybe_assign_nested(ctx, cover))
    }

    fn parse_maybe_assign_nested(
        &mut self,
        ctx: Context,
        cover: Option<&mut CoverGrammar>,
    ) -> ParseResult<Expression> {
        if self.at_keyword(Keyword::Yield) && ctx.contains(Context::IN_GENERATOR) {
            return self.parse_yield(ctx);
        }

        let owns_cover = cover.is_none();
        let mut own = CoverGrammar::default();
        let cover = match cover {
            Some(cover) => cover,
            None => &mut own,
        };
        let old_trailing_comma = cover.trailing_comma.take();
        let old_double_proto = cover.double_proto;

        let start = self.token.start;
        if self.at(&Token::LeftParen) || self.identifier_text().is_some() {
            self.potential_arrow_at = Some(start);
        }
        let left = self.parse_conditional(ctx, cover)?;

        if let Some(operator) = assignment_operator(&self.token.token) {
            let left_start = left.span().start;
            let target = if operator == AssignmentOperator::Assign {
                self.check_pattern_errors(cover)?;
                self.to_pattern(left, TargetKind::Assignment, ctx)?
            } else {
                self.to_simple_target(left, ctx)?
            };
            if !owns_cover {
                cover.trailing_comma = None;
                cover.double_proto = None;
            }
            if cover.shorthand_assign.is_some_and(|pos| pos >= left_start) {
                cover.shorthand_assign = None;
            }
            self.advance()?;
            let right = self.parse_maybe_assign(ctx, None)?;
            if old_double_proto.is_some() {
                cover.double_proto = old_double_proto;
            }
            return Ok(Expression::Assignment(Box::new(AssignmentExpression {
                operator,
                left: target,
                right,
                span: self.span_from(start),
            })));
        }

        if owns_cover {
            self.check_expression_errors(cover)?;
        }
        if old_trailing_comma.is_some() {
            cover.trailing_comma = old_trailing_comma;
        }
        Ok(left)
    }

    fn parse_yield(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        if ctx.contains(Context::IN_FORMAL_PARAMETERS) {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Yield expression cannot be a default value",
            ));
        }
        self.yield_pos.get_or_insert(start);
        self.advance()?;

        let mut delegate = false;
        let argument = if self.token.newline_before() {
            None
        } else if self.eat(&Token::Star)? {
            delegate = true;
            Some(self.parse_maybe_assign(ctx, None)?)
        } else if starts_expression(&self.token.token) {
            Some(self.parse_maybe_assign(ctx, None)?)
        } else {
            None
        };
        Ok(Expression::Yield(Box::new(YieldExpression {
            argument,
            delegate,
            span: self.span_from(start),
        })))
    }

    fn parse_conditional(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Expression> {
        let start = self.token.start;
        let test = self.parse_binary_expression(ctx, cover)?;
        if Self::has_expression_errors(cover) || self.is_bare_arrow(&test) || !self.at(&Token::Question) {
            return Ok(test);
        }
        self.advance()?;
        let consequent = self.parse_maybe_assign(ctx.without(Context::DISALLOW_IN), None)?;
        self.expect(&Token::Colon)?;
        let alternate = self.parse_maybe_assign(ctx, None)?;
        Ok(Expression::Conditional(Box::new(ConditionalExpression {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        })))
    }

    fn parse_binary_expression(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Expression> {
        let start = self.token.start;
        let left = self.parse_unary(ctx, cover, false, false)?;
        if Self::has_expression_errors(cover) || self.is_bare_arrow(&left) {
            return Ok(left);
        }
        self.parse_binary_rhs(ctx, left, start, 0)
    }

    fn parse_binary_rhs(
        &mut self,
        ctx: Context,
        mut left: Expression,
        left_start: u32,
        min_prec: u8,
    ) -> ParseResult<Expression> {
        loop {
            let Some(prec) = binary_precedence(&self.token.token) else {
                return Ok(left);
            };
            if prec <= min_prec
                || (self.at_keyword(Keyword::In) && ctx.contains(Context::DISALLOW_IN))
            {
                return Ok(left);
            }
            let Some(op) = binary_operator(&self.token.token) else {
                return Ok(left);
            };
            let is_logical = matches!(op, BinaryOp::Logical(LogicalOperator::Or | LogicalOperator::And));
            let is_coalesce = matches!(op, BinaryOp::Logical(LogicalOperator::NullishCoalescing));
            // `??` binds its right operand like `&&`.
            let right_prec = if is_coalesce { 2 } else { prec };
            self.advance()?;

            let right_start = self.token.start;
            let mut right_cover = CoverGrammar::default();
            let right = self.parse_unary(ctx, &mut right_cover, false, false)?;
            self.check_expression_errors(&right_cover)?;
            let right = self.parse_binary_rhs(ctx, right, right_start, right_prec)?;

            if let Expression::PrivateIdentifier(id) = &right {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    id.span.start,
                    "Unexpected private name",
                ));
            }
            if let Expression::PrivateIdentifier(id) = &left {
                if !matches!(op, BinaryOp::Binary(BinaryOperator::In)) {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        id.span.start,
                        "Unexpected private name",
                    ));
                }
            }

            let span = self.span_from(left_start);
            left = match op {
                BinaryOp::Binary(operator) => Expression::Binary(Box::new(BinaryExpression {
                    left,
                    operator,
                    right,
                    span,
                })),
                BinaryOp::Logical(operator) => Expression::Logical(Box::new(LogicalExpression {
                    left,
                    operator,
                    right,
                    span,
                })),
            };

            let mixes = (is_logical && self.at(&Token::NullishCoalescing))
                || (is_coalesce && matches!(self.token.token, Token::LogicalOr | Token::LogicalAnd));
            if mixes {
                return Err(self.error(
                    ErrorKind::UnexpectedToken,
                    "Logical expressions and coalesce expressions cannot be mixed. Wrap either by parentheses",
                ));
            }
        }
    }

    pub(super) fn await_allowed(&self, ctx: Context) -> bool {
        ctx.contains(Context::IN_ASYNC)
            || (ctx.is_module()
                && !ctx.intersects(Context::IN_FUNCTION | Context::IN_CLASS_FIELD | Context::IN_STATIC_BLOCK))
    }

    /// UnaryExpression, UpdateExpression and `**`. `saw_unary` rejects an
    /// unparenthesized unary operand of `**`; `inc_dec` leaves `**` to the
    /// caller.
    fn parse_unary(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
        saw_unary: bool,
        inc_dec: bool,
    ) -> ParseResult<Expression> {
        self.nested(|p| p.parse_unary_nested(ctx, cover, saw_unary, inc_dec))
    }

    fn parse_unary_nested(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
        saw_unary: bool,
        inc_dec: bool,
    ) -> ParseResult<Expression> {
        let start = self.token.start;
        let mut saw_unary = saw_unary;

        let expr = if self.at_keyword(Keyword::Await) && self.await_allowed(ctx) {
            saw_unary = true;
            self.parse_await(ctx)?
        } else if let Some(operator) = unary_operator(&self.token.token) {
            self.advance()?;
            let mut inner = CoverGrammar::default();
            let argument = self.parse_unary(ctx, &mut inner, true, false)?;
            self.check_expression_errors(&inner)?;
            if operator == UnaryOperator::Delete {
                if ctx.is_strict() && matches!(argument, Expression::Identifier(_)) {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        start,
                        "Deleting local variable in strict mode",
                    ));
                }
                if is_private_member(&argument) {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        start,
                        "Private fields can not be deleted",
                    ));
                }
            }
            saw_unary = true;
            Expression::Unary(Box::new(UnaryExpression {
                operator,
                prefix: true,
                argument,
                span: self.span_from(start),
            }))
        } else if matches!(self.token.token, Token::Increment | Token::Decrement) {
            let operator = if self.at(&Token::Increment) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance()?;
            let mut inner = CoverGrammar::default();
            let argument = self.parse_unary(ctx, &mut inner, true, true)?;
            self.check_expression_errors(&inner)?;
            self.check_simple_target(&argument, ctx)?;
            Expression::Update(Box::new(UpdateExpression {
                operator,
                prefix: true,
                argument,
                span: self.span_from(start),
            }))
        } else if !saw_unary && matches!(self.token.token, Token::PrivateName(_)) {
            let id = self.parse_private_identifier(ctx)?;
            if !self.at_keyword(Keyword::In) || ctx.contains(Context::DISALLOW_IN) {
                return Err(self.unexpected());
            }
            Expression::PrivateIdentifier(id)
        } else {
            let mut expr = self.parse_subscripts_expression(ctx, cover)?;
            if Self::has_expression_errors(cover) {
                return Ok(expr);
            }
            while matches!(self.token.token, Token::Increment | Token::Decrement)
                && !self.token.newline_before()
            {
                let operator = if self.at(&Token::Increment) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.check_simple_target(&expr, ctx)?;
                self.advance()?;
                expr = Expression::Update(Box::new(UpdateExpression {
                    operator,
                    prefix: false,
                    argument: expr,
                    span: self.span_from(start),
                }));
            }
            expr
        };

        if inc_dec || !self.at(&Token::Exponent) || self.is_bare_arrow(&expr) {
            return Ok(expr);
        }
        if saw_unary {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
            ));
        }
        self.advance()?;
        let mut inner = CoverGrammar::default();
        let right = self.parse_unary(ctx, &mut inner, false, false)?;
        self.check_expression_errors(&inner)?;
        Ok(Expression::Binary(Box::new(BinaryExpression {
            left: expr,
            operator: BinaryOperator::Exponent,
            right,
            span: self.span_from(start),
        })))
    }

    fn parse_await(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        if ctx.contains(Context::IN_FORMAL_PARAMETERS) {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                "Await expression cannot be a default value",
            ));
        }
        self.await_pos.get_or_insert(start);
        self.advance()?;
        let mut inner = CoverGrammar::default();
        let argument = self.parse_unary(ctx, &mut inner, true, false)?;
        self.check_expression_errors(&inner)?;
        Ok(Expression::Await(Box::new(AwaitExpression {
            argument,
            span: self.span_from(start),
        })))
    }

    pub(super) fn parse_private_identifier(&mut self, ctx: Context) -> ParseResult<PrivateIdentifier> {
        let Token::PrivateName(name) = &self.token.token else {
            return Err(self.unexpected());
        };
        let name = name.clone();
        if !ctx.allows_next() || !ctx.contains(Context::IN_CLASS_BODY) || self.private_scopes.is_empty() {
            return Err(self.error(
                ErrorKind::UnexpectedToken,
                format!("Private field '#{name}' must be declared in an enclosing class"),
            ));
        }
        let start = self.token.start;
        if let Some(scope) = self.private_scopes.last_mut() {
            scope.unresolved.push((name.clone(), start));
        }
        self.advance()?;
        Ok(PrivateIdentifier {
            name,
            span: self.span_from(start),
        })
    }

    // ---- left-hand side ----------------------------------------------------

    /// LeftHandSideExpression.
    pub(super) fn parse_subscripts_expression(
        &mut self,
        ctx: Context,
        cover: &mut CoverGrammar,
    ) -> ParseResult<Expression> {
        let start = self.token.start;
        let base = self.parse_primary(ctx, cover)?;
        if self.is_bare_arrow(&base) {
            return Ok(base);
        }
        let result = self.parse_subscripts(ctx, base, start, false)?;
        if let Expression::Member(member) = &result {
            if cover.trailing_comma.is_some_and(|pos| pos >= member.span.start) {
                cover.trailing_comma = None;
            }
        }
        Ok(result)
    }

    /// Member accesses, calls, tagged templates and optional chains after
    /// `base`. With `no_calls` (a `new` callee) the loop stops at `(`.
    fn parse_subscripts(
        &mut self,
        ctx: Context,
        base: Expression,
        start: u32,
        no_calls: bool,
    ) -> ParseResult<Expression> {
        let maybe_async_arrow = !no_calls
            && matches!(&base, Expression::Identifier(id)
                if id.name == "async" && id.span.end - id.span.start == 5)
            && self.potential_arrow_at == Some(start)
            && !self.is_parenthesized(base.span());
        let mut expr = base;
        let mut in_chain = false;

        loop {
            match self.token.token {
                Token::OptionalChain => {
                    if no_calls {
                        return Err(self.error(
                            ErrorKind::UnexpectedToken,
                            "Optional chaining cannot appear in the callee of new expressions",
                        ));
                    }
                    in_chain = true;
                    self.advance()?;
                    expr = match self.token.token {
                        Token::LeftParen => {
                            let arguments = self.parse_arguments(ctx)?;
                            Expression::Call(Box::new(CallExpression {
                                callee: expr,
                                arguments,
                                optional: true,
                                span: self.span_from(start),
                            }))
                        }
                        Token::LeftBracket => self.parse_computed_member(ctx, expr, start, true)?,
                        Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                            return Err(self.error(
                                ErrorKind::UnexpectedToken,
                                "Invalid tagged template on optional chain",
                            ));
                        }
                        _ => self.parse_static_member(ctx, expr, start, true)?,
                    };
                }
                Token::Dot => {
                    self.advance()?;
                    expr = self.parse_static_member(ctx, expr, start, false)?;
                }
                Token::LeftBracket => {
                    expr = self.parse_computed_member(ctx, expr, start, false)?;
                }
                Token::LeftParen if !no_calls => {
                    if maybe_async_arrow && !self.token.newline_before() && matches!(&expr, Expression::Identifier(_)) {
                        expr = self.parse_async_call_or_arrow(ctx, expr, start)?;
                        if matches!(expr, Expression::ArrowFunction(_)) {
                            return Ok(expr);
                        }
                        continue;
                    }
                    let arguments = self.parse_arguments(ctx)?;
                    expr = Expression::Call(Box::new(CallExpression {
                        callee: expr,
                        arguments,
                        optional: false,
                        span: self.span_from(start),
                    }));
                }
                Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                    if in_chain {
                        return Err(self.error(
                            ErrorKind::UnexpectedToken,
                            "Invalid tagged template on optional chain",
                        ));
                    }
                    let quasi = self.parse_template(ctx, true)?;
                    expr = Expression::TaggedTemplate(Box::new(TaggedTemplateExpression {
                        tag: expr,
                        quasi,
                        span: self.span_from(start),
                    }));
                }
                _ => break,
            }
        }

        if in_chain {
            expr = Expression::Chain(Box::new(ChainExpression {
                expression: expr,
                span: self.span_from(start),
            }));
        }
        Ok(expr)
    }

    /// The property after `.` or `?.`.
    fn parse_static_member(
        &mut self,
        ctx: Context,
        object: Expression,
        start: u32,
        optional: bool,
    ) -> ParseResult<Expression> {
        let property = if matches!(self.token.token, Token::PrivateName(_)) {
            if matches!(object, Expression::Super(_)) {
                return Err(self.error(ErrorKind::UnexpectedToken, "Unexpected private field"));
            }
            Expression::PrivateIdentifier(self.parse_private_identifier(ctx)?)
        } else {
            Expression::Identifier(self.parse_identifier_name()?)
        };
        Ok(Expression::Member(Box::new(MemberExpression {
            object,
            property,
            computed: false,
            optional,
            span: self.span_from(start),
        })))
    }

    fn parse_computed_member(
        &mut self,
        ctx: Context,
        object: Expression,
        start: u32,
        optional: bool,
    ) -> ParseResult<Expression> {
        self.expect(&Token::LeftBracket)?;
        let property = self.parse_expression(ctx.without(Context::DISALLOW_IN))?;
        self.expect(&Token::RightBracket)?;
        Ok(Expression::Member(Box::new(MemberExpression {
            object,
            property,
            computed: true,
            optional,
            span: self.span_from(start),
        })))
    }

    /// `async(...)`: a call, or the parameters of an async arrow function.
    fn parse_async_call_or_arrow(
        &mut self,
        ctx: Context,
        callee: Expression,
        start: u32,
    ) -> ParseResult<Expression> {
        let old_yield = self.yield_pos.take();
        let old_await = self.await_pos.take();
        let mut cover = CoverGrammar::default();
        self.expect(&Token::LeftParen)?;
        let arguments: Vec<ExpressionOrSpread> = self
            .parse_element_list(ctx, &Token::RightParen, false, Some(&mut cover))?
            .into_iter()
            .flatten()
            .collect();

        if self.at(&Token::Arrow) && !self.token.newline_before() {
            self.check_pattern_errors(&cover)?;
            self.check_yield_await_in_params()?;
            self.yield_pos = old_yield;
            self.await_pos = old_await;
            let names_ctx = ctx.with(Context::IN_ASYNC);
            let count = arguments.len();
            let mut params = Vec::with_capacity(count);
            for (i, argument) in arguments.into_iter().enumerate() {
                let param = match argument {
                    ExpressionOrSpread::Expression(expr) => {
                        self.to_pattern_element(expr, TargetKind::Binding, names_ctx)?
                    }
                    ExpressionOrSpread::Spread(spread) => {
                        if i + 1 != count {
                            return Err(self.error_at(
                                ErrorKind::InvalidRestElementPosition,
                                spread.span.start,
                                "Rest element must be last element",
                            ));
                        }
                        let rest = self.rest_to_pattern(spread, TargetKind::Binding, names_ctx, false)?;
                        Pattern::Rest(Box::new(rest))
                    }
                };
                params.push(param);
            }
            return self.parse_arrow_function(ctx, start, params, true);
        }

        self.check_expression_errors(&cover)?;
        self.yield_pos = old_yield.or(self.yield_pos);
        self.await_pos = old_await.or(self.await_pos);
        Ok(Expression::Call(Box::new(CallExpression {
            callee,
            arguments,
            optional: false,
            span: self.span_from(start),
        })))
    }

    /// Rejects `yield`/`await` expressions in what became a parameter list.
    pub(super) fn check_yield_await_in_params(&self) -> ParseResult<()> {
        if let Some(pos) = self.yield_pos {
            if self.await_pos.is_none_or(|await_pos| pos < await_pos) {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    pos,
                    "Yield expression cannot be a default value",
                ));
            }
        }
        if let Some(pos) = self.await_pos {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                pos,
                "Await expression cannot be a default value",
            ));
        }
        Ok(())
    }

    pub(super) fn parse_arguments(&mut self, ctx: Context) -> ParseResult<Vec<ExpressionOrSpread>> {
        self.expect(&Token::LeftParen)?;
        Ok(self
            .parse_element_list(ctx, &Token::RightParen, false, None)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Comma-separated elements up to and including `close`. The opening
    /// token has already been consumed. Holes are `None` and only appear
    /// with `allow_empty`.
    fn parse_element_list(
        &mut self,
        ctx: Context,
        close: &Token,
        allow_empty: bool,
        mut cover: Option<&mut CoverGrammar>,
    ) -> ParseResult<Vec<Option<ExpressionOrSpread>>> {
        let ctx = ctx.without(Context::DISALLOW_IN);
        let mut elements = Vec::new();
        let mut first = true;
        while !self.eat(close)? {
            if !first {
                self.expect(&Token::Comma)?;
                if self.eat(close)? {
                    break;
                }
            }
            first = false;

            if allow_empty && self.at(&Token::Comma) {
                elements.push(None);
            } else if self.at(&Token::Ellipsis) {
                let spread = self.parse_spread(ctx, cover.as_deref_mut())?;
                if let Some(cover) = cover.as_deref_mut() {
                    if self.at(&Token::Comma) && cover.trailing_comma.is_none() {
                        cover.trailing_comma = Some(self.token.start);
                    }
                }
                elements.push(Some(ExpressionOrSpread::Spread(spread)));
            } else {
                let expr = self.parse_maybe_assign(ctx, cover.as_deref_mut())?;
                elements.push(Some(ExpressionOrSpread::Expression(expr)));
            }
        }
        Ok(elements)
    }

    fn parse_spread(&mut self, ctx: Context, cover: Option<&mut CoverGrammar>) -> ParseResult<SpreadElement> {
        let start = self.token.start;
        self.expect(&Token::Ellipsis)?;
        let argument = self.parse_maybe_assign(ctx.without(Context::DISALLOW_IN), cover)?;
        Ok(SpreadElement {
            argument,
            span: self.span_from(start),
        })
    }

    // ---- primary -----------------------------------------------------------

    fn parse_primary(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Expression> {
        if matches!(self.token.token, Token::Slash | Token::SlashAssign) {
            self.token = self.lexer.rescan_regex(&self.token)?;
        }
        let start = self.token.start;
        match &self.token.token {
            Token::Keyword(Keyword::This) => {
                self.advance()?;
                Ok(Expression::This(ThisExpression {
                    span: self.span_from(start),
                }))
            }
            Token::Keyword(Keyword::Super) => self.parse_super(ctx),
            Token::Keyword(Keyword::Function) => self.parse_function_expression(ctx, start, false),
            Token::Keyword(Keyword::Class) => {
                let class = self.parse_class_expression(ctx)?;
                Ok(Expression::Class(Box::new(class)))
            }
            Token::Keyword(Keyword::New) => self.parse_new(ctx),
            Token::Keyword(Keyword::Import) => self.parse_import_expression(ctx),
            Token::NumericLiteral(_)
            | Token::StringLiteral(_)
            | Token::BigIntLiteral(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral
            | Token::RegExpLiteral { .. } => Ok(Expression::Literal(self.parse_literal(ctx)?)),
            Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                let template = self.parse_template(ctx, false)?;
                Ok(Expression::TemplateLiteral(Box::new(template)))
            }
            Token::LeftParen => self.parse_paren_and_distinguish(ctx),
            Token::LeftBracket => self.parse_array_literal(ctx, cover),
            Token::LeftBrace => self.parse_object_literal(ctx, cover),
            _ if self.identifier_text().is_some() => self.parse_identifier_or_arrow(ctx),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_identifier_or_arrow(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        let can_be_arrow = self.potential_arrow_at == Some(start);
        let is_async = self.at_keyword(Keyword::Async);
        let id = self.parse_identifier_reference(ctx)?;

        if is_async && !self.can_insert_semicolon() && self.at_keyword(Keyword::Function) {
            return self.parse_function_expression(ctx, start, true);
        }
        if can_be_arrow && !self.can_insert_semicolon() {
            if self.at(&Token::Arrow) {
                self.check_identifier(&id.name, id.span.start, ctx, super::IdentifierUse::Binding)?;
                return self.parse_arrow_function(ctx, start, vec![Pattern::Identifier(id)], false);
            }
            if is_async && self.identifier_text().is_some() {
                let param = self.parse_binding_identifier(ctx.with(Context::IN_ASYNC), false)?;
                if self.can_insert_semicolon() || !self.at(&Token::Arrow) {
                    return Err(self.unexpected());
                }
                return self.parse_arrow_function(ctx, start, vec![Pattern::Identifier(param)], true);
            }
        }
        Ok(Expression::Identifier(id))
    }

    pub(super) fn parse_literal(&mut self, ctx: Context) -> ParseResult<Literal> {
        let start = self.token.start;
        let value = match &self.token.token {
            Token::NumericLiteral(n) => {
                if self.token.flags.contains(TokenFlags::LEGACY_OCTAL) && !ctx.allows_web_compat() {
                    return Err(self.error(
                        ErrorKind::LexError,
                        "Octal literals are not allowed in strict mode",
                    ));
                }
                LiteralValue::Number(*n)
            }
            Token::StringLiteral(s) => {
                if self.token.flags.contains(TokenFlags::OCTAL_ESCAPE) && !ctx.allows_web_compat() {
                    return Err(self.error(
                        ErrorKind::LexError,
                        "Octal escape sequences are not allowed in strict mode",
                    ));
                }
                LiteralValue::String(s.clone())
            }
            Token::BigIntLiteral(raw) => LiteralValue::BigInt(bigint_to_decimal(raw)),
            Token::BooleanLiteral(b) => LiteralValue::Boolean(*b),
            Token::NullLiteral => LiteralValue::Null,
            Token::RegExpLiteral { pattern, flags } => LiteralValue::RegExp(RegExpValue {
                pattern: pattern.clone(),
                flags: flags.clone(),
            }),
            _ => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(Literal {
            value,
            span: self.span_from(start),
        })
    }

    /// A template literal; invalid escapes are only tolerated when `tagged`.
    fn parse_template(&mut self, ctx: Context, tagged: bool) -> ParseResult<TemplateLiteral> {
        let start = self.token.start;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        loop {
            let (cooked, raw, tail) = match &self.token.token {
                Token::NoSubstitutionTemplate(cooked, raw) | Token::TemplateTail(cooked, raw) => {
                    (cooked.clone(), raw.clone(), true)
                }
                Token::TemplateHead(cooked, raw) | Token::TemplateMiddle(cooked, raw) => {
                    (cooked.clone(), raw.clone(), false)
                }
                _ => return Err(self.unexpected()),
            };
            if cooked.is_none() && !tagged {
                return Err(self.error(ErrorKind::LexError, "Bad escape sequence in untagged template"));
            }
            // The element excludes the backtick or `}` before it and the
            // backtick or `${` after it.
            let element_start = self.token.start + 1;
            let element_end = if tail { self.token.end - 1 } else { self.token.end - 2 };
            quasis.push(TemplateElement {
                value: TemplateElementValue { cooked, raw },
                tail,
                span: self.span_between(element_start, element_end),
            });
            self.advance()?;
            if tail {
                break;
            }
            expressions.push(self.parse_expression(ctx.without(Context::DISALLOW_IN))?);
            if !self.at(&Token::RightBrace) {
                return Err(self.unexpected());
            }
            self.token = self.lexer.rescan_template_continuation(&self.token)?;
        }
        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: self.span_from(start),
        })
    }

    fn parse_super(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        self.advance()?;
        let allowed = match self.token.token {
            Token::LeftParen => ctx.contains(Context::ALLOW_SUPER_CALL),
            Token::Dot | Token::LeftBracket => ctx.contains(Context::ALLOW_SUPER_PROPERTY),
            _ => false,
        };
        if !allowed {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                start,
                "'super' keyword unexpected here",
            ));
        }
        Ok(Expression::Super(Super {
            span: self.span_from(start),
        }))
    }

    fn parse_new(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        self.advance()?;
        if self.eat(&Token::Dot)? {
            let meta = Identifier {
                name: "new".into(),
                span: self.span_between(start, start + 3),
            };
            if !self.at_contextual("target") {
                return Err(self.unexpected());
            }
            if !ctx.contains(Context::ALLOW_NEW_TARGET) {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    start,
                    "'new.target' can only be used in functions and class static block",
                ));
            }
            let property = self.parse_identifier_name()?;
            return Ok(Expression::MetaProperty(Box::new(MetaProperty {
                meta,
                property,
                span: self.span_from(start),
            })));
        }
        if self.at_keyword(Keyword::Import) {
            return Err(self.error(ErrorKind::UnexpectedToken, "Cannot use new with import(...)"));
        }

        let callee_start = self.token.start;
        let mut cover = CoverGrammar::default();
        let callee = self.parse_primary(ctx, &mut cover)?;
        self.check_expression_errors(&cover)?;
        let callee = self.parse_subscripts(ctx, callee, callee_start, true)?;
        let arguments = if self.at(&Token::LeftParen) {
            self.parse_arguments(ctx)?
        } else {
            Vec::new()
        };
        Ok(Expression::New(Box::new(NewExpression {
            callee,
            arguments,
            span: self.span_from(start),
        })))
    }

    /// `import(source)` or `import.meta`.
    fn parse_import_expression(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        self.advance()?;
        match self.token.token {
            Token::Dot => {
                let meta = Identifier {
                    name: "import".into(),
                    span: self.span_from(start),
                };
                self.advance()?;
                if !self.at_contextual("meta") {
                    return Err(self.unexpected());
                }
                if !ctx.is_module() {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        start,
                        "Cannot use 'import.meta' outside a module",
                    ));
                }
                let property = self.parse_identifier_name()?;
                Ok(Expression::MetaProperty(Box::new(MetaProperty {
                    meta,
                    property,
                    span: self.span_from(start),
                })))
            }
            Token::LeftParen => {
                self.advance()?;
                if self.at(&Token::RightParen) || self.at(&Token::Ellipsis) {
                    return Err(self.unexpected());
                }
                let source = self.parse_assignment_expression(ctx.without(Context::DISALLOW_IN))?;
                self.eat(&Token::Comma)?;
                self.expect(&Token::RightParen)?;
                Ok(Expression::Import(Box::new(ImportExpression {
                    source,
                    span: self.span_from(start),
                })))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `( ... )`: a parenthesized expression or arrow parameters.
    fn parse_paren_and_distinguish(&mut self, ctx: Context) -> ParseResult<Expression> {
        let start = self.token.start;
        let can_be_arrow = self.potential_arrow_at == Some(start);
        self.advance()?;

        let old_yield = self.yield_pos.take();
        let old_await = self.await_pos.take();
        let inner_ctx = ctx.without(Context::DISALLOW_IN);
        let inner_start = self.token.start;
        let mut cover = CoverGrammar::default();
        let mut items = Vec::new();
        let mut trailing_comma = None;
        let mut rest_at = None;

        while !self.at(&Token::RightParen) {
            if !items.is_empty() {
                let comma = self.token.start;
                self.expect(&Token::Comma)?;
                if self.at(&Token::RightParen) {
                    trailing_comma = Some(comma);
                    break;
                }
            }
            if self.at(&Token::Ellipsis) {
                rest_at = Some(self.token.start);
                let rest = self.parse_binding_rest(inner_ctx, false)?;
                items.push(ParenItem::Rest(rest));
                break;
            }
            let expr = self.parse_maybe_assign(inner_ctx, Some(&mut cover))?;
            items.push(ParenItem::Expression(expr));
        }
        let inner_end = self.prev_end;
        let close = self.token.start;
        self.expect(&Token::RightParen)?;

        if can_be_arrow && self.at(&Token::Arrow) && !self.token.newline_before() {
            self.check_pattern_errors(&cover)?;
            self.check_yield_await_in_params()?;
            self.yield_pos = old_yield;
            self.await_pos = old_await;
            let mut params = Vec::with_capacity(items.len());
            for item in items {
                params.push(match item {
                    ParenItem::Expression(expr) => self.to_pattern_element(expr, TargetKind::Binding, ctx)?,
                    ParenItem::Rest(rest) => Pattern::Rest(Box::new(rest)),
                });
            }
            return self.parse_arrow_function(ctx, start, params, false);
        }

        if items.is_empty() {
            return Err(self.error_at(ErrorKind::UnexpectedToken, close, "Unexpected token ')'"));
        }
        if let Some(pos) = trailing_comma {
            return Err(self.error_at(ErrorKind::UnexpectedToken, pos, "Unexpected token ','"));
        }
        if let Some(pos) = rest_at {
            return Err(self.error_at(ErrorKind::UnexpectedToken, pos, "Unexpected token '...'"));
        }
        self.check_expression_errors(&cover)?;
        self.yield_pos = old_yield.or(self.yield_pos);
        self.await_pos = old_await.or(self.await_pos);

        let mut expressions: Vec<Expression> = items
            .into_iter()
            .filter_map(|item| match item {
                ParenItem::Expression(expr) => Some(expr),
                ParenItem::Rest(_) => None,
            })
            .collect();
        let expression = if expressions.len() == 1 {
            expressions.remove(0)
        } else {
            Expression::Sequence(Box::new(SequenceExpression {
                expressions,
                span: self.span_between(inner_start, inner_end),
            }))
        };
        let span = expression.span();
        self.parenthesized.insert((span.start, span.end));
        Ok(expression)
    }

    fn parse_array_literal(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Expression> {
        let start = self.token.start;
        self.expect(&Token::LeftBracket)?;
        let elements = self.parse_element_list(ctx, &Token::RightBracket, true, Some(cover))?;
        Ok(Expression::Array(Box::new(ArrayExpression {
            elements,
            span: self.span_from(start),
        })))
    }

    fn parse_object_literal(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Expression> {
        let start = self.token.start;
        self.expect(&Token::LeftBrace)?;
        let ctx = ctx.without(Context::DISALLOW_IN);
        let mut properties = Vec::new();
        let mut has_proto = false;
        let mut first = true;
        while !self.eat(&Token::RightBrace)? {
            if !first {
                self.expect(&Token::Comma)?;
                if self.eat(&Token::RightBrace)? {
                    break;
                }
            }
            first = false;

            if self.at(&Token::Ellipsis) {
                let spread = self.parse_spread(ctx, Some(&mut *cover))?;
                if self.at(&Token::Comma) && cover.trailing_comma.is_none() {
                    cover.trailing_comma = Some(self.token.start);
                }
                properties.push(ObjectMember::Spread(spread));
                continue;
            }

            let property = self.parse_object_property(ctx, cover)?;
            if !property.computed
                && !property.shorthand
                && !property.method
                && property.kind == PropertyKind::Init
                && property_key_is(&property.key, "__proto__")
            {
                if has_proto && cover.double_proto.is_none() {
                    cover.double_proto = Some(property.key.span().start);
                }
                has_proto = true;
            }
            properties.push(ObjectMember::Property(property));
        }
        Ok(Expression::Object(Box::new(ObjectExpression {
            properties,
            span: self.span_from(start),
        })))
    }

    /// Whether the token after the current `async`, `get` or `set` makes it
    /// a modifier rather than the property name itself.
    fn is_property_modifier(&self, newline_matters: bool) -> ParseResult<bool> {
        let next = self.peek()?;
        if newline_matters && next.newline_before() {
            return Ok(false);
        }
        Ok(!matches!(
            next.token,
            Token::Comma | Token::RightBrace | Token::Colon | Token::LeftParen | Token::Assign | Token::Eof
        ))
    }

    fn parse_object_property(&mut self, ctx: Context, cover: &mut CoverGrammar) -> ParseResult<Property> {
        let start = self.token.start;
        let mut is_async = false;
        let mut is_generator = false;
        let mut kind = PropertyKind::Init;

        if self.at_keyword(Keyword::Async) && self.is_property_modifier(true)? {
            is_async = true;
            self.advance()?;
        }
        if self.eat(&Token::Star)? {
            is_generator = true;
        }
        if !is_async && !is_generator && (self.at_contextual("get") || self.at_contextual("set")) && self.is_property_modifier(false)? {
            kind = if self.at_contextual("get") {
                PropertyKind::Get
            } else {
                PropertyKind::Set
            };
            self.advance()?;
        }

        let named_by_identifier = self.identifier_name_text().is_some();
        let (key, computed) = self.parse_property_name(ctx)?;

        if is_async || is_generator || kind != PropertyKind::Init || self.at(&Token::LeftParen) {
            let value = self.parse_method(ctx, is_async, is_generator, kind, false)?;
            return Ok(Property {
                key,
                value: Expression::Function(Box::new(value)),
                kind,
                computed,
                method: kind == PropertyKind::Init,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        if self.eat(&Token::Colon)? {
            let value = self.parse_maybe_assign(ctx, Some(cover))?;
            return Ok(Property {
                key,
                value,
                kind,
                computed,
                method: false,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        let id = match &key {
            Expression::Identifier(id) if named_by_identifier && !computed => id.clone(),
            _ => return Err(self.unexpected()),
        };
        self.check_identifier(&id.name, id.span.start, ctx, super::IdentifierUse::Reference)?;
        let value = if self.at(&Token::Assign) {
            if cover.shorthand_assign.is_none() {
                cover.shorthand_assign = Some(self.token.start);
            }
            self.advance()?;
            let right = self.parse_maybe_assign(ctx, None)?;
            Expression::Assignment(Box::new(AssignmentExpression {
                operator: AssignmentOperator::Assign,
                left: Pattern::Identifier(id),
                right,
                span: self.span_from(start),
            }))
        } else {
            Expression::Identifier(id)
        };
        Ok(Property {
            key,
            value,
            kind,
            computed: false,
            method: false,
            shorthand: true,
            span: self.span_from(start),
        })
    }

    /// PropertyName: identifier name, string, number or `[expression]`.
    /// Returns the key and whether it is computed.
    pub(super) fn parse_property_name(&mut self, ctx: Context) -> ParseResult<(Expression, bool)> {
        match self.token.token {
            Token::StringLiteral(_) | Token::NumericLiteral(_) | Token::BigIntLiteral(_) => {
                Ok((Expression::Literal(self.parse_literal(ctx)?), false))
            }
            Token::LeftBracket => {
                self.advance()?;
                let key = self.parse_assignment_expression(ctx.without(Context::DISALLOW_IN))?;
                self.expect(&Token::RightBracket)?;
                Ok((key, true))
            }
            _ => Ok((Expression::Identifier(self.parse_identifier_name()?), false)),
        }
    }

    /// Records a private name declared in the innermost class body.
    pub(super) fn declare_private_name(
        &mut self,
        name: &str,
        kind: PrivateNameKind,
        is_static: bool,
        pos: u32,
    ) -> ParseResult<()> {
        let Some(scope) = self.private_scopes.last() else {
            return Ok(());
        };
        let (clash, stored) = match scope.declared.get(name) {
            None => (false, kind),
            Some(&(previous, previous_static)) => {
                let pairs = previous_static == is_static
                    && matches!(
                        (previous, kind),
                        (PrivateNameKind::Getter, PrivateNameKind::Setter)
                            | (PrivateNameKind::Setter, PrivateNameKind::Getter)
                    );
                (!pairs, PrivateNameKind::Other)
            }
        };
        if clash {
            return Err(self.error_at(
                ErrorKind::DuplicateBinding,
                pos,
                format!("Identifier '#{name}' has already been declared"),
            ));
        }
        if let Some(scope) = self.private_scopes.last_mut() {
            scope.declared.insert(name.to_string(), (stored, is_static));
        }
        Ok(())
    }

    /// Leaves a class body, handing names it does not declare to the
    /// enclosing class.
    pub(super) fn exit_private_scope(&mut self) -> ParseResult<()> {
        let Some(scope) = self.private_scopes.pop() else {
            return Ok(());
        };
        for (name, pos) in scope.unresolved {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.private_scopes.last_mut() {
                Some(parent) => parent.unresolved.push((name, pos)),
                None => {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        pos,
                        format!("Private field '#{name}' must be declared in an enclosing class"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A non-computed key spelled `name`, as an identifier or a string.
pub(super) fn property_key_is(key: &Expression, name: &str) -> bool {
    match key {
        Expression::Identifier(id) => id.name == name,
        Expression::Literal(lit) => lit.as_str() == Some(name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::parse_script;

    fn expr(src: &str) -> Expression {
        expr_with(src, Context::EMPTY)
    }

    fn expr_with(src: &str, ctx: Context) -> Expression {
        let program = parse_script(src, ctx).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::Expression(stmt)) => stmt.expression,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    fn error_kind(src: &str, ctx: Context) -> ErrorKind {
        parse_script(src, ctx).unwrap_err().kind
    }

    #[test]
    fn binary_precedence_nests() {
        let Expression::Binary(add) = expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
        assert!(matches!(&add.right, Expression::Binary(mul) if mul.operator == BinaryOperator::Multiply));
    }

    #[test]
    fn exponent_is_right_associative() {
        let Expression::Binary(outer) = expr("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert!(matches!(&outer.left, Expression::Literal(_)));
        assert!(matches!(&outer.right, Expression::Binary(_)));
    }

    #[test]
    fn unary_before_exponent_is_rejected() {
        assert_eq!(error_kind("-x ** 2", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("typeof x ** 2", Context::EMPTY), ErrorKind::UnexpectedToken);
        expr("(-x) ** 2");
        expr("++x ** 2");
    }

    #[test]
    fn nullish_cannot_mix_with_logical() {
        assert_eq!(error_kind("a ?? b || c", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("a && b ?? c", Context::EMPTY), ErrorKind::UnexpectedToken);
        expr("(a ?? b) || c");
        expr("a ?? (b && c)");
    }

    #[test]
    fn optional_chain_is_wrapped_once() {
        let Expression::Chain(chain) = expr("a?.b.c()") else {
            panic!("expected chain");
        };
        let Expression::Call(call) = &chain.expression else {
            panic!("expected call");
        };
        assert!(!call.optional);
        assert!(matches!(&call.callee, Expression::Member(m) if !m.optional));
    }

    #[test]
    fn optional_chain_restrictions() {
        assert_eq!(error_kind("a?.b`t`", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("new a?.b()", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn arrow_functions() {
        assert!(matches!(expr("x => x"), Expression::ArrowFunction(a) if a.expression));
        assert!(matches!(expr("(a, b) => {}"), Expression::ArrowFunction(a) if a.params.len() == 2));
        assert!(matches!(expr("async x => x"), Expression::ArrowFunction(a) if a.is_async));
        assert!(matches!(expr("async (x, ...y) => x"), Expression::ArrowFunction(a) if a.is_async));
        assert!(matches!(expr("async (x)"), Expression::Call(_)));
        assert_eq!(error_kind("(a, a) => 1", Context::EMPTY), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("(a,)", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("()", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn sequence_in_parens_spans_contents() {
        let Expression::Sequence(seq) = expr("(a, b)") else {
            panic!("expected sequence");
        };
        assert_eq!((seq.span.start, seq.span.end), (1, 5));
    }

    #[test]
    fn yield_and_await_contexts() {
        let program = parse_script("function* g() { yield; yield* a; yield\nb }", Context::EMPTY).unwrap();
        assert_eq!(program.body.len(), 1);
        parse_script("async function f() { await x; }", Context::EMPTY).unwrap();
        expr("yield");
        expr("await");
        assert_eq!(
            error_kind("function* g(a = yield) {}", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        assert_eq!(
            error_kind("async function f(a = await 1) {}", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
    }

    #[test]
    fn templates() {
        let Expression::TemplateLiteral(template) = expr("`a${b}c`") else {
            panic!("expected template");
        };
        assert_eq!(template.quasis.len(), 2);
        assert_eq!((template.quasis[0].span.start, template.quasis[0].span.end), (1, 2));
        assert_eq!((template.quasis[1].span.start, template.quasis[1].span.end), (6, 7));
        assert!(template.quasis[1].tail);
        assert_eq!(error_kind(r"`\unicode`", Context::EMPTY), ErrorKind::LexError);
        assert!(matches!(expr(r"tag`\unicode`"), Expression::TaggedTemplate(t) if t.quasi.quasis[0].value.cooked.is_none()));
    }

    #[test]
    fn regex_versus_division() {
        assert!(matches!(expr("a / b / c"), Expression::Binary(_)));
        assert!(matches!(
            expr("/=a/g"),
            Expression::Literal(Literal { value: LiteralValue::RegExp(RegExpValue { ref pattern, .. }), .. }) if pattern == "=a"
        ));
    }

    #[test]
    fn bigint_values_are_decimal() {
        let Expression::Literal(lit) = expr("0xFFn") else {
            panic!("expected literal");
        };
        assert_eq!(lit.value, LiteralValue::BigInt("255".into()));
    }

    #[test]
    fn legacy_octal_literals() {
        expr("010");
        assert_eq!(error_kind("010", Context::STRICT), ErrorKind::LexError);
        assert_eq!(error_kind("010", Context::OPTIONS_DISABLE_WEB_COMPAT), ErrorKind::LexError);
    }

    #[test]
    fn super_and_new_target_placement() {
        assert_eq!(error_kind("super.x", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("new.target", Context::EMPTY), ErrorKind::UnexpectedToken);
        parse_script("function f() { new.target }", Context::EMPTY).unwrap();
        parse_script("({ m() { super.x } })", Context::EMPTY).unwrap();
        assert_eq!(
            error_kind("({ m() { super() } })", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
    }

    #[test]
    fn strict_delete_of_identifier() {
        expr("delete x");
        assert_eq!(error_kind("delete x", Context::STRICT), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("delete (x)", Context::STRICT), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn update_targets() {
        assert_eq!(error_kind("1++", Context::EMPTY), ErrorKind::InvalidDestructuringTarget);
        assert_eq!(error_kind("++a()", Context::EMPTY), ErrorKind::InvalidDestructuringTarget);
        assert_eq!(error_kind("a + b += 1", Context::EMPTY), ErrorKind::InvalidDestructuringTarget);
        expr("a.b++");
        expr("(a)++");
    }

    #[test]
    fn object_literal_members() {
        let Expression::Object(object) = expr("({a, b: 1, get c() {}, set c(v) {}, async *d() {}, [e]: 2})") else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 6);
        assert!(matches!(&object.properties[2], ObjectMember::Property(p) if p.kind == PropertyKind::Get));
        assert!(matches!(&object.properties[4], ObjectMember::Property(p) if p.method));
        assert!(matches!(&object.properties[5], ObjectMember::Property(p) if p.computed));
        expr("({get, set, async})");
        assert_eq!(error_kind("({get a(b) {}})", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("({set a() {}})", Context::EMPTY), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn dynamic_import_and_import_meta() {
        assert!(matches!(expr("import('x')"), Expression::Import(_)));
        assert_eq!(error_kind("import.meta", Context::EMPTY), ErrorKind::UnexpectedToken);
    }
}
