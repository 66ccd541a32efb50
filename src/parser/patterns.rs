//! Binding patterns parsed directly, and the reinterpretation of already
//! parsed expressions as assignment targets or arrow parameters.

use rustc_hash::FxHashSet;

use super::scope::BindingKind;
use super::{IdentifierUse, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseError, ParseResult};
use crate::lexer::Token;

/// Positions recorded while parsing an array or object literal whose role
/// (expression or pattern) is not known yet.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CoverGrammar {
    /// `{ x = 1 }`: only valid once the literal becomes a pattern.
    pub(super) shorthand_assign: Option<u32>,
    /// A comma after a spread element: invalid in a pattern.
    pub(super) trailing_comma: Option<u32>,
    /// A repeated `__proto__: value`: invalid in an expression.
    pub(super) double_proto: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TargetKind {
    /// Left-hand side of `=` or of a `for-in`/`for-of` head.
    Assignment,
    /// Arrow function parameters.
    Binding,
}

impl<'a> Parser<'a> {
    // ---- cover grammar -----------------------------------------------------

    pub(super) fn has_expression_errors(cover: &CoverGrammar) -> bool {
        cover.shorthand_assign.is_some() || cover.double_proto.is_some()
    }

    /// Fails if the literal can only be valid as a pattern.
    pub(super) fn check_expression_errors(&self, cover: &CoverGrammar) -> ParseResult<()> {
        if let Some(pos) = cover.shorthand_assign {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                pos,
                "Shorthand property assignments are valid only in destructuring patterns",
            ));
        }
        if let Some(pos) = cover.double_proto {
            return Err(self.error_at(
                ErrorKind::UnexpectedToken,
                pos,
                "Redefinition of __proto__ property",
            ));
        }
        Ok(())
    }

    /// Fails if the literal cannot be valid as a pattern.
    pub(super) fn check_pattern_errors(&self, cover: &CoverGrammar) -> ParseResult<()> {
        match cover.trailing_comma {
            Some(pos) => Err(self.error_at(
                ErrorKind::InvalidRestElementPosition,
                pos,
                "Comma is not permitted after the rest element",
            )),
            None => Ok(()),
        }
    }

    fn invalid_target(&self, pos: u32) -> ParseError {
        self.error_at(
            ErrorKind::InvalidDestructuringTarget,
            pos,
            "Invalid destructuring assignment target",
        )
    }

    fn rest_not_last(&self, pos: u32) -> ParseError {
        self.error_at(
            ErrorKind::InvalidRestElementPosition,
            pos,
            "Rest element must be last element",
        )
    }

    // ---- direct binding patterns -------------------------------------------

    /// BindingIdentifier or BindingPattern, without a default.
    pub(super) fn parse_binding_pattern(&mut self, ctx: Context, lexical: bool) -> ParseResult<Pattern> {
        match self.token.token {
            Token::LeftBracket => self.nested(|p| p.parse_array_binding_pattern(ctx, lexical)),
            Token::LeftBrace => self.nested(|p| p.parse_object_binding_pattern(ctx, lexical)),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier(ctx, lexical)?)),
        }
    }

    /// A binding target with an optional `= default`.
    pub(super) fn parse_binding_element(&mut self, ctx: Context, lexical: bool) -> ParseResult<Pattern> {
        let start = self.token.start;
        let left = self.parse_binding_pattern(ctx, lexical)?;
        if !self.eat(&Token::Assign)? {
            return Ok(left);
        }
        let right = self.parse_assignment_expression(ctx.without(Context::DISALLOW_IN))?;
        Ok(Pattern::Assignment(Box::new(AssignmentPattern {
            left,
            right,
            span: self.span_from(start),
        })))
    }

    /// `...target`, which must close the surrounding list.
    pub(super) fn parse_binding_rest(&mut self, ctx: Context, lexical: bool) -> ParseResult<RestElement> {
        let start = self.token.start;
        self.expect(&Token::Ellipsis)?;
        let argument = self.parse_binding_pattern(ctx, lexical)?;
        match self.token.token {
            Token::Assign => Err(self.error(
                ErrorKind::InvalidRestElementPosition,
                "Rest element may not have a default initializer",
            )),
            Token::Comma => Err(self.rest_not_last(self.token.start)),
            _ => Ok(RestElement {
                argument,
                span: self.span_from(start),
            }),
        }
    }

    fn parse_array_binding_pattern(&mut self, ctx: Context, lexical: bool) -> ParseResult<Pattern> {
        let start = self.token.start;
        self.expect(&Token::LeftBracket)?;
        let mut elements = Vec::new();
        loop {
            match self.token.token {
                Token::RightBracket => break,
                Token::Comma => {
                    self.advance()?;
                    elements.push(None);
                }
                Token::Ellipsis => {
                    let rest = self.parse_binding_rest(ctx, lexical)?;
                    elements.push(Some(Pattern::Rest(Box::new(rest))));
                    break;
                }
                _ => {
                    elements.push(Some(self.parse_binding_element(ctx, lexical)?));
                    if !self.at(&Token::RightBracket) {
                        self.expect(&Token::Comma)?;
                    }
                }
            }
        }
        self.expect(&Token::RightBracket)?;
        Ok(Pattern::Array(Box::new(ArrayPattern {
            elements,
            span: self.span_from(start),
        })))
    }

    fn parse_object_binding_pattern(&mut self, ctx: Context, lexical: bool) -> ParseResult<Pattern> {
        let start = self.token.start;
        self.expect(&Token::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.at(&Token::RightBrace) {
            if self.at(&Token::Ellipsis) {
                if !ctx.allows_next() {
                    return Err(self.unexpected());
                }
                let rest_start = self.token.start;
                self.advance()?;
                let argument = Pattern::Identifier(self.parse_binding_identifier(ctx, lexical)?);
                match self.token.token {
                    Token::Comma => return Err(self.rest_not_last(self.token.start)),
                    Token::Assign => {
                        return Err(self.error(
                            ErrorKind::InvalidRestElementPosition,
                            "Rest element may not have a default initializer",
                        ));
                    }
                    _ => {}
                }
                properties.push(ObjectPatternProperty::Rest(RestElement {
                    argument,
                    span: self.span_from(rest_start),
                }));
                break;
            }
            properties.push(ObjectPatternProperty::Property(
                self.parse_binding_property(ctx, lexical)?,
            ));
            if !self.at(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        self.expect(&Token::RightBrace)?;
        Ok(Pattern::Object(Box::new(ObjectPattern {
            properties,
            span: self.span_from(start),
        })))
    }

    fn parse_binding_property(&mut self, ctx: Context, lexical: bool) -> ParseResult<AssignmentProperty> {
        let start = self.token.start;
        let named_by_identifier = self.identifier_name_text().is_some();
        let (key, computed) = self.parse_property_name(ctx)?;

        if self.eat(&Token::Colon)? {
            let value = self.parse_binding_element(ctx, lexical)?;
            return Ok(AssignmentProperty {
                key,
                value,
                kind: PropertyKind::Init,
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
        let usage = if lexical {
            IdentifierUse::LexicalBinding
        } else {
            IdentifierUse::Binding
        };
        self.check_identifier(&id.name, id.span.start, ctx, usage)?;
        let mut value = Pattern::Identifier(id);
        if self.eat(&Token::Assign)? {
            let right = self.parse_assignment_expression(ctx.without(Context::DISALLOW_IN))?;
            value = Pattern::Assignment(Box::new(AssignmentPattern {
                left: value,
                right,
                span: self.span_from(start),
            }));
        }
        Ok(AssignmentProperty {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            method: false,
            shorthand: true,
            span: self.span_from(start),
        })
    }

    // ---- declaring names ---------------------------------------------------

    pub(super) fn declare_pattern(&mut self, pattern: &Pattern, kind: BindingKind) -> ParseResult<()> {
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        for id in names {
            if !self.scope.declare(&id.name, kind) {
                return Err(self.error_at(
                    ErrorKind::DuplicateBinding,
                    id.span.start,
                    format!("Identifier '{}' has already been declared", id.name),
                ));
            }
        }
        Ok(())
    }

    /// Rejects a name bound twice by one parameter list.
    pub(super) fn check_duplicate_params(&self, params: &[Pattern]) -> ParseResult<()> {
        let mut names = Vec::new();
        for param in params {
            param.bound_names(&mut names);
        }
        let mut seen = FxHashSet::default();
        for id in names {
            if !seen.insert(id.name.as_str()) {
                return Err(self.error_at(
                    ErrorKind::DuplicateBinding,
                    id.span.start,
                    "Duplicate parameter name not allowed in this context",
                ));
            }
        }
        Ok(())
    }

    /// Re-validates every bound name, e.g. after a body turned out strict.
    pub(super) fn check_binding_names(&self, pattern: &Pattern, ctx: Context) -> ParseResult<()> {
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        for id in names {
            self.check_identifier(&id.name, id.span.start, ctx, IdentifierUse::Binding)?;
        }
        Ok(())
    }

    // ---- reinterpretation --------------------------------------------------

    /// Turns an expression into a destructuring target.
    pub(super) fn to_pattern(&self, expr: Expression, kind: TargetKind, ctx: Context) -> ParseResult<Pattern> {
        let span = *expr.span();
        let parenthesized = self.is_parenthesized(&span);
        match expr {
            Expression::Identifier(id) => {
                if kind == TargetKind::Binding && parenthesized {
                    return Err(self.invalid_target(span.start));
                }
                self.check_target_identifier(&id, kind, ctx)?;
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(member) if kind == TargetKind::Assignment => Ok(Pattern::Member(member)),
            Expression::Object(object) if !parenthesized => self.object_to_pattern(*object, kind, ctx),
            Expression::Array(array) if !parenthesized => self.array_to_pattern(*array, kind, ctx),
            _ => Err(self.invalid_target(span.start)),
        }
    }

    /// Like [`Self::to_pattern`], also accepting `target = default`.
    pub(super) fn to_pattern_element(
        &self,
        expr: Expression,
        kind: TargetKind,
        ctx: Context,
    ) -> ParseResult<Pattern> {
        let Expression::Assignment(assign) = expr else {
            return self.to_pattern(expr, kind, ctx);
        };
        if assign.operator != AssignmentOperator::Assign || self.is_parenthesized(&assign.span) {
            return Err(self.invalid_target(assign.span.start));
        }
        let AssignmentExpression {
            left, right, span, ..
        } = *assign;
        if kind == TargetKind::Binding {
            self.check_binding_target(&left, ctx)?;
        }
        Ok(Pattern::Assignment(Box::new(AssignmentPattern { left, right, span })))
    }

    /// Target of a compound assignment or an update: an identifier or a member access.
    pub(super) fn check_simple_target(&self, expr: &Expression, ctx: Context) -> ParseResult<()> {
        match expr {
            Expression::Identifier(id) => self.check_target_identifier(id, TargetKind::Assignment, ctx),
            Expression::Member(_) => Ok(()),
            _ => Err(self.error_at(
                ErrorKind::InvalidDestructuringTarget,
                expr.span().start,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    pub(super) fn to_simple_target(&self, expr: Expression, ctx: Context) -> ParseResult<Pattern> {
        self.check_simple_target(&expr, ctx)?;
        match expr {
            Expression::Identifier(id) => Ok(Pattern::Identifier(id)),
            Expression::Member(member) => Ok(Pattern::Member(member)),
            other => Err(self.invalid_target(other.span().start)),
        }
    }

    fn check_target_identifier(&self, id: &Identifier, kind: TargetKind, ctx: Context) -> ParseResult<()> {
        match kind {
            TargetKind::Binding => {
                self.check_identifier(&id.name, id.span.start, ctx, IdentifierUse::Binding)
            }
            TargetKind::Assignment if ctx.is_strict() && matches!(id.name.as_str(), "eval" | "arguments") => {
                Err(self.error_at(
                    ErrorKind::UnexpectedReservedWord,
                    id.span.start,
                    format!("Assigning to '{}' in strict mode", id.name),
                ))
            }
            TargetKind::Assignment => Ok(()),
        }
    }

    /// A pattern built for assignment that is now used as a parameter.
    fn check_binding_target(&self, pattern: &Pattern, ctx: Context) -> ParseResult<()> {
        match pattern {
            Pattern::Identifier(id) => {
                if self.is_parenthesized(&id.span) {
                    return Err(self.invalid_target(id.span.start));
                }
                self.check_identifier(&id.name, id.span.start, ctx, IdentifierUse::Binding)
            }
            Pattern::Member(member) => Err(self.invalid_target(member.span.start)),
            Pattern::Object(object) => {
                for property in &object.properties {
                    match property {
                        ObjectPatternProperty::Property(p) => self.check_binding_target(&p.value, ctx)?,
                        ObjectPatternProperty::Rest(r) => self.check_binding_target(&r.argument, ctx)?,
                    }
                }
                Ok(())
            }
            Pattern::Array(array) => {
                for element in array.elements.iter().flatten() {
                    self.check_binding_target(element, ctx)?;
                }
                Ok(())
            }
            Pattern::Assignment(assign) => self.check_binding_target(&assign.left, ctx),
            Pattern::Rest(rest) => self.check_binding_target(&rest.argument, ctx),
        }
    }

    /// `...argument` of an array target, or of an object target when `object`.
    pub(super) fn rest_to_pattern(
        &self,
        spread: SpreadElement,
        kind: TargetKind,
        ctx: Context,
        object: bool,
    ) -> ParseResult<RestElement> {
        let SpreadElement { argument, span } = spread;
        if matches!(argument, Expression::Assignment(_)) {
            return Err(self.error_at(
                ErrorKind::InvalidRestElementPosition,
                argument.span().start,
                "Rest element may not have a default initializer",
            ));
        }
        if object && !matches!(argument, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.invalid_target(argument.span().start));
        }
        let argument = self.to_pattern(argument, kind, ctx)?;
        Ok(RestElement { argument, span })
    }

    fn array_to_pattern(&self, array: ArrayExpression, kind: TargetKind, ctx: Context) -> ParseResult<Pattern> {
        let count = array.elements.len();
        let mut elements = Vec::with_capacity(count);
        for (i, element) in array.elements.into_iter().enumerate() {
            let pattern = match element {
                None => None,
                Some(ExpressionOrSpread::Spread(spread)) => {
                    if i + 1 != count {
                        return Err(self.rest_not_last(spread.span.start));
                    }
                    let rest = self.rest_to_pattern(spread, kind, ctx, false)?;
                    Some(Pattern::Rest(Box::new(rest)))
                }
                Some(ExpressionOrSpread::Expression(expr)) => {
                    Some(self.to_pattern_element(expr, kind, ctx)?)
                }
            };
            elements.push(pattern);
        }
        Ok(Pattern::Array(Box::new(ArrayPattern {
            elements,
            span: array.span,
        })))
    }

    fn object_to_pattern(&self, object: ObjectExpression, kind: TargetKind, ctx: Context) -> ParseResult<Pattern> {
        let count = object.properties.len();
        let mut properties = Vec::with_capacity(count);
        for (i, member) in object.properties.into_iter().enumerate() {
            match member {
                ObjectMember::Spread(spread) => {
                    if !ctx.allows_next() {
                        return Err(self.error_at(
                            ErrorKind::UnexpectedToken,
                            spread.span.start,
                            "Unexpected token '...'",
                        ));
                    }
                    if i + 1 != count {
                        return Err(self.rest_not_last(spread.span.start));
                    }
                    let rest = self.rest_to_pattern(spread, kind, ctx, true)?;
                    properties.push(ObjectPatternProperty::Rest(rest));
                }
                ObjectMember::Property(property) => {
                    if property.kind != PropertyKind::Init || property.method {
                        return Err(self.invalid_target(property.span.start));
                    }
                    let value = self.to_pattern_element(property.value, kind, ctx)?;
                    properties.push(ObjectPatternProperty::Property(AssignmentProperty {
                        key: property.key,
                        value,
                        kind: PropertyKind::Init,
                        computed: property.computed,
                        method: false,
                        shorthand: property.shorthand,
                        span: property.span,
                    }));
                }
            }
        }
        Ok(Pattern::Object(Box::new(ObjectPattern {
            properties,
            span: object.span,
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::parse_script;

    fn declarator_id(src: &str) -> Pattern {
        let program = parse_script(src, Context::EMPTY).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::VariableDeclaration(mut decl)) => decl.declarations.remove(0).id,
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    fn error_kind(src: &str, ctx: Context) -> ErrorKind {
        parse_script(src, ctx).unwrap_err().kind
    }

    #[test]
    fn empty_patterns() {
        assert!(matches!(declarator_id("const {} = x;"), Pattern::Object(o) if o.properties.is_empty()));
        assert!(matches!(declarator_id("const [] = x;"), Pattern::Array(a) if a.elements.is_empty()));
    }

    #[test]
    fn holes_are_none() {
        let Pattern::Array(array) = declarator_id("let [, a, , b] = x;") else {
            panic!("expected array pattern");
        };
        assert_eq!(array.elements.len(), 4);
        assert!(array.elements[0].is_none());
        assert!(array.elements[2].is_none());
    }

    #[test]
    fn shorthand_with_default() {
        let Pattern::Object(object) = declarator_id("var {a = 1, b: [c] = []} = x;") else {
            panic!("expected object pattern");
        };
        assert!(matches!(
            &object.properties[0],
            ObjectPatternProperty::Property(p) if p.shorthand && matches!(p.value, Pattern::Assignment(_))
        ));
        assert!(matches!(
            &object.properties[1],
            ObjectPatternProperty::Property(p) if !p.shorthand && matches!(p.value, Pattern::Assignment(_))
        ));
    }

    #[test]
    fn malformed_commas() {
        for src in ["const {,} = obj;", "const {x,,} = obj;", "const [.x] = obj;", "const [...,] = obj;"] {
            assert_eq!(error_kind(src, Context::EMPTY), ErrorKind::UnexpectedToken, "{src}");
        }
    }

    #[test]
    fn rest_must_be_last() {
        assert_eq!(
            error_kind("const [...foo, bar] = obj;", Context::EMPTY),
            ErrorKind::InvalidRestElementPosition
        );
        assert_eq!(
            error_kind("[...a, b] = c;", Context::EMPTY),
            ErrorKind::InvalidRestElementPosition
        );
        assert_eq!(
            error_kind("[...a,] = c;", Context::EMPTY),
            ErrorKind::InvalidRestElementPosition
        );
        assert_eq!(
            error_kind("let [...a = 1] = c;", Context::EMPTY),
            ErrorKind::InvalidRestElementPosition
        );
    }

    #[test]
    fn object_rest_needs_next() {
        assert_eq!(error_kind("({...a} = x);", Context::EMPTY), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("let {...a} = x;", Context::EMPTY), ErrorKind::UnexpectedToken);
        parse_script("({...a} = x);", Context::OPTIONS_NEXT).unwrap();
        parse_script("let {a, ...rest} = x;", Context::OPTIONS_NEXT).unwrap();
    }

    #[test]
    fn assignment_patterns_allow_members() {
        let program = parse_script("[a.b, ...c[0]] = d;", Context::EMPTY).unwrap();
        let Statement::Expression(stmt) = &program.body[0] else {
            panic!("expected expression statement");
        };
        let Expression::Assignment(assign) = &stmt.expression else {
            panic!("expected assignment");
        };
        assert!(matches!(&assign.left, Pattern::Array(a) if matches!(a.elements[0], Some(Pattern::Member(_)))));
    }

    #[test]
    fn invalid_targets() {
        for src in ["[a + b] = c;", "({a: 1} = b);", "[a--] = b;", "[++a] = b;", "({a() {}} = b);", "([a]) = b;"] {
            assert_eq!(
                error_kind(src, Context::EMPTY),
                ErrorKind::InvalidDestructuringTarget,
                "{src}"
            );
        }
        parse_script("[(a)] = b; [(a.b)] = c;", Context::EMPTY).unwrap();
    }

    #[test]
    fn shorthand_default_outside_pattern() {
        assert_eq!(error_kind("({a = 1});", Context::EMPTY), ErrorKind::UnexpectedToken);
        parse_script("({a = 1} = b);", Context::EMPTY).unwrap();
        parse_script("[{a = 1}] = b;", Context::EMPTY).unwrap();
    }

    #[test]
    fn duplicate_proto() {
        assert_eq!(
            error_kind("({__proto__: a, __proto__: b});", Context::EMPTY),
            ErrorKind::UnexpectedToken
        );
        parse_script("({__proto__: a, __proto__: b} = c);", Context::EMPTY).unwrap();
        parse_script("({__proto__: a, ['__proto__']: b});", Context::EMPTY).unwrap();
    }
}
