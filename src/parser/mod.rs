use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseError, ParseResult};
use crate::lexer::{Keyword, LexGoal, Lexer, Token, TokenFlags, TokenInfo};
use crate::location::{LineIndex, Span};

mod declarations;
mod expressions;
mod modules;
mod patterns;
mod scope;
mod statements;

use scope::ScopeStack;

/// Deepest nesting of statements, expressions and patterns accepted before
/// parsing gives up instead of exhausting the stack.
const MAX_NESTING: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LabelKind {
    Loop,
    Other,
}

#[derive(Debug)]
struct Label {
    name: String,
    kind: LabelKind,
    /// Offset of the labelled statement, shared by stacked labels.
    statement_start: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PrivateNameKind {
    Getter,
    Setter,
    Other,
}

/// Private names of one class body.
#[derive(Debug, Default)]
struct PrivateScope {
    declared: FxHashMap<String, (PrivateNameKind, bool)>,
    /// Names referenced before (or without) a declaration, with their offset.
    unresolved: Vec<(String, u32)>,
}

/// How an identifier is being used, which decides the words it may not be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdentifierUse {
    Reference,
    Binding,
    /// `let`, `const`, `class` and import bindings.
    LexicalBinding,
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    token: TokenInfo,
    prev_end: u32,
    line_index: LineIndex,
    options: Context,
    scope: ScopeStack,
    labels: Vec<Label>,
    private_scopes: Vec<PrivateScope>,
    /// Spans of expressions that were written inside parentheses.
    parenthesized: FxHashSet<(u32, u32)>,
    /// Start of the expression that may still turn out to be arrow parameters.
    potential_arrow_at: Option<u32>,
    /// First `yield` / `await` expression seen since the enclosing
    /// parameter list started; such lists cannot become arrow parameters.
    yield_pos: Option<u32>,
    await_pos: Option<u32>,
    exported: FxHashSet<String>,
    /// Local names of `export { x }` lists, resolved once the module is parsed.
    local_exports: Vec<(String, u32)>,
    depth: u32,
}

fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
    )
}

fn is_strict_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "implements"
            | "interface"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
    )
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, context: Context) -> ParseResult<Self> {
        let html_comments =
            !context.is_module() && !context.contains(Context::OPTIONS_DISABLE_WEB_COMPAT);
        let mut lexer = Lexer::new(source).with_html_comments(html_comments);
        let token = lexer.next_token(LexGoal::ExpectOperand)?;
        Ok(Self {
            source,
            lexer,
            token,
            prev_end: 0,
            line_index: LineIndex::new(source),
            options: context.options(),
            scope: ScopeStack::new(context.is_module()),
            labels: Vec::new(),
            private_scopes: Vec::new(),
            parenthesized: FxHashSet::default(),
            potential_arrow_at: None,
            yield_pos: None,
            await_pos: None,
            exported: FxHashSet::default(),
            local_exports: Vec::new(),
            depth: 0,
        })
    }

    // ---- token plumbing ----------------------------------------------------

    fn advance(&mut self) -> ParseResult<()> {
        let goal = self.token.token.goal_after();
        self.prev_end = self.token.end;
        self.token = self.lexer.next_token(goal)?;
        Ok(())
    }

    /// Lexes the token after the current one without consuming anything.
    fn peek(&self) -> ParseResult<TokenInfo> {
        let mut lexer = self.lexer.clone();
        Ok(lexer.next_token(self.token.token.goal_after())?)
    }

    fn at(&self, token: &Token) -> bool {
        self.token.token == *token
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.token.token, Token::Keyword(kw) if kw == keyword)
    }

    /// An unescaped identifier spelled `name`, such as `get` or `from`.
    fn at_contextual(&self, name: &str) -> bool {
        matches!(&self.token.token, Token::Identifier(n) if n == name) && !self.token.is_escaped()
    }

    fn eat(&mut self, token: &Token) -> ParseResult<bool> {
        if self.at(token) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> ParseResult<bool> {
        if self.at_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: &Token) -> ParseResult<()> {
        if self.eat(token)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if self.eat_keyword(keyword)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_contextual(&mut self, name: &str) -> ParseResult<()> {
        if self.at_contextual(name) {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    fn can_insert_semicolon(&self) -> bool {
        matches!(self.token.token, Token::Eof | Token::RightBrace) || self.token.newline_before()
    }

    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(&Token::Semicolon)? || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // ---- nodes and errors --------------------------------------------------

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: u32) -> Span {
        self.span_between(start, self.prev_end)
    }

    fn span_between(&self, start: u32, end: u32) -> Span {
        Span {
            start,
            end,
            loc: self
                .options
                .tracks_locations()
                .then(|| self.line_index.locate(start, end)),
        }
    }

    fn error_at(&self, kind: ErrorKind, index: u32, message: impl Into<String>) -> ParseError {
        let pos = self.line_index.position(index);
        ParseError {
            kind,
            message: message.into(),
            index,
            line: pos.line,
            column: pos.column,
        }
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>) -> ParseError {
        self.error_at(kind, self.token.start, message)
    }

    fn unexpected(&self) -> ParseError {
        match &self.token.token {
            Token::Eof => self.error(ErrorKind::UnexpectedToken, "Unexpected end of input"),
            Token::Keyword(kw) if !kw.is_contextual() => self.error(
                ErrorKind::UnexpectedReservedWord,
                format!("Unexpected keyword '{kw}'"),
            ),
            token => self.error(
                ErrorKind::UnexpectedToken,
                format!("Unexpected token '{token}'"),
            ),
        }
    }

    /// Runs one recursive production, failing once nesting gets too deep.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(ErrorKind::UnexpectedToken, "Maximum nesting depth exceeded"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn is_parenthesized(&self, span: &Span) -> bool {
        self.parenthesized.contains(&(span.start, span.end))
    }

    // ---- identifiers -------------------------------------------------------

    /// Text of the current token when it can stand for an identifier.
    fn identifier_text(&self) -> Option<&str> {
        match &self.token.token {
            Token::Identifier(name) => Some(name),
            Token::Keyword(kw) if kw.is_contextual() => Some(kw.as_str()),
            _ => None,
        }
    }

    /// Text of the current token as an IdentifierName, reserved words included.
    fn identifier_name_text(&self) -> Option<&str> {
        match &self.token.token {
            Token::Identifier(name) => Some(name),
            Token::Keyword(kw) => Some(kw.as_str()),
            Token::BooleanLiteral(true) => Some("true"),
            Token::BooleanLiteral(false) => Some("false"),
            Token::NullLiteral => Some("null"),
            _ => None,
        }
    }

    fn check_identifier(
        &self,
        name: &str,
        start: u32,
        ctx: Context,
        usage: IdentifierUse,
    ) -> ParseResult<()> {
        let reserved = |message: String| {
            Err(self.error_at(ErrorKind::UnexpectedReservedWord, start, message))
        };
        if is_reserved_word(name) {
            return reserved(format!("Unexpected keyword '{name}'"));
        }
        if ctx.is_strict() && is_strict_reserved_word(name) {
            return reserved(format!("Unexpected strict mode reserved word '{name}'"));
        }
        match name {
            "yield" if ctx.contains(Context::IN_GENERATOR) => {
                reserved("Cannot use 'yield' as an identifier inside a generator".into())
            }
            "await"
                if ctx.is_module()
                    || ctx.intersects(Context::IN_ASYNC | Context::IN_STATIC_BLOCK) =>
            {
                reserved("Cannot use 'await' as an identifier here".into())
            }
            "arguments"
                if usage == IdentifierUse::Reference
                    && ctx.intersects(Context::IN_CLASS_FIELD | Context::IN_STATIC_BLOCK) =>
            {
                Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    start,
                    "'arguments' is not allowed in class field initializer or static initialization block",
                ))
            }
            "eval" | "arguments" if usage != IdentifierUse::Reference && ctx.is_strict() => {
                reserved(format!("Binding '{name}' in strict mode"))
            }
            "let" if usage == IdentifierUse::LexicalBinding => {
                reserved("let is disallowed as a lexically bound name".into())
            }
            _ => Ok(()),
        }
    }

    /// The error for a token that should have been an identifier.
    fn expected_identifier(&self) -> ParseError {
        match &self.token.token {
            Token::Keyword(kw) => self.error(
                ErrorKind::UnexpectedReservedWord,
                format!("Unexpected keyword '{kw}'"),
            ),
            Token::BooleanLiteral(_) | Token::NullLiteral => self.error(
                ErrorKind::UnexpectedReservedWord,
                format!("Unexpected keyword '{}'", self.token.token),
            ),
            _ => self.unexpected(),
        }
    }

    fn parse_identifier_with(&mut self, ctx: Context, usage: IdentifierUse) -> ParseResult<Identifier> {
        let Some(name) = self.identifier_text().map(str::to_owned) else {
            return Err(self.expected_identifier());
        };
        let start = self.token.start;
        self.check_identifier(&name, start, ctx, usage)?;
        self.advance()?;
        Ok(Identifier {
            name,
            span: self.span_from(start),
        })
    }

    fn parse_identifier_reference(&mut self, ctx: Context) -> ParseResult<Identifier> {
        self.parse_identifier_with(ctx, IdentifierUse::Reference)
    }

    fn parse_binding_identifier(&mut self, ctx: Context, lexical: bool) -> ParseResult<Identifier> {
        let usage = if lexical {
            IdentifierUse::LexicalBinding
        } else {
            IdentifierUse::Binding
        };
        self.parse_identifier_with(ctx, usage)
    }

    /// Any IdentifierName, as after `.` or in a property key.
    fn parse_identifier_name(&mut self) -> ParseResult<Identifier> {
        let Some(name) = self.identifier_name_text().map(str::to_owned) else {
            return Err(self.unexpected());
        };
        let start = self.token.start;
        self.advance()?;
        Ok(Identifier {
            name,
            span: self.span_from(start),
        })
    }

    // ---- program -----------------------------------------------------------

    pub fn parse_program(&mut self, ctx: Context) -> ParseResult<Program> {
        let (body, _) = self.parse_directives_and_statements(ctx, &Token::Eof)?;
        if ctx.is_module() {
            self.check_local_exports()?;
        }
        let end = self.token.start;
        let source_type = if ctx.is_module() {
            SourceType::Module
        } else {
            SourceType::Script
        };
        Ok(Program {
            source_type,
            body,
            span: self.span_between(0, end),
        })
    }

    /// Parses statements up to `end`, honouring a leading directive prologue.
    /// Returns the statements and whether a `"use strict"` directive was seen.
    fn parse_directives_and_statements(
        &mut self,
        mut ctx: Context,
        end: &Token,
    ) -> ParseResult<(Vec<Statement>, bool)> {
        let mut body = Vec::new();
        let mut use_strict = false;
        let mut in_prologue = true;
        let mut octal_at = None;

        while !self.at(end) {
            if self.at(&Token::Eof) {
                return Err(self.unexpected());
            }
            if !in_prologue || !matches!(self.token.token, Token::StringLiteral(_)) {
                in_prologue = false;
                body.push(self.parse_statement_list_item(ctx)?);
                continue;
            }

            let literal = self.token.clone();
            let mut stmt = self.parse_statement_list_item(ctx)?;
            let is_directive = matches!(
                &stmt,
                Statement::Expression(ExpressionStatement { expression: Expression::Literal(lit), .. })
                    if lit.span.start == literal.start
                        && lit.span.end == literal.end
                        && !self.is_parenthesized(&lit.span)
            );
            if !is_directive {
                in_prologue = false;
                body.push(stmt);
                continue;
            }

            let raw = &self.source[literal.byte_start + 1..literal.byte_end - 1];
            if literal.flags.contains(TokenFlags::OCTAL_ESCAPE) && octal_at.is_none() {
                octal_at = Some(literal.start);
            }
            if raw == "use strict" {
                use_strict = true;
                ctx = ctx.with(Context::STRICT);
                if let Some(pos) = octal_at {
                    return Err(self.error_at(
                        ErrorKind::LexError,
                        pos,
                        "Octal escape sequences are not allowed in strict mode",
                    ));
                }
            }
            trace!(directive = raw, "directive");
            if let Statement::Expression(expr_stmt) = &mut stmt {
                expr_stmt.directive = Some(raw.to_string());
            }
            body.push(stmt);
        }
        Ok((body, use_strict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src, Context::EMPTY)
            .unwrap()
            .parse_program(Context::EMPTY)
            .unwrap()
    }

    fn parse_err(src: &str, ctx: Context) -> ParseError {
        Parser::new(src, ctx)
            .and_then(|mut p| p.parse_program(ctx))
            .unwrap_err()
    }

    #[test]
    fn parse_empty() {
        let prog = parse("");
        assert!(prog.body.is_empty());
        assert_eq!(prog.source_type, SourceType::Script);
    }

    #[test]
    fn parse_var_declaration() {
        let prog = parse("var x = 42;");
        assert_eq!(prog.body.len(), 1);
        assert!(matches!(&prog.body[0], Statement::VariableDeclaration(_)));
    }

    #[test]
    fn directives_are_recorded() {
        let prog = parse("'use strict'; 'other'; x");
        let directives: Vec<Option<&str>> = prog
            .body
            .iter()
            .map(|stmt| match stmt {
                Statement::Expression(e) => e.directive.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(directives, [Some("use strict"), Some("other"), None]);
    }

    #[test]
    fn parenthesized_string_is_not_a_directive() {
        let prog = parse("('use strict'); with (a) {}");
        assert!(matches!(&prog.body[1], Statement::With(_)));
    }

    #[test]
    fn use_strict_applies_to_the_rest_of_the_program() {
        let err = parse_err("'use strict'; with (a) {}", Context::EMPTY);
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn octal_directive_before_use_strict_is_rejected() {
        let err = parse_err(r"'\01'; 'use strict';", Context::EMPTY);
        assert_eq!(err.kind, ErrorKind::LexError);
    }

    #[test]
    fn reserved_words_by_mode() {
        let err = parse_err("var if = 1;", Context::EMPTY);
        assert_eq!(err.kind, ErrorKind::UnexpectedReservedWord);
        parse("var public = 1;");
        let err = parse_err("var public = 1;", Context::STRICT);
        assert_eq!(err.kind, ErrorKind::UnexpectedReservedWord);
    }

    fn parse_on_large_stack(src: String) -> ParseResult<Program> {
        std::thread::Builder::new()
            .stack_size(16 * 1024 * 1024)
            .spawn(move || Parser::new(&src, Context::EMPTY)?.parse_program(Context::EMPTY))
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn deep_nesting_is_an_error() {
        for (open, close) in [("(", ")"), ("[", "]"), ("{a:", "}"), ("!", "")] {
            let src = format!("x = {}y{};", open.repeat(1000), close.repeat(1000));
            let err = parse_on_large_stack(src).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnexpectedToken, "{open}");
            assert!(err.message.contains("nesting"), "{open}");
        }
        let blocks = format!("{}{}", "{".repeat(1000), "}".repeat(1000));
        assert!(parse_on_large_stack(blocks).is_err());
        let pattern = format!("let {}x{} = y;", "[".repeat(1000), "]".repeat(1000));
        assert!(parse_on_large_stack(pattern).is_err());
    }

    #[test]
    fn moderate_nesting_parses() {
        parse(&format!("{}x{};", "(".repeat(20), ")".repeat(20)));
        parse(&format!("{}x{};", "[".repeat(20), "]".repeat(20)));
        parse(&format!("{}{}", "{".repeat(20), "}".repeat(20)));
        parse(&format!("let {}x{} = y;", "[".repeat(20), "]".repeat(20)));
    }

    #[test]
    fn error_position_points_at_token() {
        let err = parse_err("var x = 1;\nvar = 2;", Context::EMPTY);
        assert_eq!((err.line, err.column, err.index), (2, 4, 15));
    }
}
