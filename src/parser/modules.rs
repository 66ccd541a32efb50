use tracing::trace;

use super::scope::BindingKind;
use super::{IdentifierUse, Parser};
use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseResult};
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    pub(super) fn parse_import_declaration(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // import

        // import "module"
        if matches!(self.token.token, Token::StringLiteral(_)) {
            let source = self.parse_literal(ctx)?;
            self.consume_semicolon()?;
            return Ok(Statement::ImportDeclaration(ImportDeclaration {
                specifiers: Vec::new(),
                source,
                span: self.span_from(start),
            }));
        }

        let mut specifiers = Vec::new();
        if self.identifier_text().is_some() {
            let local_start = self.token.start;
            let local = self.parse_import_binding(ctx)?;
            specifiers.push(ImportClause::Default(ImportDefaultSpecifier {
                local,
                span: self.span_from(local_start),
            }));
            if self.eat(&Token::Comma)? {
                self.parse_import_namespace_or_named(ctx, &mut specifiers)?;
            }
        } else {
            self.parse_import_namespace_or_named(ctx, &mut specifiers)?;
        }

        self.expect_contextual("from")?;
        let source = self.parse_module_specifier(ctx)?;
        self.consume_semicolon()?;
        trace!(count = specifiers.len(), "import");
        Ok(Statement::ImportDeclaration(ImportDeclaration {
            specifiers,
            source,
            span: self.span_from(start),
        }))
    }

    /// `* as ns` or `{ a, b as c }`.
    fn parse_import_namespace_or_named(&mut self, ctx: Context, specifiers: &mut Vec<ImportClause>) -> ParseResult<()> {
        let start = self.token.start;
        if self.eat(&Token::Star)? {
            self.expect_contextual("as")?;
            let local = self.parse_import_binding(ctx)?;
            specifiers.push(ImportClause::Namespace(ImportNamespaceSpecifier {
                local,
                span: self.span_from(start),
            }));
            return Ok(());
        }

        self.expect(&Token::LeftBrace)?;
        while !self.eat(&Token::RightBrace)? {
            let spec_start = self.token.start;
            let imported = self.parse_module_export_name(ctx)?;
            let local = if self.at_contextual("as") {
                self.advance()?;
                self.parse_import_binding(ctx)?
            } else {
                match &imported {
                    ModuleExportName::Identifier(id) => {
                        self.check_identifier(&id.name, id.span.start, ctx, IdentifierUse::LexicalBinding)?;
                        self.declare_import(id)?;
                        id.clone()
                    }
                    ModuleExportName::Literal(_) => return Err(self.unexpected()),
                }
            };
            specifiers.push(ImportClause::Named(ImportSpecifier {
                imported,
                local,
                span: self.span_from(spec_start),
            }));
            if !self.at(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        Ok(())
    }

    fn parse_import_binding(&mut self, ctx: Context) -> ParseResult<Identifier> {
        let local = self.parse_binding_identifier(ctx, true)?;
        self.declare_import(&local)?;
        Ok(local)
    }

    fn declare_import(&mut self, local: &Identifier) -> ParseResult<()> {
        if self.scope.declare(&local.name, BindingKind::Lexical) {
            Ok(())
        } else {
            Err(self.error_at(
                ErrorKind::DuplicateBinding,
                local.span.start,
                format!("Identifier '{}' has already been declared", local.name),
            ))
        }
    }

    /// IdentifierName or string literal naming an import or export.
    fn parse_module_export_name(&mut self, ctx: Context) -> ParseResult<ModuleExportName> {
        if matches!(self.token.token, Token::StringLiteral(_)) {
            return Ok(ModuleExportName::Literal(self.parse_literal(ctx)?));
        }
        Ok(ModuleExportName::Identifier(self.parse_identifier_name()?))
    }

    fn parse_module_specifier(&mut self, ctx: Context) -> ParseResult<Literal> {
        if !matches!(self.token.token, Token::StringLiteral(_)) {
            return Err(self.unexpected());
        }
        self.parse_literal(ctx)
    }

    pub(super) fn parse_export_declaration(&mut self, ctx: Context) -> ParseResult<Statement> {
        let start = self.token.start;
        self.advance()?; // export

        if self.at_keyword(Keyword::Default) {
            let default_start = self.token.start;
            self.advance()?;
            self.add_export("default", default_start)?;
            return self.parse_export_default(ctx, start);
        }

        // export * from "m" / export * as ns from "m"
        if self.eat(&Token::Star)? {
            let exported = if self.at_contextual("as") {
                self.advance()?;
                let name = self.parse_module_export_name(ctx)?;
                self.add_export(name.name(), name_start(&name))?;
                Some(name)
            } else {
                None
            };
            self.expect_contextual("from")?;
            let source = self.parse_module_specifier(ctx)?;
            self.consume_semicolon()?;
            return Ok(Statement::ExportAllDeclaration(ExportAllDeclaration {
                exported,
                source,
                span: self.span_from(start),
            }));
        }

        if self.at(&Token::LeftBrace) {
            return self.parse_export_list(ctx, start);
        }

        let declaration = match self.token.token {
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(ctx, VariableKind::Var)?,
            Token::Keyword(Keyword::Let) => self.parse_variable_statement(ctx, VariableKind::Let)?,
            Token::Keyword(Keyword::Const) => self.parse_variable_statement(ctx, VariableKind::Const)?,
            Token::Keyword(Keyword::Function | Keyword::Class) => self.parse_statement_list_item(ctx)?,
            Token::Keyword(Keyword::Async) if self.is_async_function()? => self.parse_statement_list_item(ctx)?,
            _ => return Err(self.unexpected()),
        };
        self.export_declared_names(&declaration)?;
        Ok(Statement::ExportNamedDeclaration(ExportNamedDeclaration {
            declaration: Some(Box::new(declaration)),
            specifiers: Vec::new(),
            source: None,
            span: self.span_from(start),
        }))
    }

    fn export_declared_names(&mut self, declaration: &Statement) -> ParseResult<()> {
        let mut names = Vec::new();
        match declaration {
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    declarator.id.bound_names(&mut names);
                }
            }
            Statement::FunctionDeclaration(decl) => names.extend(decl.id.as_ref()),
            Statement::ClassDeclaration(decl) => names.extend(decl.id.as_ref()),
            _ => {}
        }
        for id in names {
            self.add_export(&id.name, id.span.start)?;
        }
        Ok(())
    }

    /// `export { a, b as c }` with an optional `from "m"`.
    fn parse_export_list(&mut self, ctx: Context, start: u32) -> ParseResult<Statement> {
        self.advance()?; // {
        let mut specifiers = Vec::new();
        while !self.eat(&Token::RightBrace)? {
            let spec_start = self.token.start;
            let local = self.parse_module_export_name(ctx)?;
            let exported = if self.at_contextual("as") {
                self.advance()?;
                self.parse_module_export_name(ctx)?
            } else {
                local.clone()
            };
            self.add_export(exported.name(), name_start(&exported))?;
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span: self.span_from(spec_start),
            });
            if !self.at(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }

        let source = if self.at_contextual("from") {
            self.advance()?;
            Some(self.parse_module_specifier(ctx)?)
        } else {
            for specifier in &specifiers {
                let ModuleExportName::Identifier(local) = &specifier.local else {
                    return Err(self.error_at(
                        ErrorKind::UnexpectedToken,
                        name_start(&specifier.local),
                        "A string literal cannot be used as an exported binding without `from`",
                    ));
                };
                self.check_identifier(&local.name, local.span.start, ctx, IdentifierUse::Reference)?;
                self.local_exports.push((local.name.clone(), local.span.start));
            }
            None
        };
        self.consume_semicolon()?;
        Ok(Statement::ExportNamedDeclaration(ExportNamedDeclaration {
            declaration: None,
            specifiers,
            source,
            span: self.span_from(start),
        }))
    }

    fn parse_export_default(&mut self, ctx: Context, start: u32) -> ParseResult<Statement> {
        let declaration = match self.token.token {
            Token::Keyword(Keyword::Function) => {
                let fn_start = self.token.start;
                let decl = self.parse_function_declaration(ctx, fn_start, false, true)?;
                ExportDefaultKind::Function(Box::new(decl))
            }
            Token::Keyword(Keyword::Class) => {
                ExportDefaultKind::Class(Box::new(self.parse_class_declaration(ctx, true)?))
            }
            Token::Keyword(Keyword::Async) if self.is_async_function()? => {
                let fn_start = self.token.start;
                self.advance()?; // async
                let decl = self.parse_function_declaration(ctx, fn_start, true, true)?;
                ExportDefaultKind::Function(Box::new(decl))
            }
            _ => {
                let expr = self.parse_assignment_expression(ctx)?;
                self.consume_semicolon()?;
                ExportDefaultKind::Expression(expr)
            }
        };
        Ok(Statement::ExportDefaultDeclaration(ExportDefaultDeclaration {
            declaration,
            span: self.span_from(start),
        }))
    }

    fn add_export(&mut self, name: &str, pos: u32) -> ParseResult<()> {
        if self.exported.insert(name.to_string()) {
            Ok(())
        } else {
            Err(self.error_at(
                ErrorKind::DuplicateBinding,
                pos,
                format!("Duplicate export '{name}'"),
            ))
        }
    }

    /// Every name in a local `export { ... }` list must be declared at the
    /// module top level, possibly after the export.
    pub(super) fn check_local_exports(&self) -> ParseResult<()> {
        for (name, pos) in &self.local_exports {
            if !self.scope.declared_at_top(name) {
                return Err(self.error_at(
                    ErrorKind::UnexpectedToken,
                    *pos,
                    format!("Export '{name}' is not defined"),
                ));
            }
        }
        Ok(())
    }
}

fn name_start(name: &ModuleExportName) -> u32 {
    match name {
        ModuleExportName::Identifier(id) => id.span.start,
        ModuleExportName::Literal(lit) => lit.span.start,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::parse_module;

    fn module(src: &str) -> Program {
        parse_module(src, Context::EMPTY).unwrap()
    }

    fn error_kind(src: &str) -> ErrorKind {
        parse_module(src, Context::EMPTY).unwrap_err().kind
    }

    #[test]
    fn import_forms() {
        let program = module("import a, * as b from 'm'; import { c, d as e, 'f g' as h } from 'n'; import 'o';");
        let Statement::ImportDeclaration(first) = &program.body[0] else {
            panic!("expected import");
        };
        assert!(matches!(first.specifiers[0], ImportClause::Default(_)));
        assert!(matches!(first.specifiers[1], ImportClause::Namespace(_)));
        let Statement::ImportDeclaration(second) = &program.body[1] else {
            panic!("expected import");
        };
        assert_eq!(second.specifiers.len(), 3);
        assert_eq!(second.source.as_str(), Some("n"));
        let Statement::ImportDeclaration(third) = &program.body[2] else {
            panic!("expected import");
        };
        assert!(third.specifiers.is_empty());
    }

    #[test]
    fn import_bindings_are_lexical() {
        assert_eq!(error_kind("import a from 'm'; let a;"), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("import { a, b as a } from 'm';"), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("import { 'x' } from 'm';"), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("import { default } from 'm';"), ErrorKind::UnexpectedReservedWord);
        module("import { default as d } from 'm';");
    }

    #[test]
    fn export_forms() {
        let program = module(
            "export var a = 1; export function f() {} export class C {} \
             export { a as b }; export * from 'm'; export * as ns from 'n'; export default 1 + 2;",
        );
        assert_eq!(program.body.len(), 7);
        assert!(matches!(&program.body[4], Statement::ExportAllDeclaration(e) if e.exported.is_none()));
        assert!(matches!(
            &program.body[6],
            Statement::ExportDefaultDeclaration(ExportDefaultDeclaration {
                declaration: ExportDefaultKind::Expression(Expression::Binary(_)),
                ..
            })
        ));
    }

    #[test]
    fn export_default_declarations() {
        let program = module("export default function () {}");
        assert!(matches!(
            &program.body[0],
            Statement::ExportDefaultDeclaration(ExportDefaultDeclaration {
                declaration: ExportDefaultKind::Function(f),
                ..
            }) if f.id.is_none()
        ));
        module("export default class {}");
        module("export default async function named() {}");
        module("export default (function () {});");
    }

    #[test]
    fn duplicate_exports() {
        assert_eq!(error_kind("var a, b; export { a, b as a };"), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("export default 1; export default 2;"), ErrorKind::DuplicateBinding);
        assert_eq!(error_kind("export var a; export function a() {}"), ErrorKind::DuplicateBinding);
    }

    #[test]
    fn local_exports_must_be_declared() {
        module("export { later }; let later;");
        assert_eq!(error_kind("export { missing };"), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("export { 'x' };"), ErrorKind::UnexpectedToken);
        module("export { 'x' as y } from 'm';");
        module("export { default } from 'm';");
    }

    #[test]
    fn module_items_only_at_top_level() {
        assert_eq!(error_kind("{ import a from 'm'; }"), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("function f() { export var a; }"), ErrorKind::UnexpectedToken);
        module("import.meta.url;");
    }
}
