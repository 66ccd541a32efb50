//! ESTree-shaped syntax tree.
//!
//! Every node struct serializes with its ESTree `type` tag; the enums that
//! group them are untagged so nested unions serialize as the node itself.
//! `start`, `end` and `loc` are emitted only for nodes built with location
//! tracking (see [`Span`]).

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::location::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Script,
    Module,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Program {
    pub source_type: SourceType,
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

impl Program {
    /// The ESTree JSON of the program.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statement {
    Expression(ExpressionStatement),
    Block(BlockStatement),
    Empty(EmptyStatement),
    Debugger(DebuggerStatement),
    With(WithStatement),
    Return(ReturnStatement),
    Labeled(LabeledStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    Throw(ThrowStatement),
    Try(TryStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    FunctionDeclaration(Box<FunctionDeclaration>),
    VariableDeclaration(VariableDeclaration),
    ClassDeclaration(Box<ClassDeclaration>),
    ImportDeclaration(ImportDeclaration),
    ExportNamedDeclaration(ExportNamedDeclaration),
    ExportDefaultDeclaration(ExportDefaultDeclaration),
    ExportAllDeclaration(ExportAllDeclaration),
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::Expression(s) => &s.span,
            Statement::Block(s) => &s.span,
            Statement::Empty(s) => &s.span,
            Statement::Debugger(s) => &s.span,
            Statement::With(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::Labeled(s) => &s.span,
            Statement::Break(s) => &s.span,
            Statement::Continue(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Try(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::DoWhile(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::ForIn(s) => &s.span,
            Statement::ForOf(s) => &s.span,
            Statement::FunctionDeclaration(s) => &s.span,
            Statement::VariableDeclaration(s) => &s.span,
            Statement::ClassDeclaration(s) => &s.span,
            Statement::ImportDeclaration(s) => &s.span,
            Statement::ExportNamedDeclaration(s) => &s.span,
            Statement::ExportDefaultDeclaration(s) => &s.span,
            Statement::ExportAllDeclaration(s) => &s.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExpressionStatement {
    pub expression: Expression,
    /// Raw text of a directive such as `"use strict"`, without quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct EmptyStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct DebuggerStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BreakStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ContinueStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ThrowStatement {
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    VariableDeclaration(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

/// Left-hand side of `for-in` / `for-of`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForLeft {
    VariableDeclaration(VariableDeclaration),
    Pattern(Pattern),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForInStatement {
    pub left: ForLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ForOfStatement {
    pub left: ForLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(rename = "await")]
    pub is_await: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn is_lexical(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclaration {
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VariableKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    pub id: Pattern,
    pub init: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Functions and classes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FunctionDeclaration {
    /// `None` only for `export default function () {}`.
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub generator: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FunctionExpression {
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub generator: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrowBody {
    Block(BlockStatement),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrowFunctionExpression {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    #[serde(rename = "async")]
    pub is_async: bool,
    /// True when the body is an expression rather than a block.
    pub expression: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub id: Option<Identifier>,
    pub super_class: Option<Expression>,
    pub body: ClassBody,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct ClassExpression {
    pub id: Option<Identifier>,
    pub super_class: Option<Expression>,
    pub body: ClassBody,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ClassBody {
    pub body: Vec<ClassElement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassElement {
    Method(MethodDefinition),
    Property(PropertyDefinition),
    StaticBlock(StaticBlock),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MethodDefinition {
    pub key: Expression,
    pub value: FunctionExpression,
    pub kind: MethodKind,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct PropertyDefinition {
    pub key: Expression,
    pub value: Option<Expression>,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct StaticBlock {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// An export or import name: an identifier or, since ES2022, a string.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleExportName {
    Identifier(Identifier),
    Literal(Literal),
}

impl ModuleExportName {
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Identifier(id) => &id.name,
            ModuleExportName::Literal(lit) => match &lit.value {
                LiteralValue::String(s) => s,
                _ => "",
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImportClause {
    Named(ImportSpecifier),
    Default(ImportDefaultSpecifier),
    Namespace(ImportNamespaceSpecifier),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportSpecifier {
    pub imported: ModuleExportName,
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportDefaultSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportNamespaceSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportClause>,
    pub source: Literal,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportSpecifier {
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportNamedDeclaration {
    pub declaration: Option<Box<Statement>>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Literal>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportDefaultKind {
    Function(Box<FunctionDeclaration>),
    Class(Box<ClassDeclaration>),
    Expression(Expression),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportDefaultDeclaration {
    pub declaration: ExportDefaultKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ExportAllDeclaration {
    pub exported: Option<ModuleExportName>,
    pub source: Literal,
    #[serde(flatten)]
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expression {
    Identifier(Identifier),
    PrivateIdentifier(PrivateIdentifier),
    Literal(Literal),
    This(ThisExpression),
    Super(Super),
    Array(Box<ArrayExpression>),
    Object(Box<ObjectExpression>),
    Function(Box<FunctionExpression>),
    ArrowFunction(Box<ArrowFunctionExpression>),
    Class(Box<ClassExpression>),
    TemplateLiteral(Box<TemplateLiteral>),
    TaggedTemplate(Box<TaggedTemplateExpression>),
    Member(Box<MemberExpression>),
    Call(Box<CallExpression>),
    New(Box<NewExpression>),
    Chain(Box<ChainExpression>),
    Unary(Box<UnaryExpression>),
    Update(Box<UpdateExpression>),
    Binary(Box<BinaryExpression>),
    Logical(Box<LogicalExpression>),
    Conditional(Box<ConditionalExpression>),
    Assignment(Box<AssignmentExpression>),
    Sequence(Box<SequenceExpression>),
    Yield(Box<YieldExpression>),
    Await(Box<AwaitExpression>),
    MetaProperty(Box<MetaProperty>),
    Import(Box<ImportExpression>),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Identifier(e) => &e.span,
            Expression::PrivateIdentifier(e) => &e.span,
            Expression::Literal(e) => &e.span,
            Expression::This(e) => &e.span,
            Expression::Super(e) => &e.span,
            Expression::Array(e) => &e.span,
            Expression::Object(e) => &e.span,
            Expression::Function(e) => &e.span,
            Expression::ArrowFunction(e) => &e.span,
            Expression::Class(e) => &e.span,
            Expression::TemplateLiteral(e) => &e.span,
            Expression::TaggedTemplate(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::Chain(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Update(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Logical(e) => &e.span,
            Expression::Conditional(e) => &e.span,
            Expression::Assignment(e) => &e.span,
            Expression::Sequence(e) => &e.span,
            Expression::Yield(e) => &e.span,
            Expression::Await(e) => &e.span,
            Expression::MetaProperty(e) => &e.span,
            Expression::Import(e) => &e.span,
        }
    }

    /// An identifier or member expression: the only valid targets of
    /// compound assignment and update operators.
    pub fn is_simple_target(&self) -> bool {
        matches!(self, Expression::Identifier(_) | Expression::Member(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Identifier {
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct PrivateIdentifier {
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegExpValue {
    pub pattern: String,
    pub flags: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// ESTree serializes the value of a regex literal as `null` and carries
    /// the source in a `regex` member.
    RegExp(RegExpValue),
    /// Decimal digits of the value; serialized in a `bigint` member.
    BigInt(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Literal")?;
        match &self.value {
            LiteralValue::Null => map.serialize_entry("value", &())?,
            LiteralValue::Boolean(b) => map.serialize_entry("value", b)?,
            LiteralValue::Number(n) => {
                // Integral values print without a fractional part.
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    map.serialize_entry("value", &(*n as i64))?;
                } else {
                    map.serialize_entry("value", n)?;
                }
            }
            LiteralValue::String(s) => map.serialize_entry("value", s)?,
            LiteralValue::RegExp(regex) => {
                map.serialize_entry("value", &())?;
                map.serialize_entry("regex", regex)?;
            }
            LiteralValue::BigInt(digits) => {
                map.serialize_entry("value", &())?;
                map.serialize_entry("bigint", digits)?;
            }
        }
        if let Some(loc) = &self.span.loc {
            map.serialize_entry("start", &self.span.start)?;
            map.serialize_entry("end", &self.span.end)?;
            map.serialize_entry("loc", loc)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ThisExpression {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Super {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpressionOrSpread {
    Expression(Expression),
    Spread(SpreadElement),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SpreadElement {
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrayExpression {
    /// `None` entries are holes.
    pub elements: Vec<Option<ExpressionOrSpread>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectMember {
    Property(Property),
    Spread(SpreadElement),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ObjectExpression {
    pub properties: Vec<ObjectMember>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Property {
    pub key: Expression,
    /// For a shorthand `{ x = 1 }` this holds an assignment expression; such a
    /// property is only accepted once reinterpreted as a pattern.
    pub value: Expression,
    pub kind: PropertyKind,
    pub computed: bool,
    pub method: bool,
    pub shorthand: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateElementValue {
    pub cooked: Option<String>,
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TemplateElement {
    pub value: TemplateElementValue,
    pub tail: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct TaggedTemplateExpression {
    pub tag: Expression,
    pub quasi: TemplateLiteral,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MemberExpression {
    pub object: Expression,
    pub property: Expression,
    pub computed: bool,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct CallExpression {
    pub callee: Expression,
    pub arguments: Vec<ExpressionOrSpread>,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct NewExpression {
    pub callee: Expression,
    pub arguments: Vec<ExpressionOrSpread>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ChainExpression {
    pub expression: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitwiseNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub prefix: bool,
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UpdateOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "===")]
    StrictEqual,
    #[serde(rename = "!==")]
    StrictNotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanEqual,
    #[serde(rename = "<<")]
    LeftShift,
    #[serde(rename = ">>")]
    RightShift,
    #[serde(rename = ">>>")]
    UnsignedRightShift,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Remainder,
    #[serde(rename = "**")]
    Exponent,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct BinaryExpression {
    pub left: Expression,
    pub operator: BinaryOperator,
    pub right: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogicalOperator {
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "??")]
    NullishCoalescing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct LogicalExpression {
    pub left: Expression,
    pub operator: LogicalOperator,
    pub right: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ConditionalExpression {
    pub test: Expression,
    pub consequent: Expression,
    pub alternate: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubtractAssign,
    #[serde(rename = "*=")]
    MultiplyAssign,
    #[serde(rename = "/=")]
    DivideAssign,
    #[serde(rename = "%=")]
    RemainderAssign,
    #[serde(rename = "**=")]
    ExponentAssign,
    #[serde(rename = "<<=")]
    LeftShiftAssign,
    #[serde(rename = ">>=")]
    RightShiftAssign,
    #[serde(rename = ">>>=")]
    UnsignedRightShiftAssign,
    #[serde(rename = "|=")]
    BitwiseOrAssign,
    #[serde(rename = "^=")]
    BitwiseXorAssign,
    #[serde(rename = "&=")]
    BitwiseAndAssign,
    #[serde(rename = "||=")]
    OrAssign,
    #[serde(rename = "&&=")]
    AndAssign,
    #[serde(rename = "??=")]
    NullishAssign,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentExpression {
    pub operator: AssignmentOperator,
    pub left: Pattern,
    pub right: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct YieldExpression {
    pub argument: Option<Expression>,
    pub delegate: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AwaitExpression {
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

/// `new.target` or `import.meta`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct MetaProperty {
    pub meta: Identifier,
    pub property: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ImportExpression {
    pub source: Expression,
    #[serde(flatten)]
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Object(Box<ObjectPattern>),
    Array(Box<ArrayPattern>),
    Assignment(Box<AssignmentPattern>),
    Rest(Box<RestElement>),
    /// Only valid in assignment targets, never in bindings.
    Member(Box<MemberExpression>),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Identifier(p) => &p.span,
            Pattern::Object(p) => &p.span,
            Pattern::Array(p) => &p.span,
            Pattern::Assignment(p) => &p.span,
            Pattern::Rest(p) => &p.span,
            Pattern::Member(p) => &p.span,
        }
    }

    /// Appends every name this pattern binds, in source order.
    pub fn bound_names<'a>(&'a self, names: &mut Vec<&'a Identifier>) {
        match self {
            Pattern::Identifier(id) => names.push(id),
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPatternProperty::Property(p) => p.value.bound_names(names),
                        ObjectPatternProperty::Rest(r) => r.argument.bound_names(names),
                    }
                }
            }
            Pattern::Array(arr) => {
                for elem in arr.elements.iter().flatten() {
                    elem.bound_names(names);
                }
            }
            Pattern::Assignment(p) => p.left.bound_names(names),
            Pattern::Rest(r) => r.argument.bound_names(names),
            Pattern::Member(_) => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectPatternProperty {
    Property(AssignmentProperty),
    Rest(RestElement),
}

/// A `Property` node inside an object pattern.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct AssignmentProperty {
    pub key: Expression,
    pub value: Pattern,
    pub kind: PropertyKind,
    pub computed: bool,
    pub method: bool,
    pub shorthand: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentPattern {
    pub left: Pattern,
    pub right: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct RestElement {
    pub argument: Pattern,
    #[serde(flatten)]
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str) -> Identifier {
        Identifier {
            name: name.into(),
            span: Span::new(0, 0),
        }
    }

    #[test]
    fn node_type_is_tagged() {
        let stmt = Statement::Empty(EmptyStatement { span: Span::new(0, 1) });
        assert_eq!(serde_json::to_value(&stmt).unwrap(), json!({"type": "EmptyStatement"}));
    }

    #[test]
    fn assignment_property_serializes_as_property() {
        let prop = ObjectPatternProperty::Property(AssignmentProperty {
            key: Expression::Identifier(ident("a")),
            value: Pattern::Identifier(ident("a")),
            kind: PropertyKind::Init,
            computed: false,
            method: false,
            shorthand: true,
            span: Span::new(0, 1),
        });
        assert_eq!(
            serde_json::to_value(&prop).unwrap(),
            json!({
                "type": "Property",
                "key": {"type": "Identifier", "name": "a"},
                "value": {"type": "Identifier", "name": "a"},
                "kind": "init",
                "computed": false,
                "method": false,
                "shorthand": true
            })
        );
    }

    #[test]
    fn literal_values() {
        let lit = |value| Literal { value, span: Span::new(0, 0) };
        assert_eq!(
            serde_json::to_value(lit(LiteralValue::Number(1.0))).unwrap(),
            json!({"type": "Literal", "value": 1})
        );
        assert_eq!(
            serde_json::to_value(lit(LiteralValue::Number(0.5))).unwrap(),
            json!({"type": "Literal", "value": 0.5})
        );
        assert_eq!(
            serde_json::to_value(lit(LiteralValue::BigInt("255".into()))).unwrap(),
            json!({"type": "Literal", "value": null, "bigint": "255"})
        );
        assert_eq!(
            serde_json::to_value(lit(LiteralValue::RegExp(RegExpValue {
                pattern: "a".into(),
                flags: "g".into()
            })))
            .unwrap(),
            json!({"type": "Literal", "value": null, "regex": {"pattern": "a", "flags": "g"}})
        );
    }

    #[test]
    fn bound_names_in_source_order() {
        let pattern = Pattern::Array(Box::new(ArrayPattern {
            elements: vec![
                Some(Pattern::Identifier(ident("a"))),
                None,
                Some(Pattern::Rest(Box::new(RestElement {
                    argument: Pattern::Identifier(ident("b")),
                    span: Span::new(0, 0),
                }))),
            ],
            span: Span::new(0, 0),
        }));
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        let names: Vec<&str> = names.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
