use std::fmt;

use bitflags::bitflags;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Identifiers and keywords
    Identifier(String),
    Keyword(Keyword),
    PrivateName(String),

    // Literals
    NumericLiteral(f64),
    /// Digits without the `n` suffix and without separators, prefix kept.
    BigIntLiteral(String),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    RegExpLiteral { pattern: String, flags: String },

    // Template literals: (cooked, raw); cooked is None for invalid escapes
    NoSubstitutionTemplate(Option<String>, String),
    TemplateHead(Option<String>, String),
    TemplateMiddle(Option<String>, String),
    TemplateTail(Option<String>, String),

    // Punctuators
    LeftBrace,                // {
    RightBrace,               // }
    LeftParen,                // (
    RightParen,               // )
    LeftBracket,              // [
    RightBracket,             // ]
    Dot,                      // .
    Ellipsis,                 // ...
    Semicolon,                // ;
    Comma,                    // ,
    LessThan,                 // <
    GreaterThan,              // >
    LessThanEqual,            // <=
    GreaterThanEqual,         // >=
    Equal,                    // ==
    NotEqual,                 // !=
    StrictEqual,              // ===
    StrictNotEqual,           // !==
    Plus,                     // +
    Minus,                    // -
    Star,                     // *
    Percent,                  // %
    Exponent,                 // **
    Increment,                // ++
    Decrement,                // --
    LeftShift,                // <<
    RightShift,               // >>
    UnsignedRightShift,       // >>>
    Ampersand,                // &
    Pipe,                     // |
    Caret,                    // ^
    Bang,                     // !
    Tilde,                    // ~
    LogicalAnd,               // &&
    LogicalOr,                // ||
    NullishCoalescing,        // ??
    Question,                 // ?
    OptionalChain,            // ?.
    Colon,                    // :
    Assign,                   // =
    PlusAssign,               // +=
    MinusAssign,              // -=
    StarAssign,               // *=
    PercentAssign,            // %=
    ExponentAssign,           // **=
    LeftShiftAssign,          // <<=
    RightShiftAssign,         // >>=
    UnsignedRightShiftAssign, // >>>=
    AmpersandAssign,          // &=
    PipeAssign,               // |=
    CaretAssign,              // ^=
    LogicalAndAssign,         // &&=
    LogicalOrAssign,          // ||=
    NullishAssign,            // ??=
    Arrow,                    // =>
    Slash,                    // /
    SlashAssign,              // /=

    Eof,
}

impl Token {
    /// Whether a `/` following this token starts a regular expression.
    pub fn goal_after(&self) -> LexGoal {
        match self {
            Token::Identifier(_)
            | Token::PrivateName(_)
            | Token::NumericLiteral(_)
            | Token::BigIntLiteral(_)
            | Token::StringLiteral(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral
            | Token::RegExpLiteral { .. }
            | Token::NoSubstitutionTemplate(..)
            | Token::TemplateTail(..)
            | Token::RightParen
            | Token::RightBracket
            | Token::RightBrace
            | Token::Increment
            | Token::Decrement => LexGoal::ExpectOperator,
            Token::Keyword(kw) => match kw {
                Keyword::This
                | Keyword::Super
                | Keyword::Async
                | Keyword::Await
                | Keyword::Let
                | Keyword::Of
                | Keyword::Static
                | Keyword::Yield => LexGoal::ExpectOperator,
                _ => LexGoal::ExpectOperand,
            },
            _ => LexGoal::ExpectOperand,
        }
    }

    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
                | Token::PercentAssign
                | Token::ExponentAssign
                | Token::LeftShiftAssign
                | Token::RightShiftAssign
                | Token::UnsignedRightShiftAssign
                | Token::AmpersandAssign
                | Token::PipeAssign
                | Token::CaretAssign
                | Token::LogicalAndAssign
                | Token::LogicalOrAssign
                | Token::NullishAssign
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) | Token::PrivateName(name) => write!(f, "{name}"),
            Token::Keyword(kw) => write!(f, "{kw}"),
            Token::NumericLiteral(n) => write!(f, "{n}"),
            Token::BigIntLiteral(s) => write!(f, "{s}n"),
            Token::StringLiteral(_) => f.write_str("string"),
            Token::BooleanLiteral(b) => write!(f, "{b}"),
            Token::NullLiteral => f.write_str("null"),
            Token::RegExpLiteral { pattern, flags } => write!(f, "/{pattern}/{flags}"),
            Token::NoSubstitutionTemplate(..)
            | Token::TemplateHead(..)
            | Token::TemplateMiddle(..)
            | Token::TemplateTail(..) => f.write_str("template"),
            Token::Eof => f.write_str("end of input"),
            punct => f.write_str(punctuator_text(punct)),
        }
    }
}

fn punctuator_text(token: &Token) -> &'static str {
    match token {
        Token::LeftBrace => "{",
        Token::RightBrace => "}",
        Token::LeftParen => "(",
        Token::RightParen => ")",
        Token::LeftBracket => "[",
        Token::RightBracket => "]",
        Token::Dot => ".",
        Token::Ellipsis => "...",
        Token::Semicolon => ";",
        Token::Comma => ",",
        Token::LessThan => "<",
        Token::GreaterThan => ">",
        Token::LessThanEqual => "<=",
        Token::GreaterThanEqual => ">=",
        Token::Equal => "==",
        Token::NotEqual => "!=",
        Token::StrictEqual => "===",
        Token::StrictNotEqual => "!==",
        Token::Plus => "+",
        Token::Minus => "-",
        Token::Star => "*",
        Token::Percent => "%",
        Token::Exponent => "**",
        Token::Increment => "++",
        Token::Decrement => "--",
        Token::LeftShift => "<<",
        Token::RightShift => ">>",
        Token::UnsignedRightShift => ">>>",
        Token::Ampersand => "&",
        Token::Pipe => "|",
        Token::Caret => "^",
        Token::Bang => "!",
        Token::Tilde => "~",
        Token::LogicalAnd => "&&",
        Token::LogicalOr => "||",
        Token::NullishCoalescing => "??",
        Token::Question => "?",
        Token::OptionalChain => "?.",
        Token::Colon => ":",
        Token::Assign => "=",
        Token::PlusAssign => "+=",
        Token::MinusAssign => "-=",
        Token::StarAssign => "*=",
        Token::PercentAssign => "%=",
        Token::ExponentAssign => "**=",
        Token::LeftShiftAssign => "<<=",
        Token::RightShiftAssign => ">>=",
        Token::UnsignedRightShiftAssign => ">>>=",
        Token::AmpersandAssign => "&=",
        Token::PipeAssign => "|=",
        Token::CaretAssign => "^=",
        Token::LogicalAndAssign => "&&=",
        Token::LogicalOrAssign => "||=",
        Token::NullishAssign => "??=",
        Token::Arrow => "=>",
        Token::Slash => "/",
        Token::SlashAssign => "/=",
        _ => "token",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Async,
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Of,
    Return,
    Static,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        match s {
            "async" => Some(Keyword::Async),
            "await" => Some(Keyword::Await),
            "break" => Some(Keyword::Break),
            "case" => Some(Keyword::Case),
            "catch" => Some(Keyword::Catch),
            "class" => Some(Keyword::Class),
            "const" => Some(Keyword::Const),
            "continue" => Some(Keyword::Continue),
            "debugger" => Some(Keyword::Debugger),
            "default" => Some(Keyword::Default),
            "delete" => Some(Keyword::Delete),
            "do" => Some(Keyword::Do),
            "else" => Some(Keyword::Else),
            "enum" => Some(Keyword::Enum),
            "export" => Some(Keyword::Export),
            "extends" => Some(Keyword::Extends),
            "finally" => Some(Keyword::Finally),
            "for" => Some(Keyword::For),
            "function" => Some(Keyword::Function),
            "if" => Some(Keyword::If),
            "import" => Some(Keyword::Import),
            "in" => Some(Keyword::In),
            "instanceof" => Some(Keyword::Instanceof),
            "let" => Some(Keyword::Let),
            "new" => Some(Keyword::New),
            "of" => Some(Keyword::Of),
            "return" => Some(Keyword::Return),
            "static" => Some(Keyword::Static),
            "super" => Some(Keyword::Super),
            "switch" => Some(Keyword::Switch),
            "this" => Some(Keyword::This),
            "throw" => Some(Keyword::Throw),
            "try" => Some(Keyword::Try),
            "typeof" => Some(Keyword::Typeof),
            "var" => Some(Keyword::Var),
            "void" => Some(Keyword::Void),
            "while" => Some(Keyword::While),
            "with" => Some(Keyword::With),
            "yield" => Some(Keyword::Yield),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Async => "async",
            Keyword::Await => "await",
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::Let => "let",
            Keyword::New => "new",
            Keyword::Of => "of",
            Keyword::Return => "return",
            Keyword::Static => "static",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
            Keyword::Yield => "yield",
        }
    }

    /// Contextual keywords may still appear as identifiers somewhere.
    pub fn is_contextual(self) -> bool {
        matches!(
            self,
            Keyword::Async
                | Keyword::Await
                | Keyword::Let
                | Keyword::Of
                | Keyword::Static
                | Keyword::Yield
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which lexical goal the parser expects for the next token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexGoal {
    /// A `/` starts a regular expression literal.
    ExpectOperand,
    /// A `/` is the division operator.
    ExpectOperator,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TokenFlags: u8 {
        /// A line terminator (or a multi-line comment) precedes the token.
        const NEWLINE_BEFORE = 1 << 0;
        /// The identifier was spelled with at least one unicode escape.
        const ESCAPED = 1 << 1;
        /// The escaped identifier decodes to a keyword or reserved word.
        const ESCAPED_KEYWORD = 1 << 2;
        /// A string literal containing a legacy octal or `\8`/`\9` escape.
        const OCTAL_ESCAPE = 1 << 3;
        /// A legacy octal (`017`) or leading-zero decimal (`09`) number.
        const LEGACY_OCTAL = 1 << 4;
    }
}

/// A classified token with its source range.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenInfo {
    pub token: Token,
    /// UTF-16 offsets.
    pub start: u32,
    pub end: u32,
    /// 1-based line and 0-based column of `start`.
    pub line: u32,
    pub column: u32,
    pub flags: TokenFlags,
    /// Byte range into the source, for raw text.
    pub byte_start: usize,
    pub byte_end: usize,
}

impl TokenInfo {
    pub fn newline_before(&self) -> bool {
        self.flags.contains(TokenFlags::NEWLINE_BEFORE)
    }

    pub fn is_escaped(&self) -> bool {
        self.flags.contains(TokenFlags::ESCAPED)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}:{}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    offset: u32,
    line: u32,
    column: u32,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Byte position of the next character.
    pos: usize,
    /// UTF-16 offset of the next character.
    offset: u32,
    line: u32,
    line_start: u32,
    /// Annex B `<!--` and `-->` comments.
    html_comments: bool,
    newline_before: bool,
    flags: TokenFlags,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            offset: 0,
            line: 1,
            line_start: 0,
            html_comments: false,
            newline_before: false,
            flags: TokenFlags::empty(),
        }
    }

    pub fn with_html_comments(mut self, enabled: bool) -> Self {
        self.html_comments = enabled;
        self
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        self.offset += ch.len_utf16() as u32;
        Some(ch)
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            offset: self.offset,
            line: self.line,
            column: self.offset - self.line_start,
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.offset - self.line_start,
            offset: self.offset,
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn error_at(&self, mark: Mark, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: SourceLocation {
                line: mark.line,
                column: mark.column,
                offset: mark.offset,
            },
        }
    }

    pub fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(
            ch,
            '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}'
        ) || (ch.is_whitespace() && !Self::is_line_terminator(ch) && ch != '\u{0085}')
    }

    pub fn is_identifier_start(ch: char) -> bool {
        ch == '_' || ch == '$' || ch.is_ascii_alphabetic() || unicode_id_start(ch)
    }

    pub fn is_identifier_continue(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphanumeric()
            || ch == '\u{200C}'
            || ch == '\u{200D}'
            || unicode_id_continue(ch)
    }

    fn handle_newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.line_start = self.offset;
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        loop {
            match self.advance() {
                Some('*') => {
                    if self.eat_char('/') {
                        return Ok(());
                    }
                }
                Some(ch) if Self::is_line_terminator(ch) => {
                    self.handle_newline(ch);
                    self.newline_before = true;
                }
                Some(_) => {}
                None => return Err(self.error_at(start, "Unterminated comment")),
            }
        }
    }

    fn at_line_start(&self) -> bool {
        self.newline_before || self.pos == 0
    }

    /// Skips whitespace, line terminators and comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            let Some(ch) = self.peek() else {
                return Ok(());
            };
            if Self::is_whitespace(ch) {
                self.advance();
            } else if Self::is_line_terminator(ch) {
                self.advance();
                self.handle_newline(ch);
                self.newline_before = true;
            } else if ch == '/' && self.peek_next() == Some('/') {
                self.skip_line_comment();
            } else if ch == '/' && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                self.skip_block_comment()?;
            } else if ch == '#' && self.pos == 0 && self.peek_next() == Some('!') {
                self.skip_line_comment();
            } else if self.html_comments && self.source[self.pos..].starts_with("<!--") {
                self.skip_line_comment();
            } else if self.html_comments
                && self.at_line_start()
                && self.source[self.pos..].starts_with("-->")
            {
                self.skip_line_comment();
            } else {
                return Ok(());
            }
        }
    }

    fn finish(&mut self, token: Token, start: Mark) -> TokenInfo {
        let mut flags = std::mem::take(&mut self.flags);
        if self.newline_before {
            flags |= TokenFlags::NEWLINE_BEFORE;
        }
        TokenInfo {
            token,
            start: start.offset,
            end: self.offset,
            line: start.line,
            column: start.column,
            flags,
            byte_start: start.pos,
            byte_end: self.pos,
        }
    }

    pub fn next_token(&mut self, goal: LexGoal) -> Result<TokenInfo, LexError> {
        self.newline_before = false;
        self.flags = TokenFlags::empty();
        self.skip_trivia()?;
        let start = self.mark();

        let Some(ch) = self.peek() else {
            return Ok(self.finish(Token::Eof, start));
        };

        let token = if ch == '\'' || ch == '"' {
            self.advance();
            Token::StringLiteral(self.read_string(ch)?)
        } else if ch == '`' {
            self.advance();
            let (cooked, raw, is_tail) = self.read_template_chars()?;
            if is_tail {
                Token::NoSubstitutionTemplate(cooked, raw)
            } else {
                Token::TemplateHead(cooked, raw)
            }
        } else if ch.is_ascii_digit() || (ch == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit())) {
            self.read_numeric_literal(start)?
        } else if Self::is_identifier_start(ch) || ch == '\\' {
            self.read_identifier()?
        } else if ch == '#' {
            self.advance();
            match self.peek() {
                Some(c) if Self::is_identifier_start(c) || c == '\\' => {
                    let (name, _) = self.read_identifier_name()?;
                    Token::PrivateName(name)
                }
                _ => return Err(self.error_at(start, "Invalid or unexpected token")),
            }
        } else if ch == '/' && goal == LexGoal::ExpectOperand {
            self.advance();
            self.lex_regex(String::new(), start)?
        } else {
            self.advance();
            self.read_punctuator(ch, start)?
        };
        Ok(self.finish(token, start))
    }

    /// Re-reads a `/` or `/=` token that the parser found in operand position.
    /// The lexer must still be positioned right after that token.
    pub fn rescan_regex(&mut self, slash: &TokenInfo) -> Result<TokenInfo, LexError> {
        let start = Mark {
            pos: slash.byte_start,
            offset: slash.start,
            line: slash.line,
            column: slash.column,
        };
        let prefix = if slash.token == Token::SlashAssign {
            "=".to_string()
        } else {
            String::new()
        };
        self.newline_before = slash.newline_before();
        let token = self.lex_regex(prefix, start)?;
        Ok(self.finish(token, start))
    }

    /// Continues a template after the `}` closing a substitution.
    /// The lexer must still be positioned right after that brace.
    pub fn rescan_template_continuation(&mut self, brace: &TokenInfo) -> Result<TokenInfo, LexError> {
        let start = Mark {
            pos: brace.byte_start,
            offset: brace.start,
            line: brace.line,
            column: brace.column,
        };
        self.newline_before = brace.newline_before();
        let (cooked, raw, is_tail) = self.read_template_chars()?;
        let token = if is_tail {
            Token::TemplateTail(cooked, raw)
        } else {
            Token::TemplateMiddle(cooked, raw)
        };
        Ok(self.finish(token, start))
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let mut s = Cooked::default();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string constant")),
                Some(ch) if ch == quote => return Ok(s.finish()),
                Some('\n' | '\r') => return Err(self.error("Unterminated string constant")),
                Some('\\') => {
                    if let Some(esc) = self.read_escape_sequence(false)? {
                        s.push(esc);
                    }
                }
                // U+2028/U+2029 are legal inside string literals.
                Some(ch) => s.push_char(ch),
            }
        }
    }

    /// Reads the escape after a backslash. `None` means a line continuation.
    /// Code points are returned raw so surrogate pairs written as two escapes
    /// can be joined by the caller.
    fn read_escape_sequence(&mut self, in_template: bool) -> Result<Option<u32>, LexError> {
        let start = self.mark();
        match self.advance() {
            None => Err(self.error("Unterminated escape sequence")),
            Some('n') => Ok(Some('\n' as u32)),
            Some('r') => Ok(Some('\r' as u32)),
            Some('t') => Ok(Some('\t' as u32)),
            Some('b') => Ok(Some(0x08)),
            Some('f') => Ok(Some(0x0C)),
            Some('v') => Ok(Some(0x0B)),
            Some(ch @ '0'..='7') => {
                if ch == '0' && !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Ok(Some(0));
                }
                if in_template {
                    return Err(self.error_at(start, "Octal escape sequences are not allowed in template strings"));
                }
                self.flags |= TokenFlags::OCTAL_ESCAPE;
                let mut val = ch as u32 - '0' as u32;
                if let Some(d) = self.peek().and_then(|c| c.to_digit(8)) {
                    self.advance();
                    val = val * 8 + d;
                    if ch <= '3'
                        && let Some(d) = self.peek().and_then(|c| c.to_digit(8))
                    {
                        self.advance();
                        val = val * 8 + d;
                    }
                }
                Ok(Some(val))
            }
            Some(ch @ ('8' | '9')) => {
                if in_template {
                    return Err(self.error_at(start, "\\8 and \\9 are not allowed in template strings"));
                }
                self.flags |= TokenFlags::OCTAL_ESCAPE;
                Ok(Some(ch as u32))
            }
            Some('x') => {
                let mut val = 0;
                for _ in 0..2 {
                    let d = self
                        .peek()
                        .and_then(hex_val)
                        .ok_or_else(|| self.error_at(start, "Invalid hexadecimal escape sequence"))?;
                    self.advance();
                    val = val * 16 + d;
                }
                Ok(Some(val))
            }
            Some('u') => self.read_unicode_escape(start).map(Some),
            Some(ch) if Self::is_line_terminator(ch) => {
                self.handle_newline(ch);
                Ok(None)
            }
            Some(ch) => Ok(Some(ch as u32)),
        }
    }

    /// Reads the part of a `\u` escape after the `u`.
    fn read_unicode_escape(&mut self, start: Mark) -> Result<u32, LexError> {
        if self.eat_char('{') {
            let mut val: u32 = 0;
            let mut digits = 0;
            loop {
                match self.peek() {
                    Some('}') if digits > 0 => {
                        self.advance();
                        return Ok(val);
                    }
                    Some(ch) => {
                        let d = hex_val(ch)
                            .ok_or_else(|| self.error_at(start, "Invalid Unicode escape sequence"))?;
                        self.advance();
                        val = val * 16 + d;
                        if val > 0x10FFFF {
                            return Err(self.error_at(start, "Undefined Unicode code-point"));
                        }
                        digits += 1;
                    }
                    None => return Err(self.error_at(start, "Invalid Unicode escape sequence")),
                }
            }
        }
        let mut val: u32 = 0;
        for _ in 0..4 {
            let d = self
                .peek()
                .and_then(hex_val)
                .ok_or_else(|| self.error_at(start, "Invalid Unicode escape sequence"))?;
            self.advance();
            val = val * 16 + d;
        }
        Ok(val)
    }

    fn read_numeric_literal(&mut self, start: Mark) -> Result<Token, LexError> {
        let token = self.read_number_body(start)?;
        if self
            .peek()
            .is_some_and(|c| Self::is_identifier_start(c) || c.is_ascii_digit() || c == '\\')
        {
            return Err(self.error("Identifier directly after number"));
        }
        Ok(token)
    }

    fn read_number_body(&mut self, start: Mark) -> Result<Token, LexError> {
        if self.peek() == Some('0') {
            let radix = match self.peek_next() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let prefix = self.advance().unwrap_or('x');
                let digits = self.read_digits(radix, true)?;
                if digits.is_empty() {
                    return Err(self.error(format!("Expected number in radix {radix}")));
                }
                if self.eat_char('n') {
                    return Ok(Token::BigIntLiteral(format!("0{prefix}{digits}")));
                }
                return Ok(Token::NumericLiteral(digits_value(&digits, radix)));
            }
            if self.peek_next().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                return self.read_legacy_octal_or_decimal(start);
            }
        }

        // Decimal
        let mut s = self.read_digits(10, true)?;
        let mut is_integer = true;
        if self.eat_char('.') {
            is_integer = false;
            s.push('.');
            if self.peek() == Some('_') {
                return Err(self.error("Numeric separators are not allowed here"));
            }
            s.push_str(&self.read_digits(10, true)?);
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_integer = false;
            self.read_exponent(&mut s)?;
        }

        if self.peek() == Some('n') {
            if !is_integer {
                return Err(self.error("Invalid BigInt syntax"));
            }
            self.advance();
            return Ok(Token::BigIntLiteral(s));
        }

        let val: f64 = s
            .parse()
            .map_err(|_| self.error_at(start, "Invalid number"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_exponent(&mut self, s: &mut String) -> Result<(), LexError> {
        self.advance();
        s.push('e');
        if let Some(sign @ ('+' | '-')) = self.peek() {
            self.advance();
            s.push(sign);
        }
        if self.peek() == Some('_') {
            return Err(self.error("Numeric separators are not allowed here"));
        }
        let digits = self.read_digits(10, true)?;
        if digits.is_empty() {
            return Err(self.error("Invalid number"));
        }
        s.push_str(&digits);
        Ok(())
    }

    /// Reads digits in `radix`, returning them with separators removed.
    fn read_digits(&mut self, radix: u32, allow_separator: bool) -> Result<String, LexError> {
        let mut digits = String::new();
        let mut last_was_separator = false;
        while let Some(ch) = self.peek() {
            if ch == '_' && allow_separator {
                if digits.is_empty() || last_was_separator {
                    return Err(self.error("Numeric separators are not allowed here"));
                }
                last_was_separator = true;
                self.advance();
            } else if ch.is_digit(radix) {
                last_was_separator = false;
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if last_was_separator {
            return Err(self.error("Numeric separators are not allowed at the end of numeric literals"));
        }
        Ok(digits)
    }

    fn read_legacy_octal_or_decimal(&mut self, start: Mark) -> Result<Token, LexError> {
        self.advance(); // leading 0
        if self.peek() == Some('_') {
            return Err(self.error("Numeric separator can not be used after leading 0"));
        }
        self.flags |= TokenFlags::LEGACY_OCTAL;
        let digits = self.read_digits(10, false)?;
        if self.peek() == Some('_') {
            return Err(self.error("Numeric separator can not be used after leading 0"));
        }
        if self.peek() == Some('n') {
            return Err(self.error("Invalid BigInt syntax"));
        }
        if digits.chars().all(|c| c < '8') {
            return Ok(Token::NumericLiteral(digits_value(&digits, 8)));
        }
        // A non-octal decimal such as 09 or 08.5.
        let mut s = format!("0{digits}");
        if self.eat_char('.') {
            s.push('.');
            s.push_str(&self.read_digits(10, true)?);
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            self.read_exponent(&mut s)?;
        }
        let val: f64 = s
            .parse()
            .map_err(|_| self.error_at(start, "Invalid number"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_identifier(&mut self) -> Result<Token, LexError> {
        let (name, escaped) = self.read_identifier_name()?;
        if escaped {
            self.flags |= TokenFlags::ESCAPED;
            if Keyword::from_str(&name).is_some() || matches!(name.as_str(), "true" | "false" | "null") {
                self.flags |= TokenFlags::ESCAPED_KEYWORD;
            }
            return Ok(Token::Identifier(name));
        }
        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::from_str(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    /// Reads an IdentifierName, decoding unicode escapes.
    fn read_identifier_name(&mut self) -> Result<(String, bool), LexError> {
        let mut name = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek() {
            let start = self.mark();
            let decoded = if ch == '\\' {
                self.advance();
                if !self.eat_char('u') {
                    return Err(self.error_at(start, "Invalid Unicode escape sequence"));
                }
                escaped = true;
                let cp = self.read_unicode_escape(start)?;
                char::from_u32(cp).ok_or_else(|| self.error_at(start, "Invalid Unicode escape sequence"))?
            } else {
                ch
            };
            let valid = if name.is_empty() {
                Self::is_identifier_start(decoded)
            } else {
                Self::is_identifier_continue(decoded)
            };
            if !valid {
                if ch == '\\' {
                    return Err(self.error_at(start, "Invalid Unicode escape sequence"));
                }
                break;
            }
            if ch != '\\' {
                self.advance();
            }
            name.push(decoded);
        }
        Ok((name, escaped))
    }

    fn lex_regex(&mut self, mut pattern: String, start: Mark) -> Result<Token, LexError> {
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "Unterminated regular expression")),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error_at(start, "Unterminated regular expression"));
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    pattern.push('\\');
                    match self.advance() {
                        Some(c) if !Self::is_line_terminator(c) => pattern.push(c),
                        _ => return Err(self.error_at(start, "Unterminated regular expression")),
                    }
                }
                Some(ch) => {
                    if ch == '[' {
                        in_class = true;
                    } else if ch == ']' {
                        in_class = false;
                    }
                    self.advance();
                    pattern.push(ch);
                }
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                return Err(self.error("Invalid regular expression flags"));
            }
            if !Self::is_identifier_continue(c) {
                break;
            }
            if !"dgimsuvy".contains(c) || flags.contains(c) {
                return Err(self.error("Invalid regular expression flags"));
            }
            flags.push(c);
            self.advance();
        }
        if flags.contains('u') && flags.contains('v') {
            return Err(self.error("Invalid regular expression flags"));
        }
        Ok(Token::RegExpLiteral { pattern, flags })
    }

    // Returns (cooked, raw, is_tail). is_tail=true means ended with backtick, false means ${
    fn read_template_chars(&mut self) -> Result<(Option<String>, String, bool), LexError> {
        let start = self.mark();
        let mut cooked = Some(Cooked::default());
        let mut raw = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error_at(start, "Unterminated template")),
                Some('`') => return Ok((cooked.map(Cooked::finish), raw, true)),
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    return Ok((cooked.map(Cooked::finish), raw, false));
                }
                Some('\\') => {
                    let before = self.pos;
                    let escape = self.read_escape_sequence(true);
                    let text = &self.source[before..self.pos];
                    raw.push('\\');
                    raw.push_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                    match escape {
                        Ok(Some(cp)) => {
                            if let Some(c) = cooked.as_mut() {
                                c.push(cp);
                            }
                        }
                        Ok(None) => {}
                        Err(_) => cooked = None,
                    }
                }
                Some(ch) if Self::is_line_terminator(ch) => {
                    // CR and CRLF are normalized to LF in both values.
                    let normalized = if ch == '\r' { '\n' } else { ch };
                    self.handle_newline(ch);
                    raw.push(normalized);
                    if let Some(c) = cooked.as_mut() {
                        c.push_char(normalized);
                    }
                }
                Some(ch) => {
                    raw.push(ch);
                    if let Some(c) = cooked.as_mut() {
                        c.push_char(ch);
                    }
                }
            }
        }
    }

    fn read_punctuator(&mut self, ch: char, start: Mark) -> Result<Token, LexError> {
        match ch {
            '{' => Ok(Token::LeftBrace),
            '}' => Ok(Token::RightBrace),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),
            '[' => Ok(Token::LeftBracket),
            ']' => Ok(Token::RightBracket),
            ';' => Ok(Token::Semicolon),
            ',' => Ok(Token::Comma),
            '~' => Ok(Token::Tilde),
            ':' => Ok(Token::Colon),

            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    Ok(Token::Ellipsis)
                } else {
                    Ok(Token::Dot)
                }
            }

            '?' => {
                if self.eat_char('?') {
                    if self.eat_char('=') {
                        Ok(Token::NullishAssign)
                    } else {
                        Ok(Token::NullishCoalescing)
                    }
                } else if self.peek() == Some('.')
                    && !self.peek_next().is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    Ok(Token::OptionalChain)
                } else {
                    Ok(Token::Question)
                }
            }

            '<' => {
                if self.eat_char('<') {
                    if self.eat_char('=') {
                        Ok(Token::LeftShiftAssign)
                    } else {
                        Ok(Token::LeftShift)
                    }
                } else if self.eat_char('=') {
                    Ok(Token::LessThanEqual)
                } else {
                    Ok(Token::LessThan)
                }
            }

            '>' => {
                if self.eat_char('>') {
                    if self.eat_char('>') {
                        if self.eat_char('=') {
                            Ok(Token::UnsignedRightShiftAssign)
                        } else {
                            Ok(Token::UnsignedRightShift)
                        }
                    } else if self.eat_char('=') {
                        Ok(Token::RightShiftAssign)
                    } else {
                        Ok(Token::RightShift)
                    }
                } else if self.eat_char('=') {
                    Ok(Token::GreaterThanEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }

            '=' => {
                if self.eat_char('=') {
                    if self.eat_char('=') {
                        Ok(Token::StrictEqual)
                    } else {
                        Ok(Token::Equal)
                    }
                } else if self.eat_char('>') {
                    Ok(Token::Arrow)
                } else {
                    Ok(Token::Assign)
                }
            }

            '!' => {
                if self.eat_char('=') {
                    if self.eat_char('=') {
                        Ok(Token::StrictNotEqual)
                    } else {
                        Ok(Token::NotEqual)
                    }
                } else {
                    Ok(Token::Bang)
                }
            }

            '+' => {
                if self.eat_char('+') {
                    Ok(Token::Increment)
                } else if self.eat_char('=') {
                    Ok(Token::PlusAssign)
                } else {
                    Ok(Token::Plus)
                }
            }

            '-' => {
                if self.eat_char('-') {
                    Ok(Token::Decrement)
                } else if self.eat_char('=') {
                    Ok(Token::MinusAssign)
                } else {
                    Ok(Token::Minus)
                }
            }

            '*' => {
                if self.eat_char('*') {
                    if self.eat_char('=') {
                        Ok(Token::ExponentAssign)
                    } else {
                        Ok(Token::Exponent)
                    }
                } else if self.eat_char('=') {
                    Ok(Token::StarAssign)
                } else {
                    Ok(Token::Star)
                }
            }

            '/' => {
                if self.eat_char('=') {
                    Ok(Token::SlashAssign)
                } else {
                    Ok(Token::Slash)
                }
            }

            '%' => {
                if self.eat_char('=') {
                    Ok(Token::PercentAssign)
                } else {
                    Ok(Token::Percent)
                }
            }

            '&' => {
                if self.eat_char('&') {
                    if self.eat_char('=') {
                        Ok(Token::LogicalAndAssign)
                    } else {
                        Ok(Token::LogicalAnd)
                    }
                } else if self.eat_char('=') {
                    Ok(Token::AmpersandAssign)
                } else {
                    Ok(Token::Ampersand)
                }
            }

            '|' => {
                if self.eat_char('|') {
                    if self.eat_char('=') {
                        Ok(Token::LogicalOrAssign)
                    } else {
                        Ok(Token::LogicalOr)
                    }
                } else if self.eat_char('=') {
                    Ok(Token::PipeAssign)
                } else {
                    Ok(Token::Pipe)
                }
            }

            '^' => {
                if self.eat_char('=') {
                    Ok(Token::CaretAssign)
                } else {
                    Ok(Token::Caret)
                }
            }

            _ => Err(self.error_at(start, format!("Unexpected character '{ch}'"))),
        }
    }

    /// Lexes the whole source, treating every `/` as an operator.
    pub fn tokenize_all(&mut self) -> Result<Vec<TokenInfo>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let info = self.next_token(LexGoal::ExpectOperator)?;
            let done = info.token == Token::Eof;
            tokens.push(info);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Builds a string value from code points, joining surrogate pairs written as
/// two `\u` escapes. Lone surrogates cannot live in a Rust string and become
/// U+FFFD.
#[derive(Default)]
struct Cooked {
    text: String,
    high_surrogate: Option<u32>,
}

impl Cooked {
    fn push(&mut self, cp: u32) {
        if let Some(high) = self.high_surrogate.take() {
            if (0xDC00..=0xDFFF).contains(&cp) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (cp - 0xDC00);
                self.text
                    .push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                return;
            }
            self.text.push(char::REPLACEMENT_CHARACTER);
        }
        if (0xD800..=0xDBFF).contains(&cp) {
            self.high_surrogate = Some(cp);
            return;
        }
        self.text
            .push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    fn push_char(&mut self, ch: char) {
        self.push(ch as u32);
    }

    fn finish(mut self) -> String {
        if self.high_surrogate.take().is_some() {
            self.text.push(char::REPLACEMENT_CHARACTER);
        }
        self.text
    }
}

fn hex_val(ch: char) -> Option<u32> {
    ch.to_digit(16)
}

fn digits_value(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64)
}

fn unicode_id_start(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_start(ch)
}

fn unicode_id_continue(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        lexer
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|info| info.token)
            .collect()
    }

    fn lex_err(src: &str) -> LexError {
        Lexer::new(src).tokenize_all().unwrap_err()
    }

    #[test]
    fn lex_error_display_leads_with_position() {
        let err = lex_err("a;\n  @");
        assert_eq!(err.to_string(), "2:2: Unexpected character '@'");
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex("var x = 42;"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".into()),
                Token::Assign,
                Token::NumericLiteral(42.0),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(lex(r#""hello""#), vec![Token::StringLiteral("hello".into()), Token::Eof]);
        assert_eq!(lex(r"'he\nllo'"), vec![Token::StringLiteral("he\nllo".into()), Token::Eof]);
        assert_eq!(lex("'a\\\nb'"), vec![Token::StringLiteral("ab".into()), Token::Eof]);
        assert_eq!(lex("'\u{2028}'"), vec![Token::StringLiteral("\u{2028}".into()), Token::Eof]);
    }

    #[test]
    fn surrogate_pair_escapes_are_joined() {
        assert_eq!(
            lex(r#""\uD83D\uDE00""#),
            vec![Token::StringLiteral("\u{1F600}".into()), Token::Eof]
        );
        assert_eq!(
            lex(r#""\u{1F600}""#),
            vec![Token::StringLiteral("\u{1F600}".into()), Token::Eof]
        );
    }

    #[test]
    fn octal_escapes_are_flagged() {
        let tokens = Lexer::new(r"'\01'").tokenize_all().unwrap();
        assert!(tokens[0].flags.contains(TokenFlags::OCTAL_ESCAPE));
        let tokens = Lexer::new(r"'\0'").tokenize_all().unwrap();
        assert!(!tokens[0].flags.contains(TokenFlags::OCTAL_ESCAPE));
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex("0xff"), vec![Token::NumericLiteral(255.0), Token::Eof]);
        assert_eq!(lex("0b1010"), vec![Token::NumericLiteral(10.0), Token::Eof]);
        assert_eq!(lex("0o77"), vec![Token::NumericLiteral(63.0), Token::Eof]);
        assert_eq!(lex("1_000"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex("1e3"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex(".5"), vec![Token::NumericLiteral(0.5), Token::Eof]);
        assert_eq!(lex("5."), vec![Token::NumericLiteral(5.0), Token::Eof]);
    }

    #[test]
    fn legacy_octal_is_flagged() {
        let tokens = Lexer::new("017 09").tokenize_all().unwrap();
        assert_eq!(tokens[0].token, Token::NumericLiteral(15.0));
        assert!(tokens[0].flags.contains(TokenFlags::LEGACY_OCTAL));
        assert_eq!(tokens[1].token, Token::NumericLiteral(9.0));
        assert!(tokens[1].flags.contains(TokenFlags::LEGACY_OCTAL));
    }

    #[test]
    fn malformed_numbers() {
        assert!(lex_err("3in x").message.contains("Identifier directly after number"));
        lex_err("1__0");
        lex_err("1_");
        lex_err("0x");
        lex_err("1.5n");
        lex_err("0_1");
    }

    #[test]
    fn boolean_null() {
        assert_eq!(
            lex("true false null"),
            vec![
                Token::BooleanLiteral(true),
                Token::BooleanLiteral(false),
                Token::NullLiteral,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn punctuators() {
        assert_eq!(lex("==="), vec![Token::StrictEqual, Token::Eof]);
        assert_eq!(lex("!=="), vec![Token::StrictNotEqual, Token::Eof]);
        assert_eq!(lex("=>"), vec![Token::Arrow, Token::Eof]);
        assert_eq!(lex("..."), vec![Token::Ellipsis, Token::Eof]);
        assert_eq!(lex(">>>="), vec![Token::UnsignedRightShiftAssign, Token::Eof]);
        assert_eq!(lex("a?.5:1")[1], Token::Question);
    }

    #[test]
    fn comments_set_newline_flag() {
        let tokens = Lexer::new("a /* x\n */ b // c\nd").tokenize_all().unwrap();
        assert!(!tokens[0].newline_before());
        assert!(tokens[1].newline_before());
        assert!(tokens[2].newline_before());
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn html_comments_only_when_enabled() {
        let mut lexer = Lexer::new("x\n--> ignored\ny").with_html_comments(true);
        let tokens: Vec<Token> = lexer.tokenize_all().unwrap().into_iter().map(|t| t.token).collect();
        assert_eq!(
            tokens,
            vec![Token::Identifier("x".into()), Token::Identifier("y".into()), Token::Eof]
        );
        assert_eq!(lex("x-->y")[1], Token::Decrement);
    }

    #[test]
    fn regex_versus_division_follows_goal() {
        let mut lexer = Lexer::new("/ab+c/gi");
        let info = lexer.next_token(LexGoal::ExpectOperand).unwrap();
        assert_eq!(
            info.token,
            Token::RegExpLiteral { pattern: "ab+c".into(), flags: "gi".into() }
        );
        let mut lexer = Lexer::new("/ 2");
        assert_eq!(lexer.next_token(LexGoal::ExpectOperator).unwrap().token, Token::Slash);
    }

    #[test]
    fn regex_rescan_after_slash_assign() {
        let mut lexer = Lexer::new("/=x/g");
        let slash = lexer.next_token(LexGoal::ExpectOperator).unwrap();
        assert_eq!(slash.token, Token::SlashAssign);
        let info = lexer.rescan_regex(&slash).unwrap();
        assert_eq!(info.token, Token::RegExpLiteral { pattern: "=x".into(), flags: "g".into() });
        assert_eq!((info.start, info.end), (0, 5));
    }

    #[test]
    fn regex_flags_are_validated() {
        let mut lexer = Lexer::new("/a/gg");
        assert!(lexer.next_token(LexGoal::ExpectOperand).is_err());
        let mut lexer = Lexer::new("/a/uv");
        assert!(lexer.next_token(LexGoal::ExpectOperand).is_err());
        let mut lexer = Lexer::new("/a\n/");
        assert!(lexer.next_token(LexGoal::ExpectOperand).is_err());
    }

    #[test]
    fn template_literal() {
        assert_eq!(
            lex("`hello`"),
            vec![Token::NoSubstitutionTemplate(Some("hello".into()), "hello".into()), Token::Eof]
        );
        assert_eq!(
            lex(r"`\unicode`"),
            vec![Token::NoSubstitutionTemplate(None, r"\unicode".into()), Token::Eof]
        );
    }

    #[test]
    fn template_continuation() {
        let mut lexer = Lexer::new("`a${x}b`");
        let head = lexer.next_token(LexGoal::ExpectOperand).unwrap();
        assert_eq!(head.token, Token::TemplateHead(Some("a".into()), "a".into()));
        lexer.next_token(LexGoal::ExpectOperand).unwrap();
        let brace = lexer.next_token(LexGoal::ExpectOperator).unwrap();
        assert_eq!(brace.token, Token::RightBrace);
        let tail = lexer.rescan_template_continuation(&brace).unwrap();
        assert_eq!(tail.token, Token::TemplateTail(Some("b".into()), "b".into()));
        assert_eq!((tail.start, tail.end), (5, 8));
    }

    #[test]
    fn bigint_literal() {
        assert_eq!(lex("42n"), vec![Token::BigIntLiteral("42".into()), Token::Eof]);
        assert_eq!(lex("0xFFn"), vec![Token::BigIntLiteral("0xFF".into()), Token::Eof]);
    }

    #[test]
    fn escaped_identifiers() {
        let tokens = Lexer::new(r"l\u0065t \u{61}b").tokenize_all().unwrap();
        assert_eq!(tokens[0].token, Token::Identifier("let".into()));
        assert!(tokens[0].flags.contains(TokenFlags::ESCAPED_KEYWORD));
        assert_eq!(tokens[1].token, Token::Identifier("ab".into()));
        assert!(tokens[1].is_escaped());
        assert!(!tokens[1].flags.contains(TokenFlags::ESCAPED_KEYWORD));
        lex_err(r"a\u12");
        lex_err(r"a\x41");
        lex_err(r"\u0031a");
    }

    #[test]
    fn private_names() {
        assert_eq!(lex("#x"), vec![Token::PrivateName("x".into()), Token::Eof]);
        lex_err("# x");
    }

    #[test]
    fn offsets_are_utf16() {
        let tokens = Lexer::new("'\u{1F600}' x").tokenize_all().unwrap();
        assert_eq!((tokens[0].start, tokens[0].end), (0, 4));
        assert_eq!((tokens[1].start, tokens[1].column), (5, 5));
    }
}
