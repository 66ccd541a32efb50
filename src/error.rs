use std::fmt;

use thiserror::Error;

use crate::lexer::LexError;

/// Classification of a syntax error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed literal, escape sequence or identifier.
    LexError,
    UnexpectedToken,
    /// A reserved or contextually reserved word used where an identifier is required.
    UnexpectedReservedWord,
    /// An expression that cannot be reinterpreted as a destructuring or assignment target.
    InvalidDestructuringTarget,
    DuplicateBinding,
    MissingInitializerInConst,
    /// A rest element that is not last, has a default, or is followed by a comma.
    InvalidRestElementPosition,
    /// More than one binding, or an initializer, in a `for-in`/`for-of` head.
    InvalidForHeadBinding,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::LexError => "LexError",
            ErrorKind::UnexpectedToken => "UnexpectedToken",
            ErrorKind::UnexpectedReservedWord => "UnexpectedReservedWord",
            ErrorKind::InvalidDestructuringTarget => "InvalidDestructuringTarget",
            ErrorKind::DuplicateBinding => "DuplicateBinding",
            ErrorKind::MissingInitializerInConst => "MissingInitializerInConst",
            ErrorKind::InvalidRestElementPosition => "InvalidRestElementPosition",
            ErrorKind::InvalidForHeadBinding => "InvalidForHeadBinding",
        };
        f.write_str(s)
    }
}

/// The single fatal error produced by a failed parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("SyntaxError: {message} ({line}:{column})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// UTF-16 offset of the offending token.
    pub index: u32,
    /// 1-based.
    pub line: u32,
    /// 0-based.
    pub column: u32,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            kind: ErrorKind::LexError,
            message: e.message,
            index: e.location.offset,
            line: e.location.line,
            column: e.location.column,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SourceLocation;

    #[test]
    fn display_includes_position() {
        let err = ParseError {
            kind: ErrorKind::UnexpectedToken,
            message: "Unexpected token ','".into(),
            index: 7,
            line: 1,
            column: 7,
        };
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token ',' (1:7)");
    }

    #[test]
    fn lex_errors_keep_their_location() {
        let err: ParseError = LexError {
            message: "Unterminated string literal".into(),
            location: SourceLocation {
                line: 2,
                column: 3,
                offset: 9,
            },
        }
        .into();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!((err.index, err.line, err.column), (9, 2, 3));
    }
}
