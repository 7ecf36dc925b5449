// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The flat error taxonomy, one `thiserror` enum per pipeline phase.

use thiserror::Error;

use crate::source::SourceRange;

/// A lexer error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexErrorKind {
    /// A character the lexer does not recognize in any token.
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    /// A double-quoted string with no closing quote before end of line.
    #[error("unterminated string literal")]
    UnterminatedString,
    /// A `\x` escape other than `\n`, `\"`, `\\`.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscapeSequence(char),
    /// A malformed numeric literal (e.g. a dangling exponent).
    #[error("invalid number literal")]
    InvalidNumber,
}

/// A parser error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// A token appeared where the grammar did not expect it.
    #[error("unexpected token")]
    UnexpectedToken,
    /// Input ended mid-construct.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A `{` was never matched by a `}`.
    #[error("missing closing brace")]
    MissingClosingBrace,
    /// An expression was expected but not found.
    #[error("expected expression")]
    ExpectedExpression,
    /// A trailing comma in a tuple/argument list.
    #[error("trailing comma")]
    TrailingComma,
}

/// A static-analysis error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisErrorKind {
    /// A name with no binding in any enclosing scope.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    /// An expression's inferred type did not match what its context
    /// required.
    #[error("type mismatch: expected {expected}, found {found}, in {context}")]
    TypeMismatch {
        /// The type the context required.
        expected: String,
        /// The type the expression actually had.
        found: String,
        /// A short description of the context (e.g. a callee name).
        context: String,
    },
    /// A call's argument count did not match the callee's signature.
    #[error("wrong number of arguments for '{name}': expected {expected}, found {found}")]
    WrongArity {
        /// The callee's name.
        name: String,
        /// The arity the callee's signature requires.
        expected: String,
        /// The number of arguments actually supplied.
        found: usize,
    },
    /// `option` used outside a block definition's body.
    #[error("'option' is only valid at the top of a block definition")]
    InvalidOption,
    /// A block invocation mentioned a symbol not yet defined in program
    /// order.
    #[error("'{0}' is used before it is defined")]
    ForwardReference(String),
}

/// A runtime (evaluation) error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// An `assert` command's condition was false.
    #[error("assertion failed")]
    AssertionFailure,
    /// The delegate denied access to an imported path.
    #[error("file access restricted: {0}")]
    FileAccessRestricted(String),
    /// The delegate could not find an imported path.
    #[error("file not found: {0}")]
    FileNotFound(String),
    /// An import did not complete within the delegate's timeout.
    #[error("import timed out: {0}")]
    FileTimedOut(String),
    /// An import path is already being imported higher up the stack.
    #[error("circular import: {0}")]
    CircularImport(String),
    /// The call-depth guard tripped.
    #[error("stack overflow")]
    StackOverflow,
    /// The cancellation oracle returned `true`.
    #[error("evaluation cancelled")]
    Cancelled,
    /// An error surfaced from within an imported file, with that file's
    /// own source and the inner error's range preserved.
    #[error("in imported file: {inner}")]
    ImportError {
        /// The inner error raised while evaluating the imported file.
        inner: Box<RuntimeError>,
        /// The imported file's path, for display purposes.
        file: String,
        /// The imported file's source text, so the inner range can be
        /// resolved to a line/column without re-fetching it.
        source: String,
    },
    /// Access to a member name a value does not have.
    #[error("unknown member '{0}'")]
    UnknownMember(String),
    /// A subscript index outside `[0, len)` (or `[-len, -1]` negative
    /// form).
    #[error("index {0} out of range")]
    IndexOutOfRange(isize),
    /// A subscript key that is neither a valid member name nor integer.
    #[error("invalid index")]
    InvalidIndex,
    /// A failure reported by the external geometry engine or scene port.
    #[error("{0}")]
    GeometryEngine(String),
}

/// Optional "did you mean" suggestion attached to an error.
pub type Hint = Option<String>;

/// A fully-located error: phase-specific kind, source range, optional
/// hint — every error carries a message, an optional range, and an
/// optional hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<K> {
    /// The phase-specific error payload.
    pub kind: K,
    /// The source range the error applies to, if any.
    pub range: Option<SourceRange>,
    /// An optional "did you mean" hint.
    pub hint: Hint,
}

impl<K: std::fmt::Display> std::fmt::Display for Located<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl<K: std::fmt::Debug + std::fmt::Display> std::error::Error for Located<K> {}

impl<K> Located<K> {
    /// Builds a located error with no hint.
    #[must_use]
    pub fn new(kind: K, range: SourceRange) -> Self {
        Self { kind, range: Some(range), hint: None }
    }

    /// Attaches a "did you mean" hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A located lexer error.
pub type LexError = Located<LexErrorKind>;
/// A located parser error.
pub type ParseError = Located<ParseErrorKind>;
/// A located analysis error.
pub type AnalysisError = Located<AnalysisErrorKind>;
/// A located runtime error.
pub type RuntimeError = Located<RuntimeErrorKind>;
