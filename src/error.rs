use thiserror::Error;

/// Failures produced while recognizing a regex literal.
///
/// All offsets are byte positions into the input text. A failure aborts the
/// whole parse; no partial tree is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No closing token balances the delimiter opened at `at`.
    #[error("missing `{delimiter}` to balance the delimiter opened at offset {at}")]
    UnterminatedDelimiter { delimiter: char, at: usize },

    /// A flag letter appears more than once.
    #[error("duplicate flag `{flag}` at offset {at}")]
    InvalidFlags { flag: char, at: usize },

    /// An escape sequence matches none of the simple, special, or coded forms.
    #[error("unknown escape sequence at offset {at}")]
    UnknownEscape { at: usize },

    /// A `{m,n}` quantifier is missing its mandatory minimum digit run.
    #[error("malformed quantifier bounds at offset {at}")]
    MalformedQuantifierBounds { at: usize },

    /// A range `-` has no following character; a trailing `-` in a character
    /// class must be escaped.
    #[error("character class range at offset {at} has no upper bound")]
    UnterminatedCharacterClassRange { at: usize },

    /// A character that may not appear bare (unescaped CR, LF, or TAB), or
    /// trailing text after the flags.
    #[error("unexpected character `{found}` at offset {at}")]
    UnexpectedCharacter { found: char, at: usize },

    /// The input ended where more text was required.
    #[error("unexpected end of input at offset {at}")]
    UnexpectedEndOfInput { at: usize },
}
