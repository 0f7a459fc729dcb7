//! Diagnostics.
//!
//! Every user-visible failure in the compiler is a [`Diagnostic`]: an
//! [`ErrorKind`], a human-readable message, and the [`Span`] it points at.
//! Compilation is fatal-on-first: the first diagnostic produced by any
//! stage propagates out of [`crate::compile`] and no output is written.
//!
//! Internal invariant violations (double register release, popping an empty
//! scope stack) are programmer errors and panic instead; they never surface
//! on well-formed inputs.

use thiserror::Error;

/// A source position: 1-indexed line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// What went wrong, independent of wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Lexical
    UnrecognizedSymbol,
    MissingClosingQuote,
    InvalidIntegerConstant,

    // Syntactic
    ExpectedToken,

    // Names
    NotDeclared,
    AlreadyDeclared,

    // Types
    TypeMismatch,
    NotAnArray,
    NotAProcedure,
    NotAValue,
    CannotAssign,
    WrongArgumentCount,

    // Capacity
    TooManyRegisters,
}

/// A fatal compilation error with source context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {}: {message}", .span.line)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Render the diagnostic the way the compiler reports it: a five-digit
    /// zero-padded line number, the offending source line, a caret under the
    /// offending column, and the message.
    ///
    /// ```text
    /// 00003 x := y + z
    ///                ^
    /// Error: z is not declared
    /// ```
    pub fn render(&self, source: &str) -> String {
        let line_text = source.lines().nth(self.span.line - 1).unwrap_or("");
        // The caret sits under the column within the printed line; the
        // 5-digit number and one space shift it right by 6.
        let caret_col = 6 + self.span.col.saturating_sub(1);
        format!(
            "{:05} {}\n{}^\nError: {}",
            self.span.line,
            line_text,
            " ".repeat(caret_col),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_column() {
        let source = "int x;\nint x;\n";
        let diag = Diagnostic::new(
            ErrorKind::AlreadyDeclared,
            "x is already declared",
            Span::new(2, 5),
        );
        let rendered = diag.render(source);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "00002 int x;");
        assert_eq!(lines[1], "          ^");
        assert_eq!(lines[2], "Error: x is already declared");
    }

    #[test]
    fn render_survives_missing_line() {
        let diag = Diagnostic::new(ErrorKind::ExpectedToken, "expected ;", Span::new(9, 1));
        // Out-of-range lines render with empty context rather than panicking.
        assert!(diag.render("one line only").contains("00009"));
    }
}
