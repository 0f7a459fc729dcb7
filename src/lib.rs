//! # SNARL Compiler
//!
//! A complete two-pass compiler from SNARL, a small imperative language
//! with integer and string scalars, fixed-length integer arrays, and
//! first-order procedures, to MIPS assembly text for SPIM-style
//! simulators.
//!
//! ## Pipeline
//!
//! 1. **Scanner** - source characters to tokens, one token of lookahead
//! 2. **Pass 1** - records every procedure signature in the global scope,
//!    so forward and mutually recursive calls need no prototypes
//! 3. **Pass 2** - recursive descent over the grammar; type-checks against
//!    the nominal subtype relation and emits MIPS instructions as it parses
//! 4. **Assembler sink** - lays out `.data` (interned strings, globals)
//!    followed by `.text`
//!
//! Compilation is fatal-on-first: any lexical, syntactic, name, type, or
//! capacity error aborts with a [`Diagnostic`] and no output is produced.
//!
//! ## Example
//!
//! ```
//! let source = r#"
//! int x;
//! proc main() int :
//!     begin
//!         x := 6 * 7;
//!         value x
//!     end
//! "#;
//! let assembly = snarl_compiler::compile(source).expect("compiles");
//! assert!(assembly.starts_with(".data"));
//! assert!(assembly.contains("mul"));
//! ```

pub mod asm;
pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod globals;
pub mod registers;
pub mod scanner;
pub mod symtab;
pub mod types;

pub use compiler::Compiler;
pub use error::Diagnostic;

/// Compile SNARL source text into MIPS assembly text.
pub fn compile(source: &str) -> Result<String, Diagnostic> {
    Compiler::new(source)?.compile()
}
