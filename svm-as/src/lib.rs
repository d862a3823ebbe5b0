//! # svm assembler
//!
//! Translates svm assembly text into bytecode in two passes:
//!
//! 1. [`lex`] splits source into [`lex::Line`]s.
//! 2. [`writer::Context::populate`] assigns byte addresses to labels.
//! 3. [`writer::Context::generate`] encodes instructions, resolving label operands.
//!
//! Either the whole program is produced or the first error is reported.
//!
//! # Example
//! ```
//! let code = svm_as::translate("
//!     PUSH 2
//!     PUSH 3
//!     ADD
//!     HALT
//! ").unwrap();
//!
//! assert_eq!(code, [
//!     0x01, 0x02, 0x00, 0x00, 0x00,
//!     0x01, 0x03, 0x00, 0x00, 0x00,
//!     0x10,
//!     0xFF,
//! ]);
//! ```

use tracing::debug;

/// Lexer implementation
pub mod lex;
/// Label table
pub mod labels;
/// Writer to svm bytecode
pub mod writer;

pub use writer::{BytecodeError, BytecodeErrorKind};

/// Assembles whole `source` into bytecode.
pub fn translate(source: &str) -> Result<Vec<u8>, BytecodeError<'_>> {
    let lines: Vec<_> = lex::Lex::new(source).collect();
    debug!(lines = lines.len(), "lexed source");

    let ctx = writer::Context::new().populate(lines.iter())?;
    ctx.generate(lines.iter())
}
