//! Core of the brainfry compiler.
//!
//! brainfry translates brainfuck into NASM assembly for x86-64 Linux.
//! The pipeline is roughly:
//!
//!   source bytes
//!     -> lexer     (opcode stream)
//!     -> brackets  (loop pairs)   \
//!     -> grouping  (optional runs) -> codegen (assembly text)
//!
//! Both tables are built in full before code generation starts. Higher-level
//! tools (the CLI) should depend on this crate rather than reimplementing
//! the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end and analysis passes
// ---------------------------------------------------------------------

pub mod lexer;
pub mod brackets;
pub mod grouping;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod cells;
pub mod codegen;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{
    CompileOptions, CompileSummary, compile, compile_file, compile_to, default_output_path,
};
pub use error::CoreError;
pub use lexer::Opcode;
