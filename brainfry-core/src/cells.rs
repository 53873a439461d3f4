//! Where the generated program keeps its cells.
//!
//! The code generator never names a register or address for the tape
//! directly. It asks a [`CellStore`] for the operand of the current cell and
//! for the instructions that move between cells, so the storage strategy can
//! change without touching per-opcode emission.

use std::io::{self, Write};

pub trait CellStore {
    /// Memory operand addressing the current cell, e.g. `[rsp]`.
    fn cell(&self) -> &str;

    /// Set up the first cell before any instruction runs.
    fn emit_init(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Move to the next cell (`>`).
    fn emit_advance(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Move back to the previous cell (`<`).
    fn emit_retreat(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Cells are 8-byte words on the process stack, addressed through `rsp`.
///
/// Moving right grows the stack downward; moving left gives the word back.
/// Nothing checks either direction: moving left of the first cell walks
/// into the process's startup data, which is undefined behaviour of the
/// generated program.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackCells;

impl StackCells {
    pub const CELL_BYTES: u32 = 8;
}

impl CellStore for StackCells {
    fn cell(&self) -> &str {
        "[rsp]"
    }

    fn emit_init(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "    mov rax, 0")?;
        writeln!(out, "    mov {}, rax", self.cell())
    }

    fn emit_advance(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "    sub rsp, {}", Self::CELL_BYTES)
    }

    fn emit_retreat(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "    add rsp, {}", Self::CELL_BYTES)
    }
}
