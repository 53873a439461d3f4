//! Code generation: lower the opcode stream into NASM x86-64 assembly.
//!
//! The output targets Linux and talks to the kernel directly through
//! `syscall`. Every opcode becomes one fixed fragment; loops become a pair of
//! labels named after the bracket positions, so label names are unique and
//! the output is fully determined by the opcode stream and whether grouping
//! is enabled.

use std::io::Write;

use crate::brackets::BracketTable;
use crate::cells::CellStore;
use crate::error::CoreError;
use crate::grouping::GroupingTable;
use crate::lexer::Opcode;

/// Emit the complete program: header, one fragment per opcode, epilogue.
///
/// With `grouping` set, `+`/`-` emit arithmetic only at run leaders, using
/// the recorded run length; other positions in a run emit nothing. Without
/// it every `+`/`-` adds or subtracts exactly one.
pub fn generate<W: Write, C: CellStore>(
    out: &mut W,
    ops: &[Opcode],
    brackets: &BracketTable,
    grouping: Option<&GroupingTable>,
    cells: &C,
) -> Result<(), CoreError> {
    let mut emitter = Emitter {
        out,
        brackets,
        grouping,
        cells,
    };
    emitter.header()?;
    for (ip, &op) in ops.iter().enumerate() {
        emitter.opcode(ip, op)?;
    }
    emitter.epilogue()?;
    emitter.out.flush()?;
    Ok(())
}

struct Emitter<'a, W, C> {
    out: &'a mut W,
    brackets: &'a BracketTable,
    grouping: Option<&'a GroupingTable>,
    cells: &'a C,
}

impl<W: Write, C: CellStore> Emitter<'_, W, C> {
    fn header(&mut self) -> Result<(), CoreError> {
        // One scratch byte for output and a one-byte input buffer.
        writeln!(self.out, "section .data")?;
        writeln!(self.out, "sum:")?;
        writeln!(self.out, "    db 0")?;
        writeln!(self.out, "section .bss")?;
        writeln!(self.out, "    input_data resb 1")?;
        writeln!(self.out, "section .text")?;
        writeln!(self.out, "    global _start")?;
        writeln!(self.out, "_start:")?;
        self.cells.emit_init(&mut *self.out)?;
        Ok(())
    }

    fn epilogue(&mut self) -> Result<(), CoreError> {
        // exit(0)
        writeln!(self.out, "    mov rax, 60")?;
        writeln!(self.out, "    mov rdi, 0")?;
        writeln!(self.out, "    syscall")?;
        Ok(())
    }

    fn opcode(&mut self, ip: usize, op: Opcode) -> Result<(), CoreError> {
        match op {
            Opcode::MoveRight => {
                writeln!(self.out, "    ;;move right")?;
                self.cells.emit_advance(&mut *self.out)?;
            }
            Opcode::MoveLeft => {
                writeln!(self.out, "    ;;move left")?;
                self.cells.emit_retreat(&mut *self.out)?;
            }
            Opcode::Increment => {
                if let Some(amount) = self.amount(ip) {
                    writeln!(self.out, "    ;;add")?;
                    self.arithmetic("add", amount)?;
                }
            }
            Opcode::Decrement => {
                if let Some(amount) = self.amount(ip) {
                    writeln!(self.out, "    ;;subtract")?;
                    self.arithmetic("sub", amount)?;
                }
            }
            Opcode::Output => self.output()?,
            Opcode::Input => self.input()?,
            Opcode::LoopOpen => {
                let close = self
                    .brackets
                    .close_of(ip)
                    .ok_or(CoreError::UnclosedOpen { position: ip })?;
                writeln!(self.out, "{}:", open_label(ip))?;
                self.load_cell()?;
                writeln!(self.out, "    test rax, rax")?;
                writeln!(self.out, "    jz {}", close_label(close))?;
            }
            Opcode::LoopClose => {
                let open = self
                    .brackets
                    .open_of(ip)
                    .ok_or(CoreError::UnmatchedClose { position: ip })?;
                writeln!(self.out, "{}:", close_label(ip))?;
                self.load_cell()?;
                writeln!(self.out, "    test rax, rax")?;
                writeln!(self.out, "    jnz {}", open_label(open))?;
            }
        }
        Ok(())
    }

    /// How much a `+`/`-` at `ip` contributes, or `None` when its effect was
    /// already folded into the leader of its run.
    fn amount(&self, ip: usize) -> Option<usize> {
        match self.grouping {
            Some(grouping) => grouping.run_at(ip),
            None => Some(1),
        }
    }

    fn arithmetic(&mut self, mnemonic: &str, amount: usize) -> Result<(), CoreError> {
        self.load_cell()?;
        let mut remaining = amount;
        while remaining > 0 {
            let step = remaining.min(MAX_IMMEDIATE);
            writeln!(self.out, "    {mnemonic} rax, {step}")?;
            remaining -= step;
        }
        writeln!(self.out, "    mov {}, rax", self.cells.cell())?;
        Ok(())
    }

    fn output(&mut self) -> Result<(), CoreError> {
        // write(1, &sum, 1)
        writeln!(self.out, "    ;;out")?;
        self.load_cell()?;
        writeln!(self.out, "    mov [sum], al")?;
        writeln!(self.out, "    mov rax, 1")?;
        writeln!(self.out, "    mov rdi, 1")?;
        writeln!(self.out, "    mov rsi, sum")?;
        writeln!(self.out, "    mov rdx, 1")?;
        writeln!(self.out, "    syscall")?;
        Ok(())
    }

    fn input(&mut self) -> Result<(), CoreError> {
        // read(0, &input_data, 1)
        writeln!(self.out, "    ;;input")?;
        writeln!(self.out, "    mov rax, 0")?;
        writeln!(self.out, "    mov rdi, 0")?;
        writeln!(self.out, "    mov rsi, input_data")?;
        writeln!(self.out, "    mov rdx, 1")?;
        writeln!(self.out, "    syscall")?;
        writeln!(self.out, "    movzx rbx, byte [input_data]")?;
        writeln!(self.out, "    mov {}, rbx", self.cells.cell())?;
        Ok(())
    }

    fn load_cell(&mut self) -> Result<(), CoreError> {
        writeln!(self.out, "    mov rax, {}", self.cells.cell())?;
        Ok(())
    }
}

/// `add`/`sub` with a 64-bit register take a sign-extended 32-bit immediate.
const MAX_IMMEDIATE: usize = i32::MAX as usize;

fn open_label(ip: usize) -> String {
    format!("opening_bracket_{ip}")
}

fn close_label(ip: usize) -> String {
    format!("closing_bracket_{ip}")
}
