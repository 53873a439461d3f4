//! Lexer for brainfry.
//!
//! Only the eight instruction bytes carry meaning. Everything else in the
//! source is commentary and is dropped, so the position of an opcode in the
//! returned stream (its instruction pointer) is independent of the raw byte
//! offset it came from.

/// A single source instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    MoveRight, // >
    MoveLeft,  // <
    Increment, // +
    Decrement, // -
    Output,    // .
    Input,     // ,
    LoopOpen,  // [
    LoopClose, // ]
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            b'>' => Some(Opcode::MoveRight),
            b'<' => Some(Opcode::MoveLeft),
            b'+' => Some(Opcode::Increment),
            b'-' => Some(Opcode::Decrement),
            b'.' => Some(Opcode::Output),
            b',' => Some(Opcode::Input),
            b'[' => Some(Opcode::LoopOpen),
            b']' => Some(Opcode::LoopClose),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Opcode::MoveRight => '>',
            Opcode::MoveLeft => '<',
            Opcode::Increment => '+',
            Opcode::Decrement => '-',
            Opcode::Output => '.',
            Opcode::Input => ',',
            Opcode::LoopOpen => '[',
            Opcode::LoopClose => ']',
        }
    }

    /// Increment and decrement are the only opcodes that form runs.
    pub fn is_arithmetic(self) -> bool {
        matches!(self, Opcode::Increment | Opcode::Decrement)
    }
}

/// Filter raw source down to its opcode stream, preserving order.
///
/// No structural validation happens here; unbalanced brackets are left for
/// the bracket matcher to report.
pub fn lex(source: impl AsRef<[u8]>) -> Vec<Opcode> {
    source
        .as_ref()
        .iter()
        .filter_map(|&byte| Opcode::from_byte(byte))
        .collect()
}
