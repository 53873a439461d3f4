//! Loop bracket resolution.
//!
//! Pairs are resolved with a stack of pending `[` positions. The result is
//! kept as two directed maps so that each lookup states which direction it
//! expects; [`BracketTable::partner`] covers the symmetric case.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::lexer::Opcode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketTable {
    open_to_close: HashMap<usize, usize>,
    close_to_open: HashMap<usize, usize>,
}

impl BracketTable {
    /// Position of the `]` matching the `[` at `open`.
    pub fn close_of(&self, open: usize) -> Option<usize> {
        self.open_to_close.get(&open).copied()
    }

    /// Position of the `[` matching the `]` at `close`.
    pub fn open_of(&self, close: usize) -> Option<usize> {
        self.close_to_open.get(&close).copied()
    }

    /// The other end of whichever bracket sits at `ip`.
    pub fn partner(&self, ip: usize) -> Option<usize> {
        self.close_of(ip).or_else(|| self.open_of(ip))
    }

    /// Number of bracket pairs.
    pub fn len(&self) -> usize {
        self.open_to_close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open_to_close.is_empty()
    }

    /// `(open, close)` pairs in order of the opening position.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<_> = self
            .open_to_close
            .iter()
            .map(|(&open, &close)| (open, close))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    fn insert(&mut self, open: usize, close: usize) {
        self.open_to_close.insert(open, close);
        self.close_to_open.insert(close, open);
    }
}

/// Resolve every `[`/`]` pair in a single left-to-right scan.
pub fn match_brackets(ops: &[Opcode]) -> Result<BracketTable, CoreError> {
    let mut table = BracketTable::default();
    let mut pending = Vec::new();

    for (ip, op) in ops.iter().enumerate() {
        match op {
            Opcode::LoopOpen => pending.push(ip),
            Opcode::LoopClose => {
                let open = pending
                    .pop()
                    .ok_or(CoreError::UnmatchedClose { position: ip })?;
                table.insert(open, ip);
            }
            _ => {}
        }
    }

    // The bottom of the stack is the outermost (earliest) unclosed loop.
    if let Some(&position) = pending.first() {
        return Err(CoreError::UnclosedOpen { position });
    }

    Ok(table)
}
