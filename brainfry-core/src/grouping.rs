//! Run-length grouping of consecutive `+` / `-` instructions.
//!
//! A run is a maximal stretch of identical arithmetic opcodes. Only its
//! first position (the leader) is recorded, mapped to the run length.
//! Runs of length one are recorded too; the code generator relies on an
//! entry being present before it emits any arithmetic.

use std::collections::BTreeMap;

use crate::lexer::Opcode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingTable {
    runs: BTreeMap<usize, usize>,
}

impl GroupingTable {
    /// Length of the run led by `ip`, or `None` when `ip` is not a leader.
    pub fn run_at(&self, ip: usize) -> Option<usize> {
        self.runs.get(&ip).copied()
    }

    pub fn is_leader(&self, ip: usize) -> bool {
        self.runs.contains_key(&ip)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// `(leader, length)` entries in stream order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.runs.iter().map(|(&leader, &len)| (leader, len))
    }
}

pub fn group_runs(ops: &[Opcode]) -> GroupingTable {
    let mut runs = BTreeMap::new();
    let mut current: Option<(usize, Opcode)> = None;

    for (ip, &op) in ops.iter().enumerate() {
        if !op.is_arithmetic() {
            current = None;
            continue;
        }
        match current {
            Some((leader, run_op)) if run_op == op => {
                *runs.entry(leader).or_insert(0) += 1;
            }
            _ => {
                runs.insert(ip, 1);
                current = Some((ip, op));
            }
        }
    }

    GroupingTable { runs }
}
