//! Fixed-length vector clocks indexed by [`ProcessId`].
//!
//! The partial order is the usual one:
//! - `a <= b` iff `a[p] <= b[p]` for every process `p`
//! - `a < b` iff `a <= b` and `a != b`
//! - `a` and `b` are concurrent iff neither `a <= b` nor `b <= a`
//!
//! Concurrent clocks compare as `None` through [`PartialOrd`], so `a <= b` is `false` in both
//! directions.

use std::cmp::Ordering;
use std::fmt;

use crate::event::ProcessId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CausalOrder {
    Before,
    After,
    Equal,
    Concurrent,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VectorClock {
    entries: Box<[u64]>,
}

impl VectorClock {
    /// All-zero clock for a run of `process_count` processes.
    pub fn new(process_count: usize) -> Self {
        Self {
            entries: vec![0; process_count].into_boxed_slice(),
        }
    }

    pub fn from_entries(entries: impl Into<Box<[u64]>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Panics if `process` is outside the run; callers validate ids at parse time.
    pub fn get(&self, process: ProcessId) -> u64 {
        self.entries[process.index()]
    }

    pub fn set(&mut self, process: ProcessId, value: u64) {
        self.entries[process.index()] = value;
    }

    /// Increments the slot of `process` and returns the new value.
    pub fn increment(&mut self, process: ProcessId) -> u64 {
        let slot = &mut self.entries[process.index()];
        *slot += 1;
        *slot
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    pub fn causal_order(&self, other: &Self) -> CausalOrder {
        assert_eq!(self.len(), other.len(), "clocks of different runs");
        let mut self_leq_other = true;
        let mut other_leq_self = true;
        for (a, b) in self.entries.iter().zip(other.entries.iter()) {
            if a > b {
                self_leq_other = false;
            }
            if b > a {
                other_leq_self = false;
            }
            if !self_leq_other && !other_leq_self {
                return CausalOrder::Concurrent;
            }
        }
        match (self_leq_other, other_leq_self) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::Before,
            (false, true) => CausalOrder::After,
            (false, false) => CausalOrder::Concurrent,
        }
    }

    pub fn is_concurrent_with(&self, other: &Self) -> bool {
        self.causal_order(other) == CausalOrder::Concurrent
    }
}

impl PartialOrd for VectorClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.causal_order(other) {
            CausalOrder::Before => Some(Ordering::Less),
            CausalOrder::Equal => Some(Ordering::Equal),
            CausalOrder::After => Some(Ordering::Greater),
            CausalOrder::Concurrent => None,
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VectorClock{self}")
    }
}
