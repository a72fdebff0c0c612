#![forbid(unsafe_code)]

//! Record streams.
//!
//! A [`Stream`] is a stack of records with a tracked byte total. Normal
//! traffic pushes and pops at the active end (the back of the deque);
//! retention trimming evicts from the tail (the front, oldest records).
//!
//! # Invariants
//!
//! 1. `byte_total` always equals the sum of `byte_size()` over all records.
//! 2. Records are never modified once pushed.

use std::collections::VecDeque;

use crate::record::Record;

/// Stack-ordered log of records.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    records: VecDeque<Record>,
    byte_total: usize,
}

impl Stream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the active end.
    pub fn push(&mut self, record: Record) {
        self.byte_total += record.byte_size() as usize;
        self.records.push_back(record);
    }

    /// Remove the newest record.
    pub fn pop(&mut self) -> Option<Record> {
        let record = self.records.pop_back()?;
        self.byte_total -= record.byte_size() as usize;
        Some(record)
    }

    /// Remove the oldest record. Only retention trimming uses this.
    pub fn pop_tail(&mut self) -> Option<Record> {
        let record = self.records.pop_front()?;
        self.byte_total -= record.byte_size() as usize;
        Some(record)
    }

    /// Newest record, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&Record> {
        self.records.back()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn byte_total(&self) -> usize {
        self.byte_total
    }

    /// Records from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().rev()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.byte_total = 0;
    }

    /// Drop records pushed after the stream had `len` records.
    pub(crate) fn truncate_to(&mut self, len: usize) {
        while self.records.len() > len {
            self.pop();
        }
    }

    /// Number of complete groups, scanning from the active end.
    ///
    /// A bracketed run counts once however deeply it nests; a bare record
    /// counts as a group of one. A run still open when the scan reaches the
    /// oldest record is not counted.
    #[must_use]
    pub fn count_groups(&self) -> usize {
        let mut groups = 0;
        let mut level = 0i32;
        for record in self.iter() {
            level += record.kind().nesting();
            if level == 0 {
                groups += 1;
            }
        }
        groups
    }

    /// Whether every OPEN has its CLOSE.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.records
            .iter()
            .map(|r| r.kind().nesting())
            .sum::<i32>()
            == 0
    }
}
