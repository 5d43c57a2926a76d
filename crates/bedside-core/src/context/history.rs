//! Sliding conversation history.
//!
//! A [`HistoryWindow`] keeps the most recent `k` turns in chronological
//! order. Pushing past capacity evicts the oldest turn first, so the window
//! always equals the last `k` exchanges.

use std::collections::VecDeque;

/// One input/output exchange.
///
/// Turns are immutable once recorded; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    input: String,
    output: String,
    sequence_number: u64,
}

impl Turn {
    /// The caller's input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The model's reply text (unformatted).
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Position of this turn in the conversation, starting at 1.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }
}

/// Fixed-capacity FIFO log of recent turns.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    turns: VecDeque<Turn>,
    capacity: usize,
    next_sequence: u64,
}

impl HistoryWindow {
    /// Create an empty window holding at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 1,
        }
    }

    /// Record a new turn, evicting the oldest one if the window is full.
    ///
    /// Returns a copy of the recorded turn, which stays valid even when a
    /// capacity of zero means nothing is retained. Sequence numbers advance
    /// either way.
    pub fn push(&mut self, input: impl Into<String>, output: impl Into<String>) -> Turn {
        let turn = Turn {
            input: input.into(),
            output: output.into(),
            sequence_number: self.next_sequence,
        };
        self.next_sequence += 1;

        self.turns.push_back(turn.clone());
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
        turn
    }

    /// Owned copy of the current turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Drop all turns. Sequence numbers keep increasing afterwards.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of turns currently held, never more than [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True before the first push and after [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The `k` fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
