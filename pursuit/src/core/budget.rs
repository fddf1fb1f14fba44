//! Iteration budget guarding against unbounded runs.

/// Counts loop iterations down from a fixed cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationBudget {
    max: u32,
    remaining: u32,
}

impl IterationBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    /// Consume one iteration, returning its 1-indexed number, or `None` once spent.
    pub fn next_iteration(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.used())
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn used(&self) -> u32 {
        self.max - self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
