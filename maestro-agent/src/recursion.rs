//! Bounding tool-call round trips within a turn.
//!
//! One unit is consumed per tool-call batch: a model response that asks for
//! three tools in one go costs one unit, not three.

/// Default number of tool-call batches per turn.
pub const DEFAULT_MAX_RECURSIONS: u32 = 5;

/// Where a guard stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionState {
    /// More batches may run.
    Active {
        /// Batches left.
        remaining: u32,
    },
    /// No batches left.
    Exhausted,
}

/// Per-turn counter of tool-call batches.
///
/// Created fresh for every turn and never shared.
///
/// ```rust
/// use maestro_agent::{RecursionGuard, RecursionState};
///
/// let mut guard = RecursionGuard::new(2);
/// assert!(guard.try_consume());
/// assert!(guard.try_consume());
/// assert!(!guard.try_consume());
/// assert_eq!(guard.state(), RecursionState::Exhausted);
/// assert_eq!(guard.cycles_used(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    max: u32,
    used: u32,
}

impl RecursionGuard {
    /// Create a guard allowing `max` batches. Zero disables tool looping.
    #[must_use]
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RecursionState {
        match self.remaining() {
            0 => RecursionState::Exhausted,
            remaining => RecursionState::Active { remaining },
        }
    }

    /// Consume one batch. Returns `false` once exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.max {
            return false;
        }
        self.used += 1;
        tracing::debug!(used = self.used, remaining = self.remaining(), "Recursion unit consumed");
        true
    }

    /// Batches consumed so far.
    #[must_use]
    pub fn cycles_used(&self) -> u32 {
        self.used
    }

    /// Batches left.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    /// Configured maximum.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether no batches are left.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state() == RecursionState::Exhausted
    }
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECURSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_allows_five() {
        let mut guard = RecursionGuard::default();
        assert_eq!(guard.state(), RecursionState::Active { remaining: 5 });
        for _ in 0..5 {
            assert!(guard.try_consume());
        }
        assert!(!guard.try_consume());
        assert_eq!(guard.cycles_used(), 5);
    }

    #[test]
    fn test_zero_is_exhausted_immediately() {
        let mut guard = RecursionGuard::new(0);
        assert!(guard.is_exhausted());
        assert!(!guard.try_consume());
        assert_eq!(guard.cycles_used(), 0);
    }

    #[rstest]
    #[case(1, 0)]
    #[case(3, 1)]
    #[case(3, 3)]
    fn test_remaining(#[case] max: u32, #[case] consumed: u32) {
        let mut guard = RecursionGuard::new(max);
        for _ in 0..consumed {
            guard.try_consume();
        }
        assert_eq!(guard.remaining(), max - consumed);
    }
}
