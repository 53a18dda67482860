//! Decomposition Monte Carlo sequence ledger.
//!
//! Holds the outstanding stake units of the current betting cycle. The next
//! bet is the sum of the two sequence ends; a win cancels both ends, a loss
//! appends the lost stake on the right. Whenever a single element greater
//! than one is left standing it is split into two halves.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::OutcomeStatus;

/// Sequence a fresh cycle starts from.
const STARTING_SEQUENCE: [u64; 2] = [0, 1];

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Stake-unit sequence for one betting cycle.
///
/// An empty sequence means the cycle is complete. The ledger never verifies
/// that `traded_unit_size` matches what it handed out, except when a single
/// element is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceLedger {
    sequence: Vec<u64>,
}

impl Default for SequenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SequenceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.sequence)
    }
}

impl SequenceLedger {
    /// Create a ledger at the start of a cycle (`[0, 1]`).
    pub fn new() -> Self {
        Self {
            sequence: STARTING_SEQUENCE.to_vec(),
        }
    }

    /// Discard the current state and start a new cycle at `[0, 1]`.
    ///
    /// Performs no completion check; calling this mid-cycle drops the
    /// outstanding units.
    pub fn reset_cycle(&mut self) {
        self.sequence.clear();
        self.sequence.extend_from_slice(&STARTING_SEQUENCE);
        debug!(sequence = ?self.sequence, "Cycle reset");
    }

    /// Units to stake on the next trade. `0` means no trade should be placed.
    pub fn next_unit_size(&self) -> u64 {
        match self.sequence.as_slice() {
            [] => 0,
            [only] => *only,
            [first, .., last] => first.saturating_add(*last),
        }
    }

    /// Apply the result of a trade sized at `traded_unit_size`.
    ///
    /// A no-op once the cycle is complete. Every applied outcome is followed
    /// by the decomposition step.
    pub fn apply_outcome(&mut self, won: bool, traded_unit_size: u64) -> OutcomeStatus {
        if self.is_cycle_complete() {
            warn!(
                won,
                traded_unit_size, "Outcome applied after cycle completion, ignoring"
            );
            return OutcomeStatus::IgnoredCycleComplete;
        }

        let mismatch = if won {
            self.remove_ends(traded_unit_size)
        } else {
            self.sequence.push(traded_unit_size);
            None
        };

        let decomposed = self.decompose();

        debug!(
            won,
            traded_unit_size,
            sequence = ?self.sequence,
            "Sequence updated"
        );

        match (won, mismatch) {
            (true, Some(expected)) => OutcomeStatus::MismatchedFinalWin {
                expected,
                traded: traded_unit_size,
            },
            (true, None) => OutcomeStatus::Won { decomposed },
            (false, _) => OutcomeStatus::Lost { decomposed },
        }
    }

    /// Whether the current cycle has been fully recovered.
    pub fn is_cycle_complete(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Current sequence, left end first.
    pub fn sequence(&self) -> &[u64] {
        &self.sequence
    }

    /// Total stake units still to be recovered in this cycle.
    pub fn outstanding_units(&self) -> u64 {
        self.sequence
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Win rule. Returns the expected element when a lone element was won
    /// with a different size.
    fn remove_ends(&mut self, traded_unit_size: u64) -> Option<u64> {
        if self.sequence.len() >= 2 {
            self.sequence.pop();
            self.sequence.remove(0);
            return None;
        }

        // Exactly one element left: it goes either way.
        let expected = self.sequence.pop()?;
        if traded_unit_size == expected {
            None
        } else {
            warn!(
                expected,
                traded = traded_unit_size,
                "Final element won with an unexpected unit size, removing it anyway"
            );
            Some(expected)
        }
    }

    /// Split a lone element `v > 1` into `[v / 2, v - v / 2]`.
    fn decompose(&mut self) -> Option<u64> {
        let value = match self.sequence.as_slice() {
            [v] if *v > 1 => *v,
            _ => return None,
        };

        let half1 = value / 2;
        let half2 = value - half1;
        self.sequence.clear();
        self.sequence.extend_from_slice(&[half1, half2]);

        debug!(value, half1, half2, "Decomposition applied");
        Some(value)
    }

    #[cfg(test)]
    pub(crate) fn from_sequence(sequence: Vec<u64>) -> Self {
        Self { sequence }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
