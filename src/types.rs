//! Shared types for the sizer.
//!
//! Outcomes flowing into the ledger, the status it reports back, the sized
//! positions handed to the caller, and the domain error type.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Trade outcome
// ---------------------------------------------------------------------------

/// Result of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeOutcome {
    Win,
    Loss,
}

impl TradeOutcome {
    pub fn won(self) -> bool {
        matches!(self, TradeOutcome::Win)
    }
}

impl From<bool> for TradeOutcome {
    fn from(won: bool) -> Self {
        if won {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        }
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Win => write!(f, "W"),
            TradeOutcome::Loss => write!(f, "L"),
        }
    }
}

impl FromStr for TradeOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "win" | "1" => Ok(TradeOutcome::Win),
            "l" | "loss" | "0" => Ok(TradeOutcome::Loss),
            other => Err(format!("unrecognised outcome '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger status
// ---------------------------------------------------------------------------

/// What `SequenceLedger::apply_outcome` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    /// Win applied. `decomposed` holds the value that was split, if any.
    Won { decomposed: Option<u64> },
    /// Loss applied. `decomposed` holds the value that was split, if any.
    Lost { decomposed: Option<u64> },
    /// The last element was won with a size other than its own value.
    /// The element was removed anyway.
    MismatchedFinalWin { expected: u64, traded: u64 },
    /// Cycle was already complete; nothing changed.
    IgnoredCycleComplete,
}

impl OutcomeStatus {
    /// Whether the ledger took a recovery path rather than the normal one.
    pub fn is_anomalous(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::MismatchedFinalWin { .. } | OutcomeStatus::IgnoredCycleComplete
        )
    }

    /// Value split by the decomposition step, if it fired.
    pub fn decomposed(&self) -> Option<u64> {
        match self {
            OutcomeStatus::Won { decomposed } | OutcomeStatus::Lost { decomposed } => *decomposed,
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Won { decomposed: None } => write!(f, "WIN"),
            OutcomeStatus::Won { decomposed: Some(v) } => write!(f, "WIN (split {v})"),
            OutcomeStatus::Lost { decomposed: None } => write!(f, "LOSS"),
            OutcomeStatus::Lost { decomposed: Some(v) } => write!(f, "LOSS (split {v})"),
            OutcomeStatus::MismatchedFinalWin { expected, traded } => {
                write!(f, "WIN on final element with {traded} units (expected {expected})")
            }
            OutcomeStatus::IgnoredCycleComplete => write!(f, "IGNORED (cycle complete)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Position size
// ---------------------------------------------------------------------------

/// Size of a position about to be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionSize {
    /// Unscaled stake units from the ledger.
    pub units: u64,
    /// `units × unit_lot`.
    pub lots: Decimal,
}

impl fmt::Display for PositionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} units ({} lots)", self.units, self.lots)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the sizer.
#[derive(Debug, thiserror::Error)]
pub enum SizerError {
    #[error("Position already open ({units} units); close it before sizing another")]
    PositionAlreadyOpen { units: u64 },

    #[error("No open position to close")]
    NoOpenPosition,

    #[error("Invalid outcome on line {line}: {value}")]
    OutcomeParse { line: usize, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_parse_variants() {
        assert_eq!("W".parse::<TradeOutcome>().unwrap(), TradeOutcome::Win);
        assert_eq!(" win ".parse::<TradeOutcome>().unwrap(), TradeOutcome::Win);
        assert_eq!("1".parse::<TradeOutcome>().unwrap(), TradeOutcome::Win);
        assert_eq!("l".parse::<TradeOutcome>().unwrap(), TradeOutcome::Loss);
        assert_eq!("LOSS".parse::<TradeOutcome>().unwrap(), TradeOutcome::Loss);
        assert_eq!("0".parse::<TradeOutcome>().unwrap(), TradeOutcome::Loss);
        assert!("draw".parse::<TradeOutcome>().is_err());
        assert!("lose".parse::<TradeOutcome>().is_err());
    }

    #[test]
    fn test_outcome_from_bool() {
        assert!(TradeOutcome::from(true).won());
        assert!(!TradeOutcome::from(false).won());
        assert_eq!(format!("{}", TradeOutcome::Loss), "L");
    }

    #[test]
    fn test_status_anomalous() {
        assert!(!OutcomeStatus::Won { decomposed: None }.is_anomalous());
        assert!(!OutcomeStatus::Lost { decomposed: Some(4) }.is_anomalous());
        assert!(OutcomeStatus::IgnoredCycleComplete.is_anomalous());
        assert!(OutcomeStatus::MismatchedFinalWin { expected: 1, traded: 2 }.is_anomalous());
    }

    #[test]
    fn test_status_decomposed() {
        assert_eq!(OutcomeStatus::Lost { decomposed: Some(5) }.decomposed(), Some(5));
        assert_eq!(OutcomeStatus::IgnoredCycleComplete.decomposed(), None);
        assert_eq!(
            format!("{}", OutcomeStatus::Won { decomposed: Some(3) }),
            "WIN (split 3)"
        );
    }

    #[test]
    fn test_position_size_display() {
        let size = PositionSize { units: 3, lots: dec!(0.03) };
        assert_eq!(format!("{size}"), "3 units (0.03 lots)");
    }

    #[test]
    fn test_error_display() {
        let err = SizerError::OutcomeParse { line: 4, value: "x".into() };
        assert_eq!(err.to_string(), "Invalid outcome on line 4: x");
        assert_eq!(SizerError::NoOpenPosition.to_string(), "No open position to close");
    }
}
