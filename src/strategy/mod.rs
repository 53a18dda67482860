//! Strategy layer — the sequence ledger and the controller that drives it.
//!
//! The controller owns one ledger, hands out position sizes scaled by the
//! configured lot per unit, remembers the units it handed out, and feeds
//! trade results back into the ledger, resetting it when a cycle completes.

pub mod ledger;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::{OutcomeStatus, PositionSize, SizerError};
use ledger::SequenceLedger;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sizing configuration.
#[derive(Debug, Clone)]
pub struct SizerConfig {
    /// Lots traded per stake unit.
    pub unit_lot: Decimal,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            unit_lot: dec!(0.01),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened when a position was closed.
#[derive(Debug, Clone, Serialize)]
pub struct CloseReport {
    pub units: u64,
    pub lots: Decimal,
    pub won: bool,
    pub status: OutcomeStatus,
    /// Sequence right after the outcome, before any reset.
    pub sequence_after: Vec<u64>,
    pub cycle_completed: bool,
}

/// Running counters across cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub cycles_completed: u64,
    /// Outcomes that took a recovery path in the ledger.
    pub anomalies: u64,
    pub max_units: u64,
    pub max_sequence_len: usize,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives a `SequenceLedger` through size → outcome round trips.
///
/// Call `open_position` when an entry opportunity arrives and
/// `close_position` exactly once when that position closes.
pub struct SizingController {
    config: SizerConfig,
    ledger: SequenceLedger,
    open_units: Option<u64>,
    stats: CycleStats,
}

impl SizingController {
    pub fn new(config: SizerConfig) -> Self {
        let ledger = SequenceLedger::new();
        let stats = CycleStats {
            max_sequence_len: ledger.sequence().len(),
            ..CycleStats::default()
        };
        Self {
            config,
            ledger,
            open_units: None,
            stats,
        }
    }

    pub fn ledger(&self) -> &SequenceLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn has_open_position(&self) -> bool {
        self.open_units.is_some()
    }

    /// Size the next entry.
    ///
    /// Returns `Ok(None)` when the ledger asks for a zero-unit bet, in which
    /// case no position is opened.
    pub fn open_position(&mut self) -> Result<Option<PositionSize>, SizerError> {
        if let Some(units) = self.open_units {
            return Err(SizerError::PositionAlreadyOpen { units });
        }

        let units = self.ledger.next_unit_size();
        if units == 0 {
            if !self.ledger.is_cycle_complete() {
                warn!(
                    sequence = %self.ledger,
                    "Ledger asks for a zero-unit bet mid-cycle, no entry"
                );
            }
            return Ok(None);
        }

        let size = PositionSize {
            units,
            lots: Decimal::from(units) * self.config.unit_lot,
        };
        self.open_units = Some(units);
        self.stats.max_units = self.stats.max_units.max(units);

        debug!(
            units,
            lots = %size.lots,
            sequence = %self.ledger,
            "Position sized"
        );

        Ok(Some(size))
    }

    /// Feed back the result of the open position.
    pub fn close_position(&mut self, won: bool) -> Result<CloseReport, SizerError> {
        let units = self.open_units.take().ok_or(SizerError::NoOpenPosition)?;

        let before = self.ledger.to_string();
        let status = self.ledger.apply_outcome(won, units);
        let sequence_after = self.ledger.sequence().to_vec();

        self.stats.trades += 1;
        if won {
            self.stats.wins += 1;
        } else {
            self.stats.losses += 1;
        }
        if status.is_anomalous() {
            self.stats.anomalies += 1;
        }
        self.stats.max_sequence_len = self.stats.max_sequence_len.max(sequence_after.len());

        debug!(
            won,
            units,
            before = %before,
            after = ?sequence_after,
            status = %status,
            "Outcome applied"
        );

        let cycle_completed = self.ledger.is_cycle_complete();
        if cycle_completed {
            self.stats.cycles_completed += 1;
            info!(
                cycles = self.stats.cycles_completed,
                trades = self.stats.trades,
                "Cycle complete, resetting sequence"
            );
            self.ledger.reset_cycle();
        }

        Ok(CloseReport {
            units,
            lots: Decimal::from(units) * self.config.unit_lot,
            won,
            status,
            sequence_after,
            cycle_completed,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_controller() -> SizingController {
        SizingController::new(SizerConfig::default())
    }

    fn round_trip(ctl: &mut SizingController, won: bool) -> CloseReport {
        ctl.open_position().unwrap().expect("non-zero size");
        ctl.close_position(won).unwrap()
    }

    #[test]
    fn test_first_entry_is_one_unit() {
        let mut ctl = make_controller();
        let size = ctl.open_position().unwrap().unwrap();
        assert_eq!(size.units, 1);
        assert_eq!(size.lots, dec!(0.01));
        assert!(ctl.has_open_position());
    }

    #[test]
    fn test_lots_scale_with_unit_lot() {
        let mut ctl = SizingController::new(SizerConfig { unit_lot: dec!(0.1) });
        round_trip(&mut ctl, false); // [0,1,1]
        round_trip(&mut ctl, false); // [0,1,1,1]
        let size = ctl.open_position().unwrap().unwrap();
        assert_eq!(size.units, 1);
        assert_eq!(size.lots, dec!(0.1));
    }

    #[test]
    fn test_double_open_rejected() {
        let mut ctl = make_controller();
        ctl.open_position().unwrap();
        let err = ctl.open_position().unwrap_err();
        assert!(matches!(err, SizerError::PositionAlreadyOpen { units: 1 }));
    }

    #[test]
    fn test_close_without_open_rejected() {
        let mut ctl = make_controller();
        assert!(matches!(
            ctl.close_position(true),
            Err(SizerError::NoOpenPosition)
        ));
        assert_eq!(ctl.stats().trades, 0);
    }

    #[test]
    fn test_immediate_win_completes_and_resets() {
        let mut ctl = make_controller();
        let report = round_trip(&mut ctl, true);
        assert!(report.cycle_completed);
        assert!(report.sequence_after.is_empty());
        assert_eq!(ctl.ledger().sequence(), &[0, 1]);
        assert_eq!(ctl.stats().cycles_completed, 1);
        assert!(!ctl.has_open_position());
    }

    #[test]
    fn test_loss_win_win_cycle() {
        let mut ctl = make_controller();

        let r1 = round_trip(&mut ctl, false);
        assert_eq!(r1.sequence_after, vec![0, 1, 1]);
        assert!(!r1.cycle_completed);

        let r2 = round_trip(&mut ctl, true);
        assert_eq!(r2.sequence_after, vec![1]);

        let r3 = round_trip(&mut ctl, true);
        assert!(r3.cycle_completed);

        let stats = ctl.stats();
        assert_eq!(stats.trades, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.max_sequence_len, 3);
        assert_eq!(stats.anomalies, 0);
    }

    #[test]
    fn test_losing_streak_grows_stake() {
        let mut ctl = make_controller();
        for _ in 0..4 {
            round_trip(&mut ctl, false);
        }
        // [0,1,1,1,1,1] -> next = 0 + 1
        assert_eq!(ctl.ledger().sequence(), &[0, 1, 1, 1, 1, 1]);
        round_trip(&mut ctl, true); // [1,1,1,1]
        let size = ctl.open_position().unwrap().unwrap();
        assert_eq!(size.units, 2);
        assert_eq!(ctl.stats().max_units, 2);
    }
}
