//! Outcome replay engine.
//!
//! Replays a win/loss stream through the sizing controller and books P&L
//! with fixed take-profit / stop-loss payoffs per lot, tracking the balance
//! curve, drawdown, and how far the progression stretched.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::strategy::{SizerConfig, SizingController};
use crate::types::{OutcomeStatus, TradeOutcome};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Payoff model for the replay.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Starting account balance.
    pub initial_balance: Decimal,
    /// Profit per 1.0 lot on a winning trade.
    pub take_profit: Decimal,
    /// Loss per 1.0 lot on a losing trade.
    pub stop_loss: Decimal,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            take_profit: dec!(25), // symmetric 25-pip brackets
            stop_loss: dec!(25),
        }
    }
}

// ---------------------------------------------------------------------------
// Backtest results
// ---------------------------------------------------------------------------

/// Complete replay report.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub total_pnl: Decimal,
    pub return_pct: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub cycles_completed: u64,
    pub anomalies: u64,
    pub max_units: u64,
    pub max_sequence_len: usize,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub peak_balance: Decimal,
    /// Sequence left open when the stream ran out.
    pub final_sequence: Vec<u64>,
    /// Replay stopped early because the ledger asked for a zero-unit bet.
    pub stalled: bool,
    pub balance_history: Vec<Decimal>,
    pub trade_log: Vec<BacktestTrade>,
    pub generated_at: DateTime<Utc>,
}

/// Individual trade in the replay.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestTrade {
    pub index: usize,
    pub outcome: TradeOutcome,
    pub units: u64,
    pub lots: Decimal,
    pub pnl: Decimal,
    pub balance_after: Decimal,
    pub status: OutcomeStatus,
    pub sequence_after: Vec<u64>,
    pub cycle_completed: bool,
}

// ---------------------------------------------------------------------------
// Backtester
// ---------------------------------------------------------------------------

pub struct Backtester {
    sizer_config: SizerConfig,
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(sizer_config: SizerConfig, config: BacktestConfig) -> Self {
        Self {
            sizer_config,
            config,
        }
    }

    /// Replay `outcomes` in order, one trade per outcome.
    pub fn run(&self, outcomes: &[TradeOutcome]) -> BacktestReport {
        let mut controller = SizingController::new(self.sizer_config.clone());
        let initial = self.config.initial_balance;
        let mut balance = initial;
        let mut peak = initial;
        let mut max_dd = Decimal::ZERO;
        let mut balance_history = vec![initial];
        let mut trade_log = Vec::with_capacity(outcomes.len());
        let mut stalled = false;

        for (index, outcome) in outcomes.iter().enumerate() {
            // Each iteration closes what it opened, so the controller never
            // holds a position here and always has one to close below.
            let Ok(opened) = controller.open_position() else {
                unreachable!("replay opened a position while another was open");
            };
            let Some(size) = opened else {
                warn!(
                    index,
                    sequence = %controller.ledger(),
                    "Zero-unit bet requested, stopping replay"
                );
                stalled = true;
                break;
            };

            let Ok(report) = controller.close_position(outcome.won()) else {
                unreachable!("replay closed a position it never opened");
            };

            let pnl = if outcome.won() {
                size.lots * self.config.take_profit
            } else {
                -(size.lots * self.config.stop_loss)
            };
            balance += pnl;

            if balance > peak {
                peak = balance;
            }
            let dd = peak - balance;
            if dd > max_dd {
                max_dd = dd;
            }

            debug!(
                index,
                outcome = %outcome,
                units = size.units,
                pnl = %pnl,
                balance = %balance,
                "Trade replayed"
            );

            trade_log.push(BacktestTrade {
                index,
                outcome: *outcome,
                units: size.units,
                lots: size.lots,
                pnl,
                balance_after: balance,
                status: report.status,
                sequence_after: report.sequence_after,
                cycle_completed: report.cycle_completed,
            });
            balance_history.push(balance);
        }

        let stats = controller.stats();
        let total_trades = trade_log.len();
        let wins = trade_log.iter().filter(|t| t.outcome.won()).count();
        let losses = total_trades - wins;

        let return_pct = if initial > Decimal::ZERO {
            ((balance - initial) / initial * dec!(100))
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let max_drawdown_pct = if peak > Decimal::ZERO {
            (max_dd / peak * dec!(100)).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let report = BacktestReport {
            initial_balance: initial,
            final_balance: balance,
            total_pnl: balance - initial,
            return_pct,
            total_trades,
            wins,
            losses,
            win_rate: if total_trades > 0 {
                wins as f64 / total_trades as f64
            } else {
                0.0
            },
            cycles_completed: stats.cycles_completed,
            anomalies: stats.anomalies,
            max_units: stats.max_units,
            max_sequence_len: stats.max_sequence_len,
            max_drawdown: max_dd,
            max_drawdown_pct,
            peak_balance: peak,
            final_sequence: controller.ledger().sequence().to_vec(),
            stalled,
            balance_history,
            trade_log,
            generated_at: Utc::now(),
        };

        info!(
            trades = report.total_trades,
            wins = report.wins,
            cycles = report.cycles_completed,
            pnl = %report.total_pnl,
            max_units = report.max_units,
            final_sequence = ?report.final_sequence,
            "Replay complete"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
