//! Decomposition Monte Carlo sizer — outcome replay binary.
//!
//! Loads configuration, initialises structured logging, replays the
//! configured win/loss stream through the sizer and reports the result.

use anyhow::{Context, Result};
use tracing::info;

use decomp_sizer::backtest::{self, runner::BacktestReport, runner::Backtester};
use decomp_sizer::config::AppConfig;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    info!(
        agent_name = %cfg.agent.name,
        unit_lot = %cfg.sizer.unit_lot,
        outcomes_file = %cfg.backtest.outcomes_file,
        "Sizer starting up"
    );

    let outcomes = backtest::load_outcomes(&cfg.backtest.outcomes_file)?;
    let backtester = Backtester::new(cfg.sizer_config(), cfg.backtest_config());
    let report = backtester.run(&outcomes);

    log_report(&report);

    if let Some(path) = cfg.backtest.report_path.as_deref() {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialise replay report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {path}"))?;
        info!(path, "Report written");
    }

    Ok(())
}

/// Log a human-readable replay summary.
fn log_report(report: &BacktestReport) {
    info!(
        trades = report.total_trades,
        wins = report.wins,
        losses = report.losses,
        win_rate = format!("{:.1}%", report.win_rate * 100.0),
        cycles = report.cycles_completed,
        anomalies = report.anomalies,
        pnl = %report.total_pnl,
        return_pct = format!("{:.2}%", report.return_pct),
        max_drawdown = %report.max_drawdown,
        max_units = report.max_units,
        max_sequence_len = report.max_sequence_len,
        final_sequence = ?report.final_sequence,
        stalled = report.stalled,
        "Replay summary"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("decomp_sizer=info"));

    let json_logging = std::env::var("SIZER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
