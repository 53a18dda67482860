//! Decomposition Monte Carlo position sizer.
//!
//! Library crate exposing the sequence ledger, the sizing controller, and
//! the outcome replay harness for use by integration tests and the binary
//! entry point.

pub mod backtest;
pub mod config;
pub mod strategy;
pub mod types;
