//! Library components of the NNA pipeline runner.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod run_log;
