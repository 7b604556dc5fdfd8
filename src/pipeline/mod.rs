//! Pipeline stages for a bulletin run.
//!
//! - `detect`: Compare the newest bulletin with the stored marker
//! - `compare`: Join two case tables and compute day-over-day deltas
//! - `run`: Orchestrate one end-to-end pass

pub mod compare;
pub mod detect;
pub mod run;

pub use compare::compare;
pub use detect::{Change, classify, detect_change};
pub use run::{Pipeline, RunOptions, RunOutcome};
