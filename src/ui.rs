//! Terminal feedback helpers for the CLI.

pub mod progress;

pub use progress::ProgressManager;
