pub mod config;
pub mod context;
pub mod emotion;
pub mod fallback;
pub mod flow;
pub mod intent;
pub mod language;
pub mod learning;
pub mod pipeline;
pub mod reasoning;
pub mod router;
pub mod skills;

// Re-export the entry point for convenient access
pub use pipeline::{Pipeline, TurnOutcome, TurnStatus};
