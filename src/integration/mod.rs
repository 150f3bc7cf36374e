//! Wiring between the view and the backend workers

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorHandle};
