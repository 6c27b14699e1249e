pub mod error;
pub mod orchestrator;
pub mod report;
pub mod snapshot;
