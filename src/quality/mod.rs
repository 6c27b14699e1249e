pub mod clean;
pub mod error;
pub mod report;
