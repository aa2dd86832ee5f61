//! Error types for dependency analysis.
//!
//! Scheduling problems in the task data are reported as `Conflict` records;
//! these errors cover strict entry points and string parsing only.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Circular dependency detected among tasks: {0:?}")]
    CircularDependency(Vec<String>),
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
    #[error("Unknown dependency type: {0}")]
    UnknownDependencyType(String),
    #[error("Unknown conflict type: {0}")]
    UnknownConflictType(String),
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),
}
