//! Task dependency analysis and critical path scheduling.
//!
//! Validates dependency graphs over task snapshots (cycles, date-order
//! conflicts, overdue blockers) and runs the critical path method to find
//! slack per task. Every entry point is a pure function of its inputs.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

pub mod config;
pub mod critical_path;
pub mod dates;
mod error;
pub mod graph;
pub mod logging;
mod models;
#[cfg(feature = "python")]
mod python;

pub use config::{AnalysisConfig, DateCheckScope, LatestFinishPolicy};
pub use critical_path::{
    calculate_critical_path, calculate_task_schedule, try_calculate_critical_path,
    CriticalPathAnalysis, CriticalPathAnalyzer, CriticalPathNode, TaskSchedule,
};
pub use error::ScheduleError;
pub use graph::{
    detect_circular_dependencies, detect_date_mismatches, find_cycle_path,
    get_all_dependency_conflicts, get_blocked_tasks, get_blocking_tasks, get_ready_tasks,
    summarize_conflicts, topological_order, validate_dependency, would_create_cycle,
    DependencyGraph,
};
pub use models::{
    Conflict, ConflictSummary, ConflictType, DependencyEdge, DependencyType,
    DependencyValidation, Severity, Task,
};
