//! Critical path method (CPM) over dated tasks.
//!
//! A forward pass computes earliest finish per task, a backward pass from the
//! sinks computes latest finish, and their difference is the slack. Tasks with
//! zero slack form the critical path.

mod calculation;
mod types;

pub use calculation::{
    calculate_critical_path, calculate_task_schedule, try_calculate_critical_path,
    CriticalPathAnalyzer,
};
pub use types::{CriticalPathAnalysis, CriticalPathNode, TaskSchedule};
