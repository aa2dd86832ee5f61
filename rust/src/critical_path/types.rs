//! Result types for critical path analysis.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-task CPM result. Day values are offsets from project start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathNode {
    pub task_id: String,
    pub task_title: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// Ceiling of the start -> end span in days.
    pub duration: i64,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_finish: i64,
    /// latest_finish - earliest_finish.
    pub slack: i64,
    pub is_critical: bool,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
}

impl CriticalPathNode {
    pub fn latest_start(&self) -> i64 {
        self.latest_finish - self.duration
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathAnalysis {
    /// Critical nodes sorted by start date.
    pub critical_path: Vec<CriticalPathNode>,
    /// Every analyzed node in input order.
    pub nodes: Vec<CriticalPathNode>,
    pub total_duration: i64,
    pub project_start_date: NaiveDateTime,
    pub project_end_date: NaiveDateTime,
    pub critical_tasks: Vec<String>,
    pub generated_at: NaiveDateTime,
}

impl CriticalPathAnalysis {
    pub fn node(&self, task_id: &str) -> Option<&CriticalPathNode> {
        self.nodes.iter().find(|n| n.task_id == task_id)
    }
}

/// Calendar view of one task's float.
///
/// Free and total slack are the same number here; the model does not
/// distinguish them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    pub task_id: String,
    pub earliest_start: NaiveDateTime,
    pub earliest_finish: NaiveDateTime,
    pub latest_start: NaiveDateTime,
    pub latest_finish: NaiveDateTime,
    pub total_slack: i64,
    pub free_slack: i64,
    pub is_critical: bool,
}
