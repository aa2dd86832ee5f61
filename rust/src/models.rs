//! Core data types for dependency analysis.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// A task snapshot as seen by the scheduler.
///
/// Tasks are owned by the surrounding task store; the scheduler only reads them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_date: None,
            due_date: None,
            completed: false,
        }
    }

    /// True when the task has neither a start nor a due date.
    pub fn has_no_dates(&self) -> bool {
        self.start_date.is_none() && self.due_date.is_none()
    }

    /// Start and due date, if both are set.
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.start_date, self.due_date) {
            (Some(start), Some(due)) => Some((start, due)),
            _ => None,
        }
    }
}

/// Which endpoints of the two tasks a dependency constrains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinishToStart => "finish-to-start",
            Self::StartToStart => "start-to-start",
            Self::FinishToFinish => "finish-to-finish",
            Self::StartToFinish => "start-to-finish",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finish-to-start" => Ok(Self::FinishToStart),
            "start-to-start" => Ok(Self::StartToStart),
            "finish-to-finish" => Ok(Self::FinishToFinish),
            "start-to-finish" => Ok(Self::StartToFinish),
            other => Err(ScheduleError::UnknownDependencyType(other.to_string())),
        }
    }
}

/// A directed dependency: `dependent_task_id` waits on `depends_on_task_id`.
///
/// Edges are replaced rather than edited in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub id: String,
    pub dependent_task_id: String,
    pub depends_on_task_id: String,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    /// Lag in days. Negative values allow overlap.
    #[serde(default)]
    pub lag: i64,
}

impl DependencyEdge {
    pub fn new(
        id: impl Into<String>,
        dependent_task_id: impl Into<String>,
        depends_on_task_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            dependent_task_id: dependent_task_id.into(),
            depends_on_task_id: depends_on_task_id.into(),
            dependency_type: DependencyType::FinishToStart,
            lag: 0,
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn with_lag(mut self, lag: i64) -> Self {
        self.lag = lag;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    Circular,
    MissingDates,
    DateMismatch,
    OverdueBlocker,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::MissingDates => "missing-dates",
            Self::DateMismatch => "date-mismatch",
            Self::OverdueBlocker => "overdue-blocker",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "circular" => Ok(Self::Circular),
            "missing-dates" => Ok(Self::MissingDates),
            "date-mismatch" => Ok(Self::DateMismatch),
            "overdue-blocker" => Ok(Self::OverdueBlocker),
            other => Err(ScheduleError::UnknownConflictType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(ScheduleError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A derived scheduling problem. Recomputed on every query, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub affected_task_ids: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Outcome of checking a proposed edge before it is committed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyValidation {
    pub is_valid: bool,
    pub error_message: Option<String>,
    pub would_create_cycle: bool,
    pub cycle_path: Option<Vec<String>>,
}

/// Conflict counts by severity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    /// Any error-severity conflict present.
    pub has_blocking: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_dependency_type_round_trip_strings() {
        for t in [
            DependencyType::FinishToStart,
            DependencyType::StartToStart,
            DependencyType::FinishToFinish,
            DependencyType::StartToFinish,
        ] {
            assert_eq!(t.as_str().parse::<DependencyType>().unwrap(), t);
        }
        assert!(matches!(
            "finish_to_start".parse::<DependencyType>(),
            Err(ScheduleError::UnknownDependencyType(_))
        ));
    }

    #[test]
    fn test_task_date_helpers() {
        let mut task = Task::new("a", "Write report");
        assert!(task.has_no_dates());
        assert!(task.date_range().is_none());

        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        task.start_date = Some(start);
        assert!(!task.has_no_dates());
        assert!(task.date_range().is_none());

        task.due_date = Some(start);
        assert_eq!(task.date_range(), Some((start, start)));
    }

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "tasks": [
                {"id": "t1", "title": "Design", "startDate": "2025-03-01T09:00:00",
                 "dueDate": "2025-03-04T17:00:00", "completed": true},
                {"id": "t2", "title": "Build"}
            ],
            "dependencies": [
                {"id": "d1", "dependentTaskId": "t2", "dependsOnTaskId": "t1",
                 "type": "start-to-start", "lag": -1},
                {"id": "d2", "dependentTaskId": "t3", "dependsOnTaskId": "t2"}
            ]
        }"#;

        #[derive(Deserialize)]
        struct Snapshot {
            tasks: Vec<Task>,
            dependencies: Vec<DependencyEdge>,
        }

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.tasks.len(), 2);
        assert!(snapshot.tasks[0].completed);
        assert!(snapshot.tasks[1].has_no_dates());
        assert!(!snapshot.tasks[1].completed);

        let d1 = &snapshot.dependencies[0];
        assert_eq!(d1.dependency_type, DependencyType::StartToStart);
        assert_eq!(d1.lag, -1);
        let d2 = &snapshot.dependencies[1];
        assert_eq!(d2.dependency_type, DependencyType::FinishToStart);
        assert_eq!(d2.lag, 0);
    }

    #[test]
    fn test_conflict_serializes_kebab_case() {
        let conflict = Conflict {
            id: "missing-dates-d1".to_string(),
            conflict_type: ConflictType::MissingDates,
            severity: Severity::Warning,
            affected_task_ids: vec!["a".to_string(), "b".to_string()],
            message: "Task has no dates".to_string(),
            suggestion: None,
        };
        let value = serde_json::to_value(&conflict).unwrap();
        assert_eq!(value["type"], "missing-dates");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["affectedTaskIds"][1], "b");
        assert!(value.get("suggestion").is_none());
    }
}
