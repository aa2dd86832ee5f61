//! Dependency graph validation and queries.
//!
//! Every entry point is a pure function of a task and edge snapshot.
//! `DependencyGraph` bundles a snapshot with an `AnalysisConfig` for callers
//! that run several queries against the same data.

mod adjacency;
mod conflicts;
mod cycles;
mod queries;

use chrono::NaiveDateTime;

use crate::config::AnalysisConfig;
use crate::error::ScheduleError;
use crate::models::{Conflict, DependencyEdge, DependencyValidation, Task};

pub(crate) use adjacency::{Adjacency, NodeId};
pub use conflicts::{detect_date_mismatches, get_all_dependency_conflicts};
pub use cycles::{detect_circular_dependencies, find_cycle_path, would_create_cycle};
pub use queries::{
    get_blocked_tasks, get_blocking_tasks, get_ready_tasks, summarize_conflicts,
    topological_order, validate_dependency,
};

/// Borrowed view of a task/edge snapshot.
#[derive(Clone, Debug)]
pub struct DependencyGraph<'a> {
    tasks: &'a [Task],
    dependencies: &'a [DependencyEdge],
    config: AnalysisConfig,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tasks: &'a [Task], dependencies: &'a [DependencyEdge]) -> Self {
        Self::with_config(tasks, dependencies, AnalysisConfig::default())
    }

    pub fn with_config(
        tasks: &'a [Task],
        dependencies: &'a [DependencyEdge],
        config: AnalysisConfig,
    ) -> Self {
        Self {
            tasks,
            dependencies,
            config,
        }
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn dependencies(&self) -> &'a [DependencyEdge] {
        self.dependencies
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn circular_dependencies(&self) -> Vec<Conflict> {
        cycles::detect_circular_dependencies_logged(
            self.tasks,
            self.dependencies,
            self.config.verbosity,
        )
    }

    pub fn date_mismatches(&self, current_time: NaiveDateTime) -> Vec<Conflict> {
        conflicts::detect_date_mismatches_with_config(
            self.tasks,
            self.dependencies,
            current_time,
            &self.config,
        )
    }

    pub fn all_conflicts(&self, current_time: NaiveDateTime) -> Vec<Conflict> {
        conflicts::get_all_dependency_conflicts_with_config(
            self.tasks,
            self.dependencies,
            current_time,
            &self.config,
        )
    }

    pub fn has_cycles(&self) -> bool {
        let adj = Adjacency::from_snapshot(self.tasks, self.dependencies);
        !cycles::find_cycles(&adj, adj.nodes(), true).is_empty()
    }

    pub fn would_create_cycle(&self, dependent_task_id: &str, depends_on_task_id: &str) -> bool {
        would_create_cycle(dependent_task_id, depends_on_task_id, self.dependencies)
    }

    pub fn validate_dependency(
        &self,
        dependent_task_id: &str,
        depends_on_task_id: &str,
    ) -> DependencyValidation {
        validate_dependency(
            dependent_task_id,
            depends_on_task_id,
            self.tasks,
            self.dependencies,
        )
    }

    pub fn blocking_tasks(&self, task_id: &str) -> Vec<String> {
        get_blocking_tasks(task_id, self.dependencies)
    }

    pub fn blocked_tasks(&self, task_id: &str) -> Vec<String> {
        get_blocked_tasks(task_id, self.dependencies)
    }

    pub fn ready_tasks(&self) -> Vec<String> {
        get_ready_tasks(self.tasks, self.dependencies)
    }

    pub fn topological_order(&self) -> Result<Vec<String>, ScheduleError> {
        topological_order(self.tasks, self.dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConflictType;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn dated(id: &str, start: u32, due: u32) -> Task {
        Task {
            start_date: Some(day(start)),
            due_date: Some(day(due)),
            ..Task::new(id, id)
        }
    }

    #[test]
    fn test_graph_view() {
        let tasks = vec![dated("a", 1, 3), dated("b", 2, 6), Task::new("c", "c")];
        let edges = vec![
            DependencyEdge::new("d1", "b", "a"),
            DependencyEdge::new("d2", "c", "b"),
        ];
        let graph = DependencyGraph::new(&tasks, &edges);

        assert!(!graph.has_cycles());
        assert!(graph.circular_dependencies().is_empty());
        assert_eq!(graph.blocking_tasks("b"), vec!["a"]);
        assert_eq!(graph.blocked_tasks("b"), vec!["c"]);
        assert_eq!(graph.ready_tasks(), vec!["a"]);
        assert_eq!(graph.topological_order().unwrap(), vec!["a", "b", "c"]);
        assert!(graph.would_create_cycle("a", "c"));
        assert!(!graph.validate_dependency("a", "c").is_valid);

        let kinds: Vec<ConflictType> = graph
            .all_conflicts(day(1))
            .iter()
            .map(|c| c.conflict_type)
            .collect();
        assert_eq!(
            kinds,
            vec![ConflictType::DateMismatch, ConflictType::MissingDates]
        );
    }

    #[test]
    fn test_has_cycles() {
        let tasks = vec![Task::new("a", "a"), Task::new("b", "b")];
        let edges = vec![
            DependencyEdge::new("d1", "b", "a"),
            DependencyEdge::new("d2", "a", "b"),
        ];
        assert!(DependencyGraph::new(&tasks, &edges).has_cycles());
    }
}
