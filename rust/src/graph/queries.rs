//! Read-only queries over a dependency snapshot.

use crate::error::ScheduleError;
use crate::models::{Conflict, ConflictSummary, DependencyEdge, DependencyValidation, Severity, Task};

use super::adjacency::{Adjacency, NodeId};
use super::conflicts::task_map;
use super::cycles::find_cycle_path;

/// Ids of the tasks `task_id` waits on, in edge order.
pub fn get_blocking_tasks(task_id: &str, dependencies: &[DependencyEdge]) -> Vec<String> {
    dependencies
        .iter()
        .filter(|d| d.dependent_task_id == task_id)
        .map(|d| d.depends_on_task_id.clone())
        .collect()
}

/// Ids of the tasks waiting on `task_id`, in edge order.
pub fn get_blocked_tasks(task_id: &str, dependencies: &[DependencyEdge]) -> Vec<String> {
    dependencies
        .iter()
        .filter(|d| d.depends_on_task_id == task_id)
        .map(|d| d.dependent_task_id.clone())
        .collect()
}

/// Incomplete tasks whose known blockers are all completed.
pub fn get_ready_tasks(tasks: &[Task], dependencies: &[DependencyEdge]) -> Vec<String> {
    let by_id = task_map(tasks);
    tasks
        .iter()
        .filter(|task| !task.completed)
        .filter(|task| {
            dependencies
                .iter()
                .filter(|d| d.dependent_task_id == task.id)
                .filter_map(|d| by_id.get(d.depends_on_task_id.as_str()))
                .all(|blocker| blocker.completed)
        })
        .map(|task| task.id.clone())
        .collect()
}

/// All task ids with prerequisites first.
///
/// Edges to ids outside `tasks` are ignored. Ready tasks are emitted in input order.
pub fn topological_order(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
) -> Result<Vec<String>, ScheduleError> {
    let adj = Adjacency::restricted(tasks.iter().map(|t| t.id.as_str()), dependencies);
    let to_names = |nodes: Vec<NodeId>| -> Vec<String> {
        nodes.into_iter().map(|n| adj.name(n).to_string()).collect()
    };
    adj.topological_sort()
        .map(to_names)
        .map_err(|stuck| ScheduleError::CircularDependency(to_names(stuck)))
}

/// Check a proposed edge before committing it.
///
/// Rejects self-dependencies, ids missing from `tasks`, duplicates of an
/// existing edge and edges that would close a cycle.
pub fn validate_dependency(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    tasks: &[Task],
    existing: &[DependencyEdge],
) -> DependencyValidation {
    let invalid = |message: String| DependencyValidation {
        is_valid: false,
        error_message: Some(message),
        ..Default::default()
    };

    if dependent_task_id == depends_on_task_id {
        return DependencyValidation {
            would_create_cycle: true,
            cycle_path: Some(vec![dependent_task_id.to_string()]),
            ..invalid("A task cannot depend on itself".to_string())
        };
    }

    let by_id = task_map(tasks);
    for id in [dependent_task_id, depends_on_task_id] {
        if !by_id.contains_key(id) {
            return invalid(format!("Task not found: {id}"));
        }
    }

    if existing.iter().any(|d| {
        d.dependent_task_id == dependent_task_id && d.depends_on_task_id == depends_on_task_id
    }) {
        return invalid("Dependency already exists".to_string());
    }

    match find_cycle_path(dependent_task_id, depends_on_task_id, existing) {
        Some(path) => DependencyValidation {
            would_create_cycle: true,
            cycle_path: Some(path),
            ..invalid("Adding this dependency would create a circular dependency".to_string())
        },
        None => DependencyValidation {
            is_valid: true,
            ..Default::default()
        },
    }
}

/// Count conflicts by severity.
pub fn summarize_conflicts(conflicts: &[Conflict]) -> ConflictSummary {
    let mut summary = ConflictSummary::default();
    for conflict in conflicts {
        match conflict.severity {
            Severity::Error => summary.errors += 1,
            Severity::Warning => summary.warnings += 1,
            Severity::Info => summary.infos += 1,
        }
    }
    summary.has_blocking = summary.errors > 0;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConflictType;
    use proptest::prelude::*;

    fn edge(dependent: &str, depends_on: &str) -> DependencyEdge {
        DependencyEdge::new(format!("{depends_on}->{dependent}"), dependent, depends_on)
    }

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter().map(|id| Task::new(*id, *id)).collect()
    }

    #[test]
    fn test_blocking_and_blocked() {
        // c waits on a and b; d waits on c
        let edges = vec![edge("c", "a"), edge("c", "b"), edge("d", "c")];

        assert_eq!(get_blocking_tasks("c", &edges), vec!["a", "b"]);
        assert_eq!(get_blocked_tasks("c", &edges), vec!["d"]);
        assert!(get_blocking_tasks("a", &edges).is_empty());
        assert!(get_blocked_tasks("d", &edges).is_empty());
    }

    #[test]
    fn test_ready_tasks() {
        let mut all = tasks(&["a", "b", "c", "d"]);
        all[0].completed = true;
        // b waits on a (done), c waits on b (open), d waits on an unknown task
        let edges = vec![edge("b", "a"), edge("c", "b"), edge("d", "ghost")];

        assert_eq!(get_ready_tasks(&all, &edges), vec!["b", "d"]);
    }

    #[test]
    fn test_topological_order() {
        let all = tasks(&["c", "b", "a"]);
        let edges = vec![edge("b", "a"), edge("c", "b")];
        assert_eq!(topological_order(&all, &edges).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_topological_order_cycle() {
        let all = tasks(&["a", "b", "c"]);
        let edges = vec![edge("b", "a"), edge("a", "b")];
        assert_eq!(
            topological_order(&all, &edges),
            Err(ScheduleError::CircularDependency(vec![
                "a".to_string(),
                "b".to_string()
            ]))
        );
    }

    #[test]
    fn test_validate_dependency() {
        let all = tasks(&["a", "b", "c"]);
        let edges = vec![edge("b", "a"), edge("c", "b")];

        let ok = validate_dependency("c", "a", &all, &edges);
        assert!(ok.is_valid);
        assert!(ok.error_message.is_none());

        let cyclic = validate_dependency("a", "c", &all, &edges);
        assert!(!cyclic.is_valid);
        assert!(cyclic.would_create_cycle);
        assert_eq!(cyclic.cycle_path.unwrap(), vec!["c", "a", "b"]);

        let own = validate_dependency("a", "a", &all, &edges);
        assert!(!own.is_valid);
        assert!(own.would_create_cycle);

        let duplicate = validate_dependency("b", "a", &all, &edges);
        assert_eq!(
            duplicate.error_message.as_deref(),
            Some("Dependency already exists")
        );

        let unknown = validate_dependency("a", "zzz", &all, &edges);
        assert_eq!(unknown.error_message.as_deref(), Some("Task not found: zzz"));
        assert!(!unknown.would_create_cycle);
    }

    #[test]
    fn test_summarize_conflicts() {
        let make = |severity| Conflict {
            id: String::new(),
            conflict_type: ConflictType::DateMismatch,
            severity,
            affected_task_ids: vec![],
            message: String::new(),
            suggestion: None,
        };
        let summary = summarize_conflicts(&[
            make(Severity::Warning),
            make(Severity::Error),
            make(Severity::Warning),
        ]);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.infos, 0);
        assert!(summary.has_blocking);

        assert!(!summarize_conflicts(&[]).has_blocking);
    }

    proptest! {
        #[test]
        fn prop_blocking_blocked_symmetry(
            pairs in prop::collection::vec((0u8..8, 0u8..8), 0..20),
        ) {
            let edges: Vec<DependencyEdge> = pairs
                .iter()
                .map(|(x, y)| edge(&format!("t{x}"), &format!("t{y}")))
                .collect();
            for e in &edges {
                prop_assert!(get_blocking_tasks(&e.dependent_task_id, &edges)
                    .contains(&e.depends_on_task_id));
                prop_assert!(get_blocked_tasks(&e.depends_on_task_id, &edges)
                    .contains(&e.dependent_task_id));
            }
        }
    }
}
