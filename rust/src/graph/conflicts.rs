//! Temporal conflict detection for dependency edges.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use crate::config::{AnalysisConfig, DateCheckScope};
use crate::dates::add_days;
use crate::models::{Conflict, ConflictType, DependencyEdge, DependencyType, Severity, Task};
use crate::{log_detail, log_summary, log_trace};

use super::cycles::detect_circular_dependencies_logged;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Index tasks by id; the first occurrence of a duplicated id wins.
pub(crate) fn task_map(tasks: &[Task]) -> FxHashMap<&str, &Task> {
    let mut map = FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());
    for task in tasks {
        map.entry(task.id.as_str()).or_insert(task);
    }
    map
}

/// The (prerequisite, dependent) endpoints an edge type orders.
fn constrained_endpoints(
    dependency_type: DependencyType,
    prerequisite: &Task,
    dependent: &Task,
) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    match dependency_type {
        DependencyType::FinishToStart => (prerequisite.due_date, dependent.start_date),
        DependencyType::StartToStart => (prerequisite.start_date, dependent.start_date),
        DependencyType::FinishToFinish => (prerequisite.due_date, dependent.due_date),
        DependencyType::StartToFinish => (prerequisite.start_date, dependent.due_date),
    }
}

fn endpoint_verbs(dependency_type: DependencyType) -> (&'static str, &'static str) {
    match dependency_type {
        DependencyType::FinishToStart => ("finishes", "starts"),
        DependencyType::StartToStart => ("starts", "starts"),
        DependencyType::FinishToFinish => ("finishes", "finishes"),
        DependencyType::StartToFinish => ("starts", "finishes"),
    }
}

/// Earliest allowed date for the dependent's endpoint, if it is violated.
///
/// A lag that pushes the required date past the calendar clamps to its ends:
/// beyond the last date nothing can satisfy it, before the first date
/// everything does.
fn date_violation(
    edge: &DependencyEdge,
    prerequisite: &Task,
    dependent: &Task,
    scope: DateCheckScope,
) -> Option<NaiveDateTime> {
    if scope == DateCheckScope::FinishToStartOnly
        && edge.dependency_type != DependencyType::FinishToStart
    {
        return None;
    }
    let (required_after, actual) =
        constrained_endpoints(edge.dependency_type, prerequisite, dependent);
    let required = add_days(required_after?, edge.lag);
    (actual? < required).then_some(required)
}

fn missing_dates_conflict(edge: &DependencyEdge, prerequisite: &Task, dependent: &Task) -> Conflict {
    let undated: Vec<&Task> = [prerequisite, dependent]
        .into_iter()
        .filter(|t| t.has_no_dates())
        .collect();
    let names: Vec<String> = undated.iter().map(|t| format!("\"{}\"", t.title)).collect();

    Conflict {
        id: format!("{}-{}", ConflictType::MissingDates, edge.id),
        conflict_type: ConflictType::MissingDates,
        severity: Severity::Warning,
        affected_task_ids: vec![
            prerequisite.id.clone(),
            dependent.id.clone(),
        ],
        message: format!(
            "{} {} no start or due date; the dependency cannot be scheduled",
            names.join(" and "),
            if undated.len() == 1 { "has" } else { "have" }
        ),
        suggestion: Some("Add start and due dates to include the task in scheduling".to_string()),
    }
}

fn date_mismatch_conflict(
    edge: &DependencyEdge,
    prerequisite: &Task,
    dependent: &Task,
    required: NaiveDateTime,
) -> Conflict {
    let (prereq_verb, dependent_verb) = endpoint_verbs(edge.dependency_type);
    Conflict {
        id: format!("{}-{}", ConflictType::DateMismatch, edge.id),
        conflict_type: ConflictType::DateMismatch,
        severity: Severity::Warning,
        affected_task_ids: vec![prerequisite.id.clone(), dependent.id.clone()],
        message: format!(
            "\"{}\" {} before \"{}\" {} ({})",
            dependent.title, dependent_verb, prerequisite.title, prereq_verb, edge.dependency_type
        ),
        suggestion: Some(format!(
            "Move \"{}\" so it {} on or after {}",
            dependent.title,
            dependent_verb,
            required.format(DATE_FORMAT)
        )),
    }
}

fn overdue_blocker_conflict(
    edge: &DependencyEdge,
    prerequisite: &Task,
    dependent: &Task,
    due: NaiveDateTime,
) -> Conflict {
    Conflict {
        id: format!("{}-{}", ConflictType::OverdueBlocker, edge.id),
        conflict_type: ConflictType::OverdueBlocker,
        severity: Severity::Error,
        affected_task_ids: vec![prerequisite.id.clone(), dependent.id.clone()],
        message: format!(
            "\"{}\" was due {} and is blocking \"{}\"",
            prerequisite.title,
            due.format(DATE_FORMAT),
            dependent.title
        ),
        suggestion: Some(format!(
            "Complete or reschedule \"{}\" to unblock \"{}\"",
            prerequisite.title, dependent.title
        )),
    }
}

/// Per-edge checks for missing dates, date-order violations and overdue blockers.
///
/// Edges referring to unknown task ids are skipped. One edge can produce
/// several conflicts.
pub fn detect_date_mismatches(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
) -> Vec<Conflict> {
    detect_date_mismatches_with_config(tasks, dependencies, current_time, &AnalysisConfig::default())
}

pub(crate) fn detect_date_mismatches_with_config(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
    config: &AnalysisConfig,
) -> Vec<Conflict> {
    let by_id = task_map(tasks);
    let mut conflicts = Vec::new();

    for edge in dependencies {
        let (Some(&dependent), Some(&prerequisite)) = (
            by_id.get(edge.dependent_task_id.as_str()),
            by_id.get(edge.depends_on_task_id.as_str()),
        ) else {
            log_trace!(config.verbosity, "skipping edge {} with unknown task", edge.id);
            continue;
        };

        if prerequisite.has_no_dates() || dependent.has_no_dates() {
            conflicts.push(missing_dates_conflict(edge, prerequisite, dependent));
        }

        if let Some(required) = date_violation(edge, prerequisite, dependent, config.date_check_scope)
        {
            conflicts.push(date_mismatch_conflict(edge, prerequisite, dependent, required));
        }

        if let Some(due) = prerequisite.due_date {
            if !prerequisite.completed && due < current_time {
                conflicts.push(overdue_blocker_conflict(edge, prerequisite, dependent, due));
            }
        }
    }

    for conflict in &conflicts {
        log_detail!(config.verbosity, "{}: {}", conflict.conflict_type, conflict.message);
    }
    conflicts
}

/// Circular conflicts followed by per-edge date conflicts, without de-duplication.
pub fn get_all_dependency_conflicts(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
) -> Vec<Conflict> {
    get_all_dependency_conflicts_with_config(
        tasks,
        dependencies,
        current_time,
        &AnalysisConfig::default(),
    )
}

pub(crate) fn get_all_dependency_conflicts_with_config(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
    config: &AnalysisConfig,
) -> Vec<Conflict> {
    let mut conflicts = detect_circular_dependencies_logged(tasks, dependencies, config.verbosity);
    conflicts.extend(detect_date_mismatches_with_config(
        tasks,
        dependencies,
        current_time,
        config,
    ));
    log_summary!(
        config.verbosity,
        "{} conflicts across {} tasks and {} dependencies",
        conflicts.len(),
        tasks.len(),
        dependencies.len()
    );
    conflicts
}
