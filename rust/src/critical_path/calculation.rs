//! Critical path calculation using forward and backward passes.
//!
//! Only tasks with both a start and a due date take part; everything else is
//! silently left out. Day values are offsets from an implicit project start
//! at 0 and every edge chains as finish-to-start plus its lag.

use chrono::NaiveDateTime;

use crate::config::{AnalysisConfig, LatestFinishPolicy};
use crate::dates::{add_days, ceil_days_between};
use crate::error::ScheduleError;
use crate::graph::{Adjacency, NodeId};
use crate::models::{DependencyEdge, Task};
use crate::{log_detail, log_summary, log_trace};

use super::types::{CriticalPathAnalysis, CriticalPathNode, TaskSchedule};

/// A task that can anchor a duration.
struct DatedTask<'a> {
    task: &'a Task,
    start: NaiveDateTime,
    due: NaiveDateTime,
}

/// Tasks with both dates. Only the first occurrence of an id counts, so an
/// undated first copy keeps a later dated one out.
fn dated_tasks(tasks: &[Task]) -> Vec<DatedTask<'_>> {
    let mut seen = rustc_hash::FxHashSet::default();
    tasks
        .iter()
        .filter(|task| seen.insert(task.id.as_str()))
        .filter_map(|task| {
            let (start, due) = task.date_range()?;
            Some(DatedTask { task, start, due })
        })
        .collect()
}

/// Earliest start and finish for every node, in topological order.
///
/// Offsets saturate at the `i64` range so extreme lags cannot overflow.
fn forward_pass(
    adj: &Adjacency,
    durations: &[i64],
    topo_order: &[NodeId],
    verbosity: u8,
) -> (Vec<i64>, Vec<i64>) {
    let n = adj.len();
    let mut earliest_start = vec![0i64; n];
    let mut earliest_finish = vec![0i64; n];

    for &node in topo_order {
        let idx = node as usize;
        let start = adj
            .prerequisites(node)
            .iter()
            .map(|&(pred, lag)| earliest_finish[pred as usize].saturating_add(lag))
            .max()
            .unwrap_or(0)
            .max(0);

        earliest_start[idx] = start;
        earliest_finish[idx] = start.saturating_add(durations[idx]);
        log_trace!(
            verbosity,
            "forward {}: ES={} EF={}",
            adj.name(node),
            start,
            earliest_finish[idx]
        );
    }

    (earliest_start, earliest_finish)
}

fn is_sink(adj: &Adjacency, node: NodeId) -> bool {
    adj.dependents(node).is_empty()
}

/// Latest finish as the minimum over all successor-derived candidates.
///
/// Sinks keep their own earliest finish.
fn backward_pass_minimum(
    adj: &Adjacency,
    durations: &[i64],
    earliest_finish: &[i64],
    topo_order: &[NodeId],
) -> Vec<i64> {
    let mut latest_finish = earliest_finish.to_vec();

    for &node in topo_order.iter().rev() {
        if is_sink(adj, node) {
            continue;
        }
        latest_finish[node as usize] = adj
            .dependents(node)
            .iter()
            .map(|&(succ, lag)| {
                latest_finish[succ as usize]
                    .saturating_sub(durations[succ as usize])
                    .saturating_sub(lag)
            })
            .min()
            .unwrap_or(earliest_finish[node as usize]);
    }

    latest_finish
}

/// Latest finish by depth-first walk from each sink in input order; a node
/// keeps the first value it is given, even if another path is tighter.
fn backward_pass_first_visit(
    adj: &Adjacency,
    durations: &[i64],
    earliest_finish: &[i64],
) -> Vec<i64> {
    let mut latest_finish: Vec<Option<i64>> = vec![None; adj.len()];
    let mut stack: Vec<(NodeId, i64)> = Vec::new();

    for sink in adj.nodes().filter(|&n| is_sink(adj, n)) {
        stack.push((sink, earliest_finish[sink as usize]));

        while let Some((node, lf)) = stack.pop() {
            if latest_finish[node as usize].is_some() {
                continue;
            }
            latest_finish[node as usize] = Some(lf);

            let pred_lf = lf.saturating_sub(durations[node as usize]);
            // Reversed so the first prerequisite is walked first
            for &(pred, lag) in adj.prerequisites(node).iter().rev() {
                if latest_finish[pred as usize].is_none() {
                    stack.push((pred, pred_lf.saturating_sub(lag)));
                }
            }
        }
    }

    latest_finish
        .into_iter()
        .zip(earliest_finish)
        .map(|(lf, &ef)| lf.unwrap_or(ef))
        .collect()
}

fn unique_names(adj: &Adjacency, links: &[(NodeId, i64)]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(links.len());
    for &(node, _) in links {
        let name = adj.name(node);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn project_bounds(
    dated: &[DatedTask<'_>],
    current_time: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let start = dated.iter().map(|d| d.start).min().unwrap_or(current_time);
    let end = dated.iter().map(|d| d.due).max().unwrap_or(current_time);
    (start, end)
}

/// Full CPM analysis; fails if the dated tasks contain a dependency cycle.
pub(crate) fn try_analyze(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
    config: &AnalysisConfig,
) -> Result<CriticalPathAnalysis, ScheduleError> {
    let verbosity = config.verbosity;
    let dated = dated_tasks(tasks);
    let adj = Adjacency::restricted(dated.iter().map(|d| d.task.id.as_str()), dependencies);

    let durations: Vec<i64> = dated
        .iter()
        .map(|d| ceil_days_between(d.start, d.due))
        .collect();

    let topo_order = adj.topological_sort().map_err(|stuck| {
        ScheduleError::CircularDependency(stuck.iter().map(|&n| adj.name(n).to_string()).collect())
    })?;

    let (earliest_start, earliest_finish) =
        forward_pass(&adj, &durations, &topo_order, verbosity);
    let total_duration = earliest_finish.iter().copied().max().unwrap_or(0);

    let latest_finish = match config.latest_finish_policy {
        LatestFinishPolicy::Minimum => {
            backward_pass_minimum(&adj, &durations, &earliest_finish, &topo_order)
        }
        LatestFinishPolicy::FirstVisit => {
            backward_pass_first_visit(&adj, &durations, &earliest_finish)
        }
    };

    let nodes: Vec<CriticalPathNode> = dated
        .iter()
        .enumerate()
        .map(|(idx, d)| {
            let node = idx as NodeId;
            let slack = latest_finish[idx].saturating_sub(earliest_finish[idx]);
            log_trace!(
                verbosity,
                "backward {}: LF={} slack={}",
                d.task.id,
                latest_finish[idx],
                slack
            );
            CriticalPathNode {
                task_id: d.task.id.clone(),
                task_title: d.task.title.clone(),
                start_date: d.start,
                end_date: d.due,
                duration: durations[idx],
                earliest_start: earliest_start[idx],
                earliest_finish: earliest_finish[idx],
                latest_finish: latest_finish[idx],
                slack,
                is_critical: slack == 0,
                predecessors: unique_names(&adj, adj.prerequisites(node)),
                successors: unique_names(&adj, adj.dependents(node)),
            }
        })
        .collect();

    let mut critical_path: Vec<CriticalPathNode> =
        nodes.iter().filter(|n| n.is_critical).cloned().collect();
    critical_path.sort_by_key(|n| n.start_date);
    let critical_tasks: Vec<String> = critical_path.iter().map(|n| n.task_id.clone()).collect();

    for node in &critical_path {
        log_detail!(verbosity, "critical: {} ({} days)", node.task_id, node.duration);
    }
    log_summary!(
        verbosity,
        "critical path: {} of {} dated tasks, total duration {} days",
        critical_tasks.len(),
        nodes.len(),
        total_duration
    );

    let (project_start_date, project_end_date) = project_bounds(&dated, current_time);
    Ok(CriticalPathAnalysis {
        critical_path,
        nodes,
        total_duration,
        project_start_date,
        project_end_date,
        critical_tasks,
        generated_at: current_time,
    })
}

/// CPM analysis that never fails.
///
/// Callers are expected to check for cycles first. If the dated tasks are
/// cyclic anyway, the result has no nodes, an empty critical path and zero
/// duration.
pub(crate) fn analyze(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
    config: &AnalysisConfig,
) -> CriticalPathAnalysis {
    match try_analyze(tasks, dependencies, current_time, config) {
        Ok(analysis) => analysis,
        Err(err) => {
            log_summary!(config.verbosity, "{}; returning empty analysis", err);
            let (project_start_date, project_end_date) =
                project_bounds(&dated_tasks(tasks), current_time);
            CriticalPathAnalysis {
                critical_path: Vec::new(),
                nodes: Vec::new(),
                total_duration: 0,
                project_start_date,
                project_end_date,
                critical_tasks: Vec::new(),
                generated_at: current_time,
            }
        }
    }
}

/// Calendar dates for one task's float, or `None` if it was not analyzed.
pub(crate) fn task_schedule(analysis: &CriticalPathAnalysis, task_id: &str) -> Option<TaskSchedule> {
    let node = analysis.node(task_id)?;
    Some(TaskSchedule {
        task_id: node.task_id.clone(),
        earliest_start: node.start_date,
        earliest_finish: node.end_date,
        latest_start: add_days(node.start_date, node.slack),
        latest_finish: add_days(node.end_date, node.slack),
        total_slack: node.slack,
        free_slack: node.slack,
        is_critical: node.is_critical,
    })
}

/// Runs CPM over task snapshots with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct CriticalPathAnalyzer {
    config: AnalysisConfig,
}

impl CriticalPathAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// See [`calculate_critical_path`].
    pub fn analyze(
        &self,
        tasks: &[Task],
        dependencies: &[DependencyEdge],
        current_time: NaiveDateTime,
    ) -> CriticalPathAnalysis {
        analyze(tasks, dependencies, current_time, &self.config)
    }

    /// See [`try_calculate_critical_path`].
    pub fn try_analyze(
        &self,
        tasks: &[Task],
        dependencies: &[DependencyEdge],
        current_time: NaiveDateTime,
    ) -> Result<CriticalPathAnalysis, ScheduleError> {
        try_analyze(tasks, dependencies, current_time, &self.config)
    }

    /// See [`calculate_task_schedule`].
    pub fn task_schedule(
        &self,
        task_id: &str,
        tasks: &[Task],
        dependencies: &[DependencyEdge],
        current_time: NaiveDateTime,
    ) -> Option<TaskSchedule> {
        let analysis = self.analyze(tasks, dependencies, current_time);
        let schedule = task_schedule(&analysis, task_id);
        if schedule.is_none() {
            log_detail!(self.config.verbosity, "no schedule for {}: not analyzed", task_id);
        }
        schedule
    }
}

/// Critical path over the tasks that have both dates.
///
/// The dependency graph must be acyclic; run
/// [`detect_circular_dependencies`](crate::graph::detect_circular_dependencies)
/// first. A cyclic input yields an analysis with no nodes and zero duration.
pub fn calculate_critical_path(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
) -> CriticalPathAnalysis {
    CriticalPathAnalyzer::default().analyze(tasks, dependencies, current_time)
}

/// Like [`calculate_critical_path`] but reports a cycle as an error.
pub fn try_calculate_critical_path(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
) -> Result<CriticalPathAnalysis, ScheduleError> {
    CriticalPathAnalyzer::default().try_analyze(tasks, dependencies, current_time)
}

/// Earliest and latest calendar dates for `task_id`.
///
/// `None` if the task lacks a start or due date, or is not in `tasks`.
pub fn calculate_task_schedule(
    task_id: &str,
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    current_time: NaiveDateTime,
) -> Option<TaskSchedule> {
    CriticalPathAnalyzer::default().task_schedule(task_id, tasks, dependencies, current_time)
}
