//! PyO3 bindings.
//!
//! Python sees plain classes with string enums. Every function that needs the
//! current time takes an optional `current_time` and falls back to UTC now.

use chrono::{NaiveDateTime, Utc};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::AnalysisConfig;
use crate::critical_path::{
    CriticalPathAnalysis, CriticalPathAnalyzer, CriticalPathNode, TaskSchedule,
};
use crate::error::ScheduleError;
use crate::graph::{self, DependencyGraph};
use crate::models::{
    Conflict, ConflictSummary, DependencyEdge, DependencyValidation, Task,
};

fn value_error(err: ScheduleError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn now_or(current_time: Option<NaiveDateTime>) -> NaiveDateTime {
    current_time.unwrap_or_else(|| Utc::now().naive_utc())
}

/// Task snapshot (PyO3 wrapper).
#[pyclass(name = "Task")]
#[derive(Clone, Debug)]
pub struct PyTask {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub title: String,
    #[pyo3(get, set)]
    pub start_date: Option<NaiveDateTime>,
    #[pyo3(get, set)]
    pub due_date: Option<NaiveDateTime>,
    #[pyo3(get, set)]
    pub completed: bool,
}

#[pymethods]
impl PyTask {
    #[new]
    #[pyo3(signature = (id, title, start_date=None, due_date=None, completed=false))]
    fn new(
        id: String,
        title: String,
        start_date: Option<NaiveDateTime>,
        due_date: Option<NaiveDateTime>,
        completed: bool,
    ) -> Self {
        Self {
            id,
            title,
            start_date,
            due_date,
            completed,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, start={:?}, due={:?}, completed={})",
            self.id, self.start_date, self.due_date, self.completed
        )
    }
}

impl From<PyTask> for Task {
    fn from(task: PyTask) -> Self {
        Task {
            id: task.id,
            title: task.title,
            start_date: task.start_date,
            due_date: task.due_date,
            completed: task.completed,
        }
    }
}

/// Dependency edge (PyO3 wrapper). `dependency_type` is the kebab-case name.
#[pyclass(name = "DependencyEdge")]
#[derive(Clone, Debug)]
pub struct PyDependencyEdge {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub dependent_task_id: String,
    #[pyo3(get, set)]
    pub depends_on_task_id: String,
    #[pyo3(get, set)]
    pub dependency_type: String,
    #[pyo3(get, set)]
    pub lag: i64,
}

#[pymethods]
impl PyDependencyEdge {
    #[new]
    #[pyo3(signature = (id, dependent_task_id, depends_on_task_id, dependency_type="finish-to-start".to_string(), lag=0))]
    fn new(
        id: String,
        dependent_task_id: String,
        depends_on_task_id: String,
        dependency_type: String,
        lag: i64,
    ) -> PyResult<Self> {
        // Reject bad type names at construction rather than at first use
        dependency_type
            .parse::<crate::models::DependencyType>()
            .map_err(value_error)?;
        Ok(Self {
            id,
            dependent_task_id,
            depends_on_task_id,
            dependency_type,
            lag,
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "DependencyEdge({:?} -> {:?}, type={}, lag={})",
            self.depends_on_task_id, self.dependent_task_id, self.dependency_type, self.lag
        )
    }
}

impl TryFrom<PyDependencyEdge> for DependencyEdge {
    type Error = ScheduleError;

    fn try_from(edge: PyDependencyEdge) -> Result<Self, Self::Error> {
        Ok(DependencyEdge {
            dependency_type: edge.dependency_type.parse()?,
            id: edge.id,
            dependent_task_id: edge.dependent_task_id,
            depends_on_task_id: edge.depends_on_task_id,
            lag: edge.lag,
        })
    }
}

/// Analysis configuration (PyO3 wrapper).
#[pyclass(name = "AnalysisConfig")]
#[derive(Clone, Debug)]
pub struct PyAnalysisConfig {
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// "minimum" or "first-visit".
    #[pyo3(get, set)]
    pub latest_finish_policy: String,
    /// "all-types" or "finish-to-start-only".
    #[pyo3(get, set)]
    pub date_check_scope: String,
}

#[pymethods]
impl PyAnalysisConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, latest_finish_policy="minimum".to_string(), date_check_scope="all-types".to_string()))]
    fn new(
        verbosity: u8,
        latest_finish_policy: String,
        date_check_scope: String,
    ) -> PyResult<Self> {
        let config = Self {
            verbosity,
            latest_finish_policy,
            date_check_scope,
        };
        config.to_config()?;
        Ok(config)
    }

    fn __repr__(&self) -> String {
        format!(
            "AnalysisConfig(verbosity={}, latest_finish_policy={:?}, date_check_scope={:?})",
            self.verbosity, self.latest_finish_policy, self.date_check_scope
        )
    }
}

impl PyAnalysisConfig {
    fn to_config(&self) -> PyResult<AnalysisConfig> {
        AnalysisConfig::from_names(
            self.verbosity,
            Some(&self.latest_finish_policy),
            Some(&self.date_check_scope),
        )
        .map_err(value_error)
    }
}

#[pyclass(name = "Conflict", get_all)]
#[derive(Clone, Debug)]
pub struct PyConflict {
    pub id: String,
    pub conflict_type: String,
    pub severity: String,
    pub affected_task_ids: Vec<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

#[pymethods]
impl PyConflict {
    fn __repr__(&self) -> String {
        format!(
            "Conflict(id={:?}, type={}, severity={})",
            self.id, self.conflict_type, self.severity
        )
    }
}

impl From<Conflict> for PyConflict {
    fn from(c: Conflict) -> Self {
        Self {
            id: c.id,
            conflict_type: c.conflict_type.to_string(),
            severity: c.severity.to_string(),
            affected_task_ids: c.affected_task_ids,
            message: c.message,
            suggestion: c.suggestion,
        }
    }
}

impl TryFrom<PyConflict> for Conflict {
    type Error = ScheduleError;

    fn try_from(c: PyConflict) -> Result<Self, Self::Error> {
        Ok(Conflict {
            conflict_type: c.conflict_type.parse()?,
            severity: c.severity.parse()?,
            id: c.id,
            affected_task_ids: c.affected_task_ids,
            message: c.message,
            suggestion: c.suggestion,
        })
    }
}

#[pyclass(name = "DependencyValidation", get_all)]
#[derive(Clone, Debug)]
pub struct PyDependencyValidation {
    pub is_valid: bool,
    pub error_message: Option<String>,
    pub would_create_cycle: bool,
    pub cycle_path: Option<Vec<String>>,
}

impl From<DependencyValidation> for PyDependencyValidation {
    fn from(v: DependencyValidation) -> Self {
        Self {
            is_valid: v.is_valid,
            error_message: v.error_message,
            would_create_cycle: v.would_create_cycle,
            cycle_path: v.cycle_path,
        }
    }
}

#[pyclass(name = "ConflictSummary", get_all)]
#[derive(Clone, Debug)]
pub struct PyConflictSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub has_blocking: bool,
}

impl From<ConflictSummary> for PyConflictSummary {
    fn from(s: ConflictSummary) -> Self {
        Self {
            errors: s.errors,
            warnings: s.warnings,
            infos: s.infos,
            has_blocking: s.has_blocking,
        }
    }
}

#[pyclass(name = "CriticalPathNode", get_all)]
#[derive(Clone, Debug)]
pub struct PyCriticalPathNode {
    pub task_id: String,
    pub task_title: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub duration: i64,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_finish: i64,
    pub slack: i64,
    pub is_critical: bool,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
}

#[pymethods]
impl PyCriticalPathNode {
    fn __repr__(&self) -> String {
        format!(
            "CriticalPathNode(task_id={:?}, duration={}, slack={})",
            self.task_id, self.duration, self.slack
        )
    }
}

impl From<CriticalPathNode> for PyCriticalPathNode {
    fn from(n: CriticalPathNode) -> Self {
        Self {
            task_id: n.task_id,
            task_title: n.task_title,
            start_date: n.start_date,
            end_date: n.end_date,
            duration: n.duration,
            earliest_start: n.earliest_start,
            earliest_finish: n.earliest_finish,
            latest_finish: n.latest_finish,
            slack: n.slack,
            is_critical: n.is_critical,
            predecessors: n.predecessors,
            successors: n.successors,
        }
    }
}

#[pyclass(name = "CriticalPathAnalysis", get_all)]
#[derive(Clone, Debug)]
pub struct PyCriticalPathAnalysis {
    pub critical_path: Vec<PyCriticalPathNode>,
    pub nodes: Vec<PyCriticalPathNode>,
    pub total_duration: i64,
    pub project_start_date: NaiveDateTime,
    pub project_end_date: NaiveDateTime,
    pub critical_tasks: Vec<String>,
    pub generated_at: NaiveDateTime,
}

impl From<CriticalPathAnalysis> for PyCriticalPathAnalysis {
    fn from(a: CriticalPathAnalysis) -> Self {
        Self {
            critical_path: a.critical_path.into_iter().map(Into::into).collect(),
            nodes: a.nodes.into_iter().map(Into::into).collect(),
            total_duration: a.total_duration,
            project_start_date: a.project_start_date,
            project_end_date: a.project_end_date,
            critical_tasks: a.critical_tasks,
            generated_at: a.generated_at,
        }
    }
}

#[pyclass(name = "TaskSchedule", get_all)]
#[derive(Clone, Debug)]
pub struct PyTaskSchedule {
    pub task_id: String,
    pub earliest_start: NaiveDateTime,
    pub earliest_finish: NaiveDateTime,
    pub latest_start: NaiveDateTime,
    pub latest_finish: NaiveDateTime,
    pub total_slack: i64,
    pub free_slack: i64,
    pub is_critical: bool,
}

impl From<TaskSchedule> for PyTaskSchedule {
    fn from(s: TaskSchedule) -> Self {
        Self {
            task_id: s.task_id,
            earliest_start: s.earliest_start,
            earliest_finish: s.earliest_finish,
            latest_start: s.latest_start,
            latest_finish: s.latest_finish,
            total_slack: s.total_slack,
            free_slack: s.free_slack,
            is_critical: s.is_critical,
        }
    }
}

/// Converted call inputs.
struct Snapshot {
    tasks: Vec<Task>,
    dependencies: Vec<DependencyEdge>,
    config: AnalysisConfig,
}

impl Snapshot {
    fn new(
        tasks: Vec<PyTask>,
        dependencies: Vec<PyDependencyEdge>,
        config: Option<PyAnalysisConfig>,
    ) -> PyResult<Self> {
        Ok(Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
            dependencies: edges(dependencies)?,
            config: config
                .map(|c| c.to_config())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::with_config(&self.tasks, &self.dependencies, self.config.clone())
    }

    fn analyzer(&self) -> CriticalPathAnalyzer {
        CriticalPathAnalyzer::new(self.config.clone())
    }
}

fn edges(dependencies: Vec<PyDependencyEdge>) -> PyResult<Vec<DependencyEdge>> {
    dependencies
        .into_iter()
        .map(|d| DependencyEdge::try_from(d).map_err(value_error))
        .collect()
}

fn conflicts_to_py(conflicts: Vec<Conflict>) -> Vec<PyConflict> {
    conflicts.into_iter().map(Into::into).collect()
}

/// Report every dependency cycle as an error-severity conflict.
#[pyfunction]
#[pyo3(signature = (tasks, dependencies, config=None))]
fn detect_circular_dependencies(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<Vec<PyConflict>> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    Ok(conflicts_to_py(snapshot.graph().circular_dependencies()))
}

/// Report missing dates, date-order violations and overdue blockers.
#[pyfunction]
#[pyo3(signature = (tasks, dependencies, current_time=None, config=None))]
fn detect_date_mismatches(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    current_time: Option<NaiveDateTime>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<Vec<PyConflict>> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    Ok(conflicts_to_py(
        snapshot.graph().date_mismatches(now_or(current_time)),
    ))
}

/// Circular conflicts followed by date conflicts.
#[pyfunction]
#[pyo3(signature = (tasks, dependencies, current_time=None, config=None))]
fn get_all_dependency_conflicts(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    current_time: Option<NaiveDateTime>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<Vec<PyConflict>> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    Ok(conflicts_to_py(
        snapshot.graph().all_conflicts(now_or(current_time)),
    ))
}

#[pyfunction]
fn would_create_cycle(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    existing_dependencies: Vec<PyDependencyEdge>,
) -> PyResult<bool> {
    let existing = edges(existing_dependencies)?;
    Ok(graph::would_create_cycle(
        dependent_task_id,
        depends_on_task_id,
        &existing,
    ))
}

#[pyfunction]
fn find_cycle_path(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    existing_dependencies: Vec<PyDependencyEdge>,
) -> PyResult<Option<Vec<String>>> {
    let existing = edges(existing_dependencies)?;
    Ok(graph::find_cycle_path(
        dependent_task_id,
        depends_on_task_id,
        &existing,
    ))
}

#[pyfunction]
fn validate_dependency(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    tasks: Vec<PyTask>,
    existing_dependencies: Vec<PyDependencyEdge>,
) -> PyResult<PyDependencyValidation> {
    let snapshot = Snapshot::new(tasks, existing_dependencies, None)?;
    Ok(snapshot
        .graph()
        .validate_dependency(dependent_task_id, depends_on_task_id)
        .into())
}

#[pyfunction]
fn get_blocking_tasks(task_id: &str, dependencies: Vec<PyDependencyEdge>) -> PyResult<Vec<String>> {
    Ok(graph::get_blocking_tasks(task_id, &edges(dependencies)?))
}

#[pyfunction]
fn get_blocked_tasks(task_id: &str, dependencies: Vec<PyDependencyEdge>) -> PyResult<Vec<String>> {
    Ok(graph::get_blocked_tasks(task_id, &edges(dependencies)?))
}

#[pyfunction]
fn get_ready_tasks(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
) -> PyResult<Vec<String>> {
    let snapshot = Snapshot::new(tasks, dependencies, None)?;
    Ok(snapshot.graph().ready_tasks())
}

/// Task ids with prerequisites first.
///
/// # Raises
/// * ValueError if the dependencies are cyclic
#[pyfunction]
fn topological_order(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
) -> PyResult<Vec<String>> {
    let snapshot = Snapshot::new(tasks, dependencies, None)?;
    snapshot.graph().topological_order().map_err(value_error)
}

#[pyfunction]
fn summarize_conflicts(conflicts: Vec<PyConflict>) -> PyResult<PyConflictSummary> {
    let conflicts = conflicts
        .into_iter()
        .map(Conflict::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(value_error)?;
    Ok(graph::summarize_conflicts(&conflicts).into())
}

/// Critical path over the tasks that have both dates.
///
/// Returns an empty analysis when the dated tasks are cyclic.
#[pyfunction]
#[pyo3(signature = (tasks, dependencies, current_time=None, config=None))]
fn calculate_critical_path(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    current_time: Option<NaiveDateTime>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<PyCriticalPathAnalysis> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    Ok(snapshot
        .analyzer()
        .analyze(&snapshot.tasks, &snapshot.dependencies, now_or(current_time))
        .into())
}

/// Critical path over the tasks that have both dates.
///
/// # Raises
/// * ValueError if the dated tasks are cyclic
#[pyfunction]
#[pyo3(signature = (tasks, dependencies, current_time=None, config=None))]
fn try_calculate_critical_path(
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    current_time: Option<NaiveDateTime>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<PyCriticalPathAnalysis> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    snapshot
        .analyzer()
        .try_analyze(&snapshot.tasks, &snapshot.dependencies, now_or(current_time))
        .map(Into::into)
        .map_err(value_error)
}

/// Float for one task in calendar dates, or None if it was not analyzed.
#[pyfunction]
#[pyo3(signature = (task_id, tasks, dependencies, current_time=None, config=None))]
fn calculate_task_schedule(
    task_id: &str,
    tasks: Vec<PyTask>,
    dependencies: Vec<PyDependencyEdge>,
    current_time: Option<NaiveDateTime>,
    config: Option<PyAnalysisConfig>,
) -> PyResult<Option<PyTaskSchedule>> {
    let snapshot = Snapshot::new(tasks, dependencies, config)?;
    Ok(snapshot
        .analyzer()
        .task_schedule(
            task_id,
            &snapshot.tasks,
            &snapshot.dependencies,
            now_or(current_time),
        )
        .map(Into::into))
}

/// The taskdeps.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Input types
    m.add_class::<PyTask>()?;
    m.add_class::<PyDependencyEdge>()?;
    m.add_class::<PyAnalysisConfig>()?;

    // Result types
    m.add_class::<PyConflict>()?;
    m.add_class::<PyDependencyValidation>()?;
    m.add_class::<PyConflictSummary>()?;
    m.add_class::<PyCriticalPathNode>()?;
    m.add_class::<PyCriticalPathAnalysis>()?;
    m.add_class::<PyTaskSchedule>()?;

    // Graph queries
    m.add_function(wrap_pyfunction!(detect_circular_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(detect_date_mismatches, m)?)?;
    m.add_function(wrap_pyfunction!(get_all_dependency_conflicts, m)?)?;
    m.add_function(wrap_pyfunction!(would_create_cycle, m)?)?;
    m.add_function(wrap_pyfunction!(find_cycle_path, m)?)?;
    m.add_function(wrap_pyfunction!(validate_dependency, m)?)?;
    m.add_function(wrap_pyfunction!(get_blocking_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(get_blocked_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(get_ready_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(topological_order, m)?)?;
    m.add_function(wrap_pyfunction!(summarize_conflicts, m)?)?;

    // Scheduling
    m.add_function(wrap_pyfunction!(calculate_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(try_calculate_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_task_schedule, m)?)?;

    Ok(())
}
