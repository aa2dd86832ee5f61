//! Cycle detection over the dependency graph.
//!
//! Depth-first search with an explicit stack, so deep chains cannot overflow
//! the call stack. A shared `visited` set keeps the whole scan O(V + E).

use rustc_hash::FxHashMap;

use crate::models::{Conflict, ConflictType, DependencyEdge, Severity, Task};
use crate::log_detail;

use super::adjacency::{Adjacency, NodeId};

/// Run DFS from each root in turn and collect every cycle closed by a back edge.
///
/// Each cycle is listed in path order without repeating its first node, so
/// consecutive ids (and the last -> first pair) are real edges.
pub(crate) fn find_cycles(
    adj: &Adjacency,
    roots: impl IntoIterator<Item = NodeId>,
    stop_at_first: bool,
) -> Vec<Vec<NodeId>> {
    let n = adj.len();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];
    let mut cycles = Vec::new();

    for root in roots {
        if visited[root as usize] {
            continue;
        }

        // path[i] is the node at depth i; cursor[i] is its next child to try.
        let mut path: Vec<NodeId> = vec![root];
        let mut cursor: Vec<usize> = vec![0];
        visited[root as usize] = true;
        on_stack[root as usize] = true;

        while let Some(&node) = path.last() {
            let depth = path.len() - 1;
            let children = adj.dependents(node);

            if let Some(&(child, _)) = children.get(cursor[depth]) {
                cursor[depth] += 1;
                if on_stack[child as usize] {
                    if let Some(start) = path.iter().position(|&p| p == child) {
                        cycles.push(path[start..].to_vec());
                        if stop_at_first {
                            return cycles;
                        }
                    }
                } else if !visited[child as usize] {
                    visited[child as usize] = true;
                    on_stack[child as usize] = true;
                    path.push(child);
                    cursor.push(0);
                }
            } else {
                on_stack[node as usize] = false;
                path.pop();
                cursor.pop();
            }
        }
    }

    cycles
}

fn display_name<'a>(titles: &FxHashMap<&str, &'a str>, id: &'a str) -> &'a str {
    titles.get(id).copied().unwrap_or(id)
}

fn circular_conflict(cycle: &[String], titles: &FxHashMap<&str, &str>) -> Conflict {
    let mut chain: Vec<&str> = cycle.iter().map(|id| display_name(titles, id)).collect();
    if let Some(&first) = chain.first() {
        chain.push(first);
    }

    Conflict {
        id: format!("circular-{}", cycle.join("-")),
        conflict_type: ConflictType::Circular,
        severity: Severity::Error,
        affected_task_ids: cycle.to_vec(),
        message: format!("Circular dependency detected: {}", chain.join(" → ")),
        suggestion: Some("Remove one of the dependencies in this cycle".to_string()),
    }
}

/// Report every dependency cycle as a `circular` error conflict.
///
/// Search is rooted at each task in input order, then at edge endpoints that
/// are not in `tasks`.
pub fn detect_circular_dependencies(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
) -> Vec<Conflict> {
    detect_circular_dependencies_logged(tasks, dependencies, 0)
}

pub(crate) fn detect_circular_dependencies_logged(
    tasks: &[Task],
    dependencies: &[DependencyEdge],
    verbosity: u8,
) -> Vec<Conflict> {
    let adj = Adjacency::from_snapshot(tasks, dependencies);
    let titles: FxHashMap<&str, &str> = tasks
        .iter()
        .map(|t| (t.id.as_str(), t.title.as_str()))
        .collect();

    find_cycles(&adj, adj.nodes(), false)
        .into_iter()
        .map(|cycle| {
            let ids: Vec<String> = cycle.iter().map(|&n| adj.name(n).to_string()).collect();
            let conflict = circular_conflict(&ids, &titles);
            log_detail!(verbosity, "{}", conflict.message);
            conflict
        })
        .collect()
}

/// The cycle that adding `depends_on -> dependent` would close, if any.
///
/// Works on a private copy of the adjacency; `existing` is not touched.
pub fn find_cycle_path(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    existing: &[DependencyEdge],
) -> Option<Vec<String>> {
    let mut adj = Adjacency::from_edges(existing);
    adj.add_edge(depends_on_task_id, dependent_task_id, 0);

    let root = adj.get(depends_on_task_id)?;
    find_cycles(&adj, [root], true)
        .into_iter()
        .next()
        .map(|cycle| cycle.iter().map(|&n| adj.name(n).to_string()).collect())
}

/// Whether adding the edge `dependent_task_id` waits on `depends_on_task_id`
/// would create a cycle.
pub fn would_create_cycle(
    dependent_task_id: &str,
    depends_on_task_id: &str,
    existing: &[DependencyEdge],
) -> bool {
    find_cycle_path(dependent_task_id, depends_on_task_id, existing).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn edge(dependent: &str, depends_on: &str) -> DependencyEdge {
        DependencyEdge::new(format!("{depends_on}->{dependent}"), dependent, depends_on)
    }

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter().map(|id| Task::new(*id, id.to_uppercase())).collect()
    }

    fn is_valid_cycle(cycle: &[String], edges: &[DependencyEdge]) -> bool {
        let pairs: HashSet<(&str, &str)> = edges
            .iter()
            .map(|e| (e.depends_on_task_id.as_str(), e.dependent_task_id.as_str()))
            .collect();
        !cycle.is_empty()
            && (0..cycle.len()).all(|i| {
                let from = cycle[i].as_str();
                let to = cycle[(i + 1) % cycle.len()].as_str();
                pairs.contains(&(from, to))
            })
    }

    #[test]
    fn test_dag_has_no_cycles() {
        let edges = vec![edge("b", "a"), edge("c", "a"), edge("d", "b"), edge("d", "c")];
        assert!(detect_circular_dependencies(&tasks(&["a", "b", "c", "d"]), &edges).is_empty());
    }

    #[test]
    fn test_three_cycle() {
        // a -> b -> c -> a
        let edges = vec![edge("b", "a"), edge("c", "b"), edge("a", "c")];
        let conflicts = detect_circular_dependencies(&tasks(&["a", "b", "c"]), &edges);

        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::Circular);
        assert_eq!(conflict.severity, Severity::Error);
        assert_eq!(conflict.affected_task_ids, vec!["a", "b", "c"]);
        assert_eq!(conflict.id, "circular-a-b-c");
        assert_eq!(
            conflict.message,
            "Circular dependency detected: A → B → C → A"
        );
    }

    #[test]
    fn test_self_dependency() {
        let edges = vec![edge("a", "a")];
        let conflicts = detect_circular_dependencies(&tasks(&["a"]), &edges);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].affected_task_ids, vec!["a"]);
    }

    #[test]
    fn test_two_independent_cycles() {
        let edges = vec![
            edge("b", "a"),
            edge("a", "b"),
            edge("d", "c"),
            edge("c", "d"),
        ];
        let conflicts = detect_circular_dependencies(&tasks(&["a", "b", "c", "d"]), &edges);

        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].affected_task_ids, vec!["a", "b"]);
        assert_eq!(conflicts[1].affected_task_ids, vec!["c", "d"]);
    }

    #[test]
    fn test_cycle_among_unknown_tasks_is_reported() {
        let edges = vec![edge("y", "x"), edge("x", "y")];
        let conflicts = detect_circular_dependencies(&tasks(&["a"]), &edges);

        assert_eq!(conflicts.len(), 1);
        // No titles known, ids are used in the message
        assert!(conflicts[0].message.contains("x → y → x"));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("t{i}")).collect();
        let mut edges: Vec<DependencyEdge> = ids
            .windows(2)
            .map(|w| edge(&w[1], &w[0]))
            .collect();
        let all: Vec<Task> = ids.iter().map(|id| Task::new(id.as_str(), id.as_str())).collect();
        assert!(detect_circular_dependencies(&all, &edges).is_empty());

        edges.push(edge("t0", "t49999"));
        let conflicts = detect_circular_dependencies(&all, &edges);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].affected_task_ids.len(), 50_000);
    }

    #[test]
    fn test_would_create_cycle() {
        // a -> b -> c
        let edges = vec![edge("b", "a"), edge("c", "b")];

        // a waiting on c closes a -> b -> c -> a
        assert!(would_create_cycle("a", "c", &edges));
        // c waiting on a is just a shortcut
        assert!(!would_create_cycle("c", "a", &edges));
        // unrelated tasks
        assert!(!would_create_cycle("x", "y", &edges));
        // self-dependency
        assert!(would_create_cycle("a", "a", &edges));
        // existing edges are untouched
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_find_cycle_path_starts_with_new_edge() {
        let edges = vec![edge("b", "a"), edge("c", "b")];
        let path = find_cycle_path("a", "c", &edges).unwrap();
        assert_eq!(path, vec!["c", "a", "b"]);
    }

    /// Random DAG: edges only go from a lower index to a higher one.
    fn dag_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (2usize..12).prop_flat_map(|n| {
            let pairs = prop::collection::vec((0..n, 0..n), 0..(n * 2));
            (Just(n), pairs).prop_map(|(n, pairs)| {
                let edges: Vec<(usize, usize)> = pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| (a.min(b), a.max(b)))
                    .collect();
                (n, edges)
            })
        })
    }

    fn to_edges(edges: &[(usize, usize)]) -> Vec<DependencyEdge> {
        edges
            .iter()
            .map(|&(from, to)| edge(&format!("t{to}"), &format!("t{from}")))
            .collect()
    }

    fn reachable(n: usize, edges: &[(usize, usize)], from: usize, to: usize) -> bool {
        let mut seen = vec![false; n];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            stack.extend(edges.iter().filter(|(a, _)| *a == node).map(|(_, b)| *b));
        }
        false
    }

    proptest! {
        #[test]
        fn prop_dags_have_no_cycles((n, edges) in dag_strategy()) {
            let all: Vec<Task> = (0..n).map(|i| Task::new(format!("t{i}"), "")).collect();
            prop_assert!(detect_circular_dependencies(&all, &to_edges(&edges)).is_empty());
        }

        #[test]
        fn prop_back_edge_yields_valid_cycle(
            (n, edges) in dag_strategy(),
            pick in any::<prop::sample::Index>(),
        ) {
            prop_assume!(!edges.is_empty());
            let (from, to) = edges[pick.index(edges.len())];
            let mut with_back = edges.clone();
            with_back.push((to, from));
            let deps = to_edges(&with_back);
            let all: Vec<Task> = (0..n).map(|i| Task::new(format!("t{i}"), "")).collect();

            let conflicts = detect_circular_dependencies(&all, &deps);
            prop_assert!(!conflicts.is_empty());
            for conflict in &conflicts {
                prop_assert_eq!(conflict.conflict_type, ConflictType::Circular);
                prop_assert!(is_valid_cycle(&conflict.affected_task_ids, &deps));
            }
        }

        #[test]
        fn prop_would_create_cycle_matches_reachability(
            (n, edges) in dag_strategy(),
            u in 0usize..12,
            v in 0usize..12,
        ) {
            let (u, v) = (u % n, v % n);
            let expected = reachable(n, &edges, u, v);
            let got = would_create_cycle(&format!("t{u}"), &format!("t{v}"), &to_edges(&edges));
            prop_assert_eq!(got, expected);
        }
    }
}
