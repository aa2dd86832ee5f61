//! Interned adjacency lists built from a dependency edge snapshot.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::models::{DependencyEdge, Task};

/// Dense index of a task id within one `Adjacency`, assigned in first-seen order.
pub type NodeId = u32;

/// Prerequisite -> dependents lists (and the reverse), with edge lag.
///
/// Task ids are mapped to `NodeId`s on the way in so the passes can index
/// plain `Vec`s. Built fresh for every call; nothing here outlives the
/// snapshot it came from.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    ids: FxHashMap<String, NodeId>,
    names: Vec<String>,
    dependents: Vec<Vec<(NodeId, i64)>>,
    prerequisites: Vec<Vec<(NodeId, i64)>>,
}

impl Adjacency {
    fn with_nodes<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let ids = ids.into_iter();
        let capacity = ids.size_hint().0;
        let mut adj = Self {
            ids: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
            ..Self::default()
        };
        for id in ids {
            adj.node(id);
        }
        adj
    }

    /// Nodes are the tasks in input order, then any edge endpoint not among them.
    pub fn from_snapshot(tasks: &[Task], edges: &[DependencyEdge]) -> Self {
        let mut adj = Self::with_nodes(tasks.iter().map(|t| t.id.as_str()));
        for edge in edges {
            adj.add_edge(&edge.depends_on_task_id, &edge.dependent_task_id, edge.lag);
        }
        adj
    }

    /// Nodes are the edge endpoints in edge order.
    pub fn from_edges(edges: &[DependencyEdge]) -> Self {
        Self::from_snapshot(&[], edges)
    }

    /// Nodes are exactly `ids`; edges touching any other id are dropped.
    pub fn restricted<'a>(
        ids: impl IntoIterator<Item = &'a str>,
        edges: &[DependencyEdge],
    ) -> Self {
        let mut adj = Self::with_nodes(ids);
        for edge in edges {
            let (Some(from), Some(to)) = (
                adj.get(&edge.depends_on_task_id),
                adj.get(&edge.dependent_task_id),
            ) else {
                continue;
            };
            adj.link(from, to, edge.lag);
        }
        adj
    }

    /// The node for `id`, adding an unlinked one on first sight.
    fn node(&mut self, id: &str) -> NodeId {
        if let Some(&node) = self.ids.get(id) {
            return node;
        }
        let node = self.names.len() as NodeId;
        self.ids.insert(id.to_string(), node);
        self.names.push(id.to_string());
        self.dependents.push(Vec::new());
        self.prerequisites.push(Vec::new());
        node
    }

    fn link(&mut self, from: NodeId, to: NodeId, lag: i64) {
        self.dependents[from as usize].push((to, lag));
        self.prerequisites[to as usize].push((from, lag));
    }

    /// Add `prerequisite -> dependent`, creating either node if needed.
    pub fn add_edge(&mut self, prerequisite: &str, dependent: &str, lag: i64) {
        let from = self.node(prerequisite);
        let to = self.node(dependent);
        self.link(from, to, lag);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Task id of `node`.
    #[inline]
    pub fn name(&self, node: NodeId) -> &str {
        &self.names[node as usize]
    }

    /// Tasks waiting on `node`, with the edge lag.
    #[inline]
    pub fn dependents(&self, node: NodeId) -> &[(NodeId, i64)] {
        &self.dependents[node as usize]
    }

    /// Tasks `node` waits on, with the edge lag.
    #[inline]
    pub fn prerequisites(&self, node: NodeId) -> &[(NodeId, i64)] {
        &self.prerequisites[node as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.len() as NodeId
    }

    /// Topological order (prerequisites first) using Kahn's algorithm.
    ///
    /// Among ready nodes the lowest id goes first, so ties follow input order.
    /// On a cycle, returns the nodes that could not be ordered.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, Vec<NodeId>> {
        let mut in_degree: Vec<usize> = self.prerequisites.iter().map(Vec::len).collect();

        let mut ready: BinaryHeap<Reverse<NodeId>> = self
            .nodes()
            .filter(|&n| in_degree[n as usize] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &(dependent, _) in self.dependents(node) {
                let degree = &mut in_degree[dependent as usize];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != self.len() {
            let mut placed = vec![false; self.len()];
            for &node in &order {
                placed[node as usize] = true;
            }
            return Err(self.nodes().filter(|&n| !placed[n as usize]).collect());
        }

        Ok(order)
    }
}
