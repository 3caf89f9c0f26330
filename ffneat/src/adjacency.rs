//! A dense boolean adjacency matrix over a dynamic
//! set of node IDs.
//!
//! Node IDs are mapped to contiguous matrix indices
//! in ascending ID order. Every node insertion or removal
//! rebuilds the mapping and the matrix, so indices are
//! always `0..len()`.
use crate::NodeId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Errors raised by [`AdjacencyIndex`] operations
/// that require an existing node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdjacencyError {
    #[error("node {0} does not exist in the adjacency index")]
    UnknownNode(NodeId),
}

/// A reindexable directed adjacency structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyIndex {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize, RandomState>,
    matrix: Vec<bool>,
}

impl AdjacencyIndex {
    /// Creates an empty index.
    pub fn new() -> AdjacencyIndex {
        AdjacencyIndex::default()
    }

    /// Creates an index over `nodes` with the given directed
    /// `edges`. Edges with unknown endpoints are ignored.
    ///
    /// # Examples
    /// ```
    /// use ffneat::adjacency::AdjacencyIndex;
    ///
    /// let adjacency = AdjacencyIndex::from_nodes([7, 3, 5], [(3, 5), (5, 7), (1, 7)]);
    ///
    /// assert_eq!(adjacency.len(), 3);
    /// assert!(adjacency.has_connection(3, 5));
    /// assert!(!adjacency.has_connection(1, 7));
    /// assert_eq!(adjacency.topological_order(), Some(vec![3, 5, 7]));
    /// ```
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> AdjacencyIndex {
        let mut nodes: Vec<NodeId> = nodes.into_iter().collect();
        nodes.sort_unstable();
        nodes.dedup();
        let n = nodes.len();
        let mut adjacency = AdjacencyIndex {
            index: nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect(),
            nodes,
            matrix: vec![false; n * n],
        };
        for (source, target) in edges {
            adjacency.add_connection(source, target);
        }
        adjacency
    }

    /// Rebuilds the ID → index mapping and the matrix
    /// for the node set `nodes`, carrying over every
    /// edge between surviving nodes.
    fn reindex(&mut self, mut nodes: Vec<NodeId>) {
        nodes.sort_unstable();
        let n = nodes.len();
        let index: HashMap<NodeId, usize, RandomState> =
            nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut matrix = vec![false; n * n];
        let old_n = self.nodes.len();
        for (i, &source) in self.nodes.iter().enumerate() {
            for (j, &target) in self.nodes.iter().enumerate() {
                if self.matrix[i * old_n + j] {
                    if let (Some(&si), Some(&ti)) = (index.get(&source), index.get(&target)) {
                        matrix[si * n + ti] = true;
                    }
                }
            }
        }
        self.nodes = nodes;
        self.index = index;
        self.matrix = matrix;
    }

    /// Adds a node, if absent.
    ///
    /// # Examples
    /// ```
    /// use ffneat::adjacency::AdjacencyIndex;
    ///
    /// let mut adjacency = AdjacencyIndex::new();
    /// adjacency.add_node(10);
    /// adjacency.add_node(2);
    /// adjacency.add_node(10);
    ///
    /// assert_eq!(adjacency.nodes().collect::<Vec<_>>(), vec![2, 10]);
    /// ```
    pub fn add_node(&mut self, node: NodeId) {
        if !self.index.contains_key(&node) {
            let mut nodes = self.nodes.clone();
            nodes.push(node);
            self.reindex(nodes);
        }
    }

    /// Adds a directed connection between two existing nodes.
    /// Returns `false` if either node is unknown.
    pub fn add_connection(&mut self, source: NodeId, target: NodeId) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&si), Some(&ti)) => {
                let n = self.nodes.len();
                self.matrix[si * n + ti] = true;
                true
            }
            _ => false,
        }
    }

    /// Removes every connection touching `node`.
    ///
    /// # Errors
    /// Returns [`AdjacencyError::UnknownNode`] if
    /// the node is not present.
    pub fn remove_node_connections(&mut self, node: NodeId) -> Result<(), AdjacencyError> {
        let &i = self
            .index
            .get(&node)
            .ok_or(AdjacencyError::UnknownNode(node))?;
        let n = self.nodes.len();
        for k in 0..n {
            self.matrix[i * n + k] = false;
            self.matrix[k * n + i] = false;
        }
        Ok(())
    }

    /// Removes a node and its connections, if present.
    ///
    /// # Examples
    /// ```
    /// use ffneat::adjacency::AdjacencyIndex;
    ///
    /// let mut adjacency = AdjacencyIndex::from_nodes([1, 2, 3], [(1, 2), (2, 3), (1, 3)]);
    /// adjacency.remove_node(2);
    ///
    /// assert_eq!(adjacency.len(), 2);
    /// assert!(adjacency.has_connection(1, 3));
    /// assert!(!adjacency.has_connection(1, 2));
    /// ```
    pub fn remove_node(&mut self, node: NodeId) {
        if self.index.contains_key(&node) {
            let nodes = self.nodes.iter().copied().filter(|&n| n != node).collect();
            self.reindex(nodes);
        }
    }

    /// Returns whether `source -> target` exists. Unknown
    /// nodes have no connections.
    pub fn has_connection(&self, source: NodeId, target: NodeId) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&si), Some(&ti)) => self.matrix[si * self.nodes.len() + ti],
            _ => false,
        }
    }

    /// Returns the matrix rows, in index order.
    /// `matrix()[i][j]` is `true` iff node `i` connects to node `j`.
    pub fn matrix(&self) -> Vec<Vec<bool>> {
        let n = self.nodes.len();
        (0..n)
            .map(|i| self.matrix[i * n..(i + 1) * n].to_vec())
            .collect()
    }

    /// Sets or clears individual incoming and outgoing connections
    /// of `node`. Entries naming unknown nodes are skipped, as
    /// is the whole call if `node` itself is unknown.
    ///
    /// # Examples
    /// ```
    /// use ffneat::adjacency::AdjacencyIndex;
    ///
    /// let mut adjacency = AdjacencyIndex::from_nodes([0, 1, 2], [(0, 1)]);
    /// adjacency.set_node_connections(1, &[(0, false), (2, true)], &[(2, true)]);
    ///
    /// assert!(!adjacency.has_connection(0, 1));
    /// assert!(adjacency.has_connection(2, 1));
    /// assert!(adjacency.has_connection(1, 2));
    /// ```
    pub fn set_node_connections(
        &mut self,
        node: NodeId,
        incoming: &[(NodeId, bool)],
        outgoing: &[(NodeId, bool)],
    ) {
        let n = self.nodes.len();
        if let Some(&i) = self.index.get(&node) {
            for (other, value) in incoming {
                if let Some(&k) = self.index.get(other) {
                    self.matrix[k * n + i] = *value;
                }
            }
            for (other, value) in outgoing {
                if let Some(&k) = self.index.get(other) {
                    self.matrix[i * n + k] = *value;
                }
            }
        }
    }

    /// Returns the nodes with a connection into `node`,
    /// in ascending ID order.
    pub fn incoming(&self, node: NodeId) -> Vec<NodeId> {
        let n = self.nodes.len();
        match self.index.get(&node) {
            Some(&i) => (0..n)
                .filter(|&k| self.matrix[k * n + i])
                .map(|k| self.nodes[k])
                .collect(),
            None => vec![],
        }
    }

    /// Returns the nodes `node` connects to,
    /// in ascending ID order.
    pub fn outgoing(&self, node: NodeId) -> Vec<NodeId> {
        let n = self.nodes.len();
        match self.index.get(&node) {
            Some(&i) => (0..n)
                .filter(|&k| self.matrix[i * n + k])
                .map(|k| self.nodes[k])
                .collect(),
            None => vec![],
        }
    }

    /// Returns whether a directed path leads from `source`
    /// to `target`. A node always reaches itself.
    ///
    /// # Examples
    /// ```
    /// use ffneat::adjacency::AdjacencyIndex;
    ///
    /// let adjacency = AdjacencyIndex::from_nodes([0, 1, 2, 3], [(0, 1), (1, 2)]);
    ///
    /// assert!(adjacency.reaches(0, 2));
    /// assert!(!adjacency.reaches(2, 0));
    /// assert!(!adjacency.reaches(0, 3));
    /// ```
    pub fn reaches(&self, source: NodeId, target: NodeId) -> bool {
        let (Some(&si), Some(&ti)) = (self.index.get(&source), self.index.get(&target)) else {
            return false;
        };
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut stack = vec![si];
        while let Some(i) = stack.pop() {
            if i == ti {
                return true;
            }
            if std::mem::replace(&mut visited[i], true) {
                continue;
            }
            stack.extend((0..n).filter(|&k| self.matrix[i * n + k] && !visited[k]));
        }
        false
    }

    /// Returns the nodes in a topological order, choosing the
    /// lowest ID among all ready nodes at each step, or `None`
    /// if the connections contain a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = (0..n)
            .map(|j| (0..n).filter(|&i| self.matrix[i * n + j]).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(self.nodes[i]);
            for k in 0..n {
                if self.matrix[i * n + k] {
                    in_degree[k] -= 1;
                    if in_degree[k] == 0 {
                        ready.push(Reverse(k));
                    }
                }
            }
        }
        (order.len() == n).then_some(order)
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node IDs in index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Returns the dense index of `node`.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }
}
