//! Connection graph and all-pairs shortest-path routing table.

use neuromesh_core::NodeId;
use std::collections::HashMap;
use std::time::Duration;

/// The current connection graph: an undirected, latency-weighted adjacency
/// map. An edge exists between two nodes that have an open Transport session.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: HashMap<NodeId, HashMap<NodeId, Duration>>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or updates) an undirected edge with the given latency weight.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, latency: Duration) {
        self.edges.entry(a).or_default().insert(b, latency);
        self.edges.entry(b).or_default().insert(a, latency);
    }

    /// Removes the edge between `a` and `b`, if present.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) {
        if let Some(neighbors) = self.edges.get_mut(&a) {
            neighbors.remove(&b);
        }
        if let Some(neighbors) = self.edges.get_mut(&b) {
            neighbors.remove(&a);
        }
    }

    /// Removes every edge touching `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        self.edges.remove(&node);
        for neighbors in self.edges.values_mut() {
            neighbors.remove(&node);
        }
    }

    /// Every node with at least one edge, plus `extra` (so isolated nodes the
    /// caller cares about, like self, are still part of the routing table).
    fn nodes(&self, extra: &[NodeId]) -> Vec<NodeId> {
        let mut set: Vec<NodeId> = self.edges.keys().copied().collect();
        for node in extra {
            if !set.contains(node) {
                set.push(*node);
            }
        }
        set
    }

    /// The neighbors of `node` and their edge weights.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> Vec<(NodeId, Duration)> {
        self.edges
            .get(&node)
            .map(|m| m.iter().map(|(id, latency)| (*id, *latency)).collect())
            .unwrap_or_default()
    }

    /// The degree (connection count) of `node`.
    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.edges.get(&node).map_or(0, HashMap::len)
    }

    /// Breadth-first reachable set from `start`.
    #[must_use]
    pub fn reachable_from(&self, start: NodeId) -> std::collections::HashSet<NodeId> {
        let mut visited = std::collections::HashSet::new();
        let mut queue = std::collections::VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for (neighbor, _) in self.neighbors(node) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited
    }
}

/// All-pairs shortest paths over a [`Graph`], recomputed whenever the graph
/// changes (peer join/leave) or at most once per `monitoring_interval` on
/// pure latency churn.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    distance: HashMap<(NodeId, NodeId), Duration>,
    next_hop: HashMap<(NodeId, NodeId), NodeId>,
}

impl RoutingTable {
    /// Recomputes the table via Floyd-Warshall-style DP relaxation over `graph`.
    /// `extra_nodes` are included even if they currently have no edges (e.g. self).
    #[must_use]
    pub fn compute(graph: &Graph, extra_nodes: &[NodeId]) -> Self {
        let nodes = graph.nodes(extra_nodes);
        let n = nodes.len();
        let index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        const INF: f64 = f64::INFINITY;
        let mut dist = vec![vec![INF; n]; n];
        let mut next = vec![vec![None; n]; n];

        for i in 0..n {
            dist[i][i] = 0.0;
        }
        for (&node, &i) in &index {
            for (neighbor, latency) in graph.neighbors(node) {
                if let Some(&j) = index.get(&neighbor) {
                    let weight = latency.as_secs_f64();
                    if weight < dist[i][j] {
                        dist[i][j] = weight;
                        next[i][j] = Some(j);
                    }
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                if dist[i][k] == INF {
                    continue;
                }
                for j in 0..n {
                    let via = dist[i][k] + dist[k][j];
                    if via < dist[i][j] {
                        dist[i][j] = via;
                        next[i][j] = next[i][k];
                    }
                }
            }
        }

        let mut distance = HashMap::new();
        let mut next_hop = HashMap::new();
        for i in 0..n {
            for j in 0..n {
                if dist[i][j].is_finite() {
                    distance.insert((nodes[i], nodes[j]), Duration::from_secs_f64(dist[i][j]));
                }
                if let Some(next_index) = next[i][j] {
                    next_hop.insert((nodes[i], nodes[j]), nodes[next_index]);
                }
            }
        }
        Self { distance, next_hop }
    }

    /// The first hop on the shortest path from `from` to `to`, if one exists.
    #[must_use]
    pub fn next_hop(&self, from: NodeId, to: NodeId) -> Option<NodeId> {
        self.next_hop.get(&(from, to)).copied()
    }

    /// The shortest-path latency from `from` to `to`, if reachable.
    #[must_use]
    pub fn distance(&self, from: NodeId, to: NodeId) -> Option<Duration> {
        self.distance.get(&(from, to)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::id::RawId;

    fn node(seed: u8) -> NodeId {
        NodeId::from_raw(RawId::from_bytes([seed; 16]))
    }

    #[test]
    fn shortest_path_through_intermediate_hop() {
        let mut graph = Graph::new();
        let (a, b, c) = (node(1), node(2), node(3));
        graph.add_edge(a, b, Duration::from_millis(10));
        graph.add_edge(b, c, Duration::from_millis(10));
        graph.add_edge(a, c, Duration::from_millis(100));

        let table = RoutingTable::compute(&graph, &[]);
        assert_eq!(table.next_hop(a, c), Some(b));
        assert_eq!(table.distance(a, c), Some(Duration::from_millis(20)));
    }

    #[test]
    fn unreachable_node_has_no_route() {
        let mut graph = Graph::new();
        let (a, b, isolated) = (node(1), node(2), node(9));
        graph.add_edge(a, b, Duration::from_millis(5));
        let table = RoutingTable::compute(&graph, &[isolated]);
        assert_eq!(table.next_hop(a, isolated), None);
    }

    #[test]
    fn reachable_from_follows_bfs() {
        let mut graph = Graph::new();
        let (a, b, c) = (node(1), node(2), node(3));
        graph.add_edge(a, b, Duration::from_millis(5));
        let reachable = graph.reachable_from(a);
        assert!(reachable.contains(&b));
        assert!(!reachable.contains(&c));
    }
}
