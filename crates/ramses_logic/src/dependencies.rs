//! Execution order of logic nodes
//!
//! Kahn's algorithm over node level edges. Among nodes that are ready at the
//! same time the one created first runs first, so the order is stable for a
//! given graph.

use crate::node::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// Sort `nodes` (given in creation order) so that every edge source comes
/// before its target. Returns `None` if the edges contain a cycle.
pub(crate) fn sort_nodes(
    nodes: &[NodeId],
    edges: impl IntoIterator<Item = (NodeId, NodeId)>,
) -> Option<Vec<NodeId>> {
    let position: FxHashMap<NodeId, usize> =
        nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    let mut seen = FxHashSet::default();
    for (source, target) in edges {
        let (Some(&from), Some(&to)) = (position.get(&source), position.get(&target)) else {
            continue;
        };
        if seen.insert((from, to)) {
            successors[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(nodes.len());
    while let Some(next) = ready.pop_first() {
        sorted.push(nodes[next]);
        for &successor in &successors[next] {
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                ready.insert(successor);
            }
        }
    }

    (sorted.len() == nodes.len()).then_some(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<NodeId> {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_unlinked_nodes_keep_creation_order() {
        let nodes = ids(3);
        assert_eq!(sort_nodes(&nodes, []), Some(nodes.clone()));
    }

    #[test]
    fn test_edges_reorder() {
        let n = ids(4);
        // 3 -> 0 -> 2, 1 unconstrained
        let sorted = sort_nodes(&n, [(n[3], n[0]), (n[0], n[2])]).unwrap();
        assert_eq!(sorted, vec![n[1], n[3], n[0], n[2]]);
    }

    #[test]
    fn test_duplicate_edges_counted_once() {
        let n = ids(2);
        let sorted = sort_nodes(&n, [(n[1], n[0]), (n[1], n[0])]).unwrap();
        assert_eq!(sorted, vec![n[1], n[0]]);
    }

    #[test]
    fn test_cycle_detected() {
        let n = ids(3);
        assert!(sort_nodes(&n, [(n[0], n[1]), (n[1], n[2]), (n[2], n[0])]).is_none());
    }
}
