//! Update report
//!
//! Ordered log of one [`LogicEngine::update`](crate::LogicEngine::update):
//! which nodes ran and how long they took, which were skipped, how many
//! links were activated and how long sorting and the whole update took.

use crate::node::NodeId;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateReport {
    pub(crate) nodes_executed: Vec<(NodeId, Duration)>,
    pub(crate) nodes_skipped: Vec<NodeId>,
    pub(crate) topology_sort_time: Duration,
    pub(crate) total_update_time: Duration,
    pub(crate) links_activated: usize,
    pub(crate) executed_count: usize,
}

impl UpdateReport {
    /// Executed nodes with their execution time, in execution order
    pub fn nodes_executed(&self) -> &[(NodeId, Duration)] {
        &self.nodes_executed
    }

    /// Nodes that were not dirty, in execution order
    pub fn nodes_skipped(&self) -> &[NodeId] {
        &self.nodes_skipped
    }

    pub fn topology_sort_time(&self) -> Duration {
        self.topology_sort_time
    }

    pub fn total_update_time(&self) -> Duration {
        self.total_update_time
    }

    /// Links whose target value changed
    pub fn links_activated(&self) -> usize {
        self.links_activated
    }

    /// Number of executed nodes, counted even when details are not collected
    pub fn executed_count(&self) -> usize {
        self.executed_count
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
