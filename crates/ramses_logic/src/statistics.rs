//! Periodic update statistics
//!
//! Aggregates update reports over a window of `logging_rate` updates and
//! emits one block of lines per window through `tracing` (target
//! `ramses_logic::statistics`). A rate of 0 disables collection.

use crate::node::NodeId;
use crate::report::UpdateReport;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const SLOWEST_NODE_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsLogMode {
    #[default]
    Compact,
    /// Adds the slowest nodes of the window, requires per node timing
    Detailed,
}

/// Level the statistics lines are emitted at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Clone, Copy, Debug, Default)]
struct MinMaxAvg {
    min: u64,
    max: u64,
    sum: u64,
    count: u64,
}

impl MinMaxAvg {
    fn add(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn avg(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

fn micros(duration: Duration) -> u64 {
    duration.as_micros().min(u64::MAX as u128) as u64
}

pub struct LogicNodeUpdateStatistics {
    logging_rate: usize,
    mode: StatisticsLogMode,
    level: StatisticsLogLevel,
    collected: usize,
    update_time: MinMaxAvg,
    time_between_updates: MinMaxAvg,
    nodes_executed: MinMaxAvg,
    links_activated: MinMaxAvg,
    node_count: usize,
    /// Longest execution per node, in first execution order
    slowest: IndexMap<NodeId, Duration>,
    last_collect: Option<Instant>,
    last_log: Option<Instant>,
}

impl LogicNodeUpdateStatistics {
    pub fn new(logging_rate: usize, mode: StatisticsLogMode, level: StatisticsLogLevel) -> Self {
        Self {
            logging_rate,
            mode,
            level,
            collected: 0,
            update_time: MinMaxAvg::default(),
            time_between_updates: MinMaxAvg::default(),
            nodes_executed: MinMaxAvg::default(),
            links_activated: MinMaxAvg::default(),
            node_count: 0,
            slowest: IndexMap::new(),
            last_collect: None,
            last_log: None,
        }
    }

    /// Change the window size and mode, discarding the current window
    pub fn set_logging_rate(&mut self, logging_rate: usize, mode: StatisticsLogMode) {
        self.logging_rate = logging_rate;
        self.mode = mode;
        self.reset_window();
    }

    pub fn set_log_level(&mut self, level: StatisticsLogLevel) {
        self.level = level;
    }

    pub fn logging_rate(&self) -> usize {
        self.logging_rate
    }

    pub fn mode(&self) -> StatisticsLogMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.logging_rate > 0
    }

    /// Whether the engine must time nodes individually
    pub fn needs_node_timing(&self) -> bool {
        self.is_enabled() && self.mode == StatisticsLogMode::Detailed
    }

    /// Add one update to the current window
    pub fn collect(&mut self, report: &UpdateReport, node_count: usize) {
        let now = Instant::now();
        if let Some(previous) = self.last_collect {
            self.time_between_updates.add(micros(now - previous));
        }
        self.last_collect = Some(now);

        self.update_time.add(micros(report.total_update_time()));
        self.nodes_executed.add(report.executed_count() as u64);
        self.links_activated.add(report.links_activated() as u64);
        self.node_count = node_count;

        if self.mode == StatisticsLogMode::Detailed {
            for &(node, duration) in report.nodes_executed() {
                let slowest = self.slowest.entry(node).or_insert(duration);
                *slowest = (*slowest).max(duration);
            }
        }
        self.collected += 1;
    }

    pub fn is_window_complete(&self) -> bool {
        self.is_enabled() && self.collected >= self.logging_rate
    }

    /// Build and emit the lines for the current window, then start a new one
    pub fn calculate_and_log(&mut self, node_name: impl Fn(NodeId) -> String) -> Vec<String> {
        let mut lines = Vec::with_capacity(6);
        let now = Instant::now();
        lines.push(match self.last_log {
            None => "First Statistics Log".to_string(),
            Some(last) => format!("Time since last log: {:.3}s", (now - last).as_secs_f64()),
        });

        let update = &self.update_time;
        lines.push(format!(
            "Update Execution time (min/max/avg): {}/{}/{} [u]sec",
            update.min,
            update.max,
            update.avg()
        ));

        let between = &self.time_between_updates;
        lines.push(if between.is_empty() {
            "Time between Update calls cannot be measured with loggingRate = 1".to_string()
        } else {
            format!(
                "Time between Update calls (min/max/avg): {}/{}/{} [u]sec",
                between.min,
                between.max,
                between.avg()
            )
        });

        let executed = &self.nodes_executed;
        let percent = |count: u64| match self.node_count {
            0 => 0,
            total => count * 100 / total as u64,
        };
        lines.push(format!(
            "Nodes Executed (min/max/avg): {}%/{}%/{}% ({}/{}/{}) of {} nodes total",
            percent(executed.min),
            percent(executed.max),
            percent(executed.avg()),
            executed.min,
            executed.max,
            executed.avg(),
            self.node_count
        ));

        let links = &self.links_activated;
        lines.push(format!(
            "Activated links (min/max/avg): {}/{}/{}",
            links.min,
            links.max,
            links.avg()
        ));

        if !self.slowest.is_empty() {
            let mut slowest: Vec<(NodeId, Duration)> =
                self.slowest.iter().map(|(&id, &d)| (id, d)).collect();
            slowest.sort_by(|a, b| b.1.cmp(&a.1));
            let entries: Vec<String> = slowest
                .iter()
                .take(SLOWEST_NODE_COUNT)
                .map(|&(id, duration)| format!("[{}:{}]", node_name(id), micros(duration)))
                .collect();
            lines.push(format!("Slowest nodes [name:time_us]: {}", entries.join(" ")));
        }

        for line in &lines {
            emit(self.level, line);
        }
        self.last_log = Some(now);
        self.reset_window();
        lines
    }

    fn reset_window(&mut self) {
        self.collected = 0;
        self.update_time = MinMaxAvg::default();
        self.time_between_updates = MinMaxAvg::default();
        self.nodes_executed = MinMaxAvg::default();
        self.links_activated = MinMaxAvg::default();
        self.slowest.clear();
        self.last_collect = None;
    }
}

impl Default for LogicNodeUpdateStatistics {
    fn default() -> Self {
        Self::new(60, StatisticsLogMode::default(), StatisticsLogLevel::default())
    }
}

fn emit(level: StatisticsLogLevel, line: &str) {
    match level {
        StatisticsLogLevel::Trace => tracing::trace!(target: "ramses_logic::statistics", "{}", line),
        StatisticsLogLevel::Debug => tracing::debug!(target: "ramses_logic::statistics", "{}", line),
        StatisticsLogLevel::Info => tracing::info!(target: "ramses_logic::statistics", "{}", line),
        StatisticsLogLevel::Warn => tracing::warn!(target: "ramses_logic::statistics", "{}", line),
        StatisticsLogLevel::Error => tracing::error!(target: "ramses_logic::statistics", "{}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn detailed() -> LogicNodeUpdateStatistics {
        LogicNodeUpdateStatistics::new(1, StatisticsLogMode::Detailed, StatisticsLogLevel::Info)
    }

    fn nodes(count: usize) -> (SlotMap<NodeId, String>, Vec<NodeId>) {
        let mut names = SlotMap::with_key();
        let ids = (0..count)
            .map(|i| names.insert(format!("test node{}", i)))
            .collect();
        (names, ids)
    }

    #[test]
    fn test_logs_with_no_node() {
        let mut statistics = detailed();
        statistics.collect(&UpdateReport::default(), 0);
        assert!(statistics.is_window_complete());

        let lines = statistics.calculate_and_log(|_| String::new());
        assert_eq!(
            lines,
            vec![
                "First Statistics Log",
                "Update Execution time (min/max/avg): 0/0/0 [u]sec",
                "Time between Update calls cannot be measured with loggingRate = 1",
                "Nodes Executed (min/max/avg): 0%/0%/0% (0/0/0) of 0 nodes total",
                "Activated links (min/max/avg): 0/0/0",
            ]
        );
    }

    #[test]
    fn test_slowest_nodes_sorted_with_stable_ties() {
        let (names, ids) = nodes(6);
        let mut report = UpdateReport::default();
        let times = [3, 10, 10, 1, 7, 10];
        report.nodes_executed = ids
            .iter()
            .zip(times)
            .map(|(&id, t)| (id, Duration::from_micros(t)))
            .collect();

        let mut statistics = detailed();
        statistics.collect(&report, ids.len());
        let lines = statistics.calculate_and_log(|id| names[id].clone());
        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[5],
            "Slowest nodes [name:time_us]: [test node1:10] [test node2:10] [test node5:10] [test node4:7] [test node0:3]"
        );
    }

    #[test]
    fn test_window_uses_max_per_node_and_measures_intervals() {
        let (names, ids) = nodes(2);
        let mut statistics =
            LogicNodeUpdateStatistics::new(3, StatisticsLogMode::Detailed, StatisticsLogLevel::Info);

        for (round, executed) in [(5u64, 1usize), (9, 2), (2, 0)].into_iter().enumerate() {
            let mut report = UpdateReport::default();
            report.nodes_executed = vec![(ids[round % 2], Duration::from_micros(executed.0))];
            report.executed_count = executed.1;
            report.links_activated = round;
            statistics.collect(&report, 4);
        }
        assert!(statistics.is_window_complete());

        let lines = statistics.calculate_and_log(|id| names[id].clone());
        assert!(lines[2].starts_with("Time between Update calls (min/max/avg): "));
        assert_eq!(
            lines[3],
            "Nodes Executed (min/max/avg): 0%/50%/25% (0/2/1) of 4 nodes total"
        );
        assert_eq!(lines[4], "Activated links (min/max/avg): 0/2/1");
        assert_eq!(
            lines[5],
            "Slowest nodes [name:time_us]: [test node1:9] [test node0:5]"
        );

        // next window starts from scratch
        assert!(!statistics.is_window_complete());
        statistics.collect(&UpdateReport::default(), 4);
        statistics.collect(&UpdateReport::default(), 4);
        statistics.collect(&UpdateReport::default(), 4);
        let lines = statistics.calculate_and_log(|id| names[id].clone());
        assert!(lines[0].starts_with("Time since last log: "));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_compact_mode_skips_slowest_nodes() {
        let (names, ids) = nodes(1);
        let mut report = UpdateReport::default();
        report.nodes_executed = vec![(ids[0], Duration::from_micros(3))];

        let mut statistics =
            LogicNodeUpdateStatistics::new(1, StatisticsLogMode::Compact, StatisticsLogLevel::Info);
        statistics.collect(&report, 1);
        assert_eq!(statistics.calculate_and_log(|id| names[id].clone()).len(), 5);
    }

    #[test]
    fn test_rate_zero_never_completes() {
        let mut statistics =
            LogicNodeUpdateStatistics::new(0, StatisticsLogMode::Compact, StatisticsLogLevel::Info);
        statistics.collect(&UpdateReport::default(), 0);
        assert!(!statistics.is_enabled());
        assert!(!statistics.is_window_complete());
    }
}
