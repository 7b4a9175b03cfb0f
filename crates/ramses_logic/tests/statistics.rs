//! Periodic update statistics driven through the engine

use ramses_logic::{
    LogicEngine, LogicEngineConfig, PropertyDecl, PropertyType, ScriptDefinition,
    StatisticsLogLevel, StatisticsLogMode,
};
use ramses_scene::InMemoryScene;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn engine_with_rate(rate: usize, mode: StatisticsLogMode) -> LogicEngine<InMemoryScene> {
    let mut engine = LogicEngine::new(InMemoryScene::new());
    engine.set_statistics_logging_rate(rate, mode);
    engine
}

fn noop_script() -> ScriptDefinition {
    ScriptDefinition::new("noop", |_| Ok(()))
        .with_input(PropertyDecl::new("value", PropertyType::Int32))
}

#[test]
fn test_rate_one_logs_every_update() {
    let mut engine = engine_with_rate(1, StatisticsLogMode::Compact);
    engine.create_script(&noop_script(), "script");

    engine.update().unwrap();
    let lines = engine.last_statistics_log();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "First Statistics Log");
    assert!(lines[1].starts_with("Update Execution time (min/max/avg): "));
    assert_eq!(
        lines[2],
        "Time between Update calls cannot be measured with loggingRate = 1"
    );
    assert_eq!(
        lines[3],
        "Nodes Executed (min/max/avg): 100%/100%/100% (1/1/1) of 1 nodes total"
    );
    assert_eq!(lines[4], "Activated links (min/max/avg): 0/0/0");

    engine.update().unwrap();
    let lines = engine.last_statistics_log();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Time since last log: "));
    assert_eq!(
        lines[3],
        "Nodes Executed (min/max/avg): 0%/0%/0% (0/0/0) of 1 nodes total"
    );
}

#[test]
fn test_rate_zero_disables_statistics() {
    let mut engine = engine_with_rate(0, StatisticsLogMode::Detailed);
    engine.create_timer_node("timer");
    for _ in 0..3 {
        engine.update().unwrap();
        assert!(engine.last_statistics_log().is_empty());
    }
}

#[test]
fn test_rate_two_logs_every_second_update() {
    let mut engine = engine_with_rate(2, StatisticsLogMode::Compact);
    engine.create_timer_node("timer");

    engine.update().unwrap();
    assert!(engine.last_statistics_log().is_empty());

    engine.update().unwrap();
    let lines = engine.last_statistics_log();
    assert_eq!(lines.len(), 5);
    assert!(lines[2].starts_with("Time between Update calls (min/max/avg): "));
    assert_eq!(
        lines[3],
        "Nodes Executed (min/max/avg): 100%/100%/100% (1/1/1) of 1 nodes total"
    );

    engine.update().unwrap();
    assert!(engine.last_statistics_log().is_empty());
}

#[test]
fn test_detailed_mode_lists_slowest_nodes() {
    let mut engine = engine_with_rate(2, StatisticsLogMode::Detailed);
    engine.create_timer_node("timer");

    engine.update().unwrap();
    engine.update().unwrap();
    let lines = engine.last_statistics_log();
    assert_eq!(lines.len(), 6);
    assert!(lines[5].starts_with("Slowest nodes [name:time_us]: [timer:"));
}

#[test]
fn test_config_sets_rate_and_mode() {
    let config = LogicEngineConfig {
        statistics_logging_rate: 1,
        statistics_log_mode: StatisticsLogMode::Detailed,
        ..LogicEngineConfig::default()
    };
    let mut engine = LogicEngine::with_config(InMemoryScene::new(), &config);
    engine.create_timer_node("timer");
    engine.update().unwrap();
    assert_eq!(engine.last_statistics_log().len(), 6);
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_lines_are_emitted_at_configured_level() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let mut engine = engine_with_rate(1, StatisticsLogMode::Compact);
    engine.set_statistics_log_level(StatisticsLogLevel::Warn);
    tracing::subscriber::with_default(subscriber, || engine.update().unwrap());

    let output = capture.contents();
    let statistics_lines: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("ramses_logic::statistics"))
        .collect();
    assert_eq!(statistics_lines.len(), 5);
    assert!(statistics_lines.iter().all(|line| line.contains("WARN")));
    assert!(statistics_lines[0].ends_with("First Statistics Log"));
}
