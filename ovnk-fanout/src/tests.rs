use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::*;

/// Records invocations and fails (or panics) on selected nodes.
#[derive(Debug, Default)]
struct Recorder {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Recorder {
    fn failing(nodes: &[&str]) -> Self {
        Self {
            failing: nodes.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeAction for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn run(&self, node: &str) -> Result<String, NodeError> {
        self.calls.lock().unwrap().push(node.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(node) {
            panic!("recorder exploded on {node}");
        }
        if self.failing.contains(node) {
            Err(NodeError::failed("err"))
        } else {
            Ok("ok".to_string())
        }
    }

    fn plan(&self, node: &str) -> Vec<String> {
        vec![format!("recorder {node}")]
    }
}

fn nodes(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn workers(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("worker-{i}")).collect()
}

#[tokio::test]
async fn all_nodes_succeed() {
    let runner = FanoutRunner::new(FanoutConfig::sequential());
    let report = runner
        .run(&nodes(&["worker-a", "worker-b", "worker-c"]), Arc::new(Recorder::default()))
        .await
        .unwrap();
    assert_eq!(
        report.summary(),
        RunSummary {
            total: 3,
            succeeded: 3,
            failed: 0
        }
    );
    assert!(report.outcomes().iter().all(|outcome| outcome.status() == Some("ok")));
}

#[tokio::test]
async fn one_failing_node() {
    let runner = FanoutRunner::new(FanoutConfig::sequential());
    let report = runner
        .run(&nodes(&["worker-a", "worker-b", "worker-c"]), Arc::new(Recorder::failing(&["worker-b"])))
        .await
        .unwrap();
    assert_eq!(
        report.summary(),
        RunSummary {
            total: 3,
            succeeded: 2,
            failed: 1
        }
    );
    assert_eq!(report.failed_nodes(), ["worker-b"]);
    assert_eq!(report.succeeded_nodes(), ["worker-a", "worker-c"]);
}

#[tokio::test]
async fn sequential_preserves_input_order() {
    let order = nodes(&["worker-c", "worker-a", "worker-d", "worker-b"]);
    let recorder = Arc::new(Recorder::failing(&["worker-d"]));
    let runner = FanoutRunner::new(FanoutConfig::sequential());
    let report = runner.run(&order, Arc::clone(&recorder)).await.unwrap();

    let recorded = report
        .outcomes()
        .iter()
        .map(|outcome| outcome.node().to_string())
        .collect::<Vec<_>>();
    assert_eq!(recorded, order);
    assert_eq!(recorder.calls(), order);
}

#[tokio::test]
async fn failures_count_the_same_in_both_modes() {
    let all = workers(9);
    let failing = ["worker-1", "worker-4", "worker-8"];
    for config in [FanoutConfig::sequential(), FanoutConfig::parallel(5)] {
        let runner = FanoutRunner::new(config);
        let report = runner.run(&all, Arc::new(Recorder::failing(&failing))).await.unwrap();
        let summary = report.summary();
        assert_eq!(summary.total, 9);
        assert_eq!(summary.failed, failing.len());
        assert_eq!(summary.succeeded + summary.failed, summary.total);

        let mut failed = report.failed_nodes();
        failed.sort();
        assert_eq!(failed, failing);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_respects_concurrency_limit() {
    let recorder = Arc::new(Recorder::slow(Duration::from_millis(50)));
    let runner = FanoutRunner::new(FanoutConfig::parallel(5));
    let report = runner.run(&workers(12), Arc::clone(&recorder)).await.unwrap();

    assert_eq!(report.summary().total, 12);
    assert!(report.summary().all_succeeded());
    assert_eq!(recorder.calls().len(), 12);
    let max = recorder.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 5, "{max} actions were in flight");
    assert!(max > 1, "parallel run never overlapped");
}

#[tokio::test]
async fn parallel_outcomes_cover_every_node_once() {
    let all = workers(7);
    let runner = FanoutRunner::new(FanoutConfig::parallel(3));
    let report = runner.run(&all, Arc::new(Recorder::default())).await.unwrap();

    let mut seen = report
        .outcomes()
        .iter()
        .map(|outcome| outcome.node().to_string())
        .collect::<Vec<_>>();
    seen.sort();
    let mut expected = all.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn dry_run_never_invokes_action() {
    let recorder = Arc::new(Recorder::default());
    for config in [FanoutConfig::sequential(), FanoutConfig::parallel(5)] {
        let runner = FanoutRunner::new(config.dry_run(true));
        let report = runner
            .run(&nodes(&["worker-a", "worker-b", "worker-c"]), Arc::clone(&recorder))
            .await
            .unwrap();
        assert!(report.dry_run());
        assert_eq!(report.summary().total, 3);
        assert!(report.summary().all_succeeded());
    }
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn empty_node_set_is_refused() {
    let recorder = Arc::new(Recorder::default());
    let runner = FanoutRunner::new(FanoutConfig::parallel(5));
    let err = runner.run(&[], Arc::clone(&recorder)).await.unwrap_err();
    assert!(matches!(err, FanoutError::NoNodes));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn panicking_action_only_fails_its_node() {
    let recorder = Recorder {
        panicking: ["worker-b".to_string()].into(),
        ..Recorder::default()
    };
    let recorder = Arc::new(recorder);
    for config in [FanoutConfig::sequential(), FanoutConfig::parallel(5)] {
        let runner = FanoutRunner::new(config);
        let report = runner
            .run(&nodes(&["worker-a", "worker-b", "worker-c"]), Arc::clone(&recorder))
            .await
            .unwrap();
        assert_eq!(report.summary().failed, 1);
        let failed = report
            .outcomes()
            .iter()
            .find(|outcome| !outcome.success())
            .unwrap();
        assert_eq!(failed.node(), "worker-b");
        assert!(matches!(
            failed.error(),
            Some(NodeError::Panicked(message)) if message.contains("worker-b")
        ));
    }
}

#[test]
fn workers_are_bounded_by_node_count() {
    let config = FanoutConfig::parallel(5);
    assert_eq!(config.workers(12), 5);
    assert_eq!(config.workers(3), 3);
    assert_eq!(FanoutConfig::parallel(0).workers(3), 1);
}

#[test]
fn outcome_display() {
    let ok = NodeOutcome::new("worker-a", Ok("running".to_string()));
    let err = NodeOutcome::new(
        "worker-b",
        Err(NodeError::Timeout {
            command: "systemctl status RETIS".to_string(),
            after: Duration::from_secs(60),
        }),
    );
    assert_eq!(ok.to_string(), "✓ worker-a: running");
    assert_eq!(err.to_string(), "✗ worker-b: `systemctl status RETIS` timed out after 60s");
    assert!(err.error().is_some_and(NodeError::is_timeout));
}
