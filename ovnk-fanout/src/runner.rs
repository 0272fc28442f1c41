use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FanoutConfig {
    /// Run nodes concurrently instead of one after the other.
    pub parallel: bool,
    /// Report what would run without invoking the action.
    pub dry_run: bool,
    /// Upper bound of actions in flight in parallel mode.
    pub max_concurrency: usize,
}

impl FanoutConfig {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn parallel(max_concurrency: usize) -> Self {
        Self {
            parallel: true,
            max_concurrency,
            ..Self::default()
        }
    }

    pub fn dry_run(self, dry_run: bool) -> Self {
        Self { dry_run, ..self }
    }

    /// Number of workers used for `nodes` nodes, at least one.
    pub fn workers(&self, nodes: usize) -> usize {
        self.max_concurrency.min(nodes).max(1)
    }
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            dry_run: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug)]
pub struct FanoutRunner {
    config: FanoutConfig,
}

impl FanoutRunner {
    pub fn new(config: FanoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> FanoutConfig {
        self.config
    }

    /// Runs `action` once per node.
    ///
    /// `nodes` are expected to be unique. An empty node set is refused before
    /// anything is dispatched.
    pub async fn run<A>(&self, nodes: &[String], action: Arc<A>) -> Result<RunReport, FanoutError>
    where
        A: NodeAction + 'static,
    {
        if nodes.is_empty() {
            tracing::warn!(action = action.name(), "No nodes to run on");
            return Err(FanoutError::NoNodes);
        }

        let FanoutConfig {
            parallel, dry_run, ..
        } = self.config;
        tracing::info!(
            action = action.name(),
            nodes = nodes.len(),
            parallel,
            dry_run,
            "Starting fan-out"
        );

        let outcomes = if dry_run {
            self.plan(nodes, action.as_ref())
        } else if parallel {
            self.run_parallel(nodes, action).await
        } else {
            self.run_sequential(nodes, action).await
        };

        let report = RunReport::new(outcomes, dry_run);
        let summary = report.summary();
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Fan-out finished"
        );
        Ok(report)
    }

    fn plan<A>(&self, nodes: &[String], action: &A) -> Vec<NodeOutcome>
    where
        A: NodeAction,
    {
        let total = nodes.len();
        nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                println!("\n--- {} on node {}/{total}: {node} ---", action.name(), index + 1);
                for step in action.plan(node) {
                    println!("[DRY RUN] Would run: {step}");
                }
                let outcome = NodeOutcome::new(node, Ok(format!("would {}", action.name())));
                println!("{outcome}");
                outcome
            })
            .collect()
    }

    async fn run_sequential<A>(&self, nodes: &[String], action: Arc<A>) -> Vec<NodeOutcome>
    where
        A: NodeAction + 'static,
    {
        let total = nodes.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, node) in nodes.iter().enumerate() {
            println!("\n--- {} on node {}/{total}: {node} ---", action.name(), index + 1);
            // Spawned so that a panic stays contained like in parallel mode
            let task = tokio::spawn({
                let action = Arc::clone(&action);
                let node = node.clone();
                async move { action.run(&node).await }
            });
            let result = task.await.unwrap_or_else(|err| Err(err.into()));
            let outcome = record(node, result);
            println!("{outcome}");
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run_parallel<A>(&self, nodes: &[String], action: Arc<A>) -> Vec<NodeOutcome>
    where
        A: NodeAction + 'static,
    {
        let total = nodes.len();
        let workers = self.config.workers(total);
        println!(
            "\nRunning {} on {total} nodes with {workers} workers...",
            action.name()
        );

        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(total);
        for node in nodes {
            let action = Arc::clone(&action);
            let permits = Arc::clone(&permits);
            let handle = tasks.spawn({
                let node = node.clone();
                async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| NodeError::failed("worker pool closed"))?;
                    action.run(&node).await
                }
            });
            pending.insert(handle.id(), node.clone());
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(err) => (err.id(), Err(err.into())),
            };
            let node = pending.remove(&id).unwrap_or_default();
            let outcome = record(&node, result);
            println!("[{}/{total}] {outcome}", outcomes.len() + 1);
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn record(node: &str, result: Result<String, NodeError>) -> NodeOutcome {
    match &result {
        Ok(status) => tracing::debug!(node, status, "Node action succeeded"),
        Err(err) if err.is_timeout() => tracing::warn!(node, %err, "Node action timed out"),
        Err(err) => tracing::error!(node, %err, "Node action failed"),
    }
    NodeOutcome::new(node, result)
}
