use super::*;

/// Result of running an action on one node. Never changes once recorded.
#[derive(Debug)]
pub struct NodeOutcome {
    node: String,
    result: Result<String, NodeError>,
}

impl NodeOutcome {
    pub fn new(node: impl ToString, result: Result<String, NodeError>) -> Self {
        let node = node.to_string();
        Self { node, result }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// Status text reported by a successful action.
    pub fn status(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&NodeError> {
        self.result.as_ref().err()
    }
}

impl fmt::Display for NodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(status) if status.is_empty() => write!(f, "✓ {}", self.node),
            Ok(status) => write!(f, "✓ {}: {status}", self.node),
            Err(err) => write!(f, "✗ {}: {err}", self.node),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a NodeOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |summary, outcome| Self {
                total: summary.total + 1,
                succeeded: summary.succeeded + usize::from(outcome.success()),
                failed: summary.failed + usize::from(!outcome.success()),
            })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total nodes: {}", self.total)?;
        writeln!(f, "Successful: {}", self.succeeded)?;
        write!(f, "Failed: {}", self.failed)
    }
}

/// Everything a fan-out run produced.
///
/// Outcomes are in input order for sequential runs and in completion order
/// for parallel ones.
#[derive(Debug)]
pub struct RunReport {
    outcomes: Vec<NodeOutcome>,
    dry_run: bool,
}

impl RunReport {
    pub(crate) fn new(outcomes: Vec<NodeOutcome>, dry_run: bool) -> Self {
        Self { outcomes, dry_run }
    }

    pub fn outcomes(&self) -> &[NodeOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_outcomes(&self.outcomes)
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn succeeded_nodes(&self) -> Vec<String> {
        self.nodes_where(true)
    }

    pub fn failed_nodes(&self) -> Vec<String> {
        self.nodes_where(false)
    }

    fn nodes_where(&self, success: bool) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.success() == success)
            .map(|outcome| outcome.node.clone())
            .collect()
    }
}
