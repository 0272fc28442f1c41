//! Node task fan-out.
//!
//! [`FanoutRunner`] dispatches one [`NodeAction`] over a set of nodes, either
//! one node after the other or with a bounded number of actions in flight,
//! and gathers a [`NodeOutcome`] per node. A failing (or panicking) action
//! only affects its own node; nothing is retried.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::task::JoinSet;

pub use outcome::NodeOutcome;
pub use outcome::RunReport;
pub use outcome::RunSummary;
pub use runner::FanoutConfig;
pub use runner::FanoutRunner;

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

mod outcome;
mod runner;

/// The per-node work driven by [`FanoutRunner`].
#[async_trait]
pub trait NodeAction: Send + Sync {
    /// Short label used in progress lines, e.g. `stop RETIS`.
    fn name(&self) -> &str;

    /// Performs the action on `node`, returning human readable status text.
    async fn run(&self, node: &str) -> Result<String, NodeError>;

    /// Describes what [`NodeAction::run`] would do on `node`. Reported
    /// instead of running the action in dry-run mode.
    fn plan(&self, node: &str) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("{0}")]
    Failed(String),
    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("action panicked: {0}")]
    Panicked(String),
}

impl NodeError {
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<JoinError> for NodeError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            let panic = err.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Self::Panicked(message)
        } else {
            Self::Failed(err.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("no nodes to run on")]
    NoNodes,
}

#[cfg(test)]
mod tests;
