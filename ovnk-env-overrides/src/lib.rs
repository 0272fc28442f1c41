//! The `env-overrides` ConfigMap read by the OVN-Kubernetes pods on startup.
//!
//! Every data key names a node and carries shell-style `KEY=value` lines that
//! are exported into that node's ovnkube containers. The reserved `_master`
//! key applies to the control plane components instead of a single node.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use constcat::concat;
use ovnk_ext as k8s;

use k8s::ConfigMapExt as _;
use k8s::ObjectMetaExt as _;
use k8s::PodExt as _;
use k8s::corev1;
use k8s::metav1;

pub use levels::LogLevels;
pub use levels::OvnLogLevel;
pub use nodes::affected_nodes;
pub use nodes::nodes_running_pods;
pub use overrides::EnvOverrides;

pub const ENV_OVERRIDES_NAME: &str = "env-overrides";
pub const OVN_KUBERNETES_NAMESPACE: &str = "openshift-ovn-kubernetes";
/// Data key holding the control plane settings. Never a node name.
pub const MASTER_KEY: &str = "_master";
pub const DEFAULT_POD_PATTERN: &str = "ovnkube-node";

pub const ANNOTATION_GROUP: &str = "ovnk.openshift.io";
pub const LOG_LEVELS_ANNOTATION: &str = concat!(ANNOTATION_GROUP, "/log-levels");

mod levels;
mod nodes;
mod overrides;

#[derive(Debug, thiserror::Error)]
pub enum EnvOverridesError {
    #[error("invalid OVN log level {0:?} (expected one of off, emer, err, warn, info, dbg)")]
    InvalidOvnLogLevel(String),
    #[error("pod name pattern must not be empty")]
    EmptyPodPattern,
    #[error("failed to render ConfigMap as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests;
