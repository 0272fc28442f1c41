//! RETIS packet captures on cluster nodes.
//!
//! Every node command goes through a [`RemoteShell`]; in production that is
//! [`OcDebug`], which runs `oc debug node/<node> -- chroot /host <command>`.
//! The node actions implement [`ovnk_fanout::NodeAction`] so they can be
//! fanned out over the nodes listed in the `env-overrides` ConfigMap.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use constcat::concat;
use ovnk_fanout::NodeAction;
use ovnk_fanout::NodeError;
use time::ext::NumericalStdDuration as _;
use tokio::process::Command;

pub use actions::CollectionStatus;
pub use actions::SetupScript;
pub use actions::StartCollection;
pub use actions::StopCollection;
pub use script::RetisScript;
pub use shell::CommandOutput;
pub use shell::OcDebug;
pub use shell::RemoteShell;
pub use unit::UnitState;

pub const SCRIPT_NAME: &str = "retis_in_container.sh";
pub const RETIS_RAW_BASE_URL: &str = "https://raw.githubusercontent.com/retis-org/retis/main";
pub const SCRIPT_URL: &str = concat!(RETIS_RAW_BASE_URL, "/tools/", SCRIPT_NAME);

pub const DEFAULT_IMAGE: &str = "image-registry.openshift-image-registry.svc:5000/default/retis";
pub const DEFAULT_WORKING_DIRECTORY: &str = "/var/tmp";
pub const DEFAULT_FILTER: &str = "tcp port 8080 or tcp port 8081";
pub const DEFAULT_OUTPUT_FILE: &str = "events.json";
pub const DEFAULT_UNIT: &str = "RETIS";

mod actions;
mod script;
mod shell;
mod unit;

pub type SharedShell = Arc<dyn RemoteShell>;

/// Where and how RETIS runs on the nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetisConfig {
    pub image: String,
    pub working_directory: String,
    /// Packet filter handed to `retis collect --filter-packet`
    pub filter: String,
    pub output_file: String,
    /// Name of the transient systemd unit running the collection
    pub unit: String,
}

impl RetisConfig {
    pub fn script_path(&self) -> String {
        let directory = self.working_directory.trim_end_matches('/');
        format!("{directory}/{SCRIPT_NAME}")
    }
}

impl Default for RetisConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            working_directory: DEFAULT_WORKING_DIRECTORY.to_string(),
            filter: DEFAULT_FILTER.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            unit: DEFAULT_UNIT.to_string(),
        }
    }
}

/// Per-call limits for remote commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Setup commands (`ls`, `chmod`, script install)
    pub command: Duration,
    pub stop: Duration,
    pub status: Duration,
    /// Starting the collection unit
    pub collect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: 30.std_seconds(),
            stop: 60.std_seconds(),
            status: 60.std_seconds(),
            collect: 300.std_seconds(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("script downloaded from {url} is empty")]
    Empty { url: String },
}

fn escape(arg: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(arg))
}
