use super::*;

fn argv<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.map(ToString::to_string).into()
}

/// Makes sure the helper script is present and executable in the working
/// directory of every node.
#[derive(Debug)]
pub struct SetupScript {
    shell: SharedShell,
    config: RetisConfig,
    timeouts: Timeouts,
    /// Missing in dry runs, where nothing gets installed
    script: Option<RetisScript>,
}

impl SetupScript {
    pub fn new(
        shell: SharedShell,
        config: RetisConfig,
        timeouts: Timeouts,
        script: Option<RetisScript>,
    ) -> Self {
        Self {
            shell,
            config,
            timeouts,
            script,
        }
    }

    fn list_script(&self) -> Vec<String> {
        argv(["ls", "-la", self.config.script_path().as_str()])
    }

    async fn exec(&self, node: &str, argv: Vec<String>) -> Result<CommandOutput, NodeError> {
        self.shell.exec(node, &argv, self.timeouts.command).await
    }

    async fn install(&self, node: &str) -> Result<(), NodeError> {
        let script = self
            .script
            .as_ref()
            .ok_or_else(|| NodeError::failed("script contents are not available"))?;
        let install =
            script.install_command(&self.config.working_directory, &self.config.script_path());
        tracing::info!(node, path = self.config.script_path(), "Copying script to node");
        self.exec(node, argv(["sh", "-c", install.as_str()]))
            .await?
            .check("script install")?;
        Ok(())
    }
}

#[async_trait]
impl NodeAction for SetupScript {
    fn name(&self) -> &str {
        "set up RETIS script"
    }

    async fn run(&self, node: &str) -> Result<String, NodeError> {
        let listing = self.exec(node, self.list_script()).await?;
        let entry = listing.stdout.trim();
        let exists = listing.success() && !entry.is_empty();

        if exists && is_executable(entry) {
            return Ok(format!("script already installed: {entry}"));
        }

        if exists {
            tracing::warn!(node, "Script exists but is not executable");
            let chmod = argv(["chmod", "a+x", self.config.script_path().as_str()]);
            self.exec(node, chmod).await?.check("chmod")?;
        } else {
            self.install(node).await?;
        }

        let verified = self
            .exec(node, self.list_script())
            .await?
            .check("script verification")?;
        Ok(format!("script installed: {}", verified.stdout.trim()))
    }

    fn plan(&self, node: &str) -> Vec<String> {
        let path = self.config.script_path();
        vec![
            self.shell.command_line(node, &self.list_script()),
            format!("create {} on {node} if needed", self.config.working_directory),
            format!("copy {SCRIPT_NAME} to {node}:{path} if needed"),
            format!("set executable permissions on {path} if needed"),
        ]
    }
}

/// The permission column of an `ls -la` line grants execute to someone.
fn is_executable(entry: &str) -> bool {
    entry
        .split_whitespace()
        .next()
        .is_some_and(|permissions| permissions.contains('x'))
}

/// Starts `retis collect` in a transient systemd unit, then checks the unit.
#[derive(Debug)]
pub struct StartCollection {
    shell: SharedShell,
    config: RetisConfig,
    timeouts: Timeouts,
}

impl StartCollection {
    pub fn new(shell: SharedShell, config: RetisConfig, timeouts: Timeouts) -> Self {
        Self {
            shell,
            config,
            timeouts,
        }
    }

    /// The `sh -c` payload run by the unit.
    pub fn collect_command(&self) -> String {
        let RetisConfig {
            image,
            filter,
            output_file,
            ..
        } = &self.config;
        format!(
            "export RETIS_IMAGE={}; {} collect -o {} --allow-system-changes --ovs-track --stack --probe-stack --filter-packet {}",
            escape(image),
            escape(&self.config.script_path()),
            escape(output_file),
            escape(filter),
        )
    }

    fn systemd_run(&self) -> Vec<String> {
        let unit = format!("--unit={}", self.config.unit);
        let working_directory = format!("--working-directory={}", self.config.working_directory);
        argv([
            "systemd-run",
            unit.as_str(),
            working_directory.as_str(),
            "sh",
            "-c",
            self.collect_command().as_str(),
        ])
    }
}

#[async_trait]
impl NodeAction for StartCollection {
    fn name(&self) -> &str {
        "start RETIS"
    }

    async fn run(&self, node: &str) -> Result<String, NodeError> {
        tracing::info!(node, image = self.config.image, "Starting RETIS collection");
        let started = self
            .shell
            .exec(node, &self.systemd_run(), self.timeouts.collect)
            .await?
            .check("RETIS collection command")?;
        if !started.stdout.trim().is_empty() {
            tracing::debug!(node, output = started.stdout.trim(), "systemd-run output");
        }

        let state = unit_state(&*self.shell, node, &self.config.unit, self.timeouts.status).await?;
        match state {
            state if state.is_healthy() => Ok(format!("RETIS unit {state}")),
            UnitState::Unknown => Err(NodeError::failed("RETIS unit status unclear")),
            state => Err(NodeError::failed(format!("RETIS unit {state}"))),
        }
    }

    fn plan(&self, node: &str) -> Vec<String> {
        vec![
            self.shell.command_line(node, &self.systemd_run()),
            self.shell.command_line(node, &status_argv(&self.config.unit)),
        ]
    }
}

/// Stops the collection unit.
#[derive(Debug)]
pub struct StopCollection {
    shell: SharedShell,
    unit: String,
    timeouts: Timeouts,
}

impl StopCollection {
    pub fn new(shell: SharedShell, unit: impl ToString, timeouts: Timeouts) -> Self {
        let unit = unit.to_string();
        Self {
            shell,
            unit,
            timeouts,
        }
    }

    fn stop_argv(&self) -> Vec<String> {
        argv(["systemctl", "stop", self.unit.as_str()])
    }
}

#[async_trait]
impl NodeAction for StopCollection {
    fn name(&self) -> &str {
        "stop RETIS"
    }

    async fn run(&self, node: &str) -> Result<String, NodeError> {
        let stopped = self
            .shell
            .exec(node, &self.stop_argv(), self.timeouts.stop)
            .await?
            .check("RETIS stop command")?;
        let output = stopped.stdout.trim();
        if output.is_empty() {
            Ok(format!("{} unit stopped", self.unit))
        } else {
            Ok(format!("{} unit stopped: {output}", self.unit))
        }
    }

    fn plan(&self, node: &str) -> Vec<String> {
        vec![self.shell.command_line(node, &self.stop_argv())]
    }
}

/// Reports the collection unit state. Running and cleanly completed units
/// count as success.
#[derive(Debug)]
pub struct CollectionStatus {
    shell: SharedShell,
    unit: String,
    timeouts: Timeouts,
}

impl CollectionStatus {
    pub fn new(shell: SharedShell, unit: impl ToString, timeouts: Timeouts) -> Self {
        let unit = unit.to_string();
        Self {
            shell,
            unit,
            timeouts,
        }
    }
}

#[async_trait]
impl NodeAction for CollectionStatus {
    fn name(&self) -> &str {
        "check RETIS"
    }

    async fn run(&self, node: &str) -> Result<String, NodeError> {
        let state = unit_state(&*self.shell, node, &self.unit, self.timeouts.status).await?;
        if state.is_healthy() {
            Ok(format!("{} unit {state}", self.unit))
        } else {
            Err(NodeError::failed(format!("{} unit {state}", self.unit)))
        }
    }

    fn plan(&self, node: &str) -> Vec<String> {
        vec![self.shell.command_line(node, &status_argv(&self.unit))]
    }
}

fn status_argv(unit: &str) -> Vec<String> {
    argv(["systemctl", "status", unit])
}

/// `systemctl status` exits non-zero for inactive units, so only the output
/// is looked at.
async fn unit_state(
    shell: &dyn RemoteShell,
    node: &str,
    unit: &str,
    timeout: Duration,
) -> Result<UnitState, NodeError> {
    let status = shell.exec(node, &status_argv(unit), timeout).await?;
    if !status.stderr.trim().is_empty() {
        tracing::debug!(node, stderr = status.stderr.trim(), "systemctl status stderr");
    }
    let state = UnitState::parse(&status.stdout);
    tracing::info!(node, unit, %state, "RETIS unit state");
    Ok(state)
}
