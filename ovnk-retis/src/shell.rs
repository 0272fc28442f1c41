use super::*;

/// Exit status and captured output of a remote command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turns a non-zero exit into a [`NodeError`] describing `what` failed.
    pub fn check(self, what: &str) -> Result<Self, NodeError> {
        if self.success() {
            return Ok(self);
        }

        let code = self
            .code
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        let detail = self.stderr.trim();
        let message = if detail.is_empty() {
            format!("{what} failed (exit code: {code})")
        } else {
            format!("{what} failed (exit code: {code}): {detail}")
        };
        Err(NodeError::Failed(message))
    }
}

/// Runs commands on a node's host.
#[async_trait]
pub trait RemoteShell: Send + Sync + fmt::Debug {
    /// Runs `argv` on `node`. A non-zero exit is still `Ok`, errors are
    /// reserved for commands that could not run or did not finish in time.
    async fn exec(
        &self,
        node: &str,
        argv: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, NodeError>;

    /// The full local command line used for `argv` on `node`.
    fn command_line(&self, node: &str, argv: &[String]) -> String;
}

/// `oc debug node/<node> -- chroot /host <argv>`
#[derive(Clone, Debug)]
pub struct OcDebug {
    program: String,
    kubeconfig: Option<PathBuf>,
}

impl OcDebug {
    pub const DEFAULT_PROGRAM: &str = "oc";

    pub fn new(program: impl ToString) -> Self {
        let program = program.to_string();
        let kubeconfig = None;
        Self {
            program,
            kubeconfig,
        }
    }

    pub fn with_kubeconfig(self, kubeconfig: Option<PathBuf>) -> Self {
        Self { kubeconfig, ..self }
    }

    fn args(&self, node: &str, argv: &[String]) -> Vec<String> {
        let kubeconfig = self
            .kubeconfig
            .iter()
            .flat_map(|path| ["--kubeconfig".to_string(), path.display().to_string()]);
        let debug = [
            "debug".to_string(),
            format!("node/{node}"),
            "--".to_string(),
            "chroot".to_string(),
            "/host".to_string(),
        ];
        kubeconfig
            .chain(debug)
            .chain(argv.iter().cloned())
            .collect()
    }
}

impl Default for OcDebug {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl RemoteShell for OcDebug {
    async fn exec(
        &self,
        node: &str,
        argv: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, NodeError> {
        let command_line = self.command_line(node, argv);
        tracing::debug!(node, command = %command_line, ?timeout, "Running remote command");

        let mut command = Command::new(&self.program);
        command
            .args(self.args(node, argv))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| NodeError::Timeout {
                command: command_line.clone(),
                after: timeout,
            })?
            .map_err(|source| NodeError::Spawn {
                command: command_line,
                source,
            })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(node, code = ?output.code, "Remote command finished");
        Ok(output)
    }

    fn command_line(&self, node: &str, argv: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args(node, argv).iter().map(String::as_str))
            .map(escape)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
