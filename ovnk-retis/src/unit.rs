use super::*;

/// State of the RETIS systemd unit as reported by `systemctl status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
    Unknown,
}

impl UnitState {
    /// Best-effort reading of `systemctl status` output.
    pub fn parse(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("failed") {
            Self::Failed
        } else if status.contains("active: active") {
            Self::Running
        } else if status.contains("active: inactive") && status.contains("exited") {
            if status.contains("code=exited, status=0") {
                Self::Completed
            } else {
                Self::CompletedWithErrors
            }
        } else {
            Self::Unknown
        }
    }

    /// Running or finished cleanly.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Running | Self::Completed)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Running => "running",
            Self::Completed => "completed successfully",
            Self::CompletedWithErrors => "completed with errors",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}
