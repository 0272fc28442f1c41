use super::*;

/// Verbosity accepted by `OVN_LOG_LEVEL` (ovn-controller, northd, nbdb, sbdb).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OvnLogLevel {
    Off,
    Emergency,
    Error,
    Warn,
    Info,
    #[default]
    Dbg,
}

impl OvnLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Emergency => "emer",
            Self::Error => "err",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Dbg => "dbg",
        }
    }
}

impl fmt::Display for OvnLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OvnLogLevel {
    type Err = EnvOverridesError;

    fn from_str(s: &str) -> Result<Self, EnvOverridesError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "emer" => Ok(Self::Emergency),
            "err" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "dbg" | "debug" => Ok(Self::Dbg),
            _ => Err(EnvOverridesError::InvalidOvnLogLevel(s.to_string())),
        }
    }
}

/// Levels written into every entry of the ConfigMap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevels {
    /// `OVN_KUBE_LOG_LEVEL`, klog verbosity of the ovnkube processes
    pub ovnkube: u8,
    /// `OVN_LOG_LEVEL`
    pub ovn: OvnLogLevel,
}

impl LogLevels {
    pub const DEFAULT_OVNKUBE: u8 = 5;

    pub fn new(ovnkube: u8, ovn: OvnLogLevel) -> Self {
        Self { ovnkube, ovn }
    }

    pub(crate) fn node_entry(&self) -> String {
        let Self { ovnkube, ovn } = self;
        format!(
            "# This sets the log level for the ovn-kubernetes node process:\n\
             OVN_KUBE_LOG_LEVEL={ovnkube}\n\
             # You might also/instead want to enable debug logging for ovn-controller:\n\
             OVN_LOG_LEVEL={ovn}\n"
        )
    }

    pub(crate) fn master_entry(&self) -> String {
        let Self { ovnkube, ovn } = self;
        format!(
            "# This sets the log level for the ovn-kubernetes master process as well as the ovn-dbchecker:\n\
             OVN_KUBE_LOG_LEVEL={ovnkube}\n\
             # You might also/instead want to enable debug logging for northd, nbdb and sbdb on all masters:\n\
             OVN_LOG_LEVEL={ovn}\n"
        )
    }
}

impl Default for LogLevels {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OVNKUBE, OvnLogLevel::default())
    }
}

impl fmt::Display for LogLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OVN_KUBE_LOG_LEVEL={},OVN_LOG_LEVEL={}",
            self.ovnkube, self.ovn
        )
    }
}
