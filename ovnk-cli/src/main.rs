use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use ovnk_env_overrides as overrides;
use ovnk_ext as k8s;
use ovnk_fanout::DEFAULT_MAX_CONCURRENCY;
use ovnk_fanout::FanoutConfig;
use ovnk_fanout::RunReport;
use ovnk_kubeapi::KubeApi;
use ovnk_retis::OcDebug;
use ovnk_retis::SharedShell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use k8s::corev1;

mod log_debug;
mod retis;

type BoxError = Box<dyn Error + Send + Sync>;

const RULE: &str = "==================================================";

/// OVN-Kubernetes node tooling for OpenShift clusters
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Raise or restore the log levels of the OVN-Kubernetes components
    #[command(subcommand)]
    LogDebug(log_debug::LogDebug),
    /// Run RETIS packet collection on the debug-enabled nodes
    #[command(subcommand)]
    Retis(retis::Retis),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::LogDebug(command) => command.name(),
            Self::Retis(command) => command.name(),
        }
    }
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Path to the kubeconfig file. Without it the configuration is inferred
    /// from `KUBECONFIG`, `~/.kube/config` or the in-cluster service account.
    #[arg(long, short = 'k', global = true)]
    kubeconfig: Option<PathBuf>,

    /// Namespace holding the env-overrides ConfigMap
    #[arg(long, short = 'n', global = true, default_value = overrides::OVN_KUBERNETES_NAMESPACE)]
    namespace: String,

    /// OpenShift CLI used for `oc debug`
    #[arg(long, global = true, env = "OC", default_value = OcDebug::DEFAULT_PROGRAM)]
    oc: String,
}

impl GlobalArgs {
    async fn kube_api(&self) -> Result<KubeApi, BoxError> {
        let api = KubeApi::new(self.kubeconfig.as_deref()).await?;
        println!("Testing connection to Kubernetes cluster...");
        let version = api.check_connection().await.inspect_err(|err| {
            tracing::error!(%err, "Cluster is not reachable");
        })?;
        println!("✓ Successfully connected to Kubernetes cluster ({version}).");
        Ok(api)
    }

    fn shell(&self) -> SharedShell {
        let shell = OcDebug::new(&self.oc).with_kubeconfig(self.kubeconfig.clone());
        Arc::new(shell)
    }
}

/// How per-node actions are dispatched.
#[derive(Debug, Args)]
struct FanoutArgs {
    /// Run on several nodes at once instead of one after the other
    #[arg(long)]
    parallel: bool,

    /// Show what would be done without touching any node
    #[arg(long)]
    dry_run: bool,

    /// Nodes processed at the same time with --parallel
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,
}

impl FanoutArgs {
    fn config(&self) -> FanoutConfig {
        let config = if self.parallel {
            FanoutConfig::parallel(self.max_concurrency)
        } else {
            FanoutConfig::sequential()
        };
        config.dry_run(self.dry_run)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    init_tracing();
    tracing::info!(command = cli.command.name(), namespace = cli.global.namespace, "Starting ovnk");

    let success = match cli.command {
        Command::LogDebug(command) => command.run(&cli.global).await?,
        Command::Retis(command) => command.run(&cli.global).await?,
    };

    println!("Finished.");
    if success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses Go style durations such as `90s`, `5m` or `1m30s`.
fn parse_duration(text: &str) -> Result<Duration, String> {
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|err| format!("invalid duration {text:?}: {err:?}"))?;
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| format!("duration {text:?} must not be negative"))
}

/// Prints the summary block of a fan-out run and its closing line. Returns
/// whether every node succeeded.
fn print_summary(title: &str, action: &str, report: &RunReport) -> bool {
    let summary = report.summary();
    println!("\n{RULE}");
    println!("{title}");
    println!("{RULE}");
    println!("{summary}");

    let failed = report
        .outcomes()
        .iter()
        .filter(|outcome| !outcome.success())
        .collect::<Vec<_>>();
    if !failed.is_empty() {
        println!("\nFailed nodes:");
        for outcome in failed {
            println!("  {outcome}");
        }
    }

    if report.dry_run() {
        println!("\n[DRY RUN] No actual commands were executed.");
    } else if summary.all_succeeded() {
        println!("\n✓ {action} succeeded on all nodes!");
    } else if summary.all_failed() {
        println!("\n✗ {action} failed on all nodes.");
    } else {
        println!(
            "\n⚠ {action} succeeded on {}/{} nodes.",
            summary.succeeded, summary.total
        );
    }
    summary.all_succeeded()
}
