use ovnk_env_overrides::EnvOverrides;
use ovnk_env_overrides::LogLevels;
use ovnk_env_overrides::OvnLogLevel;
use ovnk_kubeapi::Applied;

use super::*;

#[derive(Debug, Subcommand)]
pub(crate) enum LogDebug {
    /// Write the env-overrides ConfigMap enabling debug logging on the nodes
    Apply(ApplyArgs),
    /// Delete the env-overrides ConfigMap, restoring the default log levels
    Revert(RevertArgs),
    /// Show which nodes currently have their log levels overridden
    Show,
}

#[derive(Debug, Args)]
pub(crate) struct ApplyArgs {
    /// Select the nodes running a pod whose name contains this pattern
    #[arg(long, short = 'p', default_value = overrides::DEFAULT_POD_PATTERN)]
    pod_pattern: String,

    /// Include every node of the cluster, ignoring --pod-pattern
    #[arg(long, short = 'a')]
    all_nodes: bool,

    /// Print the generated ConfigMap
    #[arg(long)]
    show_yaml: bool,

    /// Verbosity of the ovnkube processes (OVN_KUBE_LOG_LEVEL)
    #[arg(long, default_value_t = LogLevels::DEFAULT_OVNKUBE)]
    ovnkube_log_level: u8,

    /// Level of the OVN daemons (OVN_LOG_LEVEL): off, emer, err, warn, info or dbg
    #[arg(long, default_value_t)]
    ovn_log_level: OvnLogLevel,

    /// Print the ConfigMap instead of applying it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
pub(crate) struct RevertArgs {
    /// Only report which nodes would be reverted
    #[arg(long)]
    dry_run: bool,
}

impl LogDebug {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Apply(_) => "log-debug apply",
            Self::Revert(_) => "log-debug revert",
            Self::Show => "log-debug show",
        }
    }

    pub(crate) async fn run(self, global: &GlobalArgs) -> Result<bool, BoxError> {
        let api = global.kube_api().await?;
        match self {
            Self::Apply(args) => args.run(&api, &global.namespace).await,
            Self::Revert(args) => args.run(&api, &global.namespace).await,
            Self::Show => show(&api, &global.namespace).await,
        }
    }
}

impl ApplyArgs {
    fn levels(&self) -> LogLevels {
        LogLevels::new(self.ovnkube_log_level, self.ovn_log_level)
    }

    async fn select_nodes(&self, api: &KubeApi) -> Result<Vec<String>, BoxError> {
        if self.all_nodes {
            println!("Selecting all nodes of the cluster...");
            return Ok(api.list_node_names().await?);
        }

        println!("Selecting nodes running pods matching '{}'...", self.pod_pattern);
        let pods = api.list_pods().await?;
        let nodes = overrides::nodes_running_pods(&pods, &self.pod_pattern)?;
        Ok(nodes.into_iter().collect())
    }

    pub(crate) async fn run(self, api: &KubeApi, namespace: &str) -> Result<bool, BoxError> {
        let nodes = self.select_nodes(api).await?;
        if nodes.is_empty() {
            println!(
                "No node names were found based on the filter criteria. Cannot create ConfigMap."
            );
            return Ok(false);
        }

        let env_overrides = EnvOverrides::new(nodes, self.levels());
        if env_overrides.nodes().next().is_none() {
            tracing::info!(
                "Only control plane nodes selected, writing the {} entry alone",
                overrides::MASTER_KEY
            );
        }

        if self.show_yaml || self.dry_run {
            println!("\nGenerated ConfigMap YAML:");
            println!("{RULE}");
            print!("{}", env_overrides.to_yaml(namespace)?);
            println!("{RULE}");
        }

        if self.dry_run {
            println!("\n[DRY RUN] ConfigMap {} was not applied.", overrides::ENV_OVERRIDES_NAME);
            print_nodes("Nodes that would be affected", env_overrides.nodes());
            return Ok(true);
        }

        if api.ensure_namespace(namespace).await? {
            println!("Created namespace '{namespace}'.");
        }

        println!("Applying ConfigMap to namespace '{namespace}'...");
        let config_map = env_overrides.to_config_map(namespace);
        let applied = match api.apply_config_map(&config_map).await? {
            Applied::Created => "created",
            Applied::Replaced => "replaced",
        };
        println!("✓ ConfigMap {} {applied}.", overrides::ENV_OVERRIDES_NAME);
        println!("Log levels: {}", env_overrides.levels());
        print_nodes("Affected nodes", env_overrides.nodes());
        Ok(true)
    }
}

impl RevertArgs {
    pub(crate) async fn run(self, api: &KubeApi, namespace: &str) -> Result<bool, BoxError> {
        let Some(config_map) = api
            .get_config_map(namespace, overrides::ENV_OVERRIDES_NAME)
            .await?
        else {
            println!(
                "ConfigMap {} not found in namespace '{namespace}', nothing to revert.",
                overrides::ENV_OVERRIDES_NAME
            );
            return Ok(true);
        };

        let nodes = overrides::affected_nodes(&config_map);
        if self.dry_run {
            println!("\n[DRY RUN] ConfigMap {} was not deleted.", overrides::ENV_OVERRIDES_NAME);
            print_nodes("Nodes that would be reverted", nodes.iter().map(String::as_str));
            return Ok(true);
        }

        api.delete_config_map(namespace, overrides::ENV_OVERRIDES_NAME)
            .await?;
        println!("✓ ConfigMap {} deleted.", overrides::ENV_OVERRIDES_NAME);
        print_nodes("Reverted nodes", nodes.iter().map(String::as_str));
        Ok(true)
    }
}

async fn show(api: &KubeApi, namespace: &str) -> Result<bool, BoxError> {
    let Some(config_map) = api
        .get_config_map(namespace, overrides::ENV_OVERRIDES_NAME)
        .await?
    else {
        println!(
            "ConfigMap {} not found in namespace '{namespace}', log levels are not overridden.",
            overrides::ENV_OVERRIDES_NAME
        );
        return Ok(true);
    };

    if let Some(levels) = log_levels(&config_map) {
        println!("Log levels: {levels}");
    }
    let nodes = overrides::affected_nodes(&config_map);
    print_nodes("Nodes with overridden log levels", nodes.iter().map(String::as_str));
    Ok(true)
}

fn log_levels(config_map: &corev1::ConfigMap) -> Option<&str> {
    config_map
        .metadata
        .annotations
        .as_ref()?
        .get(overrides::LOG_LEVELS_ANNOTATION)
        .map(String::as_str)
}

fn print_nodes<'a>(title: &str, nodes: impl Iterator<Item = &'a str>) {
    println!("{title}:");
    for node in nodes {
        println!("  - {node}");
    }
}
