use ovnk_fanout::FanoutRunner;
use ovnk_retis::CollectionStatus;
use ovnk_retis::RetisConfig;
use ovnk_retis::RetisScript;
use ovnk_retis::SetupScript;
use ovnk_retis::StartCollection;
use ovnk_retis::StopCollection;
use ovnk_retis::Timeouts;

use super::*;

#[derive(Debug, Subcommand)]
pub(crate) enum Retis {
    /// Install the helper script and start collecting on every node
    Start(StartArgs),
    /// Stop the collection unit on every node
    Stop(NodeArgs),
    /// Report the state of the collection unit on every node
    Status(NodeArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    /// Container image used by retis_in_container.sh
    #[arg(long, default_value = ovnk_retis::DEFAULT_IMAGE)]
    retis_image: String,

    /// Directory on the node holding the script and the collected events
    #[arg(long, default_value = ovnk_retis::DEFAULT_WORKING_DIRECTORY)]
    working_directory: String,

    /// Packet filter passed to `retis collect --filter-packet`
    #[arg(long, default_value = ovnk_retis::DEFAULT_FILTER)]
    filter: String,

    /// Where retis_in_container.sh is downloaded from
    #[arg(long, default_value = ovnk_retis::SCRIPT_URL)]
    script_url: String,

    #[command(flatten)]
    nodes: NodeArgs,
}

/// Dispatch and timeout options shared by every RETIS command.
#[derive(Debug, Args)]
pub(crate) struct NodeArgs {
    #[command(flatten)]
    fanout: FanoutArgs,

    #[command(flatten)]
    timeouts: TimeoutArgs,
}

#[derive(Debug, Args)]
pub(crate) struct TimeoutArgs {
    /// Limit for each setup command [default: 30s]
    #[arg(long, value_parser = parse_duration)]
    command_timeout: Option<Duration>,

    /// Limit for stopping the unit [default: 1m]
    #[arg(long, value_parser = parse_duration)]
    stop_timeout: Option<Duration>,

    /// Limit for querying the unit state [default: 1m]
    #[arg(long, value_parser = parse_duration)]
    status_timeout: Option<Duration>,

    /// Limit for starting the collection [default: 5m]
    #[arg(long, value_parser = parse_duration)]
    collect_timeout: Option<Duration>,
}

impl TimeoutArgs {
    fn timeouts(&self) -> Timeouts {
        let defaults = Timeouts::default();
        Timeouts {
            command: self.command_timeout.unwrap_or(defaults.command),
            stop: self.stop_timeout.unwrap_or(defaults.stop),
            status: self.status_timeout.unwrap_or(defaults.status),
            collect: self.collect_timeout.unwrap_or(defaults.collect),
        }
    }
}

impl Retis {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "retis start",
            Self::Stop(_) => "retis stop",
            Self::Status(_) => "retis status",
        }
    }

    pub(crate) async fn run(self, global: &GlobalArgs) -> Result<bool, BoxError> {
        let api = global.kube_api().await?;
        let nodes = debug_nodes(&api, &global.namespace).await?;
        if nodes.is_empty() {
            println!(
                "No nodes found in ConfigMap {}. Exiting.",
                overrides::ENV_OVERRIDES_NAME
            );
            return Ok(false);
        }

        let shell = global.shell();
        match self {
            Self::Start(args) => args.run(shell, nodes).await,
            Self::Stop(args) => {
                println!("\nPreparing to stop RETIS collection on {} nodes...", nodes.len());
                let timeouts = args.timeouts.timeouts();
                let stop = StopCollection::new(shell, ovnk_retis::DEFAULT_UNIT, timeouts);
                let report = FanoutRunner::new(args.fanout.config())
                    .run(&nodes, Arc::new(stop))
                    .await?;
                Ok(print_summary("RETIS Stop Summary", "Stopping RETIS collection", &report))
            }
            Self::Status(args) => {
                let timeouts = args.timeouts.timeouts();
                let status = CollectionStatus::new(shell, ovnk_retis::DEFAULT_UNIT, timeouts);
                let report = FanoutRunner::new(args.fanout.config())
                    .run(&nodes, Arc::new(status))
                    .await?;
                Ok(print_summary("RETIS Status Summary", "RETIS collection", &report))
            }
        }
    }
}

impl StartArgs {
    fn config(&self) -> RetisConfig {
        RetisConfig {
            image: self.retis_image.clone(),
            working_directory: self.working_directory.clone(),
            filter: self.filter.clone(),
            ..RetisConfig::default()
        }
    }

    async fn run(self, shell: SharedShell, nodes: Vec<String>) -> Result<bool, BoxError> {
        let config = self.config();
        let timeouts = self.nodes.timeouts.timeouts();
        let fanout = self.nodes.fanout.config();

        println!("\nPreparing to run RETIS collection on {} nodes...", nodes.len());
        println!("RETIS Image: {}", config.image);
        println!("Working Directory: {}", config.working_directory);

        let script = if fanout.dry_run {
            println!(
                "[DRY RUN] Would download {} from {}",
                ovnk_retis::SCRIPT_NAME,
                self.script_url
            );
            None
        } else {
            println!("\n--- Downloading {} ---", ovnk_retis::SCRIPT_NAME);
            Some(RetisScript::download(&self.script_url).await?)
        };

        // The setup always runs one node at a time
        println!("\n--- Setting up {} on {} nodes ---", ovnk_retis::SCRIPT_NAME, nodes.len());
        let setup = SetupScript::new(Arc::clone(&shell), config.clone(), timeouts, script);
        let setup = FanoutRunner::new(FanoutConfig::sequential().dry_run(fanout.dry_run))
            .run(&nodes, Arc::new(setup))
            .await?;

        let ready = setup.succeeded_nodes();
        let setup_failed = setup.failed_nodes();
        if !setup_failed.is_empty() {
            println!("\n⚠ Script setup failed on {} nodes:", setup_failed.len());
            for node in &setup_failed {
                println!("  - {node}");
            }
            println!("RETIS collection will only run on nodes where script setup succeeded.");
        }
        println!(
            "\n--- Script setup complete: {}/{} nodes successful ---",
            ready.len(),
            nodes.len()
        );
        if ready.is_empty() {
            println!("No nodes available for RETIS collection. Exiting.");
            return Ok(false);
        }

        let start = StartCollection::new(shell, config, timeouts);
        let report = FanoutRunner::new(fanout).run(&ready, Arc::new(start)).await?;
        let started = print_summary("RETIS Collection Summary", "RETIS collection", &report);
        Ok(started && setup_failed.is_empty())
    }
}

/// Nodes listed in the env-overrides ConfigMap.
async fn debug_nodes(api: &KubeApi, namespace: &str) -> Result<Vec<String>, BoxError> {
    let config_map = api
        .get_config_map(namespace, overrides::ENV_OVERRIDES_NAME)
        .await?;
    let Some(config_map) = config_map else {
        tracing::warn!(
            namespace,
            name = overrides::ENV_OVERRIDES_NAME,
            "ConfigMap not found, run `ovnk log-debug apply` first"
        );
        return Ok(Vec::new());
    };

    let nodes = overrides::affected_nodes(&config_map);
    println!(
        "Found {} nodes in ConfigMap {}.",
        nodes.len(),
        overrides::ENV_OVERRIDES_NAME
    );
    Ok(nodes)
}
