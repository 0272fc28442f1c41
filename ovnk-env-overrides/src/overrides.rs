use super::*;

/// Desired content of the `env-overrides` ConfigMap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvOverrides {
    nodes: BTreeSet<String>,
    levels: LogLevels,
}

impl EnvOverrides {
    /// Control plane nodes (any name containing `master`) are dropped, they
    /// are covered by the `_master` entry.
    pub fn new(nodes: impl IntoIterator<Item = impl ToString>, levels: LogLevels) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|node| node.to_string())
            .filter(|node| !is_master(node))
            .collect();
        Self { nodes, levels }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn levels(&self) -> LogLevels {
        self.levels
    }

    pub fn to_config_map(&self, namespace: impl ToString) -> corev1::ConfigMap {
        let node_entry = self.levels.node_entry();
        let mut data = self
            .nodes
            .iter()
            .map(|node| (node.clone(), node_entry.clone()))
            .collect::<BTreeMap<_, _>>();
        data.insert(MASTER_KEY.to_string(), self.levels.master_entry());

        let metadata = metav1::ObjectMeta::with_namespace(ENV_OVERRIDES_NAME, namespace)
            .annotated(LOG_LEVELS_ANNOTATION, self.levels);
        corev1::ConfigMap {
            metadata,
            ..k8s::default()
        }
        .with_data(data)
    }

    pub fn to_yaml(&self, namespace: impl ToString) -> Result<String, EnvOverridesError> {
        let config_map = self.to_config_map(namespace);
        Ok(serde_yaml::to_string(&config_map)?)
    }
}

fn is_master(node: &str) -> bool {
    node.to_lowercase().contains("master")
}
