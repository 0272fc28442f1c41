use super::*;

/// Node names recorded in an `env-overrides` ConfigMap, `_master` excluded.
pub fn affected_nodes(config_map: &corev1::ConfigMap) -> Vec<String> {
    config_map
        .data_keys()
        .filter(|key| *key != MASTER_KEY)
        .map(ToString::to_string)
        .collect()
}

/// Distinct nodes running at least one pod whose name contains `pattern`.
///
/// Pods that are not scheduled yet are skipped.
pub fn nodes_running_pods<'a>(
    pods: impl IntoIterator<Item = &'a corev1::Pod>,
    pattern: &str,
) -> Result<BTreeSet<String>, EnvOverridesError> {
    if pattern.is_empty() {
        return Err(EnvOverridesError::EmptyPodPattern);
    }

    let nodes = pods
        .into_iter()
        .filter(|pod| pod.pod_name().is_some_and(|name| name.contains(pattern)))
        .filter_map(|pod| pod.node_name())
        .map(ToString::to_string)
        .collect();
    Ok(nodes)
}
