use super::*;

fn pod(name: &str, node: Option<&str>) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta::with_namespace(name, OVN_KUBERNETES_NAMESPACE),
        spec: Some(corev1::PodSpec {
            node_name: node.map(ToString::to_string),
            ..k8s::default()
        }),
        ..k8s::default()
    }
}

#[test]
fn master_nodes_are_left_to_master_entry() {
    let overrides = EnvOverrides::new(
        ["worker-a", "Master-0", "worker-b", "ip-10-0-1-1.master.local", "worker-a"],
        LogLevels::default(),
    );
    let nodes = overrides.nodes().collect::<Vec<_>>();
    assert_eq!(nodes, ["worker-a", "worker-b"]);
}

#[test]
fn config_map_has_node_and_master_entries() {
    let overrides = EnvOverrides::new(["worker-a", "worker-b"], LogLevels::default());
    let cm = overrides.to_config_map(OVN_KUBERNETES_NAMESPACE);

    assert_eq!(cm.metadata.name.as_deref(), Some(ENV_OVERRIDES_NAME));
    assert_eq!(cm.metadata.namespace.as_deref(), Some(OVN_KUBERNETES_NAMESPACE));

    let data = cm.data.unwrap_or_default();
    assert_eq!(data.len(), 3);
    assert_eq!(
        data["worker-a"],
        "# This sets the log level for the ovn-kubernetes node process:\n\
         OVN_KUBE_LOG_LEVEL=5\n\
         # You might also/instead want to enable debug logging for ovn-controller:\n\
         OVN_LOG_LEVEL=dbg\n"
    );
    assert_eq!(
        data[MASTER_KEY],
        "# This sets the log level for the ovn-kubernetes master process as well as the ovn-dbchecker:\n\
         OVN_KUBE_LOG_LEVEL=5\n\
         # You might also/instead want to enable debug logging for northd, nbdb and sbdb on all masters:\n\
         OVN_LOG_LEVEL=dbg\n"
    );
}

#[test]
fn config_map_records_levels_annotation() {
    let levels = LogLevels::new(4, OvnLogLevel::Info);
    let cm = EnvOverrides::new(["worker-a"], levels).to_config_map("custom");
    let annotations = cm.metadata.annotations.unwrap_or_default();
    assert_eq!(
        annotations[LOG_LEVELS_ANNOTATION],
        "OVN_KUBE_LOG_LEVEL=4,OVN_LOG_LEVEL=info"
    );
    assert_eq!(cm.metadata.namespace.as_deref(), Some("custom"));
}

#[test]
fn master_entry_is_present_without_workers() {
    let cm = EnvOverrides::new(["master-0"], LogLevels::default()).to_config_map("ns");
    let keys = cm.data_keys().collect::<Vec<_>>();
    assert_eq!(keys, [MASTER_KEY]);
    assert!(affected_nodes(&cm).is_empty());
}

#[test]
fn affected_nodes_skip_master_key() {
    let overrides = EnvOverrides::new(["worker-b", "worker-a"], LogLevels::default());
    let cm = overrides.to_config_map(OVN_KUBERNETES_NAMESPACE);
    assert_eq!(affected_nodes(&cm), ["worker-a", "worker-b"]);
}

#[test]
fn yaml_rendering_includes_kind() {
    let yaml = EnvOverrides::new(["worker-a"], LogLevels::default())
        .to_yaml(OVN_KUBERNETES_NAMESPACE)
        .unwrap();
    assert!(yaml.contains("kind: ConfigMap"));
    assert!(yaml.contains("name: env-overrides"));
    assert!(yaml.contains("worker-a:"));
}

#[test]
fn pod_filter_deduplicates_nodes() {
    let pods = [
        pod("ovnkube-node-abcde", Some("worker-a")),
        pod("ovnkube-node-fghij", Some("worker-a")),
        pod("ovnkube-node-klmno", Some("worker-b")),
        pod("ovnkube-node-pending", None),
        pod("ovnkube-control-plane-0", Some("master-0")),
    ];
    let nodes = nodes_running_pods(&pods, DEFAULT_POD_PATTERN).unwrap();
    assert_eq!(nodes.into_iter().collect::<Vec<_>>(), ["worker-a", "worker-b"]);
}

#[test]
fn pod_filter_rejects_empty_pattern() {
    let pods = [pod("ovnkube-node-abcde", Some("worker-a"))];
    let err = nodes_running_pods(&pods, "").unwrap_err();
    assert!(matches!(err, EnvOverridesError::EmptyPodPattern));
}

#[test]
fn ovn_log_level_parsing() {
    assert_eq!("dbg".parse::<OvnLogLevel>().unwrap(), OvnLogLevel::Dbg);
    assert_eq!("DEBUG".parse::<OvnLogLevel>().unwrap(), OvnLogLevel::Dbg);
    assert_eq!(" warn ".parse::<OvnLogLevel>().unwrap(), OvnLogLevel::Warn);
    assert_eq!(OvnLogLevel::Emergency.to_string(), "emer");
    assert!(matches!(
        "verbose".parse::<OvnLogLevel>(),
        Err(EnvOverridesError::InvalidOvnLogLevel(level)) if level == "verbose"
    ));
}
