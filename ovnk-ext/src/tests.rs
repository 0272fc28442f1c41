use super::*;

fn pod(name: &str, node: Option<&str>) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta::with_namespace(name, "openshift-ovn-kubernetes"),
        spec: Some(corev1::PodSpec {
            node_name: node.map(ToString::to_string),
            ..default()
        }),
        ..default()
    }
}

#[test]
fn config_map_data_keys_are_sorted() {
    let data = BTreeMap::from([
        ("worker-b".to_string(), String::new()),
        ("_master".to_string(), String::new()),
        ("worker-a".to_string(), String::new()),
    ]);
    let cm = corev1::ConfigMap::new("env-overrides", "ns").with_data(data);
    let keys = cm.data_keys().collect::<Vec<_>>();
    assert_eq!(keys, ["_master", "worker-a", "worker-b"]);
}

#[test]
fn config_map_without_data_has_no_keys() {
    let cm = corev1::ConfigMap::new("env-overrides", "ns");
    assert_eq!(cm.data_keys().count(), 0);
    assert_eq!(cm.metadata.namespace.as_deref(), Some("ns"));
}

#[test]
fn pod_node_name_ignores_unscheduled() {
    assert_eq!(pod("a", Some("worker-a")).node_name(), Some("worker-a"));
    assert_eq!(pod("b", Some("")).node_name(), None);
    assert_eq!(pod("c", None).node_name(), None);
    assert_eq!(pod("c", None).pod_name(), Some("c"));
}

#[test]
fn annotated_keeps_existing_annotations() {
    let meta = metav1::ObjectMeta::new("cm")
        .annotated("a", "1")
        .annotated("b", "2");
    let annotations = meta.annotations.unwrap_or_default();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations["a"], "1");
}
