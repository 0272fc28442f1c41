use std::collections::BTreeMap;

pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self;
    fn annotated(self, key: impl ToString, value: impl ToString) -> Self;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }

    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::new(name)
        }
    }

    fn annotated(self, key: impl ToString, value: impl ToString) -> Self {
        let mut annotations = self.annotations.unwrap_or_default();
        annotations.insert(key.to_string(), value.to_string());
        Self {
            annotations: Some(annotations),
            ..self
        }
    }
}

pub trait ConfigMapExt {
    fn new(name: impl ToString, namespace: impl ToString) -> Self;
    fn with_data(self, data: BTreeMap<String, String>) -> Self;
    /// Keys of the `data` section, in key order.
    fn data_keys(&self) -> impl Iterator<Item = &str>;
}

impl ConfigMapExt for corev1::ConfigMap {
    fn new(name: impl ToString, namespace: impl ToString) -> Self {
        let metadata = metav1::ObjectMeta::with_namespace(name, namespace);
        Self {
            metadata,
            ..default()
        }
    }

    fn with_data(self, data: BTreeMap<String, String>) -> Self {
        Self {
            data: Some(data),
            ..self
        }
    }

    fn data_keys(&self) -> impl Iterator<Item = &str> {
        self.data.iter().flat_map(|data| data.keys().map(String::as_str))
    }
}

pub trait NamespaceExt {
    fn new(name: impl ToString) -> Self;
}

impl NamespaceExt for corev1::Namespace {
    fn new(name: impl ToString) -> Self {
        let metadata = metav1::ObjectMeta::new(name);
        Self {
            metadata,
            ..default()
        }
    }
}

pub trait PodExt {
    fn pod_name(&self) -> Option<&str>;
    /// Node the pod is scheduled to, if any.
    fn node_name(&self) -> Option<&str>;
}

impl PodExt for corev1::Pod {
    fn pod_name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    fn node_name(&self) -> Option<&str> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.node_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

pub fn default<T: Default>() -> T {
    T::default()
}

#[cfg(test)]
mod tests;
