use std::fmt::Debug;
use std::path::Path;

use kube::ResourceExt as _;
use kube::api;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::config::KubeconfigError;
use ovnk_ext as k8s;

use k8s::NamespaceExt as _;
use k8s::corev1;

#[derive(Debug, thiserror::Error)]
pub enum KubeApiError {
    #[error("failed to load kubeconfig {path}: {source}")]
    Kubeconfig {
        path: String,
        #[source]
        source: KubeconfigError,
    },
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// How [`KubeApi::apply_config_map`] stored the ConfigMap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Created,
    Replaced,
}

pub struct KubeApi {
    list_params: api::ListParams,
    post_params: api::PostParams,
    delete_params: api::DeleteParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi from `kubeconfig`, or from the inferred configuration
    /// (`KUBECONFIG`, `~/.kube/config`, in-cluster service account) when no
    /// path is given.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), ovnk_kubeapi::KubeApiError> {
    /// let api = ovnk_kubeapi::KubeApi::new(None).await?;
    /// let version = api.check_connection().await?;
    /// println!("connected to {version}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(kubeconfig: Option<&Path>) -> Result<Self, KubeApiError> {
        let client = match kubeconfig {
            Some(path) => Self::client_from_kubeconfig(path).await?,
            None => kube::Client::try_default().await?,
        };
        Ok(Self::with_client(client))
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            list_params: api::ListParams::default(),
            post_params: api::PostParams::default(),
            delete_params: api::DeleteParams::default(),
            client,
        }
    }

    async fn client_from_kubeconfig(path: &Path) -> Result<kube::Client, KubeApiError> {
        let kubeconfig_error = |source| KubeApiError::Kubeconfig {
            path: path.display().to_string(),
            source,
        };
        let kubeconfig = Kubeconfig::read_from(path).map_err(kubeconfig_error)?;
        let options = KubeConfigOptions::default();
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(kubeconfig_error)?;
        tracing::debug!(
            path = %path.display(),
            cluster_url = %config.cluster_url,
            "Loaded kubeconfig"
        );
        Ok(kube::Client::try_from(config)?)
    }

    /// Verifies the API server is reachable, returning its git version.
    pub async fn check_connection(&self) -> kube::Result<String> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    /// Names of all Nodes in the cluster.
    pub async fn list_node_names(&self) -> kube::Result<Vec<String>> {
        let lp = self.list_params();
        let nodes = self.nodes().list_metadata(lp).await?;
        Ok(nodes.items.iter().map(|node| node.name_any()).collect())
    }

    /// All Pods in all namespaces, spec included so that the node a pod is
    /// scheduled to is known.
    pub async fn list_pods(&self) -> kube::Result<Vec<corev1::Pod>> {
        let lp = self.list_params();
        self.pods().list(lp).await.map(|list| list.items)
    }

    /// Creates `namespace` if it does not exist yet. Returns `true` when it
    /// was created.
    pub async fn ensure_namespace(&self, namespace: &str) -> kube::Result<bool> {
        let namespaces = self.namespaces();
        if namespaces.get_opt(namespace).await?.is_some() {
            return Ok(false);
        }

        tracing::info!(namespace, "Namespace does not exist, creating it");
        let pp = self.post_params();
        namespaces
            .create(pp, &corev1::Namespace::new(namespace))
            .await?;
        Ok(true)
    }

    /// Reads a ConfigMap, `None` when it does not exist.
    pub async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> kube::Result<Option<corev1::ConfigMap>> {
        self.config_maps(namespace).get_opt(name).await
    }

    /// Stores `config_map` in its own namespace, replacing any existing
    /// ConfigMap of the same name.
    pub async fn apply_config_map(&self, config_map: &corev1::ConfigMap) -> kube::Result<Applied> {
        let name = config_map.name_any();
        let namespace = config_map.namespace().unwrap_or_default();
        let config_maps = self.config_maps(&namespace);
        let pp = self.post_params();

        match config_maps.get_opt(&name).await? {
            Some(existing) => {
                tracing::info!(name, namespace, "ConfigMap already exists, replacing it");
                let mut replacement = config_map.clone();
                replacement.metadata.resource_version = existing.resource_version();
                config_maps.replace(&name, pp, &replacement).await?;
                Ok(Applied::Replaced)
            }
            None => {
                tracing::info!(name, namespace, "ConfigMap does not exist, creating it");
                config_maps.create(pp, config_map).await?;
                Ok(Applied::Created)
            }
        }
    }

    /// Deletes a ConfigMap. Returns `false` when there was nothing to delete.
    pub async fn delete_config_map(&self, namespace: &str, name: &str) -> kube::Result<bool> {
        let config_maps = self.config_maps(namespace);
        if config_maps.get_opt(name).await?.is_none() {
            tracing::info!(name, namespace, "ConfigMap not found, nothing to delete");
            return Ok(false);
        }

        let dp = self.delete_params();
        config_maps.delete(name, dp).await?;
        tracing::info!(name, namespace, "ConfigMap deleted");
        Ok(true)
    }

    fn nodes(&self) -> api::Api<corev1::Node> {
        api::Api::all(self.client.clone())
    }

    fn pods(&self) -> api::Api<corev1::Pod> {
        api::Api::all(self.client.clone())
    }

    fn namespaces(&self) -> api::Api<corev1::Namespace> {
        api::Api::all(self.client.clone())
    }

    fn config_maps(&self, namespace: &str) -> api::Api<corev1::ConfigMap> {
        api::Api::namespaced(self.client.clone(), namespace)
    }

    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }

    fn post_params(&self) -> &api::PostParams {
        &self.post_params
    }

    fn delete_params(&self) -> &api::DeleteParams {
        &self.delete_params
    }
}

impl Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, redacting the `client`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApi")
            .field("list_params", &self.list_params)
            .field("post_params", &self.post_params)
            .field("delete_params", &self.delete_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
