//! Cluster client used by the reconcilers
//!
//! The reconcilers only need four verbs against namespaced objects.

use crate::{CoreError, Result};
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

/// A namespaced Kubernetes object the cluster client can handle
pub trait ClusterObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> ClusterObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Read/write access to cluster objects
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// Create an object in its own namespace
    async fn create<K: ClusterObject>(&self, obj: &K) -> Result<()>;

    /// Delete an object; deleting a missing object succeeds
    async fn delete<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<()>;

    /// List objects carrying all of the given labels
    async fn list<K: ClusterObject>(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<K>>;
}

/// ClusterClient backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: ClusterObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// The namespace an object will be created in
pub fn object_namespace<K: ClusterObject>(obj: &K) -> Result<String> {
    obj.namespace()
        .filter(|ns| !ns.is_empty())
        .ok_or_else(|| CoreError::MissingNamespace(obj.name_any()))
}

/// Render labels as a `k=v,k=v` selector
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn create<K: ClusterObject>(&self, obj: &K) -> Result<()> {
        let namespace = object_namespace(obj)?;
        self.api::<K>(&namespace)
            .create(&PostParams::default(), obj)
            .await?;
        debug!("Created {} {}/{}", K::kind(&()), namespace, obj.name_any());
        Ok(())
    }

    async fn delete<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => {
                debug!("Deleted {} {}/{}", K::kind(&()), namespace, name);
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list<K: ClusterObject>(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<K>> {
        let params = ListParams::default().labels(&label_selector(labels));
        let list = self.api::<K>(namespace).list(&params).await?;
        Ok(list.items)
    }
}
