//! Network service mesh dataplane detection

use crate::{ClusterClient, Result};
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error};

/// App label carried by VPP dataplane pods
pub const VPP_DATAPLANE_APP: &str = "nsm-vpp-plane";

/// Dataplane backing the slice router
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataplane {
    Kernel,
    Vpp,
}

impl Dataplane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataplane::Kernel => "kernel",
            Dataplane::Vpp => "vpp",
        }
    }

    /// Detect the dataplane in use in `namespace`.
    ///
    /// Any VPP dataplane pod selects VPP; kernel is the fallback.
    pub async fn detect<C: ClusterClient>(client: &C, namespace: &str) -> Result<Self> {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), VPP_DATAPLANE_APP.to_string());

        let pods: Vec<Pod> = client.list(namespace, &labels).await.map_err(|e| {
            error!("Failed to list nsm vpp dataplane pods: {}", e);
            e
        })?;
        let dataplane = if pods.is_empty() {
            Dataplane::Kernel
        } else {
            Dataplane::Vpp
        };
        debug!(
            "Found {} vpp dataplane pods in {}, using {} dataplane",
            pods.len(),
            namespace,
            dataplane
        );
        Ok(dataplane)
    }
}

impl fmt::Display for Dataplane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
