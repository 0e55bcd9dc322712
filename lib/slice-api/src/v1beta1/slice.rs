use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Slice represents a logical network partition spanning the clusters
/// that joined it. The hub owns the desired state; worker controllers
/// consume the status the hub writes back.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mesh.avesha.io",
    version = "v1beta1",
    kind = "Slice",
    plural = "slices",
    namespaced,
    derive = "Default",
    status = "SliceStatus",
    printcolumn = r#"{"name":"Subnet","type":"string","jsonPath":".status.sliceConfig.sliceSubnet"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct SliceSpec {}

/// Status of a Slice
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SliceStatus {
    /// Network configuration pushed down by the hub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_config: Option<SliceConfig>,

    /// IP of the slice DNS server
    #[serde(default, rename = "dnsIP")]
    pub dns_ip: String,
}

/// Network configuration of a slice
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SliceConfig {
    /// Slice-wide subnet in CIDR notation, e.g. 10.1.0.0/16
    #[serde(default)]
    pub slice_subnet: String,

    /// Address allocation parameters for this cluster
    #[serde(default)]
    pub slice_ipam: SliceIpamConfig,
}

/// IPAM parameters for this cluster's share of the slice subnet
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SliceIpamConfig {
    /// Third octet of the per-cluster /24 carved out of the slice subnet
    #[serde(default)]
    pub ipam_cluster_octet: i64,
}

impl Slice {
    /// The slice config, if the hub has populated it yet
    pub fn slice_config(&self) -> Option<&SliceConfig> {
        self.status.as_ref().and_then(|s| s.slice_config.as_ref())
    }

    /// The slice subnet, or `None` while it is still empty
    pub fn subnet(&self) -> Option<&str> {
        self.slice_config()
            .map(|c| c.slice_subnet.as_str())
            .filter(|s| !s.is_empty())
    }

    /// The IPAM cluster octet, zero when unset
    pub fn ipam_octet(&self) -> i64 {
        self.slice_config()
            .map(|c| c.slice_ipam.ipam_cluster_octet)
            .unwrap_or_default()
    }

    /// The slice DNS server IP, empty when unset
    pub fn dns_ip(&self) -> &str {
        self.status.as_ref().map(|s| s.dns_ip.as_str()).unwrap_or("")
    }
}
