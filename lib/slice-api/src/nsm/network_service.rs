use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// NetworkService from network service mesh - a named service that
/// endpoints (such as the slice router) register under and clients connect to
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networkservicemesh.io",
    version = "v1alpha1",
    kind = "NetworkService",
    plural = "networkservices",
    namespaced,
    derive = "Default",
)]
pub struct NetworkServiceSpec {
    /// Payload type carried by the service (e.g. "IP")
    #[serde(default)]
    pub payload: String,

    /// Selector rules routing clients to endpoints
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// Match rule of a NetworkService
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Labels the connecting client must carry
    #[serde(default)]
    pub source_selector: BTreeMap<String, String>,

    /// Destinations for matching clients
    #[serde(default)]
    pub route: Vec<Destination>,
}

/// Destination of a match rule
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Labels selecting the endpoint
    #[serde(default)]
    pub destination_selector: BTreeMap<String, String>,
}
