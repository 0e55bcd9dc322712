//! Kubernetes object builders for the slice router
//!
//! Everything here is pure: objects are derived from the Slice status, the
//! detected dataplane and the router configuration.

use super::{endpoint_app_name, network_service_name, router_name, Dataplane};
use crate::{CoreError, Result, RouterConfig};
use ipnetwork::Ipv4Network;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Affinity, Capabilities, ConfigMapVolumeSource, Container, EmptyDirVolumeSource, EnvVar,
    LocalObjectReference, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
    PodSpec, PodTemplateSpec, ResourceRequirements, SecurityContext, Service, ServicePort,
    ServiceSpec, Toleration, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::{Resource, ResourceExt};
use slice_api::Slice;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

pub const ROUTER_CONTAINER_NAME: &str = "vl3-nse";
pub const SIDECAR_CONTAINER_NAME: &str = "avesha-vl3-sidecar";
pub const SHARED_VOLUME: &str = "shared-volume";
pub const UCNF_CONFIG_VOLUME: &str = "universal-cnf-config-volume";
pub const ROUTER_SERVICE_ACCOUNT: &str = "slice-router";
/// Port of both the NSM registry and the router gRPC service
pub const ROUTER_GRPC_PORT: i32 = 5000;

const NODE_TYPE_KEY: &str = "avesha/node-type";
const GATEWAY_NODE_TYPE: &str = "gateway";
const NSM_SOCKET_RESOURCE: &str = "networkservicemesh.io/socket";
const SLICE_DNS_DOMAIN: &str = "slice.local";

/// Labels shared by the router pods, Deployment selector and Service selector
pub fn router_labels(slice_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "networkservicemesh.io/app".to_string(),
        endpoint_app_name(slice_name),
    );
    labels.insert(
        "networkservicemesh.io/impl".to_string(),
        network_service_name(slice_name),
    );
    labels.insert("avesha.io/pod-type".to_string(), "router".to_string());
    labels.insert("avesha.io/slice".to_string(), slice_name.to_string());
    labels
}

/// The /24 this cluster hands out from the slice subnet: the subnet
/// address with its third octet replaced by the IPAM octet.
pub fn cluster_prefix_pool(slice_subnet: &str, ipam_octet: i64) -> Result<String> {
    let invalid = |reason: String| CoreError::InvalidSubnet {
        subnet: slice_subnet.to_string(),
        reason,
    };

    let network: Ipv4Network = slice_subnet.parse().map_err(|e| invalid(format!("{}", e)))?;
    let octet = ipam_octet_checked(ipam_octet)?;

    let [a, b, _, _] = network.ip().octets();
    let pool = Ipv4Network::new(Ipv4Addr::new(a, b, octet, 0), 24)
        .map_err(|e| invalid(format!("{}", e)))?;
    Ok(pool.to_string())
}

/// The IPAM octet as a single address byte
pub fn ipam_octet_checked(ipam_octet: i64) -> Result<u8> {
    u8::try_from(ipam_octet).map_err(|_| CoreError::InvalidIpamOctet(ipam_octet))
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn slice_name_and_namespace(slice: &Slice) -> Result<(String, String)> {
    let name = slice.name_any();
    let namespace = slice
        .namespace()
        .ok_or_else(|| CoreError::MissingNamespace(name.clone()))?;
    Ok((name, namespace))
}

/// The vL3 router container
pub fn router_container(
    slice: &Slice,
    config: &RouterConfig,
    dataplane: Dataplane,
) -> Result<Container> {
    let name = slice.name_any();
    let ipam_octet = ipam_octet_checked(slice.ipam_octet())?;

    let mut env_vars = vec![
        env("DATAPLANE", dataplane.as_str()),
        env("ENDPOINT_NETWORK_SERVICE", network_service_name(&name)),
        env("ENDPOINT_LABELS", format!("app={}", endpoint_app_name(&name))),
        env("TRACER_ENABLED", "true"),
        env(
            "NSREGISTRY_ADDR",
            format!("nsmgr.{}", config.control_plane_namespace),
        ),
        env("NSREGISTRY_PORT", ROUTER_GRPC_PORT.to_string()),
    ];
    let mut volume_mounts = Vec::new();

    match dataplane {
        Dataplane::Kernel => {
            let subnet = slice.subnet().unwrap_or_default();
            env_vars.extend([
                env("IP_ADDRESS", cluster_prefix_pool(subnet, i64::from(ipam_octet))?),
                env("DST_ROUTES", subnet),
                env("DNS_NAMESERVERS", slice.dns_ip()),
                env("DNS_DOMAINS", SLICE_DNS_DOMAIN),
            ]);
        }
        Dataplane::Vpp => {
            env_vars.push(env("NSE_IPAM_UNIQUE_OCTET", ipam_octet.to_string()));
            volume_mounts.push(VolumeMount {
                name: UCNF_CONFIG_VOLUME.to_string(),
                mount_path: "/etc/universal-cnf/config.yaml".to_string(),
                sub_path: Some("config.yaml".to_string()),
                ..Default::default()
            });
        }
    }

    let mut limits = BTreeMap::new();
    limits.insert(NSM_SOCKET_RESOURCE.to_string(), Quantity("1".to_string()));

    Ok(Container {
        name: ROUTER_CONTAINER_NAME.to_string(),
        image: Some(config.router_image.clone()),
        image_pull_policy: Some(config.router_pull_policy.to_string()),
        env: Some(env_vars),
        resources: Some(ResourceRequirements {
            limits: Some(limits),
            ..Default::default()
        }),
        security_context: Some(SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        volume_mounts: if volume_mounts.is_empty() {
            None
        } else {
            Some(volume_mounts)
        },
        ..Default::default()
    })
}

/// The router sidecar container
pub fn sidecar_container(config: &RouterConfig, dataplane: Dataplane) -> Container {
    Container {
        name: SIDECAR_CONTAINER_NAME.to_string(),
        image: Some(config.sidecar_image.clone()),
        image_pull_policy: Some(config.sidecar_pull_policy.to_string()),
        env: Some(vec![
            env("DATAPLANE", dataplane.as_str()),
            env("POD_TYPE", "SLICEROUTER_POD"),
        ]),
        security_context: Some(SecurityContext {
            privileged: Some(true),
            allow_privilege_escalation: Some(true),
            capabilities: Some(Capabilities {
                add: Some(vec!["NET_ADMIN".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        }),
        volume_mounts: Some(vec![VolumeMount {
            name: SHARED_VOLUME.to_string(),
            mount_path: "/config".to_string(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

/// Volumes of the router pod
pub fn router_volumes(slice_name: &str, dataplane: Dataplane) -> Vec<Volume> {
    let mut volumes = vec![Volume {
        name: SHARED_VOLUME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }];

    if dataplane == Dataplane::Vpp {
        volumes.push(Volume {
            name: UCNF_CONFIG_VOLUME.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: format!("ucnf-{}", network_service_name(slice_name)),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    volumes
}

fn gateway_affinity() -> Affinity {
    Affinity {
        node_affinity: Some(NodeAffinity {
            required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: NODE_TYPE_KEY.to_string(),
                        operator: "In".to_string(),
                        values: Some(vec![GATEWAY_NODE_TYPE.to_string()]),
                    }]),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn gateway_tolerations() -> Vec<Toleration> {
    ["NoSchedule", "NoExecute"]
        .iter()
        .map(|effect| Toleration {
            key: Some(NODE_TYPE_KEY.to_string()),
            operator: Some("Equal".to_string()),
            value: Some(GATEWAY_NODE_TYPE.to_string()),
            effect: Some(effect.to_string()),
            ..Default::default()
        })
        .collect()
}

/// The router Deployment, placed in the slice namespace
pub fn build_deployment(
    slice: &Slice,
    config: &RouterConfig,
    dataplane: Dataplane,
) -> Result<Deployment> {
    let (name, namespace) = slice_name_and_namespace(slice)?;
    let labels = router_labels(&name);

    let image_pull_secrets = config.image_pull_secret().map(|secret| {
        vec![LocalObjectReference {
            name: secret.to_string(),
        }]
    });

    Ok(Deployment {
        metadata: ObjectMeta {
            name: Some(router_name(&name)),
            namespace: Some(namespace),
            owner_references: slice.controller_owner_ref(&()).map(|r| vec![r]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(ROUTER_SERVICE_ACCOUNT.to_string()),
                    affinity: Some(gateway_affinity()),
                    containers: vec![
                        router_container(slice, config, dataplane)?,
                        sidecar_container(config, dataplane),
                    ],
                    volumes: Some(router_volumes(&name, dataplane)),
                    tolerations: Some(gateway_tolerations()),
                    image_pull_secrets,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    })
}

/// The router Service, placed in the control plane namespace.
///
/// Owner references cannot cross namespaces, so the Slice must live in the
/// control plane namespace too.
pub fn build_service(slice: &Slice, config: &RouterConfig) -> Result<Service> {
    let (name, namespace) = slice_name_and_namespace(slice)?;
    if namespace != config.control_plane_namespace {
        return Err(CoreError::CrossNamespaceOwner {
            slice: name,
            slice_namespace: namespace,
            namespace: config.control_plane_namespace.clone(),
        });
    }

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(router_name(&name)),
            namespace: Some(config.control_plane_namespace.clone()),
            owner_references: slice.controller_owner_ref(&()).map(|r| vec![r]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(router_labels(&name)),
            ports: Some(vec![ServicePort {
                name: Some("grpc".to_string()),
                port: ROUTER_GRPC_PORT,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    })
}
