//! Runtime configuration for the slice router workload.

use crate::Result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "SLICE_ROUTER_";

const DEFAULT_ROUTER_IMAGE: &str = "nexus.dev.aveshalabs.io/avesha/vl3_ucnf-nse:1.0.0";
const DEFAULT_CONTROL_PLANE_NAMESPACE: &str = "kubeslice-system";
const DEFAULT_REQUEUE_SECONDS: u64 = 10;

/// Image pull policy for router containers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum PullPolicy {
    #[default]
    Always,
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of the slice router workload.
///
/// Each field is read from `SLICE_ROUTER_<FIELD>` once at startup and handed
/// to the reconciler; nothing reads the environment after that.
#[derive(Clone, Debug, Deserialize)]
pub struct RouterConfig {
    /// Image of the vL3 router container
    #[serde(default = "default_router_image")]
    pub router_image: String,
    #[serde(default)]
    pub router_pull_policy: PullPolicy,

    /// Image of the router sidecar container
    pub sidecar_image: String,
    #[serde(default)]
    pub sidecar_pull_policy: PullPolicy,

    /// Namespace of the mesh control plane (nsmgr, router services)
    #[serde(default = "default_control_plane_namespace")]
    pub control_plane_namespace: String,

    /// Secret used to pull router images, if any
    #[serde(default)]
    pub image_pull_secret: Option<String>,

    /// Delay before re-checking a slice whose router is not settled yet
    #[serde(default = "default_requeue_seconds")]
    pub requeue_seconds: u64,
}

impl RouterConfig {
    /// Build a config with defaults for everything but the sidecar image.
    pub fn new(sidecar_image: impl Into<String>) -> Self {
        Self {
            router_image: default_router_image(),
            router_pull_policy: PullPolicy::default(),
            sidecar_image: sidecar_image.into(),
            sidecar_pull_policy: PullPolicy::default(),
            control_plane_namespace: default_control_plane_namespace(),
            image_pull_secret: None,
            requeue_seconds: default_requeue_seconds(),
        }
    }

    /// Load the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    /// Load the config from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_seconds)
    }

    /// The pull secret name, treating an empty value as unset
    pub fn image_pull_secret(&self) -> Option<&str> {
        self.image_pull_secret.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_router_image() -> String {
    DEFAULT_ROUTER_IMAGE.to_string()
}

fn default_control_plane_namespace() -> String {
    DEFAULT_CONTROL_PLANE_NAMESPACE.to_string()
}

fn default_requeue_seconds() -> u64 {
    DEFAULT_REQUEUE_SECONDS
}
