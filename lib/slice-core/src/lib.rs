//! Core reconciliation logic for slice routers
//!
//! This library provides:
//! - Environment-derived configuration for the router workload
//! - A cluster client abstraction with a kube-backed implementation
//! - Kubernetes event recording
//! - The slice router reconciler and its object builders

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod router;

#[cfg(test)]
mod fake;

pub use client::{ClusterClient, ClusterObject, KubeClusterClient};
pub use config::{PullPolicy, RouterConfig};
pub use error::{CoreError, Result};
pub use events::{EventRecorder, KubeEventRecorder, NoopEventRecorder};
pub use router::{Dataplane, RouterProgress, SliceRouterReconciler};
