//! Slice router provisioning
//!
//! Every slice gets one vL3 router: a Deployment in the slice namespace and
//! a Service in the control plane namespace, both owned by the Slice.

pub mod builder;
pub mod dataplane;
pub mod reconciler;

pub use dataplane::Dataplane;
pub use reconciler::{RouterProgress, SliceRouterReconciler};

/// Prefix of the router Deployment and Service names
pub const ROUTER_NAME_PREFIX: &str = "vl3-slice-router-";

/// Name of the router Deployment and Service for a slice
pub fn router_name(slice_name: &str) -> String {
    format!("{}{}", ROUTER_NAME_PREFIX, slice_name)
}

/// Name of the NetworkService the router registers under
pub fn network_service_name(slice_name: &str) -> String {
    format!("vl3-service-{}", slice_name)
}

/// Value of the app label the router registers with
pub fn endpoint_app_name(slice_name: &str) -> String {
    format!("vl3-nse-{}", slice_name)
}
