//! Kubernetes Event recording for slice reconcilers.
//!
//! Events are fire-and-forget: a failed publish is logged and never
//! breaks reconciliation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Event reasons emitted by the slice router reconciler
pub mod reasons {
    /// Creating a router object failed
    pub const ERROR: &str = "Error";
}

/// Event actions emitted by the slice router reconciler
pub mod actions {
    pub const CREATE_DEPLOYMENT: &str = "CreateDeployment";
    pub const CREATE_SERVICE: &str = "CreateService";
}

/// Records Kubernetes Events against an object
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record(&self, object: &ObjectReference, event: Event);
}

/// EventRecorder backed by `kube::runtime::events::Recorder`
pub struct KubeEventRecorder {
    client: Client,
    reporter: Reporter,
}

impl KubeEventRecorder {
    /// `controller` shows up as the reporting component of each Event
    pub fn new(client: Client, controller: &str, instance: Option<String>) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: controller.to_string(),
                instance,
            },
        }
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn record(&self, object: &ObjectReference, event: Event) {
        let reason = event.reason.clone();
        let recorder = Recorder::new(self.client.clone(), self.reporter.clone(), object.clone());
        if let Err(e) = recorder.publish(event).await {
            warn!(reason = %reason, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// Recorder that drops every event
pub struct NoopEventRecorder;

#[async_trait]
impl EventRecorder for NoopEventRecorder {
    async fn record(&self, _object: &ObjectReference, _event: Event) {}
}
