//! Get-or-create reconciliation of the slice router

use super::builder::{build_deployment, build_service};
use super::{network_service_name, router_name, Dataplane};
use crate::events::{actions, reasons};
use crate::{ClusterClient, CoreError, EventRecorder, Result, RouterConfig};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::runtime::events::{Event, EventType};
use kube::{Resource, ResourceExt};
use slice_api::{NetworkService, Slice};
use std::time::Duration;
use tracing::{error, info, instrument};

/// Where a reconcile pass left the slice router
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterProgress {
    /// The hub has not populated the slice subnet yet
    WaitingForSubnet,
    /// The router Deployment was just created
    DeploymentCreated,
    /// The router Service was just created
    ServiceCreated,
    /// Deployment and Service both exist; nothing to do
    Ready,
}

impl RouterProgress {
    /// Whether this pass changed or is still waiting on something
    pub fn changed(&self) -> bool {
        *self != RouterProgress::Ready
    }

    /// When to look at the slice again
    pub fn requeue_after(&self, delay: Duration) -> Option<Duration> {
        self.changed().then_some(delay)
    }
}

/// Provisions the vL3 router of each slice
pub struct SliceRouterReconciler<C, E> {
    client: C,
    recorder: E,
    config: RouterConfig,
}

impl<C: ClusterClient, E: EventRecorder> SliceRouterReconciler<C, E> {
    pub fn new(client: C, recorder: E, config: RouterConfig) -> Self {
        Self {
            client,
            recorder,
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Create the router Deployment, then the router Service, one per pass.
    #[instrument(skip(self, slice), fields(slice = %slice.name_any()))]
    pub async fn reconcile(&self, slice: &Slice) -> Result<RouterProgress> {
        let name = slice.name_any();
        let namespace = slice
            .namespace()
            .ok_or_else(|| CoreError::MissingNamespace(name.clone()))?;
        let router = router_name(&name);

        let deployment: Option<Deployment> = self.client.get(&namespace, &router).await?;
        if deployment.is_none() {
            if slice.subnet().is_none() {
                info!("Slice subnet config not available yet, cannot deploy slice router. Waiting...");
                return Ok(RouterProgress::WaitingForSubnet);
            }
            self.deploy_router(slice).await.map_err(|e| {
                error!("Failed to deploy slice router: {}", e);
                e
            })?;
            info!("Creating slice router {}/{}", namespace, router);
            return Ok(RouterProgress::DeploymentCreated);
        }

        let service: Option<Service> = self
            .client
            .get(&self.config.control_plane_namespace, &router)
            .await?;
        if service.is_none() {
            if slice.slice_config().is_none() {
                return Ok(RouterProgress::WaitingForSubnet);
            }
            self.deploy_router_service(slice).await.map_err(|e| {
                error!("Failed to deploy slice router service: {}", e);
                e
            })?;
            info!(
                "Creating slice router service {}/{}",
                self.config.control_plane_namespace, router
            );
            return Ok(RouterProgress::ServiceCreated);
        }

        Ok(RouterProgress::Ready)
    }

    async fn deploy_router(&self, slice: &Slice) -> Result<()> {
        let namespace = slice.namespace().unwrap_or_default();
        let dataplane = Dataplane::detect(&self.client, &namespace)
            .await
            .map_err(|e| {
                error!("Failed to get nsm dataplane mode, cannot deploy slice router: {}", e);
                e
            })?;

        let deployment = build_deployment(slice, &self.config, dataplane)?;
        if let Err(e) = self.client.create(&deployment).await {
            error!("Failed to create deployment for slice router: {}", e);
            self.warn(slice, actions::CREATE_DEPLOYMENT, "Error creating slice router")
                .await;
            return Err(e);
        }
        info!(
            dataplane = %dataplane,
            ipam_octet = slice.ipam_octet(),
            "Created deployment for slice router"
        );
        Ok(())
    }

    async fn deploy_router_service(&self, slice: &Slice) -> Result<()> {
        let created = match build_service(slice, &self.config) {
            Ok(service) => self.client.create(&service).await,
            Err(e) => Err(e),
        };
        if let Err(e) = created {
            error!("Failed to create svc for slice router: {}", e);
            self.warn(
                slice,
                actions::CREATE_SERVICE,
                "Error creating service for slice router",
            )
            .await;
            return Err(e);
        }
        info!("Created svc for slice router");
        Ok(())
    }

    async fn warn(&self, slice: &Slice, action: &str, message: &str) {
        self.recorder
            .record(
                &slice.object_ref(&()),
                Event {
                    type_: EventType::Warning,
                    reason: reasons::ERROR.to_string(),
                    note: Some(message.to_string()),
                    action: action.to_string(),
                    secondary: None,
                },
            )
            .await;
    }

    /// Remove the NetworkService the slice router registered under.
    ///
    /// A missing NetworkService counts as already cleaned up.
    #[instrument(skip(self))]
    pub async fn cleanup(&self, slice_name: &str) -> Result<()> {
        let namespace = &self.config.control_plane_namespace;
        let name = network_service_name(slice_name);

        let nse: Option<NetworkService> = self.client.get(namespace, &name).await.map_err(|e| {
            error!("Slice router cleanup: failed to get vl3 nse: {}", e);
            e
        })?;
        if nse.is_none() {
            return Ok(());
        }

        self.client
            .delete::<NetworkService>(namespace, &name)
            .await
            .map_err(|e| {
                error!("Slice router cleanup: failed to delete vl3 nse: {}", e);
                e
            })?;
        info!("Deleted network service {}/{}", namespace, name);
        Ok(())
    }
}
