//! Slice controller provisioning a vL3 router for every Slice

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::runtime::finalizer::{finalizer, Event as Finalizer};
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::Config;
use kube_runtime::{controller::Action, Controller};
use slice_api::Slice;
use slice_core::{KubeClusterClient, KubeEventRecorder, RouterConfig, SliceRouterReconciler};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Name reported on events and used as the finalizer owner
pub const CONTROLLER_NAME: &str = "slice-router-controller";
const SLICE_FINALIZER: &str = "mesh.avesha.io/slice-router";

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Slice {0} has no namespace")]
    MissingNamespace(String),

    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<kube::runtime::finalizer::Error<slice_core::CoreError>>),
}

type Router = SliceRouterReconciler<KubeClusterClient, KubeEventRecorder>;

struct Context {
    client: Client,
    router: Router,
}

pub struct SliceController {
    client: Client,
    config: RouterConfig,
}

impl SliceController {
    pub fn new(client: Client, config: RouterConfig) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting Slice reconciliation");

        let slices: Api<Slice> = Api::all(self.client.clone());
        let router = SliceRouterReconciler::new(
            KubeClusterClient::new(self.client.clone()),
            KubeEventRecorder::new(
                self.client.clone(),
                CONTROLLER_NAME,
                std::env::var("POD_NAME").ok(),
            ),
            self.config,
        );
        let context = Arc::new(Context {
            client: self.client.clone(),
            router,
        });

        Controller::new(slices, Config::default())
            .owns::<Deployment>(Api::all(self.client.clone()), Config::default())
            .owns::<Service>(Api::all(self.client.clone()), Config::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok((slice, _)) => debug!("Reconciled Slice {}", slice.name),
                    Err(e) => error!("Error in reconciliation stream: {}", e),
                }
            })
            .await;

        info!("Slice controller stopped");
        Ok(())
    }
}

#[instrument(skip(ctx, slice), fields(name = %slice.name_any(), namespace = slice.namespace()))]
async fn reconcile(slice: Arc<Slice>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let namespace = slice
        .namespace()
        .ok_or_else(|| ReconcileError::MissingNamespace(slice.name_any()))?;
    let api: Api<Slice> = Api::namespaced(ctx.client.clone(), &namespace);

    info!("Reconciling Slice {}/{}", namespace, slice.name_any());

    finalizer(&api, SLICE_FINALIZER, slice, |event| async {
        match event {
            Finalizer::Apply(slice) => apply_slice(&ctx.router, &slice).await,
            Finalizer::Cleanup(slice) => cleanup_slice(&ctx.router, &slice).await,
        }
    })
    .await
    .map_err(|e| ReconcileError::Finalizer(Box::new(e)))
}

/// Provision the slice router, requeueing until it has settled
async fn apply_slice(router: &Router, slice: &Slice) -> slice_core::Result<Action> {
    let progress = router.reconcile(slice).await?;
    Ok(match progress.requeue_after(router.config().requeue_after()) {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    })
}

/// Router objects are garbage collected through their owner references;
/// only the NetworkService needs explicit removal.
async fn cleanup_slice(router: &Router, slice: &Slice) -> slice_core::Result<Action> {
    router.cleanup(&slice.name_any()).await?;
    Ok(Action::await_change())
}

fn error_policy(slice: Arc<Slice>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    warn!("Error reconciling Slice {}: {}", slice.name_any(), err);
    Action::requeue(Duration::from_secs(60))
}
