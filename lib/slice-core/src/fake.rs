//! In-memory cluster and event recorder for tests

use crate::client::object_namespace;
use crate::{ClusterClient, ClusterObject, EventRecorder, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ObjectReference, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::error::ErrorResponse;
use kube::runtime::events::{Event, EventType};
use kube::ResourceExt;
use slice_api::v1beta1::{SliceConfig, SliceIpamConfig, SliceSpec, SliceStatus};
use slice_api::Slice;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

type Key = (String, String, String);

/// Objects are kept as JSON, keyed by kind, namespace and name
#[derive(Default)]
pub struct FakeClusterClient {
    objects: Mutex<BTreeMap<Key, serde_json::Value>>,
    writes: AtomicUsize,
    fail_lists: AtomicBool,
    fail_creates: AtomicBool,
    fail_gets: AtomicBool,
    fail_deletes: AtomicBool,
}

fn key<K: ClusterObject>(namespace: &str, name: &str) -> Key {
    (K::kind(&()).to_string(), namespace.to_string(), name.to_string())
}

fn api_error(code: u16, reason: &str, message: String) -> crate::CoreError {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
    .into()
}

impl FakeClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a write
    pub fn insert<K: ClusterObject>(&self, obj: &K) {
        let key = key::<K>(&obj.namespace().unwrap_or_default(), &obj.name_any());
        let value = serde_json::to_value(obj).expect("serializable object");
        self.objects.lock().unwrap().insert(key, value);
    }

    pub fn fetch<K: ClusterObject>(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&key::<K>(namespace, name))
            .map(|v| serde_json::from_value(v.clone()).expect("stored object"))
    }

    pub fn count<K: ClusterObject>(&self) -> usize {
        let kind = K::kind(&()).to_string();
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    /// Number of create and delete calls that changed the cluster
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_lists(&self) {
        self.fail_lists.store(true, Ordering::SeqCst);
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn fail_gets(&self) {
        self.fail_gets.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterClient for FakeClusterClient {
    async fn get<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(api_error(500, "InternalError", format!("get {} failed", name)));
        }
        Ok(self.fetch(namespace, name))
    }

    async fn create<K: ClusterObject>(&self, obj: &K) -> Result<()> {
        let name = obj.name_any();
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(api_error(500, "InternalError", format!("create {} failed", name)));
        }
        let key = key::<K>(&object_namespace(obj)?, &name);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(api_error(409, "AlreadyExists", format!("{} already exists", name)));
        }
        objects.insert(key, serde_json::to_value(obj)?);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete<K: ClusterObject>(&self, namespace: &str, name: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(api_error(500, "InternalError", format!("delete {} failed", name)));
        }
        if self
            .objects
            .lock()
            .unwrap()
            .remove(&key::<K>(namespace, name))
            .is_some()
        {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn list<K: ClusterObject>(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<K>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(api_error(403, "Forbidden", "list forbidden".to_string()));
        }
        let kind = K::kind(&()).to_string();
        let objects = self.objects.lock().unwrap();
        let mut items = Vec::new();
        for ((k, ns, _), value) in objects.iter() {
            if *k != kind || ns != namespace {
                continue;
            }
            let obj: K = serde_json::from_value(value.clone())?;
            if labels.iter().all(|(l, v)| obj.labels().get(l) == Some(v)) {
                items.push(obj);
            }
        }
        Ok(items)
    }
}

#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub object: String,
    pub warning: bool,
    pub reason: String,
    pub note: Option<String>,
}

#[derive(Default)]
pub struct RecordingEventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventRecorder {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRecorder for RecordingEventRecorder {
    async fn record(&self, object: &ObjectReference, event: Event) {
        self.events.lock().unwrap().push(RecordedEvent {
            object: object.name.clone().unwrap_or_default(),
            warning: matches!(event.type_, EventType::Warning),
            reason: event.reason,
            note: event.note,
        });
    }
}

pub const TEST_NAMESPACE: &str = "kubeslice-system";

/// A slice the hub has not configured yet
pub fn slice(name: &str) -> Slice {
    let mut slice = Slice::new(name, SliceSpec::default());
    slice.metadata.namespace = Some(TEST_NAMESPACE.to_string());
    slice.metadata.uid = Some(format!("{}-uid", name));
    slice
}

pub fn slice_with_status(name: &str, subnet: &str, octet: i64, dns_ip: &str) -> Slice {
    let mut slice = slice(name);
    slice.status = Some(SliceStatus {
        slice_config: Some(SliceConfig {
            slice_subnet: subnet.to_string(),
            slice_ipam: SliceIpamConfig {
                ipam_cluster_octet: octet,
            },
        }),
        dns_ip: dns_ip.to_string(),
    });
    slice
}

pub fn pod(name: &str, namespace: &str, labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}
