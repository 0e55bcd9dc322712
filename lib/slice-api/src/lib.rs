//! Slice operator API types and CRD bindings for Kubernetes integration
//!
//! This library defines the custom resources the slice router controller reads and writes:
//! - Slice: a logical network partition, populated by the hub with subnet and IPAM config
//! - NetworkService: the network service mesh resource advertised by each slice router

pub mod v1beta1;
pub mod nsm;

pub use v1beta1::Slice;
pub use nsm::NetworkService;
