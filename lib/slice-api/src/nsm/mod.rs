/// Bindings to the network service mesh CRDs
///
/// The slice router registers itself as an endpoint of a NetworkService named
/// after the slice. The controller never creates these objects; it only
/// removes them when the slice goes away.

pub mod network_service;

pub use network_service::NetworkService;
