/// API version v1beta1 for slice mesh CRDs

pub mod slice;

pub use slice::{Slice, SliceConfig, SliceIpamConfig, SliceSpec, SliceStatus};

/// API group for slice mesh resources
pub const API_GROUP: &str = "mesh.avesha.io";
/// API version for slice mesh resources
pub const API_VERSION: &str = "v1beta1";
