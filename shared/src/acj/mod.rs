/// AdvancedCronJob API group
pub const API_GROUP: &str = "apps.kruise.io";
/// Deprecated API version, converted to the canonical version on admission
pub const API_VERSION_V1ALPHA1: &str = "v1alpha1";
/// Canonical API version
pub const API_VERSION_V1BETA1: &str = "v1beta1";

pub mod conversion;
pub mod schedule;
pub mod v1alpha1;
pub mod v1beta1;

pub use conversion::ConversionError;
