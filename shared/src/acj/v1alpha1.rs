//! The deprecated `v1alpha1` shape of AdvancedCronJob. Objects submitted at
//! this version are converted to `v1beta1` before any business logic runs.
use super::v1beta1::{AdvancedCronJobStatus, CronJobTemplate};
use kube::CustomResource;
use schemars::JsonSchema;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "apps.kruise.io",
    version = "v1alpha1",
    kind = "AdvancedCronJob",
    namespaced,
    status = "AdvancedCronJobStatus",
    derive = "PartialEq"
)]
pub struct AdvancedCronJobSpec {
    #[serde(default)]
    pub schedule: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_deadline_seconds: Option<i64>,

    /// One of `Allow`, `Forbid` or `Replace`. This version did not constrain
    /// the value at decode time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_jobs_history_limit: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_jobs_history_limit: Option<i32>,

    #[serde(default)]
    pub template: CronJobTemplate,
}
