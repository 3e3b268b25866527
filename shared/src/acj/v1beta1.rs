use super::API_GROUP;
use k8s_openapi::api::batch::v1::JobTemplateSpec;
use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, Time};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};

/// Defines the desired state of an AdvancedCronJob, the canonical version
/// that every admitted object is converted to.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
// group = API_GROUP and version = API_VERSION_V1BETA1
#[kube(
    group = "apps.kruise.io",
    version = "v1beta1",
    kind = "AdvancedCronJob",
    namespaced,
    shortname = "acj",
    status = "AdvancedCronJobStatus",
    derive = "PartialEq"
)]
pub struct AdvancedCronJobSpec {
    /// The schedule in Cron format, see https://en.wikipedia.org/wiki/Cron.
    #[serde(default)]
    pub schedule: String,

    /// The time zone name for the given schedule. When unset the schedule
    /// is interpreted in the time zone of the controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    /// Deadline in seconds for starting the job if it misses its scheduled
    /// time for any reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_deadline_seconds: Option<i64>,

    /// Specifies how to treat concurrent executions of a job. An empty
    /// string is the same as unset.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub concurrency_policy: Option<ConcurrencyPolicy>,

    /// Suspends subsequent executions; already started executions are not
    /// affected.
    #[serde(default)]
    pub paused: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_jobs_history_limit: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_jobs_history_limit: Option<i32>,

    /// The workload created on every run
    #[serde(default)]
    pub template: CronJobTemplate,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<ConcurrencyPolicy>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|policy| !policy.is_empty())
        .map(ConcurrencyPolicy::from))
}

/// Declares a string-backed policy enum. Unrecognized values decode into
/// `Other` so that they surface as validation errors instead of decoding
/// failures.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                    $name::Other(value) => value.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $(stringify!($variant) => $name::$variant,)+
                    _ => $name::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> String {
                stringify!($name).to_string()
            }

            fn json_schema(gen: &mut SchemaGenerator) -> Schema {
                String::json_schema(gen)
            }
        }
    };
}

string_enum!(
    /// Specifies how to treat concurrent executions of a job
    ConcurrencyPolicy {
        /// Allows jobs to run concurrently
        Allow,
        /// Skips the next run if the previous one hasn't finished yet
        Forbid,
        /// Cancels the currently running job and replaces it with a new one
        Replace,
    }
);

/// Holds the workload template. Exactly one member must be set; the
/// members are independent on the wire so that a violation can be reported
/// as a validation error rather than a decoding failure.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CronJobTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_template: Option<JobTemplateSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_job_template: Option<BroadcastJobTemplateSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_list_pull_job_template: Option<ImageListPullJobTemplateSpec>,
}

/// A borrowed view of one populated template member
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TemplateRef<'a> {
    Job(&'a JobTemplateSpec),
    BroadcastJob(&'a BroadcastJobTemplateSpec),
    ImageListPullJob(&'a ImageListPullJobTemplateSpec),
}

impl TemplateRef<'_> {
    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateRef::Job(_) => TemplateKind::Job,
            TemplateRef::BroadcastJob(_) => TemplateKind::BroadcastJob,
            TemplateRef::ImageListPullJob(_) => TemplateKind::ImageListPullJob,
        }
    }
}

impl CronJobTemplate {
    /// All populated members, in declaration order.
    pub fn populated(&self) -> Vec<TemplateRef<'_>> {
        let mut templates = Vec::new();
        if let Some(t) = &self.job_template {
            templates.push(TemplateRef::Job(t));
        }
        if let Some(t) = &self.broadcast_job_template {
            templates.push(TemplateRef::BroadcastJob(t));
        }
        if let Some(t) = &self.image_list_pull_job_template {
            templates.push(TemplateRef::ImageListPullJob(t));
        }
        templates
    }

    /// The single populated member, or `None` when zero or several are set.
    pub fn selected(&self) -> Option<TemplateRef<'_>> {
        match self.populated().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum TemplateKind {
    Job,
    BroadcastJob,
    ImageListPullJob,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastJobTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: BroadcastJobSpec,
}

/// Runs one pod per eligible node
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastJobSpec {
    /// Maximum number of pods running at the same time; defaults to all nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<IntOrString>,
    #[serde(default)]
    pub template: PodTemplateSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_policy: Option<CompletionPolicy>,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageListPullJobTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: ImageListPullJobSpec,
}

/// Pre-pulls a list of images on the selected nodes
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageListPullJobSpec {
    #[serde(default)]
    pub images: Vec<String>,

    /// Nodes to pull on, by name or by labels. Defaults to all nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<ImagePullJobNodeSelector>,

    /// Pull on the nodes running the pods matched by this selector. Cannot
    /// be combined with `selector`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<ImagePullJobPodSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<IntOrString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<PullPolicy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_secrets: Vec<String>,

    #[serde(default)]
    pub completion_policy: CompletionPolicy,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePullJobNodeSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,

    #[serde(flatten)]
    pub label_selector: LabelSelector,
}

impl ImagePullJobNodeSelector {
    pub fn has_label_selector(&self) -> bool {
        self.label_selector.match_labels.is_some() || self.label_selector.match_expressions.is_some()
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePullJobPodSelector {
    #[serde(flatten)]
    pub label_selector: LabelSelector,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPolicy {
    #[serde(rename = "type", default)]
    pub policy_type: CompletionPolicyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_deadline_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i32>,
}

string_enum!(CompletionPolicyType {
    /// The job finishes once every pod has finished
    Always,
    /// The job never finishes on its own
    Never,
});

impl Default for CompletionPolicyType {
    fn default() -> Self {
        CompletionPolicyType::Always
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedCronJobStatus {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub template_kind: Option<TemplateKind>,

    /// Currently running jobs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active: Vec<ObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_schedule_time: Option<Time>,
}

/// Returns the kind of workload the spec runs. Specs without a job or
/// image-list-pull template are treated as broadcast jobs.
pub fn find_template_kind(spec: &AdvancedCronJobSpec) -> TemplateKind {
    if spec.template.job_template.is_some() {
        return TemplateKind::Job;
    }
    if spec.template.image_list_pull_job_template.is_some() {
        return TemplateKind::ImageListPullJob;
    }
    TemplateKind::BroadcastJob
}

/// API version string for objects of this version, e.g. `apps.kruise.io/v1beta1`
pub fn api_version() -> String {
    format!("{}/{}", API_GROUP, super::API_VERSION_V1BETA1)
}
