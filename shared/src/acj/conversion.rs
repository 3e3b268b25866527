//! Conversion from the deprecated `v1alpha1` version to the canonical `v1beta1`.
//!
//! ## Conversion rules:
//! - `concurrencyPolicy`: unset or empty stays unset, a known policy name maps
//!   to the typed policy, anything else fails the conversion
//! - `paused`: unset becomes `false`
//! - every other field, metadata and status included, is carried over unchanged
use super::{v1alpha1, v1beta1};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown concurrencyPolicy {0:?}, must be one of Allow, Forbid or Replace")]
    UnknownConcurrencyPolicy(String),
}

fn convert_concurrency_policy(
    policy: Option<String>,
) -> Result<Option<v1beta1::ConcurrencyPolicy>, ConversionError> {
    match policy.filter(|p| !p.is_empty()).map(v1beta1::ConcurrencyPolicy::from) {
        Some(v1beta1::ConcurrencyPolicy::Other(other)) => {
            Err(ConversionError::UnknownConcurrencyPolicy(other))
        }
        converted => Ok(converted),
    }
}

impl TryFrom<v1alpha1::AdvancedCronJob> for v1beta1::AdvancedCronJob {
    type Error = ConversionError;

    fn try_from(obj: v1alpha1::AdvancedCronJob) -> Result<Self, Self::Error> {
        let spec = obj.spec;
        Ok(v1beta1::AdvancedCronJob {
            metadata: obj.metadata,
            spec: v1beta1::AdvancedCronJobSpec {
                concurrency_policy: convert_concurrency_policy(spec.concurrency_policy)?,
                paused: spec.paused.unwrap_or(false),
                schedule: spec.schedule,
                time_zone: spec.time_zone,
                starting_deadline_seconds: spec.starting_deadline_seconds,
                successful_jobs_history_limit: spec.successful_jobs_history_limit,
                failed_jobs_history_limit: spec.failed_jobs_history_limit,
                template: spec.template,
            },
            status: obj.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::JobTemplateSpec;

    fn alpha(concurrency_policy: Option<&str>, paused: Option<bool>) -> v1alpha1::AdvancedCronJob {
        let mut obj = v1alpha1::AdvancedCronJob::new(
            "legacy",
            v1alpha1::AdvancedCronJobSpec {
                schedule: "0 3 * * *".to_string(),
                time_zone: Some("Europe/Berlin".to_string()),
                starting_deadline_seconds: Some(30),
                concurrency_policy: concurrency_policy.map(String::from),
                paused,
                successful_jobs_history_limit: Some(3),
                failed_jobs_history_limit: Some(1),
                template: v1beta1::CronJobTemplate {
                    job_template: Some(JobTemplateSpec::default()),
                    ..Default::default()
                },
            },
        );
        obj.metadata.namespace = Some("default".to_string());
        obj
    }

    #[test]
    fn test_convert_carries_fields() {
        let converted = v1beta1::AdvancedCronJob::try_from(alpha(Some("Forbid"), None)).unwrap();
        assert_eq!(Some("legacy".to_string()), converted.metadata.name);
        assert_eq!(Some("default".to_string()), converted.metadata.namespace);
        assert_eq!("0 3 * * *", converted.spec.schedule);
        assert_eq!(Some("Europe/Berlin".to_string()), converted.spec.time_zone);
        assert_eq!(Some(30), converted.spec.starting_deadline_seconds);
        assert_eq!(
            Some(v1beta1::ConcurrencyPolicy::Forbid),
            converted.spec.concurrency_policy
        );
        assert!(!converted.spec.paused);
        assert_eq!(Some(3), converted.spec.successful_jobs_history_limit);
        assert_eq!(Some(1), converted.spec.failed_jobs_history_limit);
        assert!(converted.spec.template.job_template.is_some());
    }

    #[test]
    fn test_convert_optional_fields() {
        let converted = v1beta1::AdvancedCronJob::try_from(alpha(Some(""), Some(true))).unwrap();
        assert_eq!(None, converted.spec.concurrency_policy);
        assert!(converted.spec.paused);
    }

    #[test]
    fn test_convert_unknown_policy_fails() {
        assert_eq!(
            Err(ConversionError::UnknownConcurrencyPolicy("Sometimes".to_string())),
            v1beta1::AdvancedCronJob::try_from(alpha(Some("Sometimes"), None)).map(|_| ())
        );
    }
}
