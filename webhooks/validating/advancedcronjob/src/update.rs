//! Update immutability for AdvancedCronJob specs.
//!
//! Only a small set of spec fields may change on update. The check clones the
//! new spec, copies every mutable field over from the old spec, and compares
//! what is left with semantic equality: any remaining difference is a
//! forbidden change.
use acj_shared::acj::v1beta1::AdvancedCronJobSpec;
use acj_shared::k8s::{semantic_eq, ErrorList, FieldError, Path};

/// A spec field that may change on update, with the function that copies its
/// old value onto a patched spec.
pub struct MutableField {
    pub name: &'static str,
    restore: fn(&mut AdvancedCronJobSpec, &AdvancedCronJobSpec),
}

/// The mutable fields, in the order they are named in the rejection message.
pub const MUTABLE_FIELDS: &[MutableField] = &[
    MutableField {
        name: "imageListPullJobTemplate",
        // only restored when the old object has one: removing the template is
        // masked, adding one is reported
        restore: |patched, old| {
            if old.template.image_list_pull_job_template.is_some() {
                patched.template.image_list_pull_job_template =
                    old.template.image_list_pull_job_template.clone();
            }
        },
    },
    MutableField {
        name: "schedule",
        restore: |patched, old| patched.schedule = old.schedule.clone(),
    },
    MutableField {
        name: "concurrencyPolicy",
        restore: |patched, old| patched.concurrency_policy = old.concurrency_policy.clone(),
    },
    MutableField {
        name: "successfulJobsHistoryLimit",
        restore: |patched, old| {
            patched.successful_jobs_history_limit = old.successful_jobs_history_limit
        },
    },
    MutableField {
        name: "failedJobsHistoryLimit",
        restore: |patched, old| patched.failed_jobs_history_limit = old.failed_jobs_history_limit,
    },
    MutableField {
        name: "startingDeadlineSeconds",
        restore: |patched, old| patched.starting_deadline_seconds = old.starting_deadline_seconds,
    },
    MutableField {
        name: "timeZone",
        restore: |patched, old| patched.time_zone = old.time_zone.clone(),
    },
    MutableField {
        name: "paused",
        restore: |patched, old| patched.paused = old.paused,
    },
];

/// Builds the rejection message, e.g. "... fields other than 'a', 'b' and 'c'
/// are forbidden".
fn forbidden_update_message() -> String {
    let quoted: Vec<String> = MUTABLE_FIELDS
        .iter()
        .map(|f| format!("'{}'", f.name))
        .collect();
    let listed = match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    };
    format!(
        "updates to advancedcronjob spec for fields other than {} are forbidden",
        listed
    )
}

/// Returns a single forbidden error when `new` differs from `old` outside
/// the mutable fields.
pub fn validate_spec_update(new: &AdvancedCronJobSpec, old: &AdvancedCronJobSpec) -> ErrorList {
    let mut patched = new.clone();
    for field in MUTABLE_FIELDS {
        (field.restore)(&mut patched, old);
    }
    if !semantic_eq(&patched, old) {
        log::trace!("validate_spec_update - spec changed outside the mutable fields");
        return vec![FieldError::forbidden(
            &Path::new("spec"),
            &forbidden_update_message(),
        )];
    }
    ErrorList::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acj_shared::acj::v1beta1::{
        ConcurrencyPolicy, CronJobTemplate, ImageListPullJobSpec, ImageListPullJobTemplateSpec,
    };
    use k8s_openapi::api::batch::v1::{JobSpec, JobTemplateSpec};
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn job_spec(image: &str) -> AdvancedCronJobSpec {
        AdvancedCronJobSpec {
            schedule: "*/10 * * * *".to_string(),
            concurrency_policy: Some(ConcurrencyPolicy::Allow),
            template: CronJobTemplate {
                job_template: Some(JobTemplateSpec {
                    metadata: None,
                    spec: Some(JobSpec {
                        template: PodTemplateSpec {
                            metadata: None,
                            spec: Some(PodSpec {
                                containers: vec![Container {
                                    name: "main".to_string(),
                                    image: Some(image.to_string()),
                                    ..Default::default()
                                }],
                                ..Default::default()
                            }),
                        },
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn image_list_template(images: &[&str]) -> ImageListPullJobTemplateSpec {
        ImageListPullJobTemplateSpec {
            metadata: None,
            spec: ImageListPullJobSpec {
                images: images.iter().map(|i| i.to_string()).collect(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_forbidden_message() {
        assert_eq!(
            "updates to advancedcronjob spec for fields other than 'imageListPullJobTemplate', 'schedule', 'concurrencyPolicy', 'successfulJobsHistoryLimit', 'failedJobsHistoryLimit', 'startingDeadlineSeconds', 'timeZone' and 'paused' are forbidden",
            forbidden_update_message()
        );
    }

    #[test]
    fn test_mutable_fields_may_change() {
        let old = job_spec("busybox");
        let mut new = old.clone();
        new.paused = true;
        assert!(validate_spec_update(&new, &old).is_empty());

        new.schedule = "@hourly".to_string();
        new.concurrency_policy = Some(ConcurrencyPolicy::Forbid);
        new.successful_jobs_history_limit = Some(10);
        new.failed_jobs_history_limit = Some(2);
        new.starting_deadline_seconds = Some(60);
        new.time_zone = Some("UTC".to_string());
        assert!(validate_spec_update(&new, &old).is_empty());
    }

    #[test]
    fn test_job_template_change_is_forbidden() {
        let old = job_spec("busybox");
        let new = job_spec("busybox:1.36");
        let errs = validate_spec_update(&new, &old);
        assert_eq!(1, errs.len());
        assert_eq!("spec", errs[0].field);
        assert_eq!(forbidden_update_message(), errs[0].detail);
    }

    #[test]
    fn test_semantically_equal_template_is_unchanged() {
        let old = job_spec("busybox");
        let mut new = old.clone();
        let container = &mut new
            .template
            .job_template
            .as_mut()
            .unwrap()
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap()
            .containers[0];
        container.args = Some(Vec::new());
        assert!(validate_spec_update(&new, &old).is_empty());

        let with_cpu = |cpu: &str| {
            let mut spec = old.clone();
            let pod = spec
                .template
                .job_template
                .as_mut()
                .unwrap()
                .spec
                .as_mut()
                .unwrap()
                .template
                .spec
                .as_mut()
                .unwrap();
            pod.containers[0].resources = Some(ResourceRequirements {
                limits: Some(BTreeMap::from([(
                    "cpu".to_string(),
                    Quantity(cpu.to_string()),
                )])),
                ..Default::default()
            });
            spec
        };
        assert!(validate_spec_update(&with_cpu("1000m"), &with_cpu("1")).is_empty());
        assert_eq!(1, validate_spec_update(&with_cpu("2"), &with_cpu("1")).len());
    }

    #[test]
    fn test_image_list_template_may_change_when_present() {
        let mut old = job_spec("busybox");
        old.template.job_template = None;
        old.template.image_list_pull_job_template = Some(image_list_template(&["nginx"]));
        let mut new = old.clone();
        new.template.image_list_pull_job_template = Some(image_list_template(&["nginx", "redis"]));
        assert!(validate_spec_update(&new, &old).is_empty());
    }

    #[test]
    fn test_image_list_template_addition_is_rejected() {
        let old = job_spec("busybox");
        let mut new = old.clone();
        new.template.image_list_pull_job_template = Some(image_list_template(&["nginx"]));
        // the old object has no template to restore, so the addition survives
        // patching and is reported
        assert_eq!(1, validate_spec_update(&new, &old).len());

        let mut old = old;
        old.template.job_template = None;
        let mut new = old.clone();
        new.template.image_list_pull_job_template = Some(image_list_template(&["nginx"]));
        assert_eq!(1, validate_spec_update(&new, &old).len());
    }

    #[test]
    fn test_image_list_template_removal_is_masked() {
        let mut old = job_spec("busybox");
        old.template.job_template = None;
        old.template.image_list_pull_job_template = Some(image_list_template(&["nginx"]));
        let mut new = old.clone();
        new.template.image_list_pull_job_template = None;
        // restored from the old object before comparing
        assert!(validate_spec_update(&new, &old).is_empty());
    }
}
