//! Validation of image-list-pull-job templates.
//!
//! Checks run in a fixed order and stop at the first violation: selectors,
//! then images, then the completion policy.
use acj_shared::acj::v1beta1::{CompletionPolicyType, ImageListPullJobTemplateSpec};
use acj_shared::image::normalize_image_ref;
use acj_shared::k8s::selector::label_selector_as_selector;
use acj_shared::k8s::{ErrorList, FieldError, Path};
use std::collections::HashSet;

pub const MAX_IMAGES: usize = 255;
pub const MAX_ACTIVE_DEADLINE_SECONDS: i64 = 3600 * 24;
pub const MAX_TTL_SECONDS_AFTER_FINISHED: i32 = 3600 * 24 * 3;

pub fn validate_image_list_pull_job_template(
    template: &ImageListPullJobTemplateSpec,
    fld_path: &Path,
) -> ErrorList {
    match check_image_list_pull_job_template(template, &fld_path.child("spec")) {
        Ok(()) => ErrorList::new(),
        Err(e) => vec![e],
    }
}

fn check_image_list_pull_job_template(
    template: &ImageListPullJobTemplateSpec,
    spec_path: &Path,
) -> Result<(), FieldError> {
    let spec = &template.spec;

    if let Some(selector) = &spec.selector {
        let selector_path = spec_path.child("selector");
        if selector.has_label_selector() {
            if selector.names.is_some() {
                return Err(FieldError::invalid(
                    &selector_path,
                    selector,
                    "can not set both names and labelSelector in this spec.selector",
                ));
            }
            if let Err(e) = label_selector_as_selector(&selector.label_selector) {
                return Err(FieldError::invalid(
                    &selector_path.child("labelSelector"),
                    &selector.label_selector,
                    &format!("invalid selector: {}", e),
                ));
            }
        }
        if let Some(names) = &selector.names {
            let unique: HashSet<&String> = names.iter().collect();
            if unique.len() != names.len() {
                return Err(FieldError::invalid(
                    &selector_path.child("names"),
                    names,
                    "duplicated name in selector names",
                ));
            }
        }
    }

    if let Some(pod_selector) = &spec.pod_selector {
        if spec.selector.is_some() {
            return Err(FieldError::invalid(
                spec_path,
                spec,
                "can not set both selector and podSelector",
            ));
        }
        if let Err(e) = label_selector_as_selector(&pod_selector.label_selector) {
            return Err(FieldError::invalid(
                &spec_path.child("podSelector").child("labelSelector"),
                &pod_selector.label_selector,
                &format!("invalid selector: {}", e),
            ));
        }
    }

    check_images(&spec.images, &spec_path.child("images"))?;

    let policy = &spec.completion_policy;
    let policy_path = spec_path.child("completionPolicy");
    if policy.policy_type != CompletionPolicyType::Always {
        return Err(FieldError::invalid(
            &policy_path.child("type"),
            &policy.policy_type,
            &format!(
                "completionPolicy should be Always, but current value is: {}",
                policy.policy_type
            ),
        ));
    }

    let deadline_path = policy_path.child("activeDeadlineSeconds");
    if let Some(deadline) = policy.active_deadline_seconds {
        if deadline > MAX_ACTIVE_DEADLINE_SECONDS {
            return Err(FieldError::invalid(
                &deadline_path,
                &deadline,
                &format!(
                    "activeDeadlineSeconds must be less than {}, current value is: {}",
                    MAX_ACTIVE_DEADLINE_SECONDS, deadline
                ),
            ));
        }
        let timeout = spec.pull_policy.as_ref().and_then(|p| p.timeout_seconds);
        if let Some(timeout) = timeout {
            if i64::from(timeout) >= deadline {
                return Err(FieldError::invalid(
                    &deadline_path,
                    &deadline,
                    &format!(
                        "completionPolicy.activeDeadlineSeconds must be greater than pullPolicy.timeoutSeconds({})",
                        timeout
                    ),
                ));
            }
        }
    }

    if let Some(ttl) = policy.ttl_seconds_after_finished {
        if ttl > MAX_TTL_SECONDS_AFTER_FINISHED {
            return Err(FieldError::invalid(
                &policy_path.child("ttlSecondsAfterFinished"),
                &ttl,
                &format!(
                    "ttlSecondsAfterFinished must be less than {}, current value is: {}",
                    MAX_TTL_SECONDS_AFTER_FINISHED, ttl
                ),
            ));
        }
    }
    Ok(())
}

/// Images must be present, bounded in number, pairwise distinct and each a
/// valid reference.
fn check_images(images: &[String], fld_path: &Path) -> Result<(), FieldError> {
    if images.is_empty() {
        return Err(FieldError::invalid(fld_path, images, "image can not be empty"));
    }
    if images.len() > MAX_IMAGES {
        return Err(FieldError::invalid(
            fld_path,
            images,
            &format!("the maximum number of images cannot > {}", MAX_IMAGES),
        ));
    }
    // quadratic, but bounded by MAX_IMAGES
    for (i, image) in images.iter().enumerate() {
        if images[i + 1..].contains(image) {
            return Err(FieldError::invalid(
                fld_path,
                images,
                "images cannot have duplicate values",
            ));
        }
    }
    for image in images {
        if let Err(e) = normalize_image_ref(image) {
            return Err(FieldError::invalid(
                fld_path,
                images,
                &format!("invalid image {}: {}", image, e),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acj_shared::acj::v1beta1::{
        CompletionPolicy, ImageListPullJobSpec, ImagePullJobNodeSelector, ImagePullJobPodSelector,
        PullPolicy,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
    use std::collections::BTreeMap;

    fn template(images: &[&str]) -> ImageListPullJobTemplateSpec {
        ImageListPullJobTemplateSpec {
            metadata: None,
            spec: ImageListPullJobSpec {
                images: images.iter().map(|i| i.to_string()).collect(),
                ..Default::default()
            },
        }
    }

    fn validate(template: &ImageListPullJobTemplateSpec) -> ErrorList {
        validate_image_list_pull_job_template(
            template,
            &Path::new("spec").child("template").child("imageListPullJobTemplate"),
        )
    }

    fn label_selector(key: &str, value: &str) -> LabelSelector {
        LabelSelector {
            match_labels: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
            match_expressions: None,
        }
    }

    #[test]
    fn test_valid_template() {
        let mut t = template(&["nginx", "busybox:1.36", "quay.io/coreos/etcd:v3.5"]);
        t.spec.selector = Some(ImagePullJobNodeSelector {
            names: None,
            label_selector: label_selector("pool", "gpu"),
        });
        t.spec.pull_policy = Some(PullPolicy {
            backoff_limit: Some(3),
            timeout_seconds: Some(300),
        });
        t.spec.completion_policy = CompletionPolicy {
            policy_type: CompletionPolicyType::Always,
            active_deadline_seconds: Some(600),
            ttl_seconds_after_finished: Some(3600),
        };
        assert!(validate(&t).is_empty());
    }

    #[test]
    fn test_normalized_image_list_is_valid() {
        let images: Vec<String> = (0..MAX_IMAGES)
            .map(|i| format!("docker.io/library/app{}:latest", i))
            .collect();
        let refs: Vec<&str> = images.iter().map(String::as_str).collect();
        assert!(validate(&template(&refs)).is_empty());
    }

    #[test]
    fn test_selector_names_and_labels_are_exclusive() {
        let mut t = template(&["nginx"]);
        t.spec.selector = Some(ImagePullJobNodeSelector {
            names: Some(vec!["node-1".to_string()]),
            label_selector: label_selector("pool", "gpu"),
        });
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "spec.template.imageListPullJobTemplate.spec.selector",
            errs[0].field
        );
    }

    #[test]
    fn test_invalid_label_selector() {
        let mut t = template(&["nginx"]);
        t.spec.selector = Some(ImagePullJobNodeSelector {
            names: None,
            label_selector: LabelSelector {
                match_labels: None,
                match_expressions: Some(vec![LabelSelectorRequirement {
                    key: "zone".to_string(),
                    operator: "Near".to_string(),
                    values: None,
                }]),
            },
        });
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "spec.template.imageListPullJobTemplate.spec.selector.labelSelector",
            errs[0].field
        );
        assert!(errs[0].detail.starts_with("invalid selector: "));
    }

    #[test]
    fn test_duplicate_selector_names() {
        let mut t = template(&["nginx"]);
        t.spec.selector = Some(ImagePullJobNodeSelector {
            names: Some(vec!["node-1".to_string(), "node-1".to_string()]),
            label_selector: LabelSelector::default(),
        });
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!("duplicated name in selector names", errs[0].detail);
    }

    #[test]
    fn test_selector_and_pod_selector_are_exclusive() {
        let mut t = template(&["nginx"]);
        t.spec.selector = Some(ImagePullJobNodeSelector {
            names: Some(vec!["node-1".to_string()]),
            label_selector: LabelSelector::default(),
        });
        t.spec.pod_selector = Some(ImagePullJobPodSelector {
            label_selector: label_selector("app", "web"),
        });
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!("can not set both selector and podSelector", errs[0].detail);

        t.spec.selector = None;
        assert!(validate(&t).is_empty());
    }

    #[test]
    fn test_image_rules() {
        let errs = validate(&template(&[]));
        assert_eq!("image can not be empty", errs[0].detail);

        let many: Vec<String> = (0..=MAX_IMAGES).map(|i| format!("app{}", i)).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let errs = validate(&template(&refs));
        assert_eq!("the maximum number of images cannot > 255", errs[0].detail);

        let errs = validate(&template(&["nginx", "busybox", "nginx"]));
        assert_eq!(1, errs.len());
        assert_eq!("images cannot have duplicate values", errs[0].detail);
        assert_eq!(
            "spec.template.imageListPullJobTemplate.spec.images",
            errs[0].field
        );

        let errs = validate(&template(&["nginx", "Not A Valid Image"]));
        assert_eq!(1, errs.len());
        assert!(errs[0].detail.starts_with("invalid image Not A Valid Image: "));
    }

    #[test]
    fn test_images_checked_before_completion_policy() {
        let mut t = template(&["nginx", "nginx"]);
        t.spec.completion_policy.policy_type = CompletionPolicyType::Never;
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!("images cannot have duplicate values", errs[0].detail);
    }

    #[test]
    fn test_unknown_completion_policy_type_rejected() {
        let mut t = template(&["nginx"]);
        t.spec.completion_policy.policy_type = CompletionPolicyType::Other("Foo".to_string());
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(Some(serde_json::json!("Foo")), errs[0].bad_value);
        assert_eq!(
            "completionPolicy should be Always, but current value is: Foo",
            errs[0].detail
        );
    }

    #[test]
    fn test_completion_policy_type_must_be_always() {
        let mut t = template(&["nginx"]);
        t.spec.completion_policy = CompletionPolicy {
            policy_type: CompletionPolicyType::Never,
            // out of range, but not evaluated for a rejected type
            active_deadline_seconds: Some(90000),
            ttl_seconds_after_finished: Some(999_999),
        };
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "spec.template.imageListPullJobTemplate.spec.completionPolicy.type",
            errs[0].field
        );
        assert_eq!(
            "completionPolicy should be Always, but current value is: Never",
            errs[0].detail
        );
    }

    #[test]
    fn test_active_deadline_bounds() {
        let mut t = template(&["nginx"]);
        t.spec.completion_policy.active_deadline_seconds = Some(90000);
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "activeDeadlineSeconds must be less than 86400, current value is: 90000",
            errs[0].detail
        );

        t.spec.completion_policy.active_deadline_seconds = Some(MAX_ACTIVE_DEADLINE_SECONDS);
        assert!(validate(&t).is_empty());
    }

    #[test]
    fn test_active_deadline_must_exceed_pull_timeout() {
        let mut t = template(&["nginx"]);
        t.spec.completion_policy.active_deadline_seconds = Some(300);
        t.spec.pull_policy = Some(PullPolicy {
            backoff_limit: None,
            timeout_seconds: Some(300),
        });
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "completionPolicy.activeDeadlineSeconds must be greater than pullPolicy.timeoutSeconds(300)",
            errs[0].detail
        );

        t.spec.completion_policy.active_deadline_seconds = Some(301);
        assert!(validate(&t).is_empty());
    }

    #[test]
    fn test_ttl_bound() {
        let mut t = template(&["nginx"]);
        t.spec.completion_policy.ttl_seconds_after_finished = Some(MAX_TTL_SECONDS_AFTER_FINISHED + 1);
        let errs = validate(&t);
        assert_eq!(1, errs.len());
        assert_eq!(
            "spec.template.imageListPullJobTemplate.spec.completionPolicy.ttlSecondsAfterFinished",
            errs[0].field
        );

        t.spec.completion_policy.ttl_seconds_after_finished = Some(MAX_TTL_SECONDS_AFTER_FINISHED);
        assert!(validate(&t).is_empty());
    }
}
