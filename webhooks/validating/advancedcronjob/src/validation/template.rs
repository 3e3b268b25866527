use super::image_list::validate_image_list_pull_job_template;
use super::pod_template::{convert_pod_template, PodTemplateValidator, PodValidationOptions};
use acj_shared::acj::v1beta1::{AdvancedCronJobSpec, ConcurrencyPolicy, TemplateRef};
use acj_shared::k8s::{ErrorList, FieldError, Path};
use k8s_openapi::api::core::v1::PodTemplateSpec;

pub(crate) const MISSING_TEMPLATE_MSG: &str = "spec must have one template, either JobTemplate or BroadcastJobTemplate or ImageListPullJobTemplate should be provided";
const MULTIPLE_TEMPLATES_MSG: &str = "spec can have only one template, either JobTemplate or BroadcastJobTemplate or ImageListPullJobTemplate should be provided";

/// Validates every populated template member and then checks that exactly
/// one member is populated. The exclusivity error is reported even when the
/// members themselves are valid.
pub fn validate_template(
    spec: &AdvancedCronJobSpec,
    fld_path: &Path,
    pod_validator: &dyn PodTemplateValidator,
) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let templates = spec.template.populated();

    for template in &templates {
        match template {
            TemplateRef::Job(job) => {
                let pod_template = job
                    .spec
                    .as_ref()
                    .map(|s| s.template.clone())
                    .unwrap_or_default();
                all_errs.extend(validate_pod_template(&pod_template, fld_path, pod_validator));
            }
            TemplateRef::BroadcastJob(broadcast) => {
                all_errs.extend(validate_pod_template(
                    &broadcast.spec.template,
                    fld_path,
                    pod_validator,
                ));
            }
            TemplateRef::ImageListPullJob(image_list) => {
                match &spec.concurrency_policy {
                    Some(ConcurrencyPolicy::Replace) | Some(ConcurrencyPolicy::Forbid) => {}
                    other => {
                        let current = other.as_ref().map(|p| p.to_string()).unwrap_or_default();
                        all_errs.push(FieldError::invalid(
                            &fld_path.child("concurrencyPolicy"),
                            &current,
                            &format!(
                                "concurrencyPolicy should be Replace or Forbid, but current value is: {}",
                                current
                            ),
                        ));
                    }
                }
                all_errs.extend(validate_image_list_pull_job_template(
                    image_list,
                    &fld_path.child("template").child("imageListPullJobTemplate"),
                ));
            }
        }
    }

    match templates.len() {
        0 => all_errs.push(FieldError::forbidden(
            &fld_path.child("template"),
            MISSING_TEMPLATE_MSG,
        )),
        1 => {}
        _ => all_errs.push(FieldError::forbidden(
            &fld_path.child("template"),
            MULTIPLE_TEMPLATES_MSG,
        )),
    }
    all_errs
}

/// Converts a pod template and hands it to the pod-template validator. A
/// conversion failure is reported at the root path and skips validation.
fn validate_pod_template(
    template: &PodTemplateSpec,
    fld_path: &Path,
    pod_validator: &dyn PodTemplateValidator,
) -> ErrorList {
    match convert_pod_template(template) {
        Ok(core_template) => pod_validator.validate_pod_template(
            &core_template,
            &fld_path.child("template"),
            &PodValidationOptions::default(),
        ),
        Err(e) => vec![FieldError::invalid(&fld_path.root(), template, &e.to_string())],
    }
}
