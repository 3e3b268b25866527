//! Validation of the pod templates embedded in job and broadcast-job templates.
use super::metadata::{validate_annotations, validate_labels};
use acj_shared::k8s::validation::is_dns1123_label;
use acj_shared::k8s::{ErrorList, FieldError, Path};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use mockall::automock;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PodTemplateConversionError {
    #[error("failed to convert pod template: pod template has no spec")]
    MissingSpec,
}

/// A pod template in the form the validator works on: unlike the wire
/// form, the pod spec is mandatory.
#[derive(Clone, Debug, PartialEq)]
pub struct CorePodTemplate {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

pub fn convert_pod_template(
    template: &PodTemplateSpec,
) -> Result<CorePodTemplate, PodTemplateConversionError> {
    let spec = template
        .spec
        .clone()
        .ok_or(PodTemplateConversionError::MissingSpec)?;
    Ok(CorePodTemplate {
        metadata: template.metadata.clone().unwrap_or_default(),
        spec,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodValidationOptions {
    pub restart_policies: &'static [&'static str],
}

impl Default for PodValidationOptions {
    fn default() -> Self {
        PodValidationOptions {
            restart_policies: &["Always", "OnFailure", "Never"],
        }
    }
}

/// This provides a mockable way to validate a pod template.
#[automock]
pub trait PodTemplateValidator {
    fn validate_pod_template(
        &self,
        template: &CorePodTemplate,
        fld_path: &Path,
        opts: &PodValidationOptions,
    ) -> ErrorList;
}

/// Structural checks of a pod template: metadata syntax, containers and
/// their names and images, restart policy and deadline.
#[derive(Clone, Debug, Default)]
pub struct DefaultPodTemplateValidator;

impl PodTemplateValidator for DefaultPodTemplateValidator {
    fn validate_pod_template(
        &self,
        template: &CorePodTemplate,
        fld_path: &Path,
        opts: &PodValidationOptions,
    ) -> ErrorList {
        let mut all_errs = ErrorList::new();
        let meta_path = fld_path.child("metadata");
        all_errs.extend(validate_labels(
            template.metadata.labels.as_ref(),
            &meta_path.child("labels"),
        ));
        all_errs.extend(validate_annotations(
            template.metadata.annotations.as_ref(),
            &meta_path.child("annotations"),
        ));
        all_errs.extend(validate_pod_spec(&template.spec, &fld_path.child("spec"), opts));
        all_errs
    }
}

fn validate_pod_spec(spec: &PodSpec, fld_path: &Path, opts: &PodValidationOptions) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let mut names = HashSet::new();

    let init_containers = spec.init_containers.as_deref().unwrap_or_default();
    all_errs.extend(validate_containers(
        init_containers,
        &fld_path.child("initContainers"),
        &mut names,
    ));

    let containers_path = fld_path.child("containers");
    if spec.containers.is_empty() {
        all_errs.push(FieldError::required(&containers_path, ""));
    }
    all_errs.extend(validate_containers(&spec.containers, &containers_path, &mut names));

    if let Some(restart_policy) = &spec.restart_policy {
        if !opts.restart_policies.contains(&restart_policy.as_str()) {
            all_errs.push(FieldError::not_supported(
                &fld_path.child("restartPolicy"),
                restart_policy,
                opts.restart_policies,
            ));
        }
    }

    if let Some(deadline) = spec.active_deadline_seconds {
        if deadline <= 0 {
            all_errs.push(FieldError::invalid(
                &fld_path.child("activeDeadlineSeconds"),
                &deadline,
                "must be greater than 0",
            ));
        }
    }
    all_errs
}

/// Container names are shared between init and regular containers, so the
/// set of seen names is threaded through both lists.
fn validate_containers(
    containers: &[Container],
    fld_path: &Path,
    names: &mut HashSet<String>,
) -> ErrorList {
    let mut all_errs = ErrorList::new();
    for (i, container) in containers.iter().enumerate() {
        let idx_path = fld_path.index(i);
        let name_path = idx_path.child("name");
        if container.name.is_empty() {
            all_errs.push(FieldError::required(&name_path, ""));
        } else {
            for msg in is_dns1123_label(&container.name) {
                all_errs.push(FieldError::invalid(&name_path, &container.name, &msg));
            }
            if !names.insert(container.name.clone()) {
                all_errs.push(FieldError::duplicate(&name_path, &container.name));
            }
        }

        let image_path = idx_path.child("image");
        match container.image.as_deref() {
            None | Some("") => all_errs.push(FieldError::required(&image_path, "")),
            Some(image) if image.trim() != image => all_errs.push(FieldError::invalid(
                &image_path,
                image,
                "must not have leading or trailing whitespace",
            )),
            Some(_) => {}
        }
    }
    all_errs
}
