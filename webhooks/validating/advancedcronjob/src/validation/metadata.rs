//! Object metadata validation for AdvancedCronJob objects.
use acj_shared::k8s::validation::{
    is_qualified_name, is_valid_label_value, max_len_error, regex_error,
};
use acj_shared::k8s::{ErrorList, FieldError, Path};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::collections::BTreeMap;

pub const ADVANCED_CRON_JOB_NAME_MAX_LEN: usize = 63;
pub const TOTAL_ANNOTATION_SIZE_LIMIT_B: usize = 256 * (1 << 10);
const VALIDATE_ADVANCED_CRON_JOB_NAME_MSG: &str =
    "AdvancedCronJob name must consist of alphanumeric characters or '-'";
const VALID_ADVANCED_CRON_JOB_NAME_FMT: &str = r"^[a-zA-Z0-9\-]+$";

lazy_static! {
    static ref VALIDATE_ADVANCED_CRON_JOB_NAME_REGEX: Regex =
        Regex::new(VALID_ADVANCED_CRON_JOB_NAME_FMT).unwrap();
}

/// Name rule for AdvancedCronJobs. Jobs are named after their parent so the
/// name is held to a job-name-friendly subset.
pub fn validate_advanced_cron_job_name(name: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if !VALIDATE_ADVANCED_CRON_JOB_NAME_REGEX.is_match(name) {
        errs.push(regex_error(
            VALIDATE_ADVANCED_CRON_JOB_NAME_MSG,
            VALID_ADVANCED_CRON_JOB_NAME_FMT,
            "example-com",
        ));
    }
    if name.len() > ADVANCED_CRON_JOB_NAME_MAX_LEN {
        errs.push(max_len_error(ADVANCED_CRON_JOB_NAME_MAX_LEN));
    }
    errs
}

pub fn validate_labels(labels: Option<&BTreeMap<String, String>>, fld_path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    for (key, value) in labels.into_iter().flatten() {
        for msg in is_qualified_name(key) {
            all_errs.push(FieldError::invalid(fld_path, key, &msg));
        }
        for msg in is_valid_label_value(value) {
            all_errs.push(FieldError::invalid(fld_path, value, &msg));
        }
    }
    all_errs
}

pub fn validate_annotations(
    annotations: Option<&BTreeMap<String, String>>,
    fld_path: &Path,
) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let mut total_size = 0;
    for (key, value) in annotations.into_iter().flatten() {
        for msg in is_qualified_name(&key.to_lowercase()) {
            all_errs.push(FieldError::invalid(fld_path, key, &msg));
        }
        total_size += key.len() + value.len();
    }
    if total_size > TOTAL_ANNOTATION_SIZE_LIMIT_B {
        all_errs.push(FieldError::too_long(fld_path, TOTAL_ANNOTATION_SIZE_LIMIT_B));
    }
    all_errs
}

/// Validates the metadata of a new object. The resource is namespaced, so a
/// namespace is required.
pub fn validate_object_meta(meta: &ObjectMeta, fld_path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();

    if let Some(generate_name) = meta.generate_name.as_deref().filter(|n| !n.is_empty()) {
        for msg in validate_advanced_cron_job_name(generate_name) {
            all_errs.push(FieldError::invalid(
                &fld_path.child("generateName"),
                generate_name,
                &msg,
            ));
        }
    }

    match meta.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => {
            for msg in validate_advanced_cron_job_name(name) {
                all_errs.push(FieldError::invalid(&fld_path.child("name"), name, &msg));
            }
        }
        None if meta.generate_name.as_deref().map_or(true, str::is_empty) => {
            all_errs.push(FieldError::required(
                &fld_path.child("name"),
                "name or generateName is required",
            ));
        }
        None => {}
    }

    if meta.namespace.as_deref().map_or(true, str::is_empty) {
        all_errs.push(FieldError::required(&fld_path.child("namespace"), ""));
    }

    all_errs.extend(validate_labels(meta.labels.as_ref(), &fld_path.child("labels")));
    all_errs.extend(validate_annotations(
        meta.annotations.as_ref(),
        &fld_path.child("annotations"),
    ));
    all_errs
}

fn validate_immutable<T: PartialEq + serde::Serialize>(
    new: &T,
    old: &T,
    fld_path: &Path,
) -> Option<FieldError> {
    if new != old {
        return Some(FieldError::invalid(fld_path, new, "field is immutable"));
    }
    None
}

/// Validates the metadata of an updated object against the stored one.
pub fn validate_object_meta_update(new: &ObjectMeta, old: &ObjectMeta, fld_path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    all_errs.extend(validate_immutable(&new.name, &old.name, &fld_path.child("name")));
    all_errs.extend(validate_immutable(
        &new.namespace,
        &old.namespace,
        &fld_path.child("namespace"),
    ));
    if old.uid.is_some() {
        all_errs.extend(validate_immutable(&new.uid, &old.uid, &fld_path.child("uid")));
    }
    if old.creation_timestamp.is_some() {
        all_errs.extend(validate_immutable(
            &new.creation_timestamp,
            &old.creation_timestamp,
            &fld_path.child("creationTimestamp"),
        ));
    }
    all_errs.extend(validate_labels(new.labels.as_ref(), &fld_path.child("labels")));
    all_errs.extend(validate_annotations(
        new.annotations.as_ref(),
        &fld_path.child("annotations"),
    ));
    all_errs
}
