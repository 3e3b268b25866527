pub mod image_list;
pub mod metadata;
pub mod pod_template;
pub mod schedule;
pub mod template;
pub mod timezone;

use acj_shared::acj::v1beta1::{AdvancedCronJob, AdvancedCronJobSpec};
use acj_shared::k8s::{ErrorList, FieldError, Path};
use pod_template::PodTemplateValidator;

/// Validates a spec: schedule, template, numeric limits and time zone, in
/// that order. Errors are accumulated rather than short-circuited.
pub fn validate_advanced_cron_job_spec(
    spec: &AdvancedCronJobSpec,
    fld_path: &Path,
    pod_validator: &dyn PodTemplateValidator,
) -> ErrorList {
    let mut all_errs = ErrorList::new();
    all_errs.extend(schedule::validate_schedule(spec, fld_path));
    all_errs.extend(template::validate_template(spec, fld_path, pod_validator));
    if let Some(deadline) = spec.starting_deadline_seconds {
        all_errs.extend(validate_nonnegative_field(
            deadline,
            &fld_path.child("startingDeadlineSeconds"),
        ));
    }
    if let Some(limit) = spec.successful_jobs_history_limit {
        all_errs.extend(validate_nonnegative_field(
            i64::from(limit),
            &fld_path.child("successfulJobsHistoryLimit"),
        ));
    }
    if let Some(limit) = spec.failed_jobs_history_limit {
        all_errs.extend(validate_nonnegative_field(
            i64::from(limit),
            &fld_path.child("failedJobsHistoryLimit"),
        ));
    }
    all_errs.extend(timezone::validate_time_zone(
        spec.time_zone.as_deref(),
        &fld_path.child("timeZone"),
    ));
    all_errs
}

/// Full validation of a new object
pub fn validate_advanced_cron_job(
    obj: &AdvancedCronJob,
    pod_validator: &dyn PodTemplateValidator,
) -> ErrorList {
    let mut all_errs = metadata::validate_object_meta(&obj.metadata, &Path::new("metadata"));
    all_errs.extend(validate_advanced_cron_job_spec(
        &obj.spec,
        &Path::new("spec"),
        pod_validator,
    ));
    all_errs
}

/// Full validation of an updated object: metadata against the stored
/// object, the new spec on its own, and the mutable-field contract.
pub fn validate_advanced_cron_job_update(
    obj: &AdvancedCronJob,
    old_obj: &AdvancedCronJob,
    pod_validator: &dyn PodTemplateValidator,
) -> ErrorList {
    let mut all_errs = metadata::validate_object_meta_update(
        &obj.metadata,
        &old_obj.metadata,
        &Path::new("metadata"),
    );
    all_errs.extend(validate_advanced_cron_job_spec(
        &obj.spec,
        &Path::new("spec"),
        pod_validator,
    ));
    all_errs.extend(crate::update::validate_spec_update(&obj.spec, &old_obj.spec));
    all_errs
}

fn validate_nonnegative_field(value: i64, fld_path: &Path) -> Option<FieldError> {
    if value < 0 {
        return Some(FieldError::invalid(
            fld_path,
            &value,
            "must be greater than or equal to 0",
        ));
    }
    None
}
