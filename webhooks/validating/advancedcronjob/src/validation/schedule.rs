use acj_shared::acj::schedule::{parse_standard, ScheduleError, StandardSchedule};
use acj_shared::acj::v1beta1::AdvancedCronJobSpec;
use acj_shared::k8s::{ErrorList, FieldError, Path};
use std::any::Any;
use std::panic::{self, UnwindSafe};

/// Validates `schedule` together with `timeZone`: the schedule must be a
/// non-empty standard cron expression, and a zone may be given either in the
/// schedule (`TZ=`/`CRON_TZ=`) or in `timeZone`, never both.
pub fn validate_schedule(spec: &AdvancedCronJobSpec, fld_path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let path = fld_path.child("schedule");
    if spec.schedule.is_empty() {
        all_errs.push(FieldError::invalid(
            &path,
            &spec.schedule,
            "schedule cannot be empty, please provide valid cron schedule.",
        ));
    }

    if let Err(e) = validate_cron_schedule(&spec.schedule) {
        all_errs.push(FieldError::invalid(&path, &spec.schedule, &e));
    }

    if spec.schedule.contains("TZ") && spec.time_zone.is_some() {
        all_errs.push(FieldError::invalid(
            &path,
            &spec.schedule,
            "cannot use both timeZone field and TZ or CRON_TZ in schedule",
        ));
    }
    all_errs
}

/// Parses `schedule`, turning both parse errors and parser panics into an
/// error message.
pub fn validate_cron_schedule(schedule: &str) -> Result<(), String> {
    contain_parser_panic(|| parse_standard(schedule)).map(|_| ())
}

/// The only place a fault inside the cron parser is caught. A panic becomes
/// an ordinary error so that one malformed schedule cannot take down the
/// request.
fn contain_parser_panic<F>(parse: F) -> Result<StandardSchedule, String>
where
    F: FnOnce() -> Result<StandardSchedule, ScheduleError> + UnwindSafe,
{
    match panic::catch_unwind(parse) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            log::error!("contain_parser_panic - cron parser panicked: {}", reason);
            Err(format!("invalid cron schedule: {}", reason))
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
