//! Standard cron grammar and schedule formatting.
//!
//! The grammar is the classic five field form `minute hour day-of-month month
//! day-of-week` with day-of-week 0-6 (0 is Sunday), the `@hourly` family of
//! descriptors, `@every <duration>`, and an optional `TZ=<zone>` or
//! `CRON_TZ=<zone>` prefix. Field syntax itself is handled by the `cron` crate.
use super::v1beta1::AdvancedCronJob;
use chrono_tz::Tz;
use kube::ResourceExt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Number of fields in a standard cron expression
pub const STANDARD_FIELD_COUNT: usize = 5;

const TZ_PREFIX: &str = "TZ=";
const CRON_TZ_PREFIX: &str = "CRON_TZ=";
const EVERY_DESCRIPTOR: &str = "@every ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("empty spec string")]
    Empty,

    #[error("provided bad location {location}: {reason}")]
    BadLocation { location: String, reason: String },

    #[error("missing schedule after time zone in {0:?}")]
    MissingExpression(String),

    #[error("unrecognized descriptor: {0}")]
    UnrecognizedDescriptor(String),

    #[error("failed to parse duration {duration}: {reason}")]
    BadDuration { duration: String, reason: String },

    #[error("expected exactly {STANDARD_FIELD_COUNT} fields, found {found}: {spec:?}")]
    FieldCount { found: usize, spec: String },

    #[error("failed to parse {spec:?}: {reason}")]
    Expression { spec: String, reason: String },
}

#[derive(Clone, Debug)]
pub enum ScheduleKind {
    Cron(cron::Schedule),
    Every(Duration),
}

/// A parsed schedule and the zone it is evaluated in, if one was embedded.
#[derive(Clone, Debug)]
pub struct StandardSchedule {
    pub location: Option<Tz>,
    pub kind: ScheduleKind,
}

/// Resolves an IANA zone name against the bundled timezone database.
pub fn load_location(name: &str) -> Result<Tz, String> {
    Tz::from_str(name).map_err(|_| format!("unknown time zone {}", name))
}

/// Parses a schedule in the standard grammar.
///
/// ```
/// use acj_shared::acj::schedule::parse_standard;
///
/// assert!(parse_standard("*/5 * * * *").is_ok());
/// assert!(parse_standard("TZ=Asia/Shanghai 0 9 * * 1-5").is_ok());
/// assert!(parse_standard("* * *").is_err());
/// ```
pub fn parse_standard(spec: &str) -> Result<StandardSchedule, ScheduleError> {
    if spec.is_empty() {
        return Err(ScheduleError::Empty);
    }

    let mut location = None;
    let mut expression = spec;
    if spec.starts_with(TZ_PREFIX) || spec.starts_with(CRON_TZ_PREFIX) {
        let (zone_part, rest) = spec
            .split_once(' ')
            .ok_or_else(|| ScheduleError::MissingExpression(spec.to_string()))?;
        let zone = zone_part.split_once('=').map_or("", |(_, zone)| zone);
        location = Some(load_location(zone).map_err(|reason| ScheduleError::BadLocation {
            location: zone.to_string(),
            reason,
        })?);
        expression = rest.trim();
    }

    if expression.starts_with('@') {
        let kind = parse_descriptor(expression)?;
        return Ok(StandardSchedule { location, kind });
    }

    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != STANDARD_FIELD_COUNT {
        return Err(ScheduleError::FieldCount {
            found: fields.len(),
            spec: expression.to_string(),
        });
    }
    let kind = ScheduleKind::Cron(parse_fields(&fields, expression)?);
    Ok(StandardSchedule { location, kind })
}

fn parse_descriptor(descriptor: &str) -> Result<ScheduleKind, ScheduleError> {
    let expression = match descriptor {
        "@yearly" | "@annually" => "0 0 0 1 1 *",
        "@monthly" => "0 0 0 1 * *",
        "@weekly" => "0 0 0 * * 1",
        "@daily" | "@midnight" => "0 0 0 * * *",
        "@hourly" => "0 0 * * * *",
        _ => {
            if let Some(duration) = descriptor.strip_prefix(EVERY_DESCRIPTOR) {
                let parsed = humantime::parse_duration(duration.trim()).map_err(|e| {
                    ScheduleError::BadDuration {
                        duration: duration.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                // sub-second intervals run once per second
                return Ok(ScheduleKind::Every(parsed.max(Duration::from_secs(1))));
            }
            return Err(ScheduleError::UnrecognizedDescriptor(descriptor.to_string()));
        }
    };
    cron::Schedule::from_str(expression)
        .map(ScheduleKind::Cron)
        .map_err(|e| ScheduleError::Expression {
            spec: descriptor.to_string(),
            reason: e.to_string(),
        })
}

/// Converts the five standard fields into the seconds-first form the `cron`
/// crate understands and parses it. A bare `?` stands for `*` in any field.
fn parse_fields(fields: &[&str], spec: &str) -> Result<cron::Schedule, ScheduleError> {
    let fields: Vec<&str> = fields
        .iter()
        .map(|field| if *field == "?" { "*" } else { *field })
        .collect();
    let expression = format!(
        "0 {} {} {} {} {}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        shift_weekdays(fields[4])
    );
    cron::Schedule::from_str(&expression).map_err(|e| ScheduleError::Expression {
        spec: spec.to_string(),
        reason: e.to_string(),
    })
}

/// Day-of-week numbers are 0-6 in the standard grammar and 1-7 in the `cron`
/// crate; names and steps are left untouched.
fn shift_weekdays(field: &str) -> String {
    field
        .split(',')
        .map(|part| {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (part, None),
            };
            let range = range
                .split('-')
                .map(|bound| {
                    bound
                        .parse::<u32>()
                        .ok()
                        .and_then(|n| n.checked_add(1))
                        .map_or_else(|| bound.to_string(), |n| n.to_string())
                })
                .collect::<Vec<String>>()
                .join("-");
            match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            }
        })
        .collect::<Vec<String>>()
        .join(",")
}

/// Returns the schedule string handed to a live scheduler: the schedule
/// prefixed with `TZ=<zone>` when a time zone is set and the schedule does
/// not already embed one. A zone that fails to load is logged and the
/// schedule is used as is.
pub fn format_schedule(acj: &AdvancedCronJob) -> String {
    let schedule = &acj.spec.schedule;
    if schedule.contains("TZ") {
        return schedule.clone();
    }
    match &acj.spec.time_zone {
        Some(time_zone) => match load_location(time_zone) {
            Ok(_) => format!("{}{} {}", TZ_PREFIX, time_zone, schedule),
            Err(e) => {
                log::error!(
                    "format_schedule - failed to load location {} for AdvancedCronJob {}/{}: {}",
                    time_zone,
                    acj.namespace().unwrap_or_default(),
                    acj.name_any(),
                    e
                );
                schedule.clone()
            }
        },
        None => schedule.clone(),
    }
}
