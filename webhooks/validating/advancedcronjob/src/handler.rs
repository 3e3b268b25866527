//! Admission decisions for AdvancedCronJob create and update requests.
use crate::decode::{decode_advanced_cron_job, DecodeError};
use crate::validation::pod_template::{DefaultPodTemplateValidator, PodTemplateValidator};
use crate::validation::{validate_advanced_cron_job, validate_advanced_cron_job_update};
use acj_shared::acj::v1beta1::AdvancedCronJob;
use acj_shared::k8s::to_aggregate;
use kube::core::admission::Operation;

/// Status code of a request whose payload cannot be decoded
pub const BAD_REQUEST: u16 = 400;
/// Status code of a request whose object fails validation
pub const UNPROCESSABLE_ENTITY: u16 = 422;

/// The parts of an admission request the decision depends on. Objects are
/// kept as raw JSON so they can be decoded at their declared version.
#[derive(Clone, Debug)]
pub struct AdmissionRequest {
    pub operation: Operation,
    pub object: Option<Vec<u8>>,
    pub version: String,
    pub old_object: Option<Vec<u8>>,
    pub old_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allowed,
    Rejected { code: u16, message: String },
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed)
    }
}

/// Decides admission requests. Holds no per-request state, so one handler
/// can serve concurrent requests.
pub struct AdmissionHandler {
    pod_validator: Box<dyn PodTemplateValidator + Send + Sync>,
}

impl Default for AdmissionHandler {
    fn default() -> Self {
        AdmissionHandler::new(Box::new(DefaultPodTemplateValidator))
    }
}

impl AdmissionHandler {
    pub fn new(pod_validator: Box<dyn PodTemplateValidator + Send + Sync>) -> Self {
        AdmissionHandler { pod_validator }
    }

    pub fn handle(&self, request: &AdmissionRequest) -> AdmissionDecision {
        log::trace!(
            "handle - {:?} request at version {}",
            request.operation,
            request.version
        );
        if request.operation != Operation::Create && request.operation != Operation::Update {
            log::trace!("handle - allowing {:?} without inspection", request.operation);
            return AdmissionDecision::Allowed;
        }

        let obj = match decode_object(request.object.as_deref(), &request.version, "object") {
            Ok(obj) => obj,
            Err(e) => return reject(BAD_REQUEST, e.to_string()),
        };

        let all_errs = if request.operation == Operation::Create {
            validate_advanced_cron_job(&obj, self.pod_validator.as_ref())
        } else {
            let old_obj = match decode_object(
                request.old_object.as_deref(),
                &request.old_version,
                "oldObject",
            ) {
                Ok(old_obj) => old_obj,
                Err(e) => return reject(BAD_REQUEST, e.to_string()),
            };
            validate_advanced_cron_job_update(&obj, &old_obj, self.pod_validator.as_ref())
        };

        match to_aggregate(&all_errs) {
            Some(message) => reject(UNPROCESSABLE_ENTITY, message),
            None => {
                log::info!(
                    "handle - allowed {:?} of AdvancedCronJob {}/{}",
                    request.operation,
                    obj.metadata.namespace.as_deref().unwrap_or_default(),
                    obj.metadata.name.as_deref().unwrap_or_default()
                );
                AdmissionDecision::Allowed
            }
        }
    }
}

fn decode_object(
    raw: Option<&[u8]>,
    version: &str,
    name: &'static str,
) -> Result<AdvancedCronJob, DecodeError> {
    let raw = raw.ok_or(DecodeError::MissingObject(name))?;
    decode_advanced_cron_job(raw, version)
}

fn reject(code: u16, message: String) -> AdmissionDecision {
    log::warn!("handle - rejected with {}: {}", code, message);
    AdmissionDecision::Rejected { code, message }
}
