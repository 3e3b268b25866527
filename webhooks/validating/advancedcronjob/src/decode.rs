//! Decoding of admitted objects at any served version into the canonical
//! `v1beta1` form.
use acj_shared::acj::{v1alpha1, v1beta1, ConversionError};
use acj_shared::acj::{API_VERSION_V1ALPHA1, API_VERSION_V1BETA1};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode AdvancedCronJob: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to convert v1alpha1->v1beta1: {0}")]
    Conversion(#[from] ConversionError),

    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("there is no {0} in the request")]
    MissingObject(&'static str),
}

/// Decodes `raw` as an AdvancedCronJob of the declared `version`. Deprecated
/// versions are decoded in their own shape and converted; unknown versions
/// are rejected without attempting to decode.
pub fn decode_advanced_cron_job(
    raw: &[u8],
    version: &str,
) -> Result<v1beta1::AdvancedCronJob, DecodeError> {
    log::trace!("decode_advanced_cron_job - decoding version {}", version);
    match version {
        API_VERSION_V1BETA1 => Ok(serde_json::from_slice(raw)?),
        API_VERSION_V1ALPHA1 => {
            let legacy: v1alpha1::AdvancedCronJob = serde_json::from_slice(raw)?;
            Ok(v1beta1::AdvancedCronJob::try_from(legacy)?)
        }
        other => Err(DecodeError::UnsupportedVersion(other.to_string())),
    }
}
