//! Normalization of container image references.
//!
//! A reference is `[domain/]path[:tag][@digest]`. Normalizing fills in the
//! Docker Hub defaults the same way the container runtimes do, so that
//! `nginx` and `docker.io/library/nginx:latest` name the same image.
use regex::Regex;
use thiserror::Error;

pub const DEFAULT_DOMAIN: &str = "docker.io";
pub const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
pub const OFFICIAL_REPO_PREFIX: &str = "library/";
pub const DEFAULT_TAG: &str = "latest";
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

lazy_static! {
    static ref REFERENCE_REGEX: Regex = {
        let alphanumeric = "[a-z0-9]+";
        let separator = "(?:[._]|__|[-]+)";
        let path_component = format!("{a}(?:{s}{a})*", a = alphanumeric, s = separator);
        let domain_component = "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
        let host = format!(
            r"(?:{d}(?:\.{d})*|\[[a-fA-F0-9:]+\])",
            d = domain_component
        );
        let domain = format!("{}(?::[0-9]+)?", host);
        let name = format!("(?:{}/)?{p}(?:/{p})*", domain, p = path_component);
        let tag = r"[\w][\w.-]{0,127}";
        let digest = "[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}";
        Regex::new(&format!("^({})(?::({}))?(?:@({}))?$", name, tag, digest)).unwrap()
    };
    static ref ANCHORED_IDENTIFIER_REGEX: Regex = Regex::new("^[a-f0-9]{64}$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("invalid repository name ({0}), cannot specify 64-byte hexadecimal strings")]
    HexIdentifier(String),

    #[error("invalid reference format: repository name ({0}) must be lowercase")]
    NameContainsUppercase(String),

    #[error("repository name must not be more than {NAME_TOTAL_LENGTH_MAX} characters")]
    NameTooLong,

    #[error("invalid reference format")]
    InvalidFormat,
}

/// A reference in its fully-qualified form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    pub domain: String,
    pub path: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    pub fn name(&self) -> String {
        format!("{}/{}", self.domain, self.path)
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Splits off the registry domain. The first path element is a domain only
/// when it looks like a host name, a host with a port, or `localhost`.
fn split_domain(name: &str) -> (String, String) {
    let (domain, remainder) = match name.find('/') {
        Some(i) => {
            let first = &name[..i];
            if first.contains(['.', ':']) || first == "localhost" || first.to_lowercase() != first {
                (first.to_string(), name[i + 1..].to_string())
            } else {
                (DEFAULT_DOMAIN.to_string(), name.to_string())
            }
        }
        None => (DEFAULT_DOMAIN.to_string(), name.to_string()),
    };
    let domain = if domain == LEGACY_DEFAULT_DOMAIN {
        DEFAULT_DOMAIN.to_string()
    } else {
        domain
    };
    let remainder = if domain == DEFAULT_DOMAIN && !remainder.contains('/') {
        format!("{}{}", OFFICIAL_REPO_PREFIX, remainder)
    } else {
        remainder
    };
    (domain, remainder)
}

/// Parses `image` with Docker Hub defaults applied, without adding a tag.
pub fn parse_normalized_named(image: &str) -> Result<ImageReference, ImageRefError> {
    if ANCHORED_IDENTIFIER_REGEX.is_match(image) {
        return Err(ImageRefError::HexIdentifier(image.to_string()));
    }
    let (domain, remainder) = split_domain(image);
    let remote_name = match remainder.find(':') {
        Some(i) => &remainder[..i],
        None => remainder.as_str(),
    };
    if remote_name.to_lowercase() != remote_name {
        return Err(ImageRefError::NameContainsUppercase(remote_name.to_string()));
    }
    parse(&format!("{}/{}", domain, remainder))
}

fn parse(reference: &str) -> Result<ImageReference, ImageRefError> {
    let captures = match REFERENCE_REGEX.captures(reference) {
        Some(captures) => captures,
        None => {
            if REFERENCE_REGEX.is_match(&reference.to_lowercase()) {
                return Err(ImageRefError::NameContainsUppercase(reference.to_string()));
            }
            return Err(ImageRefError::InvalidFormat);
        }
    };
    let name = captures.get(1).map_or("", |m| m.as_str());
    if name.len() > NAME_TOTAL_LENGTH_MAX {
        return Err(ImageRefError::NameTooLong);
    }
    let (domain, path) = match name.split_once('/') {
        Some((domain, path)) => (domain.to_string(), path.to_string()),
        None => return Err(ImageRefError::InvalidFormat),
    };
    Ok(ImageReference {
        domain,
        path,
        tag: captures.get(2).map(|m| m.as_str().to_string()),
        digest: captures.get(3).map(|m| m.as_str().to_string()),
    })
}

/// Normalizes an image reference, tagging it `latest` when it carries
/// neither a tag nor a digest.
///
/// ```
/// use acj_shared::image::normalize_image_ref;
///
/// assert_eq!(
///     "docker.io/library/nginx:latest",
///     normalize_image_ref("nginx").unwrap()
/// );
/// ```
pub fn normalize_image_ref(image: &str) -> Result<String, ImageRefError> {
    let mut reference = parse_normalized_named(image)?;
    if reference.tag.is_none() && reference.digest.is_none() {
        reference.tag = Some(DEFAULT_TAG.to_string());
    }
    Ok(reference.to_string())
}
