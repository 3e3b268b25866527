use acj_shared::acj::schedule::load_location;
use acj_shared::k8s::{ErrorList, FieldError, Path};

/// Validates the optional `timeZone` of a spec. Unset is valid; otherwise
/// the value must be an explicit IANA zone name.
pub fn validate_time_zone(time_zone: Option<&str>, fld_path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let time_zone = match time_zone {
        Some(tz) => tz,
        None => return all_errs,
    };

    if time_zone.is_empty() {
        all_errs.push(FieldError::invalid(
            fld_path,
            time_zone,
            "timeZone must be nil or non-empty string",
        ));
        return all_errs;
    }

    // "Local" means different things on different machines
    if time_zone.eq_ignore_ascii_case("Local") {
        all_errs.push(FieldError::invalid(
            fld_path,
            time_zone,
            "timeZone must be an explicit time zone as defined in https://www.iana.org/time-zones",
        ));
        return all_errs;
    }

    if let Err(e) = load_location(time_zone) {
        all_errs.push(FieldError::invalid(fld_path, time_zone, &e));
    }
    all_errs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Path {
        Path::new("spec").child("timeZone")
    }

    #[test]
    fn test_unset_and_valid_zones() {
        assert!(validate_time_zone(None, &path()).is_empty());
        for tz in ["UTC", "Asia/Shanghai", "America/Argentina/Buenos_Aires", "Etc/GMT+5"] {
            assert!(validate_time_zone(Some(tz), &path()).is_empty(), "{}", tz);
        }
    }

    #[test]
    fn test_empty_zone() {
        let errs = validate_time_zone(Some(""), &path());
        assert_eq!(1, errs.len());
        assert_eq!("spec.timeZone", errs[0].field);
        assert!(errs[0].detail.contains("non-empty"));
    }

    #[test]
    fn test_local_zone_any_casing() {
        for tz in ["Local", "local", "LOCAL", "lOcAl"] {
            let errs = validate_time_zone(Some(tz), &path());
            assert_eq!(1, errs.len(), "{}", tz);
            assert!(errs[0].detail.contains("explicit time zone"));
        }
    }

    #[test]
    fn test_unknown_zone() {
        let errs = validate_time_zone(Some("Moon/Tranquility"), &path());
        assert_eq!(1, errs.len());
        assert_eq!("unknown time zone Moon/Tranquility", errs[0].detail);
    }
}
