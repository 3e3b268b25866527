//! Resource quantities ("500m", "1Gi", "2e3") reduced to an exact integer
//! count of nano-units, so that different spellings of the same amount
//! compare equal.

const NANO_EXPONENT: i32 = 9;
const MAX_POW10: i32 = 38;

/// Returns the suffix as a power of two and a power of ten.
fn parse_suffix(suffix: &str) -> Option<(u32, i32)> {
    let scale = match suffix {
        "" => (0, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (0, exponent.parse::<i32>().ok()?)
        }
    };
    Some(scale)
}

/// Parses `quantity` into nano-units, rounding fractions of a nano-unit up.
/// Returns `None` for malformed quantities and for amounts that do not fit.
pub fn parse_quantity(quantity: &str) -> Option<i128> {
    let (negative, unsigned) = match quantity.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, quantity.strip_prefix('+').unwrap_or(quantity)),
    };

    let number_end = unsigned
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let (pow2, pow10) = parse_suffix(suffix)?;
    let digits = format!("{}{}", whole, fraction);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > MAX_POW10 as usize {
        return None;
    }
    let mantissa = digits.parse::<i128>().ok()?;
    let mantissa = mantissa.checked_mul(1i128.checked_shl(pow2)?)?;

    let exponent = pow10
        .checked_add(NANO_EXPONENT)?
        .checked_sub(i32::try_from(fraction.len()).ok()?)?;
    let nanos = if exponent >= 0 {
        if exponent > MAX_POW10 {
            return None;
        }
        mantissa.checked_mul(10i128.pow(exponent as u32))?
    } else if -exponent > MAX_POW10 {
        1
    } else {
        let divisor = 10i128.pow((-exponent) as u32);
        (mantissa + divisor - 1) / divisor
    };
    Some(if negative { -nanos } else { nanos })
}
