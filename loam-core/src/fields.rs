//! Coercion of loosely-typed store fields into typed nullable values.
//!
//! The snapshot store has no schema enforcement: every field is an
//! optional string written by an external producer. These parsers are the
//! single boundary where those strings become typed values; malformed
//! input is coerced to `None`, never an error.

/// Parse a float field. Blank or unparsable input yields `None`.
pub fn parse_f64(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Parse an integer field. Blank or unparsable input yields `None`.
pub fn parse_i64(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Parse a boolean field. Matches `1/true/yes/on` and `0/false/no/off`
/// ignoring ASCII case; anything else yields `None`.
pub fn parse_bool(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
    const FALSY: [&str; 4] = ["0", "false", "no", "off"];

    if TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        return Some(true);
    }
    if FALSY.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        return Some(false);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_parses_valid_numbers() {
        assert_eq!(parse_f64(Some("55.2")), Some(55.2));
        assert_eq!(parse_f64(Some("-12.75")), Some(-12.75));
        assert_eq!(parse_f64(Some(" 21.0 ")), Some(21.0));
    }

    #[test]
    fn f64_rejects_blank_and_garbage() {
        assert_eq!(parse_f64(None), None);
        assert_eq!(parse_f64(Some("")), None);
        assert_eq!(parse_f64(Some("   ")), None);
        assert_eq!(parse_f64(Some("21,5")), None);
        assert_eq!(parse_f64(Some("high")), None);
    }

    #[test]
    fn f64_round_trips_formatted_values() {
        for v in [0.0, -80.5, 55.2, 1690000000.0] {
            assert_eq!(parse_f64(Some(&v.to_string())), Some(v));
        }
    }

    #[test]
    fn i64_parses_valid_integers() {
        assert_eq!(parse_i64(Some("-80")), Some(-80));
        assert_eq!(parse_i64(Some("1690000000")), Some(1690000000));
    }

    #[test]
    fn i64_rejects_blank_garbage_and_floats() {
        assert_eq!(parse_i64(None), None);
        assert_eq!(parse_i64(Some("")), None);
        assert_eq!(parse_i64(Some("12.5")), None);
        assert_eq!(parse_i64(Some("ten")), None);
    }

    #[test]
    fn bool_accepts_the_recognized_sets_in_any_case() {
        for v in ["1", "true", "TRUE", "Yes", "yes", "ON", "oN"] {
            assert_eq!(parse_bool(Some(v)), Some(true), "{v}");
        }
        for v in ["0", "false", "FALSE", "No", "no", "OFF", "ofF"] {
            assert_eq!(parse_bool(Some(v)), Some(false), "{v}");
        }
    }

    #[test]
    fn bool_rejects_everything_else() {
        for v in ["", "  ", "2", "y", "n", "enabled", "offline", "truee"] {
            assert_eq!(parse_bool(Some(v)), None, "{v:?}");
        }
        assert_eq!(parse_bool(None), None);
    }
}
