use serde_json::Value;

/// Sentinel for "absent/invalid" confidence. Callers must treat it as
/// below any threshold.
pub const CONFIDENCE_ABSENT: f64 = -1.0;

/// Canonicalize a heterogeneous confidence value into a bounded percentage.
///
/// Upstream classifiers report confidence as `"87%"`, `0.87`, `87`, or
/// malformed text; every call site thresholds against the single
/// representation produced here. Values in `[0, 1]` are read as fractions,
/// anything else as an already-scaled percentage, and the result is clamped
/// to `[0, 100]`. Never fails: unparsable input yields
/// [`CONFIDENCE_ABSENT`].
pub fn normalize(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            let stripped = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            stripped.parse::<f64>().ok()
        }
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => {
            let pct = if (0.0..=1.0).contains(&n) { n * 100.0 } else { n };
            pct.clamp(0.0, 100.0)
        }
        _ => CONFIDENCE_ABSENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equivalent_representations_agree() {
        assert_eq!(normalize(&json!("87%")), 87.0);
        assert_eq!(normalize(&json!(0.87)), 87.0);
        assert_eq!(normalize(&json!(87)), 87.0);
        assert_eq!(normalize(&json!("87")), 87.0);
    }

    #[test]
    fn test_fraction_boundaries() {
        assert_eq!(normalize(&json!(0.0)), 0.0);
        assert_eq!(normalize(&json!(1.0)), 100.0);
        assert_eq!(normalize(&json!(1.5)), 1.5);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(normalize(&json!(150)), 100.0);
        assert_eq!(normalize(&json!("250%")), 100.0);
        assert_eq!(normalize(&json!(-20)), 0.0);
    }

    #[test]
    fn test_whitespace_and_percent_stripping() {
        assert_eq!(normalize(&json!("  42 % ")), 42.0);
        assert_eq!(normalize(&json!(" 0.5 ")), 50.0);
    }

    #[test]
    fn test_malformed_inputs_return_sentinel() {
        assert_eq!(normalize(&json!("abc")), CONFIDENCE_ABSENT);
        assert_eq!(normalize(&Value::Null), CONFIDENCE_ABSENT);
        assert_eq!(normalize(&json!("")), CONFIDENCE_ABSENT);
        assert_eq!(normalize(&json!(true)), CONFIDENCE_ABSENT);
        assert_eq!(normalize(&json!(["87"])), CONFIDENCE_ABSENT);
        assert_eq!(normalize(&json!("%%")), CONFIDENCE_ABSENT);
    }

    #[test]
    fn test_sentinel_is_below_any_threshold() {
        assert!(normalize(&Value::Null) < 0.0);
    }
}
