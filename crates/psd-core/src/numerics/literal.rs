//! Solver numeric literals.
//!
//! The solver writes exponents without a marker when space is tight:
//! `1.+8` is `1.0E+8` and `5.5-3` is `5.5E-3`. Fortran `D` exponents are
//! accepted as well.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedNumberError {
    #[error("empty numeric literal")]
    Empty,
    #[error("'{token}' is not a numeric literal")]
    Invalid { token: String },
    #[error("'{token}' does not describe a finite value")]
    NonFinite { token: String },
}

pub fn parse_solver_literal(token: &str) -> Result<f64, MalformedNumberError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(MalformedNumberError::Empty);
    }

    let normalized: String = trimmed
        .chars()
        .map(|ch| if matches!(ch, 'D' | 'd') { 'E' } else { ch })
        .collect();
    let candidate = if normalized.contains(['e', 'E']) {
        normalized
    } else {
        insert_exponent_marker(&normalized)
    };

    let value = candidate
        .parse::<f64>()
        .map_err(|_| MalformedNumberError::Invalid {
            token: trimmed.to_string(),
        })?;
    if !value.is_finite() {
        return Err(MalformedNumberError::NonFinite {
            token: trimmed.to_string(),
        });
    }
    Ok(value)
}

fn insert_exponent_marker(token: &str) -> String {
    let sign = token.char_indices().rev().find(|(index, ch)| {
        *index > 0
            && matches!(ch, '+' | '-')
            && token[..*index]
                .chars()
                .next_back()
                .is_some_and(|previous| previous.is_ascii_digit() || previous == '.')
    });

    match sign {
        Some((index, _)) => format!("{}E{}", &token[..index], &token[index..]),
        None => token.to_string(),
    }
}

/// Renders `value` in the compact exponent form with up to six significant
/// mantissa digits. The mantissa always carries a decimal point.
pub fn format_solver_literal(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{value:.5e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let mantissa = mantissa.trim_end_matches('0');
    let exponent = exponent.parse::<i32>().unwrap_or_default();
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{sign}{}", exponent.abs())
}

#[cfg(test)]
mod tests {
    use super::{MalformedNumberError, format_solver_literal, parse_solver_literal};

    fn assert_close(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= 1.0e-12 * scale,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn parses_compact_exponent_forms() {
        assert_close(parse_solver_literal("1.+8").expect("literal"), 1.0e8);
        assert_close(parse_solver_literal("1.-8").expect("literal"), 1.0e-8);
        assert_close(parse_solver_literal("5.5-3").expect("literal"), 5.5e-3);
        assert_close(parse_solver_literal("1.5+6").expect("literal"), 1.5e6);
        assert_close(parse_solver_literal("1+8").expect("literal"), 1.0e8);
        assert_close(parse_solver_literal("-2.25-2").expect("literal"), -2.25e-2);
    }

    #[test]
    fn standard_tokens_pass_through() {
        assert_close(parse_solver_literal("1.23e-4").expect("literal"), 1.23e-4);
        assert_close(parse_solver_literal("1.0E+8").expect("literal"), 1.0e8);
        assert_close(parse_solver_literal(" 100.0 ").expect("literal"), 100.0);
        assert_close(parse_solver_literal("-5").expect("literal"), -5.0);
        assert_close(parse_solver_literal("+7.5").expect("literal"), 7.5);
        assert_close(parse_solver_literal("2.5D-3").expect("literal"), 2.5e-3);
    }

    #[test]
    fn rejects_tokens_without_numeric_content() {
        assert_eq!(parse_solver_literal("   "), Err(MalformedNumberError::Empty));
        assert!(matches!(
            parse_solver_literal("FREQUENCY"),
            Err(MalformedNumberError::Invalid { .. })
        ));
        assert!(matches!(
            parse_solver_literal("-CONT-"),
            Err(MalformedNumberError::Invalid { .. })
        ));
        assert!(matches!(
            parse_solver_literal("nan"),
            Err(MalformedNumberError::NonFinite { .. })
        ));
        assert!(matches!(
            parse_solver_literal("inf"),
            Err(MalformedNumberError::NonFinite { .. })
        ));
    }

    #[test]
    fn formats_compact_exponent_forms() {
        assert_eq!(format_solver_literal(1.0e8), "1.+8");
        assert_eq!(format_solver_literal(1.0e4), "1.+4");
        assert_eq!(format_solver_literal(1.5e-3), "1.5-3");
        assert_eq!(format_solver_literal(2.5), "2.5+0");
        assert_eq!(format_solver_literal(-3.0e12), "-3.+12");
        assert_eq!(format_solver_literal(0.0), "0.0");
    }

    #[test]
    fn formatting_then_parsing_recovers_the_value() {
        for value in [1.0e8, 1.5e6, 5.5e-3, 123.456, -7.25e-9, 9.99999e13] {
            let rendered = format_solver_literal(value);
            let parsed = parse_solver_literal(&rendered).expect("rendered literal should parse");
            assert_close(parsed, value);
        }
    }
}
