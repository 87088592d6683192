//! Numeric helpers for ledger math.

/// Round to two decimal places, the resolution every ledger amount is kept at.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_cents() {
        assert!((round2(12.346) - 12.35).abs() < f64::EPSILON);
        assert!((round2(12.344) - 12.34).abs() < f64::EPSILON);
        assert!((round2(-0.006) - -0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn round2_is_idempotent() {
        let once = round2(7.777_777);
        assert!((round2(once) - once).abs() < f64::EPSILON);
    }
}
