//! Equated monthly installment.

/// Standard amortization: `P·r·(1+r)^n / ((1+r)^n − 1)` with `r` the monthly
/// rate and `n` the number of monthly payments.
///
/// A zero rate degrades to straight division. Non-positive principal or
/// tenure, and negative rates, yield `None`.
pub fn monthly_installment(
    principal: f64,
    annual_rate_percent: f64,
    tenure_years: f64,
) -> Option<f64> {
    if !(principal > 0.0) || !(tenure_years > 0.0) || !(annual_rate_percent >= 0.0) {
        return None;
    }
    let months = (tenure_years * 12.0).round();
    if months < 1.0 {
        return None;
    }
    let r = annual_rate_percent / 12.0 / 100.0;
    if r == 0.0 {
        return Some(principal / months);
    }
    let growth = (1.0 + r).powf(months);
    Some(principal * r * growth / (growth - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_loan() {
        let emi = monthly_installment(500_000.0, 8.5, 5.0).unwrap();
        assert!((emi - 10_258.2657).abs() < 0.001);
    }

    #[test]
    fn test_zero_rate() {
        assert_eq!(monthly_installment(12_000.0, 0.0, 1.0), Some(1000.0));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(monthly_installment(0.0, 8.5, 5.0), None);
        assert_eq!(monthly_installment(100.0, -1.0, 5.0), None);
        assert_eq!(monthly_installment(100.0, 8.5, 0.0), None);
        assert_eq!(monthly_installment(f64::NAN, 8.5, 5.0), None);
    }
}
