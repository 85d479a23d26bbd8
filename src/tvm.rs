//! Time-value-of-money calculator
//!
//! Pure functions over monthly SIP contributions compounding monthly at
//! `annual_rate / 12`. Contributions are made at the start of each month.

use crate::error::PlannerError;
use crate::Result;

/// Horizon cap for [`required_years`]
pub const DEFAULT_MAX_YEARS: u32 = 100;

/// Result of the required-years search.
///
/// `reached == false` means the target was not met within `max_years`;
/// `years` is then the cap itself and must not be read as a real duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearsSolution {
    pub years: u32,
    pub reached: bool,
}

fn check_rate(annual_rate: f64) -> Result<()> {
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(PlannerError::InvalidInput(format!(
            "annual rate must be a non-negative number, got {}",
            annual_rate
        )));
    }
    Ok(())
}

/// Value of one unit contributed monthly for `years`
fn annuity_due_factor(annual_rate: f64, years: u32) -> f64 {
    let n = f64::from(years) * 12.0;
    let r = annual_rate / 12.0;

    if r == 0.0 {
        return n;
    }

    ((1.0 + r).powf(n) - 1.0) / r * (1.0 + r)
}

/// Future value of `contribution` invested every month for `years`.
pub fn future_value_of_sip(contribution: f64, annual_rate: f64, years: u32) -> f64 {
    contribution * annuity_due_factor(annual_rate, years)
}

/// Monthly contribution needed to reach `target` in `years`, rounded to the whole unit.
pub fn required_monthly_investment(target: f64, years: u32, annual_rate: f64) -> Result<i64> {
    if years == 0 {
        return Err(PlannerError::InvalidInput(
            "years must be positive".to_string(),
        ));
    }
    if !target.is_finite() || target < 0.0 {
        return Err(PlannerError::InvalidInput(format!(
            "target amount must be non-negative, got {}",
            target
        )));
    }
    check_rate(annual_rate)?;

    Ok((target / annuity_due_factor(annual_rate, years)).round() as i64)
}

/// Smallest whole number of years (>= 1) at which the SIP reaches `target`.
///
/// Scans upward from one year; the future value is monotonic in years for a
/// positive contribution, so the first hit is the answer.
pub fn required_years(
    target: f64,
    contribution: f64,
    annual_rate: f64,
    max_years: u32,
) -> Result<YearsSolution> {
    if max_years == 0 {
        return Err(PlannerError::InvalidInput(
            "max_years must be positive".to_string(),
        ));
    }
    check_rate(annual_rate)?;

    if target <= 0.0 {
        return Ok(YearsSolution {
            years: 1,
            reached: true,
        });
    }
    if contribution.is_nan() || contribution <= 0.0 {
        return Err(PlannerError::InvalidInput(format!(
            "a contribution of {} never reaches {}",
            contribution, target
        )));
    }

    for years in 1..=max_years {
        if future_value_of_sip(contribution, annual_rate, years) >= target {
            return Ok(YearsSolution {
                years,
                reached: true,
            });
        }
    }

    Ok(YearsSolution {
        years: max_years,
        reached: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn future_value_matches_closed_form() {
        // r = 0.01, n = 12: ((1.01^12 - 1) / 0.01) * 1.01
        let expected = 1000.0 * ((1.01f64.powi(12) - 1.0) / 0.01) * 1.01;
        assert_close(future_value_of_sip(1000.0, 0.12, 1), expected, 1e-6);
        assert_close(future_value_of_sip(1000.0, 0.12, 1), 12_809.33, 0.01);
    }

    #[test]
    fn zero_rate_is_plain_sum() {
        assert_eq!(future_value_of_sip(500.0, 0.0, 3), 18_000.0);
        assert_eq!(required_monthly_investment(18_000.0, 3, 0.0).unwrap(), 500);
    }

    #[test]
    fn required_investment_rejects_bad_input() {
        assert!(matches!(
            required_monthly_investment(1000.0, 0, 0.1),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(matches!(
            required_monthly_investment(-1.0, 5, 0.1),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(required_monthly_investment(1000.0, 5, -0.1).is_err());
        assert_eq!(required_monthly_investment(0.0, 5, 0.1).unwrap(), 0);
    }

    #[test]
    fn required_years_finds_first_sufficient_year() {
        // 10k/month at 10%: ~4.21L after 3 years, ~5.92L after 4
        let solution = required_years(500_000.0, 10_000.0, 0.10, DEFAULT_MAX_YEARS).unwrap();
        assert_eq!(
            solution,
            YearsSolution {
                years: 4,
                reached: true
            }
        );
    }

    #[test]
    fn required_years_caps_unreachable_targets() {
        let solution = required_years(1e15, 1.0, 0.05, 10).unwrap();
        assert_eq!(
            solution,
            YearsSolution {
                years: 10,
                reached: false
            }
        );
    }

    #[test]
    fn required_years_edge_cases() {
        assert_eq!(required_years(0.0, 0.0, 0.1, 100).unwrap().years, 1);
        assert!(matches!(
            required_years(1000.0, 0.0, 0.1, 100),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(required_years(1000.0, -5.0, 0.1, 100).is_err());
        assert!(required_years(1000.0, 10.0, 0.1, 0).is_err());
        assert!(required_years(1000.0, f64::NAN, 0.1, 100).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn required_investment_inverts_future_value(
            contribution in 0u32..200_000,
            rate_bp in 1u32..2_000,
            years in 1u32..40,
        ) {
            let rate = f64::from(rate_bp) / 10_000.0;
            let target = future_value_of_sip(f64::from(contribution), rate, years);
            let recovered = required_monthly_investment(target, years, rate).unwrap();
            prop_assert!((recovered - i64::from(contribution)).abs() <= 1);
        }

        #[test]
        fn required_years_is_monotonic_in_target(
            contribution in 1u32..50_000,
            rate_bp in 0u32..2_000,
            low in 0u64..50_000_000,
            delta in 0u64..50_000_000,
        ) {
            let rate = f64::from(rate_bp) / 10_000.0;
            let c = f64::from(contribution);
            let a = required_years(low as f64, c, rate, DEFAULT_MAX_YEARS).unwrap();
            let b = required_years((low + delta) as f64, c, rate, DEFAULT_MAX_YEARS).unwrap();
            prop_assert!(a.years <= b.years);
            if !a.reached {
                prop_assert_eq!(b.reached, false);
            }
        }
    }
}
