//! Fallback plan generator
//!
//! Builds a complete plan from explicit numbers when no usable model draft
//! exists. Goal resolution is shared with draft resolution.

use crate::classifier::default_allocation;
use crate::config::PlanningPolicy;
use crate::error::PlannerError;
use crate::models::{DraftGoal, Goal, Plan, RiskTier};
use crate::tvm::future_value_of_sip;
use crate::Result;
use tracing::debug;

/// A goal entry that could not be resolved
#[derive(Debug)]
pub struct RejectedGoal {
    pub index: usize,
    pub error: PlannerError,
}

#[derive(Debug)]
pub struct GeneratedPlan {
    pub plan: Plan,
    pub rejected: Vec<RejectedGoal>,
}

/// Investment recommended for a given net monthly saving
pub fn recommended_investment(monthly_savings: i64, policy: &PlanningPolicy) -> i64 {
    (monthly_savings as f64 * policy.investment_ratio).round() as i64
}

/// Fill in a goal's missing duration and target.
///
/// A missing, zero or negative duration becomes the policy default. A missing
/// or zero target is projected from the goal's own monthly investment, or
/// `default_investment` when it has none.
pub fn resolve_goal(
    draft: &DraftGoal,
    default_investment: i64,
    policy: &PlanningPolicy,
) -> Result<Goal> {
    let name = draft
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            PlannerError::InvalidInput(
                "goal entry must be an object with a non-empty name".to_string(),
            )
        })?;

    let duration_years = draft
        .duration_years
        .map(f64::round)
        .filter(|d| *d >= 1.0)
        .map(|d| d.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(policy.default_duration_years);

    let monthly_investment = draft
        .monthly_investment
        .filter(|m| *m > 0.0)
        .map(|m| m.round() as i64);

    let target_amount = match draft.target_amount {
        Some(t) if t < 0.0 => {
            return Err(PlannerError::InvalidInput(format!(
                "goal '{}' has a negative target amount",
                name
            )))
        }
        Some(t) if t > 0.0 => t.round() as i64,
        _ => {
            let contribution = monthly_investment.unwrap_or(default_investment);
            future_value_of_sip(contribution as f64, policy.generation_rate, duration_years)
                .round()
                .max(0.0) as i64
        }
    };

    Ok(Goal {
        name: name.to_string(),
        target_amount,
        duration_years,
        monthly_investment,
        corrections: draft.corrections.clone(),
    })
}

/// Build a plan from income, expenses and goals. Malformed goals are skipped
/// and reported in `rejected`; the rest of the batch is still built.
pub fn build_plan(
    income: i64,
    expenses: i64,
    goals: &[DraftGoal],
    tier: RiskTier,
    policy: &PlanningPolicy,
) -> GeneratedPlan {
    let monthly_savings = income.saturating_sub(expenses);
    let investment = recommended_investment(monthly_savings, policy);

    let mut resolved = Vec::with_capacity(goals.len());
    let mut rejected = Vec::new();

    for (index, goal) in goals.iter().enumerate() {
        match resolve_goal(goal, investment, policy) {
            Ok(goal) => resolved.push(goal),
            Err(error) => {
                debug!(index, %error, "Rejecting goal entry");
                rejected.push(RejectedGoal { index, error });
            }
        }
    }

    GeneratedPlan {
        plan: Plan {
            monthly_savings,
            monthly_recommended_investment: investment,
            portfolio_allocation: default_allocation(tier),
            goals: resolved,
        },
        rejected,
    }
}

/// All-or-nothing variant of [`build_plan`]: the first malformed goal fails the plan.
pub fn build_plan_strict(
    income: i64,
    expenses: i64,
    goals: &[DraftGoal],
    tier: RiskTier,
    policy: &PlanningPolicy,
) -> Result<Plan> {
    let generated = build_plan(income, expenses, goals, tier, policy);

    match generated.rejected.into_iter().next() {
        Some(rejected) => Err(rejected.error),
        None => Ok(generated.plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PlanningPolicy {
        PlanningPolicy::default()
    }

    #[test]
    fn test_baseline_numbers() {
        let generated = build_plan(100_000, 50_000, &[], RiskTier::Moderate, &policy());
        assert_eq!(generated.plan.monthly_savings, 50_000);
        assert_eq!(generated.plan.monthly_recommended_investment, 30_000);
        assert_eq!(generated.plan.portfolio_allocation["equity"], 50.0);
        assert!(generated.plan.goals.is_empty());
        assert!(generated.rejected.is_empty());
    }

    #[test]
    fn test_negative_savings_pass_through() {
        let plan = build_plan(40_000, 50_000, &[], RiskTier::Conservative, &policy()).plan;
        assert_eq!(plan.monthly_savings, -10_000);
        assert_eq!(plan.monthly_recommended_investment, -6_000);
    }

    #[test]
    fn test_goal_targets_are_projected() {
        let goals = vec![
            DraftGoal::named("Car"),
            DraftGoal {
                name: Some("Trip".to_string()),
                monthly_investment: Some(1_000.0),
                duration_years: Some(1.0),
                ..DraftGoal::default()
            },
            DraftGoal {
                name: Some("House".to_string()),
                target_amount: Some(2_500_000.0),
                duration_years: Some(10.0),
                ..DraftGoal::default()
            },
        ];

        let plan = build_plan(100_000, 50_000, &goals, RiskTier::Moderate, &policy()).plan;
        assert_eq!(plan.goals.len(), 3);

        let car = &plan.goals[0];
        assert_eq!(car.name, "Car");
        assert_eq!(car.duration_years, 5);
        let expected = future_value_of_sip(30_000.0, 0.12, 5).round() as i64;
        assert_eq!(car.target_amount, expected);

        let trip = &plan.goals[1];
        assert_eq!(trip.duration_years, 1);
        assert_eq!(trip.target_amount, 12_809);
        assert_eq!(trip.monthly_investment, Some(1_000));

        let house = &plan.goals[2];
        assert_eq!(house.target_amount, 2_500_000);
        assert_eq!(house.duration_years, 10);
    }

    #[test]
    fn test_malformed_goals_rejected_individually() {
        let goals = vec![
            DraftGoal::default(),
            DraftGoal::named("Education"),
            DraftGoal::named("   "),
        ];

        let generated = build_plan(80_000, 30_000, &goals, RiskTier::Aggressive, &policy());
        assert_eq!(generated.plan.goals.len(), 1);
        assert_eq!(generated.plan.goals[0].name, "Education");

        let indices: Vec<usize> = generated.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(matches!(
            generated.rejected[0].error,
            PlannerError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_strict_build_fails_whole_batch() {
        let goals = vec![DraftGoal::named("Education"), DraftGoal::default()];
        let result = build_plan_strict(80_000, 30_000, &goals, RiskTier::Moderate, &policy());
        assert!(matches!(result, Err(PlannerError::InvalidInput(_))));

        let ok = build_plan_strict(80_000, 30_000, &goals[..1], RiskTier::Moderate, &policy());
        assert_eq!(ok.unwrap().goals.len(), 1);
    }

    #[test]
    fn test_extreme_inputs_saturate() {
        let plan = build_plan(i64::MIN, 1, &[], RiskTier::Moderate, &policy()).plan;
        assert_eq!(plan.monthly_savings, i64::MIN);
        assert!(plan.monthly_recommended_investment < 0);
    }

    #[test]
    fn test_negative_target_rejected() {
        let goal = DraftGoal {
            name: Some("Bad".to_string()),
            target_amount: Some(-5.0),
            ..DraftGoal::default()
        };
        assert!(resolve_goal(&goal, 1_000, &policy()).is_err());
    }
}
