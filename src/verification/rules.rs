//! The standard normalization rules, in the order the validator runs them.

use super::{Findings, NormalizationRule, RuleContext};
use crate::models::{AssetClass, GoalCorrection, Plan, PlanWarning};
use crate::tvm::required_years;

/// Savings must equal income minus expenses when both are known.
pub struct SavingsArithmeticRule;

impl NormalizationRule for SavingsArithmeticRule {
    fn name(&self) -> &'static str {
        "savings_arithmetic"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        ctx: &RuleContext<'_>,
        _findings: &mut Findings,
    ) -> Option<String> {
        let expected = ctx.facts.net_savings()?;
        if plan.monthly_savings == expected {
            return None;
        }

        let previous = plan.monthly_savings;
        plan.monthly_savings = expected;
        Some(format!("monthly savings {} -> {}", previous, expected))
    }
}

/// Investment may not exceed savings. A negative result is kept, not zeroed,
/// and flagged as infeasible.
pub struct InvestmentCapRule;

impl NormalizationRule for InvestmentCapRule {
    fn name(&self) -> &'static str {
        "investment_cap"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        _ctx: &RuleContext<'_>,
        findings: &mut Findings,
    ) -> Option<String> {
        let mut change = None;

        if plan.monthly_recommended_investment > plan.monthly_savings {
            change = Some(format!(
                "recommended investment {} capped at savings {}",
                plan.monthly_recommended_investment, plan.monthly_savings
            ));
            plan.monthly_recommended_investment = plan.monthly_savings;
        }

        if plan.monthly_recommended_investment < 0 {
            findings.warn(PlanWarning::InfeasiblePlan {
                monthly_savings: plan.monthly_savings,
                monthly_recommended_investment: plan.monthly_recommended_investment,
            });
        }

        change
    }
}

/// The first goal's duration must be long enough to reach its target at the
/// recommended investment.
pub struct PrimaryGoalDurationRule;

impl NormalizationRule for PrimaryGoalDurationRule {
    fn name(&self) -> &'static str {
        "primary_goal_duration"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        ctx: &RuleContext<'_>,
        findings: &mut Findings,
    ) -> Option<String> {
        let investment = plan.monthly_recommended_investment;
        let policy = ctx.policy;
        let goal = plan.goals.first_mut()?;

        if goal.target_amount <= 0 {
            return None;
        }

        let unreachable = PlanWarning::UnreachableGoal {
            goal: goal.name.clone(),
            target_amount: goal.target_amount,
            monthly_investment: investment,
            max_years: policy.max_years,
        };

        let solution = match required_years(
            goal.target_amount as f64,
            investment as f64,
            policy.duration_check_rate,
            policy.max_years,
        ) {
            Ok(solution) => solution,
            Err(_) => {
                findings.warn(unreachable);
                return None;
            }
        };

        if !solution.reached {
            findings.warn(unreachable);
            return None;
        }

        if solution.years <= goal.duration_years {
            return None;
        }

        let previous = goal.duration_years;
        findings.note(format!(
            "Reaching {} for '{}' at {} per month takes {} years at an assumed {}% annual return, \
             so its duration was extended from {} to {} years.",
            goal.target_amount,
            goal.name,
            investment,
            solution.years,
            format_rate(policy.duration_check_rate),
            previous,
            solution.years,
        ));
        goal.duration_years = solution.years;
        goal.record_correction(GoalCorrection::DurationExtended);

        Some(format!(
            "goal '{}' duration {} -> {} years",
            goal.name, previous, solution.years
        ))
    }
}

/// Heuristic: a retirement target below the threshold is assumed to be one
/// order of magnitude short (a model answering in the wrong denomination).
/// Not a general unit detector. Each goal is scaled at most once.
pub struct RetirementMagnitudeRule;

impl NormalizationRule for RetirementMagnitudeRule {
    fn name(&self) -> &'static str {
        "retirement_magnitude"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        ctx: &RuleContext<'_>,
        _findings: &mut Findings,
    ) -> Option<String> {
        let goal = plan
            .goals
            .iter_mut()
            .find(|g| g.name.to_lowercase().contains("retire"))?;

        if goal.has_correction(GoalCorrection::RetirementMagnitude)
            || goal.target_amount >= ctx.policy.retirement_threshold
        {
            return None;
        }

        let previous = goal.target_amount;
        goal.target_amount = previous.saturating_mul(ctx.policy.retirement_magnitude_factor);
        goal.record_correction(GoalCorrection::RetirementMagnitude);

        Some(format!(
            "goal '{}' target {} -> {}",
            goal.name, previous, goal.target_amount
        ))
    }
}

/// Allocations must be whole percentages in [0, 100]. Fractions (some value
/// in (0, 1] and none above 1) are scaled by 100 first.
pub struct AllocationUnitsRule;

impl NormalizationRule for AllocationUnitsRule {
    fn name(&self) -> &'static str {
        "allocation_units"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        _ctx: &RuleContext<'_>,
        _findings: &mut Findings,
    ) -> Option<String> {
        let allocation = &mut plan.portfolio_allocation;
        if allocation.is_empty() {
            return None;
        }

        let fractional = allocation.values().any(|v| *v > 0.0 && *v <= 1.0)
            && allocation.values().all(|v| *v <= 1.0);
        let scale = if fractional { 100.0 } else { 1.0 };

        let mut changed = false;
        for value in allocation.values_mut() {
            let normalized = (*value * scale).round().clamp(0.0, 100.0);
            if normalized != *value {
                *value = normalized;
                changed = true;
            }
        }

        if !changed {
            return None;
        }

        Some(if fractional {
            "allocation fractions converted to percentages".to_string()
        } else {
            "allocation rounded to whole percentages".to_string()
        })
    }
}

/// The emergency fund is tracked outside the investable portfolio, so a
/// positive emergency share is dropped. The rest no longer sums to 100.
pub struct EmergencyExclusionRule;

impl NormalizationRule for EmergencyExclusionRule {
    fn name(&self) -> &'static str {
        "emergency_exclusion"
    }

    fn apply(
        &self,
        plan: &mut Plan,
        _ctx: &RuleContext<'_>,
        _findings: &mut Findings,
    ) -> Option<String> {
        let key = AssetClass::Emergency.key();
        let share = *plan.portfolio_allocation.get(key)?;

        if share <= 0.0 {
            return None;
        }

        plan.portfolio_allocation.remove(key);
        Some(format!("emergency share {}% removed from allocation", share))
    }
}

/// 0.1 -> "10", 0.125 -> "12.5"
fn format_rate(rate: f64) -> String {
    let pct = format!("{:.2}", rate * 100.0);
    pct.trim_end_matches('0').trim_end_matches('.').to_string()
}
