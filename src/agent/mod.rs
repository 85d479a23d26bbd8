//! Planning agent - implements the request pipeline
//!
//! INPUT → CLASSIFY → EXTRACT → DRAFT → RESOLVE → VALIDATE → COMPLETE
//!
//! Everything after DRAFT is synchronous and deterministic; see [`finalize_plan`].

use crate::classifier::{classify_risk, default_allocation};
use crate::config::{PipelineMode, PlanningPolicy};
use crate::error::PlannerError;
use crate::extraction::FactExtractor;
use crate::fallback::{build_plan, recommended_investment, resolve_goal, GeneratedPlan};
use crate::models::{DraftGoal, DraftPlan, Facts, Plan, PlanOutcome, PlanWarning, RiskTier};
use crate::planner::Planner;
use crate::verification::{create_default_validator, PlanValidator};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Turn a draft (or its absence) into a fully structured, unvalidated plan.
///
/// A draft is unusable when it has no monthly savings and the facts cannot
/// supply them; the fallback generator then runs with the draft's goals.
pub fn resolve_draft(
    text: &str,
    draft: Option<&DraftPlan>,
    facts: Facts,
    policy: &PlanningPolicy,
) -> (Plan, Vec<PlanWarning>) {
    let tier = classify_risk(text);

    let Some(draft) = draft else {
        return fallback_plan(tier, &[], facts, policy);
    };

    let Some(monthly_savings) = draft
        .monthly_savings
        .map(|s| s.round() as i64)
        .or_else(|| facts.net_savings())
    else {
        let (plan, mut warnings) =
            fallback_plan(tier, draft.goals.as_deref().unwrap_or_default(), facts, policy);
        warnings.insert(
            0,
            PlanWarning::DraftRejected {
                reason: "draft has no monthly savings and income/expenses are unknown".to_string(),
            },
        );
        return (plan, warnings);
    };

    let investment = draft
        .monthly_recommended_investment
        .map(|i| i.round() as i64)
        .unwrap_or_else(|| recommended_investment(monthly_savings, policy));

    let portfolio_allocation = draft
        .portfolio_allocation
        .clone()
        .filter(|alloc| !alloc.is_empty())
        .unwrap_or_else(|| default_allocation(tier));

    let mut goals = Vec::new();
    let mut warnings = Vec::new();
    for (index, entry) in draft.goals.iter().flatten().enumerate() {
        match resolve_goal(entry, investment, policy) {
            Ok(goal) => goals.push(goal),
            Err(error) => warnings.push(PlanWarning::InvalidGoal {
                index,
                reason: error.to_string(),
            }),
        }
    }

    let plan = Plan {
        monthly_savings,
        monthly_recommended_investment: investment,
        portfolio_allocation,
        goals,
    };

    (plan, warnings)
}

fn fallback_plan(
    tier: RiskTier,
    goals: &[DraftGoal],
    facts: Facts,
    policy: &PlanningPolicy,
) -> (Plan, Vec<PlanWarning>) {
    let income = facts.income.unwrap_or(policy.fallback_income);
    let expenses = facts.expenses.unwrap_or(policy.fallback_expenses);

    debug!(income, expenses, %tier, "Building fallback plan");

    let GeneratedPlan { plan, rejected } = build_plan(income, expenses, goals, tier, policy);
    let warnings = rejected
        .into_iter()
        .map(|r| PlanWarning::InvalidGoal {
            index: r.index,
            reason: r.error.to_string(),
        })
        .collect();

    (plan, warnings)
}

/// Run `validator` over a resolved draft. Resolution warnings come first.
pub fn finalize_with(
    validator: &PlanValidator,
    text: &str,
    draft: Option<&DraftPlan>,
    facts: Facts,
    policy: &PlanningPolicy,
) -> PlanOutcome {
    let (plan, resolution_warnings) = resolve_draft(text, draft, facts, policy);
    let mut outcome = validator.validate(plan, facts, policy);

    let mut warnings = resolution_warnings;
    for warning in outcome.warnings.drain(..) {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }
    outcome.warnings = warnings;
    outcome
}

/// The core entry point: free text, an optional untrusted draft and the
/// extracted facts in; a corrected plan with notes and warnings out.
pub fn finalize_plan(
    text: &str,
    draft: Option<&DraftPlan>,
    facts: Facts,
    policy: &PlanningPolicy,
) -> PlanOutcome {
    finalize_with(&create_default_validator(), text, draft, facts, policy)
}

/// Explicit numbers for a model-free plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanInputs {
    pub income: Option<i64>,
    pub expenses: Option<i64>,
    #[serde(default)]
    pub goals: Vec<Value>,
    pub risk: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub request_id: Uuid,
    pub mode: PipelineMode,
    pub risk_tier: RiskTier,
    pub facts: Facts,
    /// The model's prose, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

impl PlanResponse {
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Coordinates drafting, extraction and validation for one request
pub struct PlanningAgent {
    planner: Box<dyn Planner>,
    extractor: Box<dyn FactExtractor>,
    validator: PlanValidator,
    policy: PlanningPolicy,
    mode: PipelineMode,
}

impl PlanningAgent {
    pub fn new(
        planner: Box<dyn Planner>,
        extractor: Box<dyn FactExtractor>,
        validator: PlanValidator,
        policy: PlanningPolicy,
        mode: PipelineMode,
    ) -> Self {
        Self {
            planner,
            extractor,
            validator,
            policy,
            mode,
        }
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Plan a free-text request
    pub async fn plan(&self, message: &str) -> Result<PlanResponse> {
        let message = message.trim();
        if message.is_empty() {
            return Err(PlannerError::InvalidInput("Message is required.".to_string()));
        }

        let request_id = Uuid::new_v4();
        let risk_tier = classify_risk(message);
        let facts = self.extractor.extract(message);

        info!(
            %request_id,
            mode = %self.mode,
            %risk_tier,
            income = ?facts.income,
            expenses = ?facts.expenses,
            "Planning request"
        );

        let mut summary = None;
        let mut draft = None;
        let mut rejection = None;

        if self.mode == PipelineMode::Model {
            match self.planner.draft(message).await {
                Ok(reply) => {
                    summary = Some(reply.summary).filter(|s| !s.is_empty());
                    match reply.draft {
                        Some(value) => draft = Some(DraftPlan::from_value(&value)),
                        None => {
                            let e =
                                PlannerError::InvalidPlan("model reply contained no plan".into());
                            warn!(%request_id, error = %e, "Draft unusable - using fallback plan");
                            rejection = Some(e.to_string());
                        }
                    }
                }
                Err(e) => {
                    warn!(%request_id, error = %e, "Draft unavailable - using fallback plan");
                    rejection = Some(e.to_string());
                }
            }
        }

        let mut outcome = finalize_with(
            &self.validator,
            message,
            draft.as_ref(),
            facts,
            &self.policy,
        );

        if let Some(reason) = rejection {
            outcome.warnings.insert(0, PlanWarning::DraftRejected { reason });
        }

        info!(
            %request_id,
            corrections = outcome.corrections.len(),
            warnings = outcome.warnings.len(),
            "Plan ready"
        );

        Ok(PlanResponse {
            request_id,
            mode: self.mode,
            risk_tier,
            facts,
            summary,
            outcome,
        })
    }

    /// Deterministic plan from explicit numbers, no model involved
    pub fn plan_from_inputs(&self, inputs: &PlanInputs) -> Result<PlanOutcome> {
        let tier = match &inputs.risk {
            None | Some(Value::Null) => RiskTier::Moderate,
            Some(value) => RiskTier::from_value(value).ok_or_else(|| {
                PlannerError::InvalidInput(format!("Unknown risk value {}", value))
            })?,
        };

        let income = non_negative("income", inputs.income)?.unwrap_or(self.policy.fallback_income);
        let expenses =
            non_negative("expenses", inputs.expenses)?.unwrap_or(self.policy.fallback_expenses);
        let goals: Vec<DraftGoal> = inputs.goals.iter().map(DraftGoal::from_value).collect();
        let facts = Facts::new(Some(income), Some(expenses));

        let (plan, resolution_warnings) = fallback_plan(tier, &goals, facts, &self.policy);
        let mut outcome = self.validator.validate(plan, facts, &self.policy);

        let mut warnings = resolution_warnings;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;

        Ok(outcome)
    }
}

fn non_negative(field: &str, amount: Option<i64>) -> Result<Option<i64>> {
    match amount {
        Some(value) if value < 0 => Err(PlannerError::InvalidInput(format!(
            "{} must not be negative, got {}",
            field, value
        ))),
        other => Ok(other),
    }
}
