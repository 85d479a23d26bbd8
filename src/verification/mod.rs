//! Plan validation and normalization
//!
//! Rules-based correction of a plan before it is returned.
//! Deterministic enforcement: the model never sees or overrides these rules.

pub mod rules;

use crate::config::PlanningPolicy;
use crate::models::{Correction, Facts, Plan, PlanOutcome, PlanWarning};
use tracing::{debug, info, warn};

pub use rules::{
    AllocationUnitsRule, EmergencyExclusionRule, InvestmentCapRule, PrimaryGoalDurationRule,
    RetirementMagnitudeRule, SavingsArithmeticRule,
};

/// Upper bound on full passes over the rule set
pub const MAX_NORMALIZATION_PASSES: usize = 4;

/// Inputs every rule may read
pub struct RuleContext<'a> {
    pub facts: Facts,
    pub policy: &'a PlanningPolicy,
}

/// User-facing notes and warnings collected while rules run
#[derive(Debug, Default)]
pub struct Findings {
    pub notes: Vec<String>,
    pub warnings: Vec<PlanWarning>,
}

impl Findings {
    pub fn note(&mut self, note: String) {
        self.notes.push(note);
    }

    /// Repeated passes raise the same warning; keep one copy.
    pub fn warn(&mut self, warning: PlanWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

/// Trait for normalization rules
pub trait NormalizationRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Correct `plan` in place. Returns a description of the change, or
    /// `None` when the plan already satisfies the rule.
    fn apply(
        &self,
        plan: &mut Plan,
        ctx: &RuleContext<'_>,
        findings: &mut Findings,
    ) -> Option<String>;
}

/// Runs the rules in registration order
pub struct PlanValidator {
    rules: Vec<Box<dyn NormalizationRule>>,
}

impl PlanValidator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn NormalizationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Apply every rule in order, repeating the sequence until a full pass
    /// changes nothing, so validating the output again is a no-op.
    pub fn validate(&self, mut plan: Plan, facts: Facts, policy: &PlanningPolicy) -> PlanOutcome {
        let ctx = RuleContext { facts, policy };
        let mut findings = Findings::default();
        let mut corrections = Vec::new();
        let mut settled = false;

        for pass in 1..=MAX_NORMALIZATION_PASSES {
            let mut changed = false;

            for rule in &self.rules {
                if let Some(details) = rule.apply(&mut plan, &ctx, &mut findings) {
                    debug!(pass, rule = rule.name(), %details, "Plan corrected");
                    corrections.push(Correction {
                        rule: rule.name().to_string(),
                        details,
                    });
                    changed = true;
                }
            }

            if !changed {
                settled = true;
                break;
            }
        }

        if !settled {
            warn!(
                passes = MAX_NORMALIZATION_PASSES,
                "Normalization did not settle"
            );
        }

        info!(
            rule_count = self.rules.len(),
            corrections = corrections.len(),
            warnings = findings.warnings.len(),
            "Validation completed"
        );

        PlanOutcome {
            plan,
            notes: findings.notes,
            warnings: findings.warnings,
            corrections,
        }
    }
}

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard rule set. Order matters: later rules read earlier corrections.
pub fn create_default_validator() -> PlanValidator {
    let mut validator = PlanValidator::new();
    validator.add_rule(Box::new(SavingsArithmeticRule));
    validator.add_rule(Box::new(InvestmentCapRule));
    validator.add_rule(Box::new(PrimaryGoalDurationRule));
    validator.add_rule(Box::new(RetirementMagnitudeRule));
    validator.add_rule(Box::new(AllocationUnitsRule));
    validator.add_rule(Box::new(EmergencyExclusionRule));
    validator
}

//
// ================= Tests =================
//
