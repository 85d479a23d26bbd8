//! Core data models for the savings planner

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTier {
    /// Legacy numeric codes: 1 = conservative, 2 = moderate, 3 = aggressive
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(RiskTier::Conservative),
            2 => Some(RiskTier::Moderate),
            3 => Some(RiskTier::Aggressive),
            _ => None,
        }
    }

    /// Accepts either a tier name or a legacy numeric code.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_code),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for RiskTier {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "low" | "1" => Ok(RiskTier::Conservative),
            "moderate" | "medium" | "2" => Ok(RiskTier::Moderate),
            "aggressive" | "high" | "3" => Ok(RiskTier::Aggressive),
            other => Err(PlannerError::InvalidInput(format!(
                "Unknown risk tier '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Conservative => "Conservative",
            RiskTier::Moderate => "Moderate",
            RiskTier::Aggressive => "Aggressive",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Equity,
    Debt,
    Gold,
    Emergency,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Equity,
        AssetClass::Debt,
        AssetClass::Gold,
        AssetClass::Emergency,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Debt => "debt",
            AssetClass::Gold => "gold",
            AssetClass::Emergency => "emergency",
        }
    }
}

/// Heuristic corrections recorded on a goal so they are never applied twice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalCorrection {
    RetirementMagnitude,
    DurationExtended,
}

impl FromStr for GoalCorrection {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retirement_magnitude" => Ok(GoalCorrection::RetirementMagnitude),
            "duration_extended" => Ok(GoalCorrection::DurationExtended),
            other => Err(PlannerError::InvalidInput(format!(
                "Unknown goal correction '{}'",
                other
            ))),
        }
    }
}

//
// ================= Plan =================
//

/// Asset class key → percentage. Keys the model invents are kept.
pub type Allocation = BTreeMap<String, f64>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub name: String,
    pub target_amount: i64,
    pub duration_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_investment: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<GoalCorrection>,
}

impl Goal {
    pub fn has_correction(&self, correction: GoalCorrection) -> bool {
        self.corrections.contains(&correction)
    }

    pub fn record_correction(&mut self, correction: GoalCorrection) {
        if !self.has_correction(correction) {
            self.corrections.push(correction);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Negative when expenses exceed income
    pub monthly_savings: i64,
    pub monthly_recommended_investment: i64,
    #[serde(serialize_with = "serialize_percentages")]
    pub portfolio_allocation: Allocation,
    pub goals: Vec<Goal>,
}

/// Whole percentages go out as JSON integers.
fn serialize_percentages<S>(allocation: &Allocation, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(allocation.len()))?;
    for (key, value) in allocation {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            map.serialize_entry(key, &(*value as i64))?;
        } else {
            map.serialize_entry(key, value)?;
        }
    }
    map.end()
}

//
// ================= Draft (untrusted) =================
//

/// A goal entry as it arrived from the model. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftGoal {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub duration_years: Option<f64>,
    pub monthly_investment: Option<f64>,
    pub corrections: Vec<GoalCorrection>,
}

impl DraftGoal {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Non-object entries yield a goal without a name, rejected later.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let corrections = obj
            .get("corrections")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| s.parse().ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name,
            target_amount: obj.get("target_amount").and_then(number_from_value),
            duration_years: obj.get("duration_years").and_then(number_from_value),
            monthly_investment: obj.get("monthly_investment").and_then(number_from_value),
            corrections,
        }
    }
}

/// The model's structured output before any correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPlan {
    pub monthly_savings: Option<f64>,
    pub monthly_recommended_investment: Option<f64>,
    pub portfolio_allocation: Option<Allocation>,
    pub goals: Option<Vec<DraftGoal>>,
}

impl DraftPlan {
    /// Tolerant parse: wrong-typed fields are treated as absent.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let portfolio_allocation = obj
            .get("portfolio_allocation")
            .and_then(Value::as_object)
            .map(|alloc| {
                alloc
                    .iter()
                    .filter_map(|(k, v)| number_from_value(v).map(|n| (k.to_lowercase(), n)))
                    .collect::<Allocation>()
            });

        let goals = obj
            .get("goals")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(DraftGoal::from_value).collect());

        Self {
            monthly_savings: obj.get("monthly_savings").and_then(number_from_value),
            monthly_recommended_investment: obj
                .get("monthly_recommended_investment")
                .or_else(|| obj.get("recommended_investment"))
                .and_then(number_from_value),
            portfolio_allocation,
            goals,
        }
    }
}

impl From<&Goal> for DraftGoal {
    fn from(goal: &Goal) -> Self {
        Self {
            name: Some(goal.name.clone()),
            target_amount: Some(goal.target_amount as f64),
            duration_years: Some(f64::from(goal.duration_years)),
            monthly_investment: goal.monthly_investment.map(|v| v as f64),
            corrections: goal.corrections.clone(),
        }
    }
}

impl From<&Plan> for DraftPlan {
    fn from(plan: &Plan) -> Self {
        Self {
            monthly_savings: Some(plan.monthly_savings as f64),
            monthly_recommended_investment: Some(plan.monthly_recommended_investment as f64),
            portfolio_allocation: Some(plan.portfolio_allocation.clone()),
            goals: Some(plan.goals.iter().map(DraftGoal::from).collect()),
        }
    }
}

/// Read a number from JSON, accepting numeric strings such as "50,000" or "₹1,20,000".
pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse().ok()?
        }
        _ => return None,
    };

    n.is_finite().then_some(n)
}

//
// ================= Facts =================
//

/// Monthly figures extracted from the user's text, independent of the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facts {
    pub income: Option<i64>,
    pub expenses: Option<i64>,
}

impl Facts {
    pub fn new(income: Option<i64>, expenses: Option<i64>) -> Self {
        Self { income, expenses }
    }

    /// `income - expenses` when both are known and the difference fits
    pub fn net_savings(&self) -> Option<i64> {
        self.income?.checked_sub(self.expenses?)
    }
}

//
// ================= Outcome =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// Savings are negative, so the clamped investment is negative too
    InfeasiblePlan {
        monthly_savings: i64,
        monthly_recommended_investment: i64,
    },
    /// The goal is not reachable within the search horizon
    UnreachableGoal {
        goal: String,
        target_amount: i64,
        monthly_investment: i64,
        max_years: u32,
    },
    InvalidGoal { index: usize, reason: String },
    DraftRejected { reason: String },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::InfeasiblePlan {
                monthly_savings,
                monthly_recommended_investment,
            } => write!(
                f,
                "Infeasible plan: monthly savings {} leave a recommended investment of {}",
                monthly_savings, monthly_recommended_investment
            ),
            PlanWarning::UnreachableGoal {
                goal,
                target_amount,
                monthly_investment,
                max_years,
            } => write!(
                f,
                "Goal '{}' ({}) is not reachable within {} years at {} per month",
                goal, target_amount, max_years, monthly_investment
            ),
            PlanWarning::InvalidGoal { index, reason } => {
                write!(f, "Goal #{} skipped: {}", index, reason)
            }
            PlanWarning::DraftRejected { reason } => {
                write!(f, "Draft plan rejected, fallback used: {}", reason)
            }
        }
    }
}

/// One applied correction, keyed by the rule that made it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Correction {
    pub rule: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub notes: Vec<String>,
    pub warnings: Vec<PlanWarning>,
    pub corrections: Vec<Correction>,
}
