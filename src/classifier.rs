//! Risk Profiler
//!
//! Maps free text to a risk tier with plain keyword matching, and gives the
//! default portfolio allocation for each tier.

use crate::models::{Allocation, AssetClass, RiskTier};

/// Checked first: a message matching both lists is conservative.
const CONSERVATIVE_KEYWORDS: &[&str] = &["safe", "conservative", "secure"];

const AGGRESSIVE_KEYWORDS: &[&str] = &["aggressive", "high return", "growth"];

/// Classify a message into a risk tier
pub fn classify_risk(text: &str) -> RiskTier {
    let text = text.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(*kw));

    if mentions(CONSERVATIVE_KEYWORDS) {
        RiskTier::Conservative
    } else if mentions(AGGRESSIVE_KEYWORDS) {
        RiskTier::Aggressive
    } else {
        RiskTier::Moderate
    }
}

/// Percentages per asset class, in `AssetClass::ALL` order
fn tier_weights(tier: RiskTier) -> [f64; 4] {
    match tier {
        RiskTier::Conservative => [20.0, 60.0, 10.0, 10.0],
        RiskTier::Moderate => [50.0, 30.0, 10.0, 10.0],
        RiskTier::Aggressive => [70.0, 15.0, 10.0, 5.0],
    }
}

/// Default allocation for a tier. Always sums to 100.
pub fn default_allocation(tier: RiskTier) -> Allocation {
    AssetClass::ALL
        .iter()
        .zip(tier_weights(tier))
        .map(|(class, pct)| (class.key().to_string(), pct))
        .collect()
}
