//! Fact extraction
//!
//! Pulls monthly income and expense figures out of free text so the
//! validator can check the model's savings arithmetic independently.

use crate::models::Facts;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Source of structured facts for a message
pub trait FactExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Facts;
}

lazy_static! {
    /// An amount, an optional magnitude word, then an annual or monthly marker.
    static ref PERIOD_FIGURE: Regex = Regex::new(
        r"(?ix)
        (?P<amount>\d[\d,]*(?:\.\d+)?)
        \s*
        (?P<unit>thousand|k|lakhs?|lacs?|l|crores?|cr|million|m)?
        \s*
        (?:
            (?P<annual>per\s+annum|per\s+year|a\s+year|/\s*(?:yr|year)|yearly|annually|annual|p\.?\s?a)
          | (?P<monthly>per\s+month|a\s+month|/\s*mo(?:nth)?|monthly)
        )\b"
    )
    .expect("period figure pattern is valid");
}

const INCOME_KEYWORDS: &[&str] = &["income", "salary", "earn", "make", "ctc", "package"];

const EXPENSE_KEYWORDS: &[&str] = &["expense", "spend", "cost", "rent", "bills", "outgo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FigureKind {
    Income,
    Expense,
    Unlabelled,
}

/// Reads figures such as "12 lakh per annum" or "50,000 a month".
/// Annual figures become monthly by integer division by 12.
///
/// Each figure is labelled by the nearest income or expense keyword since
/// the previous figure. An unlabelled figure fills income first, then expenses.
pub struct AnnualFigureExtractor;

impl FactExtractor for AnnualFigureExtractor {
    fn extract(&self, text: &str) -> Facts {
        let mut facts = Facts::default();
        let mut window_start = 0;

        for caps in PERIOD_FIGURE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let window = text[window_start..whole.start()].to_lowercase();
            window_start = whole.end();

            let Some(monthly) = monthly_amount(&caps) else {
                continue;
            };

            let slot = match label(&window) {
                FigureKind::Income => &mut facts.income,
                FigureKind::Expense => &mut facts.expenses,
                FigureKind::Unlabelled if facts.income.is_none() => &mut facts.income,
                FigureKind::Unlabelled => &mut facts.expenses,
            };

            if slot.is_none() {
                *slot = Some(monthly);
            }
        }

        facts
    }
}

/// Fixed facts, for callers that already know the numbers
pub struct StaticFacts(pub Facts);

impl FactExtractor for StaticFacts {
    fn extract(&self, _text: &str) -> Facts {
        self.0
    }
}

fn label(window: &str) -> FigureKind {
    let last_position = |keywords: &[&str]| keywords.iter().filter_map(|kw| window.rfind(*kw)).max();

    match (last_position(INCOME_KEYWORDS), last_position(EXPENSE_KEYWORDS)) {
        (Some(i), Some(e)) if e > i => FigureKind::Expense,
        (Some(_), _) => FigureKind::Income,
        (None, Some(_)) => FigureKind::Expense,
        (None, None) => FigureKind::Unlabelled,
    }
}

fn multiplier(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "thousand" | "k" => 1e3,
        "lakh" | "lakhs" | "lac" | "lacs" | "l" => 1e5,
        "million" | "m" => 1e6,
        "crore" | "crores" | "cr" => 1e7,
        _ => 1.0,
    }
}

fn monthly_amount(caps: &Captures<'_>) -> Option<i64> {
    let raw = caps.name("amount")?.as_str().replace(',', "");
    let base: f64 = raw.parse().ok()?;
    let scale = caps.name("unit").map(|u| multiplier(u.as_str())).unwrap_or(1.0);
    let amount = (base * scale).round() as i64;

    if caps.name("annual").is_some() {
        Some(amount / 12)
    } else {
        Some(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Facts {
        AnnualFigureExtractor.extract(text)
    }

    #[test]
    fn test_annual_income_and_expenses() {
        let facts = extract("My salary is 720000 per annum and my expenses are 600000 per annum");
        assert_eq!(facts, Facts::new(Some(60_000), Some(50_000)));
    }

    #[test]
    fn test_integer_division_by_twelve() {
        let facts = extract("I earn 1000001 a year");
        assert_eq!(facts.income, Some(83_333));
        assert_eq!(facts.expenses, None);
    }

    #[test]
    fn test_indian_units_and_separators() {
        let facts = extract("Income 12 LPA, spending about 6 lakh p.a.");
        assert_eq!(facts, Facts::new(Some(100_000), Some(50_000)));

        let facts = extract("I make 1,20,000 per month and rent plus bills cost 45,000 monthly");
        assert_eq!(facts, Facts::new(Some(120_000), Some(45_000)));
    }

    #[test]
    fn test_expense_keyword_nearest_wins() {
        let facts = extract("Apart from my income, I spend 240000 annually. I earn 960000 yearly.");
        assert_eq!(facts, Facts::new(Some(80_000), Some(20_000)));
    }

    #[test]
    fn test_unlabelled_figures_fill_in_order() {
        let facts = extract("900000 per year in, 480000 per year out");
        assert_eq!(facts, Facts::new(Some(75_000), Some(40_000)));
    }

    #[test]
    fn test_unmarked_numbers_ignored() {
        assert_eq!(extract("I want 5000000 in 10 years"), Facts::default());
        assert_eq!(extract("We paid 30000 last week"), Facts::default());
        assert_eq!(extract(""), Facts::default());
    }

    #[test]
    fn test_static_facts() {
        let facts = Facts::new(Some(1), Some(2));
        assert_eq!(StaticFacts(facts).extract("anything"), facts);
    }
}
