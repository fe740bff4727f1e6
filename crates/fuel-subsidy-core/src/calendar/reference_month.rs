use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::FuelSubsidyError;
use crate::types::ReferencePeriod;
use crate::FuelSubsidyResult;

/// First day of the averaging window. The window for target month X runs
/// from the 25th of X-2 to the 24th of X-1.
pub const WINDOW_START_DAY: u32 = 25;

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Where a matching rule sends the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleTarget {
    /// A fixed month of the following year.
    NextYear { ref_month: u32 },
    /// `offset` months after the observation month, carried across December.
    MonthsAhead { offset: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    name: &'static str,
    applies: fn(day: u32, month: u32) -> bool,
    target: RuleTarget,
}

/// Evaluated in order; the first rule that applies wins.
const RULES: [Rule; 5] = [
    Rule {
        name: "late_december",
        applies: |day, month| month == 12 && day >= WINDOW_START_DAY,
        target: RuleTarget::NextYear { ref_month: 2 },
    },
    Rule {
        name: "early_december",
        applies: |day, month| month == 12 && day < WINDOW_START_DAY,
        target: RuleTarget::NextYear { ref_month: 1 },
    },
    Rule {
        name: "late_november",
        applies: |day, month| month == 11 && day >= WINDOW_START_DAY,
        target: RuleTarget::NextYear { ref_month: 1 },
    },
    Rule {
        name: "before_window_start",
        applies: |day, _| day < WINDOW_START_DAY,
        target: RuleTarget::MonthsAhead { offset: 1 },
    },
    Rule {
        name: "from_window_start",
        applies: |day, _| day >= WINDOW_START_DAY,
        target: RuleTarget::MonthsAhead { offset: 2 },
    },
];

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Map a raw `(day, month, year)` to the reference period it is averaged into.
///
/// Fails with `InvalidDate` when the triple is not a calendar date.
pub fn resolve(day: u32, month: u32, year: i32) -> FuelSubsidyResult<ReferencePeriod> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(FuelSubsidyError::InvalidDate { day, month, year })?;
    Ok(resolve_date(date))
}

/// Total over valid dates.
pub fn resolve_date(date: NaiveDate) -> ReferencePeriod {
    let (day, month, year) = (date.day(), date.month(), date.year());
    let rule = RULES
        .iter()
        .find(|r| (r.applies)(day, month))
        .unwrap_or(&RULES[RULES.len() - 1]);
    apply(rule.target, month, year)
}

/// Name of the rule that assigns `date`. Useful for audit output.
pub fn matching_rule(date: NaiveDate) -> &'static str {
    RULES
        .iter()
        .find(|r| (r.applies)(date.day(), date.month()))
        .map(|r| r.name)
        .unwrap_or("none")
}

fn apply(target: RuleTarget, month: u32, year: i32) -> ReferencePeriod {
    match target {
        RuleTarget::NextYear { ref_month } => normalize(ref_month, year + 1),
        RuleTarget::MonthsAhead { offset } => normalize(month + offset, year),
    }
}

/// Fold a month index past December into the following year(s).
fn normalize(month: u32, year: i32) -> ReferencePeriod {
    ReferencePeriod::january(year).plus_months(month - 1)
}

/// Reference period a futures contract month feeds.
///
/// A contract for calendar month X prices the window ending in X, which is
/// averaged into reference month X+1 (December rolls into January).
pub fn resolve_futures_month(month: u32, year: i32) -> FuelSubsidyResult<ReferencePeriod> {
    if !(1..=12).contains(&month) || !ReferencePeriod::year_range().contains(&year) {
        return Err(FuelSubsidyError::InvalidDate {
            day: 1,
            month,
            year,
        });
    }
    Ok(normalize(month + 1, year))
}
