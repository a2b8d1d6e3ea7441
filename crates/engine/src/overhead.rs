//! Allocation of shared operating expenses onto preparation time.
//!
//! Every qualifying expense is an independently running cost stream, so the
//! per-minute rates are summed across expenses rather than averaged. A
//! recipe then absorbs `rate * preparation minutes` of overhead.

use crate::expenses::Expense;

const DAYS_PER_MONTH: f64 = 30.0;
const MINUTES_PER_HOUR: f64 = 60.0;

/// Cost per operating minute across a tenant's expenses.
///
/// Rows qualify only with a positive monthly cost **and** positive daily
/// operating minutes; everything else contributes zero.
pub(crate) fn per_minute_rate(expenses: &[Expense]) -> f64 {
    expenses
        .iter()
        .filter(|expense| expense.monthly_cost > 0.0 && expense.daily_minutes > 0.0)
        .map(|expense| (expense.monthly_cost / DAYS_PER_MONTH) / expense.daily_minutes / MINUTES_PER_HOUR)
        .sum()
}

/// Overhead absorbed by a recipe that takes `prep_minutes` to prepare.
pub(crate) fn allocate(rate: f64, prep_minutes: f64) -> f64 {
    rate * prep_minutes
}
