//! Row screening applied to the frame before analysis.
//!
//! Two screens ported from the source tooling: an equality scope (the
//! advertiser dropdown) and a set of numeric threshold rules (the generic
//! row filter: RPM <= x, revenue <= y or null, requests >= z). Both run on
//! the caller's frame and return a filtered copy; the engine never mutates
//! its input in place.

use crate::config::{FilterOp, FilterRule, ScopeFilter};
use crate::error::{InsightError, Result};
use crate::ingest::{numeric_cells, string_cells};
use polars::prelude::*;
use tracing::debug;

const FILTER_STRIP_CHARS: &str = "$%,";

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| InsightError::MissingColumn(name.to_string()))
}

/// Keep only rows whose cell equals the scope value.
pub fn apply_scope(df: &DataFrame, scope: &ScopeFilter) -> Result<DataFrame> {
    let cells = string_cells(column(df, &scope.column)?)?;
    let mask: Vec<bool> = cells.iter().map(|v| v == &scope.value).collect();
    let kept = mask.iter().filter(|&&b| b).count();
    debug!(
        column = %scope.column,
        value = %scope.value,
        kept,
        total = df.height(),
        "scope filter applied"
    );
    let mask = BooleanChunked::from_slice("scope_mask", &mask);
    Ok(df.filter(&mask)?)
}

/// Apply every threshold rule; a row survives only if it passes all of
/// them. Unparseable cells pass a rule only when it opts into nulls.
pub fn apply_rules(df: &DataFrame, rules: &[FilterRule]) -> Result<DataFrame> {
    let mut mask = vec![true; df.height()];
    for rule in rules {
        let cells = numeric_cells(column(df, &rule.column)?, FILTER_STRIP_CHARS)?;
        for (keep, cell) in mask.iter_mut().zip(&cells) {
            let passes = match cell {
                None => rule.keep_null,
                Some(v) => match rule.op {
                    FilterOp::Le => *v <= rule.value,
                    FilterOp::Ge => *v >= rule.value,
                },
            };
            *keep = *keep && passes;
        }
    }
    let kept = mask.iter().filter(|&&b| b).count();
    debug!(rules = rules.len(), kept, total = df.height(), "prefilter applied");
    let mask = BooleanChunked::from_slice("prefilter_mask", &mask);
    Ok(df.filter(&mask)?)
}
