//! Grouped time-series comparison.
//!
//! Rows are partitioned by entity key (table order is already sorted by
//! key, then date) and each tracked metric is compared period-over-period
//! in one of two modes:
//!
//! - adjacent: lag-1 percent change between consecutive dated rows;
//! - windowed: a recent window aggregated against the prior window, with
//!   per-metric sum/mean aggregation.
//!
//! Percent change is left undefined whenever the baseline is zero or
//! missing. It is never surfaced as an infinity or NaN.

use crate::config::{Aggregation, AnalysisConfig};
use crate::table::{EntityKey, MetricRow, MetricTable};
use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// The observation a delta belongs to: a single dated row, or a pair of
/// aggregation windows.
#[derive(Debug, Clone, Serialize)]
pub enum Period {
    Date(NaiveDate),
    Window {
        recent_start: NaiveDate,
        recent_end: NaiveDate,
        prior_start: NaiveDate,
        prior_end: NaiveDate,
    },
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Period::Window {
                recent_start,
                recent_end,
                prior_start,
                prior_end,
            } => write!(
                f,
                "{}..{} vs {}..{}",
                recent_start.format("%Y-%m-%d"),
                recent_end.format("%Y-%m-%d"),
                prior_start.format("%Y-%m-%d"),
                prior_end.format("%Y-%m-%d"),
            ),
        }
    }
}

/// One period-over-period comparison for one entity and one metric.
#[derive(Debug, Clone)]
pub struct DeltaRecord {
    pub key: EntityKey,
    pub metric: String,
    pub period: Period,
    pub baseline: Option<f64>,
    pub current: Option<f64>,
    /// `current - baseline`, defined only when both sides are.
    pub change_abs: Option<f64>,
    /// Percent change against the baseline; `None` when the baseline is
    /// zero or missing.
    pub change_pct: Option<f64>,
    /// Revenue context carried along for the insight, when configured.
    pub context: Option<f64>,
}

fn percent_change(baseline: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (baseline, current) {
        (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev * 100.0),
        _ => None,
    }
}

/// Mode A: one delta per metric for every row after the first in its group.
pub fn adjacent_deltas(table: &MetricTable, config: &AnalysisConfig) -> Vec<DeltaRecord> {
    let revenue_idx = config
        .revenue_metric
        .as_deref()
        .and_then(|name| table.metric_index(name));

    let mut deltas = Vec::new();
    for (key, rows) in &table.rows.iter().group_by(|r| r.key.clone()) {
        let rows: Vec<_> = rows.collect();
        for pair in rows.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            for (idx, metric) in table.metric_names.iter().enumerate() {
                let baseline = prev.values[idx];
                let current = cur.values[idx];
                deltas.push(DeltaRecord {
                    key: key.clone(),
                    metric: metric.clone(),
                    period: Period::Date(cur.date),
                    baseline,
                    current,
                    change_abs: baseline.zip(current).map(|(p, c)| c - p),
                    change_pct: percent_change(baseline, current),
                    context: revenue_idx.and_then(|r| cur.values[r]),
                });
            }
        }
    }
    debug!(deltas = deltas.len(), "adjacent comparison complete");
    deltas
}

/// Aggregate the non-null cells of one metric over one date window.
/// An entity with nothing in the window aggregates to zero.
fn window_aggregate(
    rows: &[&MetricRow],
    metric_idx: usize,
    after: NaiveDate,
    up_to: NaiveDate,
    aggregation: Aggregation,
) -> f64 {
    let cells: Vec<f64> = rows
        .iter()
        .filter(|r| r.date > after && r.date <= up_to)
        .filter_map(|r| r.values[metric_idx])
        .collect();
    if cells.is_empty() {
        return 0.0;
    }
    let sum: f64 = cells.iter().sum();
    match aggregation {
        Aggregation::Sum => sum,
        Aggregation::Mean => sum / cells.len() as f64,
    }
}

/// Mode B: one delta per entity per metric, comparing the recent window
/// against the prior window. Window bounds are anchored at the latest date
/// of the whole table, not per entity.
pub fn windowed_deltas(table: &MetricTable, config: &AnalysisConfig) -> Vec<DeltaRecord> {
    let Some(latest) = table.latest_date() else {
        return Vec::new();
    };
    let recent_after = latest - Duration::days(config.window_size_days);
    let prior_after = recent_after - Duration::days(config.gap_days);
    let period = Period::Window {
        recent_start: recent_after + Duration::days(1),
        recent_end: latest,
        prior_start: prior_after + Duration::days(1),
        prior_end: recent_after,
    };

    let revenue_idx = config
        .revenue_metric
        .as_deref()
        .and_then(|name| table.metric_index(name));

    let mut deltas = Vec::new();
    for (key, rows) in &table.rows.iter().group_by(|r| r.key.clone()) {
        let rows: Vec<_> = rows.collect();
        let context = revenue_idx.map(|r| {
            let spec = &config.metrics[r];
            window_aggregate(&rows, r, recent_after, latest, spec.aggregation)
        });
        for (idx, spec) in config.metrics.iter().enumerate() {
            let recent = window_aggregate(&rows, idx, recent_after, latest, spec.aggregation);
            let prior = window_aggregate(&rows, idx, prior_after, recent_after, spec.aggregation);
            deltas.push(DeltaRecord {
                key: key.clone(),
                metric: spec.name.clone(),
                period: period.clone(),
                baseline: Some(prior),
                current: Some(recent),
                change_abs: Some(recent - prior),
                change_pct: percent_change(Some(prior), Some(recent)),
                context,
            });
        }
    }
    debug!(
        deltas = deltas.len(),
        %latest,
        "windowed comparison complete"
    );
    deltas
}
