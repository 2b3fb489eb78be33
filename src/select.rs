//! Top-entity selection.
//!
//! Ranks entities by the whole-table aggregate of a summary metric and
//! keeps the rows of the top N, so windowed aggregates downstream reflect
//! only the retained entities. Runs before the comparator.

use crate::error::{InsightError, Result};
use crate::table::{EntityKey, MetricTable};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Retain only rows whose entity ranks in the top `count` by summed
/// `rank_metric`. Missing cells contribute nothing to the sum. Ties at the
/// boundary resolve by first-encountered entity order, which after
/// ingestion's sort is ascending key order — deterministic across runs.
pub fn top_entities(table: MetricTable, rank_metric: &str, count: usize) -> Result<MetricTable> {
    let metric_idx = table.metric_index(rank_metric).ok_or_else(|| {
        InsightError::Config(format!("rank metric {} is not in the table", rank_metric))
    })?;

    let mut order: Vec<EntityKey> = Vec::new();
    let mut totals: HashMap<EntityKey, f64> = HashMap::new();
    for row in &table.rows {
        if !totals.contains_key(&row.key) {
            order.push(row.key.clone());
        }
        let total = totals.entry(row.key.clone()).or_insert(0.0);
        if let Some(v) = row.values[metric_idx] {
            *total += v;
        }
    }

    // Stable sort, descending: equal totals keep first-encounter order.
    let mut ranked = order;
    ranked.sort_by(|a, b| {
        totals[b]
            .partial_cmp(&totals[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(count);
    debug!(
        rank_metric,
        retained = ranked.len(),
        "top-entity selection applied"
    );

    let keep: HashSet<&EntityKey> = ranked.iter().collect();
    let MetricTable { metric_names, rows } = table;
    let rows = rows
        .into_iter()
        .filter(|row| keep.contains(&row.key))
        .collect();

    Ok(MetricTable { metric_names, rows })
}
