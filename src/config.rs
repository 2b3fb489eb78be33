//! Run configuration for the insight engine.
//!
//! Every knob the analysis depends on lives here as an explicit, immutable
//! value: entity-key columns, metric cleaning/aggregation rules, comparison
//! mode, windows, thresholds, and optional row scoping. Nothing is read from
//! ambient state at run time.

use crate::error::{InsightError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Comparison mode: day-over-day rows, or recent-vs-prior aggregate windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Adjacent,
    Windowed,
}

/// How a metric is aggregated over a window. Volume metrics (revenue,
/// impressions, requests) sum; rate metrics (CTR, fill rate, margin, eCPM)
/// average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
}

/// Threshold interpretation: percent change magnitude or absolute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    Percent,
    Absolute,
}

/// One tracked metric column: its name, the characters stripped before
/// numeric parsing, and its window aggregation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,

    /// Characters removed from raw cells before parsing ("$1,234.50" etc).
    #[serde(default = "default_strip_chars")]
    pub strip_chars: String,

    #[serde(default = "default_aggregation")]
    pub aggregation: Aggregation,
}

fn default_strip_chars() -> String {
    "$%,".to_string()
}

fn default_aggregation() -> Aggregation {
    Aggregation::Sum
}

impl MetricSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            strip_chars: default_strip_chars(),
            aggregation: default_aggregation(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
}

/// Restrict analysis to the top N entities ranked by a summary metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopEntities {
    pub count: usize,

    /// Metric whose whole-table aggregate ranks entities. Must be one of
    /// the configured metrics.
    pub rank_metric: String,
}

/// Keep only rows whose cell in `column` equals `value` (the advertiser
/// dropdown of the source dashboard, made explicit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Keep rows where the cell is <= the bound.
    Le,
    /// Keep rows where the cell is >= the bound.
    Ge,
}

/// One screening rule applied to a numeric column before analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    pub column: String,
    pub op: FilterOp,
    pub value: f64,

    /// Whether rows with an unparseable/missing cell pass the rule.
    #[serde(default)]
    pub keep_null: bool,
}

const TOP_N_MAX: usize = 50;

/// Immutable configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Ordered columns that identify a comparable entity, e.g.
    /// `["Package"]` or `["Package", "Placement", "Ad format", "Channel"]`.
    pub entity_key: Vec<String>,

    #[serde(default = "default_date_column")]
    pub date_column: String,

    pub metrics: Vec<MetricSpec>,

    pub mode: Mode,

    /// Width of the recent window (windowed mode only).
    #[serde(default = "default_window_days")]
    pub window_size_days: i64,

    /// Width of the prior window, ending where the recent window starts.
    #[serde(default = "default_window_days")]
    pub gap_days: i64,

    pub threshold_mode: ThresholdMode,
    pub threshold_value: f64,

    #[serde(default)]
    pub top_n: Option<TopEntities>,

    #[serde(default)]
    pub scope: Option<ScopeFilter>,

    #[serde(default)]
    pub prefilter: Vec<FilterRule>,

    /// Metric reported alongside each insight as revenue context. Must be
    /// one of the configured metrics when set.
    #[serde(default)]
    pub revenue_metric: Option<String>,
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_window_days() -> i64 {
    3
}

impl AnalysisConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency. Column existence is checked later,
    /// against the actual table, at ingestion.
    pub fn validate(&self) -> Result<()> {
        if self.entity_key.is_empty() {
            return Err(InsightError::Config(
                "entity_key must name at least one column".to_string(),
            ));
        }
        if self.metrics.is_empty() {
            return Err(InsightError::Config(
                "metrics must name at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if !seen.insert(metric.name.as_str()) {
                return Err(InsightError::Config(format!(
                    "duplicate metric: {}",
                    metric.name
                )));
            }
        }

        if !self.threshold_value.is_finite() || self.threshold_value <= 0.0 {
            return Err(InsightError::Config(format!(
                "threshold_value must be a positive finite number, got {}",
                self.threshold_value
            )));
        }

        if self.mode == Mode::Windowed && (self.window_size_days < 1 || self.gap_days < 1) {
            return Err(InsightError::Config(format!(
                "window_size_days and gap_days must be >= 1, got {}/{}",
                self.window_size_days, self.gap_days
            )));
        }

        if let Some(ref top) = self.top_n {
            if top.count < 1 || top.count > TOP_N_MAX {
                return Err(InsightError::Config(format!(
                    "top_n.count must be in 1..={}, got {}",
                    TOP_N_MAX, top.count
                )));
            }
            if !seen.contains(top.rank_metric.as_str()) {
                return Err(InsightError::Config(format!(
                    "top_n.rank_metric {} is not a configured metric",
                    top.rank_metric
                )));
            }
        }

        if let Some(ref revenue) = self.revenue_metric {
            if !seen.contains(revenue.as_str()) {
                return Err(InsightError::Config(format!(
                    "revenue_metric {} is not a configured metric",
                    revenue
                )));
            }
        }

        Ok(())
    }

    /// Index of a metric in the configured order.
    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == name)
    }
}
