//! Anomaly filtering and insight formatting.
//!
//! A delta survives the filter iff its change (percent or absolute,
//! matching the threshold mode) is defined, finite, and at least as large
//! in magnitude as the threshold, and the metric's current value is
//! non-null and non-zero. Survivors become immutable `InsightRecord`s.

use crate::compare::{DeltaRecord, Period};
use crate::config::{AnalysisConfig, ThresholdMode};
use crate::table::EntityKey;
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Increase => "🔺",
            Self::Decrease => "🔻",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

/// One reported anomaly. Immutable once built; only serialized/rendered.
#[derive(Debug, Clone, Serialize)]
pub struct InsightRecord {
    pub key: EntityKey,
    pub metric: String,
    pub direction: Direction,
    /// Human-readable change, e.g. `"30.0%"` or `"-125.40"`.
    pub magnitude: String,
    /// Raw change in the units of the threshold mode that produced it.
    pub change: f64,
    /// Current value of the metric (row value or recent-window aggregate).
    pub value: f64,
    /// Revenue context, when configured and available.
    pub revenue: Option<f64>,
    pub period: Period,
}

impl fmt::Display for InsightRecord {
    /// `🔺 Gross Revenue for com.app (Banner) changed 30.0% on 2024-01-02 (value: 130.00)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preposition = match self.period {
            Period::Date(_) => "on",
            Period::Window { .. } => "over",
        };
        write!(
            f,
            "{} {} for {} changed {} {} {} (value: {:.2})",
            self.direction.glyph(),
            self.metric,
            self.key,
            self.magnitude,
            preposition,
            self.period,
            self.value,
        )?;
        if let Some(revenue) = self.revenue {
            write!(f, " [revenue: {:.2}]", revenue)?;
        }
        Ok(())
    }
}

fn format_magnitude(change: f64, mode: ThresholdMode) -> String {
    match mode {
        ThresholdMode::Percent => format!("{:.1}%", change),
        ThresholdMode::Absolute => format!("{:.2}", change),
    }
}

/// Apply the anomaly threshold and turn surviving deltas into insights,
/// preserving delta order.
pub fn build_insights(deltas: &[DeltaRecord], config: &AnalysisConfig) -> Vec<InsightRecord> {
    let mut insights = Vec::new();
    for delta in deltas {
        let change = match config.threshold_mode {
            ThresholdMode::Percent => delta.change_pct,
            ThresholdMode::Absolute => delta.change_abs,
        };
        let Some(change) = change else { continue };
        // Earlier null/zero handling keeps infinities out; reject anyway.
        if !change.is_finite() || change.abs() < config.threshold_value {
            continue;
        }
        let Some(value) = delta.current.filter(|v| *v != 0.0) else {
            continue;
        };

        let direction = if change > 0.0 {
            Direction::Increase
        } else {
            Direction::Decrease
        };
        insights.push(InsightRecord {
            key: delta.key.clone(),
            metric: delta.metric.clone(),
            direction,
            magnitude: format_magnitude(change, config.threshold_mode),
            change,
            value,
            // The revenue column's own insights already carry the value.
            revenue: delta
                .context
                .filter(|_| config.revenue_metric.as_deref() != Some(delta.metric.as_str())),
            period: delta.period.clone(),
        });
    }
    debug!(
        retained = insights.len(),
        examined = deltas.len(),
        "anomaly threshold applied"
    );
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetricSpec, Mode};
    use chrono::NaiveDate;

    fn config(mode: ThresholdMode, value: f64) -> AnalysisConfig {
        AnalysisConfig {
            entity_key: vec!["Package".to_string()],
            date_column: "Date".to_string(),
            metrics: vec![MetricSpec::new("Gross Revenue")],
            mode: Mode::Adjacent,
            window_size_days: 3,
            gap_days: 3,
            threshold_mode: mode,
            threshold_value: value,
            top_n: None,
            scope: None,
            prefilter: Vec::new(),
            revenue_metric: None,
        }
    }

    fn delta(change_pct: Option<f64>, change_abs: Option<f64>, current: Option<f64>) -> DeltaRecord {
        DeltaRecord {
            key: EntityKey::new(vec!["a.app".to_string()]),
            metric: "Gross Revenue".to_string(),
            period: Period::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            baseline: Some(1.0),
            current,
            change_abs,
            change_pct,
            context: None,
        }
    }

    #[test]
    fn test_percent_threshold_is_inclusive() {
        let config = config(ThresholdMode::Percent, 20.0);
        let at = build_insights(&[delta(Some(20.0), Some(5.0), Some(6.0))], &config);
        assert_eq!(at.len(), 1);
        let below = build_insights(&[delta(Some(19.9), Some(5.0), Some(6.0))], &config);
        assert!(below.is_empty());
    }

    #[test]
    fn test_undefined_change_never_surfaces() {
        let config = config(ThresholdMode::Percent, 20.0);
        let none = build_insights(&[delta(None, Some(500.0), Some(500.0))], &config);
        assert!(none.is_empty());
    }

    #[test]
    fn test_zero_current_value_is_noise() {
        let config = config(ThresholdMode::Percent, 20.0);
        let none = build_insights(&[delta(Some(-100.0), Some(-5.0), Some(0.0))], &config);
        assert!(none.is_empty());
        let none = build_insights(&[delta(Some(50.0), Some(5.0), None)], &config);
        assert!(none.is_empty());
    }

    #[test]
    fn test_nonfinite_change_rejected() {
        let config = config(ThresholdMode::Percent, 20.0);
        let none = build_insights(&[delta(Some(f64::INFINITY), Some(5.0), Some(6.0))], &config);
        assert!(none.is_empty());
    }

    #[test]
    fn test_direction_and_magnitude_formatting() {
        let config = config(ThresholdMode::Percent, 20.0);
        let up = build_insights(&[delta(Some(30.04), None, Some(130.0))], &config);
        assert_eq!(up[0].direction, Direction::Increase);
        assert_eq!(up[0].magnitude, "30.0%");

        let down = build_insights(&[delta(Some(-25.0), None, Some(75.0))], &config);
        assert_eq!(down[0].direction, Direction::Decrease);
        assert_eq!(down[0].magnitude, "-25.0%");
    }

    #[test]
    fn test_absolute_mode_uses_absolute_change() {
        let config = config(ThresholdMode::Absolute, 10.0);
        let kept = build_insights(&[delta(None, Some(50.0), Some(50.0))], &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].magnitude, "50.00");

        // |change| at the boundary passes; just under does not.
        let boundary = build_insights(&[delta(Some(-20.0), Some(-10.0), Some(40.0))], &config);
        assert_eq!(boundary.len(), 1);
        assert_eq!(boundary[0].direction, Direction::Decrease);
        let under = build_insights(&[delta(Some(-19.0), Some(-9.9), Some(40.0))], &config);
        assert!(under.is_empty());
    }

    #[test]
    fn test_display_line_shape() {
        let config = config(ThresholdMode::Percent, 20.0);
        let insights = build_insights(&[delta(Some(30.0), Some(30.0), Some(130.0))], &config);
        assert_eq!(
            insights[0].to_string(),
            "🔺 Gross Revenue for a.app changed 30.0% on 2024-01-02 (value: 130.00)"
        );
    }

    #[test]
    fn test_threshold_monotonicity() {
        let deltas: Vec<DeltaRecord> = [5.0, 15.0, 25.0, 35.0]
            .iter()
            .map(|pct| delta(Some(*pct), Some(1.0), Some(10.0)))
            .collect();
        let mut last = usize::MAX;
        for threshold in [1.0, 10.0, 20.0, 30.0, 40.0] {
            let config = config(ThresholdMode::Percent, threshold);
            let count = build_insights(&deltas, &config).len();
            assert!(count <= last);
            last = count;
        }
    }
}
