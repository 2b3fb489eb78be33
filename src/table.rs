//! Typed row store for one analysis run.
//!
//! Column lookups happen exactly once, at ingestion; after that the engine
//! works on `MetricRow` values whose metric cells are positional
//! (`values[i]` belongs to `config.metrics[i]`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered values of the configured entity-key columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(pub Vec<String>);

impl EntityKey {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }
}

impl fmt::Display for EntityKey {
    /// `"Pkg"` for a single-column key, `"Pkg (v2, v3)"` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.split_first() {
            None => Ok(()),
            Some((head, [])) => write!(f, "{}", head),
            Some((head, rest)) => write!(f, "{} ({})", head, rest.join(", ")),
        }
    }
}

/// One observation: entity key, date, and the normalized metric cells.
/// `None` means the raw cell was missing or unparseable, never zero.
#[derive(Debug, Clone)]
pub struct MetricRow {
    pub key: EntityKey,
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// All rows of one run, sorted by (entity key, date) ascending with
/// duplicate (key, date) rows collapsed to the last occurrence.
#[derive(Debug, Clone)]
pub struct MetricTable {
    pub metric_names: Vec<String>,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metric_names.iter().position(|n| n == name)
    }

    /// Latest date over the whole table (windowed mode anchors here).
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// Number of distinct entities.
    pub fn entity_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&EntityKey> = None;
        for row in &self.rows {
            if last != Some(&row.key) {
                count += 1;
                last = Some(&row.key);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_display() {
        let single = EntityKey::new(vec!["com.app".to_string()]);
        assert_eq!(single.to_string(), "com.app");

        let full = EntityKey::new(vec![
            "com.app".to_string(),
            "Banner".to_string(),
            "Android".to_string(),
        ]);
        assert_eq!(full.to_string(), "com.app (Banner, Android)");
    }

    #[test]
    fn test_entity_count_over_sorted_rows() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = vec![
            MetricRow {
                key: EntityKey::new(vec!["a".to_string()]),
                date: d,
                values: vec![Some(1.0)],
            },
            MetricRow {
                key: EntityKey::new(vec!["a".to_string()]),
                date: d.succ_opt().unwrap(),
                values: vec![Some(2.0)],
            },
            MetricRow {
                key: EntityKey::new(vec!["b".to_string()]),
                date: d,
                values: vec![None],
            },
        ];
        let table = MetricTable {
            metric_names: vec!["Gross Revenue".to_string()],
            rows,
        };
        assert_eq!(table.entity_count(), 2);
        assert_eq!(table.latest_date(), d.succ_opt());
    }
}
