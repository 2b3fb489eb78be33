//! The insight engine: one synchronous pass from frame to insight list.
//!
//! Each run is a pure function of (table, config). The pipeline order is
//! fixed: scope -> prefilter -> ingest/normalize -> top-N -> compare ->
//! anomaly filter. The run owns every intermediate value; the caller's
//! frame is never mutated.

use crate::compare::{adjacent_deltas, windowed_deltas};
use crate::config::{AnalysisConfig, Mode};
use crate::error::Result;
use crate::ingest::build_table;
use crate::insight::{build_insights, InsightRecord};
use crate::prefilter::{apply_rules, apply_scope};
use crate::select::top_entities;
use polars::prelude::DataFrame;
use tracing::info;

pub struct InsightEngine {
    config: AnalysisConfig,
}

impl InsightEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one analysis over the given frame and return the ordered
    /// insight list. Cell-level parse issues degrade to missing data;
    /// missing columns and inconsistent config abort the run.
    pub fn run(&self, frame: &DataFrame) -> Result<Vec<InsightRecord>> {
        self.config.validate()?;

        let mut frame = frame.clone();
        if let Some(ref scope) = self.config.scope {
            frame = apply_scope(&frame, scope)?;
        }
        if !self.config.prefilter.is_empty() {
            frame = apply_rules(&frame, &self.config.prefilter)?;
        }

        let mut table = build_table(&frame, &self.config)?;
        info!(
            rows = table.rows.len(),
            entities = table.entity_count(),
            "table ingested"
        );

        if let Some(ref top) = self.config.top_n {
            table = top_entities(table, &top.rank_metric, top.count)?;
        }

        let deltas = match self.config.mode {
            Mode::Adjacent => adjacent_deltas(&table, &self.config),
            Mode::Windowed => windowed_deltas(&table, &self.config),
        };

        let insights = build_insights(&deltas, &self.config);
        info!(insights = insights.len(), "analysis complete");
        Ok(insights)
    }
}
