//! Campaign performance insight engine.
//!
//! Ingests a tabular frame of advertising-campaign metrics (one row per
//! entity and date), compares metrics period-over-period, and emits an
//! ordered list of anomaly insights for rendering or export.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod insight;
pub mod normalize;
pub mod prefilter;
pub mod select;
pub mod table;

pub use compare::{DeltaRecord, Period};
pub use config::{
    Aggregation, AnalysisConfig, FilterOp, FilterRule, MetricSpec, Mode, ScopeFilter,
    ThresholdMode, TopEntities,
};
pub use engine::InsightEngine;
pub use error::{InsightError, Result};
pub use insight::{Direction, InsightRecord};
pub use table::{EntityKey, MetricRow, MetricTable};
