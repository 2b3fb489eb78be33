//! Delimited serialization of the insight list.
//!
//! Mirrors the dashboard's "Download Insights CSV": one row per insight
//! with entity, metric, period, direction, magnitude, and current value.

use crate::error::Result;
use crate::insight::InsightRecord;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = ["entity", "metric", "period", "direction", "magnitude", "value"];

/// Write the insight rows to any writer.
pub fn write_insights<W: Write>(insights: &[InsightRecord], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;
    for insight in insights {
        out.write_record([
            insight.key.to_string(),
            insight.metric.clone(),
            insight.period.to_string(),
            insight.direction.label().to_string(),
            insight.magnitude.clone(),
            format!("{:.2}", insight.value),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Write the insight rows to a file.
pub fn write_insights_file(insights: &[InsightRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_insights(insights, file)
}
