//! DataFrame boundary: validate columns once and build the typed row store.
//!
//! The upstream loader hands the engine a polars `DataFrame`. Ingestion
//! checks every configured column against the frame (missing columns abort
//! the run), normalizes metric cells to nullable numerics, parses the date
//! column, and produces a `MetricTable` sorted by (entity key, date).
//! Unparseable cells degrade to null; rows without a usable date are
//! dropped. Duplicate (entity, date) rows collapse to the last occurrence.

use crate::config::AnalysisConfig;
use crate::error::{InsightError, Result};
use crate::normalize::clean_numeric;
use crate::table::{EntityKey, MetricRow, MetricTable};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Read a CSV file into a DataFrame for the engine.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = LazyCsvReader::new(path)
        .with_try_parse_dates(true)
        .with_infer_schema_length(Some(1000))
        .finish()
        .and_then(|lf| lf.collect())?;
    Ok(df)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| InsightError::MissingColumn(name.to_string()))
}

/// Entity-key cells as trimmed strings, whatever the column dtype.
pub(crate) fn string_cells(series: &Series) -> Result<Vec<String>> {
    let casted;
    let strings = match series.dtype() {
        DataType::String => series,
        _ => {
            casted = series.cast(&DataType::String)?;
            &casted
        }
    };
    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").trim().to_string())
        .collect())
}

/// Metric cells as nullable numerics. String columns go through the
/// cleaning rule; numeric columns pass straight through.
pub(crate) fn numeric_cells(series: &Series, strip_chars: &str) -> Result<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(|raw| clean_numeric(raw, strip_chars)))
            .collect()),
        DataType::Float64 => Ok(series.f64()?.into_iter().collect()),
        _ => {
            let casted = series.cast(&DataType::Float64).map_err(|_| {
                InsightError::Ingestion(format!(
                    "column {} has non-numeric dtype {:?}",
                    series.name(),
                    series.dtype()
                ))
            })?;
            Ok(casted.f64()?.into_iter().collect())
        }
    }
}

/// Date cells for polars `Date`, `Datetime`, or string columns.
fn date_cells(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    match series.dtype() {
        DataType::Date => days_since_epoch(series),
        DataType::Datetime(_, _) => {
            let casted = series.cast(&DataType::Date)?;
            days_since_epoch(&casted)
        }
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date_str))
            .collect()),
        other => Err(InsightError::Ingestion(format!(
            "column {} has unsupported date dtype {:?}",
            series.name(),
            other
        ))),
    }
}

fn days_since_epoch(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days = series.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|v| v.map(|d| epoch + chrono::Duration::days(d as i64)))
        .collect())
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    // Datetime-ish strings: keep the date part.
    let head = trimmed.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

/// Build the typed row store for one run, validating the configured
/// columns against the frame.
pub fn build_table(df: &DataFrame, config: &AnalysisConfig) -> Result<MetricTable> {
    let height = df.height();

    let mut key_columns = Vec::with_capacity(config.entity_key.len());
    for name in &config.entity_key {
        key_columns.push(string_cells(column(df, name)?)?);
    }

    let dates = date_cells(column(df, &config.date_column)?)?;

    let mut metric_columns = Vec::with_capacity(config.metrics.len());
    for metric in &config.metrics {
        metric_columns.push(numeric_cells(column(df, &metric.name)?, &metric.strip_chars)?);
    }

    let mut rows = Vec::with_capacity(height);
    let mut dropped = 0usize;
    for idx in 0..height {
        let Some(date) = dates.get(idx).copied().flatten() else {
            dropped += 1;
            continue;
        };
        let key = EntityKey::new(key_columns.iter().map(|col| col[idx].clone()).collect());
        let values = metric_columns.iter().map(|col| col[idx]).collect();
        rows.push(MetricRow { key, date, values });
    }
    if dropped > 0 {
        debug!(dropped, "rows skipped for unparseable dates");
    }

    // Stable sort keeps input order within equal (key, date), so keeping
    // the last of each run implements last-row-wins for duplicates.
    rows.sort_by(|a, b| a.key.cmp(&b.key).then(a.date.cmp(&b.date)));
    rows.dedup_by(|next, prev| {
        if next.key == prev.key && next.date == prev.date {
            // dedup_by removes `next`; move its payload into the survivor.
            std::mem::swap(&mut prev.values, &mut next.values);
            true
        } else {
            false
        }
    });

    Ok(MetricTable {
        metric_names: config.metrics.iter().map(|m| m.name.clone()).collect(),
        rows,
    })
}
