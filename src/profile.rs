//! Dataset profiling.
//!
//! Partitions columns into numeric and categorical, computes descriptive
//! statistics, and flags outlier-bearing columns with the IQR rule. The
//! profile feeds both the initial high-confidence conclusion and the data
//! context block of the LLM prompt.

use crate::config::AnalyzerConfig;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub stats: Vec<ColumnStats>,
    /// Numeric columns (among the first few profiled) with at least one
    /// value outside the IQR bounds.
    pub outlier_columns: Vec<String>,
}

impl DatasetProfile {
    pub fn build(df: &DataFrame, config: &AnalyzerConfig) -> Result<Self> {
        let numeric_columns = numeric_column_names(df);
        let categorical_columns = categorical_column_names(df);

        let mut stats = Vec::new();
        let mut outlier_columns = Vec::new();

        for (idx, name) in numeric_columns.iter().enumerate() {
            let series = df.column(name)?;
            let mut values = numeric_values(series)?;
            if values.is_empty() {
                continue;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let column_stats = describe_sorted(name, &values);
            if idx < config.profiled_numeric_columns
                && has_iqr_outliers(&values, config.iqr_multiplier)
            {
                outlier_columns.push(name.clone());
            }
            stats.push(column_stats);
        }

        Ok(Self {
            rows: df.height(),
            columns: df.width(),
            numeric_columns,
            categorical_columns,
            stats,
            outlier_columns,
        })
    }

    /// Semicolon-joined initial conclusion recorded at high confidence when a
    /// dataset is loaded.
    pub fn initial_conclusion(&self, config: &AnalyzerConfig) -> String {
        let mut parts = Vec::new();

        if !self.numeric_columns.is_empty() {
            parts.push(format!(
                "Dataset contains {} numeric columns",
                self.numeric_columns.len()
            ));
        }
        for column in &self.outlier_columns {
            parts.push(format!("Possible outliers detected in {}", column));
        }
        if !self.categorical_columns.is_empty() {
            parts.push(format!(
                "Dataset contains {} categorical columns",
                self.categorical_columns.len()
            ));
        }
        if self.rows > config.large_dataset_rows {
            parts.push("Large dataset - statistically meaningful sample".to_string());
        } else if self.rows < config.small_dataset_rows {
            parts.push("Small dataset - generalize with caution".to_string());
        }

        if parts.is_empty() {
            format!("Initial scan: {} rows loaded", self.rows)
        } else {
            parts.join("; ")
        }
    }

    /// Data context block for the LLM prompt: shape, column names, head rows
    /// and a describe table for the numeric columns.
    pub fn prompt_block(&self, df: &DataFrame) -> String {
        let mut block = String::from("Dataset information:\n");
        block.push_str(&format!("- Shape: {} rows x {} columns\n", self.rows, self.columns));
        block.push_str(&format!(
            "- Columns: {}\n",
            df.get_column_names().join(", ")
        ));
        block.push_str(&format!("- First rows:\n{}\n", df.head(Some(5))));

        if !self.stats.is_empty() {
            block.push_str("- Descriptive statistics:\n");
            for s in &self.stats {
                block.push_str(&format!(
                    "  {}: count={} mean={:.4} std={:.4} min={:.4} q25={:.4} median={:.4} q75={:.4} max={:.4}\n",
                    s.name, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
                ));
            }
        }
        block
    }
}

pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| s.dtype().is_numeric())
        .map(|s| s.name().to_string())
        .collect()
}

pub fn categorical_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| matches!(s.dtype(), DataType::String))
        .map(|s| s.name().to_string())
        .collect()
}

/// Non-null values of a numeric series as f64, in row order.
pub fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca.into_iter().flatten().collect())
}

/// Linear-interpolation quantile of an ascending-sorted, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

fn has_iqr_outliers(sorted: &[f64], multiplier: f64) -> bool {
    let q1 = quantile_sorted(sorted, 0.25);
    let q3 = quantile_sorted(sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    sorted.iter().any(|v| *v < lower || *v > upper)
}

fn describe_sorted(name: &str, sorted: &[f64]) -> ColumnStats {
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    ColumnStats {
        name: name.to_string(),
        count,
        mean,
        std: variance.sqrt(),
        min: sorted[0],
        q25: quantile_sorted(sorted, 0.25),
        median: quantile_sorted(sorted, 0.5),
        q75: quantile_sorted(sorted, 0.75),
        max: sorted[count - 1],
    }
}
