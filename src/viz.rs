//! Heuristic chart selection and rendering.
//!
//! Maps a free-text question plus the dataset's column types to a chart kind
//! (first matching rule wins), renders it as SVG and returns it base64-encoded
//! as a data URI. Only the first numeric and first categorical column are ever
//! considered. Rendering failures never escape: they degrade to "no chart".

use crate::error::{InsightError, Result};
use crate::profile::{categorical_column_names, numeric_column_names, numeric_values, quantile_sorted};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::warn;

const DISTRIBUTION_WORDS: &[&str] = &["distribution", "histogram", "frequency"];
const CORRELATION_WORDS: &[&str] = &["correlation", "relationship", "association"];
const BOXPLOT_WORDS: &[&str] = &["boxplot", "outlier", "dispersion"];

pub const HISTOGRAM_BINS: usize = 15;
pub const BAR_TOP_VALUES: usize = 10;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 48.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    Histogram { column: String, bins: usize },
    Scatter { x: String, y: String },
    Box { column: String },
    Bar { column: String, top: usize },
    Line { column: String },
}

/// Pick a chart for the question, or `None` when the dataset offers nothing
/// to plot. Rules are evaluated in order; the first match wins.
pub fn select_chart(question: &str, df: &DataFrame) -> Option<ChartKind> {
    let q = question.to_lowercase();
    let numeric = numeric_column_names(df);
    let categorical = categorical_column_names(df);

    if let Some(first) = numeric.first() {
        if DISTRIBUTION_WORDS.iter().any(|w| q.contains(w)) {
            return Some(ChartKind::Histogram {
                column: first.clone(),
                bins: HISTOGRAM_BINS,
            });
        }
        if CORRELATION_WORDS.iter().any(|w| q.contains(w)) {
            return Some(if numeric.len() >= 2 {
                ChartKind::Scatter {
                    x: numeric[0].clone(),
                    y: numeric[1].clone(),
                }
            } else {
                ChartKind::Histogram {
                    column: first.clone(),
                    bins: HISTOGRAM_BINS,
                }
            });
        }
        if BOXPLOT_WORDS.iter().any(|w| q.contains(w)) {
            return Some(ChartKind::Box {
                column: first.clone(),
            });
        }
    }

    // No keyword matched (or no numeric column exists): categorical bar
    // chart first, then a row-order line as a naive trend fallback.
    if let Some(first_cat) = categorical.first() {
        return Some(ChartKind::Bar {
            column: first_cat.clone(),
            top: BAR_TOP_VALUES,
        });
    }
    if df.height() > 1 {
        if let Some(first) = numeric.first() {
            return Some(ChartKind::Line {
                column: first.clone(),
            });
        }
    }
    None
}

/// Select and render in one step. Any failure is logged and degrades to
/// `None`; this function never errors.
pub fn chart_for(question: &str, df: &DataFrame) -> Option<String> {
    let kind = select_chart(question, df)?;
    match render_chart(df, &kind) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("chart rendering failed, continuing without chart: {}", e);
            None
        }
    }
}

/// Render a chart to an SVG data URI.
pub fn render_chart(df: &DataFrame, kind: &ChartKind) -> Result<String> {
    let svg = match kind {
        ChartKind::Histogram { column, bins } => {
            let values = column_values(df, column)?;
            render_histogram(column, &values, *bins)
        }
        ChartKind::Scatter { x, y } => {
            let xs = column_values(df, x)?;
            let ys = column_values(df, y)?;
            render_scatter(x, y, &xs, &ys)
        }
        ChartKind::Box { column } => {
            let mut values = column_values(df, column)?;
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            render_box(column, &values)
        }
        ChartKind::Bar { column, top } => {
            let counts = top_value_counts(df, column, *top)?;
            render_bar(column, &counts)
        }
        ChartKind::Line { column } => {
            let values = column_values(df, column)?;
            render_line(column, &values)
        }
    };
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}

fn column_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let values = numeric_values(df.column(column)?)?;
    if values.is_empty() {
        return Err(InsightError::Chart(format!(
            "column {} has no numeric values",
            column
        )));
    }
    Ok(values)
}

/// Frequency of the most common values of a text column, descending. Ties
/// break alphabetically so output is deterministic.
fn top_value_counts(df: &DataFrame, column: &str, top: usize) -> Result<Vec<(String, usize)>> {
    let series = df.column(column)?;
    let ca = series.str()?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return Err(InsightError::Chart(format!(
            "column {} has no values to count",
            column
        )));
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(top);
    Ok(sorted)
}

fn svg_open(title: &str) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" "#,
            r#"viewBox="0 0 {w} {h}">"#,
            r#"<rect width="{w}" height="{h}" fill="white"/>"#,
            r#"<text x="{tx}" y="24" text-anchor="middle" font-family="sans-serif" "#,
            r#"font-size="16">{title}</text>"#
        ),
        w = WIDTH,
        h = HEIGHT,
        tx = WIDTH / 2.0,
        title = xml_escape(title),
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn span_of(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        1.0
    } else {
        span
    }
}

fn render_histogram(column: &str, values: &[f64], bins: usize) -> String {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = span_of(min, max);

    let mut counts = vec![0usize; bins];
    for v in values {
        let mut idx = (((v - min) / span) * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        counts[idx] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1) as f64;

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let bar_w = plot_w / bins as f64;

    let mut svg = svg_open(&format!("Distribution of {}", column));
    for (i, count) in counts.iter().enumerate() {
        let bar_h = (*count as f64 / peak) * plot_h;
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="skyblue" stroke="steelblue"/>"#,
            MARGIN + i as f64 * bar_w,
            HEIGHT - MARGIN - bar_h,
            bar_w - 1.0,
            bar_h,
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn render_scatter(x_name: &str, y_name: &str, xs: &[f64], ys: &[f64]) -> String {
    let n = xs.len().min(ys.len());
    let x_min = xs[..n].iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = xs[..n].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_min = ys[..n].iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys[..n].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let x_span = span_of(x_min, x_max);
    let y_span = span_of(y_min, y_max);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;

    let mut svg = svg_open(&format!("Relationship between {} and {}", x_name, y_name));
    for i in 0..n {
        let cx = MARGIN + ((xs[i] - x_min) / x_span) * plot_w;
        let cy = HEIGHT - MARGIN - ((ys[i] - y_min) / y_span) * plot_h;
        svg.push_str(&format!(
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="steelblue" fill-opacity="0.7"/>"#,
            cx, cy
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn render_box(column: &str, sorted: &[f64]) -> String {
    let q1 = quantile_sorted(sorted, 0.25);
    let median = quantile_sorted(sorted, 0.5);
    let q3 = quantile_sorted(sorted, 0.75);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let span = span_of(min, max);

    let plot_h = HEIGHT - 2.0 * MARGIN;
    let y_of = |v: f64| HEIGHT - MARGIN - ((v - min) / span) * plot_h;
    let box_x = WIDTH / 2.0 - 60.0;
    let box_w = 120.0;
    let center_x = WIDTH / 2.0;

    let mut svg = svg_open(&format!("Boxplot of {}", column));
    // whiskers
    svg.push_str(&format!(
        r#"<line x1="{cx}" y1="{:.1}" x2="{cx}" y2="{:.1}" stroke="black"/>"#,
        y_of(min),
        y_of(q1),
        cx = center_x
    ));
    svg.push_str(&format!(
        r#"<line x1="{cx}" y1="{:.1}" x2="{cx}" y2="{:.1}" stroke="black"/>"#,
        y_of(q3),
        y_of(max),
        cx = center_x
    ));
    // interquartile box and median line
    svg.push_str(&format!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="skyblue" stroke="black"/>"#,
        box_x,
        y_of(q3),
        box_w,
        (y_of(q1) - y_of(q3)).max(1.0),
    ));
    svg.push_str(&format!(
        r#"<line x1="{:.1}" y1="{my:.1}" x2="{:.1}" y2="{my:.1}" stroke="black" stroke-width="2"/>"#,
        box_x,
        box_x + box_w,
        my = y_of(median),
    ));
    svg.push_str("</svg>");
    svg
}

fn render_bar(column: &str, counts: &[(String, usize)]) -> String {
    let peak = counts.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1) as f64;
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let bar_w = plot_w / counts.len() as f64;

    let mut svg = svg_open(&format!("Top {} values in {}", counts.len(), column));
    for (i, (label, count)) in counts.iter().enumerate() {
        let bar_h = (*count as f64 / peak) * plot_h;
        let x = MARGIN + i as f64 * bar_w;
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="lightgreen" stroke="seagreen"/>"#,
            x,
            HEIGHT - MARGIN - bar_h,
            bar_w - 2.0,
            bar_h,
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="10">{}</text>"#,
            x + bar_w / 2.0,
            HEIGHT - MARGIN + 14.0,
            xml_escape(label),
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn render_line(column: &str, values: &[f64]) -> String {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = span_of(min, max);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let step = if values.len() > 1 {
        plot_w / (values.len() - 1) as f64
    } else {
        plot_w
    };

    let points: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                "{:.1},{:.1}",
                MARGIN + i as f64 * step,
                HEIGHT - MARGIN - ((v - min) / span) * plot_h
            )
        })
        .collect();

    let mut svg = svg_open(&format!("Trend of {}", column));
    svg.push_str(&format!(
        r#"<polyline points="{}" fill="none" stroke="steelblue" stroke-width="2"/>"#,
        points.join(" ")
    ));
    svg.push_str("</svg>");
    svg
}
