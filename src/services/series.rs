//! Series builder: turns aggregated expense rows into chart-ready
//! descriptors.
//!
//! Every function here is pure. The same rows always produce the same
//! descriptor: label order, series order and color assignment are all
//! derived from first occurrence in the input, nothing else.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::date_utils::short_month_name;
use crate::models::expense::format_cents;
use crate::models::{CategoryTotal, PeriodSummary};

/// Fixed 8-color palette. The Nth distinct category (0-indexed) gets
/// `PALETTE[N % 8]`; wraparound is intentional.
pub const PALETTE: [&str; 8] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#8BC34A", "#E91E63",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// One value per axis label, in currency units.
    pub values: Vec<f64>,
    pub color: String,
}

/// Fully-resolved description of one chart: axis labels plus one or more
/// named numeric series. Lives only for the duration of a render call.
///
/// For pie charts the single series holds one value per label and slices
/// are colored `palette_color(label_index)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDescriptor {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub stacked: bool,
}

fn units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Distinct category labels in order of first occurrence. Not sorted.
fn distinct_categories(rows: &[CategoryTotal]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for row in rows {
        if !categories.iter().any(|c| c == &row.category) {
            categories.push(row.category.clone());
        }
    }
    categories
}

/// Single-period snapshot: one synthetic axis bucket labelled with the
/// period, one stacked-bar series per category.
///
/// Returns `None` for empty input; the caller leaves any previous chart
/// untouched.
pub fn snapshot_series(rows: &[CategoryTotal], period_label: &str) -> Option<SeriesDescriptor> {
    if rows.is_empty() {
        return None;
    }

    let series = distinct_categories(rows)
        .into_iter()
        .enumerate()
        .map(|(idx, category)| {
            let total: i64 = rows
                .iter()
                .filter(|r| r.category == category)
                .map(|r| r.total_cents)
                .sum();
            Series {
                name: category,
                values: vec![units(total)],
                color: palette_color(idx).to_string(),
            }
        })
        .collect();

    Some(SeriesDescriptor {
        chart_type: ChartType::Bar,
        labels: vec![period_label.to_string()],
        series,
        stacked: true,
    })
}

/// Year-to-date time axis: one label per month from January through
/// `today`'s month inclusive, zero-filled for months without data.
///
/// With `annotate_totals` each label is suffixed with that month's
/// aggregate amount, e.g. "Mar (420.00)".
pub fn monthly_series(
    rows: &[CategoryTotal],
    today: NaiveDate,
    annotate_totals: bool,
) -> Option<SeriesDescriptor> {
    if rows.is_empty() {
        return None;
    }

    let months: Vec<u32> = (1..=today.month()).collect();

    let labels = months
        .iter()
        .map(|&m| {
            let name = short_month_name(m);
            if annotate_totals {
                let total: i64 = rows
                    .iter()
                    .filter(|r| r.month_year.map(|d| d.month()) == Some(m))
                    .map(|r| r.total_cents)
                    .sum();
                format!("{} ({})", name, format_cents(total))
            } else {
                name.to_string()
            }
        })
        .collect();

    let series = distinct_categories(rows)
        .into_iter()
        .enumerate()
        .map(|(idx, category)| {
            let values = months
                .iter()
                .map(|&m| {
                    let total: i64 = rows
                        .iter()
                        .filter(|r| {
                            r.category == category
                                && r.month_year.map(|d| d.month()) == Some(m)
                        })
                        .map(|r| r.total_cents)
                        .sum();
                    units(total)
                })
                .collect();
            Series {
                name: category,
                values,
                color: palette_color(idx).to_string(),
            }
        })
        .collect();

    Some(SeriesDescriptor {
        chart_type: ChartType::Bar,
        labels,
        series,
        stacked: true,
    })
}

/// Pie of category totals for one period. One slice per category, colored
/// by first-occurrence index.
pub fn category_pie(rows: &[CategoryTotal]) -> Option<SeriesDescriptor> {
    if rows.is_empty() {
        return None;
    }

    let labels = distinct_categories(rows);
    let values = labels
        .iter()
        .map(|category| {
            let total: i64 = rows
                .iter()
                .filter(|r| &r.category == category)
                .map(|r| r.total_cents)
                .sum();
            units(total)
        })
        .collect();

    Some(SeriesDescriptor {
        chart_type: ChartType::Pie,
        labels,
        series: vec![Series {
            name: "Expenses".to_string(),
            values,
            color: palette_color(0).to_string(),
        }],
        stacked: false,
    })
}

/// Remaining budget per month for one year, January through `today`'s
/// month, zero-filled for months without a budget period.
pub fn savings_series(periods: &[PeriodSummary], today: NaiveDate) -> Option<SeriesDescriptor> {
    if periods.is_empty() {
        return None;
    }

    let months: Vec<u32> = (1..=today.month()).collect();
    let labels = months.iter().map(|&m| short_month_name(m).to_string()).collect();

    let values = months
        .iter()
        .map(|&m| {
            let total: i64 = periods
                .iter()
                .filter(|p| p.month_year.month() == m)
                .map(|p| p.remaining_cents)
                .sum();
            units(total)
        })
        .collect();

    Some(SeriesDescriptor {
        chart_type: ChartType::Bar,
        labels,
        series: vec![Series {
            name: "Remaining Budget".to_string(),
            values,
            color: palette_color(3).to_string(),
        }],
        stacked: false,
    })
}
