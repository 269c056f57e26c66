//! Grouped bar chart construction.
//!
//! Turns a combined comparison table into a chart description: one group of
//! bars per category label, colored by the label, bucketed on the grouping
//! key. Labels and keys keep the row order of the combined table.

use common::errors::{AppError, AppResult};
use common::models::chart::{ChartAxis, ChartBar, ChartGroup, ChartLegend, GroupedBarChart};
use common::models::table::QueryTable;
use serde_json::Value;

use crate::pipeline::{ComparisonSpec, LABEL_COLUMN, VALUE_COLUMN};

/// Builds the grouped bar chart for a combined comparison table.
///
/// An empty table produces a chart with axes and legend but no groups; the
/// frontend renders it as an empty plot rather than an error.
pub fn grouped_bar(table: &QueryTable, spec: &ComparisonSpec) -> AppResult<GroupedBarChart> {
    let mut groups: Vec<ChartGroup> = Vec::new();

    if !table.is_empty() {
        let key_idx = column(table, spec.group_key)?;
        let value_idx = column(table, VALUE_COLUMN)?;
        let label_idx = column(table, LABEL_COLUMN)?;

        for row in &table.rows {
            let label = display_value(&row[label_idx]);
            let bar = ChartBar {
                key: display_value(&row[key_idx]),
                value: count_value(&row[value_idx])?,
            };
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.bars.push(bar),
                None => groups.push(ChartGroup {
                    label,
                    bars: vec![bar],
                }),
            }
        }
    }

    Ok(GroupedBarChart {
        x: ChartAxis::new(spec.group_key, spec.group_title),
        y: ChartAxis::new(VALUE_COLUMN, spec.value_title),
        legend: ChartLegend {
            field: LABEL_COLUMN.to_string(),
            title: spec.legend_title.to_string(),
        },
        groups,
    })
}

fn column(table: &QueryTable, name: &str) -> AppResult<usize> {
    table.column_index(name).ok_or_else(|| {
        AppError::Validation(format!("combined table is missing column '{}'", name))
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn count_value(value: &Value) -> AppResult<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .ok_or_else(|| {
            AppError::Validation(format!("count column holds a non-numeric value: {}", value))
        })
}
