//! Comparison pipeline.
//!
//! Each analysis tab compares two collision tables that share a grouping
//! key: both sides are queried, tagged with their category label, renamed to
//! a common count column and concatenated, and the combined table is turned
//! into a grouped bar chart.

use common::errors::{AppError, AppResult};
use common::models::chart::GroupedBarChart;
use common::models::table::QueryTable;
use common::utils::sql;

use crate::chart;
use crate::connection::ConnectionHandle;
use crate::executor::QueryExecutor;

/// Column holding the category label after tagging.
pub const LABEL_COLUMN: &str = "type";

/// Common count column both sides are renamed to before concatenation.
pub const VALUE_COLUMN: &str = "Collisions";

/// One side of a comparison: a collision table and its category label.
#[derive(Debug)]
pub struct ComparisonSide {
    /// Category label shown in the legend (e.g. "Wet").
    pub label: &'static str,
    /// Source table name.
    pub table: &'static str,
    /// Count column name this side's query produces.
    pub count_column: &'static str,
}

impl ComparisonSide {
    /// Assembles this side's aggregate query.
    pub fn query(&self, group_key: &str) -> AppResult<String> {
        sql::build_group_count_query(group_key, self.count_column, self.table)
    }
}

/// Full description of one analysis tab.
#[derive(Debug)]
pub struct ComparisonSpec {
    /// Tab identifier used in the URL.
    pub id: &'static str,
    /// Tab title.
    pub title: &'static str,
    /// One-line description for the tab listing.
    pub description: &'static str,
    /// Grouping-key column shared by both sides.
    pub group_key: &'static str,
    /// X axis title.
    pub group_title: &'static str,
    /// Y axis title.
    pub value_title: &'static str,
    /// Legend title.
    pub legend_title: &'static str,
    /// First side; its rows come first in the combined table.
    pub left: ComparisonSide,
    /// Second side.
    pub right: ComparisonSide,
}

/// The fixed analysis tab catalog.
pub static TABS: [ComparisonSpec; 2] = [
    ComparisonSpec {
        id: "wet-vs-dry",
        title: "Wet vs Dry Road Collisions",
        description: "Collision counts on wet and dry road surfaces, grouped by road surface code.",
        group_key: "rdsurf",
        group_title: "Road Surface Code",
        value_title: "Number of Collisions",
        legend_title: "Surface Type",
        left: ComparisonSide {
            label: "Wet",
            table: "WetRoad",
            count_column: "count_wet",
        },
        right: ComparisonSide {
            label: "Dry",
            table: "DryRoad",
            count_column: "count_dry",
        },
    },
    ComparisonSpec {
        id: "younger-vs-older",
        title: "Younger vs Older Drivers",
        description: "Collision counts for younger and older drivers, grouped by crash rate category.",
        group_key: "CrashRate",
        group_title: "Crash Rate Category",
        value_title: "Number of Collisions",
        legend_title: "Driver Age Group",
        left: ComparisonSide {
            label: "Younger",
            table: "AndYounger",
            count_column: "collisions_y",
        },
        right: ComparisonSide {
            label: "Older",
            table: "AndOlder",
            count_column: "collisions_o",
        },
    },
];

/// Looks up a tab by id.
pub fn find_tab(id: &str) -> AppResult<&'static ComparisonSpec> {
    TABS.iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| AppError::TabNotFound(id.to_string()))
}

/// Runs both sides of a comparison and builds the grouped bar chart.
///
/// Returns the combined table alongside the chart so the frontend can also
/// show the raw numbers.
pub async fn run_comparison(
    executor: &QueryExecutor,
    handle: &ConnectionHandle,
    spec: &ComparisonSpec,
) -> AppResult<(QueryTable, GroupedBarChart)> {
    let left = load_side(executor, handle, spec, &spec.left).await?;
    let right = load_side(executor, handle, spec, &spec.right).await?;

    let combined = left.concat(right)?;
    let chart = chart::grouped_bar(&combined, spec)?;
    Ok((combined, chart))
}

async fn load_side(
    executor: &QueryExecutor,
    handle: &ConnectionHandle,
    spec: &ComparisonSpec,
    side: &ComparisonSide,
) -> AppResult<QueryTable> {
    let statement = side.query(spec.group_key)?;
    let table = executor.run(handle, &statement).await?;
    table
        .with_label_column(LABEL_COLUMN, side.label)
        .rename_column(side.count_column, VALUE_COLUMN)
}
