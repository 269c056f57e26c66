//! Chart description models.
//!
//! The service does not rasterize charts; it ships a complete description of
//! a grouped bar chart (axes, legend, partitioned data) for the frontend
//! charting component to render.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A grouped bar chart: bars bucketed by a grouping key, partitioned and
/// colored by a category label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupedBarChart {
    /// X axis (the grouping key).
    pub x: ChartAxis,
    /// Y axis (the count).
    pub y: ChartAxis,
    /// Legend describing the category partition.
    pub legend: ChartLegend,
    /// One group per category label, in first-appearance order.
    pub groups: Vec<ChartGroup>,
}

/// Axis binding: which result column it reads and its display title.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartAxis {
    /// Result column the axis reads.
    pub field: String,
    /// Axis title shown to the user.
    pub title: String,
}

impl ChartAxis {
    /// Creates an axis binding.
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
        }
    }
}

/// Legend binding for the category partition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartLegend {
    /// Result column holding the category label.
    pub field: String,
    /// Legend title shown to the user.
    pub title: String,
}

/// All bars belonging to one category label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartGroup {
    /// Category label (e.g. "Wet").
    pub label: String,
    /// Bars in row order.
    pub bars: Vec<ChartBar>,
}

/// A single bar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartBar {
    /// Grouping-key value this bar belongs to.
    pub key: String,
    /// Bar height (collision count).
    pub value: i64,
}
