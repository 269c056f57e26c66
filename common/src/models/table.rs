//! Tabular query results and the reshape operations the analysis
//! pipeline applies to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Column information in a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type, as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Materialized result of a query: ordered columns plus row data.
///
/// Rows are kept in the order the database returned them; every reshape
/// operation preserves that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueryTable {
    /// Column information, in result order.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values, one per column).
    pub rows: Vec<Vec<Value>>,

    /// Number of rows returned.
    pub row_count: usize,
}

impl QueryTable {
    /// Creates an empty table with no columns.
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
        }
    }

    /// Creates a table from columns and rows.
    pub fn from_parts(columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// True when the table carries neither columns nor rows.
    ///
    /// A query that matched zero rows on a driver that reports no metadata
    /// produces this shape; the reshape operations let it flow through.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Index of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value at (row, column name), if present.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Renames a column in place.
    ///
    /// A fully-empty table is returned unchanged; otherwise the source
    /// column must exist.
    pub fn rename_column(mut self, from: &str, to: &str) -> AppResult<Self> {
        if self.is_empty() {
            return Ok(self);
        }
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx].name = to.to_string();
                Ok(self)
            }
            None => Err(AppError::Validation(format!(
                "column '{}' not found in result",
                from
            ))),
        }
    }

    /// Appends a column holding the same literal string in every row.
    ///
    /// Used to tag each comparison side with its category label. A
    /// fully-empty table is returned unchanged.
    pub fn with_label_column(mut self, name: &str, label: &str) -> Self {
        if self.is_empty() {
            return self;
        }
        self.columns.push(ColumnInfo::new(name, "text"));
        for row in &mut self.rows {
            row.push(Value::String(label.to_string()));
        }
        self
    }

    /// Concatenates another table row-wise after this one's rows.
    ///
    /// A fully-empty side contributes nothing; when both sides carry
    /// columns, the column name sequences must match exactly.
    pub fn concat(mut self, other: QueryTable) -> AppResult<Self> {
        if self.is_empty() {
            return Ok(other);
        }
        if other.is_empty() {
            return Ok(self);
        }

        let left: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let right: Vec<&str> = other.columns.iter().map(|c| c.name.as_str()).collect();
        if left != right {
            return Err(AppError::Validation(format!(
                "cannot concatenate tables with different columns: {:?} vs {:?}",
                left, right
            )));
        }

        self.rows.extend(other.rows);
        self.row_count = self.rows.len();
        Ok(self)
    }
}
