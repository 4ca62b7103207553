use crate::openedge::{OpenEdge, OpenEdgeColumn, OpenEdgeValue, OpenEdgeValueRef};
use sqlx_core::column::ColumnIndex;
use sqlx_core::row::Row;
use sqlx_core::Error;
use std::sync::Arc;

/// A row of coerced values.
#[derive(Debug, Clone)]
pub struct OpenEdgeRow {
    pub(crate) columns: Arc<Vec<OpenEdgeColumn>>,
    pub(crate) values: Vec<OpenEdgeValue>,
}

impl OpenEdgeRow {
    /// Create a row from its columns and one value per column
    pub fn new(columns: Arc<Vec<OpenEdgeColumn>>, values: Vec<OpenEdgeValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Get the number of columns in this row
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a coerced value by index
    pub fn get_value(&self, index: usize) -> Option<&OpenEdgeValue> {
        self.values.get(index)
    }

    /// Get a column by index
    pub fn get_column(&self, index: usize) -> Option<&OpenEdgeColumn> {
        self.columns.get(index)
    }
}

impl Row for OpenEdgeRow {
    type Database = OpenEdge;

    fn columns(&self) -> &[OpenEdgeColumn] {
        &self.columns
    }

    fn try_get_raw<I>(&self, index: I) -> Result<OpenEdgeValueRef<'_>, Error>
    where
        I: ColumnIndex<Self>,
    {
        let index = index.index(self)?;
        let value = &self.values[index];
        Ok(OpenEdgeValueRef::new(&value.data, value.type_info.clone()))
    }
}
