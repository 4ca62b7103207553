use crate::openedge::driver::NativeColumn;
use crate::openedge::{OpenEdge, OpenEdgeRow, OpenEdgeTypeInfo};
use sqlx_core::column::{Column, ColumnIndex};
use sqlx_core::ext::ustr::UStr;
use sqlx_core::Error;

/// A column of an OpenEdge result set.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "offline", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenEdgeColumn {
    pub(crate) ordinal: usize,
    pub(crate) name: UStr,
    pub(crate) type_info: OpenEdgeTypeInfo,
}

impl OpenEdgeColumn {
    /// Create a column at `ordinal`
    pub fn new(ordinal: usize, name: impl Into<UStr>, type_info: OpenEdgeTypeInfo) -> Self {
        Self {
            ordinal,
            name: name.into(),
            type_info,
        }
    }

    pub(crate) fn from_native(ordinal: usize, native: &NativeColumn) -> Self {
        Self::new(
            ordinal,
            native.name.clone(),
            OpenEdgeTypeInfo::new(native.oid, native.type_name.clone()),
        )
    }
}

impl Column for OpenEdgeColumn {
    type Database = OpenEdge;

    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_info(&self) -> &OpenEdgeTypeInfo {
        &self.type_info
    }
}

impl ColumnIndex<OpenEdgeRow> for usize {
    fn index(&self, row: &OpenEdgeRow) -> Result<usize, Error> {
        if *self < row.columns.len() {
            Ok(*self)
        } else {
            Err(Error::ColumnIndexOutOfBounds {
                index: *self,
                len: row.columns.len(),
            })
        }
    }
}

// Engines fold unquoted identifiers, so names match case-insensitively
// when there is no exact match.
impl ColumnIndex<OpenEdgeRow> for &str {
    fn index(&self, row: &OpenEdgeRow) -> Result<usize, Error> {
        row.columns
            .iter()
            .position(|col| &*col.name == *self)
            .or_else(|| row.columns.iter().position(|col| col.name.eq_ignore_ascii_case(self)))
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
    }
}
