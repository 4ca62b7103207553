use crate::openedge::{OpenEdge, OpenEdgeColumn, OpenEdgeTypeInfo};
use sqlx_core::ext::ustr::UStr;
use sqlx_core::statement::Statement;
use sqlx_core::Either;
use sqlx_core::Error;
use sqlx_core::HashMap;
use std::borrow::Cow;
use std::sync::Arc;

/// Columns and parameters of a described statement.
#[derive(Debug, Default, Clone)]
pub struct OpenEdgeStatementMetadata {
    pub(crate) columns: Vec<OpenEdgeColumn>,
    pub(crate) column_names: Arc<HashMap<UStr, usize>>,
    pub(crate) parameters: Vec<OpenEdgeTypeInfo>,
}

impl OpenEdgeStatementMetadata {
    /// Create statement metadata, indexing the columns by name
    pub fn new(columns: Vec<OpenEdgeColumn>, parameters: Vec<OpenEdgeTypeInfo>) -> Self {
        let column_names = columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name.clone(), i))
            .collect();

        Self {
            columns,
            column_names: Arc::new(column_names),
            parameters,
        }
    }
}

/// A described statement and its SQL.
#[derive(Debug, Clone)]
pub struct OpenEdgeStatement<'q> {
    pub(crate) sql: Cow<'q, str>,
    pub(crate) metadata: Arc<OpenEdgeStatementMetadata>,
}

impl<'q> OpenEdgeStatement<'q> {
    /// Create a statement with the given SQL and metadata
    pub fn new(sql: impl Into<Cow<'q, str>>, metadata: OpenEdgeStatementMetadata) -> Self {
        Self {
            sql: sql.into(),
            metadata: Arc::new(metadata),
        }
    }
}

impl<'q> Statement<'q> for OpenEdgeStatement<'q> {
    type Database = OpenEdge;

    fn to_owned(&self) -> OpenEdgeStatement<'static> {
        OpenEdgeStatement {
            sql: Cow::Owned(self.sql.clone().into_owned()),
            metadata: Arc::clone(&self.metadata),
        }
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameters(&self) -> Option<Either<&[OpenEdgeTypeInfo], usize>> {
        Some(Either::Left(&self.metadata.parameters))
    }

    fn columns(&self) -> &[OpenEdgeColumn] {
        &self.metadata.columns
    }

    sqlx_core::impl_statement_query!(crate::openedge::OpenEdgeArguments<'_>);
}

impl sqlx_core::column::ColumnIndex<OpenEdgeStatement<'_>> for &str {
    fn index(&self, statement: &OpenEdgeStatement<'_>) -> Result<usize, Error> {
        statement
            .metadata
            .column_names
            .get(*self)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
    }
}
