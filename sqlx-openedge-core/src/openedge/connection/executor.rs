//! Executor implementation for OpenEdge connections.
//!
//! Every fetched value is routed through the parser bound to its column's
//! native type code.

use crate::openedge::driver::{BoxFuture, NativeColumn, ResultSet, StatementDescription};
use crate::openedge::statement::OpenEdgeStatementMetadata;
use crate::openedge::{
    OpenEdge, OpenEdgeColumn, OpenEdgeConnection, OpenEdgeError, OpenEdgeQueryResult, OpenEdgeRow,
    OpenEdgeStatement, OpenEdgeTypeInfo, OpenEdgeValue, OpenEdgeValueData,
};
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use sqlx_core::describe::Describe;
use sqlx_core::error::Error;
use sqlx_core::executor::{Execute, Executor};
use sqlx_core::Either;
use std::sync::Arc;

impl OpenEdgeConnection {
    /// Coerce the raw text of a result set into rows.
    pub(crate) fn decode_rows(&self, result: &ResultSet) -> Vec<OpenEdgeRow> {
        let columns = Arc::new(columns_of(&result.columns));
        let parsers: Vec<_> = result
            .columns
            .iter()
            .map(|col| self.manager.get_type_parser(col.oid))
            .collect();

        result
            .rows
            .iter()
            .map(|raw_row| {
                let values = columns
                    .iter()
                    .zip(&parsers)
                    .enumerate()
                    .map(|(i, (column, parser))| {
                        let data = match raw_row.get(i).and_then(Option::as_deref) {
                            Some(raw) => parser(raw, &self.context),
                            None => OpenEdgeValueData::Null,
                        };
                        OpenEdgeValue::new(data, column.type_info.clone())
                    })
                    .collect();
                OpenEdgeRow::new(Arc::clone(&columns), values)
            })
            .collect()
    }
}

impl<'c> Executor<'c> for &'c mut OpenEdgeConnection {
    type Database = OpenEdge;

    fn fetch_many<'e, 'q: 'e, E>(
        self,
        mut query: E,
    ) -> BoxStream<'e, Result<Either<OpenEdgeQueryResult, OpenEdgeRow>, Error>>
    where
        'c: 'e,
        E: 'q + Execute<'q, Self::Database>,
    {
        let sql = query.sql();
        let arguments = query.take_arguments();

        Box::pin(async_stream::try_stream! {
            let params = match arguments.map_err(Error::Encode)? {
                Some(arguments) => arguments.to_params(&self.context).map_err(Error::from)?,
                None => Vec::new(),
            };

            let results = self.run(sql, &params).await.map_err(Error::from)?;
            for result in &results {
                for row in self.decode_rows(result) {
                    yield Either::Right(row);
                }
                yield Either::Left(OpenEdgeQueryResult {
                    rows_affected: result.rows_affected,
                    command: result.command.clone(),
                });
            }
        })
    }

    fn fetch_optional<'e, 'q: 'e, E>(self, query: E) -> BoxFuture<'e, Result<Option<OpenEdgeRow>, Error>>
    where
        'c: 'e,
        E: 'q + Execute<'q, Self::Database>,
    {
        Box::pin(async move {
            let mut stream = self.fetch_many(query);
            while let Some(result) = stream.next().await {
                if let Either::Right(row) = result? {
                    return Ok(Some(row));
                }
            }
            Ok(None)
        })
    }

    fn prepare_with<'e, 'q: 'e>(
        self,
        sql: &'q str,
        _parameters: &'e [OpenEdgeTypeInfo],
    ) -> BoxFuture<'e, Result<OpenEdgeStatement<'q>, Error>>
    where
        'c: 'e,
    {
        Box::pin(async move {
            let description = describe_statement(self, sql).await?;
            Ok(OpenEdgeStatement::new(
                sql,
                OpenEdgeStatementMetadata::new(columns_of(&description.columns), description.parameters),
            ))
        })
    }

    fn describe<'e, 'q: 'e>(self, sql: &'q str) -> BoxFuture<'e, Result<Describe<Self::Database>, Error>>
    where
        'c: 'e,
    {
        Box::pin(async move {
            let description = describe_statement(self, sql).await?;
            Ok(Describe {
                columns: columns_of(&description.columns),
                parameters: Some(Either::Left(description.parameters)),
                nullable: description.columns.iter().map(|c| c.nullable).collect(),
            })
        })
    }
}

async fn describe_statement(
    conn: &mut OpenEdgeConnection,
    sql: &str,
) -> Result<StatementDescription, OpenEdgeError> {
    conn.resolve_pending_rollback().await?;
    conn.native.describe(sql).await.map_err(OpenEdgeError::Query)
}

fn columns_of(native: &[NativeColumn]) -> Vec<OpenEdgeColumn> {
    native
        .iter()
        .enumerate()
        .map(|(i, col)| OpenEdgeColumn::from_native(i, col))
        .collect()
}
