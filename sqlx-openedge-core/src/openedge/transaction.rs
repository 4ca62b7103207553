//! Transactions: autocommit is switched off for the outermost level and
//! nested levels use savepoints `sp1`, `sp2`, ...

use crate::openedge::driver::BoxFuture;
use crate::openedge::{OpenEdge, OpenEdgeConnection, OpenEdgeError};
use sqlx_core::error::Error;
use sqlx_core::transaction::TransactionManager;
use std::borrow::Cow;

pub struct OpenEdgeTransactionManager;

impl TransactionManager for OpenEdgeTransactionManager {
    type Database = OpenEdge;

    fn begin<'c>(
        conn: &'c mut OpenEdgeConnection,
        statement: Option<Cow<'static, str>>,
    ) -> BoxFuture<'c, Result<(), Error>> {
        Box::pin(async move {
            conn.resolve_pending_rollback().await?;

            let depth = conn.transaction_depth;
            match (depth, statement) {
                (0, Some(statement)) => {
                    conn.native.set_autocommit(false).await.map_err(OpenEdgeError::Query)?;
                    conn.run(&statement, &[]).await?;
                }
                (0, None) => {
                    conn.native.set_autocommit(false).await.map_err(OpenEdgeError::Query)?;
                }
                (_, Some(_)) => return Err(Error::InvalidSavePointStatement),
                (_, None) => {
                    conn.run(&format!("SAVEPOINT sp{depth}"), &[]).await?;
                }
            }

            conn.transaction_depth += 1;
            Ok(())
        })
    }

    fn commit(conn: &mut OpenEdgeConnection) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            conn.resolve_pending_rollback().await?;

            match conn.transaction_depth {
                0 => {}
                1 => {
                    conn.native.commit().await.map_err(OpenEdgeError::Query)?;
                    conn.native.set_autocommit(true).await.map_err(OpenEdgeError::Query)?;
                    conn.transaction_depth = 0;
                }
                depth => {
                    conn.run(&format!("RELEASE SAVEPOINT sp{}", depth - 1), &[]).await?;
                    conn.transaction_depth -= 1;
                }
            }
            Ok(())
        })
    }

    fn rollback(conn: &mut OpenEdgeConnection) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            conn.resolve_pending_rollback().await?;

            if conn.transaction_depth > 0 {
                conn.pending_rollback = Some(conn.transaction_depth - 1);
                conn.transaction_depth -= 1;
                conn.resolve_pending_rollback().await?;
            }
            Ok(())
        })
    }

    /// Queue a rollback to run before the next statement on this connection.
    fn start_rollback(conn: &mut OpenEdgeConnection) {
        if conn.transaction_depth > 0 {
            let target = conn.transaction_depth - 1;
            conn.pending_rollback = Some(conn.pending_rollback.map_or(target, |queued| queued.min(target)));
            conn.transaction_depth = target;
        }
    }

    fn get_transaction_depth(conn: &OpenEdgeConnection) -> usize {
        conn.transaction_depth
    }
}
