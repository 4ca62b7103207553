//! OpenEdge connection implementation.

use crate::openedge::driver::{DriverEvent, EventListener, NativeConnection, ResultSet};
use crate::openedge::types::TypeContext;
use crate::openedge::{OpenEdge, OpenEdgeConnectOptions, OpenEdgeError};
use sqlx_core::connection::Connection;
use sqlx_core::error::Error;
use sqlx_core::transaction::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

mod executor;
mod manager;
mod refresh;

pub use manager::ConnectionManager;
pub use refresh::DYNAMIC_TYPES_QUERY;

use crate::openedge::driver::BoxFuture;

/// Lifecycle of an established connection.
///
/// Connecting and failed attempts never produce a connection value, so only
/// the states after a successful connect are observable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Valid,
    /// The driver reported an error; the pool should discard the connection.
    Invalidated,
    Closed,
}

/// Flags shared between a connection and its driver event listener.
#[derive(Debug, Default)]
pub(crate) struct ConnectionState {
    invalid: AtomicBool,
    closed: AtomicBool,
}

impl ConnectionState {
    pub(crate) fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::Acquire)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns `true` the first time the connection is marked closed.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Listener that latches `invalid` on the first driver error.
    pub(crate) fn listener(self: &Arc<Self>) -> EventListener {
        let state = Arc::clone(self);
        Arc::new(move |event: &DriverEvent| match event {
            DriverEvent::Error(error) => {
                if !state.invalid.swap(true, Ordering::AcqRel) {
                    log::warn!("connection invalidated by driver error: {error}");
                }
            }
            DriverEvent::End => {
                state.closed.store(true, Ordering::Release);
                log::debug!("connection ended");
            }
        })
    }
}

/// A connection to an OpenEdge (or Postgres-like) engine.
pub struct OpenEdgeConnection {
    pub(crate) native: Box<dyn NativeConnection>,
    pub(crate) state: Arc<ConnectionState>,
    pub(crate) manager: Arc<ConnectionManager>,
    pub(crate) options: OpenEdgeConnectOptions,
    pub(crate) context: TypeContext,
    pub(crate) transaction_depth: usize,
    /// Depth a dropped transaction must be rolled back to before the next statement.
    pub(crate) pending_rollback: Option<usize>,
}

impl std::fmt::Debug for OpenEdgeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenEdgeConnection")
            .field("dialect", &self.manager.dialect())
            .field("status", &self.status())
            .field("transaction_depth", &self.transaction_depth)
            .field("pending_rollback", &self.pending_rollback)
            .finish()
    }
}

impl OpenEdgeConnection {
    /// Connect using the manager attached to `options`, or a fresh ODBC one.
    pub async fn establish(options: &OpenEdgeConnectOptions) -> Result<Self, OpenEdgeError> {
        let manager = options.resolve_manager()?;
        manager.connect(options).await
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.state.is_closed() {
            ConnectionStatus::Closed
        } else if self.state.is_invalid() {
            ConnectionStatus::Invalidated
        } else {
            ConnectionStatus::Valid
        }
    }

    /// Whether no driver error has been observed and the handle is open.
    pub fn is_valid(&self) -> bool {
        self.manager.validate(self)
    }

    pub fn options(&self) -> &OpenEdgeConnectOptions {
        &self.options
    }

    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Parse context (dialect and default timezone) used for fetched values.
    pub fn type_context(&self) -> &TypeContext {
        &self.context
    }

    /// Run a statement without parameters and return every result set raw.
    pub async fn execute_raw(&mut self, sql: &str) -> Result<Vec<ResultSet>, OpenEdgeError> {
        self.run(sql, &[]).await
    }

    /// Re-query the engine's type catalog and rebuild the parser bindings.
    pub async fn refresh_type_parser(&mut self) -> Result<(), OpenEdgeError> {
        let manager = Arc::clone(&self.manager);
        manager.refresh_type_parser(self).await
    }

    pub(crate) async fn run(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> Result<Vec<ResultSet>, OpenEdgeError> {
        self.resolve_pending_rollback().await?;

        let start = Instant::now();
        let results = self.native.query(sql, params).await.map_err(OpenEdgeError::Query)?;

        let rows: u64 = results.iter().map(|r| r.rows_affected).sum();
        self.log_statement(sql, start, rows);
        Ok(results)
    }

    pub(crate) async fn resolve_pending_rollback(&mut self) -> Result<(), OpenEdgeError> {
        let Some(depth) = self.pending_rollback.take() else {
            return Ok(());
        };

        if depth == 0 {
            self.native.rollback().await.map_err(OpenEdgeError::Query)?;
            self.native.set_autocommit(true).await.map_err(OpenEdgeError::Query)?;
        } else {
            let sql = format!("ROLLBACK TO SAVEPOINT sp{depth}");
            self.native.query(&sql, &[]).await.map_err(OpenEdgeError::Query)?;
        }
        Ok(())
    }

    fn log_statement(&self, sql: &str, start: Instant, rows: u64) {
        let elapsed = start.elapsed();
        let (slow_level, slow_after) = self.options.log_slow_statements;
        let level = if elapsed >= slow_after {
            slow_level
        } else {
            self.options.log_statements
        };

        if let Some(level) = level.to_level() {
            let summary: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
            log::log!(
                target: "sqlx::query",
                level,
                "{summary}; rows affected: {rows}, elapsed: {elapsed:.3?}"
            );
        }
    }
}

impl Connection for OpenEdgeConnection {
    type Database = OpenEdge;
    type Options = OpenEdgeConnectOptions;

    fn close(mut self) -> BoxFuture<'static, Result<(), Error>> {
        Box::pin(async move {
            let manager = Arc::clone(&self.manager);
            manager.disconnect(&mut self);
            Ok(())
        })
    }

    fn close_hard(self) -> BoxFuture<'static, Result<(), Error>> {
        self.close()
    }

    /// Validity check without I/O: fails once the driver has reported an error.
    fn ping(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            if self.is_valid() {
                Ok(())
            } else {
                Err(Error::Protocol("connection has been invalidated".into()))
            }
        })
    }

    fn begin(&mut self) -> BoxFuture<'_, Result<Transaction<'_, Self::Database>, Error>>
    where
        Self: Sized,
    {
        Transaction::begin(self, None)
    }

    fn shrink_buffers(&mut self) {}

    fn flush(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async { Ok(()) })
    }

    fn should_flush(&self) -> bool {
        false
    }
}

impl Drop for OpenEdgeConnection {
    fn drop(&mut self) {
        if self.state.mark_closed() {
            self.native.close_sync();
        }
    }
}
