//! The boundary to the native driver that performs the actual I/O.
//!
//! [`odbc::OdbcDriver`] implements it over the system ODBC driver manager;
//! tests plug in scripted drivers.

pub mod odbc;

use crate::openedge::types::TypeParser;
use crate::openedge::{DriverError, Oid, OpenEdgeTypeInfo, OpenEdgeValueData};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Events a native connection reports after it is open.
#[derive(Debug)]
pub enum DriverEvent {
    /// The handle was closed.
    End,
    /// The connection failed underneath an operation.
    Error(DriverError),
}

/// Callback attached to a native connection; must not block.
pub type EventListener = Arc<dyn Fn(&DriverEvent) + Send + Sync>;

/// Column metadata reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeColumn {
    pub name: String,
    pub oid: Oid,
    pub type_name: String,
    pub nullable: Option<bool>,
}

impl NativeColumn {
    pub fn new(name: impl Into<String>, oid: Oid, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oid,
            type_name: type_name.into(),
            nullable: None,
        }
    }
}

/// One result of a statement, with every value still in wire text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Leading keyword of the statement that produced this result (`SELECT`, `SET`, ...).
    pub command: Option<String>,
    pub columns: Vec<NativeColumn>,
    pub rows: Vec<Vec<Option<String>>>,
    pub rows_affected: u64,
}

/// Column and parameter metadata of a prepared statement.
#[derive(Debug, Clone, Default)]
pub struct StatementDescription {
    pub columns: Vec<NativeColumn>,
    pub parameters: Vec<OpenEdgeTypeInfo>,
}

/// Opens native connections.
pub trait NativeDriver: Send + Sync + 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Open a connection. Completes once the driver reports success or failure.
    fn open<'a>(
        &'a self,
        connection_string: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn NativeConnection>, DriverError>>;

    /// Parser used for codes with no binding in the parser registry.
    fn default_type_parser(&self, oid: Oid) -> TypeParser {
        let _ = oid;
        Arc::new(|raw: &str, _: &crate::openedge::types::TypeContext| {
            OpenEdgeValueData::Text(raw.to_owned())
        })
    }
}

/// An open native connection handle.
pub trait NativeConnection: Send {
    /// Subscribe to `End` and `Error` events.
    fn on_event(&mut self, listener: EventListener);

    /// Run `sql` with positional text parameters (`None` is SQL `NULL`).
    fn query<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [Option<String>],
    ) -> BoxFuture<'a, Result<Vec<ResultSet>, DriverError>>;

    fn describe<'a>(&'a mut self, sql: &'a str) -> BoxFuture<'a, Result<StatementDescription, DriverError>>;

    fn set_autocommit(&mut self, enabled: bool) -> BoxFuture<'_, Result<(), DriverError>>;

    fn commit(&mut self) -> BoxFuture<'_, Result<(), DriverError>>;

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), DriverError>>;

    /// Release the handle immediately. Calling it again does nothing.
    fn close_sync(&mut self);
}

/// Leading keyword of a statement, upper-cased.
pub(crate) fn command_of(sql: &str) -> Option<String> {
    sql.split_whitespace()
        .next()
        .map(|word| word.trim_end_matches(';').to_ascii_uppercase())
        .filter(|word| !word.is_empty())
}
