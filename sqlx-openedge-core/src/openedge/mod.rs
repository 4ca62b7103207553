//! OpenEdge dialect for SQLx, over ODBC.
//!
//! Also serves a Postgres-like engine reached through the same bridge; the
//! two dialects differ in feature flags, the native type table and whether
//! runtime-defined types are discovered from a catalog.
//!
//! ## Connection strings
//!
//! Options build the ODBC string; a DSN takes precedence over a driver:
//!
//! ```text
//! DSN=<dsn>;HOST=<host>;PORT=<port>;DATABASE=<db>;UID=<user>;PASSWORD=<password>
//! Driver=<driver>;HOST=<host>;PORT=<port>;DATABASE=<db>;UID=<user>;PASSWORD=<password>
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlx_openedge_core::openedge::{Dialect, DialectKind};
//! use sqlx_core::connection::ConnectOptions;
//!
//! # async fn example() -> Result<(), sqlx_core::Error> {
//! let dialect = Dialect::odbc(DialectKind::OpenEdge)?;
//! let options = dialect
//!     .connect_options()
//!     .driver("Progress OpenEdge 11.7 Driver")
//!     .database("sports2000")
//!     .username("SYSPROGRESS")
//!     .password("SYSPROGRESS");
//! let mut conn = options.connect().await?;
//! # Ok(())
//! # }
//! ```

mod arguments;
mod column;
mod connection;
mod database;
pub mod dialect;
pub mod driver;
mod error;
mod options;
mod query;
mod query_result;
mod row;
mod statement;
mod transaction;
pub(crate) mod type_info;
pub mod types;
mod value;

pub use arguments::OpenEdgeArguments;
pub use column::OpenEdgeColumn;
pub use connection::{ConnectionManager, ConnectionStatus, OpenEdgeConnection, DYNAMIC_TYPES_QUERY};
pub use database::{OpenEdge, OpenEdgeArgumentValue};
pub use dialect::{DatabaseVersion, Dialect, DialectKind, DialectSupports, IndexSupports, TICK_CHAR};
pub use error::{codes, DriverError, OpenEdgeError};
pub use options::{parse_offset, OpenEdgeConnectOptions};
pub use query::{
    query, query_as, query_as_with, query_scalar, query_scalar_with, query_with, QueryBuilder,
};
pub use query_result::OpenEdgeQueryResult;
pub use row::OpenEdgeRow;
pub use statement::{OpenEdgeStatement, OpenEdgeStatementMetadata};
pub use transaction::OpenEdgeTransactionManager;
pub use type_info::{sql_codes, Oid, OpenEdgeTypeInfo};
pub use value::{OpenEdgeValue, OpenEdgeValueData, OpenEdgeValueRef};

use sqlx_core::executor::Executor;

pub type OpenEdgePool = sqlx_core::pool::Pool<OpenEdge>;

pub type OpenEdgePoolOptions = sqlx_core::pool::PoolOptions<OpenEdge>;

/// An alias for [`Executor<'_, Database = OpenEdge>`][Executor].
pub trait OpenEdgeExecutor<'c>: Executor<'c, Database = OpenEdge> {}
impl<'c, T: Executor<'c, Database = OpenEdge>> OpenEdgeExecutor<'c> for T {}
