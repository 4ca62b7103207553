//! SQLx OpenEdge Driver
//!
//! This crate provides a [SQLx](https://docs.rs/sqlx) backend for Progress
//! OpenEdge SQL servers, and for Postgres-like engines reached through the
//! same ODBC bridge.
//!
//! ## Features
//!
//! - **Two dialects** - OpenEdge and a Postgres-like engine, each with its own type registry
//! - **Typed values** - Every fetched value is coerced by the parser bound to its native type
//! - **Classified connect failures** - Refused, unreachable and misconfigured attempts are distinct errors
//! - **Async operations** - Blocking ODBC calls run on Tokio's blocking pool
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlx_openedge::{Dialect, DialectKind};
//! use sqlx_openedge::sqlx_core::connection::{ConnectOptions, Connection};
//!
//! # async fn example() -> Result<(), sqlx_openedge::sqlx_core::Error> {
//! let dialect = Dialect::odbc(DialectKind::OpenEdge)?;
//! let mut conn = dialect
//!     .connect_options()
//!     .dsn("sports2000")
//!     .username("SYSPROGRESS")
//!     .password("SYSPROGRESS")
//!     .connect()
//!     .await?;
//! conn.ping().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serde serialization support
//! - `offline` - Enable offline mode support

#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export the FromRow trait from sqlx_core
pub use sqlx_openedge_core::sqlx_core::from_row::FromRow;

pub use sqlx_openedge_core::openedge::{
    codes, dialect, driver, parse_offset, query, query_as, query_as_with, query_scalar, query_scalar_with,
    query_with, sql_codes, types, ConnectionStatus, DatabaseVersion, DialectSupports, Oid, OpenEdgeArgumentValue,
    OpenEdgeStatementMetadata, QueryBuilder, DYNAMIC_TYPES_QUERY,
};
pub use sqlx_openedge_core::*;
