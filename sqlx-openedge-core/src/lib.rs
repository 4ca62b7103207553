//! Core of the SQLx OpenEdge driver.
//!
//! Connection lifecycle, type registries and value coercion for the
//! OpenEdge engine and a Postgres-like engine, both reached through ODBC.

pub mod openedge;

pub use openedge::{
    ConnectionManager, Dialect, DialectKind, DriverError, OpenEdge, OpenEdgeArguments, OpenEdgeColumn,
    OpenEdgeConnectOptions, OpenEdgeConnection, OpenEdgeError, OpenEdgeExecutor, OpenEdgePool,
    OpenEdgePoolOptions, OpenEdgeQueryResult, OpenEdgeRow, OpenEdgeStatement, OpenEdgeTransactionManager,
    OpenEdgeTypeInfo, OpenEdgeValue, OpenEdgeValueData, OpenEdgeValueRef,
};

pub use sqlx_core;
