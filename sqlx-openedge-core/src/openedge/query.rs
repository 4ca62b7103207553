//! `sqlx::query`-style constructors bound to [`OpenEdge`].
//!
//! Placeholders are positional `?` on both dialects.
//!
//! ```rust,ignore
//! use sqlx_openedge::{query, query_scalar};
//!
//! let name: String = query_scalar("SELECT \"Name\" FROM PUB.\"Customer\" WHERE \"CustNum\" = ?")
//!     .bind(1)
//!     .fetch_one(&mut conn)
//!     .await?;
//! ```

use crate::openedge::{OpenEdge, OpenEdgeArguments, OpenEdgeRow};
use sqlx_core::from_row::FromRow;

pub use sqlx_core::query::Query;
pub use sqlx_core::query_as::QueryAs;
pub use sqlx_core::query_builder::QueryBuilder;
pub use sqlx_core::query_scalar::QueryScalar;

pub fn query(sql: &str) -> Query<'_, OpenEdge, OpenEdgeArguments<'_>> {
    sqlx_core::query::query(sql)
}

pub fn query_with<'q>(sql: &'q str, args: OpenEdgeArguments<'q>) -> Query<'q, OpenEdge, OpenEdgeArguments<'q>> {
    sqlx_core::query::query_with(sql, args)
}

/// Map each row onto `O`.
pub fn query_as<'q, O>(sql: &'q str) -> QueryAs<'q, OpenEdge, O, OpenEdgeArguments<'q>>
where
    O: for<'r> FromRow<'r, OpenEdgeRow>,
{
    sqlx_core::query_as::query_as(sql)
}

pub fn query_as_with<'q, O>(
    sql: &'q str,
    args: OpenEdgeArguments<'q>,
) -> QueryAs<'q, OpenEdge, O, OpenEdgeArguments<'q>>
where
    O: for<'r> FromRow<'r, OpenEdgeRow>,
{
    sqlx_core::query_as::query_as_with(sql, args)
}

/// Read the first column of each row.
pub fn query_scalar<'q, S>(sql: &'q str) -> QueryScalar<'q, OpenEdge, S, OpenEdgeArguments<'q>>
where
    (S,): for<'r> FromRow<'r, OpenEdgeRow>,
{
    sqlx_core::query_scalar::query_scalar(sql)
}

pub fn query_scalar_with<'q, S>(
    sql: &'q str,
    args: OpenEdgeArguments<'q>,
) -> QueryScalar<'q, OpenEdge, S, OpenEdgeArguments<'q>>
where
    (S,): for<'r> FromRow<'r, OpenEdgeRow>,
{
    sqlx_core::query_scalar::query_scalar_with(sql, args)
}
