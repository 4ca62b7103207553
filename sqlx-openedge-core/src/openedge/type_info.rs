//! Type information for OpenEdge columns.

use sqlx_core::type_info::TypeInfo;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A native type code ("oid") as reported by the driver for a column.
///
/// Over ODBC this is the SQL data type code (`SQL_TYPE_TIMESTAMP` = 93, ...);
/// on the Postgres-like engine it is the `pg_type.oid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Oid(pub i64);

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<i64> for Oid {
    fn from(code: i64) -> Self {
        Oid(code)
    }
}

/// ODBC SQL data type codes used when the driver reports ODBC metadata.
pub mod sql_codes {
    use super::Oid;

    pub const UNKNOWN: Oid = Oid(0);
    pub const CHAR: Oid = Oid(1);
    pub const NUMERIC: Oid = Oid(2);
    pub const DECIMAL: Oid = Oid(3);
    pub const INTEGER: Oid = Oid(4);
    pub const SMALLINT: Oid = Oid(5);
    pub const FLOAT: Oid = Oid(6);
    pub const REAL: Oid = Oid(7);
    pub const DOUBLE: Oid = Oid(8);
    pub const DATETIME: Oid = Oid(9);
    pub const TIMESTAMP_LEGACY: Oid = Oid(11);
    pub const VARCHAR: Oid = Oid(12);
    pub const DATE: Oid = Oid(91);
    pub const TIME: Oid = Oid(92);
    pub const TIMESTAMP: Oid = Oid(93);
    pub const LONGVARCHAR: Oid = Oid(-1);
    pub const BINARY: Oid = Oid(-2);
    pub const VARBINARY: Oid = Oid(-3);
    pub const LONGVARBINARY: Oid = Oid(-4);
    pub const BIGINT: Oid = Oid(-5);
    pub const TINYINT: Oid = Oid(-6);
    pub const BIT: Oid = Oid(-7);
    pub const WCHAR: Oid = Oid(-8);
    pub const WVARCHAR: Oid = Oid(-9);
    pub const WLONGVARCHAR: Oid = Oid(-10);
}

/// Type information for an OpenEdge column or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "offline", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenEdgeTypeInfo {
    pub(crate) oid: Oid,
    pub(crate) name: String,
}

impl OpenEdgeTypeInfo {
    pub fn new(oid: Oid, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into(),
        }
    }

    /// The native type code
    pub fn oid(&self) -> Oid {
        self.oid
    }

    pub fn null() -> Self {
        Self::new(sql_codes::UNKNOWN, "NULL")
    }

    pub fn bit() -> Self {
        Self::new(sql_codes::BIT, "BIT")
    }

    pub fn small_int() -> Self {
        Self::new(sql_codes::SMALLINT, "SMALLINT")
    }

    pub fn integer() -> Self {
        Self::new(sql_codes::INTEGER, "INTEGER")
    }

    pub fn big_int() -> Self {
        Self::new(sql_codes::BIGINT, "BIGINT")
    }

    pub fn real() -> Self {
        Self::new(sql_codes::REAL, "REAL")
    }

    pub fn double() -> Self {
        Self::new(sql_codes::DOUBLE, "DOUBLE PRECISION")
    }

    pub fn decimal() -> Self {
        Self::new(sql_codes::DECIMAL, "DECIMAL")
    }

    pub fn varchar() -> Self {
        Self::new(sql_codes::VARCHAR, "VARCHAR")
    }

    pub fn varbinary() -> Self {
        Self::new(sql_codes::VARBINARY, "VARBINARY")
    }

    pub fn date() -> Self {
        Self::new(sql_codes::DATE, "DATE")
    }

    pub fn timestamp() -> Self {
        Self::new(sql_codes::TIMESTAMP, "TIMESTAMP")
    }
}

impl TypeInfo for OpenEdgeTypeInfo {
    fn is_null(&self) -> bool {
        self.oid == sql_codes::UNKNOWN
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Display for OpenEdgeTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.pad(&self.name)
    }
}
