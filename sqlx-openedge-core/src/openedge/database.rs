//! OpenEdge database definition.

use crate::openedge::dialect::DialectKind;
use crate::openedge::types::{hstore_text, TypeContext};
use crate::openedge::{
    OpenEdgeArguments, OpenEdgeColumn, OpenEdgeConnection, OpenEdgeError, OpenEdgeQueryResult,
    OpenEdgeRow, OpenEdgeStatement, OpenEdgeTransactionManager, OpenEdgeTypeInfo, OpenEdgeValue,
    OpenEdgeValueRef,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::collections::BTreeMap;

pub(crate) use sqlx_core::database::{Database, HasStatementCache};

/// OpenEdge database driver, also serving the Postgres-like dialect.
///
/// The dialect of a connection is chosen by its options.
#[derive(Debug)]
pub struct OpenEdge;

impl Database for OpenEdge {
    type Connection = OpenEdgeConnection;

    type TransactionManager = OpenEdgeTransactionManager;

    type Row = OpenEdgeRow;

    type QueryResult = OpenEdgeQueryResult;

    type Column = OpenEdgeColumn;

    type TypeInfo = OpenEdgeTypeInfo;

    type Value = OpenEdgeValue;
    type ValueRef<'r> = OpenEdgeValueRef<'r>;

    type Arguments<'q> = OpenEdgeArguments<'q>;
    type ArgumentBuffer<'q> = Vec<OpenEdgeArgumentValue<'q>>;

    type Statement<'q> = OpenEdgeStatement<'q>;

    const NAME: &'static str = "OpenEdge";

    const URL_SCHEMES: &'static [&'static str] = &["openedge", "progress"];
}

impl HasStatementCache for OpenEdge {}

sqlx_core::impl_encode_for_option!(OpenEdge);

/// A bind argument, rendered to text when the statement runs.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenEdgeArgumentValue<'q> {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Text(Cow<'q, str>),
    Binary(Cow<'q, [u8]>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    HStore(BTreeMap<String, Option<String>>),
    TextArray(Vec<String>),
}

impl OpenEdgeArgumentValue<'_> {
    /// Text form bound to the driver; `None` binds SQL `NULL`.
    pub fn to_param(&self, ctx: &TypeContext) -> Result<Option<String>, OpenEdgeError> {
        let dialect = ctx.dialect;
        let text = match self {
            Self::Null => return Ok(None),
            Self::Bool(b) => match dialect {
                DialectKind::OpenEdge => (if *b { "1" } else { "0" }).to_owned(),
                DialectKind::Postgres => b.to_string(),
            },
            Self::SmallInt(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::BigInt(v) => v.to_string(),
            Self::Float(v) => float_text(f64::from(*v)),
            Self::Double(v) => float_text(*v),
            Self::Decimal(v) => v.to_string(),
            Self::Text(s) => s.clone().into_owned(),
            Self::Binary(bytes) => match dialect {
                DialectKind::OpenEdge => hex::encode_upper(bytes),
                DialectKind::Postgres => format!("\\x{}", hex::encode(bytes)),
            },
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
            Self::Timestamp(instant) => {
                let local = instant.with_timezone(&ctx.timezone);
                match dialect {
                    DialectKind::OpenEdge => local.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                    DialectKind::Postgres => local
                        .to_rfc3339_opts(SecondsFormat::Millis, false)
                        .replace('T', " "),
                }
            }
            Self::HStore(map) if dialect == DialectKind::Postgres => hstore_text(map),
            Self::TextArray(items) if dialect == DialectKind::Postgres => array_text(items),
            Self::HStore(_) => {
                return Err(OpenEdgeError::UnsupportedType {
                    key: "HSTORE",
                    dialect: dialect.name(),
                });
            }
            Self::TextArray(_) => {
                return Err(OpenEdgeError::UnsupportedType {
                    key: "ARRAY",
                    dialect: dialect.name(),
                });
            }
        };
        Ok(Some(text))
    }
}

fn float_text(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_owned()
    } else if v.is_infinite() {
        (if v > 0.0 { "Infinity" } else { "-Infinity" }).to_owned()
    } else {
        v.to_string()
    }
}

// {"a","b\"c",NULL}
fn array_text(items: &[String]) -> String {
    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&item.replace('\\', "\\\\").replace('"', "\\\""));
        out.push('"');
    }
    out.push('}');
    out
}
