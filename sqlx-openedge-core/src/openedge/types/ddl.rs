//! Native column type names and SQL literals.

use crate::openedge::dialect::DialectKind;
use crate::openedge::types::{AbstractType, NumberOptions, TypeContext};
use crate::openedge::{OpenEdgeError, OpenEdgeValueData};
use chrono::SecondsFormat;
use std::collections::BTreeMap;
use std::fmt::Write;

const DEFAULT_STRING_LENGTH: u32 = 255;

impl AbstractType {
    /// Render the column type for `CREATE TABLE` / `ALTER TABLE`.
    pub fn to_native_type_name(&self, dialect: DialectKind) -> Result<String, OpenEdgeError> {
        match dialect {
            DialectKind::OpenEdge => self.openedge_type_name(),
            DialectKind::Postgres => self.postgres_type_name(),
        }
    }

    fn openedge_type_name(&self) -> Result<String, OpenEdgeError> {
        let name = match self {
            AbstractType::String { length, binary } => {
                let length = length.unwrap_or(DEFAULT_STRING_LENGTH);
                if *binary {
                    format!("VARCHAR BINARY({length})")
                } else {
                    format!("VARCHAR({length})")
                }
            }
            AbstractType::Char { length, binary } => {
                let length = length.unwrap_or(DEFAULT_STRING_LENGTH);
                if *binary {
                    format!("CHAR BINARY({length})")
                } else {
                    format!("CHAR({length})")
                }
            }
            AbstractType::Text { length } => {
                if length.is_some() {
                    log::warn!(
                        "OpenEdge does not support TEXT with options. Plain `TEXT` will be used instead."
                    );
                }
                "TEXT".to_owned()
            }
            AbstractType::TinyInt(opts)
            | AbstractType::SmallInt(opts)
            | AbstractType::MediumInt(opts)
            | AbstractType::Integer(opts)
            | AbstractType::BigInt(opts)
            | AbstractType::Float(opts)
            | AbstractType::Real(opts)
            | AbstractType::Double(opts) => number(self.key().as_str(), opts),
            AbstractType::Decimal { precision, scale } => decimal(*precision, *scale),
            AbstractType::Boolean => "TINYINT".to_owned(),
            AbstractType::Time => "TIME".to_owned(),
            AbstractType::Date { .. } => "TIMESTAMP".to_owned(),
            AbstractType::DateOnly => "DATE".to_owned(),
            AbstractType::Blob => "BLOB".to_owned(),
            AbstractType::Uuid => "CHARACTER(36)".to_owned(),
            AbstractType::Enum { .. } => "TEXT".to_owned(),
            AbstractType::Geometry
            | AbstractType::Geography
            | AbstractType::HStore
            | AbstractType::Json => {
                return Err(OpenEdgeError::UnsupportedType {
                    key: self.key().as_str(),
                    dialect: DialectKind::OpenEdge.name(),
                });
            }
        };
        Ok(name)
    }

    fn postgres_type_name(&self) -> Result<String, OpenEdgeError> {
        let name = match self {
            AbstractType::String { binary: true, .. } | AbstractType::Blob => "BYTEA".to_owned(),
            AbstractType::String { length, .. } => {
                format!("VARCHAR({})", length.unwrap_or(DEFAULT_STRING_LENGTH))
            }
            AbstractType::Char { binary: true, .. } => "BYTEA".to_owned(),
            AbstractType::Char { length, .. } => {
                format!("CHAR({})", length.unwrap_or(DEFAULT_STRING_LENGTH))
            }
            AbstractType::Text { .. } => "TEXT".to_owned(),
            AbstractType::TinyInt(_) | AbstractType::SmallInt(_) => "SMALLINT".to_owned(),
            AbstractType::MediumInt(_) | AbstractType::Integer(_) => "INTEGER".to_owned(),
            AbstractType::BigInt(_) => "BIGINT".to_owned(),
            AbstractType::Float(opts) => match opts.length {
                Some(length) => format!("FLOAT({length})"),
                None => "FLOAT".to_owned(),
            },
            AbstractType::Real(_) => "REAL".to_owned(),
            AbstractType::Double(_) => "DOUBLE PRECISION".to_owned(),
            AbstractType::Decimal { precision, scale } => decimal(*precision, *scale),
            AbstractType::Boolean => "BOOLEAN".to_owned(),
            AbstractType::Time => "TIME".to_owned(),
            AbstractType::Date { .. } => "TIMESTAMP WITH TIME ZONE".to_owned(),
            AbstractType::DateOnly => "DATE".to_owned(),
            AbstractType::Uuid => "UUID".to_owned(),
            AbstractType::Enum { values } => {
                let mut out = String::from("ENUM(");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote(value));
                }
                out.push(')');
                out
            }
            AbstractType::Geometry => "GEOMETRY".to_owned(),
            AbstractType::Geography => "GEOGRAPHY".to_owned(),
            AbstractType::HStore => "HSTORE".to_owned(),
            AbstractType::Json => "JSON".to_owned(),
        };
        Ok(name)
    }

    /// Render `value` as an SQL literal for a column of this type.
    pub fn format_literal(
        &self,
        value: &OpenEdgeValueData,
        ctx: &TypeContext,
    ) -> Result<String, OpenEdgeError> {
        let dialect = ctx.dialect;
        let literal = match value {
            OpenEdgeValueData::Null => "NULL".to_owned(),
            OpenEdgeValueData::Bool(b) => match dialect {
                DialectKind::OpenEdge => (if *b { "1" } else { "0" }).to_owned(),
                DialectKind::Postgres => b.to_string(),
            },
            OpenEdgeValueData::SmallInt(v) => v.to_string(),
            OpenEdgeValueData::Int(v) => v.to_string(),
            OpenEdgeValueData::BigInt(v) => v.to_string(),
            OpenEdgeValueData::Double(v) if v.is_nan() => quote("NaN"),
            OpenEdgeValueData::Double(v) if v.is_infinite() => {
                quote(if v.is_sign_positive() { "Infinity" } else { "-Infinity" })
            }
            OpenEdgeValueData::Double(v) => v.to_string(),
            OpenEdgeValueData::Decimal(v) => v.to_string(),
            OpenEdgeValueData::Text(s) => quote(s),
            OpenEdgeValueData::Binary(bytes) => match dialect {
                DialectKind::OpenEdge => format!("X'{}'", hex::encode_upper(bytes)),
                DialectKind::Postgres => format!("'\\x{}'", hex::encode(bytes)),
            },
            OpenEdgeValueData::Timestamp(instant) => {
                let local = instant.with_timezone(&ctx.timezone);
                match (self, dialect) {
                    (AbstractType::DateOnly, _) => quote(&local.format("%Y-%m-%d").to_string()),
                    (_, DialectKind::OpenEdge) => {
                        quote(&local.format("%Y-%m-%d %H:%M:%S").to_string())
                    }
                    (_, DialectKind::Postgres) => {
                        quote(&local.to_rfc3339_opts(SecondsFormat::Millis, false).replace('T', " "))
                    }
                }
            }
            OpenEdgeValueData::Array(items) if dialect == DialectKind::Postgres => {
                let mut out = String::from("ARRAY[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&self.format_literal(item, ctx)?);
                }
                out.push(']');
                out
            }
            OpenEdgeValueData::HStore(map) if dialect == DialectKind::Postgres => quote(&hstore_text(map)),
            OpenEdgeValueData::Array(_) | OpenEdgeValueData::HStore(_) => {
                return Err(OpenEdgeError::UnsupportedType {
                    key: self.key().as_str(),
                    dialect: dialect.name(),
                });
            }
        };
        Ok(literal)
    }
}

fn number(key: &str, opts: &NumberOptions) -> String {
    let mut out = key.to_owned();
    if opts.unsigned {
        out.push_str(" UNSIGNED");
    }
    if opts.zerofill {
        out.push_str(" ZEROFILL");
    }
    if let Some(length) = opts.length {
        let _ = write!(out, "({length}");
        if let Some(decimals) = opts.decimals {
            let _ = write!(out, ",{decimals}");
        }
        out.push(')');
    }
    out
}

fn decimal(precision: Option<u32>, scale: Option<u32>) -> String {
    match (precision, scale) {
        (Some(p), Some(s)) => format!("DECIMAL({p},{s})"),
        (Some(p), None) => format!("DECIMAL({p})"),
        _ => "DECIMAL".to_owned(),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn hstore_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// hstore input text: `"k"=>"v","n"=>NULL`.
pub(crate) fn hstore_text(map: &BTreeMap<String, Option<String>>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "\"{}\"=>", hstore_escape(key));
        match value {
            Some(value) => {
                let _ = write!(out, "\"{}\"", hstore_escape(value));
            }
            None => out.push_str("NULL"),
        }
    }
    out
}
