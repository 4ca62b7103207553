//! Abstract column types and their per-dialect native mapping.
//!
//! An [`AbstractType`] is what a schema declares; its [`TypeKey`] selects
//! the native names and codes in a [`TypeRegistry`] and the parser bound to
//! those codes in a [`ParserRegistry`].

mod array;
pub(crate) mod coerce;
mod ddl;
mod decode;
mod parser;
mod registry;

pub use array::parse_array;
pub(crate) use ddl::hstore_text;
pub use coerce::{
    parse_boolean, parse_date_only, parse_decimal, parse_floating, parse_hstore, parse_timestamp,
};
pub use parser::{ParserRegistry, TypeParser};
pub use registry::{TypeMapping, TypeRegistry};

use crate::openedge::dialect::DialectKind;
use crate::openedge::OpenEdgeValueData;
use chrono::{FixedOffset, Offset, Utc};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Symbolic key of an abstract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKey {
    String,
    Char,
    Text,
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Decimal,
    Boolean,
    Time,
    Date,
    DateOnly,
    Blob,
    Uuid,
    Enum,
    Geometry,
    Geography,
    HStore,
    Json,
}

impl TypeKey {
    pub const ALL: [TypeKey; 23] = [
        TypeKey::String,
        TypeKey::Char,
        TypeKey::Text,
        TypeKey::TinyInt,
        TypeKey::SmallInt,
        TypeKey::MediumInt,
        TypeKey::Integer,
        TypeKey::BigInt,
        TypeKey::Float,
        TypeKey::Real,
        TypeKey::Double,
        TypeKey::Decimal,
        TypeKey::Boolean,
        TypeKey::Time,
        TypeKey::Date,
        TypeKey::DateOnly,
        TypeKey::Blob,
        TypeKey::Uuid,
        TypeKey::Enum,
        TypeKey::Geometry,
        TypeKey::Geography,
        TypeKey::HStore,
        TypeKey::Json,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TypeKey::String => "STRING",
            TypeKey::Char => "CHAR",
            TypeKey::Text => "TEXT",
            TypeKey::TinyInt => "TINYINT",
            TypeKey::SmallInt => "SMALLINT",
            TypeKey::MediumInt => "MEDIUMINT",
            TypeKey::Integer => "INTEGER",
            TypeKey::BigInt => "BIGINT",
            TypeKey::Float => "FLOAT",
            TypeKey::Real => "REAL",
            TypeKey::Double => "DOUBLE PRECISION",
            TypeKey::Decimal => "DECIMAL",
            TypeKey::Boolean => "BOOLEAN",
            TypeKey::Time => "TIME",
            TypeKey::Date => "DATE",
            TypeKey::DateOnly => "DATEONLY",
            TypeKey::Blob => "BLOB",
            TypeKey::Uuid => "UUID",
            TypeKey::Enum => "ENUM",
            TypeKey::Geometry => "GEOMETRY",
            TypeKey::Geography => "GEOGRAPHY",
            TypeKey::HStore => "HSTORE",
            TypeKey::Json => "JSON",
        }
    }

    /// Whether values of this type go through a dedicated parser instead of
    /// the driver default.
    pub const fn has_parser(self) -> bool {
        matches!(
            self,
            TypeKey::Date
                | TypeKey::DateOnly
                | TypeKey::Float
                | TypeKey::Real
                | TypeKey::Double
                | TypeKey::Decimal
                | TypeKey::Boolean
                | TypeKey::Enum
                | TypeKey::Geometry
                | TypeKey::Geography
                | TypeKey::HStore
        )
    }

    /// Coerce the raw text of a value of this type.
    pub fn parse(self, raw: &str, ctx: &TypeContext) -> OpenEdgeValueData {
        match self {
            TypeKey::Date => coerce::parse_timestamp(raw, ctx.timezone),
            TypeKey::DateOnly => coerce::parse_date_only(raw),
            TypeKey::Float | TypeKey::Real | TypeKey::Double => coerce::parse_floating(raw),
            TypeKey::Decimal => coerce::parse_decimal(raw),
            TypeKey::Boolean => coerce::parse_boolean(raw),
            TypeKey::HStore => coerce::parse_hstore(raw),
            _ => OpenEdgeValueData::Text(raw.to_owned()),
        }
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Settings that change how values are parsed and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeContext {
    pub dialect: DialectKind,
    /// Zone for timestamps that carry no offset.
    pub timezone: FixedOffset,
}

impl TypeContext {
    pub fn new(dialect: DialectKind, timezone: FixedOffset) -> Self {
        Self { dialect, timezone }
    }

    pub fn utc(dialect: DialectKind) -> Self {
        Self::new(dialect, Utc.fix())
    }
}

/// Options shared by the numeric types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumberOptions {
    pub length: Option<u32>,
    pub decimals: Option<u32>,
    pub unsigned: bool,
    pub zerofill: bool,
}

impl NumberOptions {
    pub fn length(length: u32) -> Self {
        Self {
            length: Some(length),
            ..Self::default()
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLength {
    Tiny,
    Medium,
    Long,
}

/// A logical column type with its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbstractType {
    String { length: Option<u32>, binary: bool },
    Char { length: Option<u32>, binary: bool },
    Text { length: Option<TextLength> },
    TinyInt(NumberOptions),
    SmallInt(NumberOptions),
    MediumInt(NumberOptions),
    Integer(NumberOptions),
    BigInt(NumberOptions),
    Float(NumberOptions),
    Real(NumberOptions),
    Double(NumberOptions),
    Decimal { precision: Option<u32>, scale: Option<u32> },
    Boolean,
    Time,
    Date { precision: Option<u32> },
    DateOnly,
    Blob,
    Uuid,
    Enum { values: Vec<String> },
    Geometry,
    Geography,
    HStore,
    Json,
}

impl AbstractType {
    pub fn key(&self) -> TypeKey {
        match self {
            AbstractType::String { .. } => TypeKey::String,
            AbstractType::Char { .. } => TypeKey::Char,
            AbstractType::Text { .. } => TypeKey::Text,
            AbstractType::TinyInt(_) => TypeKey::TinyInt,
            AbstractType::SmallInt(_) => TypeKey::SmallInt,
            AbstractType::MediumInt(_) => TypeKey::MediumInt,
            AbstractType::Integer(_) => TypeKey::Integer,
            AbstractType::BigInt(_) => TypeKey::BigInt,
            AbstractType::Float(_) => TypeKey::Float,
            AbstractType::Real(_) => TypeKey::Real,
            AbstractType::Double(_) => TypeKey::Double,
            AbstractType::Decimal { .. } => TypeKey::Decimal,
            AbstractType::Boolean => TypeKey::Boolean,
            AbstractType::Time => TypeKey::Time,
            AbstractType::Date { .. } => TypeKey::Date,
            AbstractType::DateOnly => TypeKey::DateOnly,
            AbstractType::Blob => TypeKey::Blob,
            AbstractType::Uuid => TypeKey::Uuid,
            AbstractType::Enum { .. } => TypeKey::Enum,
            AbstractType::Geometry => TypeKey::Geometry,
            AbstractType::Geography => TypeKey::Geography,
            AbstractType::HStore => TypeKey::HStore,
            AbstractType::Json => TypeKey::Json,
        }
    }

    /// Coerce a raw driver value of this type.
    pub fn parse(&self, raw: &str, ctx: &TypeContext) -> OpenEdgeValueData {
        self.key().parse(raw, ctx)
    }

    pub fn string(length: u32) -> Self {
        AbstractType::String {
            length: Some(length),
            binary: false,
        }
    }

    pub fn integer() -> Self {
        AbstractType::Integer(NumberOptions::default())
    }
}
