//! Values produced by the parser registry.

use crate::openedge::{OpenEdge, OpenEdgeTypeInfo};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx_core::value::{Value, ValueRef};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// An owned, coerced column value.
///
/// Parsers never fail: text they do not recognise is kept as [`Text`](Self::Text).
#[derive(Debug, Clone, PartialEq)]
pub enum OpenEdgeValueData {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    /// Floating point, including the IEEE specials read from `NaN`/`Infinity`/`-Infinity`.
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Binary(Vec<u8>),
    /// An absolute instant.
    Timestamp(DateTime<Utc>),
    Array(Vec<OpenEdgeValueData>),
    HStore(BTreeMap<String, Option<String>>),
}

impl OpenEdgeValueData {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The raw text, when the value passed through a parser unchanged.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A reference to a value in an [`OpenEdgeRow`](crate::openedge::OpenEdgeRow).
#[derive(Debug, Clone)]
pub struct OpenEdgeValueRef<'r> {
    pub(crate) data: &'r OpenEdgeValueData,
    pub(crate) type_info: OpenEdgeTypeInfo,
}

impl<'r> OpenEdgeValueRef<'r> {
    pub fn new(data: &'r OpenEdgeValueData, type_info: OpenEdgeTypeInfo) -> Self {
        Self { data, type_info }
    }

    pub fn data(&self) -> &'r OpenEdgeValueData {
        self.data
    }
}

impl ValueRef<'_> for OpenEdgeValueRef<'_> {
    type Database = OpenEdge;

    fn to_owned(&self) -> OpenEdgeValue {
        OpenEdgeValue {
            data: self.data.clone(),
            type_info: self.type_info.clone(),
        }
    }

    fn type_info(&self) -> Cow<'_, OpenEdgeTypeInfo> {
        Cow::Borrowed(&self.type_info)
    }

    fn is_null(&self) -> bool {
        self.data.is_null()
    }
}

/// An owned value from an OpenEdge result.
#[derive(Debug, Clone)]
pub struct OpenEdgeValue {
    pub(crate) data: OpenEdgeValueData,
    pub(crate) type_info: OpenEdgeTypeInfo,
}

impl OpenEdgeValue {
    pub fn new(data: OpenEdgeValueData, type_info: OpenEdgeTypeInfo) -> Self {
        Self { data, type_info }
    }

    pub fn data(&self) -> &OpenEdgeValueData {
        &self.data
    }

    pub fn into_data(self) -> OpenEdgeValueData {
        self.data
    }
}

impl Value for OpenEdgeValue {
    type Database = OpenEdge;

    fn as_ref(&self) -> OpenEdgeValueRef<'_> {
        OpenEdgeValueRef {
            data: &self.data,
            type_info: self.type_info.clone(),
        }
    }

    fn type_info(&self) -> Cow<'_, OpenEdgeTypeInfo> {
        Cow::Borrowed(&self.type_info)
    }

    fn is_null(&self) -> bool {
        self.data.is_null()
    }
}

impl From<bool> for OpenEdgeValueData {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for OpenEdgeValueData {
    fn from(v: i16) -> Self {
        Self::SmallInt(v)
    }
}

impl From<i32> for OpenEdgeValueData {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for OpenEdgeValueData {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for OpenEdgeValueData {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for OpenEdgeValueData {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for OpenEdgeValueData {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for OpenEdgeValueData {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<Decimal> for OpenEdgeValueData {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<DateTime<Utc>> for OpenEdgeValueData {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}
