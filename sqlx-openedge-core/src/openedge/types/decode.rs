//! `Type`, `Encode` and `Decode` implementations.
//!
//! Values arrive already coerced by the parser registry, so decoding maps a
//! [`OpenEdgeValueData`] variant onto the Rust type. Text that a parser kept
//! unchanged is parsed here as a last resort.

use crate::openedge::database::OpenEdgeArgumentValue;
use crate::openedge::types::{parse_array, parse_boolean, parse_floating, parse_hstore, parse_timestamp};
use crate::openedge::{OpenEdge, OpenEdgeTypeInfo, OpenEdgeValueData, OpenEdgeValueRef};
use chrono::{DateTime, NaiveDate, Offset, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx_core::decode::Decode;
use sqlx_core::encode::{Encode, IsNull};
use sqlx_core::error::BoxDynError;
use sqlx_core::types::Type;
use std::borrow::Cow;
use std::collections::BTreeMap;

type Buf<'q> = Vec<OpenEdgeArgumentValue<'q>>;

// Native codes differ per driver (ODBC SQL codes or pg oids), so every
// column type is accepted and the decode itself rejects what it can't read.
macro_rules! impl_type {
    ($ty:ty, $info:expr) => {
        impl Type<OpenEdge> for $ty {
            fn type_info() -> OpenEdgeTypeInfo {
                $info
            }

            fn compatible(_ty: &OpenEdgeTypeInfo) -> bool {
                true
            }
        }
    };
}

fn mismatch(target: &str, data: &OpenEdgeValueData) -> BoxDynError {
    format!("cannot decode {data:?} as {target}").into()
}

// ============================================================================
// Boolean
// ============================================================================

impl_type!(bool, OpenEdgeTypeInfo::bit());

impl<'q> Encode<'q, OpenEdge> for bool {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Bool(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for bool {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Bool(b) => Ok(*b),
            OpenEdgeValueData::SmallInt(i) => Ok(*i != 0),
            OpenEdgeValueData::Int(i) => Ok(*i != 0),
            OpenEdgeValueData::BigInt(i) => Ok(*i != 0),
            OpenEdgeValueData::Text(s) => match parse_boolean(s) {
                OpenEdgeValueData::Bool(b) => Ok(b),
                other => Err(mismatch("bool", &other)),
            },
            other => Err(mismatch("bool", other)),
        }
    }
}

// ============================================================================
// Integers
// ============================================================================

macro_rules! impl_integer {
    ($ty:ty, $variant:ident, $info:expr) => {
        impl_type!($ty, $info);

        impl<'q> Encode<'q, OpenEdge> for $ty {
            fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
                buf.push(OpenEdgeArgumentValue::$variant(*self));
                Ok(IsNull::No)
            }
        }

        impl<'r> Decode<'r, OpenEdge> for $ty {
            fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
                match value.data() {
                    OpenEdgeValueData::SmallInt(i) => Ok(<$ty>::try_from(*i)?),
                    OpenEdgeValueData::Int(i) => Ok(<$ty>::try_from(*i)?),
                    OpenEdgeValueData::BigInt(i) => Ok(<$ty>::try_from(*i)?),
                    OpenEdgeValueData::Bool(b) => Ok(<$ty>::from(*b)),
                    OpenEdgeValueData::Decimal(d) if d.fract().is_zero() => d
                        .to_i64()
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| mismatch(stringify!($ty), value.data())),
                    OpenEdgeValueData::Text(s) => Ok(s.trim().parse()?),
                    other => Err(mismatch(stringify!($ty), other)),
                }
            }
        }
    };
}

impl_integer!(i16, SmallInt, OpenEdgeTypeInfo::small_int());
impl_integer!(i32, Int, OpenEdgeTypeInfo::integer());
impl_integer!(i64, BigInt, OpenEdgeTypeInfo::big_int());

// ============================================================================
// Floating point
// ============================================================================

fn decode_f64(data: &OpenEdgeValueData) -> Result<f64, BoxDynError> {
    match data {
        OpenEdgeValueData::Double(f) => Ok(*f),
        OpenEdgeValueData::SmallInt(i) => Ok(f64::from(*i)),
        OpenEdgeValueData::Int(i) => Ok(f64::from(*i)),
        OpenEdgeValueData::BigInt(i) => Ok(*i as f64),
        OpenEdgeValueData::Decimal(d) => d.to_f64().ok_or_else(|| mismatch("f64", data)),
        OpenEdgeValueData::Text(s) => match parse_floating(s) {
            OpenEdgeValueData::Double(f) => Ok(f),
            _ => Ok(s.trim().parse()?),
        },
        other => Err(mismatch("f64", other)),
    }
}

impl_type!(f32, OpenEdgeTypeInfo::real());

impl<'q> Encode<'q, OpenEdge> for f32 {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Float(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for f32 {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(decode_f64(value.data())? as f32)
    }
}

impl_type!(f64, OpenEdgeTypeInfo::double());

impl<'q> Encode<'q, OpenEdge> for f64 {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Double(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for f64 {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        decode_f64(value.data())
    }
}

impl_type!(Decimal, OpenEdgeTypeInfo::decimal());

impl<'q> Encode<'q, OpenEdge> for Decimal {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Decimal(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for Decimal {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Decimal(d) => Ok(*d),
            OpenEdgeValueData::SmallInt(i) => Ok(Decimal::from(*i)),
            OpenEdgeValueData::Int(i) => Ok(Decimal::from(*i)),
            OpenEdgeValueData::BigInt(i) => Ok(Decimal::from(*i)),
            OpenEdgeValueData::Double(f) => Ok(Decimal::try_from(*f)?),
            OpenEdgeValueData::Text(s) => Ok(s.trim().parse()?),
            other => Err(mismatch("Decimal", other)),
        }
    }
}

// ============================================================================
// Strings and bytes
// ============================================================================

impl_type!(String, OpenEdgeTypeInfo::varchar());
impl_type!(&str, OpenEdgeTypeInfo::varchar());

impl<'q> Encode<'q, OpenEdge> for String {
    fn encode(self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Text(Cow::Owned(self)));
        Ok(IsNull::No)
    }

    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Text(Cow::Owned(self.clone())));
        Ok(IsNull::No)
    }
}

impl<'q> Encode<'q, OpenEdge> for &'q str {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Text(Cow::Borrowed(*self)));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for String {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Text(s) => Ok(s.clone()),
            OpenEdgeValueData::Bool(b) => Ok(b.to_string()),
            OpenEdgeValueData::SmallInt(i) => Ok(i.to_string()),
            OpenEdgeValueData::Int(i) => Ok(i.to_string()),
            OpenEdgeValueData::BigInt(i) => Ok(i.to_string()),
            OpenEdgeValueData::Double(f) => Ok(f.to_string()),
            OpenEdgeValueData::Decimal(d) => Ok(d.to_string()),
            OpenEdgeValueData::Timestamp(t) => Ok(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            other => Err(mismatch("String", other)),
        }
    }
}

impl<'r> Decode<'r, OpenEdge> for &'r str {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Text(s) => Ok(s.as_str()),
            other => Err(mismatch("&str", other)),
        }
    }
}

impl_type!(Vec<u8>, OpenEdgeTypeInfo::varbinary());
impl_type!(&[u8], OpenEdgeTypeInfo::varbinary());

impl<'q> Encode<'q, OpenEdge> for Vec<u8> {
    fn encode(self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Binary(Cow::Owned(self)));
        Ok(IsNull::No)
    }

    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Binary(Cow::Owned(self.clone())));
        Ok(IsNull::No)
    }
}

impl<'q> Encode<'q, OpenEdge> for &'q [u8] {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Binary(Cow::Borrowed(*self)));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for Vec<u8> {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Binary(bytes) => Ok(bytes.clone()),
            // bytea hex output
            OpenEdgeValueData::Text(s) => match s.strip_prefix("\\x") {
                Some(digits) => Ok(hex::decode(digits)?),
                None => Ok(s.as_bytes().to_vec()),
            },
            other => Err(mismatch("Vec<u8>", other)),
        }
    }
}

// ============================================================================
// Date and time
// ============================================================================

impl_type!(DateTime<Utc>, OpenEdgeTypeInfo::timestamp());

impl<'q> Encode<'q, OpenEdge> for DateTime<Utc> {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Timestamp(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for DateTime<Utc> {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Timestamp(t) => Ok(*t),
            OpenEdgeValueData::Text(s) => match parse_timestamp(s, Utc.fix()) {
                OpenEdgeValueData::Timestamp(t) => Ok(t),
                other => Err(mismatch("DateTime<Utc>", &other)),
            },
            other => Err(mismatch("DateTime<Utc>", other)),
        }
    }
}

impl_type!(NaiveDate, OpenEdgeTypeInfo::date());

impl<'q> Encode<'q, OpenEdge> for NaiveDate {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::Date(*self));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for NaiveDate {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::Timestamp(t) => Ok(t.date_naive()),
            OpenEdgeValueData::Text(s) => {
                let date = s.trim().get(..10).unwrap_or(s.trim());
                Ok(NaiveDate::parse_from_str(date, "%Y-%m-%d")?)
            }
            other => Err(mismatch("NaiveDate", other)),
        }
    }
}

// ============================================================================
// hstore and arrays
// ============================================================================

impl_type!(BTreeMap<String, Option<String>>, OpenEdgeTypeInfo::varchar());

impl<'q> Encode<'q, OpenEdge> for BTreeMap<String, Option<String>> {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::HStore(self.clone()));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for BTreeMap<String, Option<String>> {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.data() {
            OpenEdgeValueData::HStore(map) => Ok(map.clone()),
            OpenEdgeValueData::Text(s) => match parse_hstore(s) {
                OpenEdgeValueData::HStore(map) => Ok(map),
                other => Err(mismatch("hstore", &other)),
            },
            other => Err(mismatch("hstore", other)),
        }
    }
}

impl_type!(Vec<String>, OpenEdgeTypeInfo::varchar());

impl<'q> Encode<'q, OpenEdge> for Vec<String> {
    fn encode_by_ref(&self, buf: &mut Buf<'q>) -> Result<IsNull, BoxDynError> {
        buf.push(OpenEdgeArgumentValue::TextArray(self.clone()));
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, OpenEdge> for Vec<String> {
    fn decode(value: OpenEdgeValueRef<'r>) -> Result<Self, BoxDynError> {
        let array = match value.data() {
            OpenEdgeValueData::Array(items) => Cow::Borrowed(items),
            OpenEdgeValueData::Text(s) => match parse_array(s, |m| OpenEdgeValueData::Text(m.to_owned())) {
                OpenEdgeValueData::Array(items) => Cow::Owned(items),
                other => return Err(mismatch("Vec<String>", &other)),
            },
            other => return Err(mismatch("Vec<String>", other)),
        };

        array
            .iter()
            .map(|item| match item {
                OpenEdgeValueData::Text(s) => Ok(s.clone()),
                other => Err(mismatch("String", other)),
            })
            .collect()
    }
}
