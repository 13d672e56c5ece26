//! Binary parameter encoding for [`SqlValue`].
//!
//! Statement parameters are typed by the server from the destination
//! columns, so each value is encoded for the column it lands in rather than
//! for the type it was read as. This covers the usual MySQL to PostgreSQL
//! differences: integer widths, 0/1 flags stored in boolean columns, JSON
//! kept as text, and naive timestamps written to `timestamptz`.

use std::error::Error;

use bytes::{BufMut, BytesMut};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, Kind, ToSql, Type};
use uuid::Uuid;

use crate::core::value::SqlValue;

type BoxError = Box<dyn Error + Sync + Send>;
type EncodeResult = std::result::Result<IsNull, BoxError>;

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> EncodeResult {
        match self {
            SqlValue::Null(_) => Ok(IsNull::Yes),
            SqlValue::Bool(v) => encode_bool(self, *v, ty, out),
            SqlValue::I16(v) => encode_int(self, i64::from(*v), ty, out),
            SqlValue::I32(v) => encode_int(self, i64::from(*v), ty, out),
            SqlValue::I64(v) => encode_int(self, *v, ty, out),
            SqlValue::F32(v) if *ty == Type::FLOAT4 => v.to_sql(ty, out),
            SqlValue::F32(v) => encode_float(self, f64::from(*v), ty, out),
            SqlValue::F64(v) => encode_float(self, *v, ty, out),
            SqlValue::Text(v) => encode_text(self, v, ty, out),
            SqlValue::Bytes(v) => encode_bytes(self, v, ty, out),
            SqlValue::Decimal(v) => encode_decimal(self, v, ty, out),
            SqlValue::DateTime(v) => encode_datetime(self, v, ty, out),
            SqlValue::Date(v) => encode_date(self, v, ty, out),
            SqlValue::Time(v) => encode_time(self, v, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Compatibility is decided per value in to_sql.
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &SqlValue, ty: &Type) -> EncodeResult {
    Err(format!("cannot encode {} value as PostgreSQL {}", value.kind(), ty).into())
}

fn is_text_like(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
        || ty.name() == "citext"
}

/// Text wire format for text, enum, json and jsonb columns.
fn write_text(s: &str, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if *ty == Type::JSONB {
        // jsonb binary format version
        out.put_u8(1);
    }
    out.put_slice(s.as_bytes());
    Ok(IsNull::No)
}

fn accepts_text(ty: &Type) -> bool {
    is_text_like(ty) || *ty == Type::JSON || *ty == Type::JSONB
}

fn encode_bool(value: &SqlValue, v: bool, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::BOOL => v.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 => encode_int(value, i64::from(v), ty, out),
        _ if is_text_like(ty) => write_text(if v { "true" } else { "false" }, ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_int(value: &SqlValue, v: i64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::BOOL => match v {
            0 => false.to_sql(ty, out),
            1 => true.to_sql(ty, out),
            _ => Err(format!("integer {} is not a boolean flag", v).into()),
        },
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        _ if accepts_text(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_float(value: &SqlValue, v: f64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(v)?.to_sql(ty, out),
        _ if is_text_like(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_decimal(value: &SqlValue, v: &Decimal, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::NUMERIC => v.to_sql(ty, out),
        Type::FLOAT4 | Type::FLOAT8 => match v.to_f64() {
            Some(f) => encode_float(value, f, ty, out),
            None => mismatch(value, ty),
        },
        Type::INT2 | Type::INT4 | Type::INT8 | Type::BOOL if v.fract().is_zero() => {
            match v.to_i64() {
                Some(i) => encode_int(value, i, ty, out),
                None => mismatch(value, ty),
            }
        }
        _ if is_text_like(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_text(value: &SqlValue, s: &str, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        _ if accepts_text(ty) => write_text(s, ty, out),
        Type::BOOL => match s.trim().to_lowercase().as_str() {
            "1" | "t" | "true" | "y" | "yes" => true.to_sql(ty, out),
            "0" | "f" | "false" | "n" | "no" => false.to_sql(ty, out),
            other => Err(format!("'{}' is not a boolean", other).into()),
        },
        Type::INT2 | Type::INT4 | Type::INT8 => {
            encode_int(value, s.trim().parse::<i64>()?, ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => encode_float(value, s.trim().parse::<f64>()?, ty, out),
        Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql(ty, out),
        Type::UUID => Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => {
            let ts = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")?;
            encode_datetime(value, &ts, ty, out)
        }
        Type::DATE => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_bytes(value: &SqlValue, b: &[u8], ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::BYTEA => b.to_sql(ty, out),
        Type::UUID if b.len() == 16 => Uuid::from_slice(b)?.to_sql(ty, out),
        _ if accepts_text(ty) => write_text(std::str::from_utf8(b)?, ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_datetime(
    value: &SqlValue,
    v: &NaiveDateTime,
    ty: &Type,
    out: &mut BytesMut,
) -> EncodeResult {
    match *ty {
        Type::TIMESTAMP => v.to_sql(ty, out),
        // Source timestamps carry no zone; they are taken as UTC.
        Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
        Type::DATE => v.date().to_sql(ty, out),
        Type::TIME => v.time().to_sql(ty, out),
        _ if is_text_like(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_date(value: &SqlValue, v: &NaiveDate, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::DATE => v.to_sql(ty, out),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => {
            encode_datetime(value, &v.and_time(NaiveTime::MIN), ty, out)
        }
        _ if is_text_like(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}

fn encode_time(value: &SqlValue, v: &NaiveTime, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match *ty {
        Type::TIME => v.to_sql(ty, out),
        _ if is_text_like(ty) => write_text(&v.to_string(), ty, out),
        _ => mismatch(value, ty),
    }
}
