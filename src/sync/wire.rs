//! Serde adapters for rows as the remote store emits them.
//!
//! Numeric columns arrive either as JSON numbers or as numeric strings, flags as
//! `0`/`1` in either form, and unset dates as `""` or `0000-00-00`. Each adapter
//! accepts every form on the way in and writes the canonical one on the way out.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serializer};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Scalar>, D::Error> {
    Option::<Scalar>::deserialize(d)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M"))
        .ok()
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn format_time(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Integer column, `"12"` or `12`; null and empty read as 0.
pub mod int {
    use super::*;

    pub fn serialize<S: Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match scalar(d)? {
            None => Ok(0),
            Some(Scalar::Int(n)) => Ok(n),
            Some(Scalar::Float(f)) => Ok(f as i64),
            Some(Scalar::Bool(b)) => Ok(b as i64),
            Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(0),
            Some(Scalar::Text(s)) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("not an integer: {s:?}"))),
        }
    }
}

fn scalar_int<E: serde::de::Error>(v: Scalar) -> Result<Option<i64>, E> {
    match v {
        Scalar::Int(n) => Ok(Some(n)),
        Scalar::Float(f) => Ok(Some(f as i64)),
        Scalar::Bool(_) => Err(E::custom("expected an integer, got a boolean")),
        Scalar::Text(s) if s.trim().is_empty() => Ok(None),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| E::custom(format!("not an integer: {s:?}"))),
    }
}

/// Optional integer; null and empty are absent.
pub mod opt_int {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(n) => s.serialize_i64(*n),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match scalar(d)? {
            None => Ok(None),
            Some(v) => scalar_int(v),
        }
    }
}

/// List of integers in either encoding; null reads as empty.
pub mod int_list {
    use super::*;

    pub fn serialize<S: Serializer>(v: &[i64], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        let raw = Option::<Vec<Scalar>>::deserialize(d)?.unwrap_or_default();
        let mut out = Vec::with_capacity(raw.len());
        for v in raw {
            if let Some(n) = scalar_int(v)? {
                out.push(n);
            }
        }
        Ok(out)
    }
}

/// `0|1` flag column.
pub mod flag {
    use super::*;

    pub fn serialize<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match scalar(d)? {
            None => false,
            Some(Scalar::Int(n)) => n != 0,
            Some(Scalar::Float(f)) => f != 0.0,
            Some(Scalar::Bool(b)) => b,
            Some(Scalar::Text(s)) => !matches!(s.trim(), "" | "0" | "false"),
        })
    }
}

/// Free text column; numbers are stringified and null reads as empty.
pub mod text {
    use super::*;

    pub fn serialize<S: Serializer>(v: &str, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar(d)?.map(Scalar::into_text).unwrap_or_default())
    }
}

pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(v: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_date(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad date: {raw:?}")))
    }
}

/// Optional date; `""`, null and `0000-00-00` are absent.
pub mod opt_date {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_str(&format_date(*d)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(scalar(d)?.and_then(|v| parse_date(&v.into_text())))
    }
}

pub mod time {
    use super::*;

    pub fn serialize<S: Serializer>(v: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_time(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = scalar(d)?.map(Scalar::into_text).unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(NaiveTime::MIN);
        }
        parse_time(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad time: {raw:?}")))
    }
}

pub mod datetime {
    use super::*;

    pub fn serialize<S: Serializer>(v: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_datetime(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_datetime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("bad datetime: {raw:?}")))
    }
}
