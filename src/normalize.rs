//! Response-shape normalization.
//!
//! The API answers with whatever envelope each PHP endpoint happens to use.
//! [`normalize`] folds all of them into one [`Normalized`] value so that page
//! loaders only ever deal with "a list", "one record" or "nothing, because…":
//!
//! | Upstream shape                          | Normalized            |
//! |-----------------------------------------|-----------------------|
//! | `[ {..}, {..} ]`                        | `Items`               |
//! | `[]`                                    | `NoData`              |
//! | `{success: true, data: [..]}`           | `Items` / `NoData`    |
//! | `{success: true, data: {..}}`           | `Single`              |
//! | `{success: true}` / `data: null`        | `NoData`              |
//! | `{success: false, error: ".."}`         | `NoData(server text)` |
//! | `{..}` without a `success` key          | `Single`              |
//! | a bare scalar or `null`                 | error                 |
//!
//! Field aliasing (`name` vs `link_name`, `image` vs `lab_image` …) is handled
//! at the record level: typed page models list their [`Aliases`] and decode
//! through [`decode_with`], untyped records use [`pick`].  Rows often carry
//! several aliases at once (`SELECT *`), so the first non-empty one wins.  The [`lenient`] module carries the serde
//! helpers for PHP's habit of sending numbers and flags as strings.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::fetch::FetchError;

/// Reason used when the server gives no data and no explanation.
pub const NO_RECORDS: &str = "No records found";

/// Fallback reason for a `{success: false}` envelope without a message.
pub const SERVER_DECLINED: &str = "The server did not return any data";

/// A response reduced to one of the three shapes pages understand.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// An ordered, non-empty list of records.
    Items(Vec<Value>),
    /// Exactly one record.
    Single(Value),
    /// No data, with a human-readable reason.
    NoData(String),
}

impl Normalized {
    /// Every record, whatever the shape.  `NoData` yields an empty list.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Normalized::Items(items) => items,
            Normalized::Single(item) => vec![item],
            Normalized::NoData(_) => Vec::new(),
        }
    }

    /// The first record: endpoints that return a one-element array for a
    /// single entity are read this way.
    pub fn into_first(self) -> Option<Value> {
        match self {
            Normalized::Items(items) => items.into_iter().next(),
            Normalized::Single(item) => Some(item),
            Normalized::NoData(_) => None,
        }
    }

    pub fn no_data_reason(&self) -> Option<&str> {
        match self {
            Normalized::NoData(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Fold a decoded response body into a [`Normalized`] value.
///
/// Never fails for a recognized envelope; bare scalars and `null` are
/// reported as [`FetchError::Shape`].
pub fn normalize(raw: Value) -> Result<Normalized, FetchError> {
    match raw {
        Value::Array(items) => Ok(from_list(items)),
        Value::Object(mut map) => match map.get("success") {
            Some(flag) if truthy(flag) => from_data(map.remove("data")),
            Some(_) => Ok(Normalized::NoData(failure_reason(&map))),
            None => Ok(Normalized::Single(Value::Object(map))),
        },
        other => Err(FetchError::Shape(format!(
            "expected an array or an object, got {}",
            describe(&other)
        ))),
    }
}

/// Interpret the response to a write (form submission).
///
/// `Ok` carries the server's confirmation text, `Err` its refusal.  A body
/// without a `success` flag counts as accepted.
pub fn acknowledgement(raw: &Value) -> Result<String, String> {
    const ACCEPTED: &str = "Submitted";
    let Some(map) = raw.as_object() else {
        return Ok(ACCEPTED.to_string());
    };
    match map.get("success") {
        Some(flag) if !truthy(flag) => Err(failure_reason(map)),
        _ => Ok(non_empty_str(map, &["message", "msg"]).unwrap_or_else(|| ACCEPTED.to_string())),
    }
}

/// Deserialize one record into a page model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::Transform(e.to_string()))
}

/// Deserialize every record; the first bad record fails the lot.
pub fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, FetchError> {
    items.into_iter().map(decode).collect()
}

/// Canonical field names, each with the other keys endpoints use for it.
pub type Aliases = &'static [(&'static str, &'static [&'static str])];

/// Fold every alias key into its canonical field.
///
/// The canonical key is tried first, then the aliases in order; the first
/// value that is neither `null` nor a blank string wins.  When all of them
/// are empty the first one present is kept, so a required field still
/// reports what the server actually sent.
pub fn unalias(value: Value, aliases: Aliases) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    for (field, others) in aliases {
        let found: Vec<Value> = std::iter::once(*field)
            .chain(others.iter().copied())
            .filter_map(|key| map.remove(key))
            .collect();
        let chosen = match found.iter().position(is_filled) {
            Some(i) => found.into_iter().nth(i),
            None => found.into_iter().next(),
        };
        if let Some(chosen) = chosen {
            map.insert((*field).to_string(), chosen);
        }
    }
    Value::Object(map)
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// [`decode`] after resolving `aliases`.
pub fn decode_with<T: DeserializeOwned>(value: Value, aliases: Aliases) -> Result<T, FetchError> {
    decode(unalias(value, aliases))
}

/// [`decode_items`] after resolving `aliases` on each record.
pub fn decode_items_with<T: DeserializeOwned>(items: Vec<Value>, aliases: Aliases) -> Result<Vec<T>, FetchError> {
    items.into_iter().map(|item| decode_with(item, aliases)).collect()
}

/// First non-empty value found under any of `aliases`.
///
/// Strings are trimmed; numbers are rendered as text.
pub fn pick(item: &Value, aliases: &[&str]) -> Option<String> {
    let map = item.as_object()?;
    aliases.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn from_list(items: Vec<Value>) -> Normalized {
    if items.is_empty() {
        Normalized::NoData(NO_RECORDS.to_string())
    } else {
        Normalized::Items(items)
    }
}

fn from_data(data: Option<Value>) -> Result<Normalized, FetchError> {
    match data {
        None | Some(Value::Null) => Ok(Normalized::NoData(NO_RECORDS.to_string())),
        Some(Value::Array(items)) => Ok(from_list(items)),
        Some(Value::Object(map)) if map.is_empty() => Ok(Normalized::NoData(NO_RECORDS.to_string())),
        Some(object @ Value::Object(_)) => Ok(Normalized::Single(object)),
        Some(other) => Err(FetchError::Shape(format!(
            "envelope data is {}",
            describe(&other)
        ))),
    }
}

fn failure_reason(map: &Map<String, Value>) -> String {
    non_empty_str(map, &["error", "message", "msg"]).unwrap_or_else(|| SERVER_DECLINED.to_string())
}

fn non_empty_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

/// PHP sends flags as `true`, `1`, `"1"` or `"true"` depending on the endpoint.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `deserialize_with` helpers tolerant of PHP's loose typing.
pub mod lenient {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// A string or a number, as text.  Empty strings become `None`.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// An integer sent as a number or a numeric string.
    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// A boolean flag; absent means `true` (records are active unless told otherwise).
    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => true,
            Some(v) => super::truthy(&v),
        })
    }

    /// A calendar date in any of the formats the backend produces.
    /// Unparseable dates degrade to `None`.
    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => parse_date(&s),
            _ => None,
        })
    }

    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.date());
        }
        ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }
}
