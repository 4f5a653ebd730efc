//! Field deserializers for model-written JSON, which is loosely typed:
//! quantities arrive as `null`, `"2"` or `"1 head"`, categories as `null`.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

static LEADING_NUMBER_RE: OnceLock<Regex> = OnceLock::new();

/// Number from a JSON number or the leading number of a string
/// (`"1.5 lb"`, `"$3.99"`). Anything else is `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let re = LEADING_NUMBER_RE.get_or_init(|| {
                Regex::new(r"^\s*\$?\s*(\d+(?:\.\d+)?|\.\d+)").expect("number regex is valid")
            });
            re.captures(s).and_then(|caps| caps[1].parse().ok())
        }
        _ => None,
    }
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

/// Whole count such as servings or minutes, rounded; unreadable is `None`.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32))
}

/// Quantity that falls back to 1 when missing or unreadable.
pub fn quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?
        .filter(|q| q.is_finite() && *q > 0.0)
        .unwrap_or(1.0))
}

/// Text that reads `null` and non-strings as empty, or as their JSON text.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Any value the target type can't read becomes its default.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// List that drops (and logs) entries the element type can't read.
pub fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => vec![other],
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("dropping unreadable entry {}: {}", entry, e);
                None
            }
        })
        .collect())
}
