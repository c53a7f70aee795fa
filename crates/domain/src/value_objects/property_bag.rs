//! Open property bags attached to nodes, links and adventures.
//!
//! Authoring tools of different eras wrote the same setting under different
//! spellings (`background.navigation_style`, `background_navigation_style`,
//! `backgroundNavigationStyle`). [`PropertyBag::read`] tries a fixed list of
//! aliases and each dotted alias in its `_` and `-` forms; the alias lists
//! themselves live in [`super::prop_keys`].
//!
//! Every reader is lenient: malformed values fall back to "absent" or to a
//! documented default instead of failing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::NodeId;

/// A JSON object of loosely-typed authoring properties.
///
/// Deserializes from an object, from a JSON-encoded string holding an
/// object, or from anything else (which yields an empty bag).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.map(Self::from_value).unwrap_or_default())
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from an arbitrary JSON value, parsing JSON strings.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Self::default();
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Object(map)) => Self(map),
                    _ => Self::default(),
                }
            }
            _ => Self::default(),
        }
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A new bag with `other`'s entries layered over this one.
    pub fn merged(&self, other: &PropertyBag) -> PropertyBag {
        let mut map = self.0.clone();
        for (key, value) in &other.0 {
            map.insert(key.clone(), value.clone());
        }
        Self(map)
    }

    /// First value present under any alias (and its `_`/`-` variants).
    pub fn read(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| {
            if let Some(value) = self.0.get(*key) {
                return Some(value);
            }
            if !key.contains('.') {
                return None;
            }
            self.0
                .get(&key.replace('.', "_"))
                .or_else(|| self.0.get(&key.replace('.', "-")))
        })
    }

    pub fn tokens(&self, keys: &[&str]) -> Vec<String> {
        self.read(keys).map(tokenize).unwrap_or_default()
    }

    /// Tokens lower-cased, for case-insensitive flag lists.
    pub fn lowercase_tokens(&self, keys: &[&str]) -> Vec<String> {
        self.tokens(keys)
            .into_iter()
            .map(|token| token.to_lowercase())
            .collect()
    }

    pub fn first_string(&self, keys: &[&str]) -> Option<String> {
        self.read(keys).and_then(pick_first_string)
    }

    pub fn flag(&self, keys: &[&str]) -> bool {
        self.read(keys).is_some_and(boolean_from_tokens)
    }

    pub fn node_ids(&self, keys: &[&str]) -> Vec<NodeId> {
        self.read(keys).map(parse_node_id_list).unwrap_or_default()
    }
}

/// Stringify a JSON scalar the way a loose authoring tool would display it.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Split a value into trimmed, non-empty tokens.
///
/// Arrays are stringified item by item; strings split on commas and
/// whitespace; null yields nothing.
pub fn tokenize(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| value_to_string(item).trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let s = value_to_string(other);
            let s = s.trim();
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s.to_string()]
            }
        }
    }
}

/// A non-blank string, or the first non-blank string of an array, trimmed.
pub fn pick_first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }),
        _ => None,
    }
}

pub fn boolean_from_tokens(value: &Value) -> bool {
    tokenize(value).iter().any(|token| {
        matches!(
            token.to_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        )
    })
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a single node id from a number or a (`#`-prefixed) numeric string.
pub fn parse_node_id(value: &Value) -> Option<NodeId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(NodeId::new),
        Value::String(s) => {
            let cleaned = s.trim().trim_start_matches('#');
            if cleaned.is_empty() {
                return None;
            }
            cleaned
                .parse::<i64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().and_then(integral))
                .map(NodeId::new)
        }
        _ => None,
    }
}

/// Parse a node id list from an array, a separated string or a JSON array string.
pub fn parse_node_id_list(value: &Value) -> Vec<NodeId> {
    match value {
        Value::Array(items) => items.iter().filter_map(parse_node_id).collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            if trimmed.starts_with('[') {
                return serde_json::from_str::<Value>(trimmed)
                    .map(|parsed| parse_node_id_list(&parsed))
                    .unwrap_or_default();
            }
            trimmed
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|item| !item.is_empty())
                .filter_map(|item| parse_node_id(&Value::String(item.to_string())))
                .collect()
        }
        Value::Number(_) => parse_node_id(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Leading-number parse, tolerant of trailing junk (`"40%"` -> 40).
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, c) in s.char_indices() {
        match c {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Read an alpha/opacity percentage (0..=100).
///
/// Fractions written with a decimal point (`"0.5"`, `0.25`) are scaled by
/// 100; everything else is taken as a percentage and clamped.
pub fn alpha_percent(value: Option<&Value>, fallback: f64) -> f64 {
    let primary = match value {
        None | Some(Value::Null) => return fallback,
        Some(Value::Array(items)) => match items.first() {
            Some(first) => first,
            None => return fallback,
        },
        Some(other) => other,
    };
    let (numeric, has_decimal) = match primary {
        Value::Number(n) => match n.as_f64() {
            Some(f) => (f, f.fract() != 0.0),
            None => return fallback,
        },
        Value::String(s) => match parse_float_prefix(s) {
            Some(f) => (f, s.contains('.')),
            None => return fallback,
        },
        _ => return fallback,
    };
    if !numeric.is_finite() {
        return fallback;
    }
    if (0.0..=1.0).contains(&numeric) && has_decimal {
        return (numeric * 100.0).clamp(0.0, 100.0);
    }
    numeric.clamp(0.0, 100.0)
}
