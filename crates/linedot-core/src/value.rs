//! Host cell values and best-effort date coercion

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PRIMITIVE VALUE
// ============================================================================

/// A single cell delivered by the host data view.
///
/// Deserialization is untagged: `null`, booleans, numbers, RFC 3339 strings
/// (as dates) and any other string (as text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PrimitiveValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl PrimitiveValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Host scripting truthiness: null, false, 0, NaN and "" are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Date(_) => true,
            Self::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Epoch milliseconds for dates, the raw number for numbers
    pub fn as_millis_or_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Replace a parseable string with a date, leave everything else untouched
    pub fn coerce_date(self) -> Self {
        match self {
            Self::Text(s) => match parse_date(&s) {
                Some(date) => Self::Date(date),
                None => Self::Text(s),
            },
            other => other,
        }
    }

    /// True when this value is a date or a string that parses as one
    pub fn looks_like_date(&self) -> bool {
        match self {
            Self::Date(_) => true,
            Self::Text(s) => parse_date(s).is_some(),
            _ => false,
        }
    }
}

impl std::fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => f.write_str(&display_number(*n)),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PrimitiveValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for PrimitiveValue {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

/// Number rendering that matches the host: integral values carry no fraction
pub fn display_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// VALUE TYPE DESCRIPTOR
// ============================================================================

/// Declared column type, as described by host metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Text,
    Bool,
    Numeric,
    Integer,
    DateTime,
}

impl ValueType {
    pub fn is_date_time(&self) -> bool {
        matches!(self, Self::DateTime)
    }

    /// Infer a type from an observed cell
    pub fn infer(value: &PrimitiveValue) -> Option<Self> {
        match value {
            PrimitiveValue::Null => None,
            PrimitiveValue::Bool(_) => Some(Self::Bool),
            PrimitiveValue::Number(_) => Some(Self::Numeric),
            PrimitiveValue::Date(_) => Some(Self::DateTime),
            PrimitiveValue::Text(_) => Some(Self::Text),
        }
    }
}

// ============================================================================
// DATE PARSING
// ============================================================================

const DATE_TIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_PATTERNS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Best-effort date parse; `None` means "not a date", never an error
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for pattern in DATE_TIME_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(s, pattern) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Date from epoch milliseconds (out-of-range values clamp to the epoch)
pub fn date_from_millis(ms: f64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
