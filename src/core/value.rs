use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use crate::core::{GridError, Result};

/// A single cell value, tagged by the kind of data it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Total ordering used for sorting. NULL handling is the caller's job,
    /// here NULL simply sorts after everything else.
    ///
    /// Values that read as numbers (numeric text included) come first, in
    /// numeric order; everything else follows, grouped by variant. Ties are
    /// broken by variant and then within the variant, so mixed columns still
    /// sort consistently.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return Ordering::Greater,
            (_, Value::Null) => return Ordering::Less,
            _ => {}
        }

        let by_number = match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_number
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| self.compare_same_variant(other))
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Integer(_) => 0,
            Self::Decimal(_) => 1,
            Self::Text(_) => 2,
            Self::Boolean(_) => 3,
            Self::Date(_) => 4,
            Self::Timestamp(_) => 5,
            Self::Null => 6,
        }
    }

    fn compare_same_variant(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Text(_) => "TEXT",
            Self::Integer(_) => "INTEGER",
            Self::Decimal(_) => "DECIMAL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Date(_) => "DATE",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    /// Numeric view of the value. Numeric text is coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(f) => Some(*f),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// NULL or the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    /// String representation used by text filters and enum matching; NULL is "".
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            // Exact, no tolerance
            (Self::Decimal(a), Self::Decimal(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Integer(i), Self::Decimal(f)) | (Self::Decimal(f), Self::Integer(i)) => *i as f64 == *f,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Decimal(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    Timestamp,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::Text(_)) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Decimal, Value::Decimal(_)) => true,
            (Self::Decimal, Value::Integer(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            _ => false,
        }
    }

    /// Parse raw grid input into a value of this type. Empty input is NULL.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }

        let mismatch = || GridError::InvalidParameter(format!("'{}' is not a valid {}", raw, self));

        match self {
            Self::String => Ok(Value::Text(raw.to_string())),
            Self::Integer => trimmed.parse::<i64>().map(Value::Integer).map_err(|_| mismatch()),
            Self::Decimal => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Decimal)
                .ok_or_else(mismatch),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Boolean(true)),
                "false" | "no" | "0" => Ok(Value::Boolean(false)),
                _ => Err(mismatch()),
            },
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| mismatch()),
            Self::Timestamp => DateTime::parse_from_rfc3339(trimmed)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| mismatch()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "STRING"),
            Self::Integer => write!(f, "INTEGER"),
            Self::Decimal => write!(f, "DECIMAL"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Integer(3), Value::Decimal(3.0));
        assert_ne!(Value::Text("1".into()), Value::Integer(1));
        assert_ne!(Value::Null, Value::Text(String::new()));
    }

    #[test]
    fn test_value_ordering() {
        assert_eq!(Value::Integer(1).compare(&Value::Decimal(1.5)), Ordering::Less);
        assert_eq!(Value::Text("b".into()).compare(&Value::Text("a".into())), Ordering::Greater);
        assert_eq!(Value::Null.compare(&Value::Integer(0)), Ordering::Greater);
    }

    #[test]
    fn test_tiny_decimal_difference_is_not_equal() {
        assert_ne!(Value::Decimal(1e-17), Value::Decimal(0.0));
        assert_ne!(Value::Integer(0), Value::Decimal(1e-17));
        assert_eq!(Value::Decimal(0.1 + 0.2), Value::Decimal(0.1 + 0.2));
    }

    #[test]
    fn test_mixed_ordering_is_consistent() {
        let samples = vec![
            Value::Integer(2),
            Value::Integer(10),
            Value::Text("15".into()),
            Value::Text("9".into()),
            Value::Text("abc".into()),
            Value::Decimal(2.0),
            Value::Decimal(f64::NAN),
            Value::Boolean(true),
            Value::Text("2".into()),
        ];

        assert_eq!(Value::Integer(2).compare(&Value::Integer(10)), Ordering::Less);
        assert_eq!(Value::Integer(10).compare(&Value::Text("15".into())), Ordering::Less);
        assert_eq!(Value::Text("15".into()).compare(&Value::Integer(2)), Ordering::Greater);
        assert_eq!(Value::Text("9".into()).compare(&Value::Text("abc".into())), Ordering::Less);

        for a in &samples {
            assert_eq!(a.compare(a), Ordering::Equal);
            for b in &samples {
                assert_eq!(a.compare(b), b.compare(a).reverse());
                for c in &samples {
                    if a.compare(b) != Ordering::Greater && b.compare(c) != Ordering::Greater {
                        assert_ne!(a.compare(c), Ordering::Greater, "{:?} {:?} {:?}", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Boolean(true).as_f64(), None);
    }

    #[test]
    fn test_parse_by_declared_type() {
        assert_eq!(DataType::Integer.parse("42").unwrap(), Value::Integer(42));
        assert_eq!(DataType::Boolean.parse("Yes").unwrap(), Value::Boolean(true));
        assert_eq!(DataType::Decimal.parse("  ").unwrap(), Value::Null);
        assert!(DataType::Date.parse("2024-13-01").is_err());
        assert!(DataType::Integer.parse("4.2").is_err());
    }

    #[test]
    fn test_type_compatibility() {
        assert!(DataType::Decimal.is_compatible(&Value::Integer(1)));
        assert!(DataType::String.is_compatible(&Value::Null));
        assert!(!DataType::Integer.is_compatible(&Value::Text("1".into())));
    }
}
