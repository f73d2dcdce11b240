//! Row predicates for active filters.
//!
//! Text operators are case-insensitive and work on the string form of the
//! cell. Ordering operators coerce both sides to numbers; a side that does
//! not coerce never matches.

use super::{Filter, FilterOp};
use crate::core::{Row, Value};

impl Filter {
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(&self.column);

        match self.operation {
            FilterOp::Equals => values_equal(cell, &self.value),
            FilterOp::Contains => lowered(cell).contains(&lowered(&self.value)),
            FilterOp::StartsWith => lowered(cell).starts_with(&lowered(&self.value)),
            FilterOp::EndsWith => lowered(cell).ends_with(&lowered(&self.value)),
            FilterOp::GreaterThan => numeric_pair(cell, &self.value).is_some_and(|(a, b)| a > b),
            FilterOp::LessThan => numeric_pair(cell, &self.value).is_some_and(|(a, b)| a < b),
        }
    }
}

/// A row passes when every filter matches.
pub fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

fn values_equal(cell: &Value, expected: &Value) -> bool {
    if cell == expected {
        return true;
    }
    // Filter values usually arrive as text from the UI
    !cell.is_null() && cell.to_text() == expected.to_text()
}

fn lowered(value: &Value) -> String {
    value.to_text().to_lowercase()
}

fn numeric_pair(cell: &Value, expected: &Value) -> Option<(f64, f64)> {
    Some((cell.as_f64()?, expected.as_f64()?))
}
