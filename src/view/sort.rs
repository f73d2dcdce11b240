// ============================================================================
// Row Sorting
// ============================================================================
//
// - Stable sort (rows with equal keys keep their relative order)
// - NULLS LAST for ascending, NULLS FIRST for descending
// - Mixed types compare by their string form (see `Value::compare`)
//
// ============================================================================

use super::SortSpec;
use crate::core::{Row, Value};
use std::cmp::Ordering;

/// Strategy for handling NULL values during sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    NullsFirst,
    NullsLast,
}

impl NullOrdering {
    /// - ascending → NULLS LAST
    /// - descending → NULLS FIRST
    pub fn default_for_direction(descending: bool) -> Self {
        if descending {
            Self::NullsFirst
        } else {
            Self::NullsLast
        }
    }
}

/// Compare two cell values for a single sort key.
pub fn compare_values(a: &Value, b: &Value, descending: bool, nulls: NullOrdering) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => match nulls {
            NullOrdering::NullsFirst => Ordering::Less,
            NullOrdering::NullsLast => Ordering::Greater,
        },
        (false, true) => match nulls {
            NullOrdering::NullsFirst => Ordering::Greater,
            NullOrdering::NullsLast => Ordering::Less,
        },
        (false, false) => {
            let ord = a.compare(b);
            if descending { ord.reverse() } else { ord }
        }
    }
}

pub fn sort_rows(rows: &mut [Row], spec: &SortSpec) {
    let descending = spec.direction.is_descending();
    let nulls = NullOrdering::default_for_direction(descending);

    rows.sort_by(|a, b| compare_values(a.get(&spec.column), b.get(&spec.column), descending, nulls));
}
