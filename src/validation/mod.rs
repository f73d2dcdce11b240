//! Declarative per-column validation.
//!
//! - `engine.rs` - walks rows × ruled columns and builds the report
//! - `rules.rs`  - the cell rule chain (length, pattern, range, allowed values)
//! - `report.rs` - issues and the aggregated report

mod engine;
mod report;
mod rules;

pub use engine::ValidationEngine;
pub use report::{RuleKind, ValidationIssue, ValidationReport};
pub use rules::{AllowedRule, CellContext, CellRule, LengthRule, PatternRule, RangeRule};
