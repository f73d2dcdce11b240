// ============================================================================
// Validation Engine
// ============================================================================
//
// For every row × column-with-rules:
//   1. required and empty      → issue, stop
//   2. empty                   → stop
//   3. the rule chain          → every violation is reported
//
// No short-circuiting across cells: the report covers the whole row set.
//
// ============================================================================

use super::rules::{AllowedRule, CellContext, CellRule, LengthRule, PatternRule, RangeRule};
use super::{RuleKind, ValidationIssue, ValidationReport};
use crate::core::{Column, Row};
use regex::Regex;
use std::collections::HashMap;

pub struct ValidationEngine {
    rules: Vec<Box<dyn CellRule>>,
}

impl ValidationEngine {
    /// Engine with the standard rule chain
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(LengthRule),
                Box::new(PatternRule),
                Box::new(RangeRule),
                Box::new(AllowedRule),
            ],
        }
    }

    /// Engine with a custom rule chain
    pub fn with_rules(rules: Vec<Box<dyn CellRule>>) -> Self {
        Self { rules }
    }

    pub fn validate(&self, rows: &[Row], columns: &[Column]) -> ValidationReport {
        let checked: Vec<&Column> = columns.iter().filter(|c| c.rules.is_some()).collect();

        let mut patterns: HashMap<&str, Result<Regex, String>> = HashMap::new();
        for column in &checked {
            if let Some(pattern) = column.rules.as_ref().and_then(|r| r.pattern.as_deref()) {
                patterns
                    .entry(pattern)
                    .or_insert_with(|| Regex::new(pattern).map_err(|e| e.to_string()));
            }
        }

        let mut issues = Vec::new();
        let mut violations = Vec::new();

        for row in rows {
            for column in &checked {
                let Some(rules) = column.rules.as_ref() else {
                    continue;
                };
                let value = row.get(&column.name);

                let issue = |rule: RuleKind, message: String| ValidationIssue {
                    row_id: row.id.clone(),
                    column: column.name.clone(),
                    rule,
                    message,
                    severity: rules.severity,
                };

                if value.is_empty() {
                    if rules.required {
                        issues.push(issue(RuleKind::Required, "required field empty".to_string()));
                    }
                    continue;
                }

                let ctx = CellContext {
                    column,
                    rules,
                    pattern: rules.pattern.as_deref().and_then(|p| patterns.get(p)),
                };

                violations.clear();
                for rule in &self.rules {
                    rule.check(value, &ctx, &mut violations);
                }
                issues.extend(violations.drain(..).map(|(rule, message)| issue(rule, message)));
            }
        }

        ValidationReport::from_issues(issues)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Severity, ValidationRules, Value};

    fn age_column() -> Column {
        Column::new("age", DataType::Integer).with_rules(ValidationRules::new().range(Some(0.0), Some(120.0)))
    }

    fn validate_age(value: impl Into<Value>) -> ValidationReport {
        let rows = vec![Row::new("r1").with("age", value)];
        ValidationEngine::new().validate(&rows, &[age_column()])
    }

    #[test]
    fn test_range_bounds() {
        let below = validate_age(-5i64);
        assert_eq!(below.issues.len(), 1);
        assert_eq!(below.issues[0].rule, RuleKind::MinValue);
        assert!(below.issues[0].message.contains("minimum"));

        let above = validate_age(200i64);
        assert_eq!(above.issues.len(), 1);
        assert!(above.issues[0].message.contains("maximum"));

        let ok = validate_age(40i64);
        assert!(ok.is_valid);
        assert!(ok.issues.is_empty());
    }

    #[test]
    fn test_numeric_text_is_coerced_and_garbage_skipped() {
        assert_eq!(validate_age("130").issues.len(), 1);
        assert!(validate_age("unknown").is_valid);
    }

    #[test]
    fn test_required_and_empty_skip() {
        let columns = vec![
            Column::new("email", DataType::String)
                .with_rules(ValidationRules::new().required().pattern(r"^\S+@\S+$")),
            Column::new("nick", DataType::String)
                .with_rules(ValidationRules::new().length(Some(3), None)),
        ];
        let rows = vec![Row::new("r1").with("email", "").with("nick", Value::Null)];

        let report = ValidationEngine::new().validate(&rows, &columns);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule, RuleKind::Required);
        assert_eq!(report.issues[0].message, "required field empty");
    }

    #[test]
    fn test_string_rules_accumulate() {
        let columns = vec![Column::new("code", DataType::String).with_rules(
            ValidationRules::new().length(None, Some(3)).pattern("^[A-Z]+$"),
        )];
        let rows = vec![Row::new("r1").with("code", "abcd")];

        let report = ValidationEngine::new().validate(&rows, &columns);
        let kinds: Vec<RuleKind> = report.issues.iter().map(|i| i.rule).collect();
        assert_eq!(kinds, vec![RuleKind::MaxLength, RuleKind::Pattern]);
    }

    #[test]
    fn test_allowed_values_match_typed_or_text() {
        let columns = vec![Column::new("level", DataType::Integer)
            .with_rules(ValidationRules::new().allowed(vec![1i64.into(), "2".into()]))];
        let rows = vec![
            Row::new("a").with("level", 1i64),
            Row::new("b").with("level", 2i64),
            Row::new("c").with("level", 3i64),
        ];

        let report = ValidationEngine::new().validate(&rows, &columns);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.issues[0].row_id.as_str(), "c");
    }

    #[test]
    fn test_severity_comes_from_rules() {
        let columns = vec![Column::new("note", DataType::String)
            .with_rules(ValidationRules::new().length(None, Some(2)).severity(Severity::Warning))];
        let rows = vec![Row::new("r1").with("note", "long")];

        let report = ValidationEngine::new().validate(&rows, &columns);
        assert!(report.is_valid);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let columns = vec![Column::new("x", DataType::String)
            .with_rules(ValidationRules::new().pattern("(unclosed"))];
        let rows = vec![Row::new("r1").with("x", "value")];

        let report = ValidationEngine::new().validate(&rows, &columns);
        assert!(!report.is_valid);
        assert!(report.issues[0].message.contains("not a valid regular expression"));
    }
}
