//! Per-cell checks, applied in order after the required/empty gate.

use super::RuleKind;
use crate::core::{Column, DataType, ValidationRules, Value};
use regex::Regex;

/// What a rule sees for one non-empty cell.
pub struct CellContext<'a> {
    pub column: &'a Column,
    pub rules: &'a ValidationRules,
    /// Compiled `rules.pattern`, or the compile error
    pub pattern: Option<&'a Result<Regex, String>>,
}

/// Trait for cell rules (Chain of Responsibility). Every rule in the chain
/// runs; violations accumulate.
pub trait CellRule: Send + Sync {
    fn check(&self, value: &Value, ctx: &CellContext<'_>, out: &mut Vec<(RuleKind, String)>);
}

/// minLength / maxLength for string columns
#[derive(Debug, Clone, Default)]
pub struct LengthRule;

impl CellRule for LengthRule {
    fn check(&self, value: &Value, ctx: &CellContext<'_>, out: &mut Vec<(RuleKind, String)>) {
        if ctx.column.data_type != DataType::String {
            return;
        }
        let len = value.to_text().chars().count();

        if let Some(min) = ctx.rules.min_length {
            if len < min {
                out.push((
                    RuleKind::MinLength,
                    format!("length {} is shorter than the minimum length of {}", len, min),
                ));
            }
        }
        if let Some(max) = ctx.rules.max_length {
            if len > max {
                out.push((
                    RuleKind::MaxLength,
                    format!("length {} exceeds the maximum length of {}", len, max),
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternRule;

impl CellRule for PatternRule {
    fn check(&self, value: &Value, ctx: &CellContext<'_>, out: &mut Vec<(RuleKind, String)>) {
        if ctx.column.data_type != DataType::String {
            return;
        }
        let (Some(pattern), Some(compiled)) = (&ctx.rules.pattern, ctx.pattern) else {
            return;
        };

        match compiled {
            Ok(re) => {
                let text = value.to_text();
                if !re.is_match(&text) {
                    out.push((
                        RuleKind::Pattern,
                        format!("value '{}' does not match pattern '{}'", text, pattern),
                    ));
                }
            }
            Err(err) => out.push((
                RuleKind::Pattern,
                format!("pattern '{}' is not a valid regular expression: {}", pattern, err),
            )),
        }
    }
}

/// minValue / maxValue for numeric columns; non-numeric values are skipped
#[derive(Debug, Clone, Default)]
pub struct RangeRule;

impl CellRule for RangeRule {
    fn check(&self, value: &Value, ctx: &CellContext<'_>, out: &mut Vec<(RuleKind, String)>) {
        if !ctx.column.data_type.is_numeric() {
            return;
        }
        let Some(number) = value.as_f64() else {
            return;
        };

        if let Some(min) = ctx.rules.min_value {
            if number < min {
                out.push((
                    RuleKind::MinValue,
                    format!("value {} is below the minimum of {}", number, min),
                ));
            }
        }
        if let Some(max) = ctx.rules.max_value {
            if number > max {
                out.push((
                    RuleKind::MaxValue,
                    format!("value {} exceeds the maximum of {}", number, max),
                ));
            }
        }
    }
}

/// Allowed values; a cell matches by typed equality or by its string form.
#[derive(Debug, Clone, Default)]
pub struct AllowedRule;

impl CellRule for AllowedRule {
    fn check(&self, value: &Value, ctx: &CellContext<'_>, out: &mut Vec<(RuleKind, String)>) {
        let Some(allowed) = &ctx.rules.allowed else {
            return;
        };
        let text = value.to_text();
        if allowed.iter().any(|a| a == value || a.to_text() == text) {
            return;
        }

        let listed: Vec<String> = allowed.iter().map(Value::to_text).collect();
        out.push((
            RuleKind::Allowed,
            format!("value '{}' is not one of the allowed values: {}", text, listed.join(", ")),
        ));
    }
}
