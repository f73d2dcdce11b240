use crate::core::{GridError, Result, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_descending(&self) -> bool {
        matches!(self, Self::Descending)
    }

    pub fn reversed(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Ascending }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Descending }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operation: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, operation: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operation,
            value: value.into(),
        }
    }
}

/// Everything that decides which page of rows is visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filters: Vec<Filter>,
}

impl ViewParams {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            sort: None,
            filters: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(GridError::InvalidParameter("page is 1-based".into()));
        }
        if self.page_size == 0 {
            return Err(GridError::InvalidParameter("page size must be positive".into()));
        }
        Ok(())
    }
}

impl Default for ViewParams {
    fn default() -> Self {
        Self::new(50)
    }
}
