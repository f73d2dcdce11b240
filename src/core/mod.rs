pub mod error;
pub mod types;
pub mod value;

pub use error::{GridError, Result};
pub use types::{
    Column, ColumnStats, DatasetId, DatasetMeta, Row, RowId, Severity, ValidationRules,
};
pub use value::{DataType, Value};
