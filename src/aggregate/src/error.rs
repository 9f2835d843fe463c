use std::result;

use arrow::error::ArrowError;
use common::error::CommonError;
use datafusion_common::DataFusionError;
use thiserror::Error;

pub type Result<T> = result::Result<T, AggregateError>;

#[derive(Error, Debug)]
pub enum AggregateError {
    /// The caller broke the accumulator call contract (wrong state shape,
    /// wrong argument count, foreign partial). Never recovered from.
    #[error("contract violation {0:?}")]
    ContractViolation(String),
    #[error("resources exhausted {0:?}")]
    ResourcesExhausted(String),
    #[error("unsupported {0:?}")]
    Unsupported(String),
    #[error("internal {0:?}")]
    Internal(String),
    #[error("datafusion {0:?}")]
    DataFusion(#[from] DataFusionError),
    #[error("common {0:?}")]
    Common(#[from] CommonError),
}

impl AggregateError {
    /// Wraps this [Error] as an [datafusion::error::DataFusionError::Execution].
    pub fn into_datafusion_execution_error(self) -> DataFusionError {
        DataFusionError::Execution(self.to_string())
    }
}

impl From<AggregateError> for ArrowError {
    fn from(e: AggregateError) -> Self {
        ArrowError::ExternalError(Box::new(e))
    }
}
