use std::result;

use config::ConfigError;
use thiserror::Error;

pub type Result<T> = result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("config: {0:?}")]
    Config(#[from] ConfigError),
    #[error("BadRequest {0}")]
    BadRequest(String),
}
