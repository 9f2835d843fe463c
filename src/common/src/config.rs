use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::CommonError;
use crate::error::Result;

const ENV_PREFIX: &str = "AGGREGATE";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Memory {
    /// Upper bound of the bytes a single query fragment may hold in
    /// accumulator state. `None` means unbounded.
    pub limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub memory: Memory,
}

impl Config {
    /// Loads the configuration from an optional file, then applies
    /// `AGGREGATE__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let cfg: Config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        debug!("loaded aggregate config: {cfg:?}");

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory.limit_bytes == Some(0) {
            return Err(CommonError::BadRequest(
                "memory.limit_bytes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
