use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use common::config;
use common::config::Config;
use datafusion::execution::memory_pool::GreedyMemoryPool;
use datafusion::execution::memory_pool::MemoryConsumer;
use datafusion::execution::memory_pool::MemoryPool;
use datafusion::execution::memory_pool::MemoryReservation;
use datafusion::execution::memory_pool::UnboundedMemoryPool;
use datafusion_common::DataFusionError;
use tracing::debug;

use crate::error::AggregateError;
use crate::error::Result;

const CONSUMER_NAME: &str = "aggregate-functions";

/// Memory context of one query fragment.
///
/// Every variable-length accumulator region (scratch buffers, sketch bitmaps)
/// is allocated from and returned to it. Accounting goes through a
/// reservation on the fragment's memory pool, so exhausting the pool fails
/// the allocation instead of overcommitting.
#[derive(Debug)]
pub struct FunctionContext {
    pool: Arc<dyn MemoryPool>,
    reservation: Mutex<MemoryReservation>,
}

impl FunctionContext {
    pub fn new(pool: Arc<dyn MemoryPool>) -> Self {
        let reservation = MemoryConsumer::new(CONSUMER_NAME).register(&pool);
        Self {
            pool,
            reservation: Mutex::new(reservation),
        }
    }

    pub fn from_config(cfg: &config::Memory) -> Self {
        let pool: Arc<dyn MemoryPool> = match cfg.limit_bytes {
            Some(limit) => {
                debug!("fragment memory pool limited to {limit} bytes");
                Arc::new(GreedyMemoryPool::new(limit))
            }
            None => {
                debug!("fragment memory pool is unbounded");
                Arc::new(UnboundedMemoryPool::default())
            }
        };

        Self::new(pool)
    }

    /// Builds the context from a configuration file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = Config::load(path)?;

        Ok(Self::from_config(&cfg.memory))
    }

    /// Allocates a zero-filled region of exactly `n` bytes.
    pub fn allocate(&self, n: usize) -> Result<Vec<u8>> {
        self.reservation().try_grow(n).map_err(|err| match err {
            DataFusionError::ResourcesExhausted(msg) => AggregateError::ResourcesExhausted(msg),
            other => other.into(),
        })?;

        Ok(vec![0; n])
    }

    /// Returns a region obtained from [`FunctionContext::allocate`].
    pub fn free(&self, buf: Vec<u8>) {
        self.unreserve(buf.len());
    }

    /// Hands a region over to the caller. The bytes leave the fragment, so
    /// they stop counting against its pool.
    pub fn detach(&self, buf: Vec<u8>) -> Vec<u8> {
        self.unreserve(buf.len());
        buf
    }

    /// Bytes currently held by accumulators of this context.
    pub fn allocated(&self) -> usize {
        self.reservation().size()
    }

    /// Bytes reserved in the underlying pool by all of its consumers.
    pub fn pool_reserved(&self) -> usize {
        self.pool.reserved()
    }

    fn unreserve(&self, n: usize) {
        let mut reservation = self.reservation();
        let n = n.min(reservation.size());
        reservation.shrink(n);
    }

    fn reservation(&self) -> MutexGuard<'_, MemoryReservation> {
        self.reservation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FunctionContext {
    fn default() -> Self {
        Self::from_config(&config::Memory::default())
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;
    use std::fs;

    use common::config::Memory;
    use common::error::CommonError;

    use crate::context::FunctionContext;
    use crate::error::AggregateError;

    #[test]
    fn allocate_and_free() {
        let ctx = FunctionContext::default();
        let a = ctx.allocate(10).unwrap();
        let b = ctx.allocate(6).unwrap();
        assert_eq!(a, vec![0; 10]);
        assert_eq!(ctx.allocated(), 16);
        assert_eq!(ctx.pool_reserved(), 16);

        ctx.free(a);
        assert_eq!(ctx.allocated(), 6);
        let b = ctx.detach(b);
        assert_eq!(b.len(), 6);
        assert_eq!(ctx.allocated(), 0);
    }

    #[test]
    fn limit_exhausted() {
        let ctx = FunctionContext::from_config(&Memory {
            limit_bytes: Some(100),
        });
        let buf = ctx.allocate(80).unwrap();
        assert!(matches!(
            ctx.allocate(30),
            Err(AggregateError::ResourcesExhausted(_))
        ));
        // a failed allocation reserves nothing
        assert_eq!(ctx.allocated(), 80);

        ctx.free(buf);
        assert!(ctx.allocate(100).is_ok());
    }

    #[test]
    fn load_limited() {
        let path = temp_dir().join("aggregate_context_load_limited.toml");
        fs::write(&path, "[memory]\nlimit_bytes = 64\n").unwrap();
        let ctx = FunctionContext::load(Some(path.as_path()));
        fs::remove_file(&path).unwrap();

        let ctx = ctx.unwrap();
        assert!(ctx.allocate(64).is_ok());
        assert!(matches!(
            ctx.allocate(1),
            Err(AggregateError::ResourcesExhausted(_))
        ));

        let missing = temp_dir().join("aggregate_context_missing.toml");
        assert!(matches!(
            FunctionContext::load(Some(missing.as_path())),
            Err(AggregateError::Common(CommonError::Config(_)))
        ));
    }
}
