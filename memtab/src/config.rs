//! Table configuration.
//!
//! A configuration names the table capacity and the shape of
//! the block pool behind it. Configurations are usually read from JSON:
//!
//! ```json
//! { "capacity": 16, "block_size": 16, "memory_size": 4096 }
//! ```
//!
//! Missing fields take their default values.

use {
    crate::MAX_CAPACITY,
    memtab_blocks::{BlockPool, PoolError},
    serde::{Deserialize, Serialize},
    std::io::Read,
    thiserror::Error,
};

/// Configuration for an object table and its block pool.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig
{
    /// The number of slots in the table.
    pub capacity: usize,

    /// The number of bytes in each block.
    pub block_size: usize,

    /// The number of bytes managed by the block pool.
    pub memory_size: usize,
}

/// Returned when a configuration cannot be used.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError
{
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Capacity must be between 1 and {max}, not {0}", max = MAX_CAPACITY)]
    Capacity(usize),

    #[error("Block size must be non-zero")]
    BlockSize,

    #[error("{memory_size} bytes of memory cannot hold a block of {block_size} bytes")]
    MemorySize{memory_size: usize, block_size: usize},

    #[error("{0}")]
    Pool(#[from] PoolError),
}

impl Default for TableConfig
{
    fn default() -> Self
    {
        Self{capacity: 16, block_size: 16, memory_size: 4096}
    }
}

impl TableConfig
{
    /// Read and validate a configuration in JSON format.
    pub fn from_json<R>(reader: R) -> Result<Self, ConfigError>
        where R: Read
    {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a table and pool can be built from the configuration.
    pub fn validate(&self) -> Result<(), ConfigError>
    {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(ConfigError::Capacity(self.capacity));
        }

        if self.block_size == 0 {
            return Err(ConfigError::BlockSize);
        }

        if self.memory_size < self.block_size {
            return Err(ConfigError::MemorySize{
                memory_size: self.memory_size,
                block_size: self.block_size,
            });
        }

        Ok(())
    }

    /// Create the block pool described by the configuration.
    pub fn build_pool(&self) -> Result<BlockPool, ConfigError>
    {
        self.validate()?;
        Ok(BlockPool::new(self.block_size, self.memory_size)?)
    }
}
