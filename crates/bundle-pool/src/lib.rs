//! Content-addressed bundle pools.
//!
//! A pool is a directory holding bundles under their identity,
//! `root/<64-hex identity>/`, so importing the same content twice is detected
//! as a duplicate instead of stored twice. Pools are named in a TOML
//! configuration file (see [`Config`]).

pub mod config;
mod copy;
pub mod error;
pub mod pool;

pub use config::{Config, PoolConfig, CONFIG_ENV, DEFAULT_POOL};
pub use error::{PoolError, PoolResult};
pub use pool::{ImportMode, Pool, PoolEntry, PoolListing};
