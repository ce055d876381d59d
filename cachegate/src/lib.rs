pub mod domain;
pub mod planes;
pub mod ports;

pub use domain::Backend;
pub use planes::data::{CacheDispatcher, CacheOperations};
pub use ports::{CacheStore, StorageFactory};
