pub mod dispatcher;
pub mod operation;

pub use dispatcher::CacheDispatcher;
pub use operation::CacheOperations;
