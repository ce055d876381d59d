pub mod cache;

pub use cache::basic::{
    clear_all, delete_value, get_value, get_value_with_ttl, set_value, set_value_with_ttl,
};
pub use cache::health::health_check;
