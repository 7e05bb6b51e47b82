pub mod cache;
pub mod engine;
pub mod memory;
pub mod table;

pub use cache::{AttributeCache, CacheStats};
pub use engine::AttributeStorage;
pub use memory::InMemoryStorage;
pub use table::AttributeTable;
