pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use models::Resource;
pub use postgres::PgStore;
pub use schema::{Column, ColumnType, EntityKind};
pub use store::{row_id, Condition, Row, Store, StoreError};
