pub mod init;
pub mod memory;
pub mod postgres;
mod provider;

pub use init::init;
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use provider::StorageProvider;
