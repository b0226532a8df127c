pub mod connection;
pub mod migrations;
pub mod models;

pub use connection::{create_lazy_pool, create_pool, run_migrations, DbPool};
pub use migrations::{MigrationRunner, MigrationStatus};
pub use models::*;
