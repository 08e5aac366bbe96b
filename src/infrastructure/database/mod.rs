pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmBookingRepository;

use sea_orm::{Database, DatabaseConnection};
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./bookings.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./bookings.db?mode=rwc")
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
        }
    }

    /// Private in-memory database, for tests.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
        }
    }
}

pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let db = Database::connect(&config.url).await?;
    info!("Database connected successfully");
    Ok(db)
}
