//! MongoDB access layer
//!
//! Three thin, per-concern adapters over the document store:
//! - `analytics`: read-only aggregation over the ETL-produced collection
//! - `links`: the `redirects_links` records reconciled by the refresher
//! - `clicks`: the `redirects_clicks` monotonic counters
//!
//! The clients are constructed once at startup and passed through
//! constructors; nothing here holds global state.

pub mod analytics;
pub mod clicks;
pub mod links;
pub mod models;

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::errors::{RedronError, Result};

/// 集合名
pub const ANALYTICS_COLLECTION: &str = "analytics";
pub const LINKS_COLLECTION: &str = "redirects_links";
pub const CLICKS_COLLECTION: &str = "redirects_clicks";

pub use analytics::{AnalyticsRepository, MongoAnalyticsRepository};
pub use clicks::{ClickStore, MongoClickStore};
pub use links::{LinkStore, MongoLinkStore};

/// Connect to MongoDB and return the application database handle.
pub async fn connect(config: &DatabaseConfig) -> Result<Database> {
    if config.url.is_empty() {
        return Err(RedronError::config("MONGODB_URL is not set"));
    }

    let mut options = ClientOptions::parse(&config.url)
        .await
        .map_err(|e| RedronError::database_connection(format!("invalid MongoDB URL: {e}")))?;
    options.app_name = Some("redron".to_string());
    options.server_selection_timeout = Some(std::time::Duration::from_secs(config.timeout));

    let client = Client::with_options(options)
        .map_err(|e| RedronError::database_connection(e.to_string()))?;
    let database = client.database(&config.database);

    debug!("MongoDB client initialized for database '{}'", config.database);
    Ok(database)
}

/// Connectivity probe used by the detailed health check.
pub async fn ping(database: &Database) -> Result<()> {
    database
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
        .map_err(|e| {
            warn!("MongoDB ping failed: {}", e);
            RedronError::database_connection(e.to_string())
        })?;
    Ok(())
}
