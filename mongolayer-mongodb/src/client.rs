use std::time::Duration;

use bson::{Document, doc};
use mongodb::{
    Client, Collection, Database,
    options::{ClientOptions, ReadPreference, SelectionCriteria},
};
use tokio::time::timeout;

use mongolayer_core::{
    config::ClientConfig,
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::error::map_driver_error;

/// Upper bound for a single `ping` round trip.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected MongoDB client bound to one database.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MongoClient {
    client: Client,
    database: Database,
    database_name: String,
}

impl MongoClient {
    /// Connects using `config` and pings the primary before returning.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if the URI is invalid, the client cannot
    /// be created or the ping does not succeed within [`PING_TIMEOUT`].
    pub async fn connect(config: ClientConfig) -> DocumentStoreResult<Self> {
        let options = client_options(&config).await?;
        let hosts = options
            .hosts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        let database = client.database(&config.database);

        let connected = Self {
            client,
            database,
            database_name: config.database,
        };
        connected
            .ping()
            .await
            .map_err(|e| DocumentStoreError::Initialization(format!("failed to ping MongoDB: {e}")))?;

        tracing::info!(hosts = %hosts, database = %connected.database_name, "connected to MongoDB");

        Ok(connected)
    }

    /// Wraps an already configured driver client.
    pub fn from_client(client: Client, database: impl Into<String>) -> Self {
        let database_name = database.into();

        Self {
            database: client.database(&database_name),
            client,
            database_name,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// A typed handle to a collection of the configured database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// The underlying driver client.
    pub fn raw(&self) -> &Client {
        &self.client
    }

    /// Pings the primary.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        timeout(
            PING_TIMEOUT,
            self.database
                .run_command(doc! { "ping": 1 })
                .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary)),
        )
        .await
        .map_err(|_| DocumentStoreError::Backend(format!("ping timed out after {PING_TIMEOUT:?}")))?
        .map_err(map_driver_error)
        .map(|_: Document| ())
    }

    /// Closes all connections. In-flight operations are allowed to finish first.
    pub async fn close(self) {
        self.client.shutdown().await;
        tracing::debug!(database = %self.database_name, "MongoDB client closed");
    }
}

/// Builds driver options from `config`.
pub async fn client_options(config: &ClientConfig) -> DocumentStoreResult<ClientOptions> {
    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

    options.connect_timeout = Some(config.connect_timeout());
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn options_follow_config() {
        let config = ClientConfig::builder()
            .uri("mongodb://db.internal:27018")
            .connect_timeout(Duration::from_secs(2))
            .max_pool_size(20)
            .min_pool_size(2)
            .build();

        let options = client_options(&config).await.unwrap();

        assert_eq!(options.hosts.len(), 1);
        assert_eq!(options.hosts[0].to_string(), "db.internal:27018");
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(2)));
        assert_eq!(options.max_pool_size, Some(20));
        assert_eq!(options.min_pool_size, Some(2));
    }

    #[tokio::test]
    async fn invalid_uri_is_an_initialization_error() {
        let config = ClientConfig::builder().uri("postgres://localhost").build();

        let err = client_options(&config).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Initialization(_)));
    }

    #[tokio::test]
    async fn from_client_binds_database() {
        let options = client_options(&ClientConfig::default()).await.unwrap();
        let client = MongoClient::from_client(Client::with_options(options).unwrap(), "blog");

        assert_eq!(client.database_name(), "blog");
        assert_eq!(client.database().name(), "blog");
        assert_eq!(client.collection::<Document>("users").name(), "users");
    }
}
