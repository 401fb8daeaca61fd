use bson::{doc, Document};
use mongodb::{
    error::ErrorKind,
    options::{ClientOptions, ServerAddress},
    Client, Collection, Database,
};
use std::{env, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info};
use validator::{Validate, ValidationError};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "my_database";
pub const DEFAULT_COLLECTION: &str = "tasks";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const APP_NAME: &str = "colorsplash";

pub const CONNECTED_MESSAGE: &str = "Connected to MongoDB successfully";
pub const FAILED_MESSAGE: &str = "Failed to connect to MongoDB";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Invalid connection string: {0}")]
    InvalidUri(#[source] mongodb::error::Error),
    #[error("MongoDB is unreachable: {0}")]
    Unreachable(String),
}

/// Settings recognized by the connection bootstrapper.
///
/// | variable                   | default                     |
/// |----------------------------|-----------------------------|
/// | `MONGO_URL`                | `mongodb://localhost:27017` |
/// | `MONGO_DATABASE`           | `my_database`               |
/// | `MONGO_COLLECTION`         | `tasks`                     |
/// | `MONGO_TIMEOUT_SECS`       | `5`                         |
/// | `MONGO_REQUIRE_CONNECTION` | `false`                     |
#[derive(Debug, Clone, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1, message = "Connection string cannot be empty"))]
    pub uri: String,
    #[validate(custom(function = "validate_database_name"))]
    pub database: String,
    #[validate(custom(function = "validate_collection_name"))]
    pub collection: String,
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_secs: u64,
    pub app_name: String,
    pub require_connection: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            app_name: APP_NAME.to_string(),
            require_connection: false,
        }
    }
}

impl DatabaseConfig {
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset or blank values
    /// fall back to their defaults; a missing `MONGO_URL` is not an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(uri) = get("MONGO_URL") {
            config.uri = uri;
        }
        if let Some(database) = get("MONGO_DATABASE") {
            config.database = database;
        }
        if let Some(collection) = get("MONGO_COLLECTION") {
            config.collection = collection;
        }
        if let Some(raw) = get("MONGO_TIMEOUT_SECS") {
            config.timeout_secs = raw.parse().map_err(|e| {
                DatabaseError::Config(format!("MONGO_TIMEOUT_SECS={}: {}", raw, e))
            })?;
        }
        if let Some(raw) = get("MONGO_REQUIRE_CONNECTION") {
            config.require_connection = parse_bool(&raw).ok_or_else(|| {
                DatabaseError::Config(format!("MONGO_REQUIRE_CONNECTION={}: expected a boolean", raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_database_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("database_name_empty"));
    }
    if name.chars().any(|c| matches!(c, '/' | '\\' | '.' | ' ' | '"' | '$' | '\0')) {
        return Err(ValidationError::new("database_name_invalid_character"));
    }
    Ok(())
}

fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("collection_name_empty"));
    }
    if name.contains('$') || name.contains('\0') || name.starts_with("system.") {
        return Err(ValidationError::new("collection_name_invalid"));
    }
    Ok(())
}

/// Outcome of a single liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Connected,
    Unreachable { reason: String },
}

impl Liveness {
    pub fn is_connected(&self) -> bool {
        matches!(self, Liveness::Connected)
    }

    pub fn message(&self) -> String {
        match self {
            Liveness::Connected => CONNECTED_MESSAGE.to_string(),
            Liveness::Unreachable { reason } => format!("{}: {}", FAILED_MESSAGE, reason),
        }
    }
}

/// Client, database and collection handles, all derived from one client.
#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    database: Database,
    collection: Collection<Document>,
    timeout: Duration,
    fault: Option<String>,
}

/// Stands in for the server when the configured one could not be resolved.
/// The `.invalid` TLD never resolves, so every use fails at the driver.
const DETACHED_HOST: &str = "unresolved.invalid:27017";

impl Connection {
    /// Builds the handles. Parsing a `mongodb+srv://` string resolves DNS
    /// records, bounded by the configured timeout; a failed or slow lookup is
    /// `Unreachable`, anything else the driver rejects is `InvalidUri`.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = match tokio::time::timeout(config.timeout(), ClientOptions::parse(&config.uri)).await {
            Ok(Ok(options)) => options,
            Ok(Err(e)) if matches!(*e.kind, ErrorKind::DnsResolve { .. }) => {
                return Err(DatabaseError::Unreachable(e.to_string()));
            }
            Ok(Err(e)) => return Err(DatabaseError::InvalidUri(e)),
            Err(_) => {
                return Err(DatabaseError::Unreachable(format!(
                    "resolving the connection string timed out after {}s",
                    config.timeout_secs
                )));
            }
        };

        Self::with_options(config, options, None)
    }

    /// Handles that exist but cannot reach any server. `ping` reports `reason`
    /// and every collection operation fails when the driver tries to connect.
    pub fn detached(config: &DatabaseConfig, reason: impl Into<String>) -> Result<Self, DatabaseError> {
        let mut options = ClientOptions::default();
        options.hosts = vec![ServerAddress::parse(DETACHED_HOST).map_err(DatabaseError::InvalidUri)?];

        Self::with_options(config, options, Some(reason.into()))
    }

    fn with_options(
        config: &DatabaseConfig,
        mut options: ClientOptions,
        fault: Option<String>,
    ) -> Result<Self, DatabaseError> {
        options.app_name = Some(config.app_name.clone());
        options.connect_timeout = Some(config.timeout());
        options.server_selection_timeout = Some(config.timeout());

        let client = Client::with_options(options).map_err(DatabaseError::InvalidUri)?;
        let database = client.database(&config.database);
        let collection = database.collection::<Document>(&config.collection);

        debug!(
            database = %config.database,
            collection = %config.collection,
            detached = fault.is_some(),
            "MongoDB handles constructed"
        );

        Ok(Self {
            client,
            database,
            collection,
            timeout: config.timeout(),
            fault,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// The collection handle typed for a model.
    pub fn tasks<T: Send + Sync>(&self) -> Collection<T> {
        self.collection.clone_with_type()
    }

    pub fn is_detached(&self) -> bool {
        self.fault.is_some()
    }

    /// One `ping` round trip against `admin`, bounded by the configured timeout.
    pub async fn ping(&self) -> Liveness {
        if let Some(reason) = &self.fault {
            return Liveness::Unreachable {
                reason: reason.clone(),
            };
        }

        let admin = self.client.database("admin");
        let probe = admin.run_command(doc! { "ping": 1 });

        match tokio::time::timeout(self.timeout, probe).await {
            Ok(Ok(_)) => Liveness::Connected,
            Ok(Err(e)) => {
                let mut reason = e.to_string();
                if reason.trim().is_empty() {
                    reason = format!("{:?}", e.kind);
                }
                Liveness::Unreachable { reason }
            }
            Err(_) => Liveness::Unreachable {
                reason: format!("liveness check timed out after {}s", self.timeout.as_secs()),
            },
        }
    }
}

pub struct Bootstrap {
    pub connection: Connection,
    pub liveness: Liveness,
}

impl Bootstrap {
    /// Turns a failed liveness check into an error for callers that treat it as fatal.
    pub fn require_connected(self) -> Result<Connection, DatabaseError> {
        match self.liveness {
            Liveness::Connected => Ok(self.connection),
            Liveness::Unreachable { reason } => Err(DatabaseError::Unreachable(reason)),
        }
    }
}

/// Opens the handles and probes the server once, logging the outcome.
///
/// An unreachable server, including an SRV record that does not resolve,
/// still returns handles; the caller decides whether that is fatal. Only a
/// connection string the driver rejects outright is returned as an error.
pub async fn bootstrap(config: &DatabaseConfig) -> Result<Bootstrap, DatabaseError> {
    let connection = match Connection::open(config).await {
        Ok(connection) => connection,
        Err(DatabaseError::Unreachable(reason)) => Connection::detached(config, reason)?,
        Err(e) => {
            error!("{}: {}", FAILED_MESSAGE, e);
            return Err(e);
        }
    };

    let liveness = connection.ping().await;
    match &liveness {
        Liveness::Connected => info!("{}", liveness.message()),
        Liveness::Unreachable { .. } => error!("{}", liveness.message()),
    }

    Ok(Bootstrap {
        connection,
        liveness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = DatabaseConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.uri, DEFAULT_URI);
        assert_eq!(config.database, "my_database");
        assert_eq!(config.collection, "tasks");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.require_connection);
    }

    #[test]
    fn test_blank_url_falls_back_to_default() {
        let config = DatabaseConfig::from_lookup(lookup(&[("MONGO_URL", "   ")])).unwrap();
        assert_eq!(config.uri, DEFAULT_URI);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            ("MONGO_URL", "mongodb://db.internal:27018"),
            ("MONGO_DATABASE", "planner"),
            ("MONGO_COLLECTION", "todos"),
            ("MONGO_TIMEOUT_SECS", "12"),
            ("MONGO_REQUIRE_CONNECTION", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.uri, "mongodb://db.internal:27018");
        assert_eq!(config.database, "planner");
        assert_eq!(config.collection, "todos");
        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert!(config.require_connection);
    }

    #[test]
    fn test_rejects_unparseable_timeout() {
        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(DatabaseError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_timeout() {
        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_TIMEOUT_SECS", "301")]));
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[test]
    fn test_rejects_invalid_names() {
        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_DATABASE", "my.database")]));
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_COLLECTION", "system.users")]));
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_COLLECTION", "ta$ks")]));
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[test]
    fn test_rejects_non_boolean_require_flag() {
        let result = DatabaseConfig::from_lookup(lookup(&[("MONGO_REQUIRE_CONNECTION", "maybe")]));
        assert!(matches!(result, Err(DatabaseError::Config(_))));
    }

    #[tokio::test]
    async fn test_detached_connection_reports_its_fault() {
        let connection = Connection::detached(&DatabaseConfig::default(), "no SRV records").unwrap();

        assert!(connection.is_detached());
        assert_eq!(connection.database().name(), "my_database");
        assert_eq!(
            connection.ping().await,
            Liveness::Unreachable {
                reason: "no SRV records".to_string()
            }
        );
    }

    #[test]
    fn test_liveness_messages() {
        assert_eq!(Liveness::Connected.message(), "Connected to MongoDB successfully");

        let failed = Liveness::Unreachable {
            reason: "connection refused".to_string(),
        };
        assert!(!failed.is_connected());
        assert_eq!(failed.message(), "Failed to connect to MongoDB: connection refused");
    }
}
