//! Configuration types for malshare-etl

use crate::error::{Error, Result};
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the MalShare API key
pub const ENV_API_KEY: &str = "MALSHARE_API_KEY";
/// Environment variable overriding the feed endpoint
pub const ENV_BASE_URL: &str = "MALSHARE_BASE_URL";
/// Environment variable holding the store connection string
pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
/// Environment variable naming the target database
pub const ENV_MONGODB_DB: &str = "MONGODB_DB";
/// Environment variable naming the target collection
pub const ENV_MONGODB_COLLECTION: &str = "MONGODB_COLLECTION";
/// Alias for [`ENV_MONGODB_URI`], read only when that is unset
pub const ENV_STORE_URI: &str = "MALSHARE_STORE_URI";
/// Alias for [`ENV_MONGODB_DB`], read only when that is unset
pub const ENV_STORE_DB: &str = "MALSHARE_STORE_DB";
/// Alias for [`ENV_MONGODB_COLLECTION`], read only when that is unset
pub const ENV_STORE_COLLECTION: &str = "MALSHARE_STORE_COLLECTION";

/// Feed endpoint configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedConfig {
    /// API endpoint (default: "https://malshare.com/api.php")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Secret API key sent as the `api_key` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout: default_timeout(),
        }
    }
}

/// Document store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store connection string (default: "sqlite://malshare.db")
    ///
    /// `mongodb://` and `mongodb+srv://` select MongoDB, `sqlite:` selects
    /// SQLite.
    #[serde(default = "default_store_uri")]
    pub uri: String,

    /// Database name (default: "malshare_db")
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name (default: "malshare_raw")
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}

/// Main configuration for a pipeline run
///
/// Passed into every component explicitly; nothing reads the environment
/// except [`Config::from_env`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Feed endpoint settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    /// Unset variables fall back to the documented defaults; the API key has
    /// no default and is checked by [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(api_key) = lookup(ENV_API_KEY) {
            config.feed.api_key = api_key;
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.feed.base_url = base_url;
        }
        if let Some(uri) = first_set(&lookup, &[ENV_MONGODB_URI, ENV_STORE_URI]) {
            config.store.uri = uri;
        }
        if let Some(database) = first_set(&lookup, &[ENV_MONGODB_DB, ENV_STORE_DB]) {
            config.store.database = database;
        }
        if let Some(collection) =
            first_set(&lookup, &[ENV_MONGODB_COLLECTION, ENV_STORE_COLLECTION])
        {
            config.store.collection = collection;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.feed.api_key.trim().is_empty() {
            return Err(Error::config("API key must be set", ENV_API_KEY));
        }

        url::Url::parse(&self.feed.base_url).map_err(|e| {
            Error::config(
                format!("invalid feed URL {:?}: {}", self.feed.base_url, e),
                ENV_BASE_URL,
            )
        })?;

        if self.feed.timeout.is_zero() {
            return Err(Error::Config {
                message: "feed timeout must be greater than zero".into(),
                key: Some("feed.timeout".into()),
            });
        }

        if self.store.uri.trim().is_empty() {
            return Err(Error::config("store URI must be set", ENV_MONGODB_URI));
        }

        StoreBackend::from_uri(&self.store.uri)
            .map_err(|e| Error::config(e.to_string(), ENV_MONGODB_URI))?;

        if !is_valid_name(&self.store.database) {
            return Err(Error::config(
                format!("invalid database name {:?}", self.store.database),
                ENV_MONGODB_DB,
            ));
        }

        if !is_valid_name(&self.store.collection) {
            return Err(Error::config(
                format!("invalid collection name {:?}", self.store.collection),
                ENV_MONGODB_COLLECTION,
            ));
        }

        Ok(())
    }
}

/// Database and collection names: non-empty, ASCII alphanumerics, `_` and `-`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Value of the first key in `keys` that is set
fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|key| lookup(key))
}

fn default_base_url() -> String {
    "https://malshare.com/api.php".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_store_uri() -> String {
    "sqlite://malshare.db".to_string()
}

fn default_database() -> String {
    "malshare_db".to_string()
}

fn default_collection() -> String {
    "malshare_raw".to_string()
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
