use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL. Not needed when running with the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Address the HTTP listener binds to
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Size of the Postgres connection pool
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are picked up first if one exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        envy::from_env::<Config>().context("Invalid service configuration in environment")
    }

    /// Build a configuration from explicit key/value pairs, using the same
    /// names and defaults as the environment.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).context("Invalid service configuration")
    }

    /// Get the database URL, failing if none was configured
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set unless running with --in-memory")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
