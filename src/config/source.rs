//! Source database settings and credentials

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the database user name
pub const USERNAME_VAR: &str = "TROLLEY_USERNAME";

/// Environment variable holding the database password
pub const PASSWORD_VAR: &str = "TROLLEY_PASSWORD";

/// Schema-qualified junction table every chunk is read from
pub const JUNCTION_TABLE: &str = "tomtom_multinet_current.mnr_junction";

/// Location of the source PostgreSQL database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
        }
    }
}

fn default_host() -> String {
    "trolley.nrel.gov".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "master".to_string()
}

/// Database login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup. Both variables
    /// must be present.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR)?;
        let password = lookup(PASSWORD_VAR)?;
        Some(Self::new(username, password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
