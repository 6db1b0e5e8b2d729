//! Configuration for the Mentorbridge engine
//!
//! Settings are layered: an optional TOML file first, then environment
//! variables with the `MENTORBRIDGE_` prefix. The default share policy for
//! newly activated relationships lives here so the full-disclosure default
//! stays a policy value rather than a literal in the activation path.

use crate::error::Result;
use crate::types::SharePolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP API binds to
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// SQLite database URL (e.g. `sqlite://mentorbridge.db`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Grants applied when a relationship is first activated
    #[serde(default)]
    pub sharing: SharePolicy,
}

fn default_listen() -> SocketAddr {
    ([127, 0, 0, 1], 8087).into()
}

fn default_database_url() -> String {
    "sqlite://mentorbridge.db".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database_url: default_database_url(),
            sharing: SharePolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional config file plus environment overrides
    ///
    /// Environment variables use the `MENTORBRIDGE_` prefix, e.g.
    /// `MENTORBRIDGE_DATABASE_URL=sqlite:///var/lib/mentorbridge.db`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("MENTORBRIDGE"))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}
