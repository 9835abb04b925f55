//! App configuration, read from the environment

use std::fmt;

use crate::utils::env_var;
use crate::utils::env_var_or_else;

/// Where the records live
#[derive(Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// In memory, gone after a restart
    Memory,

    /// Postgres database, migrated on startup
    Postgres {
        /// Connection URL of the database
        database_url: String,
    },
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the URL may contain credentials
        match self {
            Self::Memory => write!(f, "Memory"),
            Self::Postgres { .. } => write!(f, "Postgres"),
        }
    }
}

/// Everything the app needs to start
#[derive(Clone)]
pub struct AppConfig {
    /// Storage backend
    pub storage: StorageConfig,

    /// Secret to sign access tokens with
    pub jwt_secret: String,

    /// Secret shared with the payment gateway, payments are not verified without one
    pub payment_secret: Option<String>,
}

impl AppConfig {
    /// Read the configuration from the environment
    ///
    /// - `DATABASE_URL`: use Postgres when set, memory otherwise
    /// - `JWT_SECRET`: generated when not set, tokens won't survive a restart
    /// - `PAYMENT_SECRET`: verify payment confirmations when set
    pub fn from_env() -> Self {
        let storage = match env_var("DATABASE_URL") {
            Some(database_url) => StorageConfig::Postgres { database_url },
            None => StorageConfig::Memory,
        };

        let jwt_secret = env_var_or_else("JWT_SECRET", || {
            use crate::password::generate;

            let jwt_secret = generate();
            tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
            jwt_secret
        });

        Self {
            storage,
            jwt_secret,
            payment_secret: env_var("PAYMENT_SECRET"),
        }
    }
}
