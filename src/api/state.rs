use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::config::Config;

/// Shared by every request: the pool plus the bits of config handlers read.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub secret: Arc<str>,
    pub public_url: Arc<str>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, config: &Config) -> Self {
        Self {
            pool,
            secret: Arc::from(config.jwt_secret.as_str()),
            public_url: Arc::from(config.public_url.trim_end_matches('/')),
        }
    }

    /// Absolute URL of `path` under the public base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.public_url)
    }
}
