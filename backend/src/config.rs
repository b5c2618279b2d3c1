//! Booking runtime configuration loaded via OrthoConfig.
//!
//! Values come from `EVENTBOOK_*` environment variables or a configuration
//! file.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

/// Settings shared by the booking binaries.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EVENTBOOK")]
pub struct BookingSettings {
    /// PostgreSQL connection string. Binaries refuse to start without it.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
}

impl BookingSettings {
    /// Pool settings for the configured database, if any.
    #[must_use]
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url
            .as_deref()
            .map(|url| PoolConfig::new(url).with_max_size(self.pool_max_size))
    }
}
