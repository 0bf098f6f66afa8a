use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::root::{DEFAULT_CACHE_CAPACITY, DEFAULT_NAMESPACE};

/// Tunables for a [`Root`](crate::root::Root) handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Key prefix for every path addressed through the handle.
    pub namespace: String,
    /// Capacity of the local read cache.
    pub cache_capacity: usize,
    /// When set, loads skip reconstruction and surface raw payload bytes.
    pub verbatim: bool,
    /// Default relative expiry applied to every save, in seconds.
    pub default_ttl_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            verbatim: false,
            default_ttl_secs: None,
        }
    }
}

impl Settings {
    /// Loads settings from the environment (`DOTKV_` prefix) over the
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .set_default("namespace", DEFAULT_NAMESPACE)?
            .set_default("cache_capacity", DEFAULT_CACHE_CAPACITY as u64)?
            .set_default("verbatim", false)?
            .add_source(Environment::with_prefix("DOTKV").try_parsing(true))
            .build()?;

        cfg.try_deserialize()
    }
}
