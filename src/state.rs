use std::sync::Arc;

use crate::config::AppConfig;
use crate::fare::{FareEstimator, RandomFares};
use crate::store::{EntityStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<AppConfig>,
    pub fares: Arc<dyn FareEstimator>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            config,
            fares: Arc::new(RandomFares),
        })
    }

    pub fn from_parts(
        store: Arc<dyn EntityStore>,
        config: Arc<AppConfig>,
        fares: Arc<dyn FareEstimator>,
    ) -> Self {
        Self {
            store,
            config,
            fares,
        }
    }

    /// Fresh state for tests: empty store, fixed fares, throwaway JWT config.
    pub fn test() -> Self {
        use crate::config::JwtConfig;
        use crate::fare::FixedFares;

        let config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
        });
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
            fares: Arc::new(FixedFares(25.5)),
        }
    }
}
