//! Shared application state.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the service configuration and a cache of decoded planet geography,
//! so each planet file is read and decoded at most once per process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::ServerConfig;
use crate::geo::{GeographyError, PlanetData};
use crate::source::{FsGeographySource, GeographySource};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub source: FsGeographySource,
    /// Decoded planets keyed by planet id, unmirrored.
    pub planets: Arc<RwLock<HashMap<String, Arc<PlanetData>>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let source = FsGeographySource::new(config.data_dir.clone());
        Self { config: Arc::new(config), source, planets: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Geography for `planet`, decoding and caching it on first use.
    ///
    /// Failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the planet id is invalid or its file is
    /// missing or malformed.
    pub async fn planet(&self, planet: &str) -> Result<Arc<PlanetData>, GeographyError> {
        if let Some(data) = self.planets.read().await.get(planet) {
            return Ok(Arc::clone(data));
        }
        let data = Arc::new(self.source.fetch(planet).await?);
        let mut planets = self.planets.write().await;
        let data = Arc::clone(planets.entry(planet.to_owned()).or_insert(data));
        info!(%planet, cached = planets.len(), "planet geography cached");
        Ok(data)
    }
}
