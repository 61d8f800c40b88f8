//! Where planet geography comes from.
//!
//! Both sources address a planet file as `{planet}.json` under a root (a URL
//! prefix or a directory). Planet ids are restricted to ASCII letters,
//! digits, `-` and `_` so they can never escape that root.

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, info};
use url::Url;

use crate::geo::{GeographyError, PlanetData};

/// Async provider of decoded planet geography.
pub trait GeographySource {
    /// Fetch and decode the geography for `planet`.
    fn fetch(&self, planet: &str) -> impl Future<Output = Result<PlanetData, GeographyError>> + Send;
}

/// Reject ids that are empty or contain path or URL syntax.
///
/// # Errors
///
/// Returns [`GeographyError::InvalidPlanet`] for ids outside `[A-Za-z0-9_-]+`.
pub fn validate_planet_id(planet: &str) -> Result<(), GeographyError> {
    let valid = !planet.is_empty() && planet.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid { Ok(()) } else { Err(GeographyError::InvalidPlanet(planet.to_owned())) }
}

/// Reads `{dir}/{planet}.json` from disk.
#[derive(Debug, Clone)]
pub struct FsGeographySource {
    dir: PathBuf,
}

impl FsGeographySource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, planet: &str) -> PathBuf {
        self.dir.join(format!("{planet}.json"))
    }
}

impl GeographySource for FsGeographySource {
    async fn fetch(&self, planet: &str) -> Result<PlanetData, GeographyError> {
        validate_planet_id(planet)?;
        let path = self.path_for(planet);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GeographyError::NotFound(planet.to_owned()));
            }
            Err(e) => return Err(GeographyError::Fetch(e.to_string())),
        };
        debug!(%planet, path = %path.display(), bytes = raw.len(), "read planet file");
        PlanetData::from_json(&raw)
    }
}

/// Fetches `{base}{planet}.json` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGeographySource {
    client: reqwest::Client,
    base: Url,
}

impl HttpGeographySource {
    /// `base` should end with `/` so the planet file resolves beneath it.
    #[must_use]
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// URL of the planet file.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::InvalidPlanet`] if the id is unsafe or does
    /// not form a valid URL.
    pub fn url_for(&self, planet: &str) -> Result<Url, GeographyError> {
        validate_planet_id(planet)?;
        self.base
            .join(&format!("{planet}.json"))
            .map_err(|_| GeographyError::InvalidPlanet(planet.to_owned()))
    }
}

impl GeographySource for HttpGeographySource {
    async fn fetch(&self, planet: &str) -> Result<PlanetData, GeographyError> {
        let url = self.url_for(planet)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GeographyError::Fetch(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GeographyError::NotFound(planet.to_owned()));
        }
        let response = response.error_for_status().map_err(|e| GeographyError::Fetch(e.to_string()))?;
        let raw = response.text().await.map_err(|e| GeographyError::Fetch(e.to_string()))?;
        info!(%planet, %url, bytes = raw.len(), "fetched planet geography");
        PlanetData::from_json(&raw)
    }
}
