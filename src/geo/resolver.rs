//! Geocoding lookups with a caller-owned cache

use governor::DefaultDirectRateLimiter;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, debug_span, info, instrument, warn, Instrument};

use super::cache::LocationCache;
use super::config::GeoConfig;
use super::error::GeoError;
use super::normalize::normalize_city;
use crate::crawler::request_limiter;

/// Country returned when a city cannot be resolved
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Coordinates returned when the service knows no such place
pub const NOT_FOUND: &str = "Não encontrado";

/// Coordinates returned when the lookup itself failed
pub const LOOKUP_ERROR: &str = "Erro";

/// First match of a geocoding search
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoMatch {
    /// Place name
    #[serde(default)]
    pub name: Option<String>,

    /// Country name in the requested language
    #[serde(default)]
    pub country: Option<String>,

    /// Latitude in degrees
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Longitude in degrees
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<GeoMatch>,
}

/// Resolves city labels through the geocoding service
pub struct GeoResolver {
    client: ReqwestClient,
    config: GeoConfig,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl GeoResolver {
    /// Create a resolver from the geocoding configuration
    pub fn new(config: GeoConfig) -> Result<Self, GeoError> {
        let client = ReqwestClient::builder().timeout(config.timeout()).build()?;
        let limiter = request_limiter(config.rate_limit());
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// Query the service for a single place by name
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, name: &str) -> Result<Option<GeoMatch>, GeoError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", self.config.language.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(GeoError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().next())
    }

    /// Country of the city named by `label`, or `"Unknown"`
    ///
    /// Results, including the sentinel, are cached under the normalized,
    /// lowercased city so repeated labels never hit the service twice.
    pub async fn resolve_country(&self, cache: &mut LocationCache, label: &str) -> String {
        let city = normalize_city(label);
        let key = city.to_lowercase();
        if let Some(country) = cache.get(&key) {
            debug!("Cache hit for {}: {}", key, country);
            return country.to_string();
        }

        let country = if city.is_empty() {
            UNKNOWN_COUNTRY.to_string()
        } else {
            match self.search(&city).await {
                Ok(Some(found)) => found.country.unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
                Ok(None) => UNKNOWN_COUNTRY.to_string(),
                Err(e) => {
                    warn!("Failed to geocode {}: {}", city, e);
                    UNKNOWN_COUNTRY.to_string()
                }
            }
        };

        info!("Resolved {} to {}", city, country);
        cache.insert(key, country).to_string()
    }

    /// `"<lat>, <lon>"` of the city named by `label`
    ///
    /// [`NOT_FOUND`] when the city is empty or the service has no match,
    /// [`LOOKUP_ERROR`] when the lookup failed. Both are cached.
    pub async fn resolve_coordinates(&self, cache: &mut LocationCache, label: &str) -> String {
        let city = normalize_city(label);
        let key = city.to_lowercase();
        if let Some(coords) = cache.get(&key) {
            return coords.to_string();
        }

        let coords = if city.is_empty() {
            NOT_FOUND.to_string()
        } else {
            match self.search(&city).await {
                Ok(Some(GeoMatch {
                    latitude: Some(lat),
                    longitude: Some(lon),
                    ..
                })) => format!("{}, {}", lat, lon),
                Ok(_) => NOT_FOUND.to_string(),
                Err(e) => {
                    warn!("Failed to geocode {}: {}", city, e);
                    LOOKUP_ERROR.to_string()
                }
            }
        };

        cache.insert(key, coords).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::{Duration, Instant};

    fn resolver(server: &Server) -> GeoResolver {
        let config = GeoConfig::builder()
            .endpoint(format!("{}/v1/search", server.url()))
            .rate_limit_ms(0)
            .build();
        GeoResolver::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_country_queries_once_per_city() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "Lisbon".into()),
                Matcher::UrlEncoded("count".into(), "1".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"name":"Lisbon","country":"Portugal","latitude":38.72,"longitude":-9.13}]}"#)
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server);
        let mut cache = LocationCache::new();

        assert_eq!(resolver.resolve_country(&mut cache, "Lisbon").await, "Portugal");
        assert_eq!(resolver.resolve_country(&mut cache, "  LISBON ").await, "Portugal");
        assert_eq!(cache.len(), 1);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_country_failures_are_unknown_and_cached() {
        let mut server = Server::new_async().await;
        let empty = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Atlantis".into()))
            .with_status(200)
            .with_body(r#"{"generationtime_ms":0.1}"#)
            .expect(1)
            .create_async()
            .await;
        let failing = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Gotham".into()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let resolver = resolver(&server);
        let mut cache = LocationCache::new();

        for _ in 0..2 {
            assert_eq!(resolver.resolve_country(&mut cache, "Atlantis").await, UNKNOWN_COUNTRY);
            assert_eq!(resolver.resolve_country(&mut cache, "Gotham (2020)").await, UNKNOWN_COUNTRY);
        }

        empty.assert_async().await;
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_country_malformed_body_is_unknown() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let resolver = resolver(&server);
        let mut cache = LocationCache::new();
        assert_eq!(resolver.resolve_country(&mut cache, "Rome").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn test_resolve_coordinates() {
        let mut server = Server::new_async().await;
        let _found = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Lisbon".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"country":"Portugal","latitude":38.72,"longitude":-9.13}]}"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Atlantis".into()))
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let resolver = resolver(&server);
        let mut cache = LocationCache::new();
        assert_eq!(
            resolver.resolve_coordinates(&mut cache, "Lisbon - Portugal").await,
            "38.72, -9.13"
        );
        assert_eq!(resolver.resolve_coordinates(&mut cache, "Atlantis").await, NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resolve_coordinates_empty_city_skips_the_service() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(&server);
        let mut cache = LocationCache::new();
        assert_eq!(resolver.resolve_coordinates(&mut cache, "(2019)").await, NOT_FOUND);
        assert_eq!(resolver.resolve_coordinates(&mut cache, "   ").await, NOT_FOUND);
        assert_eq!(cache.get(""), Some(NOT_FOUND));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookups_are_spaced_by_the_delay() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results":[{"country":"Portugal"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let config = GeoConfig::builder()
            .endpoint(format!("{}/v1/search", server.url()))
            .rate_limit_ms(200)
            .build();
        let resolver = GeoResolver::new(config).unwrap();
        let mut cache = LocationCache::new();

        let start = Instant::now();
        resolver.resolve_country(&mut cache, "Lisbon").await;
        resolver.resolve_country(&mut cache, "Porto").await;

        // Allow for the limiter clock running slightly apart from Instant
        assert!(start.elapsed() >= Duration::from_millis(180), "{:?}", start.elapsed());
        mock.assert_async().await;
    }
}
