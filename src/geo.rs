//! # Location Resolution Module
//!
//! Maps free-text event labels such as `"DevOpsDays Lisbon (2019)"` to a city
//! name, and city names to a country (or coordinates) through the Open-Meteo
//! geocoding API.
//!
//! ## Key Components
//!
//! - `normalize_city`: label clean-up applied before every lookup
//! - `LocationCache`: process-lifetime memo of resolved values, owned by the caller
//! - `GeoResolver`: issues at most one geocoding query per uncached city
//! - `GeoConfig`: endpoint, timeout and spacing between queries
//!
//! Lookups never fail from the caller's point of view: every error maps to a
//! sentinel value (`"Unknown"` for countries) which is cached like any other.

mod cache;
mod config;
mod error;
mod normalize;
mod resolver;

pub use cache::LocationCache;
pub use config::{GeoConfig, GeoConfigBuilder};
pub use error::GeoError;
pub use normalize::{cache_key, normalize_city};
pub use resolver::{GeoMatch, GeoResolver, LOOKUP_ERROR, NOT_FOUND, UNKNOWN_COUNTRY};
