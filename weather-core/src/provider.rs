use crate::{Result, WeatherRecord};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Connection settings injected into a provider at construction.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub lang: String,
    pub timeout: Duration,
}

/// Source of current weather by city name.
///
/// Implementations perform exactly one outbound call per lookup and keep no state between calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn lookup(&self, city: &str) -> Result<WeatherRecord>;
}
