//! Core library for the weather service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The provider abstraction and its OpenWeather implementation
//! - The normalized weather record and the lookup error taxonomy
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, LogFormat, LoggingConfig, ProviderConfig, ServerConfig};
pub use error::{Result, WeatherError};
pub use model::{VISIBILITY_NOT_AVAILABLE, Visibility, WeatherRecord};
pub use provider::{ProviderSettings, WeatherProvider, openweather::OpenWeatherProvider};
