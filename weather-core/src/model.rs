use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Literal reported in place of visibility when the provider omits it.
pub const VISIBILITY_NOT_AVAILABLE: &str = "N/A";

/// Normalized current-weather snapshot for a single city.
///
/// Built fresh from every successful provider response; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    /// ISO 3166 alpha-2 country code as reported by the provider.
    pub country: String,
    /// Air temperature, °C.
    pub temperature: f64,
    /// Apparent temperature, °C.
    pub feels_like: f64,
    pub description: String,
    /// Relative humidity, %.
    pub humidity: u8,
    /// Atmospheric pressure, hPa.
    pub pressure: u32,
    /// Wind speed, m/s.
    pub wind_speed: f64,
    pub visibility: Visibility,
}

/// Visibility in meters, or `"N/A"` on the wire when the provider did not report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Meters(u32),
    NotAvailable,
}

impl From<Option<u32>> for Visibility {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Visibility::NotAvailable, Visibility::Meters)
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Visibility::Meters(m) => serializer.serialize_u32(*m),
            Visibility::NotAvailable => serializer.serialize_str(VISIBILITY_NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Meters(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Meters(m) => Ok(Visibility::Meters(m)),
            Raw::Text(s) if s == VISIBILITY_NOT_AVAILABLE => Ok(Visibility::NotAvailable),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected visibility in meters or \"{VISIBILITY_NOT_AVAILABLE}\", got \"{s}\""
            ))),
        }
    }
}
