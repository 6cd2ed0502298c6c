use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};

use crate::{
    Result, WeatherError,
    model::{Visibility, WeatherRecord},
};

use super::{ProviderSettings, WeatherProvider};

const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    settings: ProviderSettings,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let http = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self { settings, http })
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord> {
        tracing::debug!(city, "requesting current weather from OpenWeather");

        let res = self
            .http
            .get(&self.settings.base_url)
            .query(&[
                ("q", city),
                ("appid", self.settings.api_key.as_str()),
                ("units", UNITS),
                ("lang", self.settings.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if let Some(err) = classify_status(status, city) {
            return Err(err);
        }

        if !status.is_success() {
            // The status alone is enough to report; an unreadable body stays empty.
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::Provider {
                status,
                body: truncate_body(&body),
            });
        }

        let body = res.text().await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::Mapping(format!("не удалось разобрать JSON: {e}")))?;

        WeatherRecord::try_from(parsed)
    }
}

/// Statuses that classify a lookup on their own, before any body is read.
fn classify_status(status: StatusCode, city: &str) -> Option<WeatherError> {
    if status == StatusCode::NOT_FOUND {
        Some(WeatherError::CityNotFound(city.to_string()))
    } else if status == StatusCode::UNAUTHORIZED {
        Some(WeatherError::InvalidCredential)
    } else {
        None
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn lookup(&self, city: &str) -> Result<WeatherRecord> {
        self.fetch_current(city).await
    }
}

// Every field is optional here so that an absent value becomes a mapping error
// naming the field instead of a generic deserialization failure.

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    #[serde(default, deserialize_with = "lenient_meters")]
    visibility: Option<u32>,
}

/// Accepts only a non-negative integer that fits `u32`; anything else reads as absent.
fn lenient_meters<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|v| u32::try_from(v).ok()))
}

impl TryFrom<OwCurrentResponse> for WeatherRecord {
    type Error = WeatherError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self> {
        let city = non_empty(parsed.name, "name")?;
        let country = non_empty(parsed.sys.and_then(|s| s.country), "sys.country")?;

        let main = parsed.main.ok_or_else(|| WeatherError::missing_field("main"))?;
        let temperature = main
            .temp
            .ok_or_else(|| WeatherError::missing_field("main.temp"))?;
        let feels_like = main
            .feels_like
            .ok_or_else(|| WeatherError::missing_field("main.feels_like"))?;
        let humidity = main
            .humidity
            .ok_or_else(|| WeatherError::missing_field("main.humidity"))?;
        let pressure = main
            .pressure
            .ok_or_else(|| WeatherError::missing_field("main.pressure"))?;

        let description = non_empty(
            parsed.weather.into_iter().next().and_then(|w| w.description),
            "weather[0].description",
        )?;

        let wind_speed = parsed
            .wind
            .and_then(|w| w.speed)
            .ok_or_else(|| WeatherError::missing_field("wind.speed"))?;

        if humidity > 100 {
            return Err(WeatherError::Mapping(format!("влажность вне диапазона: {humidity}")));
        }
        if pressure == 0 {
            return Err(WeatherError::Mapping("нулевое давление".to_string()));
        }
        if wind_speed < 0.0 {
            return Err(WeatherError::Mapping(format!(
                "отрицательная скорость ветра: {wind_speed}"
            )));
        }

        Ok(WeatherRecord {
            city,
            country,
            temperature,
            feels_like,
            description,
            humidity,
            pressure,
            wind_speed,
            visibility: Visibility::from(parsed.visibility),
        })
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| WeatherError::missing_field(field))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<WeatherRecord> {
        let parsed: OwCurrentResponse = serde_json::from_value(value).unwrap();
        WeatherRecord::try_from(parsed)
    }

    fn payload() -> serde_json::Value {
        json!({
            "name": "Perm",
            "sys": { "country": "RU" },
            "main": { "temp": 1.5, "feels_like": -2.0, "humidity": 90, "pressure": 1005 },
            "weather": [{ "description": "небольшой снег" }, { "description": "туман" }],
            "wind": { "speed": 3.0 },
            "visibility": 4000
        })
    }

    #[test]
    fn maps_all_fields() {
        let record = parse(payload()).unwrap();

        assert_eq!(record.city, "Perm");
        assert_eq!(record.country, "RU");
        assert_eq!(record.temperature, 1.5);
        assert_eq!(record.feels_like, -2.0);
        assert_eq!(record.description, "небольшой снег");
        assert_eq!(record.humidity, 90);
        assert_eq!(record.pressure, 1005);
        assert_eq!(record.wind_speed, 3.0);
        assert_eq!(record.visibility, Visibility::Meters(4000));
    }

    #[test]
    fn missing_visibility_falls_back() {
        let mut value = payload();
        value.as_object_mut().unwrap().remove("visibility");

        let record = parse(value).unwrap();
        assert_eq!(record.visibility, Visibility::NotAvailable);
    }

    #[test]
    fn malformed_visibility_falls_back() {
        for bad in [json!(10000.0), json!("far"), json!(-5), json!(null)] {
            let mut value = payload();
            value["visibility"] = bad.clone();

            let record = parse(value).unwrap();
            assert_eq!(
                record.visibility,
                Visibility::NotAvailable,
                "visibility {bad} should fall back"
            );
        }
    }

    #[test]
    fn not_found_and_unauthorized_classify_from_status() {
        let not_found = classify_status(StatusCode::NOT_FOUND, "Nowhere");
        assert!(matches!(not_found, Some(WeatherError::CityNotFound(city)) if city == "Nowhere"));

        let unauthorized = classify_status(StatusCode::UNAUTHORIZED, "Moscow");
        assert!(matches!(unauthorized, Some(WeatherError::InvalidCredential)));

        assert!(classify_status(StatusCode::OK, "Moscow").is_none());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "Moscow").is_none());
    }

    #[test]
    fn required_fields_produce_mapping_errors() {
        let cases = [
            ("name", json!({ "name": null })),
            ("sys.country", json!({ "sys": {} })),
            (
                "main.temp",
                json!({ "main": { "feels_like": 1.0, "humidity": 1, "pressure": 1 } }),
            ),
            ("weather[0].description", json!({ "weather": [] })),
            ("wind.speed", json!({ "wind": {} })),
        ];

        for (field, patch) in cases {
            let mut value = payload();
            for (k, v) in patch.as_object().unwrap() {
                value[k] = v.clone();
            }

            let err = parse(value).unwrap_err();
            assert!(
                matches!(&err, WeatherError::Mapping(msg) if msg.contains(field)),
                "expected mapping error for {field}, got {err:?}"
            );
        }
    }

    #[test]
    fn empty_city_name_is_rejected() {
        let mut value = payload();
        value["name"] = json!("");
        assert!(matches!(parse(value), Err(WeatherError::Mapping(_))));
    }

    #[test]
    fn humidity_above_hundred_is_rejected() {
        let mut value = payload();
        value["main"]["humidity"] = json!(140);
        assert!(matches!(parse(value), Err(WeatherError::Mapping(_))));
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "я".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
