//! OpenWeather current-conditions adapter.
//!
//! Normalizes the `/data/2.5/weather` JSON into the canonical [`Weather`]
//! record and computes the composite fire-weather index.

use std::sync::Arc;

use serde::Deserialize;

use forest_common::{clamp_pct, fire_weather_index, Category, ProviderError, Route, Weather};

use crate::http::HttpFetch;
use crate::params::WeatherQuery;

pub const SOURCE: &str = "openweather";
const DEFAULT_BASE: &str = "https://api.openweathermap.org";

#[derive(Debug, Default, Deserialize)]
struct OwResponse {
    #[serde(default)]
    main: Option<OwMain>,
    #[serde(default)]
    wind: Option<OwWind>,
    #[serde(default)]
    clouds: Option<OwClouds>,
    #[serde(default)]
    rain: Option<OwRain>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: Option<OwSys>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(default, rename = "1h")]
    one_hour: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwCondition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

pub struct OpenWeatherAdapter {
    http: Arc<dyn HttpFetch>,
    base_url: String,
}

impl OpenWeatherAdapter {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE.to_string(),
        }
    }

    pub fn with_base_url(http: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch(&self, query: &WeatherQuery, api_key: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, query.lat, query.lng, api_key
        );

        self.http
            .get_text(&url)
            .await
            .map_err(|cause| ProviderError::new(Category::Weather, Route::Direct, cause))
    }

    /// Parse a current-conditions payload. A payload without the `main`
    /// block carries no usable observation and parses to an empty list.
    pub fn parse(&self, raw: &str) -> Vec<Weather> {
        let response: OwResponse = match serde_json::from_str(raw) {
            Ok(r) => r,
            Err(_) => return Vec::new(),
        };

        let Some(main) = response.main else {
            return Vec::new();
        };

        let precipitation = response.rain.map(|r| r.one_hour).unwrap_or(0.0);
        let humidity = clamp_pct(main.humidity);
        let location = match response.sys {
            Some(sys) if !sys.country.is_empty() && !response.name.is_empty() => {
                format!("{}, {}", response.name, sys.country)
            }
            _ if !response.name.is_empty() => response.name.clone(),
            _ => "unknown".to_string(),
        };

        vec![Weather {
            temperature_c: main.temp,
            humidity_pct: humidity,
            precipitation_mm: precipitation,
            wind_speed: response.wind.map(|w| w.speed).unwrap_or(0.0),
            pressure: main.pressure,
            cloud_cover_pct: clamp_pct(response.clouds.map(|c| c.all).unwrap_or(0.0)),
            fire_weather_index: fire_weather_index(main.temp, humidity, precipitation),
            location,
            description: response
                .weather
                .first()
                .map(|c| c.description.clone())
                .unwrap_or_default(),
            source: SOURCE.to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> OpenWeatherAdapter {
        OpenWeatherAdapter::new(Arc::new(crate::http::testing::NeverFetch))
    }

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"{
            "main": {"temp": 30.0, "humidity": 20.0, "pressure": 1012.0},
            "wind": {"speed": 3.4},
            "clouds": {"all": 40.0},
            "rain": {"1h": 0.0},
            "sys": {"country": "BR"},
            "weather": [{"description": "scattered clouds"}],
            "name": "Manaus"
        }"#;

        let records = adapter().parse(raw);
        assert_eq!(records.len(), 1);
        let weather = &records[0];
        assert_eq!(weather.temperature_c, 30.0);
        assert_eq!(weather.location, "Manaus, BR");
        assert_eq!(weather.source, SOURCE);
        // (80 + 10 + 30) / 3
        assert!((weather.fire_weather_index - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_missing_rain_defaults_to_zero() {
        let raw = r#"{"main": {"temp": 22.0, "humidity": 85.0, "pressure": 1008.0}, "name": "X"}"#;
        let records = adapter().parse(raw);
        assert_eq!(records[0].precipitation_mm, 0.0);
        assert_eq!(records[0].wind_speed, 0.0);
    }

    #[test]
    fn test_parse_is_total() {
        assert!(adapter().parse("").is_empty());
        assert!(adapter().parse("{}").is_empty());
        assert!(adapter().parse("<gateway timeout>").is_empty());
    }
}
