//! 天气服务（OpenWeatherMap）
//!
//! 两步查询：先地理编码（城市 -> 经纬度，取第一条结果），再取当前天气；
//! 温度从开尔文换算为摄氏并保留一位小数。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::OpenWeatherSection;

/// 天气服务失败的封闭集合
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("city '{0}' not found")]
    CityNotFound(String),

    #[error("weather service timeout")]
    Timeout,

    #[error("weather api request failed: {0}")]
    Api(String),

    #[error("invalid weather api response: {0}")]
    BadResponse(String),
}

/// 归一化后的天气记录
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub condition: String,
    pub description: String,
    /// 摄氏
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    /// m/s
    pub wind_speed: f64,
}

/// 天气数据提供方；测试时用桩实现替换
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn lookup(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

/// OpenWeatherMap 客户端
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
    geo_url: String,
    weather_url: String,
    timeout: Duration,
}

impl OpenWeatherClient {
    pub fn new(cfg: &OpenWeatherSection, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: cfg.api_key.clone(),
            geo_url: cfg.geo_url.clone(),
            weather_url: cfg.weather_url.clone(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 城市 -> 经纬度；地理编码空结果视为城市不存在
    async fn geocode(&self, city: &str) -> Result<(f64, f64), WeatherError> {
        let response = self
            .http
            .get(&self.geo_url)
            .query(&[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?;

        let data: Value = response.json().await.map_err(map_reqwest_error)?;
        parse_coordinates(city, &data)
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherReport, WeatherError> {
        let response = self
            .http
            .get(&self.weather_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?;

        let data: Value = response.json().await.map_err(map_reqwest_error)?;
        parse_weather(&data)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn lookup(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let (lat, lon) = self.geocode(city).await?;
        self.current_weather(lat, lon).await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> WeatherError {
    if e.is_timeout() {
        WeatherError::Timeout
    } else {
        WeatherError::Api(e.to_string())
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    ((kelvin - 273.15) * 10.0).round() / 10.0
}

fn parse_coordinates(city: &str, data: &Value) -> Result<(f64, f64), WeatherError> {
    let results = data
        .as_array()
        .ok_or_else(|| WeatherError::BadResponse("geocoding result is not an array".into()))?;
    let first = results
        .first()
        .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))?;

    let lat = first
        .get("lat")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::BadResponse("missing lat".into()))?;
    let lon = first
        .get("lon")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::BadResponse("missing lon".into()))?;
    Ok((lat, lon))
}

fn parse_weather(data: &Value) -> Result<WeatherReport, WeatherError> {
    let weather = data
        .pointer("/weather/0")
        .ok_or_else(|| WeatherError::BadResponse("missing weather block".into()))?;
    let main = data
        .get("main")
        .ok_or_else(|| WeatherError::BadResponse("missing main block".into()))?;

    let temp = main
        .get("temp")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::BadResponse("missing temp".into()))?;
    let feels_like = main
        .get("feels_like")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::BadResponse("missing feels_like".into()))?;

    Ok(WeatherReport {
        city: str_or(data, "name", "Unknown"),
        country: data
            .pointer("/sys/country")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        condition: str_or(weather, "main", "Unknown"),
        description: str_or(weather, "description", ""),
        temperature: kelvin_to_celsius(temp),
        feels_like: kelvin_to_celsius(feels_like),
        humidity: main.get("humidity").and_then(Value::as_i64).unwrap_or(0),
        wind_speed: data
            .pointer("/wind/speed")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    })
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kelvin_to_celsius_rounds_one_decimal() {
        assert_eq!(kelvin_to_celsius(300.0), 26.9);
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
    }

    #[test]
    fn test_parse_coordinates_empty_is_not_found() {
        let err = parse_coordinates("Nowhereistan", &json!([])).unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound(city) if city == "Nowhereistan"));
    }

    #[test]
    fn test_parse_coordinates_first_result() {
        let data = json!([
            {"name": "London", "lat": 51.5, "lon": -0.12},
            {"name": "London", "lat": 42.98, "lon": -81.24}
        ]);
        assert_eq!(parse_coordinates("London", &data).unwrap(), (51.5, -0.12));
    }

    #[test]
    fn test_parse_coordinates_non_array_is_bad_response() {
        let err = parse_coordinates("London", &json!({"cod": 401})).unwrap_err();
        assert!(matches!(err, WeatherError::BadResponse(_)));
    }

    #[test]
    fn test_parse_weather() {
        let data = json!({
            "name": "Chennai",
            "sys": {"country": "IN"},
            "weather": [{"main": "Haze", "description": "haze"}],
            "main": {"temp": 303.15, "feels_like": 308.4, "humidity": 70},
            "wind": {"speed": 3.6}
        });
        let report = parse_weather(&data).unwrap();
        assert_eq!(report.city, "Chennai");
        assert_eq!(report.country, "IN");
        assert_eq!(report.condition, "Haze");
        assert_eq!(report.temperature, 30.0);
        assert_eq!(report.feels_like, 35.3);
        assert_eq!(report.humidity, 70);
        assert_eq!(report.wind_speed, 3.6);
    }

    #[test]
    fn test_parse_weather_missing_temp() {
        let data = json!({
            "weather": [{"main": "Clear"}],
            "main": {"humidity": 50}
        });
        assert!(matches!(
            parse_weather(&data).unwrap_err(),
            WeatherError::BadResponse(_)
        ));
    }
}
