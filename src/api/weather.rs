//! Weather forecast endpoint consumed by the dashboard.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiFailure};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyForecast {
    pub date: String,
    pub temp: f64,
    pub weather: String,
    pub icon: String,
}

impl ApiClient {
    /// GET /weather?lat&lon
    pub async fn weather_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<DailyForecast>, ApiFailure> {
        let req = self
            .request(Method::GET, "/weather")
            .query(&[("lat", lat), ("lon", lon)]);
        let (data, _) = self
            .execute::<Vec<DailyForecast>>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal mengambil data prakiraan cuaca"))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_list_deserializes() {
        let json = r#"[
            {"date": "2025-06-01", "temp": 29.5, "weather": "Cerah", "icon": "01d"},
            {"date": "2025-06-02", "temp": 27.0, "weather": "Hujan ringan", "icon": "10d"}
        ]"#;
        let forecast: Vec<DailyForecast> = serde_json::from_str(json).unwrap();
        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast[1].weather, "Hujan ringan");
    }
}
