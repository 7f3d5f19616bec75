use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

use super::ParameterValue;

/// Weather snapshot for one region at one instant.
///
/// Units: temperature °C, humidity %, wind speed km/h, rainfall mm/hr.
/// Every field may be omitted or `null` on the wire; missing values resolve to
/// benign conditions rather than failing the request.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "WeatherPayload")]
pub struct WeatherFeatures {
    #[validate(range(min = -60.0, max = 60.0))]
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,
    #[validate(range(min = 0.0))]
    pub wind_speed: f64,
    #[validate(range(min = 0.0))]
    pub rainfall: f64,
    pub lightning_strikes: u32,
    pub storm_alert: bool,
    /// Surface pressure (hPa), informational.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Visibility (km), informational.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl WeatherFeatures {
    pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
    pub const DEFAULT_HUMIDITY_PERCENT: f64 = 60.0;

    /// Numeric view of a field. Flags read as 0/1, absent optionals as `None`.
    pub fn get(&self, field: WeatherField) -> Option<f64> {
        match field {
            WeatherField::Temperature => Some(self.temperature),
            WeatherField::Humidity => Some(self.humidity),
            WeatherField::WindSpeed => Some(self.wind_speed),
            WeatherField::Rainfall => Some(self.rainfall),
            WeatherField::LightningStrikes => Some(self.lightning_strikes as f64),
            WeatherField::StormAlert => Some(if self.storm_alert { 1.0 } else { 0.0 }),
            WeatherField::Pressure => self.pressure,
            WeatherField::Visibility => self.visibility,
        }
    }

    /// Overwrite one field. Counts are rounded to the nearest whole strike.
    pub fn set(&mut self, field: WeatherField, value: ParameterValue) -> Result<(), String> {
        match field {
            WeatherField::Temperature => self.temperature = value.finite()?,
            WeatherField::Humidity => self.humidity = value.finite()?,
            WeatherField::WindSpeed => self.wind_speed = value.finite()?,
            WeatherField::Rainfall => self.rainfall = value.finite()?,
            WeatherField::LightningStrikes => self.lightning_strikes = value.count()?,
            WeatherField::StormAlert => self.storm_alert = value.as_bool(),
            WeatherField::Pressure => self.pressure = Some(value.finite()?),
            WeatherField::Visibility => self.visibility = Some(value.finite()?),
        }
        Ok(())
    }
}

impl Default for WeatherFeatures {
    fn default() -> Self {
        WeatherPayload::default().into()
    }
}

/// Addressable weather fields, named as they appear in override paths.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeatherField {
    Temperature,
    Humidity,
    WindSpeed,
    Rainfall,
    LightningStrikes,
    StormAlert,
    Pressure,
    Visibility,
}

/// Wire form of [`WeatherFeatures`] where every field is nullable.
#[derive(Debug, Default, Deserialize)]
struct WeatherPayload {
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    rainfall: Option<f64>,
    lightning_strikes: Option<u32>,
    storm_alert: Option<bool>,
    pressure: Option<f64>,
    visibility: Option<f64>,
}

impl From<WeatherPayload> for WeatherFeatures {
    fn from(p: WeatherPayload) -> Self {
        Self {
            temperature: p.temperature.unwrap_or(Self::DEFAULT_TEMPERATURE_C),
            humidity: p.humidity.unwrap_or(Self::DEFAULT_HUMIDITY_PERCENT),
            wind_speed: p.wind_speed.unwrap_or(0.0),
            rainfall: p.rainfall.unwrap_or(0.0),
            lightning_strikes: p.lightning_strikes.unwrap_or(0),
            storm_alert: p.storm_alert.unwrap_or(false),
            pressure: p.pressure,
            visibility: p.visibility,
        }
    }
}
