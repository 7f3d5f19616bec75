use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

use super::ParameterValue;

/// Distribution-grid condition snapshot for the feeder being scored.
///
/// Fractions are in [0, 1]. Missing values assume a healthy grid: full
/// voltage stability and feeder health, no load, no maintenance.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "GridPayload")]
pub struct GridFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substation_id: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub load_factor: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub voltage_stability: f64,
    pub historical_outages: u32,
    pub maintenance_status: bool,
    #[validate(range(min = 0.0, max = 1.0))]
    pub feeder_health: f64,
    /// Transformer loading fraction, informational.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformer_load: Option<f64>,
}

impl GridFeatures {
    /// Numeric view of a field. Flags read as 0/1, absent optionals as `None`.
    pub fn get(&self, field: GridField) -> Option<f64> {
        match field {
            GridField::LoadFactor => Some(self.load_factor),
            GridField::VoltageStability => Some(self.voltage_stability),
            GridField::HistoricalOutages => Some(self.historical_outages as f64),
            GridField::MaintenanceStatus => Some(if self.maintenance_status { 1.0 } else { 0.0 }),
            GridField::FeederHealth => Some(self.feeder_health),
            GridField::TransformerLoad => self.transformer_load,
        }
    }

    pub fn set(&mut self, field: GridField, value: ParameterValue) -> Result<(), String> {
        match field {
            GridField::LoadFactor => self.load_factor = value.finite()?,
            GridField::VoltageStability => self.voltage_stability = value.finite()?,
            GridField::HistoricalOutages => self.historical_outages = value.count()?,
            GridField::MaintenanceStatus => self.maintenance_status = value.as_bool(),
            GridField::FeederHealth => self.feeder_health = value.finite()?,
            GridField::TransformerLoad => self.transformer_load = Some(value.finite()?),
        }
        Ok(())
    }
}

impl Default for GridFeatures {
    fn default() -> Self {
        GridPayload::default().into()
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GridField {
    LoadFactor,
    VoltageStability,
    HistoricalOutages,
    MaintenanceStatus,
    FeederHealth,
    TransformerLoad,
}

#[derive(Debug, Default, Deserialize)]
struct GridPayload {
    substation_id: Option<String>,
    load_factor: Option<f64>,
    voltage_stability: Option<f64>,
    historical_outages: Option<u32>,
    maintenance_status: Option<bool>,
    feeder_health: Option<f64>,
    transformer_load: Option<f64>,
}

impl From<GridPayload> for GridFeatures {
    fn from(p: GridPayload) -> Self {
        Self {
            substation_id: p.substation_id,
            load_factor: p.load_factor.unwrap_or(0.0),
            voltage_stability: p.voltage_stability.unwrap_or(1.0),
            historical_outages: p.historical_outages.unwrap_or(0),
            maintenance_status: p.maintenance_status.unwrap_or(false),
            feeder_health: p.feeder_health.unwrap_or(1.0),
            transformer_load: p.transformer_load,
        }
    }
}
