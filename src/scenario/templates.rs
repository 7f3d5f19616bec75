use serde::Serialize;
use serde_json::json;

use super::overrides::Overrides;

/// A named, ready-made override set.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub modifications: Overrides,
}

fn template(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    modifications: serde_json::Value,
) -> ScenarioTemplate {
    let modifications = match modifications {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => Overrides::new(),
    };
    ScenarioTemplate {
        key,
        name,
        description,
        modifications,
    }
}

pub fn templates() -> Vec<ScenarioTemplate> {
    vec![
        template(
            "severe_weather",
            "Severe Weather Impact",
            "Simulate impact of severe weather conditions",
            json!({
                "weather.rainfall": 50.0,
                "weather.wind_speed": 80.0,
                "weather.storm_alert": true
            }),
        ),
        template(
            "high_demand",
            "High Demand Scenario",
            "Simulate impact of increased electrical demand",
            json!({
                "grid.load_factor": 0.95,
                "weather.temperature": 40.0
            }),
        ),
        template(
            "maintenance_impact",
            "Maintenance Impact",
            "Simulate impact of grid maintenance",
            json!({
                "grid.maintenance_status": true,
                "grid.feeder_health": 0.6
            }),
        ),
        template(
            "lightning_storm",
            "Lightning Storm",
            "Simulate impact of lightning activity",
            json!({
                "weather.lightning_strikes": 15,
                "weather.storm_alert": true,
                "weather.rainfall": 25.0
            }),
        ),
        template(
            "grid_failure",
            "Grid Vulnerability",
            "Simulate impact of grid vulnerabilities",
            json!({
                "grid.voltage_stability": 0.5,
                "grid.feeder_health": 0.4
            }),
        ),
    ]
}

pub fn find(key: &str) -> Option<ScenarioTemplate> {
    templates().into_iter().find(|t| t.key == key)
}
