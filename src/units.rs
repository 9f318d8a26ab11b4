//! Temperature units and roast-stage reference temperatures.
//!
//! Sensors always report Celsius. Readings are converted once, at acquisition
//! time, into the configured display unit, and persisted roasts are always
//! stored in Fahrenheit.

use serde::{Deserialize, Serialize};

/// Unit a temperature value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => c_to_f(celsius),
        }
    }

    /// Convert a value expressed in this unit into Fahrenheit.
    pub fn to_fahrenheit(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => c_to_f(value),
            TemperatureUnit::Fahrenheit => value,
        }
    }

    /// Convert a Fahrenheit value into this unit.
    pub fn from_fahrenheit(self, fahrenheit: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => f_to_c(fahrenheit),
            TemperatureUnit::Fahrenheit => fahrenheit,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Convert Celsius to Fahrenheit.
pub fn c_to_f(temp: f64) -> f64 {
    temp * 9.0 / 5.0 + 32.0
}

/// Convert Fahrenheit to Celsius.
pub fn f_to_c(temp: f64) -> f64 {
    (temp - 32.0) * 5.0 / 9.0
}

/// Named roast levels with the bean temperature (°F) at which they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoastStage {
    City,
    CityPlus,
    FullCity,
    FullCityPlus,
    Vienna,
}

impl RoastStage {
    pub const ALL: [RoastStage; 5] = [
        RoastStage::City,
        RoastStage::CityPlus,
        RoastStage::FullCity,
        RoastStage::FullCityPlus,
        RoastStage::Vienna,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RoastStage::City => "City",
            RoastStage::CityPlus => "City+",
            RoastStage::FullCity => "Full City",
            RoastStage::FullCityPlus => "Full City+",
            RoastStage::Vienna => "Vienna",
        }
    }

    pub fn temperature_f(self) -> f64 {
        match self {
            RoastStage::City => 422.0,
            RoastStage::CityPlus => 432.0,
            RoastStage::FullCity => 441.0,
            RoastStage::FullCityPlus => 450.0,
            RoastStage::Vienna => 463.0,
        }
    }

    /// Highest stage reached at the given bean temperature, if any.
    pub fn for_temperature_f(temp_f: f64) -> Option<RoastStage> {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|stage| temp_f >= stage.temperature_f())
    }
}

/// Horizontal reference line for a roast stage, in a display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub stage: RoastStage,
    pub label: String,
    pub temperature: f64,
}

/// Reference lines for every roast stage expressed in `unit`.
pub fn reference_lines(unit: TemperatureUnit) -> Vec<ReferenceLine> {
    RoastStage::ALL
        .iter()
        .map(|stage| ReferenceLine {
            stage: *stage,
            label: stage.label().to_string(),
            temperature: unit.from_fahrenheit(stage.temperature_f()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_known_conversions() {
        assert!((c_to_f(20.0) - 68.0).abs() < EPS);
        assert!((f_to_c(212.0) - 100.0).abs() < EPS);
        assert!((c_to_f(-40.0) - -40.0).abs() < EPS);
    }

    #[test]
    fn test_unit_round_trip() {
        for t in [-273.15, -40.0, 0.0, 21.5, 100.0, 232.7, 1e4] {
            assert!((f_to_c(c_to_f(t)) - t).abs() < 1e-9, "round trip failed for {t}");
        }
    }

    #[test]
    fn test_unit_from_celsius() {
        assert_eq!(TemperatureUnit::Celsius.from_celsius(25.0), 25.0);
        assert!((TemperatureUnit::Fahrenheit.from_celsius(100.0) - 212.0).abs() < EPS);
    }

    #[test]
    fn test_stage_classification() {
        assert_eq!(RoastStage::for_temperature_f(400.0), None);
        assert_eq!(RoastStage::for_temperature_f(422.0), Some(RoastStage::City));
        assert_eq!(
            RoastStage::for_temperature_f(445.0),
            Some(RoastStage::FullCity)
        );
        assert_eq!(RoastStage::for_temperature_f(500.0), Some(RoastStage::Vienna));
    }

    #[test]
    fn test_reference_lines_follow_unit() {
        let lines_f = reference_lines(TemperatureUnit::Fahrenheit);
        assert_eq!(lines_f.len(), 5);
        assert_eq!(lines_f[0].label, "City");
        assert_eq!(lines_f[0].temperature, 422.0);

        let lines_c = reference_lines(TemperatureUnit::Celsius);
        assert!((lines_c[4].temperature - f_to_c(463.0)).abs() < EPS);
    }
}
