use serde::Serialize;
use std::fmt::{Display, Formatter};

const DAY: f64 = 86_400.0;
const HOUR: f64 = 3_600.0;
const STB: f64 = 0.158_987_294_928;
const MSCF: f64 = 28.316_846_592;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitSystem {
    #[default]
    Metric,
    Field,
    Lab,
}

impl UnitSystem {
    /// Marker keyword in RUNSPEC selecting this system.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "METRIC" => Some(Self::Metric),
            "FIELD" => Some(Self::Field),
            "LAB" => Some(Self::Lab),
            _ => None,
        }
    }

    /// INTEHEAD unit code as written by the simulators.
    pub fn from_intehead(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Metric),
            2 => Some(Self::Field),
            3 => Some(Self::Lab),
            _ => None,
        }
    }

    pub const fn intehead_code(self) -> i32 {
        match self {
            Self::Metric => 1,
            Self::Field => 2,
            Self::Lab => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "METRIC",
            Self::Field => "FIELD",
            Self::Lab => "LAB",
        }
    }

    pub fn si_factor(self, dimension: &str) -> Option<f64> {
        let factor = match (self, dimension) {
            (_, "1") => 1.0,
            (Self::Metric, "Pressure") => 1.0e5,
            (Self::Field, "Pressure") => 6_894.757_293_168,
            (Self::Lab, "Pressure") => 101_325.0,
            (Self::Metric | Self::Field, "Time") => DAY,
            (Self::Lab, "Time") => HOUR,
            (Self::Metric, "Length") => 1.0,
            (Self::Field, "Length") => 0.3048,
            (Self::Lab, "Length") => 0.01,
            (
                Self::Metric,
                "LiquidSurfaceVolume/Time" | "GasSurfaceVolume/Time" | "ReservoirVolume/Time",
            ) => 1.0 / DAY,
            (Self::Field, "LiquidSurfaceVolume/Time" | "ReservoirVolume/Time") => STB / DAY,
            (Self::Field, "GasSurfaceVolume/Time") => MSCF / DAY,
            (
                Self::Lab,
                "LiquidSurfaceVolume/Time" | "GasSurfaceVolume/Time" | "ReservoirVolume/Time",
            ) => 1.0e-6 / HOUR,
            (_, "Length*Length") => self.si_factor("Length")?.powi(2),
            (_, "Length*Length*Length") => self.si_factor("Length")?.powi(3),
            _ => return None,
        };
        Some(factor)
    }

    pub fn to_si(self, dimension: &str, value: f64) -> f64 {
        match self.si_factor(dimension) {
            Some(factor) => value * factor,
            None => {
                tracing::trace!(dimension, unit_system = self.as_str(), "no SI factor");
                value
            }
        }
    }

    pub fn from_si(self, dimension: &str, value: f64) -> f64 {
        match self.si_factor(dimension) {
            Some(factor) => value / factor,
            None => value,
        }
    }
}

impl Display for UnitSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::UnitSystem;

    #[test]
    fn field_pressure_converts_to_pascal() {
        let pascal = UnitSystem::Field.to_si("Pressure", 14.5);
        assert!((pascal - 99_973.98).abs() < 0.1);
    }

    #[test]
    fn metric_rate_is_per_second() {
        let rate = UnitSystem::Metric.to_si("LiquidSurfaceVolume/Time", 86_400.0);
        assert!((rate - 1.0).abs() < 1.0e-12);
        assert!((UnitSystem::Metric.from_si("LiquidSurfaceVolume/Time", rate) - 86_400.0).abs() < 1.0e-9);
    }

    #[test]
    fn field_segment_volume_uses_cubic_feet() {
        let volume = UnitSystem::Field.to_si("Length*Length*Length", 1.0);
        assert!((volume - 0.028_316_846_592).abs() < 1.0e-12);
    }

    #[test]
    fn unknown_dimension_passes_value_through() {
        assert_eq!(UnitSystem::Lab.to_si("Viscosity", 3.0), 3.0);
    }

    #[test]
    fn intehead_codes_are_symmetric() {
        for system in [UnitSystem::Metric, UnitSystem::Field, UnitSystem::Lab] {
            assert_eq!(UnitSystem::from_intehead(system.intehead_code()), Some(system));
        }
    }
}
