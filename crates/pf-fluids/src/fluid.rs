//! Property-law backed fluid.

use crate::error::{FluidError, FluidResult};
use crate::property::FluidProperty;
use crate::provider::FluidProvider;
use pf_core::constants::NORMAL_TEMPERATURE;
use serde::{Deserialize, Serialize};

/// Aggregate state that selects the flow equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Liquid,
    Gas,
}

/// A fluid described by one property law per quantity.
///
/// Density, viscosity and heat capacity are functions of temperature,
/// compressibility is a function of absolute pressure (gases only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluid {
    pub name: String,
    pub phase: Phase,
    pub density: FluidProperty,
    pub viscosity: FluidProperty,
    pub heat_capacity: FluidProperty,
    #[serde(default)]
    pub compressibility: Option<FluidProperty>,
}

impl Fluid {
    /// Build and validate a fluid.
    pub fn new(
        name: impl Into<String>,
        phase: Phase,
        density: FluidProperty,
        viscosity: FluidProperty,
        heat_capacity: FluidProperty,
        compressibility: Option<FluidProperty>,
    ) -> FluidResult<Self> {
        let fluid = Self {
            name: name.into(),
            phase,
            density,
            viscosity,
            heat_capacity,
            compressibility,
        };
        fluid.validate()?;
        Ok(fluid)
    }

    /// Load a fluid definition from YAML.
    pub fn from_yaml_str(text: &str) -> FluidResult<Self> {
        let fluid: Self = serde_yaml::from_str(text).map_err(|e| FluidError::Parse {
            message: e.to_string(),
        })?;
        fluid.validate()?;
        Ok(fluid)
    }

    pub fn validate(&self) -> FluidResult<()> {
        self.density.validate("density")?;
        self.viscosity.validate("viscosity")?;
        self.heat_capacity.validate("heat_capacity")?;
        match (&self.compressibility, self.phase) {
            (Some(z), _) => z.validate("compressibility")?,
            (None, Phase::Gas) => {
                return Err(FluidError::MissingCompressibility {
                    name: self.name.clone(),
                });
            }
            (None, Phase::Liquid) => {}
        }

        let t_ref = NORMAL_TEMPERATURE + 20.0;
        if self.density.value(t_ref) <= 0.0 {
            return Err(FluidError::NonPhysical { what: "density" });
        }
        if self.viscosity.value(t_ref) <= 0.0 {
            return Err(FluidError::NonPhysical { what: "viscosity" });
        }
        if self.heat_capacity.value(t_ref) <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "heat_capacity",
            });
        }
        Ok(())
    }

    /// Liquid water at moderate pressure, 0..120 °C.
    pub fn water() -> Self {
        let t = vec![273.15, 293.15, 313.15, 333.15, 353.15, 373.15, 393.15];
        Self {
            name: "water".into(),
            phase: Phase::Liquid,
            density: FluidProperty::Interpolated {
                x: t.clone(),
                y: vec![999.84, 998.21, 992.22, 983.20, 971.80, 958.35, 943.10],
            },
            viscosity: FluidProperty::Interpolated {
                x: t.clone(),
                y: vec![
                    1.792e-3, 1.002e-3, 0.653e-3, 0.467e-3, 0.355e-3, 0.282e-3, 0.232e-3,
                ],
            },
            heat_capacity: FluidProperty::Interpolated {
                x: t,
                y: vec![4219.9, 4184.1, 4178.5, 4184.3, 4196.9, 4216.0, 4245.0],
            },
            compressibility: None,
        }
    }

    /// High-calorific natural gas (normal density 0.7494 kg/m³).
    pub fn hgas() -> Self {
        Self {
            name: "hgas".into(),
            phase: Phase::Gas,
            density: FluidProperty::constant(0.7494),
            viscosity: FluidProperty::constant(1.085e-5),
            heat_capacity: FluidProperty::constant(2_165.0),
            compressibility: Some(FluidProperty::linear(1.0, -0.0022)),
        }
    }
}

impl FluidProvider for Fluid {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_gas(&self) -> bool {
        self.phase == Phase::Gas
    }

    fn density(&self, t: f64) -> f64 {
        match self.phase {
            Phase::Liquid => self.density.value(t),
            Phase::Gas => self.density.value(NORMAL_TEMPERATURE),
        }
    }

    fn viscosity(&self, t: f64) -> f64 {
        self.viscosity.value(t)
    }

    fn heat_capacity(&self, t: f64) -> f64 {
        self.heat_capacity.value(t)
    }

    fn compressibility(&self, p: f64) -> f64 {
        self.compressibility.as_ref().map_or(1.0, |z| z.value(p))
    }

    fn der_compressibility(&self, p: f64) -> f64 {
        self.compressibility.as_ref().map_or(0.0, |z| z.derivative(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        Fluid::water().validate().unwrap();
        Fluid::hgas().validate().unwrap();
    }

    #[test]
    fn water_density_decreases_with_temperature() {
        let w = Fluid::water();
        assert!(w.density(360.0) < w.density(300.0));
        assert_eq!(w.compressibility(5.0), 1.0);
        assert_eq!(w.der_compressibility(5.0), 0.0);
    }

    #[test]
    fn gas_without_compressibility_is_rejected() {
        let err = Fluid::new(
            "lgas",
            Phase::Gas,
            FluidProperty::constant(0.8),
            FluidProperty::constant(1e-5),
            FluidProperty::constant(2000.0),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FluidError::MissingCompressibility { .. }));
    }

    #[test]
    fn loads_from_yaml() {
        let yaml = r#"
name: oil
phase: liquid
density: { kind: linear, offset: 1100.0, slope: -0.7 }
viscosity: { kind: constant, value: 0.01 }
heat_capacity: { kind: constant, value: 1900.0 }
"#;
        let oil = Fluid::from_yaml_str(yaml).unwrap();
        assert_eq!(oil.name(), "oil");
        assert!((oil.density(300.0) - 890.0).abs() < 1e-9);
    }
}
