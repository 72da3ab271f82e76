//! Network container.

use std::fmt;
use std::sync::Arc;

use pf_fluids::FluidProvider;

use crate::elements::*;
use crate::error::{NetError, NetResult};
use crate::table::Table;

/// All input tables of one pipe network plus its fluid.
pub struct Net {
    pub name: String,
    pub fluid: Option<Arc<dyn FluidProvider>>,
    pub junction: Table<Junction>,
    pub ext_grid: Table<ExtGrid>,
    pub sink: Table<Sink>,
    pub source: Table<Source>,
    pub pipe: Table<Pipe>,
    pub valve: Table<Valve>,
    pub pump: Table<Pump>,
    pub flow_control: Table<FlowControl>,
    pub pressure_control: Table<PressureControl>,
    pub heat_exchanger: Table<HeatExchanger>,
    pub circ_pump_pressure: Table<CirculationPumpPressure>,
    pub circ_pump_mass: Table<CirculationPumpMass>,
}

impl Net {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fluid: None,
            junction: Table::new("junction"),
            ext_grid: Table::new("ext_grid"),
            sink: Table::new("sink"),
            source: Table::new("source"),
            pipe: Table::new("pipe"),
            valve: Table::new("valve"),
            pump: Table::new("pump"),
            flow_control: Table::new("flow_control"),
            pressure_control: Table::new("pressure_control"),
            heat_exchanger: Table::new("heat_exchanger"),
            circ_pump_pressure: Table::new("circ_pump_pressure"),
            circ_pump_mass: Table::new("circ_pump_mass"),
        }
    }

    pub fn with_fluid(mut self, fluid: Arc<dyn FluidProvider>) -> Self {
        self.fluid = Some(fluid);
        self
    }

    pub fn set_fluid(&mut self, fluid: Arc<dyn FluidProvider>) {
        self.fluid = Some(fluid);
    }

    /// Check junction references and geometric parameters of all elements.
    pub fn validate(&self) -> NetResult<()> {
        for (idx, eg) in self.ext_grid.iter() {
            self.check_junction("ext_grid", idx, eg.junction)?;
        }
        for (idx, s) in self.sink.iter() {
            self.check_junction("sink", idx, s.junction)?;
        }
        for (idx, s) in self.source.iter() {
            self.check_junction("source", idx, s.junction)?;
        }
        for (idx, p) in self.pipe.iter() {
            self.check_pair("pipe", idx, p.from_junction, p.to_junction)?;
            check_positive("pipe", idx, p.length_m, "length must be positive")?;
            check_positive("pipe", idx, p.diameter_m, "diameter must be positive")?;
            if p.sections == 0 {
                return Err(NetError::InvalidParameter {
                    table: "pipe",
                    element: idx,
                    what: "sections must be at least 1",
                });
            }
        }
        for (idx, v) in self.valve.iter() {
            self.check_pair("valve", idx, v.from_junction, v.to_junction)?;
            check_positive("valve", idx, v.diameter_m, "diameter must be positive")?;
        }
        for (idx, p) in self.pump.iter() {
            self.check_pair("pump", idx, p.from_junction, p.to_junction)?;
        }
        for (idx, f) in self.flow_control.iter() {
            self.check_pair("flow_control", idx, f.from_junction, f.to_junction)?;
            check_positive("flow_control", idx, f.diameter_m, "diameter must be positive")?;
        }
        for (idx, pc) in self.pressure_control.iter() {
            self.check_pair("pressure_control", idx, pc.from_junction, pc.to_junction)?;
            self.check_junction("pressure_control", idx, pc.controlled_junction)?;
        }
        for (idx, h) in self.heat_exchanger.iter() {
            self.check_pair("heat_exchanger", idx, h.from_junction, h.to_junction)?;
            check_positive("heat_exchanger", idx, h.diameter_m, "diameter must be positive")?;
        }
        for (idx, c) in self.circ_pump_pressure.iter() {
            self.check_pair("circ_pump_pressure", idx, c.return_junction, c.flow_junction)?;
        }
        for (idx, c) in self.circ_pump_mass.iter() {
            self.check_pair("circ_pump_mass", idx, c.return_junction, c.flow_junction)?;
        }
        Ok(())
    }

    fn check_junction(&self, table: &'static str, element: usize, junction: usize) -> NetResult<()> {
        if self.junction.position(junction).is_some() {
            Ok(())
        } else {
            Err(NetError::UnknownJunction {
                table,
                element,
                junction,
            })
        }
    }

    fn check_pair(&self, table: &'static str, element: usize, a: usize, b: usize) -> NetResult<()> {
        self.check_junction(table, element, a)?;
        self.check_junction(table, element, b)
    }
}

fn check_positive(table: &'static str, element: usize, v: f64, what: &'static str) -> NetResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(NetError::InvalidParameter {
            table,
            element,
            what,
        })
    }
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("name", &self.name)
            .field("fluid", &self.fluid.as_ref().map(|fl| fl.name().to_owned()))
            .field("junctions", &self.junction.len())
            .field("pipes", &self.pipe.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{bar, k, kgps, km, m};

    #[test]
    fn unknown_junction_is_reported() {
        let mut net = Net::new("broken");
        let j0 = net.junction.push(Junction::new(bar(1.0), k(293.15)));
        net.pipe.push(Pipe::new(j0, 7, km(1.0), m(0.1)));
        let err = net.validate().unwrap_err();
        assert_eq!(
            err,
            NetError::UnknownJunction {
                table: "pipe",
                element: 0,
                junction: 7
            }
        );
    }

    #[test]
    fn zero_diameter_is_rejected() {
        let mut net = Net::new("broken");
        let j0 = net.junction.push(Junction::new(bar(1.0), k(293.15)));
        let j1 = net.junction.push(Junction::new(bar(1.0), k(293.15)));
        net.flow_control
            .push(FlowControl::new(j0, j1, kgps(1.0), m(0.0)));
        assert!(matches!(
            net.validate(),
            Err(NetError::InvalidParameter {
                table: "flow_control",
                ..
            })
        ));
    }
}
