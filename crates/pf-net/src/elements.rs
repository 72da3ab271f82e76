//! Plain element rows.
//!
//! Constructors take uom quantities and store pipeflow units (bar gauge, K,
//! kg/s, m, W). Builder methods set the optional parameters.

use pf_core::units::{
    Length, MassRate, Power, Pressure, Temperature, as_bar, as_kelvin, as_kgps, as_meter,
    as_watt,
};

/// Boundary type of an external grid or circulation pump flow junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtGridType {
    /// Fixed pressure.
    P,
    /// Fixed temperature.
    T,
    /// Fixed pressure and temperature.
    Pt,
}

impl ExtGridType {
    /// Parse a type name; `"tp"` and `"auto"` are aliases of `"pt"`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "p" => Some(Self::P),
            "t" => Some(Self::T),
            "pt" | "tp" | "auto" => Some(Self::Pt),
            _ => None,
        }
    }

    pub fn fixes_pressure(self) -> bool {
        matches!(self, Self::P | Self::Pt)
    }

    pub fn fixes_temperature(self) -> bool {
        matches!(self, Self::T | Self::Pt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub name: Option<String>,
    /// Initial pressure guess [bar].
    pub pn_bar: f64,
    /// Initial temperature guess [K].
    pub tfluid_k: f64,
    pub height_m: f64,
    pub in_service: bool,
}

impl Junction {
    pub fn new(pn: Pressure, tfluid: Temperature) -> Self {
        Self {
            name: None,
            pn_bar: as_bar(pn),
            tfluid_k: as_kelvin(tfluid),
            height_m: 0.0,
            in_service: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_height(mut self, height: Length) -> Self {
        self.height_m = as_meter(height);
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtGrid {
    pub junction: usize,
    pub p_bar: f64,
    pub t_k: f64,
    pub kind: ExtGridType,
    pub in_service: bool,
}

impl ExtGrid {
    pub fn new(junction: usize, p: Pressure, t: Temperature, kind: ExtGridType) -> Self {
        Self {
            junction,
            p_bar: as_bar(p),
            t_k: as_kelvin(t),
            kind,
            in_service: true,
        }
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

/// Mass withdrawal at a junction (positive = demand).
#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    pub junction: usize,
    pub mdot_kg_per_s: f64,
    pub scaling: f64,
    pub in_service: bool,
}

impl Sink {
    pub fn new(junction: usize, mdot: MassRate) -> Self {
        Self {
            junction,
            mdot_kg_per_s: as_kgps(mdot),
            scaling: 1.0,
            in_service: true,
        }
    }

    pub fn with_scaling(mut self, scaling: f64) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

/// Mass injection at a junction.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub junction: usize,
    pub mdot_kg_per_s: f64,
    pub scaling: f64,
    pub in_service: bool,
}

impl Source {
    pub fn new(junction: usize, mdot: MassRate) -> Self {
        Self {
            junction,
            mdot_kg_per_s: as_kgps(mdot),
            scaling: 1.0,
            in_service: true,
        }
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub from_junction: usize,
    pub to_junction: usize,
    pub length_m: f64,
    pub diameter_m: f64,
    /// Absolute roughness [m].
    pub k_m: f64,
    pub loss_coefficient: f64,
    /// Heat transfer coefficient [W/(m²K)].
    pub alpha_w_per_m2k: f64,
    /// Ambient temperature; `None` uses the solver default.
    pub text_k: Option<f64>,
    pub qext_w: f64,
    /// Number of internal segments; `sections - 1` internal nodes are created.
    pub sections: usize,
    pub in_service: bool,
}

impl Pipe {
    pub fn new(from_junction: usize, to_junction: usize, length: Length, diameter: Length) -> Self {
        Self {
            from_junction,
            to_junction,
            length_m: as_meter(length),
            diameter_m: as_meter(diameter),
            k_m: 1e-4,
            loss_coefficient: 0.0,
            alpha_w_per_m2k: 0.0,
            text_k: None,
            qext_w: 0.0,
            sections: 1,
            in_service: true,
        }
    }

    pub fn with_roughness(mut self, k: Length) -> Self {
        self.k_m = as_meter(k);
        self
    }

    pub fn with_loss_coefficient(mut self, lc: f64) -> Self {
        self.loss_coefficient = lc;
        self
    }

    pub fn with_heat_transfer(mut self, alpha_w_per_m2k: f64, text: Option<Temperature>) -> Self {
        self.alpha_w_per_m2k = alpha_w_per_m2k;
        self.text_k = text.map(as_kelvin);
        self
    }

    pub fn with_qext(mut self, qext: Power) -> Self {
        self.qext_w = as_watt(qext);
        self
    }

    pub fn with_sections(mut self, sections: usize) -> Self {
        self.sections = sections;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Valve {
    pub from_junction: usize,
    pub to_junction: usize,
    pub diameter_m: f64,
    pub opened: bool,
    pub loss_coefficient: f64,
    pub in_service: bool,
}

impl Valve {
    pub fn new(from_junction: usize, to_junction: usize, diameter: Length, opened: bool) -> Self {
        Self {
            from_junction,
            to_junction,
            diameter_m: as_meter(diameter),
            opened,
            loss_coefficient: 0.0,
            in_service: true,
        }
    }

    pub fn with_loss_coefficient(mut self, lc: f64) -> Self {
        self.loss_coefficient = lc;
        self
    }
}

/// Quadratic pump characteristic: `Δp [bar] = c0 + c1·v + c2·v²` with the
/// volume flow `v` in m³/h. Negative lifts are clipped to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpCurve {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

impl PumpCurve {
    pub fn pressure_lift(&self, vdot_m3_per_h: f64) -> f64 {
        let v = vdot_m3_per_h.max(0.0);
        (self.c0 + self.c1 * v + self.c2 * v * v).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    pub from_junction: usize,
    pub to_junction: usize,
    pub curve: PumpCurve,
    /// Temperature lift across the pump [K].
    pub t_lift_k: f64,
    pub in_service: bool,
}

impl Pump {
    pub fn new(from_junction: usize, to_junction: usize, curve: PumpCurve) -> Self {
        Self {
            from_junction,
            to_junction,
            curve,
            t_lift_k: 0.0,
            in_service: true,
        }
    }

    pub fn with_temperature_lift(mut self, t_lift_k: f64) -> Self {
        self.t_lift_k = t_lift_k;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowControl {
    pub from_junction: usize,
    pub to_junction: usize,
    pub controlled_mdot_kg_per_s: f64,
    pub diameter_m: f64,
    pub control_active: bool,
    pub in_service: bool,
}

impl FlowControl {
    pub fn new(
        from_junction: usize,
        to_junction: usize,
        controlled_mdot: MassRate,
        diameter: Length,
    ) -> Self {
        Self {
            from_junction,
            to_junction,
            controlled_mdot_kg_per_s: as_kgps(controlled_mdot),
            diameter_m: as_meter(diameter),
            control_active: true,
            in_service: true,
        }
    }

    pub fn with_control_active(mut self, active: bool) -> Self {
        self.control_active = active;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PressureControl {
    pub from_junction: usize,
    pub to_junction: usize,
    pub controlled_junction: usize,
    pub controlled_p_bar: f64,
    pub control_active: bool,
    pub loss_coefficient: f64,
    pub in_service: bool,
}

impl PressureControl {
    pub fn new(
        from_junction: usize,
        to_junction: usize,
        controlled_junction: usize,
        controlled_p: Pressure,
    ) -> Self {
        Self {
            from_junction,
            to_junction,
            controlled_junction,
            controlled_p_bar: as_bar(controlled_p),
            control_active: true,
            loss_coefficient: 0.0,
            in_service: true,
        }
    }

    pub fn with_control_active(mut self, active: bool) -> Self {
        self.control_active = active;
        self
    }

    pub fn with_loss_coefficient(mut self, lc: f64) -> Self {
        self.loss_coefficient = lc;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatExchanger {
    pub from_junction: usize,
    pub to_junction: usize,
    pub diameter_m: f64,
    /// Heat extracted from the fluid [W].
    pub qext_w: f64,
    pub loss_coefficient: f64,
    pub in_service: bool,
}

impl HeatExchanger {
    pub fn new(from_junction: usize, to_junction: usize, diameter: Length, qext: Power) -> Self {
        Self {
            from_junction,
            to_junction,
            diameter_m: as_meter(diameter),
            qext_w: as_watt(qext),
            loss_coefficient: 0.0,
            in_service: true,
        }
    }

    pub fn with_loss_coefficient(mut self, lc: f64) -> Self {
        self.loss_coefficient = lc;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

/// Circulation pump holding the flow pressure and a fixed pressure lift
/// between its return and flow junction.
#[derive(Debug, Clone, PartialEq)]
pub struct CirculationPumpPressure {
    pub return_junction: usize,
    pub flow_junction: usize,
    pub p_flow_bar: f64,
    pub t_flow_k: f64,
    pub plift_bar: f64,
    pub kind: ExtGridType,
    pub in_service: bool,
}

impl CirculationPumpPressure {
    pub fn new(
        return_junction: usize,
        flow_junction: usize,
        p_flow: Pressure,
        t_flow: Temperature,
        plift: Pressure,
    ) -> Self {
        Self {
            return_junction,
            flow_junction,
            p_flow_bar: as_bar(p_flow),
            t_flow_k: as_kelvin(t_flow),
            plift_bar: as_bar(plift),
            kind: ExtGridType::Pt,
            in_service: true,
        }
    }

    pub fn with_kind(mut self, kind: ExtGridType) -> Self {
        self.kind = kind;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}

/// Circulation pump holding the flow pressure and a fixed circulated mass flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CirculationPumpMass {
    pub return_junction: usize,
    pub flow_junction: usize,
    pub p_flow_bar: f64,
    pub t_flow_k: f64,
    pub mdot_flow_kg_per_s: f64,
    pub kind: ExtGridType,
    pub in_service: bool,
}

impl CirculationPumpMass {
    pub fn new(
        return_junction: usize,
        flow_junction: usize,
        p_flow: Pressure,
        t_flow: Temperature,
        mdot_flow: MassRate,
    ) -> Self {
        Self {
            return_junction,
            flow_junction,
            p_flow_bar: as_bar(p_flow),
            t_flow_k: as_kelvin(t_flow),
            mdot_flow_kg_per_s: as_kgps(mdot_flow),
            kind: ExtGridType::Pt,
            in_service: true,
        }
    }

    pub fn with_kind(mut self, kind: ExtGridType) -> Self {
        self.kind = kind;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.in_service = false;
        self
    }
}
