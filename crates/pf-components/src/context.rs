//! Contexts handed to components.

use pf_fluids::FluidProvider;
use pf_net::Net;
use pf_pit::{Connectivity, Lookups, Pit};

/// Solver settings that affect the initial pit entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentSettings {
    /// Default ambient temperature of branches [K].
    pub ambient_temperature: f64,
    /// Velocity of the initial mass flow guess [m/s].
    pub initial_velocity: f64,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            ambient_temperature: 293.15,
            initial_velocity: 0.1,
        }
    }
}

/// Write access to the full pits while they are built.
pub struct BuildContext<'a> {
    pub net: &'a Net,
    pub fluid: &'a dyn FluidProvider,
    pub settings: &'a ComponentSettings,
    pub lookups: &'a Lookups,
    pub node: &'a mut Pit,
    pub branch: &'a mut Pit,
}

/// Read access to the solved full pits.
///
/// A row is reported only when it is connected in the mode that computed the
/// quantity; a mode that did not run leaves its connectivity `None`.
pub struct ResultContext<'a> {
    pub net: &'a Net,
    pub lookups: &'a Lookups,
    pub node: &'a Pit,
    pub branch: &'a Pit,
    pub hydraulics: Option<&'a Connectivity>,
    pub heat: Option<&'a Connectivity>,
}

impl ResultContext<'_> {
    pub fn node_hydraulic(&self, row: usize) -> bool {
        self.hydraulics.is_some_and(|c| c.nodes[row])
    }

    pub fn branch_hydraulic(&self, row: usize) -> bool {
        self.hydraulics.is_some_and(|c| c.branches[row])
    }

    /// Temperatures are reported for thermally connected nodes, or for all
    /// hydraulically connected nodes when no thermal mode ran.
    pub fn node_thermal(&self, row: usize) -> bool {
        match self.heat {
            Some(c) => c.nodes[row],
            None => self.node_hydraulic(row),
        }
    }

    pub fn branch_thermal(&self, row: usize) -> bool {
        match self.heat {
            Some(c) => c.branches[row],
            None => self.branch_hydraulic(row),
        }
    }
}
