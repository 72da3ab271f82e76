//! Fluid provider trait.

/// Read-only source of fluid properties consumed by the solver.
///
/// Implementations must be thread-safe (Send + Sync): the derivative engine
/// may evaluate branches in parallel. Temperatures are in K, pressures in bar
/// (absolute for compressibility), density in kg/m³, dynamic viscosity in
/// Pa·s and heat capacity in J/(kg·K).
pub trait FluidProvider: Send + Sync {
    /// Fluid name (for logging).
    fn name(&self) -> &str;

    /// Compressible fluids use the gas flow equations.
    fn is_gas(&self) -> bool;

    /// Density at temperature `t`. For gases this is the density at normal
    /// pressure.
    fn density(&self, t: f64) -> f64;

    /// Dynamic viscosity at temperature `t`.
    fn viscosity(&self, t: f64) -> f64;

    /// Isobaric heat capacity at temperature `t`.
    fn heat_capacity(&self, t: f64) -> f64;

    /// Compressibility factor Z at absolute pressure `p`.
    fn compressibility(&self, _p: f64) -> f64 {
        1.0
    }

    /// dZ/dp at absolute pressure `p`.
    fn der_compressibility(&self, _p: f64) -> f64 {
        0.0
    }
}
