//! Physical constants in pipeflow units.

/// Conversion factor Pa -> bar.
pub const P_CONVERSION: f64 = 1e5;

/// Gravitational acceleration [m/s²].
pub const GRAVITATION_CONSTANT: f64 = 9.806_65;

/// Normal temperature [K].
pub const NORMAL_TEMPERATURE: f64 = 273.15;

/// Normal pressure [bar, absolute].
pub const NORMAL_PRESSURE: f64 = 1.01325;

/// Ambient air pressure [bar] at the given height above sea level (barometric formula).
pub fn p_correction_height_air(height_m: f64) -> f64 {
    NORMAL_PRESSURE * (1.0 - 2.255_77e-5 * height_m).powf(5.255_88)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_pressure_drops_with_height() {
        assert!((p_correction_height_air(0.0) - NORMAL_PRESSURE).abs() < 1e-12);
        assert!(p_correction_height_air(500.0) < NORMAL_PRESSURE);
    }
}
