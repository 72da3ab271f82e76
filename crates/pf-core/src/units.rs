// pf-core/src/units.rs
//
// The internal tables store plain f64 in "pipeflow units": bar (gauge) for
// pressure, K for temperature, kg/s for mass flow, m for lengths and W for
// heat. uom quantities are used at the input boundary.

use uom::si::f64::{
    Area as UomArea, DynamicViscosity as UomDynamicViscosity, Length as UomLength,
    MassDensity as UomMassDensity, MassRate as UomMassRate, Power as UomPower,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type DynVisc = UomDynamicViscosity;
pub type Length = UomLength;
pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn km(v: f64) -> Length {
    use uom::si::length::kilometer;
    Length::new::<kilometer>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn watt(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn as_bar(p: Pressure) -> f64 {
    p.get::<uom::si::pressure::bar>()
}

#[inline]
pub fn as_kelvin(t: Temperature) -> f64 {
    t.get::<uom::si::thermodynamic_temperature::kelvin>()
}

#[inline]
pub fn as_kgps(mdot: MassRate) -> f64 {
    mdot.get::<uom::si::mass_rate::kilogram_per_second>()
}

#[inline]
pub fn as_meter(l: Length) -> f64 {
    l.get::<uom::si::length::meter>()
}

#[inline]
pub fn as_watt(q: Power) -> f64 {
    q.get::<uom::si::power::watt>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _mdot = kgps(1.2);
        let _l = m(2.0);
        let _q = watt(10.0);
    }

    #[test]
    fn boundary_conversions() {
        assert!((as_bar(pa(1e5)) - 1.0).abs() < 1e-12);
        assert!((as_meter(km(0.2)) - 200.0).abs() < 1e-9);
        assert!((as_meter(mm(0.1)) - 1e-4).abs() < 1e-15);
        assert!((as_kelvin(k(360.0)) - 360.0).abs() < 1e-12);
    }
}
