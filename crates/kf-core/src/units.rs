// kf-core/src/units.rs

use uom::si::f64::{
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

pub mod constants {
    /// Universal gas constant [J/(kmol·K)]
    pub const GAS_CONSTANT: f64 = 8.314_462_618_153_24e3;

    /// One standard atmosphere [Pa]
    pub const ONE_ATM: f64 = 101_325.0;

    /// Thermodynamic reference temperature [K]
    pub const T_REF: f64 = 298.15;
}
