// pcal-core/src/units.rs

use uom::si::f64::{Area as UomArea, Length as UomLength, Volume as UomVolume};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Volume = UomVolume;

#[inline]
pub fn ha(v: f64) -> Area {
    use uom::si::area::hectare;
    Area::new::<hectare>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn volume_m3(v: Volume) -> f64 {
    use uom::si::volume::cubic_meter;
    v.get::<cubic_meter>()
}

/// Stored water volume of a basin from its ponded depth.
#[inline]
pub fn ponded_volume(depth: Length, area: Area) -> Volume {
    depth * area
}
