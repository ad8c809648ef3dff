//! Runoff curve numbers per hydrologic soil group.

use std::fmt;

use crate::{GridError, GridResult};

/// Highest curve number the model accepts.
pub const CN_CEILING: u8 = 99;

/// NRCS hydrologic soil group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoilGroup {
    A,
    B,
    C,
    D,
}

impl SoilGroup {
    pub const ALL: [SoilGroup; 4] = [SoilGroup::A, SoilGroup::B, SoilGroup::C, SoilGroup::D];

    pub fn label(self) -> &'static str {
        match self {
            SoilGroup::A => "A",
            SoilGroup::B => "B",
            SoilGroup::C => "C",
            SoilGroup::D => "D",
        }
    }
}

impl fmt::Display for SoilGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One curve number per soil group, each in `[0, 99]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveNumbers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
}

impl CurveNumbers {
    pub fn new(a: u32, b: u32, c: u32, d: u32) -> GridResult<Self> {
        Ok(Self {
            a: checked(SoilGroup::A, a)?,
            b: checked(SoilGroup::B, b)?,
            c: checked(SoilGroup::C, c)?,
            d: checked(SoilGroup::D, d)?,
        })
    }

    pub fn get(&self, group: SoilGroup) -> u8 {
        match group {
            SoilGroup::A => self.a,
            SoilGroup::B => self.b,
            SoilGroup::C => self.c,
            SoilGroup::D => self.d,
        }
    }

    fn slot(&mut self, group: SoilGroup) -> &mut u8 {
        match group {
            SoilGroup::A => &mut self.a,
            SoilGroup::B => &mut self.b,
            SoilGroup::C => &mut self.c,
            SoilGroup::D => &mut self.d,
        }
    }

    /// Values after `steps` outer increments of `increment`, clamped at the
    /// ceiling. Groups in `held` keep their current value.
    pub fn raised(&self, steps: u32, increment: u8, held: &[SoilGroup]) -> Self {
        let mut out = *self;
        for group in SoilGroup::ALL {
            if held.contains(&group) {
                continue;
            }
            let raised = u64::from(self.get(group)) + u64::from(steps) * u64::from(increment);
            *out.slot(group) = raised.min(u64::from(CN_CEILING)) as u8;
        }
        out
    }

    pub fn as_array(&self) -> [u8; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

fn checked(group: SoilGroup, value: u32) -> GridResult<u8> {
    if value > u32::from(CN_CEILING) {
        return Err(GridError::CurveNumberOutOfRange { group, value });
    }
    Ok(value as u8)
}

impl fmt::Display for CurveNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A={} B={} C={} D={}", self.a, self.b, self.c, self.d)
    }
}
