//! pcal-core: shared foundation for potholecal.
//!
//! Contains:
//! - units (uom SI types + basin area/depth/volume helpers)
//! - numeric (model file number formatting)
//! - ids (compact trial identifiers)
//! - days (Gregorian ordinal day numbers used by the model output)
//! - error (shared error types)

pub mod days;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use days::*;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
