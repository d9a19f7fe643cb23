//! Thermodynamic formulas.
//!
//! Scalar functions are generic over the `metfor` unit types and convert their arguments on the
//! way in. Profile functions take slices ordered from the surface upward.
pub use self::{adiabats::*, apparent::*, dry::*, moisture::*};

mod adiabats;
mod apparent;
mod dry;
mod moisture;
