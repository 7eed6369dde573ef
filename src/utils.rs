//! Numeric helpers shared by the geometry and mapping code.

pub mod safe_cast;
