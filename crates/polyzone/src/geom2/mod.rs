//! 2D geometry primitives for zone queries.
//!
//! Purpose
//! - Value types (`Aabb2`, `Affine2`, `Trs2`, `Side`) shared by every stage.
//! - `Edge2`: segment with a lazily cached frame; projection, distance, turn angle.
//! - `Obb2`: boundary slab around an edge with an exact box-overlap test.
//! - Ring helpers (`signed_area`, `area_centroid`, `crossing_parity`).
//! - Seeded random sources (`rand`), never a process-wide generator.
//!
//! Code cross-refs: `crate::polygon::Polygon`, `crate::fringe::Fringe`

mod edge;
mod obb;
pub mod rand;
mod types;
mod util;

pub use edge::{Edge2, EdgeProjection};
pub use obb::Obb2;
pub use types::{Aabb2, Affine2, Side, Trs2};
pub use util::{area_centroid, crossing_parity, signed_area};

#[cfg(test)]
mod tests;
