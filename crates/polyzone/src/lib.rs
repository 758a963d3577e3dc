//! Point location against 2D polygonal zones.
//!
//! Pipeline (each stage owns the previous one and revalidates it lazily):
//! - `polygon::Polygon`: authored ring + placement → working-space edges, exact `side`.
//! - `fringe::Fringe`: one boundary slab per edge, box-overlap queries.
//! - `accel::Accelerator`: classification grid over the fringe bounds, O(1) `sample`.
//!
//! Supporting modules: `revalidate` (stale flag + freshness predicate),
//! `frame` (per-shape `Frame`, shared `Layer`), `grid` (generic `UniformGrid`),
//! `boundary` (`PointLocatable`, `Rectangle`, masked `BoundaryGroup`).
//!
//! Threading: single-threaded by construction (`Rc` layers, boxed listeners).
//! Hosts serialize access to an instance themselves.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.

pub mod accel;
pub mod boundary;
pub mod error;
pub mod frame;
pub mod fringe;
pub mod geom2;
pub mod grid;
pub mod polygon;
pub mod revalidate;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::GeomError;
pub use nalgebra::Vector2 as Vec2;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::accel::{AccelCfg, Accelerator, CellClass, GridStats};
    pub use crate::boundary::{
        BandSide, Boundary, BoundaryGroup, BoundaryMode, PointLocatable, Rectangle, ALL_LAYERS,
    };
    pub use crate::error::GeomError;
    pub use crate::frame::{Frame, Layer};
    pub use crate::fringe::{Fringe, FringeEntry};
    pub use crate::geom2::rand::{
        draw_star_polygon, PointSampler, RadialCfg, ReplayToken, VertexCount,
    };
    pub use crate::geom2::{Aabb2, Affine2, Edge2, EdgeProjection, Obb2, Side, Trs2};
    pub use crate::grid::{UniformGrid, WrapMode};
    pub use crate::polygon::{GenerateEvent, ListenerId, Polygon, SideRule};
    pub use crate::revalidate::{Freshness, Validator, ValidatorState};
    pub use nalgebra::Vector2 as Vec2;
}
