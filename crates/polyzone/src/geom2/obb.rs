//! Oriented bounding box and its overlap test against axis-aligned boxes.
//!
//! Overlap uses the separating axis theorem over the four candidate axes
//! (world x, world y, box axis, box perpendicular). Touching counts as overlap.

use nalgebra::Vector2;

use super::edge::Edge2;
use super::types::Aabb2;

/// Rectangle centered at `center`, rotated so its local x axis is `axis`.
///
/// Invariants:
/// - `axis` is unit length.
/// - `half_extents.x` runs along `axis`, `half_extents.y` along its left perpendicular;
///   both are `>= 0` and may be zero (a segment or a point).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb2 {
    pub center: Vector2<f64>,
    pub axis: Vector2<f64>,
    pub half_extents: Vector2<f64>,
}

impl Obb2 {
    /// Normalizes `axis`; a zero or non-finite axis falls back to world x.
    pub fn new(center: Vector2<f64>, axis: Vector2<f64>, half_extents: Vector2<f64>) -> Self {
        let norm = axis.norm();
        let axis = if norm > 0.0 && norm.is_finite() {
            axis / norm
        } else {
            Vector2::new(1.0, 0.0)
        };
        Self {
            center,
            axis,
            half_extents: Vector2::new(half_extents.x.abs(), half_extents.y.abs()),
        }
    }

    /// Boundary slab straddling `edge`: `length/2 + extent` along the tangent,
    /// `extent` along the normal.
    pub fn around_edge(edge: &Edge2, extent: f64) -> Self {
        Self::new(
            edge.midpoint(),
            edge.v1() - edge.v0(),
            Vector2::new(0.5 * edge.length() + extent, extent),
        )
    }

    #[inline]
    pub fn perp(&self) -> Vector2<f64> {
        Vector2::new(-self.axis.y, self.axis.x)
    }

    pub fn corners(&self) -> [Vector2<f64>; 4] {
        let u = self.axis * self.half_extents.x;
        let v = self.perp() * self.half_extents.y;
        [
            self.center - u - v,
            self.center + u - v,
            self.center + u + v,
            self.center - u + v,
        ]
    }

    /// Tight axis-aligned footprint.
    pub fn aabb(&self) -> Aabb2 {
        let r = Vector2::new(self.radius_on(Vector2::x()), self.radius_on(Vector2::y()));
        Aabb2::from_min_max(self.center - r, self.center + r)
    }

    /// Half-width of the box projected onto the unit direction `dir`.
    #[inline]
    fn radius_on(&self, dir: Vector2<f64>) -> f64 {
        self.half_extents.x * self.axis.dot(&dir).abs()
            + self.half_extents.y * self.perp().dot(&dir).abs()
    }

    pub fn intersects_aabb(&self, b: &Aabb2) -> bool {
        if b.is_empty() {
            return false;
        }
        let half_b = b.size() * 0.5;
        let d = self.center - b.center();
        let axes = [Vector2::x(), Vector2::y(), self.axis, self.perp()];
        for dir in axes {
            let rb = half_b.x * dir.x.abs() + half_b.y * dir.y.abs();
            if d.dot(&dir).abs() > self.radius_on(dir) + rb {
                return false;
            }
        }
        true
    }

    /// Closed containment.
    pub fn contains(&self, p: Vector2<f64>) -> bool {
        let d = p - self.center;
        d.dot(&self.axis).abs() <= self.half_extents.x
            && d.dot(&self.perp()).abs() <= self.half_extents.y
    }
}
