//! Immutable segment with a lazily computed frame (length, tangent, normal).
//!
//! The cache lives for the lifetime of the edge; endpoints never change after
//! construction, so a new edge is built whenever the polygon regenerates.

use std::cell::OnceCell;

use nalgebra::Vector2;

#[derive(Clone, Copy, Debug)]
struct EdgeCache {
    length: f64,
    tangent: Vector2<f64>,
    /// `(v1 - v0) / |v1 - v0|²`, or zero for a degenerate edge.
    recip_tangent: Vector2<f64>,
    normal: Vector2<f64>,
}

/// Result of projecting a point onto a closed segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeProjection {
    /// Segment parameter of the closest point, in `[0, 1]`.
    pub t: f64,
    /// Signed offset along the edge normal; positive on the left of `v0 → v1`.
    pub lateral: f64,
    /// Euclidean distance from the query point to `point`.
    pub distance: f64,
    pub point: Vector2<f64>,
}

/// Segment `v0 → v1`.
#[derive(Clone, Debug)]
pub struct Edge2 {
    v0: Vector2<f64>,
    v1: Vector2<f64>,
    cache: OnceCell<EdgeCache>,
}

impl PartialEq for Edge2 {
    fn eq(&self, other: &Self) -> bool {
        self.v0 == other.v0 && self.v1 == other.v1
    }
}

impl Edge2 {
    #[inline]
    pub fn new(v0: Vector2<f64>, v1: Vector2<f64>) -> Self {
        Self {
            v0,
            v1,
            cache: OnceCell::new(),
        }
    }
    #[inline]
    pub fn v0(&self) -> Vector2<f64> {
        self.v0
    }
    #[inline]
    pub fn v1(&self) -> Vector2<f64> {
        self.v1
    }

    fn cache(&self) -> &EdgeCache {
        self.cache.get_or_init(|| {
            let v01 = self.v1 - self.v0;
            let len2 = v01.norm_squared();
            if len2 > 0.0 && len2.is_finite() {
                let length = len2.sqrt();
                let tangent = v01 / length;
                EdgeCache {
                    length,
                    tangent,
                    recip_tangent: v01 / len2,
                    normal: Vector2::new(-tangent.y, tangent.x),
                }
            } else {
                EdgeCache {
                    length: len2.sqrt(),
                    tangent: Vector2::zeros(),
                    recip_tangent: Vector2::zeros(),
                    normal: Vector2::zeros(),
                }
            }
        })
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.cache().length
    }
    /// Unit tangent; zero for a degenerate edge.
    #[inline]
    pub fn tangent(&self) -> Vector2<f64> {
        self.cache().tangent
    }
    /// Left-hand perpendicular of the unit tangent; zero for a degenerate edge.
    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        self.cache().normal
    }
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.cache().tangent == Vector2::zeros()
    }
    #[inline]
    pub fn midpoint(&self) -> Vector2<f64> {
        self.point_at(0.5)
    }

    /// Affine interpolation `(1-t)·v0 + t·v1`, valid for any real `t`.
    #[inline]
    pub fn point_at(&self, t: f64) -> Vector2<f64> {
        self.v0 * (1.0 - t) + self.v1 * t
    }

    /// Project `p` onto the closed segment.
    ///
    /// A degenerate edge collapses to the point `v0` (`t = 0`, `lateral = 0`).
    pub fn distance_to(&self, p: Vector2<f64>) -> EdgeProjection {
        let c = self.cache();
        let vp = p - self.v0;
        let t = vp.dot(&c.recip_tangent).clamp(0.0, 1.0);
        let point = self.point_at(t);
        EdgeProjection {
            t,
            lateral: vp.dot(&c.normal),
            distance: (p - point).norm(),
            point,
        }
    }

    #[inline]
    pub fn closest_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.distance_to(p).point
    }

    /// Signed angle subtended by the edge as seen from `p`, in `[-π, π]`; CCW positive.
    #[inline]
    pub fn signed_turn_angle(&self, p: Vector2<f64>) -> f64 {
        let a = self.v0 - p;
        let b = self.v1 - p;
        let cross = a.x * b.y - a.y * b.x;
        cross.atan2(a.dot(&b))
    }
}
