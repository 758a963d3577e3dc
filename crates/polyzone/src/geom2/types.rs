//! Basic 2D value types shared by every zone stage.
//!
//! - `Side`: exact point-location answer.
//! - `Aabb2`: axis-aligned box with an explicit empty state; also serves as a grid cell rect.
//! - `Affine2`: 2D affine map used as the local→working transform.
//! - `Trs2`: authoring form of a transform (translation, rotation, non-uniform scale).
//!
//! Code cross-refs: `edge::Edge2`, `obb::Obb2`, `crate::frame::{Frame, Layer}`

use nalgebra::{Matrix2, Vector2};

/// Which side of a closed boundary a point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Inside,
    Outside,
}

impl Side {
    #[inline]
    pub fn from_inside(inside: bool) -> Self {
        if inside {
            Side::Inside
        } else {
            Side::Outside
        }
    }
    #[inline]
    pub fn is_inside(self) -> bool {
        matches!(self, Side::Inside)
    }
}

/// Axis-aligned box `[min, max]`.
///
/// Invariants:
/// - Empty iff `min.x > max.x` or `min.y > max.y`; `Aabb2::empty()` uses `+inf/-inf`
///   so that `encapsulate` works without a special first case.
/// - `intersects` treats both boxes as closed; `contains` is half-open `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb2 {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vector2::new(f64::INFINITY, f64::INFINITY),
            max: Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
    #[inline]
    pub fn from_min_max(min: Vector2<f64>, max: Vector2<f64>) -> Self {
        Self { min, max }
    }
    /// Box spanned by two arbitrary corners (order-independent).
    #[inline]
    pub fn from_corners(a: Vector2<f64>, b: Vector2<f64>) -> Self {
        Self {
            min: Vector2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vector2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector2<f64>>) -> Self {
        let mut out = Self::empty();
        for p in points {
            out.encapsulate(*p);
        }
        out
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }
    #[inline]
    pub fn encapsulate(&mut self, p: Vector2<f64>) {
        self.min = Vector2::new(self.min.x.min(p.x), self.min.y.min(p.y));
        self.max = Vector2::new(self.max.x.max(p.x), self.max.y.max(p.y));
    }
    #[inline]
    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: Vector2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
    #[inline]
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
    #[inline]
    pub fn contains(&self, p: Vector2<f64>) -> bool {
        self.min.x <= p.x && p.x < self.max.x && self.min.y <= p.y && p.y < self.max.y
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        (self.min + self.max) * 0.5
    }
    #[inline]
    pub fn size(&self) -> Vector2<f64> {
        self.max - self.min
    }
    /// Grow by `margin` on every side. Empty boxes stay empty.
    #[inline]
    pub fn expanded(&self, margin: f64) -> Aabb2 {
        if self.is_empty() {
            return *self;
        }
        let m = Vector2::new(margin, margin);
        Aabb2 {
            min: self.min - m,
            max: self.max + m,
        }
    }
    /// Nearest point of the (closed) box; meaningless for an empty box.
    #[inline]
    pub fn closest_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        // max/min instead of clamp: clamp panics on NaN bounds.
        Vector2::new(
            p.x.max(self.min.x).min(self.max.x),
            p.y.max(self.min.y).min(self.max.y),
        )
    }
    /// The four corners, counterclockwise from `min`.
    #[inline]
    pub fn corners(&self) -> [Vector2<f64>; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }
}

/// 2D affine map: `x ↦ M x + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    #[inline]
    pub fn identity() -> Self {
        Self {
            m: Matrix2::identity(),
            t: Vector2::zeros(),
        }
    }
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|minv| Self {
            m: minv,
            t: -minv * self.t,
        })
    }
    /// Composition `self ∘ other` (apply `other` first).
    #[inline]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            m: self.m * other.m,
            t: self.m * other.t + self.t,
        }
    }
    #[inline]
    pub fn transform_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.m * p + self.t
    }
    #[inline]
    pub fn transform_vector(&self, v: Vector2<f64>) -> Vector2<f64> {
        self.m * v
    }
    #[inline]
    pub fn is_orientation_preserving(&self) -> bool {
        self.m.determinant() > 0.0
    }
}

/// Translation, rotation (radians, CCW) and non-uniform scale.
///
/// `to_affine` composes them as `T · R · S`, so scale acts in the local axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trs2 {
    pub translation: Vector2<f64>,
    pub rotation: f64,
    pub scale: Vector2<f64>,
}

impl Default for Trs2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Trs2 {
    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vector2::zeros(),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
        }
    }
    #[inline]
    pub fn new(translation: Vector2<f64>, rotation: f64, scale: Vector2<f64>) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }
    #[inline]
    pub fn from_translation(translation: Vector2<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }
    pub fn to_affine(&self) -> Affine2 {
        let (s, c) = self.rotation.sin_cos();
        let r = Matrix2::new(c, -s, s, c);
        let sc = Matrix2::new(self.scale.x, 0.0, 0.0, self.scale.y);
        Affine2 {
            m: r * sc,
            t: self.translation,
        }
    }
    /// Translation and scale only; rectangles stay axis-aligned.
    pub fn to_affine_unrotated(&self) -> Affine2 {
        Affine2 {
            m: Matrix2::new(self.scale.x, 0.0, 0.0, self.scale.y),
            t: self.translation,
        }
    }
}
