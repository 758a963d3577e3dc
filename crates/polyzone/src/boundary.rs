//! Point-locatable shapes and masked groups of them.
//!
//! `PointLocatable` is the shared capability: exact side test, nearest boundary
//! point and working-space bounds. Every query may rebuild cached geometry, so
//! all methods take `&mut self`.
//!
//! `Boundary` is the closed set of concrete variants; `BoundaryGroup` combines
//! members under layer masks (a member takes part in a query iff its mask
//! intersects the query mask).
//!
//! Rectangles carry an optional border band: the inner rect answers `side`,
//! the outer rect is the inner one grown by the border thickness, and
//! `band_side` tells the three regions apart.

use std::rc::Rc;

use nalgebra::Vector2;

use crate::accel::Accelerator;
use crate::error::GeomError;
use crate::frame::{Frame, Layer, LayerLink, SourceStamp};
use crate::geom2::rand::PointSampler;
use crate::geom2::{Aabb2, Side, Trs2};
use crate::polygon::Polygon;
use crate::revalidate::{Freshness, Validator};

pub trait PointLocatable {
    fn side(&mut self, p: Vector2<f64>) -> Side;
    /// `None` when the shape has no boundary (empty ring or empty rect).
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>>;
    fn bounds(&mut self) -> Aabb2;
}

impl PointLocatable for Polygon {
    #[inline]
    fn side(&mut self, p: Vector2<f64>) -> Side {
        Polygon::side(self, p)
    }
    #[inline]
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        Polygon::closest_point(self, p)
    }
    #[inline]
    fn bounds(&mut self) -> Aabb2 {
        Polygon::bounds(self)
    }
}

impl PointLocatable for Accelerator {
    #[inline]
    fn side(&mut self, p: Vector2<f64>) -> Side {
        self.sample(p)
    }
    #[inline]
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        Accelerator::closest_point(self, p)
    }
    #[inline]
    fn bounds(&mut self) -> Aabb2 {
        Accelerator::bounds(self)
    }
}

/// Draws per inside-sample request for shapes without a direct sampler.
pub const MAX_REJECTION_TRIES: usize = 256;

/// Three-way location against a shape with a border band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BandSide {
    Inside,
    Border,
    Outside,
}

impl From<Side> for BandSide {
    fn from(s: Side) -> Self {
        match s {
            Side::Inside => BandSide::Inside,
            Side::Outside => BandSide::Outside,
        }
    }
}

/// Which of a banded shape's two boundaries a query refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryMode {
    #[default]
    Inner,
    Outer,
}

/// Rejection sampling inside `shape`'s bounds.
fn sample_inside(
    shape: &mut dyn PointLocatable,
    sampler: &mut PointSampler,
) -> Option<Vector2<f64>> {
    let b = shape.bounds();
    if b.is_empty() {
        return None;
    }
    (0..MAX_REJECTION_TRIES)
        .map(|_| sampler.sample_in(&b))
        .find(|&p| shape.side(p).is_inside())
}

// ---- Rectangle ----------------------------------------------------------

/// Axis-aligned rectangle placed by translation and scale; frame rotation is ignored.
///
/// `side` is half-open (`[min, max)` per axis), so rectangles tiling the plane
/// claim every point exactly once. `closest_point` clamps into the closed rect,
/// so interior points map to themselves.
///
/// The border band (thickness 0 by default) is measured in working units and
/// does not scale with the frame or layer.
#[derive(Debug)]
pub struct Rectangle {
    local: Aabb2,
    border: f64,
    frame: Frame,
    layer: LayerLink,
    validator: Validator,
    built_from: Option<SourceStamp>,
    working: Aabb2,
    generation: u64,
}

impl Default for Rectangle {
    /// Unit square centred on the local origin.
    fn default() -> Self {
        Self::new(Aabb2::from_min_max(
            Vector2::new(-0.5, -0.5),
            Vector2::new(0.5, 0.5),
        ))
    }
}

impl Rectangle {
    pub fn new(local: Aabb2) -> Self {
        Self {
            local,
            border: 0.0,
            frame: Frame::default(),
            layer: LayerLink::default(),
            validator: Validator::new(),
            built_from: None,
            working: Aabb2::empty(),
            generation: 0,
        }
    }

    pub fn with_frame(mut self, trs: Trs2) -> Self {
        self.frame = Frame::new(trs);
        self.validator.invalidate();
        self
    }
    pub fn with_layer(mut self, layer: &Rc<Layer>) -> Self {
        self.attach_layer(layer);
        self
    }
    pub fn with_border(mut self, thickness: f64) -> Result<Self, GeomError> {
        self.set_border(thickness)?;
        Ok(self)
    }

    #[inline]
    pub fn border(&self) -> f64 {
        self.border
    }
    pub fn set_border(&mut self, thickness: f64) -> Result<(), GeomError> {
        if !(thickness.is_finite() && thickness >= 0.0) {
            return Err(GeomError::invalid(format!(
                "border thickness must be finite and >= 0, got {thickness}"
            )));
        }
        self.border = thickness;
        Ok(())
    }

    pub fn attach_layer(&mut self, layer: &Rc<Layer>) {
        self.layer.attach(layer);
        self.validator.invalidate();
    }
    pub fn detach_layer(&mut self) {
        self.layer.detach();
        self.validator.invalidate();
    }
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
    #[inline]
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
    #[inline]
    pub fn local(&self) -> Aabb2 {
        self.local
    }
    pub fn set_local(&mut self, local: Aabb2) {
        self.local = local;
        self.validator.invalidate();
    }
    #[inline]
    pub fn invalidate(&mut self) {
        self.validator.invalidate();
    }
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.validator.rebuilds()
    }

    pub fn ensure_valid(&mut self) -> Freshness {
        let stamp = SourceStamp {
            frame: self.frame.version(),
            layer: self.layer.stamp(),
        };
        let built = self.built_from;
        let freshness = self.validator.ensure_valid(
            || built == Some(stamp),
            || {
                self.working = if self.local.is_empty() {
                    Aabb2::empty()
                } else {
                    let f = self
                        .layer
                        .local_to_layer()
                        .compose(&self.frame.trs().to_affine_unrotated());
                    Aabb2::from_corners(
                        f.transform_point(self.local.min),
                        f.transform_point(self.local.max),
                    )
                };
                self.built_from = Some(stamp);
                self.generation += 1;
            },
        );
        if freshness.rebuilt() {
            tracing::debug!(generation = self.generation, rect = ?self.working, "rectangle regenerated");
        }
        freshness
    }

    /// Working-space rectangle.
    pub fn rect(&mut self) -> Aabb2 {
        self.ensure_valid();
        self.working
    }

    /// Inner rect, or the inner rect grown by the border thickness.
    pub fn boundary_rect(&mut self, mode: BoundaryMode) -> Aabb2 {
        let inner = self.rect();
        match mode {
            BoundaryMode::Inner => inner,
            BoundaryMode::Outer => inner.expanded(self.border),
        }
    }

    /// Half-open containment in the chosen boundary.
    pub fn contains_in(&mut self, p: Vector2<f64>, mode: BoundaryMode) -> bool {
        self.boundary_rect(mode).contains(p)
    }

    pub fn band_side(&mut self, p: Vector2<f64>) -> BandSide {
        if self.contains_in(p, BoundaryMode::Inner) {
            BandSide::Inside
        } else if self.contains_in(p, BoundaryMode::Outer) {
            BandSide::Border
        } else {
            BandSide::Outside
        }
    }

    pub fn closest_point_on(
        &mut self,
        p: Vector2<f64>,
        mode: BoundaryMode,
    ) -> Option<Vector2<f64>> {
        let r = self.boundary_rect(mode);
        (!r.is_empty()).then(|| r.closest_point(p))
    }

    /// Uniform point in the requested region.
    ///
    /// `None` for `Outside` (unbounded), for an empty rect, and for `Border`
    /// when the thickness is zero.
    pub fn sample_in(
        &mut self,
        side: BandSide,
        sampler: &mut PointSampler,
    ) -> Option<Vector2<f64>> {
        let inner = self.rect();
        if inner.is_empty() {
            return None;
        }
        match side {
            BandSide::Inside => Some(sampler.sample_in(&inner)),
            BandSide::Border if self.border > 0.0 => {
                let strips = border_strips(&inner, &inner.expanded(self.border));
                let areas = strips.map(|b| b.size().x * b.size().y);
                let mut t = sampler.unit() * areas.iter().sum::<f64>();
                let mut pick = strips.len() - 1;
                for (i, a) in areas.iter().enumerate() {
                    if t < *a {
                        pick = i;
                        break;
                    }
                    t -= a;
                }
                Some(sampler.sample_in(&strips[pick]))
            }
            BandSide::Border | BandSide::Outside => None,
        }
    }
}

/// Bottom, top, left and right parts of `outer` minus `inner`; they do not overlap.
fn border_strips(inner: &Aabb2, outer: &Aabb2) -> [Aabb2; 4] {
    [
        Aabb2::from_min_max(outer.min, Vector2::new(outer.max.x, inner.min.y)),
        Aabb2::from_min_max(Vector2::new(outer.min.x, inner.max.y), outer.max),
        Aabb2::from_min_max(
            Vector2::new(outer.min.x, inner.min.y),
            Vector2::new(inner.min.x, inner.max.y),
        ),
        Aabb2::from_min_max(
            Vector2::new(inner.max.x, inner.min.y),
            Vector2::new(outer.max.x, inner.max.y),
        ),
    ]
}

impl PointLocatable for Rectangle {
    fn side(&mut self, p: Vector2<f64>) -> Side {
        Side::from_inside(self.rect().contains(p))
    }
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        let r = self.rect();
        (!r.is_empty()).then(|| r.closest_point(p))
    }
    fn bounds(&mut self) -> Aabb2 {
        self.rect()
    }
}

// ---- Boundary / BoundaryGroup --------------------------------------------

/// One concrete point-locatable shape.
#[derive(Debug)]
pub enum Boundary {
    Polygon(Polygon),
    Rectangle(Rectangle),
    Accelerated(Box<Accelerator>),
}

impl From<Polygon> for Boundary {
    fn from(p: Polygon) -> Self {
        Boundary::Polygon(p)
    }
}
impl From<Rectangle> for Boundary {
    fn from(r: Rectangle) -> Self {
        Boundary::Rectangle(r)
    }
}
impl From<Accelerator> for Boundary {
    fn from(a: Accelerator) -> Self {
        Boundary::Accelerated(Box::new(a))
    }
}

impl Boundary {
    fn locatable(&mut self) -> &mut dyn PointLocatable {
        match self {
            Boundary::Polygon(p) => p,
            Boundary::Rectangle(r) => r,
            Boundary::Accelerated(a) => a.as_mut(),
        }
    }

    /// Only rectangles have a border band; other variants never answer `Border`.
    pub fn band_side(&mut self, p: Vector2<f64>) -> BandSide {
        match self {
            Boundary::Rectangle(r) => r.band_side(p),
            other => other.side(p).into(),
        }
    }

    /// `mode` only matters for rectangles.
    pub fn closest_point_on(
        &mut self,
        p: Vector2<f64>,
        mode: BoundaryMode,
    ) -> Option<Vector2<f64>> {
        match self {
            Boundary::Rectangle(r) => r.closest_point_on(p, mode),
            other => other.closest_point(p),
        }
    }

    /// Random point in the requested region. Non-rectangles sample `Inside`
    /// only, by rejection within their bounds, and give up after
    /// `MAX_REJECTION_TRIES` draws.
    pub fn sample_in(
        &mut self,
        side: BandSide,
        sampler: &mut PointSampler,
    ) -> Option<Vector2<f64>> {
        match (self, side) {
            (Boundary::Rectangle(r), side) => r.sample_in(side, sampler),
            (other, BandSide::Inside) => sample_inside(other.locatable(), sampler),
            (_, BandSide::Border | BandSide::Outside) => None,
        }
    }
}

impl PointLocatable for Boundary {
    #[inline]
    fn side(&mut self, p: Vector2<f64>) -> Side {
        self.locatable().side(p)
    }
    #[inline]
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        self.locatable().closest_point(p)
    }
    #[inline]
    fn bounds(&mut self) -> Aabb2 {
        self.locatable().bounds()
    }
}

/// Mask matching every member.
pub const ALL_LAYERS: u32 = u32::MAX;

/// Shapes combined by union under layer masks.
#[derive(Debug, Default)]
pub struct BoundaryGroup {
    members: Vec<(Boundary, u32)>,
}

impl BoundaryGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member and return its index.
    pub fn push(&mut self, boundary: impl Into<Boundary>, mask: u32) -> usize {
        self.members.push((boundary.into(), mask));
        self.members.len() - 1
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
    pub fn member_mut(&mut self, i: usize) -> Option<&mut Boundary> {
        self.members.get_mut(i).map(|(b, _)| b)
    }

    /// Union of all member masks.
    pub fn support_mask(&self) -> u32 {
        self.members.iter().fold(0, |acc, (_, m)| acc | m)
    }

    fn matching(&mut self, mask: u32) -> impl Iterator<Item = &mut Boundary> + '_ {
        self.members
            .iter_mut()
            .filter(move |(_, m)| m & mask != 0)
            .map(|(b, _)| b)
    }

    /// Inside iff some matching member is Inside; stops at the first hit.
    pub fn side(&mut self, p: Vector2<f64>, mask: u32) -> Side {
        let inside = self.matching(mask).any(|b| b.side(p).is_inside());
        Side::from_inside(inside)
    }

    /// Bit `i` is set iff member `i` matches `mask` and contains `p`.
    /// Members past index 31 are not reported.
    pub fn side_flags(&mut self, p: Vector2<f64>, mask: u32) -> u32 {
        let mut flags = 0;
        for (i, (b, m)) in self.members.iter_mut().enumerate().take(32) {
            if *m & mask != 0 && b.side(p).is_inside() {
                flags |= 1 << i;
            }
        }
        flags
    }

    /// Inside beats Border beats Outside over the matching members.
    pub fn band_side(&mut self, p: Vector2<f64>, mask: u32) -> BandSide {
        let mut out = BandSide::Outside;
        for b in self.matching(mask) {
            match b.band_side(p) {
                BandSide::Inside => return BandSide::Inside,
                BandSide::Border => out = BandSide::Border,
                BandSide::Outside => {}
            }
        }
        out
    }

    /// Nearest boundary point over the matching members; ties go to the earlier member.
    pub fn closest_point(&mut self, p: Vector2<f64>, mask: u32) -> Option<Vector2<f64>> {
        self.closest_point_on(p, BoundaryMode::Inner, mask)
    }

    /// As `closest_point`, measuring rectangles against the chosen boundary.
    pub fn closest_point_on(
        &mut self,
        p: Vector2<f64>,
        mode: BoundaryMode,
        mask: u32,
    ) -> Option<Vector2<f64>> {
        let mut best: Option<(Vector2<f64>, f64)> = None;
        for b in self.matching(mask) {
            if let Some(q) = b.closest_point_on(p, mode) {
                let d2 = (q - p).norm_squared();
                if best.map_or(true, |(_, bd)| d2 < bd) {
                    best = Some((q, d2));
                }
            }
        }
        best.map(|(q, _)| q)
    }

    /// Union of the bounds of matching members.
    pub fn bounds(&mut self, mask: u32) -> Aabb2 {
        self.matching(mask)
            .fold(Aabb2::empty(), |acc, b| acc.union(&b.bounds()))
    }

    /// Pick one matching member uniformly and sample the region from it.
    /// `None` when nothing matches or the picked member cannot supply the region.
    pub fn sample_in(
        &mut self,
        side: BandSide,
        mask: u32,
        sampler: &mut PointSampler,
    ) -> Option<Vector2<f64>> {
        let count = self.matching(mask).count();
        let pick = sampler.index(count)?;
        self.matching(mask).nth(pick)?.sample_in(side, sampler)
    }
}

impl PointLocatable for BoundaryGroup {
    fn side(&mut self, p: Vector2<f64>) -> Side {
        BoundaryGroup::side(self, p, ALL_LAYERS)
    }
    fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        BoundaryGroup::closest_point(self, p, ALL_LAYERS)
    }
    fn bounds(&mut self) -> Aabb2 {
        BoundaryGroup::bounds(self, ALL_LAYERS)
    }
}
