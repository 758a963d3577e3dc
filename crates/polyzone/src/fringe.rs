//! Fringe: boundary slabs (one oriented box per polygon edge).
//!
//! The fringe owns its polygon. `ensure_valid` first brings the polygon up to
//! date, then rebuilds the slabs iff the polygon generation moved or the fringe
//! itself was invalidated (e.g. by a new extent).
//!
//! Invariant: after a rebuild `entries().len() == polygon.edges().len()`, same order.

use nalgebra::Vector2;

use crate::error::GeomError;
use crate::geom2::{Aabb2, Obb2};
use crate::polygon::Polygon;
use crate::revalidate::{Freshness, Validator};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FringeEntry {
    /// Index of the source edge in the polygon ring.
    pub edge: usize,
    pub obb: Obb2,
}

#[derive(Debug)]
pub struct Fringe {
    polygon: Polygon,
    extent: f64,
    validator: Validator,
    built_from: Option<u64>,
    entries: Vec<FringeEntry>,
    bounds: Aabb2,
    generation: u64,
}

fn check_extent(extent: f64) -> Result<f64, GeomError> {
    if !extent.is_finite() || extent < 0.0 {
        return Err(GeomError::invalid(format!(
            "fringe extent must be finite and >= 0, got {extent}"
        )));
    }
    Ok(extent)
}

impl Fringe {
    pub fn new(polygon: Polygon, extent: f64) -> Result<Self, GeomError> {
        Ok(Self {
            polygon,
            extent: check_extent(extent)?,
            validator: Validator::new(),
            built_from: None,
            entries: Vec::new(),
            bounds: Aabb2::empty(),
            generation: 0,
        })
    }

    #[inline]
    pub fn extent(&self) -> f64 {
        self.extent
    }
    pub fn set_extent(&mut self, extent: f64) -> Result<(), GeomError> {
        self.extent = check_extent(extent)?;
        self.validator.invalidate();
        Ok(())
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.validator.invalidate();
    }
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }
    /// Polygon edits made through this handle are seen by the next query.
    #[inline]
    pub fn polygon_mut(&mut self) -> &mut Polygon {
        &mut self.polygon
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
        self.polygon.ensure_valid();
        let upstream = self.polygon.generation();
        let built = self.built_from;
        let freshness = self.validator.ensure_valid(
            || built == Some(upstream),
            || {
                let extent = self.extent;
                self.entries.clear();
                self.entries.extend(self.polygon.edges().iter().enumerate().map(|(edge, e)| {
                    FringeEntry {
                        edge,
                        obb: Obb2::around_edge(e, extent),
                    }
                }));
                self.bounds = self
                    .entries
                    .iter()
                    .fold(Aabb2::empty(), |acc, en| acc.union(&en.obb.aabb()));
                self.built_from = Some(upstream);
                self.generation += 1;
            },
        );
        if freshness.rebuilt() {
            tracing::debug!(
                generation = self.generation,
                entries = self.entries.len(),
                extent = self.extent,
                "fringe regenerated"
            );
        }
        freshness
    }

    pub fn entries(&mut self) -> &[FringeEntry] {
        self.ensure_valid();
        &self.entries
    }

    /// Union of every slab's footprint; empty when the polygon has no edges.
    pub fn bounds(&mut self) -> Aabb2 {
        self.ensure_valid();
        self.bounds
    }

    /// True iff `b` touches the aggregate bounds and at least one slab.
    pub fn overlaps(&mut self, b: &Aabb2) -> bool {
        self.ensure_valid();
        self.bounds.intersects(b) && self.entries.iter().any(|en| en.obb.intersects_aabb(b))
    }

    /// True iff `p` lies in some slab (closed).
    pub fn contains(&mut self, p: Vector2<f64>) -> bool {
        self.ensure_valid();
        self.bounds.intersects(&Aabb2::from_min_max(p, p))
            && self.entries.iter().any(|en| en.obb.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn square_fringe(extent: f64) -> Fringe {
        let sq = Polygon::new(vec![
            vector![-0.5, -0.5],
            vector![0.5, -0.5],
            vector![0.5, 0.5],
            vector![-0.5, 0.5],
        ]);
        Fringe::new(sq, extent).unwrap()
    }

    #[test]
    fn entries_follow_edges_in_order() {
        let mut f = square_fringe(0.1);
        let edges = f.polygon_mut().edges().to_vec();
        let entries = f.entries().to_vec();
        assert_eq!(entries.len(), edges.len());
        for (i, (en, e)) in entries.iter().zip(&edges).enumerate() {
            assert_eq!(en.edge, i);
            assert!((en.obb.center - e.midpoint()).norm() < 1e-12);
            assert!((en.obb.half_extents - vector![0.6, 0.1]).norm() < 1e-12);
        }
        let b = f.bounds();
        assert!((b.min - vector![-0.6, -0.6]).norm() < 1e-12);
        assert!((b.max - vector![0.6, 0.6]).norm() < 1e-12);
    }

    #[test]
    fn overlaps_needs_an_actual_slab() {
        let mut f = square_fringe(0.05);
        // Centre of the square: inside the aggregate bounds, away from every slab.
        let centre = Aabb2::from_min_max(vector![-0.2, -0.2], vector![0.2, 0.2]);
        assert!(!f.overlaps(&centre));
        let straddle = Aabb2::from_min_max(vector![0.4, -0.1], vector![0.6, 0.1]);
        assert!(f.overlaps(&straddle));
        let far = Aabb2::from_min_max(vector![3.0, 3.0], vector![4.0, 4.0]);
        assert!(!f.overlaps(&far));
        assert!(f.contains(vector![0.52, 0.0]));
        assert!(!f.contains(vector![0.0, 0.0]));
    }

    #[test]
    fn zero_extent_still_covers_the_boundary() {
        let mut f = square_fringe(0.0);
        let on_edge = Aabb2::from_min_max(vector![0.5, 0.0], vector![0.75, 0.125]);
        assert!(f.overlaps(&on_edge));
        let near = Aabb2::from_min_max(vector![0.5625, 0.0], vector![0.75, 0.125]);
        assert!(!f.overlaps(&near));
    }

    #[test]
    fn rejects_bad_extent() {
        assert!(Fringe::new(Polygon::default(), -1.0).is_err());
        assert!(Fringe::new(Polygon::default(), f64::NAN).is_err());
        let mut f = square_fringe(0.1);
        assert!(f.set_extent(f64::INFINITY).is_err());
        assert_eq!(f.extent(), 0.1);
    }

    #[test]
    fn empty_polygon_has_empty_fringe() {
        let mut f = Fringe::new(Polygon::default(), 0.1).unwrap();
        assert!(f.entries().is_empty());
        assert!(f.bounds().is_empty());
        let any = Aabb2::from_min_max(vector![-1.0, -1.0], vector![1.0, 1.0]);
        assert!(!f.overlaps(&any));
    }

    #[test]
    fn polygon_change_rebuilds_fringe_once() {
        let mut f = square_fringe(0.1);
        f.bounds();
        f.bounds();
        assert_eq!((f.polygon().rebuilds(), f.rebuilds()), (1, 1));

        f.polygon_mut().frame_mut().translate(vector![2.0, 0.0]);
        assert!((f.bounds().center() - vector![2.0, 0.0]).norm() < 1e-12);
        f.entries();
        assert_eq!((f.polygon().rebuilds(), f.rebuilds()), (2, 2));
    }

    #[test]
    fn fringe_invalidation_leaves_polygon_alone() {
        let mut f = square_fringe(0.1);
        f.bounds();
        f.invalidate();
        f.bounds();
        assert_eq!(f.polygon().rebuilds(), 1);
        assert_eq!(f.rebuilds(), 2);

        f.set_extent(0.2).unwrap();
        assert!((f.bounds().max.x - 0.7).abs() < 1e-12);
        assert_eq!(f.polygon().rebuilds(), 1);
        assert_eq!(f.rebuilds(), 3);
        assert_eq!(f.generation(), 3);
    }
}
