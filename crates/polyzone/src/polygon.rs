//! Polygon: an authored vertex ring placed into working (layer) space.
//!
//! Purpose
//! - Own the local vertex ring and its placement (`Frame`, optional `Layer`).
//! - Lazily derive working-space vertices, edges and bounds, regenerated in full
//!   whenever the ring is edited, the frame or layer version moves, or
//!   `invalidate()` is called.
//! - Answer exact point location (`side`) and nearest-boundary queries.
//!
//! Invariants
//! - After any rebuild, `edges[i] == (vertices[i], vertices[(i+1) % n])`.
//! - Derived state is only reachable through methods that call `ensure_valid`.
//! - Listeners registered with `on_generate` run after every successful rebuild,
//!   in registration order.
//!
//! Code cross-refs: `geom2::{Edge2, crossing_parity}`, `revalidate::Validator`,
//! `frame::{Frame, Layer}`, `fringe::Fringe` (downstream).

use std::fmt;
use std::rc::Rc;

use nalgebra::Vector2;

use crate::error::GeomError;
use crate::frame::{Frame, Layer, LayerLink, SourceStamp};
use crate::geom2::{crossing_parity, Aabb2, Affine2, Edge2, EdgeProjection, Side, Trs2};
use crate::revalidate::{Freshness, Validator};

/// Point-in-polygon algorithm.
///
/// The two agree on every point off the boundary of a simple polygon. On the
/// boundary, and for self-intersecting rings, they may disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SideRule {
    /// Even-odd horizontal ray crossing with the half-open `[ymin, ymax)` rule.
    #[default]
    CrossingNumber,
    /// Sum of subtended edge angles, rounded to whole turns; nonzero is inside.
    WindingNumber,
}

/// Emitted after each successful regeneration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerateEvent {
    pub generation: u64,
    pub vertex_count: usize,
    pub bounds: Aabb2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GenerateEvent)>;

#[derive(Clone, Debug, Default)]
struct Working {
    vertices: Vec<Vector2<f64>>,
    edges: Vec<Edge2>,
    bounds: Aabb2,
    local_to_working: Affine2,
}

impl Working {
    fn regenerate(&mut self, local: &[Vector2<f64>], f: Affine2) {
        self.vertices.clear();
        self.edges.clear();
        self.vertices.extend(local.iter().map(|&v| f.transform_point(v)));
        let n = self.vertices.len();
        for i in 0..n {
            self.edges.push(Edge2::new(self.vertices[i], self.vertices[(i + 1) % n]));
        }
        self.bounds = Aabb2::from_points(&self.vertices);
        self.local_to_working = f;
    }
}

pub struct Polygon {
    local: Vec<Vector2<f64>>,
    frame: Frame,
    layer: LayerLink,
    rule: SideRule,
    validator: Validator,
    built_from: Option<SourceStamp>,
    working: Working,
    generation: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polygon")
            .field("local", &self.local)
            .field("frame", &self.frame)
            .field("rule", &self.rule)
            .field("state", &self.validator.state())
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Polygon {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Polygon {
    pub fn new(local: Vec<Vector2<f64>>) -> Self {
        Self {
            local,
            frame: Frame::default(),
            layer: LayerLink::default(),
            rule: SideRule::default(),
            validator: Validator::new(),
            built_from: None,
            working: Working::default(),
            generation: 0,
            listeners: Vec::new(),
            next_listener: 0,
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

    // ---- placement ------------------------------------------------------

    pub fn attach_layer(&mut self, layer: &Rc<Layer>) {
        self.layer.attach(layer);
        self.validator.invalidate();
    }
    pub fn detach_layer(&mut self) {
        self.layer.detach();
        self.validator.invalidate();
    }
    pub fn layer(&self) -> Option<Rc<Layer>> {
        self.layer.get()
    }
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
    /// Edits through the frame, or replacing it outright, are picked up by the
    /// version check on the next query; no explicit invalidate is needed.
    #[inline]
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    #[inline]
    pub fn side_rule(&self) -> SideRule {
        self.rule
    }
    pub fn set_side_rule(&mut self, rule: SideRule) {
        self.rule = rule;
    }

    // ---- source vertices ------------------------------------------------

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.local.len()
    }
    #[inline]
    pub fn vertex(&self, i: usize) -> Option<Vector2<f64>> {
        self.local.get(i).copied()
    }
    #[inline]
    pub fn local_vertices(&self) -> &[Vector2<f64>] {
        &self.local
    }

    pub fn set_vertex(&mut self, i: usize, v: Vector2<f64>) -> Result<(), GeomError> {
        let len = self.local.len();
        let slot = self
            .local
            .get_mut(i)
            .ok_or(GeomError::VertexIndex { index: i, len })?;
        *slot = v;
        self.validator.invalidate();
        Ok(())
    }

    /// Append and return the new vertex index.
    pub fn add_vertex(&mut self, v: Vector2<f64>) -> usize {
        self.local.push(v);
        self.validator.invalidate();
        self.local.len() - 1
    }

    pub fn insert_vertex(&mut self, i: usize, v: Vector2<f64>) -> Result<(), GeomError> {
        if i > self.local.len() {
            return Err(GeomError::VertexIndex {
                index: i,
                len: self.local.len(),
            });
        }
        self.local.insert(i, v);
        self.validator.invalidate();
        Ok(())
    }

    pub fn remove_vertex(&mut self, i: usize) -> Result<Vector2<f64>, GeomError> {
        if i >= self.local.len() {
            return Err(GeomError::VertexIndex {
                index: i,
                len: self.local.len(),
            });
        }
        self.validator.invalidate();
        Ok(self.local.remove(i))
    }

    pub fn set_vertices(&mut self, local: Vec<Vector2<f64>>) {
        self.local = local;
        self.validator.invalidate();
    }

    // ---- revalidation ---------------------------------------------------

    #[inline]
    pub fn invalidate(&mut self) {
        self.validator.invalidate();
    }

    /// Completed regenerations; also the `generation` of the current geometry.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_generate(&mut self, listener: impl FnMut(&GenerateEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Regenerate working geometry if stale or if the frame/layer moved.
    pub fn ensure_valid(&mut self) -> Freshness {
        let stamp = SourceStamp {
            frame: self.frame.version(),
            layer: self.layer.stamp(),
        };
        let built = self.built_from;
        let freshness = self.validator.ensure_valid(
            || built == Some(stamp),
            || {
                let f = self.layer.local_to_layer().compose(&self.frame.to_affine());
                self.working.regenerate(&self.local, f);
                self.built_from = Some(stamp);
                self.generation += 1;
            },
        );
        if freshness.rebuilt() {
            let event = GenerateEvent {
                generation: self.generation,
                vertex_count: self.working.vertices.len(),
                bounds: self.working.bounds,
            };
            tracing::debug!(
                generation = event.generation,
                vertices = event.vertex_count,
                "polygon regenerated"
            );
            for (_, listener) in self.listeners.iter_mut() {
                listener(&event);
            }
        }
        freshness
    }

    // ---- derived reads --------------------------------------------------

    pub fn working_vertices(&mut self) -> &[Vector2<f64>] {
        self.ensure_valid();
        &self.working.vertices
    }
    pub fn edges(&mut self) -> &[Edge2] {
        self.ensure_valid();
        &self.working.edges
    }
    /// Axis-aligned bounds of the working vertices; empty for an empty ring.
    pub fn bounds(&mut self) -> Aabb2 {
        self.ensure_valid();
        self.working.bounds
    }
    pub fn local_to_working(&mut self) -> Affine2 {
        self.ensure_valid();
        self.working.local_to_working
    }

    // ---- queries --------------------------------------------------------

    #[inline]
    pub fn side(&mut self, p: Vector2<f64>) -> Side {
        self.side_with(p, self.rule)
    }

    pub fn side_with(&mut self, p: Vector2<f64>, rule: SideRule) -> Side {
        self.ensure_valid();
        let edges = &self.working.edges;
        match rule {
            SideRule::CrossingNumber => {
                Side::from_inside(crossing_parity(edges.iter().map(|e| (e.v0(), e.v1())), p))
            }
            SideRule::WindingNumber => {
                let total: f64 = edges.iter().map(|e| e.signed_turn_angle(p)).sum();
                Side::from_inside((total / std::f64::consts::TAU).round() as i64 != 0)
            }
        }
    }

    /// Nearest edge and the projection onto it. Ties go to the first edge in ring order.
    pub fn closest_edge(&mut self, p: Vector2<f64>) -> Option<(usize, EdgeProjection)> {
        self.ensure_valid();
        let mut best: Option<(usize, EdgeProjection)> = None;
        for (i, e) in self.working.edges.iter().enumerate() {
            let pr = e.distance_to(p);
            if best.as_ref().map_or(true, |(_, b)| pr.distance < b.distance) {
                best = Some((i, pr));
            }
        }
        best
    }

    /// Nearest boundary point; `None` only for an empty ring.
    #[inline]
    pub fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        self.closest_edge(p).map(|(_, pr)| pr.point)
    }

    /// Nearest working vertex by squared distance; ties go to the lowest index.
    pub fn closest_vertex_index(&mut self, p: Vector2<f64>) -> Option<usize> {
        self.ensure_valid();
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in self.working.vertices.iter().enumerate() {
            let d2 = (v - p).norm_squared();
            if best.map_or(true, |(_, b)| d2 < b) {
                best = Some((i, d2));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Completed rebuilds, for diagnostics.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.validator.rebuilds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom2::rand::{draw_star_polygon, PointSampler, RadialCfg, ReplayToken};
    use nalgebra::vector;
    use std::cell::RefCell;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            vector![-0.5, -0.5],
            vector![-0.5, 0.5],
            vector![0.5, 0.5],
            vector![0.5, -0.5],
        ])
    }

    #[test]
    fn unit_square_queries() {
        let mut sq = unit_square();
        assert_eq!(sq.side(vector![0.0, 0.0]), Side::Inside);
        assert_eq!(sq.side(vector![10.0, 10.0]), Side::Outside);
        let cp = sq.closest_point(vector![2.0, 0.0]).unwrap();
        assert!((cp - vector![0.5, 0.0]).norm() < 1e-12);
        assert_eq!(sq.rebuilds(), 1);
    }

    #[test]
    fn hypotenuse_point_is_deterministic() {
        let mut tri = Polygon::new(vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0]]);
        let p = vector![0.5, 0.5];
        let first = tri.side(p);
        for _ in 0..10 {
            assert_eq!(tri.side(p), first);
        }
        // Half-open crossing rule counts both the hypotenuse and the left leg.
        assert_eq!(first, Side::Outside);
        // The winding rule sees a half turn from the hypotenuse plus two quarter turns.
        assert_eq!(tri.side_with(p, SideRule::WindingNumber), Side::Inside);
    }

    #[test]
    fn edge_ring_closes_over_working_vertices() {
        let mut sq = unit_square();
        let verts = sq.working_vertices().to_vec();
        let edges = sq.edges().to_vec();
        assert_eq!(edges.len(), verts.len());
        for (i, e) in edges.iter().enumerate() {
            assert_eq!(e.v0(), verts[i]);
            assert_eq!(e.v1(), verts[(i + 1) % verts.len()]);
        }
        let b = sq.bounds();
        assert_eq!(b.min, vector![-0.5, -0.5]);
        assert_eq!(b.max, vector![0.5, 0.5]);
    }

    #[test]
    fn closest_vertex_ties_go_to_lowest_index() {
        let mut sq = unit_square();
        assert_eq!(sq.closest_vertex_index(vector![0.0, 0.0]), Some(0));
        assert_eq!(sq.closest_vertex_index(vector![0.4, 0.4]), Some(2));
        assert_eq!(sq.closest_vertex_index(vector![0.4, -3.0]), Some(3));
    }

    #[test]
    fn closest_edge_ties_go_to_first_edge() {
        let mut sq = unit_square();
        // Equidistant from every edge.
        let (i, pr) = sq.closest_edge(vector![0.0, 0.0]).unwrap();
        assert_eq!(i, 0);
        assert!((pr.distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_ring_is_outside_with_no_boundary() {
        let mut empty = Polygon::default();
        assert_eq!(empty.side(vector![0.0, 0.0]), Side::Outside);
        assert_eq!(empty.closest_point(vector![0.0, 0.0]), None);
        assert_eq!(empty.closest_vertex_index(vector![0.0, 0.0]), None);
        assert!(empty.bounds().is_empty());

        let mut dot = Polygon::new(vec![vector![1.0, 1.0]]);
        assert_eq!(dot.side(vector![1.0, 1.0]), Side::Outside);
        let cp = dot.closest_point(vector![4.0, 1.0]).unwrap();
        assert_eq!(cp, vector![1.0, 1.0]);
    }

    #[test]
    fn concave_notch_is_outside() {
        // L-shape: unit square minus its upper-right quarter.
        let mut l = Polygon::new(vec![
            vector![0.0, 0.0],
            vector![1.0, 0.0],
            vector![1.0, 0.5],
            vector![0.5, 0.5],
            vector![0.5, 1.0],
            vector![0.0, 1.0],
        ]);
        assert_eq!(l.side(vector![0.75, 0.75]), Side::Outside);
        assert_eq!(l.side(vector![0.25, 0.75]), Side::Inside);
        assert_eq!(l.side(vector![0.75, 0.25]), Side::Inside);
        let cp = l.closest_point(vector![0.8, 0.6]).unwrap();
        assert!((cp - vector![0.8, 0.5]).norm() < 1e-12);
    }

    #[test]
    fn frame_places_ring_in_working_space() {
        let mut sq = unit_square().with_frame(Trs2::new(
            vector![5.0, 0.0],
            std::f64::consts::FRAC_PI_4,
            vector![2.0, 2.0],
        ));
        assert_eq!(sq.side(vector![5.0, 0.0]), Side::Inside);
        // Rotated 45°: the corner reaches sqrt(2) along the axes.
        assert_eq!(sq.side(vector![5.0 + 1.35, 0.0]), Side::Inside);
        assert_eq!(sq.side(vector![5.0 + 1.45, 0.0]), Side::Outside);
        let b = sq.bounds();
        assert!((b.max.x - (5.0 + 2f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn frame_edit_without_invalidate_is_picked_up() {
        let mut sq = unit_square();
        assert_eq!(sq.side(vector![3.0, 0.0]), Side::Outside);
        assert_eq!(sq.generation(), 1);
        sq.frame_mut().translate(vector![3.0, 0.0]);
        assert_eq!(sq.side(vector![3.0, 0.0]), Side::Inside);
        assert_eq!(sq.generation(), 2);
        // Repeated queries stay on the fast path.
        for _ in 0..5 {
            sq.side(vector![3.0, 0.0]);
        }
        assert_eq!(sq.rebuilds(), 2);
    }

    #[test]
    fn replaced_frame_is_picked_up() {
        let mut sq = unit_square();
        assert_eq!(sq.side(vector![3.0, 0.0]), Side::Outside);
        *sq.frame_mut() = Frame::new(Trs2::from_translation(vector![3.0, 0.0]));
        assert_eq!(sq.side(vector![3.0, 0.0]), Side::Inside);
        assert_eq!(sq.rebuilds(), 2);

        // A frame cloned before the build and edited afterwards gets its own stamp.
        let mut other = unit_square();
        let mut moved = other.frame().clone();
        assert_eq!(other.side(vector![-3.0, 0.0]), Side::Outside);
        moved.set_translation(vector![-3.0, 0.0]);
        *other.frame_mut() = moved;
        assert_eq!(other.side(vector![-3.0, 0.0]), Side::Inside);
    }

    #[test]
    fn layer_scale_and_invalidation_propagate() {
        let layer = Layer::shared(Trs2::new(vector![100.0, 0.0], 0.3, vector![3.0, 1.0]));
        let mut sq = unit_square().with_layer(&layer);
        // Only the layer scale reaches working space; placement is world-only.
        let b = sq.bounds();
        assert!((b.max.x - 1.5).abs() < 1e-12);
        assert!((b.max.y - 0.5).abs() < 1e-12);
        assert_eq!(sq.rebuilds(), 1);

        layer.invalidate();
        sq.bounds();
        assert_eq!(sq.rebuilds(), 2);

        let mut trs = layer.placement();
        trs.scale = vector![1.0, 1.0];
        layer.set_placement(trs);
        assert!((sq.bounds().max.x - 0.5).abs() < 1e-12);
        assert_eq!(sq.rebuilds(), 3);

        layer.set_placement(Trs2::new(vector![0.0, 0.0], 0.0, vector![4.0, 4.0]));
        drop(layer);
        // Dropped layer: identity transform, one more rebuild.
        assert!((sq.bounds().max.x - 0.5).abs() < 1e-12);
        assert_eq!(sq.rebuilds(), 4);
        sq.bounds();
        assert_eq!(sq.rebuilds(), 4);
        assert!(sq.layer().is_none());
    }

    #[test]
    fn edits_invalidate_and_reject_bad_indices() {
        let mut sq = unit_square();
        sq.side(vector![0.0, 0.0]);
        assert_eq!(sq.add_vertex(vector![0.0, -1.0]), 4);
        assert_eq!(sq.side(vector![0.0, -0.75]), Side::Inside);
        assert_eq!(sq.rebuilds(), 2);
        assert_eq!(sq.remove_vertex(4), Ok(vector![0.0, -1.0]));
        assert_eq!(sq.side(vector![0.0, -0.75]), Side::Outside);
        sq.set_vertex(2, vector![2.0, 2.0]).unwrap();
        assert_eq!(sq.side(vector![1.0, 0.9]), Side::Inside);
        assert_eq!(
            sq.set_vertex(9, vector![0.0, 0.0]),
            Err(GeomError::VertexIndex { index: 9, len: 4 })
        );
        assert!(sq.remove_vertex(4).is_err());
        assert!(sq.insert_vertex(5, vector![0.0, 0.0]).is_err());
        sq.insert_vertex(4, vector![0.0, -1.0]).unwrap();
        assert_eq!(sq.vertex(4), Some(vector![0.0, -1.0]));
        assert_eq!(sq.vertex_count(), 5);
    }

    #[test]
    fn listeners_fire_after_each_regeneration() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sq = unit_square();
        let sink = Rc::clone(&seen);
        let id = sq.on_generate(move |ev| sink.borrow_mut().push((ev.generation, ev.vertex_count)));
        sq.side(vector![0.0, 0.0]);
        sq.side(vector![0.0, 0.0]);
        sq.add_vertex(vector![0.0, -1.0]);
        sq.closest_point(vector![0.0, 0.0]);
        assert_eq!(*seen.borrow(), vec![(1, 4), (2, 5)]);
        assert!(sq.remove_listener(id));
        assert!(!sq.remove_listener(id));
        sq.invalidate();
        sq.bounds();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn winding_agrees_with_crossing_off_the_boundary() {
        let cfg = RadialCfg::default();
        for index in 0..20 {
            let ring = draw_star_polygon(cfg, ReplayToken { seed: 11, index });
            let mut poly = Polygon::new(ring);
            let area = poly.bounds().expanded(0.25);
            let mut sampler = PointSampler::new(index);
            for p in sampler.sample_many(&area, 200) {
                let near = poly.closest_edge(p).map(|(_, pr)| pr.distance).unwrap_or(1.0);
                if near < 1e-9 {
                    continue;
                }
                assert_eq!(
                    poly.side_with(p, SideRule::CrossingNumber),
                    poly.side_with(p, SideRule::WindingNumber),
                    "ring {index}, point {p:?}"
                );
            }
        }
    }
}
