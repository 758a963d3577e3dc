//! Transform providers: an owned `Frame` per shape and a shared upstream `Layer`.
//!
//! Both carry a version stamp drawn from one process-wide counter on
//! construction and on every mutation, so no two distinct states share a stamp.
//! Downstream caches keep the stamps they were built from and compare them in
//! their freshness predicate, so a transform edited or replaced without an
//! explicit `invalidate()` is still picked up on the next query.
//!
//! The layer defines the working space. It is owned by the composition root
//! (`Rc<Layer>`); shapes hold a `Weak<Layer>` only.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Vector2;

use crate::geom2::{Affine2, Trs2};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Fresh, never repeated version stamp.
#[inline]
fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Local placement of one shape inside its layer.
///
/// A clone shares its source's stamp until either side is edited.
#[derive(Clone, Debug)]
pub struct Frame {
    trs: Trs2,
    version: u64,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(Trs2::identity())
    }
}

impl Frame {
    #[inline]
    pub fn new(trs: Trs2) -> Self {
        Self {
            trs,
            version: next_stamp(),
        }
    }
    #[inline]
    pub fn trs(&self) -> Trs2 {
        self.trs
    }
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }
    #[inline]
    pub fn to_affine(&self) -> Affine2 {
        self.trs.to_affine()
    }
    pub fn set(&mut self, trs: Trs2) {
        self.trs = trs;
        self.version = next_stamp();
    }
    pub fn set_translation(&mut self, t: Vector2<f64>) {
        self.trs.translation = t;
        self.version = next_stamp();
    }
    pub fn set_rotation(&mut self, radians: f64) {
        self.trs.rotation = radians;
        self.version = next_stamp();
    }
    pub fn set_scale(&mut self, s: Vector2<f64>) {
        self.trs.scale = s;
        self.version = next_stamp();
    }
    pub fn translate(&mut self, delta: Vector2<f64>) {
        self.set_translation(self.trs.translation + delta);
    }
}

/// Shared coordinate frame: world placement (translation + rotation) and a
/// layer-local scale applied to every member shape.
///
/// Interior mutability keeps the layer shareable between shapes in a
/// single-threaded host; it is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct Layer {
    placement: Cell<Trs2>,
    version: Cell<u64>,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(Trs2::identity())
    }
}

impl Layer {
    pub fn new(placement: Trs2) -> Self {
        Self {
            placement: Cell::new(placement),
            version: Cell::new(next_stamp()),
        }
    }
    pub fn shared(placement: Trs2) -> Rc<Self> {
        Rc::new(Self::new(placement))
    }

    #[inline]
    pub fn placement(&self) -> Trs2 {
        self.placement.get()
    }
    pub fn set_placement(&self, trs: Trs2) {
        self.placement.set(trs);
        self.invalidate();
    }
    /// Force every member shape to rebuild on its next query.
    #[inline]
    pub fn invalidate(&self) {
        self.version.set(next_stamp());
    }
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Layer-local scale: the part of the placement that reaches working space.
    pub fn local_to_layer(&self) -> Affine2 {
        let s = self.placement.get().scale;
        Trs2::new(Vector2::zeros(), 0.0, s).to_affine()
    }
    /// Rigid part of the placement (translation + rotation).
    pub fn layer_to_world(&self) -> Affine2 {
        let p = self.placement.get();
        Trs2::new(p.translation, p.rotation, Vector2::new(1.0, 1.0)).to_affine()
    }
    #[inline]
    pub fn layer_point_to_world(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.layer_to_world().transform_point(p)
    }
    /// Always invertible: the layer-to-world map is rigid.
    pub fn world_point_to_layer(&self, p: Vector2<f64>) -> Vector2<f64> {
        let f = self.layer_to_world();
        f.m.transpose() * (p - f.t)
    }
}

/// Version snapshot of everything a shape's working geometry depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SourceStamp {
    pub frame: u64,
    pub layer: LayerStamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LayerStamp {
    Detached,
    Attached(u64),
    Dropped,
}

/// Non-owning link from a shape to its layer.
#[derive(Clone, Debug, Default)]
pub(crate) struct LayerLink {
    layer: Option<Weak<Layer>>,
}

impl LayerLink {
    pub fn attach(&mut self, layer: &Rc<Layer>) {
        self.layer = Some(Rc::downgrade(layer));
    }
    pub fn detach(&mut self) {
        self.layer = None;
    }
    pub fn get(&self) -> Option<Rc<Layer>> {
        self.layer.as_ref().and_then(Weak::upgrade)
    }
    pub fn stamp(&self) -> LayerStamp {
        match &self.layer {
            None => LayerStamp::Detached,
            Some(w) => match w.upgrade() {
                Some(l) => LayerStamp::Attached(l.version()),
                None => LayerStamp::Dropped,
            },
        }
    }
    /// Identity when detached; a dropped layer also yields identity, with a warning.
    pub fn local_to_layer(&self) -> Affine2 {
        match &self.layer {
            None => Affine2::identity(),
            Some(w) => match w.upgrade() {
                Some(l) => l.local_to_layer(),
                None => {
                    tracing::warn!("layer dropped; using identity layer transform");
                    Affine2::identity()
                }
            },
        }
    }
}
