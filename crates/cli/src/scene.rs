//! JSON zone descriptions and their conversion into an accelerated zone.
//!
//! Everything but `vertices` has a default, so `{"vertices": [[0,0],[1,0],[0,1]]}`
//! is a complete description.

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use polyzone::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub translation: [f64; 2],
    /// Radians, counterclockwise.
    pub rotation: f64,
    pub scale: [f64; 2],
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
        }
    }
}

impl TransformDesc {
    pub fn to_trs(self) -> Trs2 {
        Trs2::new(
            Vec2::new(self.translation[0], self.translation[1]),
            self.rotation,
            Vec2::new(self.scale[0], self.scale[1]),
        )
    }
}

fn default_extent() -> f64 {
    0.05
}
fn default_subdivision() -> usize {
    AccelCfg::default().subdivision
}
fn default_margin() -> f64 {
    AccelCfg::default().margin
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneDesc {
    pub vertices: Vec<[f64; 2]>,
    #[serde(default)]
    pub transform: TransformDesc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<TransformDesc>,
    #[serde(default = "default_extent")]
    pub fringe_extent: f64,
    #[serde(default = "default_subdivision")]
    pub subdivision: usize,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl ZoneDesc {
    pub fn from_vertices(vertices: &[Vec2<f64>]) -> Self {
        Self {
            vertices: vertices.iter().map(|v| [v.x, v.y]).collect(),
            transform: TransformDesc::default(),
            layer: None,
            fringe_extent: default_extent(),
            subdivision: default_subdivision(),
            margin: default_margin(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading zone file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing zone file {}", path.display()))
    }

    pub fn build(&self) -> Result<Zone> {
        let layer = self.layer.map(|t| Layer::shared(t.to_trs()));
        let mut poly = Polygon::new(self.vertices.iter().map(|&[x, y]| Vec2::new(x, y)).collect())
            .with_frame(self.transform.to_trs());
        if let Some(l) = &layer {
            poly.attach_layer(l);
        }
        let cfg = AccelCfg {
            subdivision: self.subdivision,
            margin: self.margin,
            ..AccelCfg::default()
        };
        let accel = Accelerator::from_polygon(poly, self.fringe_extent, cfg)
            .context("building accelerator")?;
        Ok(Zone { layer, accel })
    }
}

/// A built zone. Holds the layer alive for as long as the polygon needs it.
#[derive(Debug)]
pub struct Zone {
    pub layer: Option<Rc<Layer>>,
    pub accel: Accelerator,
}
