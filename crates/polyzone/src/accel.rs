//! Accelerated point location: a classification grid over the fringe bounds.
//!
//! Purpose
//! - Answer `sample(p)` in O(1) for points away from the boundary, with the exact
//!   polygon test as fallback for cells the fringe touches.
//!
//! Build
//! - Chain: polygon → fringe → grid. `ensure_valid` calls `Fringe::ensure_valid`
//!   (which calls the polygon's) and rebuilds the grid iff the fringe generation
//!   moved or the accelerator was invalidated.
//! - The grid covers the fringe bounds grown by `margin * max(width, height)`
//!   (at least `MIN_ABS_MARGIN`). Cells overlapping any slab stay `Unknown`;
//!   every other cell contains no boundary point and takes the side of its centre.
//!
//! Correctness
//! - A non-`Unknown` cell is free of boundary points, so every point in it has the
//!   same side as the centre. Under `WrapMode::Clamp` a point off the grid reads a
//!   border cell, which touches the grid edge outside the polygon bounds and is
//!   therefore `Outside` or `Unknown`. Hence `sample == polygon.side` everywhere
//!   off the boundary.
//! - `WrapMode::Repeat` tiles the grid and gives meaningless answers off the grid.
//!
//! Code cross-refs: `fringe::Fringe`, `grid::UniformGrid`, `polygon::Polygon::side`.

use nalgebra::Vector2;

use crate::error::GeomError;
use crate::fringe::Fringe;
use crate::geom2::{Aabb2, Side};
use crate::grid::{UniformGrid, WrapMode};
use crate::polygon::Polygon;
use crate::revalidate::{Freshness, Validator};

/// Absolute padding applied when the relative margin vanishes (flat or point bounds).
pub const MIN_ABS_MARGIN: f64 = 1e-6;

/// Cached classification of one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// The cell overlaps the fringe; answer with the exact test.
    #[default]
    Unknown,
    Inside,
    Outside,
}

impl CellClass {
    #[inline]
    pub fn from_side(side: Side) -> Self {
        match side {
            Side::Inside => CellClass::Inside,
            Side::Outside => CellClass::Outside,
        }
    }
    #[inline]
    pub fn side(self) -> Option<Side> {
        match self {
            CellClass::Unknown => None,
            CellClass::Inside => Some(Side::Inside),
            CellClass::Outside => Some(Side::Outside),
        }
    }
}

/// Accelerator configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccelCfg {
    /// Cells per axis; at least [`AccelCfg::MIN_SUBDIVISION`].
    pub subdivision: usize,
    /// Relative growth of the fringe bounds, as a fraction of the longer side.
    pub margin: f64,
    pub wrap: WrapMode,
}

impl Default for AccelCfg {
    fn default() -> Self {
        Self {
            subdivision: 10,
            margin: 0.01,
            wrap: WrapMode::Clamp,
        }
    }
}

impl AccelCfg {
    pub const MIN_SUBDIVISION: usize = 3;

    pub fn validate(&self) -> Result<(), GeomError> {
        if self.subdivision < Self::MIN_SUBDIVISION {
            return Err(GeomError::invalid(format!(
                "subdivision must be >= {}, got {}",
                Self::MIN_SUBDIVISION,
                self.subdivision
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(GeomError::invalid(format!(
                "margin must be finite and >= 0, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

/// Cell counts by classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub inside: usize,
    pub outside: usize,
    pub unknown: usize,
}

impl GridStats {
    #[inline]
    pub fn total(&self) -> usize {
        self.inside + self.outside + self.unknown
    }
}

#[derive(Debug)]
pub struct Accelerator {
    fringe: Fringe,
    cfg: AccelCfg,
    grid: UniformGrid<CellClass>,
    validator: Validator,
    built_from: Option<u64>,
}

/// Region the grid must cover: fringe bounds plus margin, never empty or flat.
fn covered_area(bounds: Aabb2, margin: f64) -> Aabb2 {
    if bounds.is_empty() {
        return Aabb2::from_min_max(Vector2::new(-0.5, -0.5), Vector2::new(0.5, 0.5));
    }
    let size = bounds.size();
    let pad = (margin * size.x.max(size.y)).max(MIN_ABS_MARGIN);
    bounds.expanded(pad)
}

fn rebuild_grid(
    grid: &mut UniformGrid<CellClass>,
    fringe: &mut Fringe,
    cfg: &AccelCfg,
) -> Result<(), GeomError> {
    let area = covered_area(fringe.bounds(), cfg.margin);
    let n = cfg.subdivision;
    let cell = area.size() / n as f64;
    if grid.subdivision() != n {
        grid.set_subdivision(n)?;
    }
    grid.init(area.min, cell, cfg.wrap, CellClass::Unknown)?;
    for y in 0..n {
        for x in 0..n {
            let cell_area = grid.cell_area(x, y);
            let class = if fringe.overlaps(&cell_area) {
                CellClass::Unknown
            } else {
                CellClass::from_side(fringe.polygon_mut().side(cell_area.center()))
            };
            if let Some(slot) = grid.get_mut(x, y) {
                *slot = class;
            }
        }
    }
    Ok(())
}

impl Accelerator {
    pub fn new(fringe: Fringe, cfg: AccelCfg) -> Result<Self, GeomError> {
        cfg.validate()?;
        Ok(Self {
            fringe,
            cfg,
            grid: UniformGrid::new(cfg.subdivision, CellClass::Unknown)?,
            validator: Validator::new(),
            built_from: None,
        })
    }

    /// Wrap a polygon with a fresh fringe of the given extent.
    pub fn from_polygon(polygon: Polygon, extent: f64, cfg: AccelCfg) -> Result<Self, GeomError> {
        Self::new(Fringe::new(polygon, extent)?, cfg)
    }

    #[inline]
    pub fn cfg(&self) -> &AccelCfg {
        &self.cfg
    }
    pub fn set_subdivision(&mut self, n: usize) -> Result<(), GeomError> {
        let cfg = AccelCfg {
            subdivision: n,
            ..self.cfg
        };
        cfg.validate()?;
        self.cfg = cfg;
        self.validator.invalidate();
        Ok(())
    }
    pub fn set_cfg(&mut self, cfg: AccelCfg) -> Result<(), GeomError> {
        cfg.validate()?;
        self.cfg = cfg;
        self.validator.invalidate();
        Ok(())
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.validator.invalidate();
    }
    #[inline]
    pub fn fringe(&self) -> &Fringe {
        &self.fringe
    }
    #[inline]
    pub fn fringe_mut(&mut self) -> &mut Fringe {
        &mut self.fringe
    }
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        self.fringe.polygon()
    }
    #[inline]
    pub fn polygon_mut(&mut self) -> &mut Polygon {
        self.fringe.polygon_mut()
    }
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.validator.rebuilds()
    }

    /// Bring polygon, fringe and grid up to date, in that order.
    ///
    /// Fails only if the grid cannot be laid out (e.g. non-finite vertices); the
    /// accelerator then stays stale and the next call retries.
    pub fn ensure_valid(&mut self) -> Result<Freshness, GeomError> {
        self.fringe.ensure_valid();
        let upstream = self.fringe.generation();
        let built = self.built_from;
        let freshness = self.validator.try_ensure_valid::<GeomError>(
            || built == Some(upstream),
            || {
                rebuild_grid(&mut self.grid, &mut self.fringe, &self.cfg)?;
                self.built_from = Some(upstream);
                Ok(())
            },
        )?;
        if freshness.rebuilt() {
            let stats = count(&self.grid);
            tracing::debug!(
                subdivision = self.grid.subdivision(),
                inside = stats.inside,
                outside = stats.outside,
                unknown = stats.unknown,
                "accelerator grid rebuilt"
            );
        }
        Ok(freshness)
    }

    /// `ensure_valid`, logging instead of propagating a failed rebuild.
    fn refresh(&mut self) -> bool {
        match self.ensure_valid() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "accelerator rebuild failed; falling back to exact test");
                false
            }
        }
    }

    /// Inside/outside via the grid; exact polygon test for `Unknown` cells.
    pub fn sample(&mut self, p: Vector2<f64>) -> Side {
        if self.refresh() {
            if let Some(side) = self.grid.at_point(p).side() {
                return side;
            }
        }
        self.fringe.polygon_mut().side(p)
    }

    /// Raw cached class of the cell holding `p`; `Unknown` if the grid could not be built.
    pub fn classify(&mut self, p: Vector2<f64>) -> CellClass {
        if self.refresh() {
            *self.grid.at_point(p)
        } else {
            CellClass::Unknown
        }
    }

    /// Current grid, rebuilt first if needed.
    pub fn grid(&mut self) -> &UniformGrid<CellClass> {
        self.refresh();
        &self.grid
    }

    /// Row-major `((x, y), class)` for every cell.
    pub fn cells(&mut self) -> impl Iterator<Item = ((usize, usize), CellClass)> + '_ {
        self.refresh();
        self.grid.iter_indexed().map(|(xy, c)| (xy, *c))
    }

    pub fn stats(&mut self) -> GridStats {
        self.refresh();
        count(&self.grid)
    }

    #[inline]
    pub fn closest_point(&mut self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        self.fringe.polygon_mut().closest_point(p)
    }
    #[inline]
    pub fn bounds(&mut self) -> Aabb2 {
        self.fringe.polygon_mut().bounds()
    }
}

fn count(grid: &UniformGrid<CellClass>) -> GridStats {
    grid.iter().fold(GridStats::default(), |mut s, c| {
        match c {
            CellClass::Inside => s.inside += 1,
            CellClass::Outside => s.outside += 1,
            CellClass::Unknown => s.unknown += 1,
        }
        s
    })
}
