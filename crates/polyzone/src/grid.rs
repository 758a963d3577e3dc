//! Dense square grid of cells over an axis-aligned region.
//!
//! Cell `(x, y)` covers `[origin + (x, y) * cell_size, origin + (x + 1, y + 1) * cell_size)`.
//! Storage is row-major with `x` varying fastest. The same subdivision is used on
//! both axes; `cell_size` may differ per axis.
//!
//! Point lookups quantize with `floor((p - origin) / cell_size)` and then apply
//! the grid's `WrapMode`. Quantization saturates (NaN → 0, ±∞ → extreme index),
//! so no input can address a cell outside the array.

use nalgebra::Vector2;

use crate::error::GeomError;
use crate::geom2::Aabb2;

/// Out-of-range index policy. Fixed per grid, not per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Saturate to `[0, subdivision)`: points off the grid read the nearest border cell.
    #[default]
    Clamp,
    /// Index modulo subdivision (always non-negative). Tiles the grid over the plane.
    Repeat,
}

#[derive(Clone, Debug)]
pub struct UniformGrid<T> {
    origin: Vector2<f64>,
    cell_size: Vector2<f64>,
    subdivision: usize,
    wrap: WrapMode,
    cells: Vec<T>,
}

fn check_subdivision(n: usize) -> Result<usize, GeomError> {
    if n == 0 {
        return Err(GeomError::invalid("grid subdivision must be >= 1"));
    }
    n.checked_mul(n)
        .map(|_| n)
        .ok_or_else(|| GeomError::invalid(format!("grid subdivision {n} overflows cell count")))
}

impl<T: Clone> UniformGrid<T> {
    /// Unit cells at the origin, `Clamp` wrapping, every cell set to `fill`.
    pub fn new(subdivision: usize, fill: T) -> Result<Self, GeomError> {
        let n = check_subdivision(subdivision)?;
        Ok(Self {
            origin: Vector2::zeros(),
            cell_size: Vector2::new(1.0, 1.0),
            subdivision: n,
            wrap: WrapMode::Clamp,
            cells: vec![fill; n * n],
        })
    }

    /// Reset the quantization mapping and every cell.
    pub fn init(
        &mut self,
        origin: Vector2<f64>,
        cell_size: Vector2<f64>,
        wrap: WrapMode,
        fill: T,
    ) -> Result<(), GeomError> {
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Err(GeomError::degenerate(format!("grid origin {origin:?} is not finite")));
        }
        if !(cell_size.x.is_finite() && cell_size.y.is_finite())
            || cell_size.x <= 0.0
            || cell_size.y <= 0.0
        {
            return Err(GeomError::degenerate(format!(
                "grid cell size {cell_size:?} must be finite and > 0"
            )));
        }
        self.origin = origin;
        self.cell_size = cell_size;
        self.wrap = wrap;
        self.cells.iter_mut().for_each(|c| *c = fill.clone());
        Ok(())
    }
}

impl<T: Clone + Default> UniformGrid<T> {
    /// Resize to `n × n` and clear every cell to `T::default()`.
    pub fn set_subdivision(&mut self, n: usize) -> Result<(), GeomError> {
        let n = check_subdivision(n)?;
        self.subdivision = n;
        self.cells.clear();
        self.cells.resize(n * n, T::default());
        Ok(())
    }
}

impl<T> UniformGrid<T> {
    #[inline]
    pub fn subdivision(&self) -> usize {
        self.subdivision
    }
    #[inline]
    pub fn origin(&self) -> Vector2<f64> {
        self.origin
    }
    #[inline]
    pub fn cell_size(&self) -> Vector2<f64> {
        self.cell_size
    }
    #[inline]
    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }
    #[inline]
    pub fn set_wrap(&mut self, wrap: WrapMode) {
        self.wrap = wrap;
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Region covered by the whole grid.
    pub fn area(&self) -> Aabb2 {
        let n = self.subdivision as f64;
        Aabb2::from_min_max(self.origin, self.origin + self.cell_size * n)
    }

    /// Unwrapped cell coordinates of `p`. `as` casts saturate and map NaN to 0.
    #[inline]
    pub fn quantize(&self, p: Vector2<f64>) -> (i64, i64) {
        let q = (p - self.origin).component_div(&self.cell_size);
        (q.x.floor() as i64, q.y.floor() as i64)
    }

    /// Apply the wrap policy; the result is always in range.
    #[inline]
    pub fn wrap_index(&self, x: i64, y: i64) -> (usize, usize) {
        let n = self.subdivision as i64;
        match self.wrap {
            WrapMode::Clamp => (x.clamp(0, n - 1) as usize, y.clamp(0, n - 1) as usize),
            WrapMode::Repeat => (x.rem_euclid(n) as usize, y.rem_euclid(n) as usize),
        }
    }

    #[inline]
    pub fn linear_index(&self, x: usize, y: usize) -> usize {
        y * self.subdivision + x
    }

    #[inline]
    fn in_range(&self, x: usize, y: usize) -> bool {
        x < self.subdivision && y < self.subdivision
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if !self.in_range(x, y) {
            return None;
        }
        self.cells.get(self.linear_index(x, y))
    }
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if !self.in_range(x, y) {
            return None;
        }
        let i = self.linear_index(x, y);
        self.cells.get_mut(i)
    }

    /// Cell coordinates holding `p` after wrapping.
    #[inline]
    pub fn index_of(&self, p: Vector2<f64>) -> (usize, usize) {
        let (x, y) = self.quantize(p);
        self.wrap_index(x, y)
    }
    #[inline]
    pub fn at_point(&self, p: Vector2<f64>) -> &T {
        let (x, y) = self.index_of(p);
        &self.cells[self.linear_index(x, y)]
    }
    #[inline]
    pub fn at_point_mut(&mut self, p: Vector2<f64>) -> &mut T {
        let (x, y) = self.index_of(p);
        let i = self.linear_index(x, y);
        &mut self.cells[i]
    }

    /// Rectangle covered by cell `(x, y)`; indices need not be in range.
    pub fn cell_area(&self, x: usize, y: usize) -> Aabb2 {
        let lo = self.origin + self.cell_size.component_mul(&Vector2::new(x as f64, y as f64));
        let hi = self.origin
            + self
                .cell_size
                .component_mul(&Vector2::new((x + 1) as f64, (y + 1) as f64));
        Aabb2::from_min_max(lo, hi)
    }

    /// Row-major: `x` varies fastest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.cells.iter()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.cells.iter_mut()
    }
    pub fn iter_indexed(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let n = self.subdivision;
        self.cells.iter().enumerate().map(move |(i, c)| ((i % n, i / n), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn unit_grid(n: usize, wrap: WrapMode) -> UniformGrid<u32> {
        let mut g = UniformGrid::new(n, 0).unwrap();
        g.init(Vector2::zeros(), vector![1.0, 1.0], wrap, 0).unwrap();
        g
    }

    #[test]
    fn rejects_zero_subdivision_and_bad_cells() {
        assert!(UniformGrid::new(0, 0u8).is_err());
        let mut g = UniformGrid::new(2, 0u8).unwrap();
        assert!(g.set_subdivision(0).is_err());
        assert!(g
            .init(Vector2::zeros(), vector![0.0, 1.0], WrapMode::Clamp, 0)
            .is_err());
        assert!(g
            .init(Vector2::zeros(), vector![1.0, f64::NAN], WrapMode::Clamp, 0)
            .is_err());
        assert!(g
            .init(vector![f64::INFINITY, 0.0], vector![1.0, 1.0], WrapMode::Clamp, 0)
            .is_err());
        assert_eq!(g.subdivision(), 2);
    }

    #[test]
    fn clamp_saturates_out_of_range_points() {
        let g = unit_grid(4, WrapMode::Clamp);
        assert_eq!(g.index_of(vector![-3.0, 1.5]), (0, 1));
        assert_eq!(g.index_of(vector![9.0, 9.0]), (3, 3));
        assert_eq!(g.index_of(vector![f64::NAN, f64::INFINITY]), (0, 3));
        assert_eq!(g.index_of(vector![f64::NEG_INFINITY, 1e300]), (0, 3));
    }

    #[test]
    fn repeat_wraps_non_negative() {
        let g = unit_grid(4, WrapMode::Repeat);
        assert_eq!(g.index_of(vector![-1.0, 5.5]), (3, 1));
        assert_eq!(g.index_of(vector![-4.0, -0.5]), (0, 3));
        let (x, y) = g.index_of(vector![f64::INFINITY, f64::NEG_INFINITY]);
        assert!(x < 4 && y < 4);
    }

    #[test]
    fn quantize_is_floor_relative_to_origin() {
        let mut g = UniformGrid::new(3, 0u8).unwrap();
        g.init(vector![-1.0, 2.0], vector![0.5, 2.0], WrapMode::Clamp, 0)
            .unwrap();
        assert_eq!(g.quantize(vector![-1.0, 2.0]), (0, 0));
        assert_eq!(g.quantize(vector![-0.51, 5.99]), (0, 1));
        assert_eq!(g.quantize(vector![-1.01, 1.0]), (-1, -1));
        let a = g.cell_area(1, 2);
        assert_eq!(a.min, vector![-0.5, 6.0]);
        assert_eq!(a.max, vector![0.0, 8.0]);
        assert_eq!(g.area().max, vector![0.5, 8.0]);
    }

    #[test]
    fn row_major_with_x_fastest() {
        let mut g = unit_grid(3, WrapMode::Clamp);
        *g.get_mut(2, 0).unwrap() = 7;
        *g.at_point_mut(vector![0.5, 1.5]) = 9;
        let flat: Vec<u32> = g.iter().copied().collect();
        assert_eq!(flat, vec![0, 0, 7, 9, 0, 0, 0, 0, 0]);
        let idx: Vec<(usize, usize)> = g.iter_indexed().map(|(xy, _)| xy).collect();
        assert_eq!(&idx[..4], &[(0, 0), (1, 0), (2, 0), (0, 1)]);
        assert_eq!(g.linear_index(2, 1), 5);
        assert!(g.get(3, 0).is_none());
        assert_eq!(*g.at_point(vector![2.5, -4.0]), 7);
    }

    #[test]
    fn set_subdivision_resizes_and_clears() {
        let mut g = unit_grid(2, WrapMode::Clamp);
        g.iter_mut().for_each(|c| *c = 5);
        g.set_subdivision(5).unwrap();
        assert_eq!(g.len(), 25);
        assert!(g.iter().all(|&c| c == 0));
    }
}
