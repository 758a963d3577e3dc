//! Seeded random sources: star-shaped polygons and query points.
//!
//! Model
//! - Start from `n` equally spaced angles on [0, 2π), add bounded angular and
//!   radial jitter, keep the angle order. The ring is simple and star-shaped
//!   around the origin but generally concave.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.
//!   There is no shared generator; every sampler owns its `StdRng`.
//!
//! Code cross-refs: `types::Aabb2`, `crate::polygon::Polygon`

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::Aabb2;

/// Vertex count distribution.
#[derive(Clone, Copy, Debug)]
pub enum VertexCount {
    Fixed(usize),
    Uniform { min: usize, max: usize },
}
impl VertexCount {
    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        match *self {
            VertexCount::Fixed(n) => n.max(3),
            VertexCount::Uniform { min, max } => {
                let lo = min.max(3);
                let hi = max.max(lo);
                rng.gen_range(lo..=hi)
            }
        }
    }
}

/// Radial-jitter sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct RadialCfg {
    pub vertex_count: VertexCount,
    /// Angular jitter as a fraction of the base spacing Δ=2π/n. Clamped to [0, 0.49].
    pub angle_jitter_frac: f64,
    /// Radii = `base_radius * (1 + u)`, with `u∈[-radial_jitter, radial_jitter]`.
    /// Values near 1 give deep concavities.
    pub radial_jitter: f64,
    pub base_radius: f64,
    /// Random global phase in [0, 2π)?
    pub random_phase: bool,
}
impl Default for RadialCfg {
    fn default() -> Self {
        Self {
            vertex_count: VertexCount::Fixed(12),
            angle_jitter_frac: 0.3,
            radial_jitter: 0.5,
            base_radius: 1.0,
            random_phase: true,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}
impl ReplayToken {
    #[inline]
    pub fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing, cheap and stable.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Draw a CCW star-shaped polygon ring around the origin.
pub fn draw_star_polygon(cfg: RadialCfg, tok: ReplayToken) -> Vec<Vector2<f64>> {
    let mut rng = tok.to_std_rng();
    let n = cfg.vertex_count.sample(&mut rng);
    // Every angular gap must stay below π so the origin is in the kernel (CCW ring).
    let aj_max = if n == 3 { 0.24 } else { 0.49 };
    let aj = cfg.angle_jitter_frac.clamp(0.0, aj_max);
    let rj = cfg.radial_jitter.clamp(0.0, 0.95);
    let r0 = cfg.base_radius.max(1e-9);
    let delta = std::f64::consts::TAU / (n as f64);
    let phase = if cfg.random_phase {
        rng.gen::<f64>() * std::f64::consts::TAU
    } else {
        0.0
    };
    // Jitter < Δ/2 keeps the angles strictly increasing, so no sort is needed.
    (0..n)
        .map(|k| {
            let th = phase + (k as f64) * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let u = (rng.gen::<f64>() * 2.0 - 1.0) * rj;
            let r = (1.0 + u) * r0;
            Vector2::new(th.cos() * r, th.sin() * r)
        })
        .collect()
}

/// Uniform query points inside boxes, from an owned seeded generator.
#[derive(Clone, Debug)]
pub struct PointSampler {
    rng: StdRng,
}

impl PointSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
    pub fn from_token(tok: ReplayToken) -> Self {
        Self {
            rng: tok.to_std_rng(),
        }
    }
    /// Uniform point in the closed box; returns `bounds.min` for an empty or flat box.
    pub fn sample_in(&mut self, bounds: &Aabb2) -> Vector2<f64> {
        if bounds.is_empty() {
            return bounds.min;
        }
        let u: f64 = self.rng.gen();
        let v: f64 = self.rng.gen();
        bounds.min + bounds.size().component_mul(&Vector2::new(u, v))
    }
    pub fn sample_many(&mut self, bounds: &Aabb2, n: usize) -> Vec<Vector2<f64>> {
        (0..n).map(|_| self.sample_in(bounds)).collect()
    }
    /// Uniform on `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.gen()
    }
    /// Uniform index below `n`; `None` when `n == 0`.
    pub fn index(&mut self, n: usize) -> Option<usize> {
        (n > 0).then(|| self.rng.gen_range(0..n))
    }
}
