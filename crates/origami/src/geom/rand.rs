//! Random convex polygons (radial jitter + replay tokens).
//!
//! Purpose
//! - Deterministic sampler for convex paper shapes used by property tests and
//!   benches. Draws are reproducible from a `(seed, index)` replay token.
//!
//! Model
//! - Start from `n` equally spaced angles, add bounded angular and radial
//!   jitter, then take the convex hull (counterclockwise).

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::perp_dot;

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
    /// Angular jitter as a fraction of the base spacing. Clamped to [0, 0.49].
    pub angle_jitter_frac: f64,
    /// Relative radial jitter: radii are `base_radius * (1 + u)`, `|u| <= radial_jitter`.
    pub radial_jitter: f64,
    pub base_radius: f64,
}

impl Default for RadialCfg {
    fn default() -> Self {
        Self {
            vertex_count: VertexCount::Uniform { min: 3, max: 10 },
            angle_jitter_frac: 0.3,
            radial_jitter: 0.2,
            base_radius: 1.0,
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
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        StdRng::seed_from_u64(mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15))))
    }
}

/// Draw a convex polygon in counterclockwise order (at least 3 vertices).
pub fn draw_convex_polygon(cfg: RadialCfg, tok: ReplayToken) -> Vec<Vector2<f64>> {
    let mut rng = tok.to_std_rng();
    let n = cfg.vertex_count.sample(&mut rng);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.49);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let r0 = cfg.base_radius.max(1e-3);
    let delta = std::f64::consts::TAU / n as f64;
    let pts: Vec<Vector2<f64>> = (0..n)
        .map(|k| {
            let theta = k as f64 * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let r = r0 * (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj);
            Vector2::new(r * theta.cos(), r * theta.sin())
        })
        .collect();
    let hull = convex_hull(&pts);
    if hull.len() >= 3 {
        hull
    } else {
        // Jitter collapsed the sample; fall back to the regular polygon.
        (0..n)
            .map(|k| {
                let theta = k as f64 * delta;
                Vector2::new(r0 * theta.cos(), r0 * theta.sin())
            })
            .collect()
    }
}

/// Andrew's monotone chain (counterclockwise, collinear points dropped).
pub fn convex_hull(points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (*a - *b).norm() < 1e-12);
    if pts.len() < 3 {
        return pts;
    }
    let turn = |o: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>| perp_dot(a - o, b - o);
    let mut lower: Vec<Vector2<f64>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Vector2<f64>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
