//! Seeded multi-octave gradient noise for synthetic terrain and fuel
//!
//! Fractal Brownian motion over 2D Perlin-style gradient noise. The
//! permutation table is shuffled with a `ChaCha8Rng` seeded from the caller's
//! seed, so a given seed always yields the same field on every platform.
//!
//! # References
//! - Perlin, K. (2002). Improving noise. ACM Transactions on Graphics, 21(3), 681-682.
//! - Finney, M.A. (2003). Calculation of fire spread rates across random landscapes.
//!   International Journal of Wildland Fire, 12(2), 167-174.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::FRAC_1_SQRT_2;

const PERM_SIZE: usize = 256;

const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (0.0, 1.0),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-1.0, 0.0),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// One frequency band
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseOctave {
    /// Spatial frequency (1/m)
    pub frequency: f64,
    /// Weight of this band
    pub amplitude: f64,
}

impl NoiseOctave {
    /// Create an octave
    #[must_use]
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Deterministic fractal noise source
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    octaves: Vec<NoiseOctave>,
    perm: Vec<u8>,
}

impl NoiseGenerator {
    /// Four halving octaves whose largest features span `feature_size` metres
    #[must_use]
    pub fn new(seed: u64, feature_size: f64) -> Self {
        let base = 1.0 / feature_size.max(f64::EPSILON);
        let octaves = (0..4)
            .map(|i| {
                let scale = f64::from(1u32 << i);
                NoiseOctave::new(base * scale, 0.5 / scale)
            })
            .collect();
        Self::with_octaves(seed, octaves)
    }

    /// Custom octave set
    #[must_use]
    pub fn with_octaves(seed: u64, octaves: Vec<NoiseOctave>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng);

        let mut perm = Vec::with_capacity(PERM_SIZE * 2);
        perm.extend_from_slice(&table);
        perm.extend_from_slice(&table);
        Self { octaves, perm }
    }

    /// Noise at world position `(x, y)` in metres, in `[-1, 1]`
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let (total, weight) = self
            .octaves
            .iter()
            .fold((0.0, 0.0), |(total, weight), o| {
                (
                    total + self.gradient_noise(x * o.frequency, y * o.frequency) * o.amplitude,
                    weight + o.amplitude,
                )
            });
        if weight > 0.0 {
            (total / weight).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Row-major field over a `rows x cols` grid of `cell_size` cells
    #[must_use]
    pub fn field(&self, rows: usize, cols: usize, cell_size: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                out.push(self.sample(col as f64 * cell_size, row as f64 * cell_size));
            }
        }
        out
    }

    fn gradient_noise(&self, x: f64, y: f64) -> f64 {
        let (xf, yf) = (x.floor(), y.floor());
        let (x0, y0) = (xf as i64, yf as i64);
        let (fx, fy) = (x - xf, y - yf);

        let n00 = self.corner(x0, y0, fx, fy);
        let n10 = self.corner(x0 + 1, y0, fx - 1.0, fy);
        let n01 = self.corner(x0, y0 + 1, fx, fy - 1.0);
        let n11 = self.corner(x0 + 1, y0 + 1, fx - 1.0, fy - 1.0);

        let (sx, sy) = (fade(fx), fade(fy));
        lerp(lerp(n00, n10, sx), lerp(n01, n11, sx), sy)
    }

    fn corner(&self, ix: i64, iy: i64, dx: f64, dy: f64) -> f64 {
        let px = (ix & 0xFF) as usize;
        let py = (iy & 0xFF) as usize;
        let hash = self.perm[usize::from(self.perm[px]) + py] as usize & 0x07;
        let (gx, gy) = GRADIENTS[hash];
        gx * dx + gy * dy
    }
}

/// `6t^5 - 15t^4 + 10t^3`
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_range() {
        let gen = NoiseGenerator::new(12345, 200.0);
        for i in 0..1000 {
            let v = gen.sample(f64::from(i) * 7.3, f64::from(i) * 11.7);
            assert!((-1.0..=1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = NoiseGenerator::new(99, 100.0).field(16, 16, 10.0);
        let b = NoiseGenerator::new(99, 100.0).field(16, 16, 10.0);
        assert_eq!(a, b);

        let c = NoiseGenerator::new(100, 100.0).field(16, 16, 10.0);
        assert_ne!(a, c);
    }

    #[test]
    fn lattice_points_are_zero() {
        // Gradient noise vanishes on integer lattice points
        let gen = NoiseGenerator::with_octaves(1, vec![NoiseOctave::new(1.0, 1.0)]);
        assert_eq!(gen.sample(3.0, 5.0), 0.0);
    }

    #[test]
    fn field_is_row_major() {
        let gen = NoiseGenerator::new(5, 50.0);
        let field = gen.field(3, 4, 10.0);
        assert_eq!(field.len(), 12);
        assert_eq!(field[4 + 2], gen.sample(20.0, 10.0));
    }

    #[test]
    fn no_octaves_is_flat() {
        let gen = NoiseGenerator::with_octaves(1, Vec::new());
        assert_eq!(gen.sample(12.3, 4.5), 0.0);
    }
}
