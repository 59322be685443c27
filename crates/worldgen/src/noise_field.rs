//! Seeded 2D gradient noise with fractal octave summation.
//!
//! A `NoiseField` is fully determined by its seed: the seed drives an integer
//! linear-congruential shuffle of the 0..256 permutation table, which is then
//! doubled so lattice lookups never wrap.

const PERM_SIZE: usize = 256;

const LCG_MUL: u64 = 9301;
const LCG_INC: u64 = 49297;
const LCG_MOD: u64 = 233_280;

#[derive(Debug, Clone)]
pub struct NoiseField {
    seed: u32,
    perm: [u8; PERM_SIZE * 2],
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        let mut table = [0u8; PERM_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut state = seed as u64;
        for i in (1..PERM_SIZE).rev() {
            state = (state * LCG_MUL + LCG_INC) % LCG_MOD;
            let j = ((state as f64 / LCG_MOD as f64) * (i + 1) as f64).floor() as usize;
            table.swap(i, j.min(i));
        }

        let mut perm = [0u8; PERM_SIZE * 2];
        perm[..PERM_SIZE].copy_from_slice(&table);
        perm[PERM_SIZE..].copy_from_slice(&table);
        Self { seed, perm }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Single-octave noise in `[-1, 1]`. Integer lattice points sample to 0.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let x = x - xf;
        let y = y - yf;

        let u = fade(x);
        let v = fade(y);

        let a = self.p(xi) + yi;
        let aa = self.p(a);
        let ab = self.p(a + 1);
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b);
        let bb = self.p(b + 1);

        let value = lerp(
            v,
            lerp(u, grad(self.p(aa), x, y), grad(self.p(ba), x - 1.0, y)),
            lerp(
                u,
                grad(self.p(ab), x, y - 1.0),
                grad(self.p(bb), x - 1.0, y - 1.0),
            ),
        );
        value.clamp(-1.0, 1.0)
    }

    /// Fractal sum of `octaves` layers, normalized by the total amplitude.
    /// Zero octaves yields 0.
    pub fn octave_sample(
        &self,
        x: f64,
        y: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_value == 0.0 {
            0.0
        } else {
            total / max_value
        }
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: usize, x: f64, y: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        0.0
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_values() {
        let a = NoiseField::new(1234);
        let b = NoiseField::new(1234);
        for i in 0..200 {
            let x = i as f64 * 0.37;
            let y = i as f64 * 0.11 - 5.0;
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = NoiseField::new(1);
        let b = NoiseField::new(2);
        let differs = (0..200).any(|i| {
            let x = i as f64 * 0.37 + 0.5;
            let y = i as f64 * 0.23 + 0.5;
            a.sample(x, y) != b.sample(x, y)
        });
        assert!(differs);
    }

    #[test]
    fn test_permutation_is_a_permutation() {
        let noise = NoiseField::new(987_654);
        let mut seen = [false; PERM_SIZE];
        for &v in &noise.perm[..PERM_SIZE] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(noise.perm[..PERM_SIZE], noise.perm[PERM_SIZE..]);
    }

    #[test]
    fn test_lattice_points_are_zero() {
        let noise = NoiseField::new(77);
        for x in -5..5 {
            for y in -5..5 {
                assert_eq!(noise.sample(x as f64, y as f64), 0.0);
            }
        }
    }

    #[test]
    fn test_sample_in_unit_range() {
        let noise = NoiseField::new(42);
        for i in 0..100 {
            for j in 0..100 {
                let v = noise.sample(i as f64 * 0.173, j as f64 * 0.291);
                assert!((-1.0..=1.0).contains(&v), "sample {v} out of range");
            }
        }
    }

    #[test]
    fn test_octave_sample_in_unit_range() {
        let noise = NoiseField::new(42);
        for i in 0..50 {
            for j in 0..50 {
                let v = noise.octave_sample(i as f64 * 0.08, j as f64 * 0.08, 4, 0.5, 2.0);
                assert!((-1.0..=1.0).contains(&v), "octave sample {v} out of range");
            }
        }
    }

    #[test]
    fn test_zero_octaves_is_zero() {
        let noise = NoiseField::new(5);
        assert_eq!(noise.octave_sample(3.3, 4.4, 0, 0.5, 2.0), 0.0);
    }

    #[test]
    fn test_negative_coordinates_wrap() {
        let noise = NoiseField::new(9);
        let v = noise.sample(-300.25, -12.75);
        assert!(v.is_finite());
        assert!((-1.0..=1.0).contains(&v));
    }
}
