//! Coarse height lattice with stamped mountain massifs.
//!
//! The lattice has a fixed resolution independent of the map size. Tiles
//! sample it bilinearly, so one lattice cell spans many tiles on large maps.
//! The lattice is only needed while the tile grid is populated and is dropped
//! afterwards.

use crate::config::TerrainParams;
use crate::noise_field::NoiseField;
use crate::rng::WorldRng;

/// One mountain stamp, in lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mountain {
    pub x: i32,
    pub z: i32,
    pub height: f64,
    pub radius: i32,
}

#[derive(Debug, Clone)]
pub struct HeightLattice {
    size: usize,
    values: Vec<f64>,
}

impl HeightLattice {
    /// Base fBm lattice with no mountains. Values lie in `[-1, 1]`.
    pub fn from_noise(params: &TerrainParams, base: &NoiseField) -> Self {
        let size = params.lattice_size;
        let mut values = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                values.push(base.octave_sample(
                    x as f64 * params.lattice_scale,
                    z as f64 * params.lattice_scale,
                    params.lattice_octaves,
                    params.persistence,
                    params.lacunarity,
                ));
            }
        }
        Self { size, values }
    }

    /// Flat lattice, mostly for tests.
    pub fn flat(size: usize, value: f64) -> Self {
        Self {
            size,
            values: vec![value; size * size],
        }
    }

    /// Full synthesis: base noise, then a random number of mountain stamps.
    /// Returns the lattice and the mountains that were stamped.
    pub fn synthesize(
        params: &TerrainParams,
        base: &NoiseField,
        shape: &NoiseField,
        rng: &mut WorldRng,
    ) -> (Self, Vec<Mountain>) {
        let mut lattice = Self::from_noise(params, base);
        let count = rng.in_bounds_u32(&params.mountain_count);
        let mut mountains = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mountain = Mountain {
                x: rng.index(lattice.size) as i32,
                z: rng.index(lattice.size) as i32,
                height: rng.in_bounds_f64(&params.mountain_height),
                radius: rng.in_bounds_f64(&params.mountain_radius).floor() as i32,
            };
            lattice.stamp_mountain(&mountain, params, shape);
            mountains.push(mountain);
        }
        (lattice, mountains)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f64 {
        self.values[z * self.size + x]
    }

    #[inline]
    fn set(&mut self, x: usize, z: usize, value: f64) {
        self.values[z * self.size + x] = value;
    }

    /// Raise cells around `mountain`. The footprint is a circle whose radius is
    /// modulated per cell by `shape` noise; heights fall off as
    /// `(1 - d/r)^steepness` plus a ridge term. Cells are only overwritten when
    /// the new value beats the old one by the configured margin, so stamps
    /// never lower terrain.
    pub fn stamp_mountain(&mut self, mountain: &Mountain, params: &TerrainParams, shape: &NoiseField) {
        let r = mountain.radius;
        for oz in -r..=r {
            for ox in -r..=r {
                let nx = mountain.x + ox;
                let nz = mountain.z + oz;
                if nx < 0 || nz < 0 || nx as usize >= self.size || nz as usize >= self.size {
                    continue;
                }
                let dist = ((ox * ox + oz * oz) as f64).sqrt();
                let shape_n = shape.sample(
                    nx as f64 * params.shape_noise_scale,
                    nz as f64 * params.shape_noise_scale,
                ) * 0.5
                    + 0.5;
                let effective = r as f64 * (0.6 + shape_n * 0.4);
                if effective <= 0.0 || dist > effective {
                    continue;
                }

                let falloff = (1.0 - dist / effective).powf(params.mountain_steepness);
                let ridge = shape.sample(
                    nx as f64 * params.ridge_noise_scale,
                    nz as f64 * params.ridge_noise_scale,
                ) * params.ridge_amplitude;
                let value = mountain.height * (falloff + ridge);

                let (ux, uz) = (nx as usize, nz as usize);
                if value > self.get(ux, uz) + params.mountain_raise_margin {
                    self.set(ux, uz, value);
                }
            }
        }
    }

    /// Bilinear sample for tile `(x, z)` on a `width x height` map. Tile 0 maps
    /// to lattice 0 and the far edge approaches lattice `size - 1`.
    pub fn sample_tile(&self, x: i32, z: i32, width: usize, height: usize) -> f64 {
        let last = (self.size - 1) as f64;
        let map_x = x as f64 / width as f64 * last;
        let map_z = z as f64 / height as f64 * last;
        self.sample(map_x, map_z)
    }

    /// Bilinear interpolation at fractional lattice coordinates, clamped to
    /// the lattice edge.
    pub fn sample(&self, map_x: f64, map_z: f64) -> f64 {
        let max = self.size - 1;
        let map_x = map_x.clamp(0.0, max as f64);
        let map_z = map_z.clamp(0.0, max as f64);
        let x0 = map_x.floor() as usize;
        let z0 = map_z.floor() as usize;
        let x1 = (x0 + 1).min(max);
        let z1 = (z0 + 1).min(max);
        let fx = map_x - x0 as f64;
        let fz = map_z - z0 as f64;

        let h0 = self.get(x0, z0) * (1.0 - fx) + self.get(x1, z0) * fx;
        let h1 = self.get(x0, z1) * (1.0 - fx) + self.get(x1, z1) * fx;
        h0 * (1.0 - fz) + h1 * fz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TerrainParams {
        TerrainParams::default()
    }

    #[test]
    fn test_lattice_size_is_fixed() {
        let lattice = HeightLattice::from_noise(&params(), &NoiseField::new(1));
        assert_eq!(lattice.size(), 128);
    }

    #[test]
    fn test_base_lattice_bounded() {
        let lattice = HeightLattice::from_noise(&params(), &NoiseField::new(3));
        for z in 0..lattice.size() {
            for x in 0..lattice.size() {
                let v = lattice.get(x, z);
                assert!((-1.0..=1.0).contains(&v), "lattice value {v} out of range");
            }
        }
    }

    #[test]
    fn test_mountain_raises_peak() {
        let p = params();
        let mut lattice = HeightLattice::flat(128, 0.0);
        let mountain = Mountain {
            x: 64,
            z: 64,
            height: 5.0,
            radius: 15,
        };
        lattice.stamp_mountain(&mountain, &p, &NoiseField::new(11));
        // Centre: falloff 1, ridge term bounded by 0.3.
        let peak = lattice.get(64, 64);
        assert!(peak >= 5.0 * 0.7 && peak <= 5.0 * 1.3, "peak = {peak}");
        // Far outside the radius nothing changes.
        assert_eq!(lattice.get(0, 0), 0.0);
        assert_eq!(lattice.get(100, 64), 0.0);
    }

    #[test]
    fn test_mountain_never_lowers_terrain() {
        let p = params();
        let mut lattice = HeightLattice::flat(128, 10.0);
        let mountain = Mountain {
            x: 20,
            z: 20,
            height: 5.5,
            radius: 19,
        };
        lattice.stamp_mountain(&mountain, &p, &NoiseField::new(2));
        for z in 0..128 {
            for x in 0..128 {
                assert_eq!(lattice.get(x, z), 10.0);
            }
        }
    }

    #[test]
    fn test_mountain_at_corner_clips() {
        let p = params();
        let mut lattice = HeightLattice::flat(128, 0.0);
        let mountain = Mountain {
            x: 0,
            z: 127,
            height: 4.0,
            radius: 12,
        };
        lattice.stamp_mountain(&mountain, &p, &NoiseField::new(8));
        assert!(lattice.get(0, 127) > 1.0);
    }

    #[test]
    fn test_bilinear_sample_interpolates() {
        let mut lattice = HeightLattice::flat(2, 0.0);
        lattice.set(1, 0, 1.0);
        lattice.set(1, 1, 1.0);
        assert!((lattice.sample(0.5, 0.5) - 0.5).abs() < 1e-12);
        assert!((lattice.sample(0.25, 0.9) - 0.25).abs() < 1e-12);
        assert_eq!(lattice.sample(1.0, 1.0), 1.0);
        assert_eq!(lattice.sample(5.0, -2.0), 1.0);
    }

    #[test]
    fn test_sample_tile_maps_origin_to_lattice_origin() {
        let mut lattice = HeightLattice::flat(128, 0.0);
        lattice.set(0, 0, 2.0);
        assert_eq!(lattice.sample_tile(0, 0, 1024, 1024), 2.0);
    }

    #[test]
    fn test_synthesize_deterministic() {
        let p = params();
        let run = |seed| {
            let mut rng = WorldRng::from_seed_u64(seed);
            HeightLattice::synthesize(&p, &NoiseField::new(1), &NoiseField::new(2), &mut rng)
        };
        let (a, ma) = run(5);
        let (b, mb) = run(5);
        assert_eq!(ma, mb);
        assert_eq!(a.values, b.values);
        assert!((8..=16).contains(&ma.len()));
        for m in &ma {
            assert!((10..=20).contains(&m.radius));
            assert!((3.0..=5.5).contains(&m.height));
        }
    }
}
