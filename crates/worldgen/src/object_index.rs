use crate::objects::TileObject;

/// Uniform bucket grid over object indices, built once after generation.
/// Objects are bucketed by the tile they stand on.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    bucket_size: usize,
    buckets_x: usize,
    buckets_z: usize,
    buckets: Vec<Vec<u32>>,
}

impl ObjectIndex {
    pub fn build(objects: &[TileObject], width: usize, height: usize, bucket_size: usize) -> Self {
        let bucket_size = bucket_size.max(1);
        let buckets_x = width.div_ceil(bucket_size).max(1);
        let buckets_z = height.div_ceil(bucket_size).max(1);
        let mut index = Self {
            bucket_size,
            buckets_x,
            buckets_z,
            buckets: (0..buckets_x * buckets_z).map(|_| Vec::new()).collect(),
        };
        for (i, object) in objects.iter().enumerate() {
            let (x, z) = object.tile();
            if let Some(b) = index.bucket_of(x, z) {
                index.buckets[b].push(i as u32);
            }
        }
        index
    }

    #[inline]
    fn bucket_coord(&self, v: i32) -> i32 {
        v.div_euclid(self.bucket_size as i32)
    }

    #[inline]
    fn flat_index(&self, bx: i32, bz: i32) -> Option<usize> {
        if bx >= 0 && bz >= 0 && (bx as usize) < self.buckets_x && (bz as usize) < self.buckets_z {
            Some(bz as usize * self.buckets_x + bx as usize)
        } else {
            None
        }
    }

    fn bucket_of(&self, x: i32, z: i32) -> Option<usize> {
        self.flat_index(self.bucket_coord(x), self.bucket_coord(z))
    }

    /// Candidate object indices for the inclusive tile rectangle, ascending.
    /// Candidates may lie outside the rectangle; callers filter.
    pub fn query_rect_into(&self, min_x: i32, min_z: i32, max_x: i32, max_z: i32, out: &mut Vec<u32>) {
        out.clear();
        let (min_bx, max_bx) = (self.bucket_coord(min_x), self.bucket_coord(max_x));
        let (min_bz, max_bz) = (self.bucket_coord(min_z), self.bucket_coord(max_z));
        for bz in min_bz..=max_bz {
            for bx in min_bx..=max_bx {
                if let Some(idx) = self.flat_index(bx, bz) {
                    out.extend_from_slice(&self.buckets[idx]);
                }
            }
        }
        out.sort_unstable();
    }

    pub fn query_rect(&self, min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Vec<u32> {
        let mut out = Vec::new();
        self.query_rect_into(min_x, min_z, max_x, max_z, &mut out);
        out
    }

    pub fn object_count(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}
