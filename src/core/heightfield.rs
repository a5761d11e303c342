use parking_lot::Mutex;

/// Square grid of height samples, stored x-major (`samples[x * resolution + z]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Heightfield {
    resolution: usize,
    samples: Vec<f32>,
}

impl Heightfield {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            samples: vec![0.0; resolution * resolution],
        }
    }

    /// Reuse an existing buffer, resizing and zeroing it for `resolution`.
    pub fn from_buffer(mut buffer: Vec<f32>, resolution: usize) -> Self {
        buffer.clear();
        buffer.resize(resolution * resolution, 0.0);
        Self {
            resolution,
            samples: buffer,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_buffer(self) -> Vec<f32> {
        self.samples
    }

    #[inline]
    fn index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x < self.resolution && z < self.resolution);
        x * self.resolution + z
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.samples[self.index(x, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, z: usize, value: f32) {
        let idx = self.index(x, z);
        self.samples[idx] = value;
    }

    /// Bounds-checked read; `None` outside the grid.
    pub fn sample(&self, x: i32, z: i32) -> Option<f32> {
        let res = self.resolution as i32;
        if x >= 0 && x < res && z >= 0 && z < res {
            Some(self.get(x as usize, z as usize))
        } else {
            None
        }
    }

    /// Mean of the four edge neighbours. Only valid for interior cells.
    #[inline]
    pub fn neighbour_average(&self, x: usize, z: usize) -> f32 {
        (self.get(x - 1, z) + self.get(x + 1, z) + self.get(x, z - 1) + self.get(x, z + 1)) / 4.0
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }

    /// True for cells on row/column 0 or `resolution - 1`.
    pub fn is_border(&self, x: usize, z: usize) -> bool {
        x == 0 || z == 0 || x + 1 == self.resolution || z + 1 == self.resolution
    }
}

/// Bounded free list of heightfield buffers returned by evicted chunks.
pub struct HeightfieldPool {
    buffers: Mutex<Vec<Vec<f32>>>,
    capacity: usize,
}

impl HeightfieldPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn acquire(&self, resolution: usize) -> Heightfield {
        match self.buffers.lock().pop() {
            Some(buffer) => Heightfield::from_buffer(buffer, resolution),
            None => Heightfield::new(resolution),
        }
    }

    /// Return a buffer to the pool; dropped once the pool is full.
    pub fn release(&self, heightfield: Heightfield) {
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.capacity {
            buffers.push(heightfield.into_buffer());
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_bounds_checked() {
        let mut field = Heightfield::new(3);
        field.set(2, 1, 0.75);
        assert_eq!(field.sample(2, 1), Some(0.75));
        assert_eq!(field.sample(3, 0), None);
        assert_eq!(field.sample(-1, 0), None);
    }

    #[test]
    fn neighbour_average_uses_four_edge_neighbours() {
        let mut field = Heightfield::new(3);
        field.set(0, 1, 1.0);
        field.set(2, 1, 2.0);
        field.set(1, 0, 3.0);
        field.set(1, 2, 4.0);
        field.set(0, 0, 100.0);
        assert_eq!(field.neighbour_average(1, 1), 2.5);
    }

    #[test]
    fn pool_recycles_and_zeroes_buffers() {
        let pool = HeightfieldPool::new(1);
        let mut field = pool.acquire(4);
        field.set(1, 1, 9.0);
        pool.release(field);
        pool.release(Heightfield::new(4));
        assert_eq!(pool.len(), 1);

        let reused = pool.acquire(5);
        assert_eq!(reused.resolution(), 5);
        assert!(reused.samples().iter().all(|&h| h == 0.0));
        assert!(pool.is_empty());
    }
}
