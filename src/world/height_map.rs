/// Highest light-blocking block per column.
///
/// Values are stored relative to the lowest block of the chunk (as both
/// editions serialise them): `0` means the column is empty, otherwise the
/// value is `top_y + 1 - min_y`. Re-basing with [`HeightMap::offset`] keeps the
/// observable world Y unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    min_chunk_y: i8,
    values: [u16; 256],
}

impl HeightMap {
    pub fn new(min_chunk_y: i8) -> Self {
        Self {
            min_chunk_y,
            values: [0; 256],
        }
    }

    pub fn min_chunk_y(&self) -> i8 {
        self.min_chunk_y
    }

    fn min_y(&self) -> i32 {
        i32::from(self.min_chunk_y) * 16
    }

    /// World Y of the top block in column `(x, z)`, if any.
    pub fn get(&self, x: usize, z: usize) -> Option<i32> {
        match self.values[z * 16 + x] {
            0 => None,
            v => Some(i32::from(v) - 1 + self.min_y()),
        }
    }

    /// Records `world_y` as the top block of column `(x, z)`.
    pub fn set(&mut self, x: usize, z: usize, world_y: i32) {
        let relative = (world_y + 1 - self.min_y()).clamp(0, i32::from(u16::MAX));
        self.values[z * 16 + x] = relative as u16;
    }

    /// Re-bases the stored values onto a new minimum chunk Y.
    pub fn offset(&mut self, new_min_chunk_y: i8) {
        let shift = (i32::from(self.min_chunk_y) - i32::from(new_min_chunk_y)) * 16;
        for value in self.values.iter_mut().filter(|v| **v != 0) {
            *value = (i32::from(*value) + shift).clamp(0, i32::from(u16::MAX)) as u16;
        }
        self.min_chunk_y = new_min_chunk_y;
    }

    /// Relative values in ZX order.
    pub fn raw(&self) -> &[u16; 256] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_keeps_world_height() {
        let mut map = HeightMap::new(4);
        map.set(3, 7, 80);
        assert_eq!(map.get(3, 7), Some(80));
        map.offset(0);
        assert_eq!(map.get(3, 7), Some(80));
        assert_eq!(map.raw()[7 * 16 + 3], 81);
        map.offset(-4);
        assert_eq!(map.get(3, 7), Some(80));
    }

    #[test]
    fn test_empty_columns_stay_empty() {
        let mut map = HeightMap::new(0);
        map.offset(-4);
        assert_eq!(map.get(0, 0), None);
        map.set(0, 0, -64);
        assert_eq!(map.get(0, 0), Some(-64));
    }
}
