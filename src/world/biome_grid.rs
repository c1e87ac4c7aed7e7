use crate::palette::BlockPalette;
use std::collections::BTreeMap;

/// Cells per section (4×4×4).
pub const CELLS: usize = 64;

/// Biomes at Java resolution: one namespaced biome per 4×4×4 cell.
///
/// Bedrock stores a biome per block; readers sample the centre of each cell
/// and writers expand each cell back to 4×4×4 blocks.
#[derive(Debug, Clone)]
pub struct BiomeGrid {
    palette: BlockPalette<String>,
    sections: BTreeMap<i8, [u16; CELLS]>,
}

impl BiomeGrid {
    pub fn new(default: &str) -> Self {
        Self {
            palette: BlockPalette::new(default.to_string()),
            sections: BTreeMap::new(),
        }
    }

    /// Cell index inside a section, `cx`/`cy`/`cz` in `0..4`.
    #[inline]
    pub fn cell_index(cx: usize, cy: usize, cz: usize) -> usize {
        (cy * 4 + cz) * 4 + cx
    }

    pub fn cell(&self, section_y: i8, cx: usize, cy: usize, cz: usize) -> &str {
        let index = self
            .sections
            .get(&section_y)
            .map(|cells| cells[Self::cell_index(cx, cy, cz)])
            .unwrap_or(0);
        self.palette
            .get(index)
            .unwrap_or_else(|| self.palette.default_entry())
    }

    pub fn set_cell(&mut self, section_y: i8, cx: usize, cy: usize, cz: usize, biome: &str) {
        let index = self.palette.insert(biome.to_string());
        let cells = self.sections.entry(section_y).or_insert([0; CELLS]);
        cells[Self::cell_index(cx, cy, cz)] = index;
    }

    /// Biome at a block position (`x`/`z` local, `y` absolute).
    pub fn at_block(&self, x: usize, y: i32, z: usize) -> &str {
        let section_y = y.div_euclid(16) as i8;
        let local_y = y.rem_euclid(16) as usize;
        self.cell(section_y, x / 4, local_y / 4, z / 4)
    }

    pub fn default_biome(&self) -> &str {
        self.palette.default_entry()
    }

    pub fn sections(&self) -> impl Iterator<Item = i8> + '_ {
        self.sections.keys().copied()
    }

    /// Distinct biomes used by one section plus its cell indices into that list.
    pub fn section_palette(&self, section_y: i8) -> (Vec<&str>, [u16; CELLS]) {
        let Some(cells) = self.sections.get(&section_y) else {
            return (vec![self.default_biome()], [0; CELLS]);
        };
        let mut local = BlockPalette::new(cells[0]);
        let mut indices = [0u16; CELLS];
        for (slot, &global) in indices.iter_mut().zip(cells.iter()) {
            *slot = local.insert(global);
        }
        let names = local
            .entries()
            .iter()
            .map(|&g| {
                self.palette
                    .get(g)
                    .map(String::as_str)
                    .unwrap_or_else(|| self.default_biome())
            })
            .collect();
        (names, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_and_block_lookup() {
        let mut grid = BiomeGrid::new("minecraft:plains");
        grid.set_cell(4, 1, 0, 2, "minecraft:desert");
        assert_eq!(grid.at_block(5, 64, 9), "minecraft:desert");
        assert_eq!(grid.at_block(0, 64, 0), "minecraft:plains");
        assert_eq!(grid.at_block(5, 200, 9), "minecraft:plains");
    }

    #[test]
    fn test_section_palette_is_local() {
        let mut grid = BiomeGrid::new("minecraft:plains");
        grid.set_cell(0, 0, 0, 0, "minecraft:forest");
        grid.set_cell(1, 0, 0, 0, "minecraft:desert");
        let (names, indices) = grid.section_palette(1);
        assert_eq!(names, vec!["minecraft:desert", "minecraft:plains"]);
        assert_eq!(indices[0], 0);
        assert_eq!(indices[1], 1);
    }
}
