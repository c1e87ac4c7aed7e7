//! World-level records that span chunks: nether portals and structure bounds.
//!
//! Workers collect these while converting chunks and the orchestrator writes
//! them once every chunk is done. [`WorldRecords::merge`] is a set union, so
//! the order workers finish in never shows in the output.

use crate::coords::{BlockPos, ChunkPos, Dimension};
use crate::world::Chunk;
use std::collections::{BTreeMap, BTreeSet};

/// Largest portal frame interior either edition will light.
pub const MAX_PORTAL_SIZE: u8 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    pub fn from_property(value: &str) -> Option<Self> {
        match value {
            "x" => Some(Axis::X),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn property(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }
}

/// One lit portal: a filled rectangle of portal blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalRecord {
    pub dimension: Dimension,
    /// Lowest corner of the portal blocks.
    pub origin: BlockPos,
    pub axis: Axis,
    pub width: u8,
    pub height: u8,
}

impl PortalRecord {
    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (dx, dz) = match self.axis {
            Axis::X => (1, 0),
            Axis::Z => (0, 1),
        };
        (0..i32::from(self.height)).flat_map(move |dy| {
            (0..i32::from(self.width)).map(move |w| self.origin.offset(dx * w, dy, dz * w))
        })
    }
}

/// Structure kinds both editions keep spawn bounds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureKind {
    Fortress,
    SwampHut,
    Monument,
    PillagerOutpost,
}

impl StructureKind {
    pub const ALL: [StructureKind; 4] = [
        StructureKind::Fortress,
        StructureKind::SwampHut,
        StructureKind::Monument,
        StructureKind::PillagerOutpost,
    ];

    /// Hardcoded spawn area type in Bedrock `0x39` records.
    pub fn bedrock_id(self) -> u8 {
        match self {
            StructureKind::Fortress => 1,
            StructureKind::SwampHut => 2,
            StructureKind::Monument => 3,
            StructureKind::PillagerOutpost => 5,
        }
    }

    pub fn from_bedrock_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.bedrock_id() == id)
    }

    pub fn java_name(self) -> &'static str {
        match self {
            StructureKind::Fortress => "minecraft:fortress",
            StructureKind::SwampHut => "minecraft:swamp_hut",
            StructureKind::Monument => "minecraft:monument",
            StructureKind::PillagerOutpost => "minecraft:pillager_outpost",
        }
    }

    pub fn from_java_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.java_name() == name)
    }

    /// Piece id used when a start is written back to Java.
    pub fn java_piece(self) -> &'static str {
        match self {
            StructureKind::Fortress => "minecraft:nefos",
            StructureKind::SwampHut => "minecraft:tesh",
            StructureKind::Monument => "minecraft:omb",
            StructureKind::PillagerOutpost => "minecraft:jigsaw",
        }
    }
}

/// Bounding box of one structure, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureRecord {
    pub dimension: Dimension,
    pub kind: StructureKind,
    pub min: BlockPos,
    pub max: BlockPos,
}

impl StructureRecord {
    pub fn start_chunk(&self) -> ChunkPos {
        self.min.chunk()
    }

    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> {
        let (lo, hi) = (self.min.chunk(), self.max.chunk());
        (lo.x..=hi.x).flat_map(move |x| (lo.z..=hi.z).map(move |z| ChunkPos::new(x, z)))
    }

    pub fn overlaps(&self, chunk: ChunkPos) -> bool {
        let (lo, hi) = (self.min.chunk(), self.max.chunk());
        (lo.x..=hi.x).contains(&chunk.x) && (lo.z..=hi.z).contains(&chunk.z)
    }

    /// `[minX, minY, minZ, maxX, maxY, maxZ]`.
    pub fn bounds(&self) -> [i32; 6] {
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
    }

    /// Builds a record from any two corners, or `None` for a box that is
    /// larger than a region on either horizontal axis.
    pub fn from_bounds(dimension: Dimension, kind: StructureKind, b: [i32; 6]) -> Option<Self> {
        let min = BlockPos::new(b[0].min(b[3]), b[1].min(b[4]), b[2].min(b[5]));
        let max = BlockPos::new(b[0].max(b[3]), b[1].max(b[4]), b[2].max(b[5]));
        if max.x - min.x > 512 || max.z - min.z > 512 {
            return None;
        }
        Some(Self {
            dimension,
            kind,
            min,
            max,
        })
    }
}

/// Records collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldRecords {
    /// Portal blocks seen in converted chunks, with their axis.
    pub portal_blocks: BTreeMap<Dimension, BTreeMap<BlockPos, Axis>>,
    pub structures: BTreeSet<StructureRecord>,
    /// Chunks written to the output, per dimension.
    pub converted: BTreeSet<(Dimension, ChunkPos)>,
}

impl WorldRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up the portal blocks and structure bounds of a converted chunk.
    pub fn collect(&mut self, chunk: &Chunk) {
        self.converted.insert((chunk.dimension, chunk.pos));
        self.structures.extend(chunk.structures.iter().copied());
        let portals: Vec<(BlockPos, Axis)> = chunk
            .positions_where(|b| b.is("nether_portal"))
            .into_iter()
            .filter_map(|pos| {
                let block = chunk.block_at(pos)?;
                Some((pos, Axis::from_property(block.property("axis").unwrap_or("x"))?))
            })
            .collect();
        if !portals.is_empty() {
            self.portal_blocks
                .entry(chunk.dimension)
                .or_default()
                .extend(portals);
        }
    }

    pub fn merge(&mut self, other: WorldRecords) {
        for (dimension, blocks) in other.portal_blocks {
            self.portal_blocks.entry(dimension).or_default().extend(blocks);
        }
        self.structures.extend(other.structures);
        self.converted.extend(other.converted);
    }

    /// Groups portal blocks into rectangles. Groups that are not a filled
    /// rectangle within the size limit are returned separately as rejects.
    pub fn portals(&self, dimension: Dimension) -> (Vec<PortalRecord>, usize) {
        let Some(blocks) = self.portal_blocks.get(&dimension) else {
            return (Vec::new(), 0);
        };
        let mut seen: BTreeSet<BlockPos> = BTreeSet::new();
        let mut records = Vec::new();
        let mut rejected = 0;
        for (&start, &axis) in blocks {
            if seen.contains(&start) {
                continue;
            }
            let group = flood(blocks, start, axis, &mut seen);
            match rectangle(dimension, axis, &group) {
                Some(record) => records.push(record),
                None => rejected += 1,
            }
        }
        (records, rejected)
    }
}

fn flood(
    blocks: &BTreeMap<BlockPos, Axis>,
    start: BlockPos,
    axis: Axis,
    seen: &mut BTreeSet<BlockPos>,
) -> Vec<BlockPos> {
    let (dx, dz) = match axis {
        Axis::X => (1, 0),
        Axis::Z => (0, 1),
    };
    let mut group = Vec::new();
    let mut stack = vec![start];
    seen.insert(start);
    while let Some(pos) = stack.pop() {
        group.push(pos);
        for next in [
            pos.offset(dx, 0, dz),
            pos.offset(-dx, 0, -dz),
            pos.up(),
            pos.down(),
        ] {
            if blocks.get(&next) == Some(&axis) && seen.insert(next) {
                stack.push(next);
            }
        }
    }
    group
}

fn rectangle(dimension: Dimension, axis: Axis, group: &[BlockPos]) -> Option<PortalRecord> {
    let min_x = group.iter().map(|p| p.x).min()?;
    let min_y = group.iter().map(|p| p.y).min()?;
    let min_z = group.iter().map(|p| p.z).min()?;
    let max_y = group.iter().map(|p| p.y).max()?;
    let span = match axis {
        Axis::X => group.iter().map(|p| p.x).max()? - min_x,
        Axis::Z => group.iter().map(|p| p.z).max()? - min_z,
    } + 1;
    let height = max_y - min_y + 1;
    let width = u8::try_from(span).ok().filter(|w| *w <= MAX_PORTAL_SIZE)?;
    let height = u8::try_from(height).ok().filter(|h| *h <= MAX_PORTAL_SIZE)?;
    if usize::from(width) * usize::from(height) != group.len() {
        return None;
    }
    Some(PortalRecord {
        dimension,
        origin: BlockPos::new(min_x, min_y, min_z),
        axis,
        width,
        height,
    })
}
