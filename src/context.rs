//! Per-run conversion context.

use crate::coords::{ChunkPos, Dimension};
use crate::entity::{BlockEntityConverter, IdRegistry};
use crate::stats::{ChunkLog, Statistics};
use crate::translation::Translator;
use std::collections::BTreeSet;

/// Shared, read-only services every chunk codec needs.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub translator: &'a Translator,
    pub registry: &'a IdRegistry,
    pub block_entities: &'a dyn BlockEntityConverter,
}

/// A worker's view of the run: the shared services plus the map ids it has
/// collected so far.
///
/// A child context starts with no map ids and hands them back to its parent
/// through [`ConversionContext::merge`].
pub struct ConversionContext<'a> {
    pub services: Services<'a>,
    pub map_ids: BTreeSet<i64>,
}

impl<'a> ConversionContext<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            map_ids: BTreeSet::new(),
        }
    }

    pub fn child(&self) -> Self {
        Self::new(self.services)
    }

    pub fn merge(&mut self, child: ConversionContext<'a>) {
        self.map_ids.extend(child.map_ids);
    }

    /// Services plus a log for one chunk.
    pub fn chunk<'s>(
        &'s mut self,
        dimension: Dimension,
        pos: ChunkPos,
        stats: &'s mut Statistics,
    ) -> (Services<'a>, ChunkLog<'s>) {
        (self.services, ChunkLog::new(dimension, pos, stats, &mut self.map_ids))
    }
}
