//! Runs a whole conversion: region tasks on a worker pool, then the
//! world-level records, then closing the output.

use crate::bedrock::mcworld;
use crate::bedrock::BedrockWorld;
use crate::context::{ConversionContext, Services};
use crate::coords::{ChunkPos, Dimension, Edition, RegionPos};
use crate::entity::{IdRegistry, VanillaBlockEntities};
use crate::error::{ChunkFailure, ConvertError};
use crate::fs_guard::{SessionLock, TempWorkDir};
use crate::java::JavaWorld;
use crate::level::LevelInfo;
use crate::maps::{is_resolved, MapData};
use crate::options::ConverterOptions;
use crate::progress::{NoProgress, Phase, Progress};
use crate::records::WorldRecords;
use crate::stats::{anomaly, ChunkLog, Statistics};
use crate::terraform::terraform;
use crate::translation::Translator;
use crate::world::Chunk;
use crate::world_io::{Finalize, WorldSink, WorldSource};
use fnv::FnvHashMap;
use itertools::iproduct;
use log::{debug, error, info, warn};
use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// How a run ended. Cancellation is not an error: the statistics cover
/// every chunk written before the stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Completed(Statistics),
    Cancelled(Statistics),
}

impl ConversionOutcome {
    pub fn statistics(&self) -> &Statistics {
        match self {
            ConversionOutcome::Completed(stats) | ConversionOutcome::Cancelled(stats) => stats,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConversionOutcome::Cancelled(_))
    }
}

/// One region's worth of chunks that pass the filters.
struct RegionTask {
    dimension: Dimension,
    region: RegionPos,
    targets: Vec<ChunkPos>,
}

/// What one worker accumulated. Folded into the shared totals once, when
/// the worker runs out of tasks.
struct WorkerTotals<'a> {
    context: ConversionContext<'a>,
    stats: Statistics,
    records: WorldRecords,
}

impl<'a> WorkerTotals<'a> {
    fn new(context: ConversionContext<'a>) -> Self {
        Self {
            context,
            stats: Statistics::new(),
            records: WorldRecords::new(),
        }
    }

    fn merge(&mut self, other: WorkerTotals<'a>) {
        self.context.merge(other.context);
        self.stats.merge(other.stats);
        self.records.merge(other.records);
    }
}

/// Everything a region task reads but never writes.
struct Job<'a> {
    source: &'a dyn WorldSource,
    sink: &'a dyn WorldSink,
    options: &'a ConverterOptions,
    services: Services<'a>,
    progress: &'a dyn Progress,
    abort: &'a AtomicBool,
}

/// Converts the world at `input` into a new world at `output`.
///
/// A Bedrock source may be a world folder or a `.mcworld` archive. A Bedrock
/// target whose path ends in `.mcworld` is built in a temporary directory and
/// zipped once complete. Java worlds are locked through `session.lock` for
/// the whole run.
pub fn convert_world(
    input: &Path,
    output: &Path,
    options: &ConverterOptions,
    progress: Option<&dyn Progress>,
) -> Result<ConversionOutcome, ConvertError> {
    let progress = progress.unwrap_or(&NoProgress);
    if input == output {
        return Err(ConvertError::fatal("input and output are the same path"));
    }
    ensure_fresh_output(output)?;

    // Scratch directories are declared first so they outlive the worlds in them.
    let source_scratch = match options.source {
        Edition::Bedrock if mcworld::is_mcworld(input) => {
            let work = TempWorkDir::new(options.temp_dir.as_deref())?;
            mcworld::extract(input, work.path())?;
            Some(work)
        }
        _ => None,
    };
    let archive = options.target == Edition::Bedrock && has_mcworld_extension(output);
    let target_scratch = if archive {
        let base = options
            .temp_dir
            .clone()
            .or_else(|| output.parent().map(Path::to_path_buf));
        Some(TempWorkDir::new(base.as_deref())?)
    } else {
        None
    };
    let source_dir = source_scratch.as_ref().map_or(input, TempWorkDir::path);
    let world_dir: PathBuf = target_scratch
        .as_ref()
        .map_or_else(|| output.to_path_buf(), |work| work.path().join("world"));

    let (source, _source_lock): (Box<dyn WorldSource>, Option<SessionLock>) = match options.source {
        Edition::Java => {
            let world = JavaWorld::open(source_dir)?;
            (Box::new(world), Some(SessionLock::acquire(source_dir)?))
        }
        Edition::Bedrock => (Box::new(BedrockWorld::open(source_dir)?), None),
    };

    let (sink, _target_lock): (Box<dyn WorldSink>, Option<SessionLock>) = match options.target {
        Edition::Java => {
            let world = JavaWorld::create(&world_dir)?;
            (Box::new(world), Some(SessionLock::acquire(&world_dir)?))
        }
        Edition::Bedrock => (Box::new(BedrockWorld::create(&world_dir)?), None),
    };

    let outcome = convert_with(source.as_ref(), sink.as_ref(), options, progress)?;
    drop(sink);

    if archive {
        if let ConversionOutcome::Completed(stats) = &outcome {
            let level = crate::bedrock::level_dat::read_level_dat(&world_dir)?;
            mcworld::write_metadata(&world_dir, options.source, &level.name, stats.chunks_converted)?;
            progress.report(Phase::Package, 0, 1);
            mcworld::package(&world_dir, output)?;
            progress.report(Phase::Package, 1, 1);
            info!("Packaged {}", output.display());
        }
    }

    Ok(outcome)
}

fn has_mcworld_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mcworld"))
}

/// Output folders must be new or empty.
fn ensure_fresh_output(output: &Path) -> Result<(), ConvertError> {
    if output.is_dir() && fs::read_dir(output)?.next().is_some() {
        return Err(ConvertError::fatal(format!(
            "output folder {} is not empty",
            output.display()
        )));
    }
    Ok(())
}

/// Converts every selected chunk of `source` into `sink`, then writes the
/// world-level records and closes the sink.
///
/// On a fatal error or a cancellation the sink is abandoned, not closed.
pub fn convert_with(
    source: &dyn WorldSource,
    sink: &dyn WorldSink,
    options: &ConverterOptions,
    progress: &dyn Progress,
) -> Result<ConversionOutcome, ConvertError> {
    let translator = Translator::new();
    let registry = IdRegistry::new();
    let services = Services {
        translator: &translator,
        registry: &registry,
        block_entities: &VanillaBlockEntities,
    };

    let threads = options.threads();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("worldbridge-{i}"))
        .build()
        .map_err(|e| ConvertError::fatal(format!("cannot start worker pool: {e}")))?;
    info!(
        "Converting {:?} to {:?} with {threads} worker(s)",
        source.edition(),
        sink.edition()
    );

    let mut level = match source.level() {
        Ok(level) => level,
        Err(e) => {
            sink.abandon();
            return Err(e);
        }
    };
    if let Some(name) = &options.level_name {
        level.name = name.clone();
    }
    level.last_played = options.last_played_or_now();

    let abort = AtomicBool::new(false);
    let totals = Mutex::new(WorkerTotals::new(ConversionContext::new(services)));
    let job = Job {
        source,
        sink,
        options,
        services,
        progress,
        abort: &abort,
    };

    for dimension in options.selected_dimensions() {
        if let Err(e) = job.run_dimension(&pool, dimension, &totals) {
            error!("Conversion failed: {e}");
            sink.abandon();
            return Err(e);
        }
        if abort.load(Ordering::Relaxed) {
            break;
        }
    }

    let WorkerTotals {
        mut context,
        mut stats,
        records,
    } = totals.into_inner().unwrap_or_else(PoisonError::into_inner);

    if abort.load(Ordering::Relaxed) {
        warn!(
            "Conversion cancelled after {} chunk(s)",
            stats.chunks_converted
        );
        sink.abandon();
        return Ok(ConversionOutcome::Cancelled(stats));
    }

    // World-level records.
    progress.report(Phase::Finalize, 0, 1);
    let dimensions = options.selected_dimensions();
    let mut seen_maps: BTreeSet<i64> = std::mem::take(&mut context.map_ids);
    let finalized = {
        let mut log = ChunkLog::new(
            Dimension::Overworld,
            level.spawn.chunk(),
            &mut stats,
            &mut seen_maps,
        );
        job.finalize(&level, &records, &dimensions, &mut log)
    };
    let maps = match finalized {
        Ok(maps) => maps,
        Err(e) => {
            error!("Writing world records failed: {e}");
            sink.abandon();
            return Err(e);
        }
    };
    let unresolved = seen_maps
        .iter()
        .filter(|id| !is_resolved(**id, &maps))
        .count() as u64;
    if unresolved > 0 {
        warn!("{unresolved} map item(s) refer to maps that do not exist");
    }
    stats.count_n(anomaly::DROPPED_MAP_RECORDS, unresolved);
    progress.report(Phase::Finalize, 1, 1);

    info!("Closing output");
    sink.close(&mut |done: u64, total: u64| {
        progress.report(Phase::Compact, done, total);
    })?;

    info!(
        "Converted {} chunk(s), {} skipped, {} failed",
        stats.chunks_converted, stats.chunks_skipped, stats.chunks_failed
    );
    for (name, n) in &stats.anomalies {
        debug!("{name}: {n}");
    }
    Ok(ConversionOutcome::Completed(stats))
}

impl<'a> Job<'a> {
    fn run_dimension(
        &self,
        pool: &rayon::ThreadPool,
        dimension: Dimension,
        totals: &Mutex<WorkerTotals<'a>>,
    ) -> Result<(), ConvertError> {
        let mut tasks = VecDeque::new();
        let mut total = 0u64;
        for (region, chunks) in self.source.chunks(dimension)? {
            let targets: Vec<ChunkPos> = chunks
                .into_iter()
                .filter(|pos| self.options.wants_chunk(*pos))
                .collect();
            if targets.is_empty() {
                continue;
            }
            total += targets.len() as u64;
            tasks.push_back(RegionTask {
                dimension,
                region,
                targets,
            });
        }
        if tasks.is_empty() {
            debug!("{dimension}: nothing to convert");
            return Ok(());
        }
        info!("{dimension}: {total} chunk(s) in {} region(s)", tasks.len());

        let queue = Mutex::new(tasks);
        let done = AtomicU64::new(0);
        let failure: Mutex<Option<ConvertError>> = Mutex::new(None);

        pool.scope(|scope| {
            for _ in 0..pool.current_num_threads() {
                scope.spawn(|_| {
                    let mut mine = WorkerTotals::new(ConversionContext::new(self.services));
                    while !self.abort.load(Ordering::Relaxed) {
                        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                        let Some(task) = next else {
                            break;
                        };
                        if let Err(e) = self.convert_region(&task, &done, total, &mut mine) {
                            self.abort.store(true, Ordering::Relaxed);
                            failure
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .get_or_insert(e);
                            break;
                        }
                    }
                    totals
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .merge(mine);
                });
            }
        });

        match failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Reads the task's chunks plus a one-chunk border, terraforms and writes
    /// them. Only storage failures are returned. Everything else is recorded
    /// against the chunk.
    fn convert_region(
        &self,
        task: &RegionTask,
        done: &AtomicU64,
        total: u64,
        totals: &mut WorkerTotals<'a>,
    ) -> Result<(), ConvertError> {
        let dimension = task.dimension;
        let mut reader = self.source.reader(dimension);
        let mut working: FnvHashMap<ChunkPos, Chunk> = FnvHashMap::default();
        let mut targets = Vec::with_capacity(task.targets.len());

        for &pos in &task.targets {
            let (services, mut log) = totals.context.chunk(dimension, pos, &mut totals.stats);
            match reader.read_chunk(pos, services, &mut log) {
                Ok(Some(chunk)) => {
                    log.stats().record_version(chunk.source_version);
                    working.insert(pos, chunk);
                    targets.push(pos);
                    continue;
                }
                Ok(None) => log.stats().chunks_skipped += 1,
                Err(ChunkFailure::Storage(message)) => {
                    return Err(ConvertError::storage(format!(
                        "reading {dimension} chunk {pos}: {message}"
                    )));
                }
                Err(e) => {
                    warn!("{dimension} chunk {pos}: {e}");
                    log.error(e.to_string());
                    log.stats().chunks_failed += 1;
                }
            }
            self.tick(dimension, done, total);
        }

        // Neighbours are read for the terraform passes only. Their statistics
        // belong to whichever task converts them.
        let mut scratch = Statistics::new();
        let mut scratch_maps = BTreeSet::new();
        let border: BTreeSet<ChunkPos> = targets
            .iter()
            .flat_map(|pos| iproduct!(-1..=1, -1..=1).map(move |(dx, dz)| pos.offset(dx, dz)))
            .filter(|pos| !task.targets.contains(pos) && self.options.wants_chunk(*pos))
            .collect();
        for pos in border {
            let mut log = ChunkLog::new(dimension, pos, &mut scratch, &mut scratch_maps);
            match reader.read_chunk(pos, self.services, &mut log) {
                Ok(Some(chunk)) => {
                    working.insert(pos, chunk);
                }
                Ok(None) => {}
                Err(ChunkFailure::Storage(message)) => {
                    return Err(ConvertError::storage(format!(
                        "reading {dimension} chunk {pos}: {message}"
                    )));
                }
                Err(e) => debug!("Border chunk {pos} unreadable: {e}"),
            }
        }

        let report = terraform(&mut working, &targets);
        totals.stats.terraformed_blocks += report.changed_blocks;
        if targets.is_empty() {
            return Ok(());
        }

        let mut writer = self.sink.writer(dimension, task.region)?;
        for pos in targets {
            if self.abort.load(Ordering::Relaxed) {
                break;
            }
            let Some(chunk) = working.get(&pos) else {
                continue;
            };
            let (services, mut log) = totals.context.chunk(dimension, pos, &mut totals.stats);
            match writer.write_chunk(chunk, services, &mut log) {
                Ok(()) => {
                    log.stats().chunks_converted += 1;
                    totals.records.collect(chunk);
                }
                Err(ChunkFailure::Storage(message)) => {
                    return Err(ConvertError::storage(format!(
                        "writing {dimension} chunk {pos}: {message}"
                    )));
                }
                Err(e) => {
                    warn!("{dimension} chunk {pos}: {e}");
                    log.error(e.to_string());
                    log.stats().chunks_failed += 1;
                }
            }
            self.tick(dimension, done, total);
        }
        writer.finish()
    }

    /// Player, maps and level.dat. Returns the converted maps.
    fn finalize(
        &self,
        level: &LevelInfo,
        records: &WorldRecords,
        dimensions: &[Dimension],
        log: &mut ChunkLog<'_>,
    ) -> Result<Vec<MapData>, ConvertError> {
        let player = self
            .source
            .local_player(self.options.local_player_uuid, self.services, log)?;
        if player.is_none() {
            debug!("Source world has no local player");
        }
        let maps = self.source.maps()?;
        debug!("{} map record(s)", maps.len());
        self.sink.finalize(
            &Finalize {
                level,
                player: player.as_ref(),
                maps: &maps,
                records,
                dimensions,
            },
            log,
        )?;
        Ok(maps)
    }

    fn tick(&self, dimension: Dimension, done: &AtomicU64, total: u64) {
        let done = done.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.progress.report(Phase::Chunks(dimension), done, total)
            && !self.abort.swap(true, Ordering::Relaxed)
        {
            info!("Cancellation requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock::keys;
    use crate::block_definitions::BlockState;
    use crate::storage::{DiscardStore, KeyValueStore, MemoryStore};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn stone_chunk(dimension: Dimension, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(dimension, pos);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, 0, z, BlockState::new("stone"));
            }
        }
        chunk.set_block(3, 1, 3, BlockState::new("oak_planks"));
        chunk
    }

    /// Writes `chunks` into `sink` with a bare level.dat.
    fn populate(sink: &dyn WorldSink, chunks: &[(Dimension, ChunkPos)]) {
        let translator = Translator::new();
        let registry = IdRegistry::new();
        let services = Services {
            translator: &translator,
            registry: &registry,
            block_entities: &VanillaBlockEntities,
        };
        let mut stats = Statistics::new();
        let mut maps = BTreeSet::new();
        let mut by_region: BTreeMap<(Dimension, RegionPos), Vec<ChunkPos>> = BTreeMap::new();
        for &(dimension, pos) in chunks {
            by_region.entry((dimension, pos.region())).or_default().push(pos);
        }
        for ((dimension, region), positions) in by_region {
            let mut writer = sink.writer(dimension, region).unwrap();
            for pos in positions {
                let mut log = ChunkLog::new(dimension, pos, &mut stats, &mut maps);
                writer
                    .write_chunk(&stone_chunk(dimension, pos), services, &mut log)
                    .unwrap();
            }
            writer.finish().unwrap();
        }
        let level = LevelInfo {
            name: "Fixture".to_string(),
            ..LevelInfo::default()
        };
        let mut log = ChunkLog::new(Dimension::Overworld, ChunkPos::new(0, 0), &mut stats, &mut maps);
        sink.finalize(
            &Finalize {
                level: &level,
                player: None,
                maps: &[],
                records: &WorldRecords::new(),
                dimensions: &Dimension::ALL,
            },
            &mut log,
        )
        .unwrap();
        assert!(stats.errors.is_empty());
    }

    fn only_origin() -> ConverterOptions {
        ConverterOptions {
            chunks: BTreeSet::from([ChunkPos::new(0, 0)]),
            concurrency: 2,
            last_played: Some(1_700_000_000),
            ..ConverterOptions::default()
        }
    }

    #[test]
    fn test_chunk_filter_java_to_bedrock() {
        let src = tempfile::tempdir().unwrap();
        let java = JavaWorld::create(src.path()).unwrap();
        populate(
            &java,
            &[
                (Dimension::Overworld, ChunkPos::new(0, 0)),
                (Dimension::Overworld, ChunkPos::new(1, 0)),
                (Dimension::Overworld, ChunkPos::new(-40, 7)),
                (Dimension::Nether, ChunkPos::new(0, 0)),
            ],
        );

        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let bedrock = BedrockWorld::with_store(out.path(), store.clone());
        let options = ConverterOptions {
            dimensions: BTreeSet::from([Dimension::Overworld]),
            ..only_origin()
        };

        let outcome = convert_with(&java, &bedrock, &options, &NoProgress).unwrap();
        let stats = outcome.statistics();
        assert!(!outcome.is_cancelled());
        assert_eq!(stats.chunks_converted, 1);
        assert_eq!(stats.chunks_failed, 0);
        assert_eq!(
            keys::list_chunks(store.as_ref()).unwrap(),
            BTreeSet::from([(Dimension::Overworld, ChunkPos::new(0, 0))])
        );
        let level = WorldSource::level(&bedrock).unwrap();
        assert_eq!(level.name, "Fixture");
        assert_eq!(level.last_played, 1_700_000_000);
    }

    #[test]
    fn test_chunk_filter_bedrock_to_java() {
        let src = tempfile::tempdir().unwrap();
        let bedrock = BedrockWorld::with_store(src.path(), Arc::new(MemoryStore::new()));
        populate(
            &bedrock,
            &[
                (Dimension::Overworld, ChunkPos::new(0, 0)),
                (Dimension::Overworld, ChunkPos::new(0, 1)),
                (Dimension::End, ChunkPos::new(0, 0)),
            ],
        );

        let out = tempfile::tempdir().unwrap();
        let java = JavaWorld::create(out.path()).unwrap();
        let options = ConverterOptions {
            source: Edition::Bedrock,
            target: Edition::Java,
            level_name: Some("Renamed".to_string()),
            ..only_origin()
        };

        let outcome = convert_with(&bedrock, &java, &options, &NoProgress).unwrap();
        // Overworld and End both hold a (0, 0) chunk.
        assert_eq!(outcome.statistics().chunks_converted, 2);

        let written = JavaWorld::open(out.path()).unwrap();
        let overworld = WorldSource::chunks(&written, Dimension::Overworld).unwrap();
        assert_eq!(overworld.len(), 1);
        assert_eq!(overworld[&RegionPos::new(0, 0)], vec![ChunkPos::new(0, 0)]);
        assert_eq!(WorldSource::level(&written).unwrap().name, "Renamed");
    }

    #[test]
    fn test_cancellation_stops_at_chunk_boundary() {
        let src = tempfile::tempdir().unwrap();
        let bedrock = BedrockWorld::with_store(src.path(), Arc::new(MemoryStore::new()));
        populate(
            &bedrock,
            &[
                (Dimension::Overworld, ChunkPos::new(0, 0)),
                (Dimension::Overworld, ChunkPos::new(1, 0)),
                (Dimension::Overworld, ChunkPos::new(2, 0)),
            ],
        );

        let out = tempfile::tempdir().unwrap();
        let target = BedrockWorld::with_store(out.path(), Arc::new(MemoryStore::new()));
        let options = ConverterOptions {
            source: Edition::Bedrock,
            concurrency: 1,
            ..ConverterOptions::default()
        };
        let stop = |phase: Phase, _: u64, _: u64| !matches!(phase, Phase::Chunks(_));

        let outcome = convert_with(&bedrock, &target, &options, &stop).unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.statistics().chunks_converted, 1);
        assert!(target.store().get(keys::LOCAL_PLAYER).unwrap().is_none());
        assert!(!out.path().join("level.dat").exists());
    }

    #[test]
    fn test_discard_sink_still_counts() {
        let src = tempfile::tempdir().unwrap();
        let java = JavaWorld::create(src.path()).unwrap();
        populate(
            &java,
            &[
                (Dimension::Overworld, ChunkPos::new(0, 0)),
                (Dimension::Overworld, ChunkPos::new(0, 1)),
            ],
        );

        let out = tempfile::tempdir().unwrap();
        let sink = BedrockWorld::with_store(out.path(), Arc::new(DiscardStore));
        let options = ConverterOptions {
            concurrency: 1,
            ..ConverterOptions::default()
        };
        let outcome = convert_with(&java, &sink, &options, &NoProgress).unwrap();
        assert_eq!(outcome.statistics().chunks_converted, 2);
        assert!(keys::list_chunks(sink.store()).unwrap().is_empty());
    }

    #[test]
    fn test_convert_world_packages_mcworld() {
        let src = tempfile::tempdir().unwrap();
        let java = JavaWorld::create(src.path()).unwrap();
        populate(&java, &[(Dimension::Overworld, ChunkPos::new(0, 0))]);

        let out = tempfile::tempdir().unwrap();
        let archive = out.path().join("Fixture.mcworld");
        let outcome = convert_world(src.path(), &archive, &only_origin(), None).unwrap();
        assert_eq!(outcome.statistics().chunks_converted, 1);
        assert!(mcworld::is_mcworld(&archive));

        let unpacked = tempfile::tempdir().unwrap();
        mcworld::extract(&archive, unpacked.path()).unwrap();
        assert!(unpacked.path().join("level.dat").is_file());
        assert!(unpacked.path().join("metadata.json").is_file());
    }

    #[test]
    fn test_non_empty_output_is_refused() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(out.path().join("keep.txt"), b"x").unwrap();
        let result = convert_world(src.path(), out.path(), &ConverterOptions::default(), None);
        assert!(matches!(result, Err(ConvertError::Fatal { .. })));
        assert!(out.path().join("keep.txt").exists());
    }
}
