//! Key-value storage behind the Bedrock reader and writer.
//!
//! `rusty_leveldb::DB` is neither `Send` nor `Sync`, so the real engine lives
//! on one actor thread and every worker talks to it through a cloneable
//! channel handle. The in-memory store backs the tests and the discard store
//! lets a run go through the motions without producing output.

use crate::error::ConvertError;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use log::{debug, warn};
use rusty_leveldb::{Compressor, CompressorList};
use rusty_leveldb::{LdbIterator, Options, Status, StatusCode, DB};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Bedrock's LevelDB fork registers zlib as compressor 2 and raw deflate as 4.
const ZLIB_COMPRESSOR_ID: u8 = 2;
const RAW_DEFLATE_COMPRESSOR_ID: u8 = 4;

/// Ordered key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConvertError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ConvertError>;

    fn delete(&self, key: &[u8]) -> Result<(), ConvertError>;

    /// Every key starting with `prefix`, in key order.
    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, ConvertError>;

    /// Flushes and compacts. `progress` receives `(done, total)` steps.
    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError>;

    /// Drops the store without flushing or compacting.
    fn abandon(&self);
}

struct ZlibCompressor {
    raw: bool,
}

impl Compressor for ZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let compressed = if self.raw {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&block).and_then(|_| encoder.finish())
        } else {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&block).and_then(|_| encoder.finish())
        };
        compressed.map_err(|e| Status::new(StatusCode::CompressionError, &e.to_string()))
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        let result = if self.raw {
            DeflateDecoder::new(block.as_slice()).read_to_end(&mut out)
        } else {
            ZlibDecoder::new(block.as_slice()).read_to_end(&mut out)
        };
        result
            .map(|_| out)
            .map_err(|e| Status::new(StatusCode::CompressionError, &e.to_string()))
    }
}

fn bedrock_options(create: bool) -> Options {
    let mut compressors = CompressorList::new();
    compressors.set_with_id(ZLIB_COMPRESSOR_ID, ZlibCompressor { raw: false });
    compressors.set_with_id(RAW_DEFLATE_COMPRESSOR_ID, ZlibCompressor { raw: true });
    Options {
        create_if_missing: create,
        compressor: RAW_DEFLATE_COMPRESSOR_ID,
        compressor_list: Rc::new(compressors),
        ..Options::default()
    }
}

type Reply<T> = Sender<Result<T, String>>;

enum Command {
    Get(Vec<u8>, Reply<Option<Vec<u8>>>),
    Put(Vec<u8>, Vec<u8>, Reply<()>),
    Delete(Vec<u8>, Reply<()>),
    Keys(Vec<u8>, Reply<Vec<Vec<u8>>>),
    /// Compacts one slice of the key space by leading byte.
    Compact(u8, Reply<()>),
    Flush(Reply<()>),
}

fn serve(mut db: DB, commands: Receiver<Command>) {
    for command in commands {
        match command {
            Command::Get(key, reply) => {
                let _ = reply.send(Ok(db.get(&key).map(|v| v.to_vec())));
            }
            Command::Put(key, value, reply) => {
                let _ = reply.send(db.put(&key, &value).map_err(|e| e.to_string()));
            }
            Command::Delete(key, reply) => {
                let _ = reply.send(db.delete(&key).map_err(|e| e.to_string()));
            }
            Command::Keys(prefix, reply) => {
                let keys = db.new_iter().map_err(|e| e.to_string()).map(|mut iter| {
                    let mut keys = Vec::new();
                    while let Some((key, _)) = iter.next() {
                        if key.starts_with(&prefix) {
                            keys.push(key.to_vec());
                        }
                    }
                    keys
                });
                let _ = reply.send(keys);
            }
            Command::Compact(lead, reply) => {
                let from = [lead];
                let to = [lead, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
                let _ = reply.send(db.compact_range(&from, &to).map_err(|e| e.to_string()));
            }
            Command::Flush(reply) => {
                let _ = reply.send(db.flush().map_err(|e| e.to_string()));
            }
        }
    }
    debug!("LevelDB actor stopped");
}

/// LevelDB with Bedrock's compressors, owned by a dedicated thread.
pub struct LevelDbStore {
    path: PathBuf,
    commands: Mutex<Option<Sender<Command>>>,
    actor: Mutex<Option<JoinHandle<()>>>,
}

impl LevelDbStore {
    /// Opens (or creates, if `create`) the database at `path`.
    pub fn open(path: &Path, create: bool) -> Result<Self, ConvertError> {
        let (commands, inbox) = mpsc::channel();
        let (ready, opened) = mpsc::channel::<Result<(), String>>();
        let db_path = path.to_path_buf();
        let actor = thread::Builder::new()
            .name("leveldb".to_string())
            .spawn(move || match DB::open(&db_path, bedrock_options(create)) {
                Ok(db) => {
                    let _ = ready.send(Ok(()));
                    serve(db, inbox);
                }
                Err(e) => {
                    let _ = ready.send(Err(e.to_string()));
                }
            })?;

        match opened.recv() {
            Ok(Ok(())) => Ok(Self {
                path: path.to_path_buf(),
                commands: Mutex::new(Some(commands)),
                actor: Mutex::new(Some(actor)),
            }),
            Ok(Err(message)) => Err(ConvertError::storage(format!(
                "cannot open {}: {message}",
                path.display()
            ))),
            Err(_) => Err(ConvertError::storage(format!(
                "LevelDB thread for {} exited during open",
                path.display()
            ))),
        }
    }

    #[track_caller]
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, ConvertError> {
        let (reply, response) = mpsc::channel();
        let sender = self
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ConvertError::storage(format!("{} is closed", self.path.display())))?;
        sender
            .send(make(reply))
            .map_err(|_| ConvertError::storage("LevelDB thread is gone"))?;
        response
            .recv()
            .map_err(|_| ConvertError::storage("LevelDB thread dropped a request"))?
            .map_err(ConvertError::storage)
    }

    fn stop(&self) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let actor = self.actor.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(actor) = actor {
            if actor.join().is_err() {
                warn!("LevelDB thread for {} panicked", self.path.display());
            }
        }
    }
}

impl KeyValueStore for LevelDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConvertError> {
        self.call(|reply| Command::Get(key.to_vec(), reply))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ConvertError> {
        self.call(|reply| Command::Put(key.to_vec(), value.to_vec(), reply))
    }

    fn delete(&self, key: &[u8]) -> Result<(), ConvertError> {
        self.call(|reply| Command::Delete(key.to_vec(), reply))
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, ConvertError> {
        self.call(|reply| Command::Keys(prefix.to_vec(), reply))
    }

    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError> {
        self.call(Command::Flush)?;
        const SLICES: u64 = 256;
        for lead in 0..=u8::MAX {
            self.call(|reply| Command::Compact(lead, reply))?;
            progress(u64::from(lead) + 1, SLICES);
        }
        self.stop();
        Ok(())
    }

    fn abandon(&self) {
        self.stop();
    }
}

impl Drop for LevelDbStore {
    fn drop(&mut self) {
        self.stop();
    }
}

/// In-memory store. Used by tests and for inspecting conversion output.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ConvertError> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), ConvertError> {
        self.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), ConvertError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, ConvertError> {
        Ok(self
            .lock()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError> {
        progress(1, 1);
        Ok(())
    }

    fn abandon(&self) {}
}

/// Accepts every write and keeps nothing.
#[derive(Default, Clone, Copy)]
pub struct DiscardStore;

impl KeyValueStore for DiscardStore {
    fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, ConvertError> {
        Ok(None)
    }

    fn put(&self, _key: &[u8], _value: &[u8]) -> Result<(), ConvertError> {
        Ok(())
    }

    fn delete(&self, _key: &[u8]) -> Result<(), ConvertError> {
        Ok(())
    }

    fn keys_with_prefix(&self, _prefix: &[u8]) -> Result<Vec<Vec<u8>>, ConvertError> {
        Ok(Vec::new())
    }

    fn close(&self, progress: &mut dyn FnMut(u64, u64)) -> Result<(), ConvertError> {
        progress(1, 1);
        Ok(())
    }

    fn abandon(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_prefix_scan() {
        let store = MemoryStore::new();
        store.put(b"map_1", b"a").unwrap();
        store.put(b"map_2", b"b").unwrap();
        store.put(b"portals", b"c").unwrap();
        store.delete(b"map_2").unwrap();
        assert_eq!(store.keys_with_prefix(b"map_").unwrap(), vec![b"map_1".to_vec()]);
        assert_eq!(store.keys_with_prefix(b"").unwrap().len(), 2);
    }

    #[test]
    fn test_discard_store_keeps_nothing() {
        let store = DiscardStore;
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_leveldb_round_trip_through_actor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let store = LevelDbStore::open(&path, true).unwrap();
            std::thread::scope(|scope| {
                for worker in 0..4u8 {
                    let store = &store;
                    scope.spawn(move || {
                        for i in 0..50u8 {
                            store.put(&[worker, i], &[i; 64]).unwrap();
                        }
                    });
                }
            });
            let mut steps = 0;
            store.close(&mut |_, _| steps += 1).unwrap();
            assert_eq!(steps, 256);
        }
        let store = LevelDbStore::open(&path, false).unwrap();
        assert_eq!(store.get(&[3, 7]).unwrap(), Some(vec![7; 64]));
        assert_eq!(store.keys_with_prefix(&[2]).unwrap().len(), 50);
        store.abandon();
    }
}
