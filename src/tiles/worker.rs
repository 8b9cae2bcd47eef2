use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::source::TileSource;
use crate::core::config::EngineConfig;
use crate::core::projection::MapProjection;
use crate::core::tile_id::TileId;
use crate::geometry::Mesh;
use crate::style::{Style, TileContext};
use crate::tile::{TileHandle, TileState};
use crate::{Error, Result};

/// Outcome of loading and building one tile
#[derive(Debug)]
pub enum TileResult {
    Built {
        handle: TileHandle,
        meshes: Vec<(String, Mesh)>,
    },
    Failed {
        handle: TileHandle,
        error: Error,
    },
}

impl TileResult {
    pub fn id(&self) -> TileId {
        match self {
            Self::Built { handle, .. } | Self::Failed { handle, .. } => handle.id(),
        }
    }
}

#[derive(Default)]
struct Queue {
    pending: Vec<TileHandle>,
    shutdown: bool,
}

#[derive(Default)]
struct WorkQueue {
    queue: Mutex<Queue>,
    available: Condvar,
}

impl WorkQueue {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until a tile is pending, then take the one with the highest priority.
    ///
    /// Priorities are read at the moment of choosing, so changes made by the
    /// main thread after `enqueue` still count.
    fn next(&self) -> Option<TileHandle> {
        let mut queue = self.lock();
        loop {
            if queue.shutdown {
                return None;
            }
            queue.pending.retain(|handle| !handle.is_canceled());
            let best = queue
                .pending
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.priority().total_cmp(&b.priority()))
                .map(|(index, _)| index);
            if let Some(index) = best {
                return Some(queue.pending.swap_remove(index));
            }
            queue = self
                .available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Everything a worker thread needs to turn a tile id into meshes
struct Pipeline {
    source: Arc<dyn TileSource>,
    styles: Vec<Arc<dyn Style>>,
    projection: Arc<dyn MapProjection>,
    extrusion_enabled: bool,
}

impl Pipeline {
    /// Run one tile through `none -> loading -> processing`.
    ///
    /// Returns `None` when the tile was canceled along the way; whatever was
    /// built for it is dropped here and never reaches the tile.
    fn process(&self, handle: TileHandle) -> Option<TileResult> {
        if handle.set_state(TileState::Loading).is_err() {
            return None;
        }

        let data = match self.source.load(handle.id()) {
            Ok(data) => data,
            Err(error) => {
                log::warn!("failed to load tile {}: {}", handle.id(), error);
                handle.cancel();
                return Some(TileResult::Failed { handle, error });
            }
        };

        if handle.set_state(TileState::Processing).is_err() {
            log::debug!("tile {} abandoned after loading", handle.id());
            return None;
        }

        let (min, max) = self.projection.tile_bounds(handle.id());
        let context = TileContext::new(handle.id(), (max.x - min.x) as f32, self.extrusion_enabled);

        let mut meshes = Vec::with_capacity(self.styles.len());
        for style in &self.styles {
            if handle.is_canceled() {
                log::debug!("tile {} abandoned while processing", handle.id());
                return None;
            }
            match style.build(&context, &data) {
                Ok(Some(mesh)) => meshes.push((style.name().to_string(), mesh)),
                Ok(None) => {}
                Err(e) => log::warn!("style {} failed on tile {}: {}", style.name(), handle.id(), e),
            }
        }

        if handle.is_canceled() {
            return None;
        }
        Some(TileResult::Built { handle, meshes })
    }
}

/// Pool of threads that load and build tiles in priority order.
///
/// Results are collected on the main thread with `poll`; the worker never
/// touches a `Tile` itself, only the shared state behind its `TileHandle`.
pub struct TileWorker {
    work: Arc<WorkQueue>,
    results: Receiver<TileResult>,
    threads: Vec<JoinHandle<()>>,
}

impl TileWorker {
    pub fn new(
        source: Arc<dyn TileSource>,
        styles: Vec<Arc<dyn Style>>,
        projection: Arc<dyn MapProjection>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let work = Arc::new(WorkQueue::default());
        let (tx, results) = unbounded();
        let pipeline = Arc::new(Pipeline {
            source,
            styles,
            projection,
            extrusion_enabled: config.extrusion_enabled,
        });

        let count = config.worker_threads.max(1);
        let mut threads = Vec::with_capacity(count);
        for index in 0..count {
            let work = work.clone();
            let pipeline = pipeline.clone();
            let tx: Sender<TileResult> = tx.clone();
            let thread = thread::Builder::new()
                .name(format!("tile-worker-{}", index))
                .spawn(move || {
                    while let Some(handle) = work.next() {
                        if let Some(result) = pipeline.process(handle) {
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    }
                    log::debug!("tile worker {} exiting", index);
                })?;
            threads.push(thread);
        }
        log::info!("started {} tile worker threads", count);

        Ok(Self {
            work,
            results,
            threads,
        })
    }

    /// Queue a tile for loading. Canceled tiles are dropped when a worker next looks.
    pub fn enqueue(&self, handle: TileHandle) -> Result<()> {
        let mut queue = self.work.lock();
        if queue.shutdown {
            return Err(Error::WorkerShutdown);
        }
        if !queue.pending.iter().any(|pending| pending.same_tile(&handle)) {
            queue.pending.push(handle);
        }
        drop(queue);
        self.work.available.notify_one();
        Ok(())
    }

    /// Tiles queued and not yet picked up by a worker
    pub fn pending(&self) -> usize {
        self.work.lock().pending.len()
    }

    /// Drain every finished result without blocking.
    pub fn poll(&self) -> Vec<TileResult> {
        self.results.try_iter().collect()
    }

    /// Wait up to `timeout` for the next finished result.
    pub fn wait(&self, timeout: Duration) -> Option<TileResult> {
        self.results.recv_timeout(timeout).ok()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Drop for TileWorker {
    fn drop(&mut self) {
        self.work.lock().shutdown = true;
        self.work.available.notify_all();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
        log::info!("tile workers stopped");
    }
}
