//! Level actors.
//!
//! Every level owns one tree and one worker thread. The worker drains a
//! FIFO mailbox of absorb requests, so merges touching the same level run
//! strictly one after another while different levels proceed in parallel.

use super::internal::Shared;
use crate::compute::spatial::rtree::MergeTree;
use crate::error::{LsmError, Result};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use spatio_types::LeafPayload;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Request to absorb a parked tree into a level.
#[derive(Debug)]
pub(crate) struct Absorb {
    /// Key of the parked tree in the hand-off registry
    pub handoff: u64,
    /// Signalled once the request has been processed, successfully or not
    pub ack: Option<Sender<()>>,
}

/// Routine a worker runs for each request.
pub(crate) type AbsorbFn<P> = fn(&Arc<Shared<P>>, &Level<P>, u64) -> Result<()>;

pub(crate) struct Level<P> {
    pub index: usize,
    pub tree: RwLock<MergeTree<P>>,
    sender: Mutex<Option<Sender<Absorb>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<P: LeafPayload> Level<P> {
    /// Create level `index` with an empty tree and start its worker.
    pub fn spawn(shared: &Arc<Shared<P>>, index: usize) -> Result<Arc<Self>> {
        Self::spawn_with(shared, index, Shared::absorb)
    }

    fn spawn_with(
        shared: &Arc<Shared<P>>,
        index: usize,
        absorb: AbsorbFn<P>,
    ) -> Result<Arc<Self>> {
        let (sender, mailbox) = crossbeam_channel::unbounded();
        let level = Arc::new(Self {
            index,
            tree: RwLock::new(MergeTree::with_config(&shared.config)?),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(None),
        });

        let worker = {
            let shared = Arc::clone(shared);
            let level = Arc::clone(&level);
            thread::Builder::new()
                .name(format!("lsm-level-{}", index))
                .spawn(move || run(shared, level, mailbox, absorb))?
        };
        *level.worker.lock() = Some(worker);

        Ok(level)
    }

    pub fn send(&self, task: Absorb) -> Result<()> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).map_err(|_| LsmError::ShutDown),
            None => Err(LsmError::ShutDown),
        }
    }

    pub fn record_count(&self) -> usize {
        self.tree.read().record_count()
    }

    /// Close the mailbox and wait for the worker to drain it.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            log::error!("Worker for level {} exited with a panic", self.index);
        }
    }
}

fn run<P: LeafPayload>(
    shared: Arc<Shared<P>>,
    level: Arc<Level<P>>,
    mailbox: Receiver<Absorb>,
    absorb: AbsorbFn<P>,
) {
    log::debug!("Level {} worker started", level.index);

    for task in mailbox.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            absorb(&shared, &level, task.handoff)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("Absorb into level {} failed: {}", level.index, e);
                shared.tasks.record_failure();
            }
            Err(_) => {
                log::error!("Absorb into level {} panicked; its change is lost", level.index);
                shared.tasks.record_failure();
            }
        }

        if let Some(ack) = task.ack {
            let _ = ack.send(());
        }
        shared.tasks.finish();
    }

    log::debug!("Level {} worker stopped", level.index);
}
