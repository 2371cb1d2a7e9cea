use std::{
    sync::{
        mpsc::{self, Receiver, SyncSender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, error, info};

use super::{LevelRecord, LevelStore};
use crate::{Error, Result};

/// Bounded queue of records drained by a fixed pool of writer threads.
///
/// [`SaveQueue::enqueue`] blocks only while the queue is full. Nothing is
/// durable until [`SaveQueue::finish`] has returned. A worker stops at its
/// first failed save; that error is returned once, by whichever of
/// `enqueue` or `finish` observes it first.
pub struct SaveQueue {
    sender: Option<SyncSender<LevelRecord>>,
    workers: Vec<JoinHandle<usize>>,
    failure: Arc<Mutex<Option<Error>>>,
}

impl SaveQueue {
    pub fn new(store: Arc<dyn LevelStore>, workers: usize, depth: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(depth);
        let receiver = Arc::new(Mutex::new(receiver));
        let failure = Arc::new(Mutex::new(None));

        let workers = (0 .. workers.max(1))
            .map(|idx| {
                let store = store.clone();
                let receiver = receiver.clone();
                let failure = failure.clone();
                thread::spawn(move || {
                    let (saved, result) = Self::work(store.as_ref(), &receiver);
                    if let Err(e) = result {
                        error!("Save worker {idx} failed: {e}");
                        if let Ok(mut slot) = failure.lock() {
                            slot.get_or_insert(e);
                        }
                    }
                    debug!("Save worker {idx} wrote {saved} levels");
                    saved
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
            failure,
        }
    }

    fn work(
        store: &dyn LevelStore,
        receiver: &Mutex<Receiver<LevelRecord>>,
    ) -> (usize, Result<()>) {
        let mut saved = 0;
        loop {
            let record = {
                let Ok(receiver) = receiver.lock() else {
                    return (saved, Err(Error::Poisoned));
                };
                match receiver.recv() {
                    Ok(record) => record,
                    Err(_) => return (saved, Ok(())),
                }
            };
            if let Err(e) = store.save(&record) {
                return (saved, Err(e));
            }
            saved += 1;
        }
    }

    fn take_failure(&self) -> Option<Error> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Fails once every worker has stopped, with the error that stopped the
    /// first of them.
    pub fn enqueue(&self, record: LevelRecord) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::StoreClosed)?;
        sender
            .send(record)
            .map_err(|_| self.take_failure().unwrap_or(Error::StoreClosed))
    }

    /// Closes the queue and waits until every worker has drained it. Returns
    /// the number of records written, or the first worker error.
    pub fn finish(mut self) -> Result<usize> {
        self.sender.take();

        let mut saved = 0;
        let mut panicked = false;
        for worker in self.workers.drain(..) {
            match worker.join() {
                Ok(count) => saved += count,
                Err(_) => panicked = true,
            }
        }

        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        if panicked {
            return Err(Error::StoreWorker("worker panicked".into()));
        }

        info!("Saved {saved} levels");
        Ok(saved)
    }
}

impl Drop for SaveQueue {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
