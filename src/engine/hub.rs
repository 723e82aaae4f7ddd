//! Fan-out of the single paced stream to every connected listener.
//!
//! Each listener gets a bounded channel; the engine thread `try_send`s each
//! chunk into all of them. A listener that cannot keep up (buffer full) or
//! whose transport side has gone away (receiver dropped) is removed on the
//! spot -- that is this hub's write-failure policy. Removal of one sink
//! never delays or affects delivery to the others.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use tracing::info;

use super::types::{Chunk, ClientId};

pub struct Hub {
    clients: Mutex<HashMap<ClientId, SyncSender<Chunk>>>,
    next_id: AtomicU64,
    buffer_chunks: usize,
}

impl Hub {
    pub fn new(buffer_chunks: usize) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            buffer_chunks: buffer_chunks.max(1),
        }
    }

    /// Register a new listener sink.
    ///
    /// The returned receiver sees every chunk broadcast after this call and
    /// nothing broadcast before it; joining mid-stream means joining live.
    pub fn add_client(&self) -> (ClientId, Receiver<Chunk>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = sync_channel(self.buffer_chunks);
        self.clients.lock().unwrap().insert(id, tx);
        (id, rx)
    }

    /// Remove a listener sink. Idempotent; unknown ids are a no-op.
    pub fn remove_client(&self, id: ClientId) {
        self.clients.lock().unwrap().remove(&id);
    }

    /// Drop every registered sink, disconnecting all receivers.
    ///
    /// Called on engine shutdown so a transport thread blocked on its sink
    /// wakes up and finishes its response instead of hanging forever.
    pub fn close_all(&self) {
        let mut clients = self.clients.lock().unwrap();
        if !clients.is_empty() {
            info!("closing {} listener sink(s)", clients.len());
        }
        clients.clear();
    }

    /// Deliver `chunk` to every registered sink without blocking.
    pub fn broadcast(&self, chunk: &Chunk) {
        let mut clients = self.clients.lock().unwrap();
        clients.retain(|id, tx| match tx.try_send(Chunk::clone(chunk)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                info!("dropping listener {id}: sink buffer full");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                info!("dropping listener {id}: sink closed");
                false
            }
        });
    }

    /// Current listener count.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
