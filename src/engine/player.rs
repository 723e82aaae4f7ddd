use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::catalog::Track;
use crate::config::StreamSettings;

use super::hub::Hub;
use super::thread::spawn_engine_thread;
use super::types::{Chunk, ClientId, EngineCmd, PlaybackHandle, PlaybackInfo};

/// Handle to the broadcast engine.
///
/// Owns the command channel into the engine thread and the hub the transport
/// subscribes listeners to. Constructed once at startup and passed by
/// reference to the transport layer; there are no process-wide globals.
pub struct Player {
    tx: Sender<EngineCmd>,
    hub: Arc<Hub>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn new(tracks: Vec<Track>, stream_settings: &StreamSettings) -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let hub = Arc::new(Hub::new(stream_settings.client_buffer_chunks));
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let engine_handle = spawn_engine_thread(
            tracks,
            rx,
            hub.clone(),
            playback.clone(),
            stream_settings.chunk_bytes,
        );

        Self {
            tx,
            hub,
            playback,
            join: Mutex::new(Some(engine_handle)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    /// Register a listener; it starts receiving from the next broadcast chunk.
    pub fn subscribe(&self) -> (ClientId, Receiver<Chunk>) {
        self.hub.add_client()
    }

    /// Drop a listener. Safe to call for ids already gone.
    pub fn disconnect(&self, id: ClientId) {
        self.hub.remove_client(id);
    }

    pub fn listeners(&self) -> usize {
        self.hub.len()
    }

    pub fn play(&self) {
        let _ = self.tx.send(EngineCmd::Play);
    }

    pub fn pause(&self) {
        let _ = self.tx.send(EngineCmd::Pause);
    }

    pub fn resume(&self) {
        let _ = self.tx.send(EngineCmd::Resume);
    }

    pub fn skip(&self) {
        let _ = self.tx.send(EngineCmd::Skip);
    }

    /// Stop the engine thread and wait for it to exit.
    pub fn quit(&self) {
        let _ = self.tx.send(EngineCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
