//! The engine thread: playlist cursor, current session and track-advance
//! state machine.
//!
//! The thread multiplexes two things on one command channel: control
//! commands from the transport/operator side, and the pacer's emission
//! schedule (via `recv_timeout` deadlines). Between chunks it is always
//! parked on the channel, so listener churn never waits on playback.

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::catalog::Track;

use super::hub::Hub;
use super::pacer::Pacer;
use super::types::{EngineCmd, PlaybackHandle};

/// How long the engine waits on its command channel when nothing is playing.
const IDLE_TICK: Duration = Duration::from_millis(200);

/// The currently playing track: its open byte source plus the pacer bound to
/// it. Replaced wholesale on every track advance; pausing keeps it alive so
/// resume continues from the frozen byte offset.
struct Session {
    index: usize,
    source: BufReader<File>,
    pacer: Pacer,
}

enum ReadOutcome {
    Emitted,
    EndOfTrack(usize),
    SourceError(usize, io::Error),
}

pub(super) fn spawn_engine_thread(
    tracks: Vec<Track>,
    rx: Receiver<EngineCmd>,
    hub: Arc<Hub>,
    playback_info: PlaybackHandle,
    chunk_bytes: usize,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut engine = EngineLoop {
            tracks,
            cursor: None,
            session: None,
            playing: false,
            hub,
            playback_info,
            chunk_bytes,
        };
        engine.run(rx);
    })
}

struct EngineLoop {
    tracks: Vec<Track>,
    /// Index of the last track started, `None` before the first play.
    cursor: Option<usize>,
    session: Option<Session>,
    playing: bool,
    hub: Arc<Hub>,
    playback_info: PlaybackHandle,
    chunk_bytes: usize,
}

impl EngineLoop {
    fn run(&mut self, rx: Receiver<EngineCmd>) {
        loop {
            let wait = match (&self.session, self.playing) {
                (Some(session), true) => session.pacer.until_due(),
                _ => IDLE_TICK,
            };

            match rx.recv_timeout(wait) {
                Ok(EngineCmd::Play) => self.handle_play(),
                Ok(EngineCmd::Pause) => self.handle_pause(),
                Ok(EngineCmd::Resume) => self.handle_resume(),
                Ok(EngineCmd::Skip) => self.handle_skip(),
                Ok(EngineCmd::Quit) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if self.playing {
                        self.emit_due_chunk();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.playing = false;
        self.publish();
        // Dropping the sinks disconnects every receiver, so transport
        // threads parked on them unwind instead of hanging.
        self.hub.close_all();
    }

    /// Index of the track that plays next: one past the cursor, wrapping to
    /// the start. The playlist never ends.
    fn next_index(&self) -> usize {
        match self.cursor {
            Some(i) => (i + 1) % self.tracks.len(),
            None => 0,
        }
    }

    /// Advance the playlist and open the next track.
    ///
    /// A track that fails to open is logged and skipped; each track is tried
    /// at most once per call, so a playlist where every file is broken parks
    /// the engine idle instead of spinning (a later `Play` retries).
    fn advance(&mut self) {
        self.session = None;

        if self.tracks.is_empty() {
            self.playing = false;
            self.publish();
            return;
        }

        for _ in 0..self.tracks.len() {
            let index = self.next_index();
            self.cursor = Some(index);
            let track = &self.tracks[index];

            match File::open(&track.path) {
                Ok(file) => {
                    info!(
                        "track start [{index}] {} ({} bps)",
                        track.display, track.bitrate_bps
                    );
                    self.session = Some(Session {
                        index,
                        source: BufReader::new(file),
                        pacer: Pacer::new(track.bitrate_bps, self.chunk_bytes),
                    });
                    self.playing = true;
                    self.publish();
                    return;
                }
                Err(e) => {
                    error!("cannot open {:?}: {e}; skipping", track.path);
                }
            }
        }

        error!("no readable tracks in playlist; going idle");
        self.playing = false;
        self.publish();
    }

    /// Emit the due chunk, or advance the playlist when the track ends or
    /// the source errors out. Either way the broadcast keeps flowing.
    fn emit_due_chunk(&mut self) {
        let outcome = {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            match session.pacer.read_chunk(&mut session.source) {
                Ok(Some(chunk)) => {
                    self.hub.broadcast(&chunk);
                    session.pacer.mark_emitted(chunk.len());
                    ReadOutcome::Emitted
                }
                Ok(None) => ReadOutcome::EndOfTrack(session.index),
                Err(e) => ReadOutcome::SourceError(session.index, e),
            }
        };

        match outcome {
            ReadOutcome::Emitted => {}
            ReadOutcome::EndOfTrack(index) => {
                debug!("end of track [{index}]");
                self.advance();
            }
            ReadOutcome::SourceError(index, e) => {
                // A corrupt file must not stop the stream for connected
                // listeners; treat it exactly like a finished track.
                error!("read error on track [{index}]: {e}; advancing");
                self.advance();
            }
        }
    }

    fn handle_play(&mut self) {
        if self.session.is_none() {
            self.advance();
        } else if !self.playing {
            // Play on a paused session is a resume, never an advance.
            self.handle_resume();
        }
    }

    fn handle_pause(&mut self) {
        if self.session.is_some() && self.playing {
            self.playing = false;
            self.publish();
            info!("playback paused");
        }
    }

    fn handle_resume(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if !self.playing {
                // Continue from the frozen byte offset; rebase so the pause
                // gap is not "made up for" with a burst.
                session.pacer.rebase();
                self.playing = true;
                self.publish();
                info!("playback resumed");
            }
        }
    }

    fn handle_skip(&mut self) {
        if !self.tracks.is_empty() {
            debug!("skip requested");
            self.advance();
        }
    }

    fn publish(&self) {
        if let Ok(mut info) = self.playback_info.lock() {
            info.index = self.session.as_ref().map(|s| s.index);
            info.display = self
                .session
                .as_ref()
                .map(|s| self.tracks[s.index].display.clone());
            info.playing = self.playing;
        }
    }
}
