//! Engine-related small types and handles.
//!
//! This module defines the command enum, the shared chunk type and the
//! playback info handle the transport reads for its status line.

use std::sync::{Arc, Mutex};

/// One broadcast unit. Shared, never mutated after emission, so a single
/// allocation serves every listener.
pub type Chunk = Arc<[u8]>;

/// Unique per-connection listener id handed out by the hub.
pub type ClientId = u64;

#[derive(Debug)]
pub enum EngineCmd {
    /// Start playback: advance to the next track, or resume if paused.
    Play,
    /// Freeze the current track at its byte offset. No-op when not playing.
    Pause,
    /// Continue a paused track. No-op when playing or idle.
    Resume,
    /// Force the next track, same path as a natural end-of-track.
    Skip,
    /// Quit the engine thread.
    Quit,
}

/// Runtime playback information shared with the transport layer.
#[derive(Debug, Clone, Default)]
pub struct PlaybackInfo {
    /// Currently playing track index in the playlist (if any).
    pub index: Option<usize>,
    /// Display label of the current track.
    pub display: Option<String>,
    /// Whether chunks are currently being emitted.
    pub playing: bool,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
