use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Bitrate assumed when metadata probing fails or reports nothing.
pub const DEFAULT_BITRATE_BPS: u32 = 128_000;

/// One playable audio file plus the bitrate it should be paced at.
#[derive(Clone, Debug)]
pub struct Track {
    pub path: PathBuf,
    /// Encoded bitrate in bits per second. Always positive; falls back to
    /// [`DEFAULT_BITRATE_BPS`] when the probe cannot tell.
    pub bitrate_bps: u32,
    /// Human-readable label ("Artist - Title" or the file stem), used for
    /// logging and the status line only.
    pub display: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("music directory {path:?} is not readable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
