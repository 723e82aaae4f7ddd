use serde::Deserialize;

/// Top-level station settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/aircast/config.toml` or `~/.config/aircast/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `AIRCAST__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub stream: StreamSettings,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library: LibrarySettings::default(),
            stream: StreamSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Size of one broadcast chunk in bytes.
    ///
    /// Smaller chunks mean finer pacing and lower join latency, at the cost
    /// of more per-chunk overhead.
    pub chunk_bytes: usize,
    /// How many chunks a listener may fall behind before it is dropped.
    pub client_buffer_chunks: usize,
    /// Whether playback starts as soon as the process comes up.
    pub autoplay: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_bytes: 4096,
            client_buffer_chunks: 64,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP listener binds to.
    pub bind: String,
    /// Path listeners request to join the stream.
    pub mount: String,
    /// How long a new connection may take to send its request head before
    /// it is dropped.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            mount: "/stream".to_string(),
            request_timeout_secs: 10,
        }
    }
}
