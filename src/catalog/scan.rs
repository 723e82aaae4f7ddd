use std::io;
use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::ItemKey;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{CatalogError, Track, DEFAULT_BITRATE_BPS};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn make_display(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => title.to_string(),
    }
}

/// Probe the encoded bitrate (bits/sec) and the display label for one file.
///
/// Probe failures are not surfaced: an unreadable or untagged file still
/// streams, it just gets paced at [`DEFAULT_BITRATE_BPS`] and labelled by
/// its file stem.
fn probe(path: &Path) -> (u32, String) {
    let default_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut title = default_title;
    let mut artist: Option<String> = None;
    let mut bitrate_bps = DEFAULT_BITRATE_BPS;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            match tagged.properties().audio_bitrate() {
                Some(kbps) if kbps > 0 => bitrate_bps = kbps.saturating_mul(1000),
                _ => debug!("no bitrate metadata for {path:?}, assuming {DEFAULT_BITRATE_BPS} bps"),
            }

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
                    if !v.trim().is_empty() {
                        title = v.to_string();
                    }
                }
                if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
                    let v = v.trim();
                    if !v.is_empty() {
                        artist = Some(v.to_string());
                    }
                }
            }
        }
        Err(e) => debug!("metadata probe failed for {path:?}: {e}"),
    }

    (bitrate_bps, make_display(&title, artist.as_deref()))
}

/// Walk `dir` and build the playlist.
///
/// Returns [`CatalogError`] only when the root directory itself cannot be
/// read; unreadable entries below it are skipped. Tracks come back in
/// filesystem-enumeration order -- the station plays them as the disk lists
/// them, no sorting.
pub fn load(dir: &Path, settings: &LibrarySettings) -> Result<Vec<Track>, CatalogError> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                // Depth 0 is the root itself; anything else is a child we can live without.
                if err.depth() == 0 {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("directory walk failed"));
                    return Err(CatalogError::Unreadable {
                        path: dir.to_path_buf(),
                        source,
                    });
                }
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };

        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            let (bitrate_bps, display) = probe(path);
            tracks.push(Track {
                path: path.to_path_buf(),
                bitrate_bps,
                display,
            });
        }
    }

    Ok(tracks)
}
