use std::fs;

use tempfile::tempdir;

use super::*;
use crate::config::LibrarySettings;

#[test]
fn load_filters_non_audio_and_keeps_enumeration_order() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("a.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let tracks = load(dir.path(), &LibrarySettings::default()).unwrap();
    assert_eq!(tracks.len(), 2);
    // No sorting guarantee, but both audio files must be present.
    let mut names: Vec<&str> = tracks.iter().map(|t| t.display.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn load_defaults_bitrate_when_probe_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("garbage.mp3"), b"not decodable").unwrap();

    let tracks = load(dir.path(), &LibrarySettings::default()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].bitrate_bps, DEFAULT_BITRATE_BPS);
}

#[test]
fn load_errors_on_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let err = load(&missing, &LibrarySettings::default());
    assert!(matches!(err, Err(CatalogError::Unreadable { .. })));
}

#[test]
fn load_respects_include_hidden_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let tracks = load(dir.path(), &settings).unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].display, "visible");
}

#[test]
fn load_respects_recursive_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let tracks = load(dir.path(), &settings).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].display, "root");
}

#[test]
fn load_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    fs::write(d1.join("one.mp3"), b"not real").unwrap();
    fs::write(d2.join("two.mp3"), b"not real").unwrap();

    // WalkDir depth counts root as 0, children as 1, grandchildren as 2...
    // With max_depth=2 we should see root + d1/*, but not d1/d2/*.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let tracks = load(dir.path(), &settings).unwrap();

    let names: Vec<String> = tracks.iter().map(|t| t.display.clone()).collect();
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"one".to_string()));
    assert!(!names.contains(&"two".to_string()));
}
