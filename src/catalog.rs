//! Track catalog: enumerate playable files and probe their bitrates.
//!
//! Loaded once at startup; the engine never touches the filesystem layout
//! afterwards, it only opens the files the catalog handed it.

mod model;
mod scan;

pub use model::{CatalogError, Track, DEFAULT_BITRATE_BPS};
pub use scan::load;

#[cfg(test)]
mod tests;
