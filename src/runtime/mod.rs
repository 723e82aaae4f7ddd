use std::env;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::catalog;
use crate::engine::Player;
use crate::server;

mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let dir = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    // A station with nothing to play is a configuration error, not a
    // degraded mode: fail loudly at startup.
    let tracks = catalog::load(Path::new(&dir), &settings.library)?;
    if tracks.is_empty() {
        return Err(format!("no playable tracks found under {dir}").into());
    }
    info!("loaded {} tracks from {dir}", tracks.len());

    let player = Arc::new(Player::new(tracks, &settings.stream));
    if settings.stream.autoplay {
        player.play();
    }

    let listener = TcpListener::bind(&settings.server.bind)?;
    info!(
        "streaming on http://{}{}",
        settings.server.bind, settings.server.mount
    );
    server::serve(listener, player, settings.server.clone())?;
    Ok(())
}
