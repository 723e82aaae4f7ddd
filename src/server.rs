//! Thin HTTP transport for the broadcast engine.
//!
//! One blocking accept loop, one thread per connection. A `GET` on the
//! configured mount registers a hub client and pumps its sink to the socket
//! as a chunked `audio/mpeg` response until either side gives up; `GET /`
//! answers a one-line status. Everything with any actual logic lives in the
//! engine -- this file only moves bytes and always calls `disconnect` on the
//! way out.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ServerSettings;
use crate::engine::Player;

pub fn serve(listener: TcpListener, player: Arc<Player>, settings: ServerSettings) -> io::Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let player = Arc::clone(&player);
                let settings = settings.clone();
                thread::spawn(move || handle_connection(stream, &player, &settings));
            }
            Err(e) => {
                warn!("accept error: {e}");
            }
        }
    }
    Ok(())
}

/// Extract the method and path from an HTTP request line.
fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    parts.next()?; // HTTP version must at least be present
    Some((method, path))
}

fn handle_connection(stream: TcpStream, player: &Player, settings: &ServerSettings) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    // A client that connects and never sends a request must not pin this
    // thread; the timeout covers the request line and header drain below.
    let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
    if let Err(e) = stream.set_read_timeout(Some(timeout)) {
        warn!("cannot set read timeout for {peer}: {e}");
        return;
    }

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot clone socket for {peer}: {e}");
            return;
        }
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Drain the remaining headers; we do not use any of them.
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let Some((method, path)) = parse_request_line(&request_line) else {
        let _ = respond_plain(&stream, "400 Bad Request", "malformed request\n");
        return;
    };

    if method != "GET" {
        let _ = respond_plain(&stream, "405 Method Not Allowed", "GET only\n");
        return;
    }

    if path == settings.mount {
        stream_to_listener(stream, player, &peer);
    } else if path == "/" {
        let _ = respond_plain(&stream, "200 OK", &status_line(player));
    } else {
        debug!("404 for {path} from {peer}");
        let _ = respond_plain(&stream, "404 Not Found", "not found\n");
    }
}

fn status_line(player: &Player) -> String {
    let info = player
        .playback_handle()
        .lock()
        .map(|i| i.clone())
        .unwrap_or_default();
    let now_playing = match (&info.display, info.playing) {
        (Some(d), true) => format!("now playing: {d}"),
        (Some(d), false) => format!("paused on: {d}"),
        (None, _) => "idle".to_string(),
    };
    format!("aircast: {} listeners, {now_playing}\n", player.listeners())
}

fn respond_plain(mut stream: &TcpStream, status: &str, body: &str) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}

/// Register with the hub and relay the sink to the socket until the listener
/// disconnects, its write fails, or the hub drops it for lagging.
fn stream_to_listener(mut stream: TcpStream, player: &Player, peer: &str) {
    let (id, rx) = player.subscribe();
    info!("listener {id} connected from {peer}");

    let result: io::Result<()> = (|| {
        write!(
            stream,
            "HTTP/1.1 200 OK\r\n\
             Content-Type: audio/mpeg\r\n\
             Transfer-Encoding: chunked\r\n\
             Cache-Control: no-cache\r\n\
             Connection: close\r\n\r\n"
        )?;
        stream.flush()?;

        // recv() blocks until the engine broadcasts; an Err means the hub
        // removed this sink (lagging listener) or the engine shut down.
        while let Ok(chunk) = rx.recv() {
            write!(stream, "{:x}\r\n", chunk.len())?;
            stream.write_all(&chunk)?;
            stream.write_all(b"\r\n")?;
            stream.flush()?;
        }
        stream.write_all(b"0\r\n\r\n")
    })();

    player.disconnect(id);
    match result {
        Ok(()) => info!("listener {id} disconnected"),
        Err(e) => info!("listener {id} dropped: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;
    use std::net::TcpStream;
    use std::time::Duration;

    use tempfile::tempdir;

    use crate::catalog::Track;
    use crate::config::StreamSettings;

    use super::*;

    #[test]
    fn parse_request_line_extracts_method_and_path() {
        assert_eq!(
            parse_request_line("GET /stream HTTP/1.1\r\n"),
            Some(("GET", "/stream"))
        );
        assert_eq!(
            parse_request_line("POST / HTTP/1.0"),
            Some(("POST", "/"))
        );
        assert_eq!(parse_request_line("GET /stream"), None);
        assert_eq!(parse_request_line(""), None);
    }

    fn spawn_station(
        bytes: &[u8],
        server_settings: ServerSettings,
    ) -> (std::net::SocketAddr, Arc<Player>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, bytes).unwrap();

        let tracks = vec![Track {
            path,
            bitrate_bps: 320_000,
            display: "a".to_string(),
        }];
        let player = Arc::new(Player::new(
            tracks,
            &StreamSettings {
                chunk_bytes: 64,
                client_buffer_chunks: 256,
                autoplay: false,
            },
        ));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let serve_player = Arc::clone(&player);
        thread::spawn(move || {
            let _ = serve(listener, serve_player, server_settings);
        });
        (addr, player, dir)
    }

    #[test]
    fn status_endpoint_reports_idle_station() {
        let (addr, _player, _dir) = spawn_station(&[1u8; 1000], ServerSettings::default());

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n").unwrap();
        let mut response = String::new();
        conn.read_to_string(&mut response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("idle"));
        assert!(response.contains("0 listeners"));
    }

    #[test]
    fn unknown_path_is_a_404() {
        let (addr, _player, _dir) = spawn_station(&[1u8; 1000], ServerSettings::default());

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.write_all(b"GET /nope HTTP/1.1\r\nHost: test\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        conn.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn stream_mount_serves_chunked_audio() {
        let (addr, player, _dir) = spawn_station(&[7u8; 40_000], ServerSettings::default());
        player.play();

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        conn.write_all(b"GET /stream HTTP/1.1\r\nHost: test\r\n\r\n")
            .unwrap();

        // Read enough to cover the response head plus some audio chunks.
        let mut buf = vec![0u8; 2048];
        let mut filled = 0;
        while filled < buf.len() {
            match conn.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => panic!("read failed after {filled} bytes: {e}"),
            }
        }
        let head = String::from_utf8_lossy(&buf[..filled.min(256)]);
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Type: audio/mpeg"));
        assert!(head.contains("Transfer-Encoding: chunked"));
        // The payload bytes are the track's fill value.
        assert!(buf[..filled].contains(&7u8));
        player.quit();
    }

    #[test]
    fn engine_shutdown_ends_the_stream_response() {
        let (addr, player, _dir) = spawn_station(&[7u8; 40_000], ServerSettings::default());
        player.play();

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        conn.write_all(b"GET /stream HTTP/1.1\r\nHost: test\r\n\r\n")
            .unwrap();

        // Wait for some audio to arrive, then stop the engine.
        let mut buf = [0u8; 512];
        let n = conn.read(&mut buf).unwrap();
        assert!(n > 0);
        player.quit();

        // The writer must see its sink close, send the chunked terminator
        // and hang up rather than blocking on a dead channel.
        let mut rest = Vec::new();
        conn.read_to_end(&mut rest).unwrap();
        assert!(
            rest.ends_with(b"0\r\n\r\n"),
            "response did not end with the chunked terminator"
        );
    }

    #[test]
    fn silent_connection_is_dropped_after_the_request_timeout() {
        let settings = ServerSettings {
            request_timeout_secs: 1,
            ..ServerSettings::default()
        };
        let (addr, _player, _dir) = spawn_station(&[1u8; 1000], settings);

        let mut conn = TcpStream::connect(addr).unwrap();
        conn.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        // Send nothing; the server must hang up on its own.
        let mut buf = [0u8; 16];
        let n = conn.read(&mut buf).unwrap();
        assert_eq!(n, 0, "server kept a silent connection open");
    }
}
