//! Real-time pacing of a byte source.
//!
//! A track of `N` bytes encoded at `B` bits/sec should take about `8N/B`
//! seconds of wall clock to broadcast; otherwise the station would read
//! ahead of the signal and late joiners would land in the wrong place.
//! The pacer does not sleep itself -- it tells the engine thread how long
//! until the next chunk is due, and the thread waits on its command channel
//! for that long. Commands therefore interleave between chunks.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use super::types::Chunk;

pub struct Pacer {
    chunk_bytes: usize,
    /// Real-time playback duration of one full chunk at the track bitrate.
    chunk_duration: Duration,
    /// Monotonic emission schedule; advanced by each chunk's playback time
    /// per emit so rounding never accumulates drift.
    next_due: Instant,
}

impl Pacer {
    pub fn new(bitrate_bps: u32, chunk_bytes: usize) -> Self {
        let bitrate_bps = bitrate_bps.max(1);
        let chunk_bytes = chunk_bytes.max(1);
        let chunk_duration =
            Duration::from_secs_f64(chunk_bytes as f64 * 8.0 / f64::from(bitrate_bps));
        Self {
            chunk_bytes,
            chunk_duration,
            next_due: Instant::now(),
        }
    }

    /// Read the next chunk from `source`.
    ///
    /// `Ok(None)` means the source is exhausted (end of track). The final
    /// chunk may be short. An `Err` is a source error; the caller decides
    /// what to do with the track.
    pub fn read_chunk<R: Read>(&self, source: &mut R) -> io::Result<Option<Chunk>> {
        let mut buf = vec![0u8; self.chunk_bytes];
        let mut filled = 0;
        while filled < buf.len() {
            match source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf.into()))
    }

    /// Time remaining before the next chunk may be emitted. Zero when due.
    pub fn until_due(&self) -> Duration {
        self.next_due.saturating_duration_since(Instant::now())
    }

    /// Advance the schedule by the emitted chunk's playback time.
    ///
    /// A short final chunk advances by its proportional share of a full
    /// chunk duration, so track ends do not over-wait.
    pub fn mark_emitted(&mut self, bytes: usize) {
        let share = bytes.min(self.chunk_bytes) as f64 / self.chunk_bytes as f64;
        self.next_due += self.chunk_duration.mul_f64(share);
    }

    /// Reset the schedule to "due now".
    ///
    /// Called on resume so time spent paused never turns into a catch-up
    /// burst of chunks.
    pub fn rebase(&mut self) {
        self.next_due = Instant::now();
    }

    pub fn chunk_duration(&self) -> Duration {
        self.chunk_duration
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn read_chunk_fills_whole_chunks_then_a_short_tail() {
        let data: Vec<u8> = (0..10u8).collect();
        let mut src = Cursor::new(data.clone());
        let pacer = Pacer::new(128_000, 4);

        let a = pacer.read_chunk(&mut src).unwrap().unwrap();
        let b = pacer.read_chunk(&mut src).unwrap().unwrap();
        let c = pacer.read_chunk(&mut src).unwrap().unwrap();
        assert_eq!(&a[..], &data[0..4]);
        assert_eq!(&b[..], &data[4..8]);
        assert_eq!(&c[..], &data[8..10]);
        assert!(pacer.read_chunk(&mut src).unwrap().is_none());
    }

    #[test]
    fn read_chunk_none_on_empty_source() {
        let mut src = Cursor::new(Vec::<u8>::new());
        let pacer = Pacer::new(128_000, 4096);
        assert!(pacer.read_chunk(&mut src).unwrap().is_none());
    }

    #[test]
    fn chunk_duration_matches_real_time_playback() {
        // 4096 bytes at 128 kbps = 32768 bits / 128000 bits per sec = 256 ms.
        let pacer = Pacer::new(128_000, 4096);
        assert_eq!(pacer.chunk_duration(), Duration::from_millis(256));
    }

    #[test]
    fn schedule_advances_per_emitted_chunk() {
        let mut pacer = Pacer::new(128_000, 4096);
        pacer.rebase();
        assert_eq!(pacer.until_due(), Duration::ZERO);

        pacer.mark_emitted(4096);
        let wait = pacer.until_due();
        assert!(wait > Duration::from_millis(128));
        assert!(wait <= Duration::from_millis(256));
    }

    #[test]
    fn short_final_chunk_advances_the_schedule_proportionally() {
        let mut pacer = Pacer::new(128_000, 4096);
        pacer.rebase();
        // Half a full chunk at 256 ms per chunk is due again after 128 ms.
        pacer.mark_emitted(2048);
        let wait = pacer.until_due();
        assert!(wait > Duration::from_millis(64));
        assert!(wait <= Duration::from_millis(128));
    }

    #[test]
    fn rebase_makes_next_chunk_due_immediately() {
        let mut pacer = Pacer::new(64_000, 4096);
        pacer.mark_emitted(4096);
        pacer.mark_emitted(4096);
        assert!(pacer.until_due() > Duration::ZERO);
        pacer.rebase();
        assert_eq!(pacer.until_due(), Duration::ZERO);
    }
}
