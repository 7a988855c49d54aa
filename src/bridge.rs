//! Line protocol spoken with the Wi-Fi bridge module over UART.
//!
//! ```text
//!   → CMD <query>\n          one playback command, e.g. `CMD volume&volume=+1`
//!   → STATE?\n               request the player state
//!   ← <13 tab-separated fields>\n
//!   ← OFFLINE\n              bridge has no route to the media service
//! ```
//!
//! State line fields, in order: status, title, artist, album, trackType,
//! samplerate, bitdepth, seek (ms), duration (s), random, repeat,
//! repeatSingle, volume.  Booleans are `true`/`false` (or `1`/`0`).  An
//! empty numeric field reads as 0, the way live streams report no
//! duration; an empty volume means the player has no volume control.

use core::fmt::Write;

use embedded_io_async::BufRead;
use heapless::{String, Vec};

use crate::command::{PlaybackCommand, COMMAND_QUERY_LEN};
use crate::config::BRIDGE_MAX_FRAME_LEN;
use crate::error::Error;
use crate::text::truncated;
use crate::track::TrackSnapshot;

pub const POLL_REQUEST: &[u8] = b"STATE?\n";

pub const COMMAND_FRAME_LEN: usize = COMMAND_QUERY_LEN + 5;

/// `CMD ` + query + `\n`.
pub type CommandFrame = String<COMMAND_FRAME_LEN>;

pub fn command_frame(command: &PlaybackCommand) -> CommandFrame {
    let mut frame = CommandFrame::new();
    let _ = writeln!(frame, "CMD {}", command.query());
    frame
}

/// Decode one state line (without or with its trailing newline).
pub fn parse_state_line(line: &str) -> Result<TrackSnapshot, Error> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == "OFFLINE" {
        return Err(Error::LinkDown);
    }
    let mut fields = line.split('\t');
    let mut next = || fields.next().ok_or(Error::MalformedFrame);

    let snapshot = TrackSnapshot {
        status: truncated(next()?),
        title: truncated(next()?),
        artist: truncated(next()?),
        album: truncated(next()?),
        track_type: truncated(next()?),
        sample_rate: truncated(next()?),
        bit_depth: truncated(next()?),
        seek_ms: parse_number(next()?)?,
        duration_ms: parse_number(next()?)?.saturating_mul(1000),
        random: parse_flag(next()?)?,
        repeat: parse_flag(next()?)?,
        repeat_single: parse_flag(next()?)?,
        volume: parse_volume(next()?)?,
    };

    if fields.next().is_some() {
        return Err(Error::MalformedFrame);
    }
    Ok(snapshot)
}

fn parse_number(field: &str) -> Result<u32, Error> {
    if field.is_empty() {
        return Ok(0);
    }
    field.parse().map_err(|_| Error::MalformedFrame)
}

fn parse_volume(field: &str) -> Result<Option<i32>, Error> {
    if field.is_empty() {
        return Ok(None);
    }
    field.parse().map(Some).map_err(|_| Error::MalformedFrame)
}

fn parse_flag(field: &str) -> Result<bool, Error> {
    match field {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(Error::MalformedFrame),
    }
}

/// Accumulates received bytes until a full line is in.
pub struct LineReader<const N: usize = BRIDGE_MAX_FRAME_LEN> {
    buf: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> LineReader<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed received bytes. Returns how many were consumed and whether a
    /// line is complete; bytes after the newline are left to the caller.
    pub fn push(&mut self, bytes: &[u8]) -> (usize, bool) {
        for (i, &byte) in bytes.iter().enumerate() {
            if byte == b'\n' {
                return (i + 1, true);
            }
            if self.buf.push(byte).is_err() {
                self.overflowed = true;
            }
        }
        (bytes.len(), false)
    }

    /// The completed line, without its newline.
    pub fn line(&self) -> Result<&str, Error> {
        if self.overflowed {
            return Err(Error::FrameTooLong);
        }
        core::str::from_utf8(&self.buf).map_err(|_| Error::MalformedFrame)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

impl<const N: usize> Default for LineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed `reader` from `rx` until it holds a complete line.
///
/// Whole buffered chunks are handed over at once. Bytes after the newline
/// are left unconsumed in `rx`. End of input before a newline is
/// [`Error::LinkDown`].
pub async fn read_line<R: BufRead, const N: usize>(
    rx: &mut R,
    reader: &mut LineReader<N>,
) -> Result<(), Error> {
    loop {
        let chunk = rx.fill_buf().await.map_err(|_| Error::Uart)?;
        if chunk.is_empty() {
            return Err(Error::LinkDown);
        }
        let (used, done) = reader.push(chunk);
        rx.consume(used);
        if done {
            return Ok(());
        }
    }
}
