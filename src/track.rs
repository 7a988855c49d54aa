//! Track snapshots from the media service and their display model.
//!
//! A snapshot is self-contained: applying one replaces everything the
//! dashboard shows, there is no incremental merge.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::String;

use crate::channel::MessageChannel;
use crate::config::SNAPSHOT_QUEUE_SIZE;
use crate::text::{is_missing, or_dash, truncated};

/// Network → UI snapshot channel.
///
/// The UI drains it completely and applies only the newest value.
pub type SnapshotChannel = MessageChannel<CriticalSectionRawMutex, TrackSnapshot, SNAPSHOT_QUEUE_SIZE>;

pub const SHORT_FIELD_LEN: usize = 16;
pub const LONG_FIELD_LEN: usize = 64;
pub const ARTIST_LINE_LEN: usize = 2 * LONG_FIELD_LEN + 3;
pub const QUALITY_LINE_LEN: usize = 2 * SHORT_FIELD_LEN + 3;
pub const TIME_LINE_LEN: usize = 24;

/// Full player state as reported by one poll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackSnapshot {
    /// `play`, `pause` or `stop`.
    pub status: String<SHORT_FIELD_LEN>,
    pub title: String<LONG_FIELD_LEN>,
    pub artist: String<LONG_FIELD_LEN>,
    pub album: String<LONG_FIELD_LEN>,
    /// Source plugin, e.g. `spotify` or `mp3`.
    pub track_type: String<SHORT_FIELD_LEN>,
    pub sample_rate: String<SHORT_FIELD_LEN>,
    pub bit_depth: String<SHORT_FIELD_LEN>,
    pub seek_ms: u32,
    pub duration_ms: u32,
    pub random: bool,
    pub repeat: bool,
    pub repeat_single: bool,
    /// Service volume 0..=100; `None` when the player does not report one.
    pub volume: Option<i32>,
}

impl TrackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.status.as_str() == "play"
    }
}

/// Where the current track comes from; picks the icon and accent colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerSource {
    Spotify,
    YouTube,
    Tidal,
    AirPlay,
    Other,
}

impl PlayerSource {
    pub fn from_track_type(track_type: &str) -> Self {
        match track_type {
            "spotify" => PlayerSource::Spotify,
            "youtube" => PlayerSource::YouTube,
            "tidal" => PlayerSource::Tidal,
            "airplay" => PlayerSource::AirPlay,
            _ => PlayerSource::Other,
        }
    }

    /// Short tag for the status row.
    pub const fn label(self) -> &'static str {
        match self {
            PlayerSource::Spotify => "SPOT",
            PlayerSource::YouTube => "YT",
            PlayerSource::Tidal => "TIDAL",
            PlayerSource::AirPlay => "AIR",
            PlayerSource::Other => "",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepeatMode {
    Off,
    All,
    One,
}

/// Display-ready text derived from a [`TrackSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String<LONG_FIELD_LEN>,
    /// `artist - album`
    pub artist_line: String<ARTIST_LINE_LEN>,
    /// `samplerate / bitdepth`
    pub quality_line: String<QUALITY_LINE_LEN>,
    pub elapsed_secs: u32,
    pub duration_secs: u32,
    pub is_playing: bool,
    pub random: bool,
    pub repeat: RepeatMode,
    pub source: PlayerSource,
}

impl NowPlaying {
    pub fn from_snapshot(snapshot: &TrackSnapshot) -> Self {
        let mut artist_line = String::new();
        if is_missing(&snapshot.artist) && is_missing(&snapshot.album) {
            let _ = artist_line.push_str("-");
        } else {
            let _ = write!(
                artist_line,
                "{} - {}",
                or_dash(&snapshot.artist),
                or_dash(&snapshot.album)
            );
        }

        let mut quality_line = String::new();
        let _ = write!(
            quality_line,
            "{} / {}",
            or_dash(&snapshot.sample_rate),
            or_dash(&snapshot.bit_depth)
        );

        let repeat = match (snapshot.repeat, snapshot.repeat_single) {
            (false, _) => RepeatMode::Off,
            (true, false) => RepeatMode::All,
            (true, true) => RepeatMode::One,
        };

        Self {
            title: truncated(or_dash(&snapshot.title)),
            artist_line,
            quality_line,
            elapsed_secs: snapshot.seek_ms / 1000,
            duration_secs: snapshot.duration_ms / 1000,
            is_playing: snapshot.is_playing(),
            random: snapshot.random,
            repeat,
            source: PlayerSource::from_track_type(&snapshot.track_type),
        }
    }

    /// Elapsed share of the track, 0..=100. Streams without a duration
    /// report 0.
    pub fn progress_percent(&self) -> u8 {
        if self.duration_secs == 0 {
            return 0;
        }
        let pct = (self.elapsed_secs as u64 * 100) / self.duration_secs as u64;
        pct.min(100) as u8
    }

    /// `m:ss / m:ss`, or just the elapsed time for streams.
    pub fn time_line(&self) -> String<TIME_LINE_LEN> {
        let mut line = String::new();
        let (em, es) = (self.elapsed_secs / 60, self.elapsed_secs % 60);
        if self.duration_secs == 0 {
            let _ = write!(line, "{}:{:02}", em, es);
        } else {
            let (dm, ds) = (self.duration_secs / 60, self.duration_secs % 60);
            let _ = write!(line, "{}:{:02} / {}:{:02}", em, es, dm, ds);
        }
        line
    }
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::from_snapshot(&TrackSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TrackSnapshot {
        TrackSnapshot {
            status: truncated("play"),
            title: truncated("So What"),
            artist: truncated("Miles Davis"),
            album: truncated("Kind of Blue"),
            track_type: truncated("tidal"),
            sample_rate: truncated("44.1 kHz"),
            bit_depth: truncated("16 bit"),
            seek_ms: 61_500,
            duration_ms: 545_000,
            random: true,
            repeat: true,
            repeat_single: false,
            volume: None,
        }
    }

    #[test]
    fn full_snapshot_renders_all_lines() {
        let view = NowPlaying::from_snapshot(&snapshot());
        assert_eq!(view.title.as_str(), "So What");
        assert_eq!(view.artist_line.as_str(), "Miles Davis - Kind of Blue");
        assert_eq!(view.quality_line.as_str(), "44.1 kHz / 16 bit");
        assert_eq!(view.elapsed_secs, 61);
        assert_eq!(view.duration_secs, 545);
        assert!(view.is_playing);
        assert!(view.random);
        assert_eq!(view.repeat, RepeatMode::All);
        assert_eq!(view.source, PlayerSource::Tidal);
        assert_eq!(view.progress_percent(), 11);
    }

    #[test]
    fn null_fields_render_as_dashes() {
        let mut s = snapshot();
        s.title = truncated("null");
        s.artist = truncated("null");
        s.album = truncated("null");
        s.bit_depth = truncated("null");
        let view = NowPlaying::from_snapshot(&s);
        assert_eq!(view.title.as_str(), "-");
        assert_eq!(view.artist_line.as_str(), "-");
        assert_eq!(view.quality_line.as_str(), "44.1 kHz / -");
    }

    #[test]
    fn half_missing_artist_line_keeps_the_known_part() {
        let mut s = snapshot();
        s.album = truncated("null");
        let view = NowPlaying::from_snapshot(&s);
        assert_eq!(view.artist_line.as_str(), "Miles Davis - -");
    }

    #[test]
    fn repeat_single_and_status() {
        let mut s = snapshot();
        s.repeat_single = true;
        s.status = truncated("pause");
        let view = NowPlaying::from_snapshot(&s);
        assert_eq!(view.repeat, RepeatMode::One);
        assert!(!view.is_playing);

        s.repeat = false;
        assert_eq!(NowPlaying::from_snapshot(&s).repeat, RepeatMode::Off);
    }

    #[test]
    fn sources_are_classified() {
        assert_eq!(PlayerSource::from_track_type("spotify"), PlayerSource::Spotify);
        assert_eq!(PlayerSource::from_track_type("youtube"), PlayerSource::YouTube);
        assert_eq!(PlayerSource::from_track_type("airplay"), PlayerSource::AirPlay);
        assert_eq!(PlayerSource::from_track_type("flac"), PlayerSource::Other);
    }

    #[test]
    fn live_streams_have_no_progress() {
        let mut s = snapshot();
        s.duration_ms = 0;
        assert_eq!(NowPlaying::from_snapshot(&s).progress_percent(), 0);
    }

    #[test]
    fn empty_view_is_all_dashes() {
        let view = NowPlaying::default();
        assert_eq!(view.title.as_str(), "-");
        assert_eq!(view.artist_line.as_str(), "-");
        assert_eq!(view.quality_line.as_str(), "- / -");
        assert!(!view.is_playing);
    }

    #[test]
    fn time_line_formats_minutes() {
        let view = NowPlaying::from_snapshot(&snapshot());
        assert_eq!(view.time_line().as_str(), "1:01 / 9:05");

        let stream = NowPlaying {
            duration_secs: 0,
            ..view
        };
        assert_eq!(stream.time_line().as_str(), "1:01");
    }
}
