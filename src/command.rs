//! Playback commands flowing from the UI task to the network task.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::String;

use crate::channel::MessageChannel;
use crate::config::COMMAND_QUEUE_SIZE;

/// UI → network command channel.
///
/// The network task drains it completely every tick and sends the
/// commands in enqueue order.
pub type CommandChannel = MessageChannel<CriticalSectionRawMutex, PlaybackCommand, COMMAND_QUEUE_SIZE>;

/// Longest rendered query (`volume&volume=-2147483648` is 25 bytes).
pub const COMMAND_QUERY_LEN: usize = 32;

pub type CommandQuery = String<COMMAND_QUERY_LEN>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Play,
    Pause,
    Toggle,
    Next,
    Prev,
    /// Jump to `value` seconds into the track.
    Seek,
    /// `value` != 0 enables shuffle.
    Random,
    /// `value` != 0 enables repeat.
    Repeat,
    /// Relative volume change: `value` is added to the service's current
    /// level, which the service clamps to 0..=100.
    Volume,
}

impl CommandKind {
    /// Command name understood by the media service.
    pub const fn verb(self) -> &'static str {
        match self {
            CommandKind::Play => "play",
            CommandKind::Pause => "pause",
            CommandKind::Toggle => "toggle",
            CommandKind::Next => "next",
            CommandKind::Prev => "prev",
            CommandKind::Seek => "seek",
            CommandKind::Random => "setRandom",
            CommandKind::Repeat => "setRepeat",
            CommandKind::Volume => "volume",
        }
    }
}

/// A single request for the media service.
///
/// `value` is only meaningful for the kinds that carry one (see
/// [`PlaybackCommand::carries_value`]); it is ignored otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackCommand {
    pub kind: CommandKind,
    pub value: i32,
}

impl PlaybackCommand {
    pub const fn new(kind: CommandKind, value: i32) -> Self {
        Self { kind, value }
    }

    pub const fn play() -> Self {
        Self::new(CommandKind::Play, 0)
    }

    pub const fn pause() -> Self {
        Self::new(CommandKind::Pause, 0)
    }

    pub const fn toggle() -> Self {
        Self::new(CommandKind::Toggle, 0)
    }

    pub const fn next() -> Self {
        Self::new(CommandKind::Next, 0)
    }

    pub const fn prev() -> Self {
        Self::new(CommandKind::Prev, 0)
    }

    pub const fn seek(position_secs: i32) -> Self {
        Self::new(CommandKind::Seek, position_secs)
    }

    pub const fn random(enabled: bool) -> Self {
        Self::new(CommandKind::Random, enabled as i32)
    }

    pub const fn repeat(enabled: bool) -> Self {
        Self::new(CommandKind::Repeat, enabled as i32)
    }

    pub const fn volume_step(delta: i32) -> Self {
        Self::new(CommandKind::Volume, delta)
    }

    pub const fn carries_value(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::Seek | CommandKind::Random | CommandKind::Repeat | CommandKind::Volume
        )
    }

    /// Render the `cmd=` query for the service's command endpoint.
    pub fn query(&self) -> CommandQuery {
        let mut q = CommandQuery::new();
        let verb = self.kind.verb();
        // Capacity covers every verb plus an i32, so writes cannot fail.
        let _ = match self.kind {
            CommandKind::Seek => write!(q, "{}&position={}", verb, self.value),
            CommandKind::Random | CommandKind::Repeat => {
                write!(q, "{}&value={}", verb, self.value != 0)
            }
            CommandKind::Volume => write!(q, "{}&volume={:+}", verb, self.value),
            _ => q.push_str(verb).map_err(|_| core::fmt::Error),
        };
        q
    }
}
