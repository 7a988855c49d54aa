//! Everything the screen shows, independent of how it is drawn.

use core::fmt::Write;

use heapless::String;

use crate::config::VOLUME_POPUP_TIMEOUT_MS;
use crate::notify::NotificationEvent;
use crate::popup::{Popup, PopupStatus};
use crate::track::{NowPlaying, TrackSnapshot};

/// View state of the main screen plus its popup.
///
/// A dashboard built with [`Dashboard::headless`] has no popup widget;
/// popup requests on it are accepted and ignored.
pub struct Dashboard {
    now_playing: NowPlaying,
    /// Service volume, once a snapshot has reported it.
    volume: Option<i32>,
    popup: Option<Popup>,
    clock_ms: u64,
    snapshots_applied: u32,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::build(Some(Popup::new()))
    }

    pub fn headless() -> Self {
        Self::build(None)
    }

    fn build(popup: Option<Popup>) -> Self {
        Self {
            now_playing: NowPlaying::default(),
            volume: None,
            popup,
            clock_ms: 0,
            snapshots_applied: 0,
        }
    }

    /// Set the timestamp of the frame being built.
    pub fn set_clock(&mut self, now_ms: u64) {
        self.clock_ms = now_ms;
    }

    pub fn clock(&self) -> u64 {
        self.clock_ms
    }

    pub fn apply_snapshot(&mut self, snapshot: &TrackSnapshot) {
        self.now_playing = NowPlaying::from_snapshot(snapshot);
        self.snapshots_applied = self.snapshots_applied.wrapping_add(1);
    }

    pub fn show_popup(&mut self, title: &str, content: &str, timeout_ms: u32, now_ms: u64) {
        if let Some(popup) = self.popup.as_mut() {
            popup.show(title, content, timeout_ms, now_ms);
        }
    }

    pub fn hide_popup(&mut self, now_ms: u64) {
        if let Some(popup) = self.popup.as_mut() {
            popup.hide(now_ms);
        }
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = Some(volume);
    }

    /// Flash a knob-driven volume change in the popup.
    ///
    /// Shows the resulting level when it is known, otherwise the step
    /// itself (`+1`, `-20`).
    pub fn on_volume_change(&mut self, step: i32, level: Option<i32>, now_ms: u64) {
        debug!("dashboard: volume {=i32} -> {}", step, level);

        let mut content: String<12> = String::new();
        let _ = match level {
            Some(level) => {
                self.volume = Some(level);
                write!(content, "{}%", level)
            }
            None => write!(content, "{:+}", step),
        };
        self.show_popup("Volume", &content, VOLUME_POPUP_TIMEOUT_MS, now_ms);
    }

    /// Advance popup animations and its dismiss timer.
    pub fn tick(&mut self, now_ms: u64) {
        self.clock_ms = now_ms;
        if let Some(popup) = self.popup.as_mut() {
            popup.tick(now_ms);
        }
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.now_playing
    }

    pub fn volume(&self) -> Option<i32> {
        self.volume
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn popup_status(&self) -> PopupStatus {
        self.popup.as_ref().map_or(PopupStatus::Hidden, Popup::status)
    }

    pub fn snapshots_applied(&self) -> u32 {
        self.snapshots_applied
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification subscriber: every event becomes a popup at frame time.
pub fn show_notification(dashboard: &mut Dashboard, event: NotificationEvent) {
    let now = dashboard.clock();
    dashboard.show_popup(&event.title, &event.content, event.timeout_ms, now);
}
