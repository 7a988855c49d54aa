//! User interface task - encoder knob, popup notifications and the
//! now-playing dashboard.
//!
//! The firmware calls [`UiTask::tick`] once per frame (every
//! `UI_TICK_MS`) and then renders [`UiTask::dashboard`].  One tick does,
//! in order:
//!
//! 1. read the encoder and turn an applied step into a relative volume
//!    command plus a "Volume" popup
//! 2. hand pending notifications to the dashboard popup
//! 3. at most every `SNAPSHOT_APPLY_INTERVAL_MS`, drain the snapshot
//!    channel and apply only the newest snapshot
//! 4. advance popup animations and the dismiss timer
//!
//! The service owns the volume.  Until a snapshot reports it the encoder
//! runs on its wide default range and only the steps matter.  The first
//! reported level seeds the encoder with the 0..=100 range; later ones
//! re-seed it once the knob has been still for `VOLUME_RESYNC_HOLDOFF_MS`,
//! so a poll answered before the last steps landed cannot pull the level
//! back.

pub mod dashboard;

pub use dashboard::{show_notification, Dashboard};

use crate::command::{CommandChannel, PlaybackCommand};
use crate::config::{
    SNAPSHOT_APPLY_INTERVAL_MS, VOLUME_MAX, VOLUME_MIN, VOLUME_RESYNC_HOLDOFF_MS,
};
use crate::encoder::{EncoderCounter, EncoderTracker};
use crate::notify::{NotificationDispatcher, NotificationQueue};
use crate::track::{SnapshotChannel, TrackSnapshot};

pub struct UiTask<'a, C: EncoderCounter> {
    encoder: EncoderTracker<'a, C>,
    dashboard: Dashboard,
    notifications: NotificationDispatcher<'a, Dashboard>,
    commands: &'a CommandChannel,
    snapshots: &'a SnapshotChannel,
    last_snapshot_ms: Option<u64>,
    last_turn_ms: Option<u64>,
    volume_synced: bool,
}

impl<'a, C: EncoderCounter> UiTask<'a, C> {
    /// Wire the UI to its channels and turn on fast stepping.
    pub fn new(
        mut encoder: EncoderTracker<'a, C>,
        dashboard: Dashboard,
        notifications: &'a NotificationQueue,
        commands: &'a CommandChannel,
        snapshots: &'a SnapshotChannel,
    ) -> Self {
        encoder.set_fast_step(true);

        let mut dispatcher = NotificationDispatcher::new(notifications);
        dispatcher.subscribe(show_notification);

        Self {
            encoder,
            dashboard,
            notifications: dispatcher,
            commands,
            snapshots,
            last_snapshot_ms: None,
            last_turn_ms: None,
            volume_synced: false,
        }
    }

    pub fn tick(&mut self, now_ms: u64) {
        self.dashboard.set_clock(now_ms);

        let step = self.encoder.update(now_ms);
        if self.encoder.has_changed() {
            if step != 0 {
                if !self.commands.post(PlaybackCommand::volume_step(step)) {
                    warn!("ui: volume step {} dropped, command queue full", step);
                }
                let level = self.volume_synced.then(|| self.encoder.value());
                self.dashboard.on_volume_change(step, level, now_ms);
                self.last_turn_ms = Some(now_ms);
            }
            self.encoder.acknowledge();
        }

        self.notifications.process_pending(&mut self.dashboard);

        let due = self
            .last_snapshot_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= SNAPSHOT_APPLY_INTERVAL_MS);
        if due {
            if let Some(snapshot) = self.snapshots.drain_latest() {
                self.dashboard.apply_snapshot(&snapshot);
                self.sync_volume(&snapshot, now_ms);
                self.last_snapshot_ms = Some(now_ms);
            }
        }

        self.dashboard.tick(now_ms);
    }

    fn sync_volume(&mut self, snapshot: &TrackSnapshot, now_ms: u64) {
        let Some(level) = snapshot.volume else {
            return;
        };
        let settled = self
            .last_turn_ms
            .map_or(true, |turn| now_ms.saturating_sub(turn) >= VOLUME_RESYNC_HOLDOFF_MS);
        if self.volume_synced && !settled {
            return;
        }
        if !self.volume_synced {
            debug!("ui: volume seeded at {}", level);
        }
        self.encoder.set_range(level, VOLUME_MIN, VOLUME_MAX, false);
        self.dashboard.set_volume(self.encoder.value());
        self.volume_synced = true;
    }

    /// Encoder push button: toggle play/pause.
    pub fn press(&self) -> bool {
        info!("ui: toggle");
        self.commands.post(PlaybackCommand::toggle())
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn encoder(&self) -> &EncoderTracker<'a, C> {
        &self.encoder
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicI32, Ordering};

    use super::*;
    use crate::command::CommandKind;
    use crate::encoder::TransitionSignal;
    use crate::popup::PopupStatus;
    use crate::text::truncated;

    struct Rig {
        raw: AtomicI32,
        signal: TransitionSignal,
        notifications: NotificationQueue,
        commands: CommandChannel,
        snapshots: SnapshotChannel,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                raw: AtomicI32::new(0),
                signal: TransitionSignal::new(),
                notifications: NotificationQueue::new(),
                commands: CommandChannel::new(),
                snapshots: SnapshotChannel::new(),
            }
        }

        fn ui(&self) -> UiTask<'_, &AtomicI32> {
            UiTask::new(
                EncoderTracker::new(&self.raw, &self.signal),
                Dashboard::new(),
                &self.notifications,
                &self.commands,
                &self.snapshots,
            )
        }

        /// A UI whose encoder has been seeded by a snapshot at `now_ms`.
        fn seeded_ui(&self, volume: i32, now_ms: u64) -> UiTask<'_, &AtomicI32> {
            let mut ui = self.ui();
            self.snapshots.post(at_volume(volume));
            ui.tick(now_ms);
            ui
        }

        fn turn(&self, steps: i32) {
            self.raw.fetch_add(steps, Ordering::SeqCst);
            self.signal.signal(());
        }
    }

    fn snapshot(title: &str) -> TrackSnapshot {
        TrackSnapshot {
            status: truncated("play"),
            title: truncated(title),
            ..TrackSnapshot::default()
        }
    }

    fn at_volume(volume: i32) -> TrackSnapshot {
        TrackSnapshot {
            volume: Some(volume),
            ..snapshot("Footprints")
        }
    }

    #[test]
    fn knob_turn_posts_volume_step_and_shows_popup() {
        let rig = Rig::new();
        let mut ui = rig.seeded_ui(40, 0);
        assert_eq!(rig.raw.load(Ordering::SeqCst), 40);
        assert_eq!(ui.dashboard().volume(), Some(40));

        rig.turn(1);
        ui.tick(1_000);

        let cmd = rig.commands.drain_one().unwrap();
        assert_eq!(cmd.kind, CommandKind::Volume);
        assert_eq!(cmd.value, 1);
        assert_eq!(ui.dashboard().volume(), Some(41));
        assert_eq!(ui.dashboard().popup().unwrap().content(), "41%");
        assert_eq!(ui.dashboard().popup_status(), PopupStatus::Opening);
        assert!(!ui.encoder().has_changed());

        ui.tick(1_005);
        assert!(rig.commands.is_empty());
    }

    #[test]
    fn knob_steps_before_the_first_snapshot() {
        let rig = Rig::new();
        let mut ui = rig.ui();

        rig.turn(-1);
        ui.tick(0);

        assert_eq!(rig.commands.drain_one(), Some(PlaybackCommand::volume_step(-1)));
        assert_eq!(ui.dashboard().volume(), None);
        assert_eq!(ui.dashboard().popup().unwrap().content(), "-1");
    }

    #[test]
    fn volume_stops_at_the_top() {
        let rig = Rig::new();
        let mut ui = rig.seeded_ui(100, 0);
        rig.turn(1);
        ui.tick(1_000);
        assert!(rig.commands.is_empty());
        assert_eq!(rig.raw.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn stale_poll_does_not_pull_the_knob_back() {
        let rig = Rig::new();
        let mut ui = rig.seeded_ui(70, 0);

        rig.turn(1);
        ui.tick(1_000);
        assert_eq!(ui.encoder().value(), 71);

        // Answered before the step reached the service.
        rig.snapshots.post(at_volume(70));
        ui.tick(1_500);
        assert_eq!(ui.encoder().value(), 71);
        assert_eq!(ui.dashboard().volume(), Some(71));

        // Once the knob is still, the service is authoritative again.
        rig.snapshots.post(at_volume(65));
        ui.tick(2_000);
        assert_eq!(ui.encoder().value(), 65);
        assert_eq!(rig.raw.load(Ordering::SeqCst), 65);
        assert_eq!(ui.dashboard().volume(), Some(65));
        assert!(rig.commands.drain_one().is_some());
        assert!(rig.commands.is_empty());
    }

    #[test]
    fn notifications_become_popups() {
        let rig = Rig::new();
        let mut ui = rig.ui();
        assert!(rig.notifications.post("Volumio", "Connected", 5000));

        ui.tick(200);
        let popup = ui.dashboard().popup().unwrap();
        assert_eq!(popup.title(), "Volumio");
        assert_eq!(popup.dismiss_at(), Some(5200));
        assert_eq!(rig.notifications.pending(), 0);
    }

    #[test]
    fn snapshots_are_throttled_and_collapsed() {
        let rig = Rig::new();
        let mut ui = rig.ui();

        rig.snapshots.post(snapshot("one"));
        rig.snapshots.post(snapshot("two"));
        ui.tick(0);
        assert_eq!(ui.dashboard().now_playing().title.as_str(), "two");
        assert_eq!(ui.dashboard().snapshots_applied(), 1);

        rig.snapshots.post(snapshot("three"));
        ui.tick(499);
        assert_eq!(ui.dashboard().now_playing().title.as_str(), "two");

        ui.tick(500);
        assert_eq!(ui.dashboard().now_playing().title.as_str(), "three");
        assert!(rig.snapshots.is_empty());
    }

    #[test]
    fn press_toggles_playback() {
        let rig = Rig::new();
        let ui = rig.ui();
        assert!(ui.press());
        assert_eq!(rig.commands.drain_one(), Some(PlaybackCommand::toggle()));
    }
}
