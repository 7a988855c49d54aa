//! Network side: forwards playback commands to the media service and
//! publishes what it reports.
//!
//! The transport sits behind [`MediaService`].  The firmware implements it
//! over the UART bridge; tests use an in-memory fake.

use crate::command::{CommandChannel, PlaybackCommand};
use crate::config::LINK_POPUP_TIMEOUT_MS;
use crate::error::{is_link_failure, Error};
use crate::notify::NotificationQueue;
use crate::track::{SnapshotChannel, TrackSnapshot};

/// Remote media-service client.
#[allow(async_fn_in_trait)]
pub trait MediaService {
    /// Deliver one command. Called exactly once per queued command.
    async fn send(&mut self, command: &PlaybackCommand) -> Result<(), Error>;

    /// Fetch the complete current player state.
    async fn poll(&mut self) -> Result<TrackSnapshot, Error>;
}

/// Outcome of one [`NetworkWorker::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub sent: usize,
    pub failed: usize,
    pub snapshot_posted: bool,
}

pub struct NetworkWorker<'a, S: MediaService> {
    service: S,
    commands: &'a CommandChannel,
    snapshots: &'a SnapshotChannel,
    notifications: &'a NotificationQueue,
    connected: bool,
}

impl<'a, S: MediaService> NetworkWorker<'a, S> {
    pub fn new(
        service: S,
        commands: &'a CommandChannel,
        snapshots: &'a SnapshotChannel,
        notifications: &'a NotificationQueue,
    ) -> Self {
        Self {
            service,
            commands,
            snapshots,
            notifications,
            connected: false,
        }
    }

    /// One network period: send every queued command in order, then poll
    /// and publish the snapshot.
    ///
    /// Failures are logged and counted, never retried here.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        while let Some(command) = self.commands.drain_one() {
            match self.service.send(&command).await {
                Ok(()) => {
                    debug!("sent {=str}", command.kind.verb());
                    report.sent += 1;
                }
                Err(e) => {
                    warn!("send {=str} failed: {}", command.kind.verb(), e);
                    report.failed += 1;
                    if is_link_failure(e) {
                        self.set_connected(false);
                    }
                }
            }
        }

        match self.service.poll().await {
            Ok(snapshot) => {
                self.set_connected(true);
                report.snapshot_posted = self.snapshots.post(snapshot);
            }
            Err(e) => {
                warn!("poll failed: {}", e);
                if is_link_failure(e) {
                    self.set_connected(false);
                }
            }
        }

        report
    }

    fn set_connected(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;

        let content = if connected { "Connected" } else { "Connection lost" };
        info!("media service: {=str}", content);
        self.notifications.post("Volumio", content, LINK_POPUP_TIMEOUT_MS);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }
}
