//! UART link to the Wi-Fi bridge that talks HTTP to the media service.
//!
//! Reception runs on `BufferedUarte`: a timer counts received bytes and
//! the driver keeps DMA going into a ring, so a reply that arrives while
//! the UI task is flushing the display is buffered, not dropped.

use defmt::{debug, warn};
use embassy_nrf::buffered_uarte::BufferedUarte;
use embassy_nrf::peripherals::{TIMER0, UARTE0};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::{BufRead, Write};

use knob_remote::bridge::{command_frame, parse_state_line, read_line, LineReader, POLL_REQUEST};
use knob_remote::command::PlaybackCommand;
use knob_remote::config::{BRIDGE_DRAIN_IDLE_MS, BRIDGE_POLL_TIMEOUT_MS};
use knob_remote::network::MediaService;
use knob_remote::track::TrackSnapshot;
use knob_remote::Error;

pub type BridgeUart = BufferedUarte<'static, UARTE0, TIMER0>;

pub struct BridgeLink {
    uart: BridgeUart,
    reader: LineReader,
}

impl BridgeLink {
    pub fn new(uart: BridgeUart) -> Self {
        Self {
            uart,
            reader: LineReader::new(),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.uart.write_all(bytes).await.map_err(|e| {
            warn!("bridge write failed: {}", e);
            Error::Uart
        })
    }

    /// Throw away whatever is already buffered, e.g. the tail of a reply
    /// that missed the previous poll deadline.
    async fn discard_stale(&mut self) {
        let idle = Duration::from_millis(BRIDGE_DRAIN_IDLE_MS);
        let mut dropped = 0usize;
        loop {
            let len = match with_timeout(idle, self.uart.fill_buf()).await {
                Ok(Ok(stale)) => stale.len(),
                _ => break,
            };
            if len == 0 {
                break;
            }
            self.uart.consume(len);
            dropped += len;
        }
        if dropped > 0 {
            debug!("bridge: dropped {} stale bytes", dropped);
        }
    }
}

impl MediaService for BridgeLink {
    async fn send(&mut self, command: &PlaybackCommand) -> Result<(), Error> {
        let frame = command_frame(command);
        debug!("bridge -> {=str}", frame.as_str().trim_end());
        self.write(frame.as_bytes()).await
    }

    async fn poll(&mut self) -> Result<TrackSnapshot, Error> {
        self.discard_stale().await;
        self.write(POLL_REQUEST).await?;

        self.reader.clear();
        with_timeout(
            Duration::from_millis(BRIDGE_POLL_TIMEOUT_MS),
            read_line(&mut self.uart, &mut self.reader),
        )
        .await
        .map_err(|_| Error::Timeout)??;

        parse_state_line(self.reader.line()?)
    }
}
