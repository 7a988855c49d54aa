//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and queue sizes
//! live here so they can be tuned in one place.

// Task channels

/// UI → network playback commands.
pub const COMMAND_QUEUE_SIZE: usize = 20;

/// Network → UI track snapshots.
pub const SNAPSHOT_QUEUE_SIZE: usize = 10;

/// Any producer → UI popup notifications.
pub const NOTIFICATION_QUEUE_SIZE: usize = 10;

/// Notification title capacity (bytes).
pub const NOTIFICATION_TITLE_LEN: usize = 24;

/// Notification body capacity (bytes).
pub const NOTIFICATION_CONTENT_LEN: usize = 64;

// Encoder

/// Fast-rotation detection window (ms).
pub const DYNAMIC_STEP_WINDOW_MS: u64 = 200;

/// Number of transitions that must land inside the window to count as
/// fast rotation. Also the size of the transition-time ring.
pub const DYNAMIC_STEP_TRIG: usize = 6;

/// Step applied per transition during deliberate adjustment.
pub const SLOW_STEP: i32 = 1;

/// Step applied per transition during a fast burst.
pub const FAST_STEP: i32 = 20;

/// Default encoder range when nothing else is configured.
pub const ENCODER_DEFAULT_MIN: i32 = -1000;
pub const ENCODER_DEFAULT_MAX: i32 = 1000;

/// Volume range reported by the media service.
pub const VOLUME_MIN: i32 = 0;
pub const VOLUME_MAX: i32 = 100;

/// Quiet time after the last knob turn before a polled volume may
/// overwrite the locally tracked level (ms).
pub const VOLUME_RESYNC_HOLDOFF_MS: u64 = 1000;

// Popup

/// Open/close animation length (ms).
pub const POPUP_ANIMATION_MS: u64 = 350;

/// Timeout of the popup shown while turning the volume knob (ms).
pub const VOLUME_POPUP_TIMEOUT_MS: u32 = 1000;

/// Timeout of link-state popups (ms).
pub const LINK_POPUP_TIMEOUT_MS: u32 = 5000;

// Task timing

/// UI task frame period (ms). 5 ms = 200 FPS.
pub const UI_TICK_MS: u64 = 5;

/// Network task period (ms).
pub const NETWORK_TICK_MS: u64 = 100;

/// Minimum spacing between two snapshot applications on the UI side (ms).
pub const SNAPSHOT_APPLY_INTERVAL_MS: u64 = 500;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Encoder A      → P0.31 (QDEC)
//   Encoder B      → P0.30 (QDEC)
//   Encoder button → P0.24
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   Bridge UART TX → P0.06
//   Bridge UART RX → P0.08

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

// Wi-Fi bridge link

/// UART speed to the bridge module. Must match `Baudrate` in `main.rs`.
pub const BRIDGE_BAUD: u32 = 115_200;

/// Reply deadline for a state poll (ms).
pub const BRIDGE_POLL_TIMEOUT_MS: u64 = 500;

/// Longest accepted state line from the bridge (bytes).
pub const BRIDGE_MAX_FRAME_LEN: usize = 384;

/// UARTE receive/transmit ring sizes (bytes). The receive ring holds a
/// full state line, so a reply survives a blocking display flush.
pub const BRIDGE_RX_BUFFER_LEN: usize = 512;
pub const BRIDGE_TX_BUFFER_LEN: usize = 64;

/// Silence that ends the stale-input drain before a poll (ms).
pub const BRIDGE_DRAIN_IDLE_MS: u64 = 2;
