//! Host-testable core of the knob-remote firmware.
//!
//! Everything here is `no_std` and allocation-free, so the same code runs
//! on the nRF52840 and under `cargo test` on the host.  The embedded
//! binary (`main.rs`, `embedded` feature) only adds peripherals: QDEC,
//! the OLED, the push button and the UART link to the Wi-Fi bridge.
//!
//! Usage: `cargo test`
//!
//! ## Data flow
//!
//! ```text
//!   QDEC irq ──signal──▶ UiTask ──CommandChannel──▶ NetworkWorker ──▶ media service
//!                          ▲  ▲                          │
//!                          │  └──────SnapshotChannel─────┤
//!                          └──────NotificationQueue──────┘
//! ```

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod bridge;
pub mod channel;
pub mod command;
pub mod config;
pub mod encoder;
pub mod error;
pub mod network;
pub mod notify;
pub mod popup;
pub mod text;
pub mod track;
pub mod ui;

pub use error::Error;
