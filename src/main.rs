//! knob-remote - rotary-knob remote display for a network music player.
//!
//! Runs on an nRF52840:
//! - QDEC decodes the rotary encoder and feeds the UI task
//! - the UI task renders the dashboard on an SSD1306 OLED
//! - the network task talks to the media service through a Wi-Fi bridge
//!   module on UARTE0
//!
//! Build: `cargo build --release --features embedded --target thumbv7em-none-eabihf`

#![no_std]
#![no_main]

mod firmware;

use core::sync::atomic::{AtomicI32, Ordering};

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::gpio::Pin;
use embassy_nrf::peripherals::{QDEC, TWISPI0};
use embassy_nrf::qdec::{self, Qdec};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::uarte;
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use firmware::buttons::{button_task, PRESS_SIGNAL};
use firmware::display;
use firmware::link::{BridgeLink, BridgeUart};
use knob_remote::command::CommandChannel;
use knob_remote::config::{
    BRIDGE_BAUD, BRIDGE_RX_BUFFER_LEN, BRIDGE_TX_BUFFER_LEN, NETWORK_TICK_MS, UI_TICK_MS,
};
use knob_remote::encoder::{EncoderTracker, TransitionSignal};
use knob_remote::network::NetworkWorker;
use knob_remote::notify::NotificationQueue;
use knob_remote::track::SnapshotChannel;
use knob_remote::ui::{Dashboard, UiTask};

bind_interrupts!(struct Irqs {
    QDEC => qdec::InterruptHandler<peripherals::QDEC>;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

static COMMANDS: CommandChannel = CommandChannel::new();
static SNAPSHOTS: SnapshotChannel = SnapshotChannel::new();
static NOTIFICATIONS: NotificationQueue = NotificationQueue::new();

/// Raw encoder position, accumulated from QDEC reports.
static ENCODER_COUNT: AtomicI32 = AtomicI32::new(0);
static ENCODER_SIGNAL: TransitionSignal = TransitionSignal::new();

static BRIDGE_RX: StaticCell<[u8; BRIDGE_RX_BUFFER_LEN]> = StaticCell::new();
static BRIDGE_TX: StaticCell<[u8; BRIDGE_TX_BUFFER_LEN]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("knob-remote starting");

    let qdec = Qdec::new(p.QDEC, Irqs, p.P0_31, p.P0_30, qdec::Config::default());

    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);

    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        Irqs,
        p.P0_08,
        p.P0_06,
        uart_config,
        BRIDGE_RX.init([0; BRIDGE_RX_BUFFER_LEN]),
        BRIDGE_TX.init([0; BRIDGE_TX_BUFFER_LEN]),
    );
    info!("bridge link at {} baud", BRIDGE_BAUD);

    unwrap!(spawner.spawn(qdec_task(qdec)));
    unwrap!(spawner.spawn(ui_task(i2c)));
    unwrap!(spawner.spawn(network_task(uart)));
    unwrap!(spawner.spawn(button_task(p.P0_24.degrade())));
}

/// Forward every QDEC report into the shared counter and wake the tracker.
#[embassy_executor::task]
async fn qdec_task(mut qdec: Qdec<'static, QDEC>) -> ! {
    loop {
        let delta = qdec.read().await;
        ENCODER_COUNT.fetch_add(i32::from(delta), Ordering::Relaxed);
        ENCODER_SIGNAL.signal(());
    }
}

#[embassy_executor::task]
async fn ui_task(i2c: Twim<'static, TWISPI0>) -> ! {
    let mut oled = match display::init(i2c) {
        Ok(oled) => Some(oled),
        Err(e) => {
            warn!("display unavailable ({}), running headless", e);
            None
        }
    };
    let dashboard = if oled.is_some() {
        Dashboard::new()
    } else {
        Dashboard::headless()
    };

    let encoder = EncoderTracker::new(&ENCODER_COUNT, &ENCODER_SIGNAL);
    let mut ui = UiTask::new(encoder, dashboard, &NOTIFICATIONS, &COMMANDS, &SNAPSHOTS);

    let mut ticker = Ticker::every(Duration::from_millis(UI_TICK_MS));
    loop {
        let now = Instant::now().as_millis();
        if PRESS_SIGNAL.try_take().is_some() {
            ui.press();
        }
        ui.tick(now);
        if let Some(oled) = oled.as_mut() {
            display::draw_dashboard(oled, ui.dashboard(), now);
        }
        ticker.next().await;
    }
}

#[embassy_executor::task]
async fn network_task(uart: BridgeUart) -> ! {
    let mut worker = NetworkWorker::new(BridgeLink::new(uart), &COMMANDS, &SNAPSHOTS, &NOTIFICATIONS);

    let mut ticker = Ticker::every(Duration::from_millis(NETWORK_TICK_MS));
    loop {
        let report = worker.tick().await;
        if report.failed > 0 {
            warn!("network tick: {}", report);
        }
        ticker.next().await;
    }
}
