//! Encoder push button with async debouncing.
//!
//! Active-low with internal pull-up.  A debounced press raises
//! [`PRESS_SIGNAL`]; the UI task turns it into a play/pause toggle.

use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use knob_remote::config::BUTTON_DEBOUNCE_MS;

pub static PRESS_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Waits for the pin to go low (pressed), debounces, signals the press,
/// then waits for release before repeating.
#[embassy_executor::task]
pub async fn button_task(pin: AnyPin) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        btn.wait_for_falling_edge().await;

        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Button: press");
            PRESS_SIGNAL.signal(());

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
