//! SSD1306 OLED rendering of the dashboard.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use knob_remote::popup::{Popup, PopupStatus};
use knob_remote::track::RepeatMode;
use knob_remote::ui::Dashboard;
use knob_remote::Error;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const WIDTH: u32 = 128;
const POPUP_WIDTH: u32 = 112;
const POPUP_HEIGHT: u32 = 40;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Result<Display<I2C>, Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().map_err(|_| Error::Display)?;
    display.clear_buffer();
    display.flush().map_err(|_| Error::Display)?;
    Ok(display)
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn small_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_5X8)
        .text_color(BinaryColor::On)
        .build()
}

/// Render one frame: now-playing screen with the popup on top.
pub fn draw_dashboard<I2C>(display: &mut Display<I2C>, dashboard: &Dashboard, now_ms: u64)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let view = dashboard.now_playing();

    let mut status: heapless::String<24> = heapless::String::new();
    let _ = status.push_str(if view.is_playing { ">" } else { "||" });
    if view.random {
        let _ = status.push_str(" SHUF");
    }
    match view.repeat {
        RepeatMode::Off => {}
        RepeatMode::All => {
            let _ = status.push_str(" RPT");
        }
        RepeatMode::One => {
            let _ = status.push_str(" RPT1");
        }
    }
    let _ = Text::new(&status, Point::new(0, 8), small_style()).draw(display);

    let mut volume: heapless::String<8> = heapless::String::new();
    let _ = match dashboard.volume() {
        Some(level) => write!(volume, "{}%", level),
        None => volume.push_str("--%").map_err(|_| core::fmt::Error),
    };
    let _ = Text::new(&volume, Point::new(100, 8), small_style()).draw(display);
    let _ = Text::new(view.source.label(), Point::new(70, 8), small_style()).draw(display);

    let _ = Text::new(&view.title, Point::new(0, 22), text_style()).draw(display);
    let _ = Text::new(&view.artist_line, Point::new(0, 34), small_style()).draw(display);
    let _ = Text::new(&view.quality_line, Point::new(0, 44), small_style()).draw(display);
    let _ = Text::new(&view.time_line(), Point::new(0, 54), small_style()).draw(display);

    let bar = WIDTH * u32::from(view.progress_percent()) / 100;
    let _ = Rectangle::new(Point::new(0, 60), Size::new(WIDTH, 4))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display);
    let _ = Rectangle::new(Point::new(0, 60), Size::new(bar, 4))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(display);

    if let Some(popup) = dashboard.popup() {
        draw_popup(display, popup, now_ms);
    }

    let _ = display.flush();
}

/// Popup box growing from the screen centre with the animation.
fn draw_popup<I2C>(display: &mut Display<I2C>, popup: &Popup, now_ms: u64)
where
    I2C: embedded_hal::i2c::I2c,
{
    let progress = u32::from(popup.progress(now_ms));
    if progress == 0 {
        return;
    }

    let w = POPUP_WIDTH * progress / 100;
    let h = POPUP_HEIGHT * progress / 100;
    let top_left = Point::new(((WIDTH - w) / 2) as i32, ((64 - h) / 2) as i32);

    let style = PrimitiveStyleBuilder::new()
        .stroke_color(BinaryColor::On)
        .stroke_width(1)
        .fill_color(BinaryColor::Off)
        .build();
    let _ = Rectangle::new(top_left, Size::new(w, h))
        .into_styled(style)
        .draw(display);

    // Text only once the box is fully open.
    if popup.status() == PopupStatus::Visible {
        let x = top_left.x + 4;
        let _ = Text::new(popup.title(), Point::new(x, top_left.y + 12), text_style()).draw(display);
        let _ =
            Text::new(popup.content(), Point::new(x, top_left.y + 26), small_style()).draw(display);
    }
}
