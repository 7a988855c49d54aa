//! Unified error type for knob-remote.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! Only the media-service boundary returns these.  Channels, the encoder
//! and the popup never fail: they drop or no-op instead.

/// Top-level error type used across the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Media service
    /// The media service is not reachable (bridge down, Wi-Fi lost).
    LinkDown,

    /// The service did not answer within the poll deadline.
    Timeout,

    // Bridge transport
    /// UART transfer to the Wi-Fi bridge failed.
    Uart,

    /// A frame from the bridge exceeded the receive buffer.
    FrameTooLong,

    /// A frame from the bridge could not be decoded.
    MalformedFrame,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Error::LinkDown => "media service unreachable",
            Error::Timeout => "media service timed out",
            Error::Uart => "bridge UART error",
            Error::FrameTooLong => "bridge frame too long",
            Error::MalformedFrame => "malformed bridge frame",
            Error::Display => "display I2C error",
        };
        f.write_str(text)
    }
}

/// Whether an error means the service itself is gone, as opposed to a
/// single bad exchange.
pub fn is_link_failure(error: Error) -> bool {
    matches!(error, Error::LinkDown | Error::Timeout | Error::Uart)
}
