use heapless::String;

/// Copy `text` into a fixed-capacity string, cutting at the last char
/// boundary that fits.
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// `"-"` for fields the media service reports as absent.
pub fn or_dash(text: &str) -> &str {
    if is_missing(text) {
        "-"
    } else {
        text
    }
}

/// The service serialises absent fields as `null`; an empty string
/// means the same thing on the display.
pub fn is_missing(text: &str) -> bool {
    text.is_empty() || text == "null"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_capacity() {
        let s: String<4> = truncated("volume");
        assert_eq!(s.as_str(), "volu");
    }

    #[test]
    fn truncation_never_splits_a_char() {
        // 'é' is two bytes; only one byte of room remains after "abc".
        let s: String<4> = truncated("abcé");
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn missing_fields_render_as_dash() {
        assert_eq!(or_dash("null"), "-");
        assert_eq!(or_dash(""), "-");
        assert_eq!(or_dash("Blue Train"), "Blue Train");
    }
}
