//! Fixed-width, null-padded string fields.
//!
//! Names travel as exactly `width` bytes: shorter values are padded with
//! `\0`, longer ones are cut. Reading stops at the first `\0` or at
//! `width`, whichever comes first. Truncation lands on a UTF-8 character
//! boundary so that what is written is exactly what a reader gets back.

/// Width of name fields (characters, rooms, recipients, targets).
pub const NAME_LEN: usize = 32;

/// Width of the sender field in a `Message` frame.
pub const SENDER_LEN: usize = 30;

/// Returns the longest prefix of `value` that fits in `width` bytes
/// without splitting a character.
pub fn truncate(value: &str, width: usize) -> &str {
    if value.len() <= width {
        return value;
    }
    let mut end = width;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Appends `value` to `buf` as a `width`-byte null-padded field.
pub fn put(buf: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = truncate(value, width).as_bytes();
    buf.extend_from_slice(bytes);
    buf.resize(buf.len() + (width - bytes.len()), 0);
}

/// Reads a null-terminated field from the start of `data`, looking at no
/// more than `width` bytes.
pub fn read(data: &[u8], width: usize) -> String {
    let window = &data[..data.len().min(width)];
    let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
    String::from_utf8_lossy(&window[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_pads_short_values() {
        let mut buf = Vec::new();
        put(&mut buf, "Bean", NAME_LEN);
        assert_eq!(buf.len(), NAME_LEN);
        assert_eq!(&buf[..4], b"Bean");
        assert!(buf[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_put_truncates_long_values() {
        let long = "x".repeat(40);
        let mut buf = Vec::new();
        put(&mut buf, &long, NAME_LEN);
        assert_eq!(buf, vec![b'x'; NAME_LEN]);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 31 ASCII bytes then a 2-byte 'é' straddling the 32-byte limit.
        let value = format!("{}é", "a".repeat(31));
        assert_eq!(truncate(&value, NAME_LEN), "a".repeat(31));
    }

    #[test]
    fn test_read_stops_at_null_or_width() {
        assert_eq!(read(b"Petra\0junk", NAME_LEN), "Petra");
        let full = vec![b'z'; 40];
        assert_eq!(read(&full, NAME_LEN), "z".repeat(32));
        assert_eq!(read(b"", NAME_LEN), "");
    }

    #[test]
    fn test_exact_width_value_has_no_terminator() {
        let exact = "y".repeat(NAME_LEN);
        let mut buf = Vec::new();
        put(&mut buf, &exact, NAME_LEN);
        buf.extend_from_slice(b"next field");
        assert_eq!(read(&buf, NAME_LEN), exact);
    }
}
