/// Stateful UTF-8 decoder for byte streams.
///
/// A multi-byte character split across two reads is carried over and decoded
/// once the rest arrives. Invalid sequences become U+FFFD, and an incomplete
/// sequence left at end of stream is flushed as U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    remainder: Vec<u8>,
}

const REPLACEMENT: char = '\u{FFFD}';

impl Utf8StreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of bytes into `out`.
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut String) {
        if self.remainder.is_empty() {
            if let Some(tail) = decode_valid_prefix(bytes, out) {
                self.remainder.extend_from_slice(tail);
            }
            return;
        }

        let mut joined = std::mem::take(&mut self.remainder);
        joined.extend_from_slice(bytes);
        if let Some(tail) = decode_valid_prefix(&joined, out) {
            self.remainder.extend_from_slice(tail);
        }
    }

    /// Decode the next chunk of bytes into a fresh string.
    #[must_use]
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        self.decode_into(bytes, &mut out);
        out
    }

    /// End of stream: emit a replacement character for any dangling bytes.
    #[must_use]
    pub fn finish(&mut self) -> String {
        if self.remainder.is_empty() {
            return String::new();
        }
        self.remainder.clear();
        REPLACEMENT.to_string()
    }
}

/// Decode as much of `bytes` as possible, returning an incomplete trailing
/// sequence that needs more input.
fn decode_valid_prefix<'a>(mut bytes: &'a [u8], out: &mut String) -> Option<&'a [u8]> {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                return None;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }
                match err.error_len() {
                    Some(invalid_len) => {
                        out.push(REPLACEMENT);
                        bytes = &rest[invalid_len..];
                    }
                    None => return Some(rest),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"data: hi\n"), "data: hi\n");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        let emoji = "😄".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&emoji[..1]), "");
        assert_eq!(decoder.decode(&emoji[1..3]), "");
        assert_eq!(decoder.decode(&emoji[3..]), "😄");
    }

    #[test]
    fn test_split_mid_text() {
        let text = "72°F ok";
        let bytes = text.as_bytes();
        let split = text.find('°').unwrap() + 1;
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = decoder.decode(&bytes[..split]);
        out.push_str(&decoder.decode(&bytes[split..]));
        assert_eq!(out, text);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_dangling_bytes_flushed_at_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
