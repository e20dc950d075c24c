//! Newline framing of the raw byte stream coming off the serial link

use thiserror::Error;

/// Default cap on buffered bytes without a line terminator
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// No newline arrived within the buffer limit; buffered bytes were dropped
    #[error("line buffer overflow: {discarded} bytes without newline discarded")]
    Overflow { discarded: usize },
}

/// Accumulates raw bytes and yields complete, trimmed text lines.
///
/// Bytes are decoded as Latin-1 so arbitrary noise on the link never fails
/// decoding. Empty lines are skipped.
#[derive(Debug, Clone)]
pub struct LineFramer {
    read_buffer: Vec<u8>,
    max_line_bytes: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_capacity(max_line_bytes: usize) -> Self {
        Self {
            read_buffer: Vec::with_capacity(max_line_bytes.min(1024)),
            max_line_bytes: max_line_bytes.max(1),
        }
    }

    /// Append freshly read bytes
    pub fn push(&mut self, data: &[u8]) -> Result<(), FramingError> {
        self.read_buffer.extend_from_slice(data);

        let pending = match self.read_buffer.iter().rposition(|&b| b == b'\n') {
            Some(last_newline) => self.read_buffer.len() - last_newline - 1,
            None => self.read_buffer.len(),
        };
        if pending > self.max_line_bytes {
            let discarded = pending;
            let keep = self.read_buffer.len() - pending;
            self.read_buffer.truncate(keep);
            return Err(FramingError::Overflow { discarded });
        }
        Ok(())
    }

    /// Take the next complete line, if any
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(end) = self.read_buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.read_buffer.drain(..=end).collect();
            let line: String = raw[..end].iter().map(|&b| b as char).collect();
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
        None
    }

    /// Drain every complete line currently buffered
    pub fn lines(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.next_line()).collect()
    }

    /// Bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.read_buffer.len()
    }

    /// Drop partial data, e.g. after the port was reopened
    pub fn clear(&mut self) {
        self.read_buffer.clear();
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_reads() {
        let mut framer = LineFramer::new();
        framer.push(b"AT+RANGE=tid:1,ran").unwrap();
        assert_eq!(framer.next_line(), None);

        framer.push(b"ge:(1)\r\n\r\n  {\"id\":2}\nAT+").unwrap();
        assert_eq!(
            framer.lines(),
            vec!["AT+RANGE=tid:1,range:(1)".to_string(), "{\"id\":2}".to_string()]
        );
        assert_eq!(framer.pending(), 3);
    }

    #[test]
    fn test_non_ascii_bytes_decode_as_latin1() {
        let mut framer = LineFramer::new();
        framer.push(&[0x41, 0xE9, b'\n']).unwrap();
        assert_eq!(framer.next_line(), Some("Aé".to_string()));
    }

    #[test]
    fn test_overflow_discards_unterminated_data() {
        let mut framer = LineFramer::with_capacity(8);
        framer.push(b"ok\n").unwrap();

        let err = framer.push(b"0123456789").unwrap_err();
        assert_eq!(err, FramingError::Overflow { discarded: 10 });
        assert_eq!(framer.lines(), vec!["ok".to_string()]);
        assert_eq!(framer.pending(), 0);
    }
}
