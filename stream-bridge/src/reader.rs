use crate::CancelToken;
use crate::StreamBridge;
use std::collections::VecDeque;
use std::io::Read;

/// [`std::io::Read`] adapter over a bridge handle, so the stream can be
/// handed to arbitrary stream-consuming tooling (e.g. wrapped in a
/// `BufReader`) unmodified.
///
/// `read` blocks for the first byte, then fills the caller's buffer from
/// whatever is already buffered without blocking again. Characters are UTF-8
/// encoded on the way out; a character that does not fit the remaining
/// output buffer is carried over to the next call byte by byte. End-of-stream
/// is `Ok(0)` — `read` never returns `Err`.
#[derive(Debug)]
pub struct BridgeReader {
    bridge: StreamBridge,
    token: Option<CancelToken>,
    /// Encoded bytes of a character that overflowed the caller's buffer.
    carry: VecDeque<u8>,
}

impl BridgeReader {
    pub fn new(bridge: StreamBridge) -> Self {
        Self {
            bridge,
            token: None,
            carry: VecDeque::new(),
        }
    }

    /// As [`new`](Self::new), with blocking reads additionally released
    /// (yielding `Ok(0)`) when `token` is cancelled.
    pub fn with_cancel_token(bridge: StreamBridge, token: CancelToken) -> Self {
        Self {
            bridge,
            token: Some(token),
            carry: VecDeque::new(),
        }
    }

    fn next_char_blocking(&self) -> Option<char> {
        match &self.token {
            Some(token) => self.bridge.read_char_cancellable(token),
            None => self.bridge.read_char(),
        }
    }

    /// Encodes `ch` into `buf` starting at `written`; overflow bytes go into
    /// the carry queue.
    fn emit(&mut self, ch: char, buf: &mut [u8], written: &mut usize) {
        let mut utf8 = [0u8; 4];
        for &byte in ch.encode_utf8(&mut utf8).as_bytes() {
            if *written < buf.len() {
                buf[*written] = byte;
                *written += 1;
            } else {
                self.carry.push_back(byte);
            }
        }
    }
}

impl Read for BridgeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        while written < buf.len() {
            let Some(byte) = self.carry.pop_front() else {
                break;
            };
            buf[written] = byte;
            written += 1;
        }

        if written == 0 {
            let Some(ch) = self.next_char_blocking() else {
                return Ok(0);
            };
            self.emit(ch, buf, &mut written);
        }

        while written < buf.len() && self.carry.is_empty() {
            let Some(ch) = self.bridge.try_read_char() else {
                break;
            };
            self.emit(ch, buf, &mut written);
        }

        Ok(written)
    }
}
