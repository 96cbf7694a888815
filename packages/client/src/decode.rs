//! Incremental framing for streamed tweet bodies.
//!
//! The remote endpoint replies with either a JSON array of tweet objects or
//! a sequence of whitespace/newline-delimited objects (the streaming-friendly
//! framing). Bytes arrive in transport-sized chunks with no relation to
//! element boundaries, so the decoder tracks string/escape/nesting state and
//! emits each element as soon as its closing brace has arrived, without
//! waiting for the rest of the body.

use serde::de::Error as _;

use crate::error::FetchError;
use crate::types::Tweet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// No non-whitespace byte seen yet.
    Undetected,
    /// Body is a JSON array; elements separated by commas.
    Array,
    /// Body is bare objects separated by whitespace.
    Bare,
}

/// Splits arriving body bytes into complete tweet objects.
///
/// Holds only the unparsed tail between chunks; the tail is bounded by the
/// configured body limit and overflow surfaces as `PayloadTooLarge`.
#[derive(Debug)]
pub(crate) struct FrameDecoder {
    buf: Vec<u8>,
    max_buffered: usize,
    framing: Framing,
    /// Array mode: the next non-whitespace byte must be `,` or `]`.
    expect_separator: bool,
    /// Array mode: closing `]` consumed.
    closed: bool,
}

impl FrameDecoder {
    pub(crate) fn new(max_buffered: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_buffered,
            framing: Framing::Undetected,
            expect_separator: false,
            closed: false,
        }
    }

    /// Feed one chunk, returning every tweet completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Vec<Tweet>, FetchError> {
        if self.buf.len() + chunk.len() > self.max_buffered {
            return Err(FetchError::PayloadTooLarge {
                limit: self.max_buffered,
            });
        }
        self.buf.extend_from_slice(chunk);
        self.drain()
    }

    /// Signal end of body; fails when the body ended mid-element or an array
    /// was never closed.
    pub(crate) fn finish(&mut self) -> Result<(), FetchError> {
        match self.framing {
            Framing::Undetected => Err(decode_error("empty response body")),
            Framing::Array if !self.closed => {
                Err(decode_error("response body ended before the array closed"))
            }
            _ if !self.buf.iter().all(|b| b.is_ascii_whitespace()) => {
                Err(decode_error("response body ended mid-element"))
            }
            _ => Ok(()),
        }
    }

    fn drain(&mut self) -> Result<Vec<Tweet>, FetchError> {
        let mut out = Vec::new();
        loop {
            self.trim_leading_whitespace();
            if self.buf.is_empty() {
                return Ok(out);
            }

            if self.closed {
                return Err(decode_error("trailing data after the array closed"));
            }

            if self.framing == Framing::Undetected {
                if self.buf[0] == b'[' {
                    self.framing = Framing::Array;
                    self.buf.drain(..1);
                    continue;
                }
                self.framing = Framing::Bare;
            }

            if self.framing == Framing::Array {
                if self.expect_separator {
                    match self.buf[0] {
                        b',' => {
                            self.expect_separator = false;
                            self.buf.drain(..1);
                            continue;
                        }
                        b']' => {
                            self.closed = true;
                            self.buf.drain(..1);
                            continue;
                        }
                        other => {
                            return Err(decode_error(&format!(
                                "expected ',' or ']' after array element, found {:?}",
                                other as char
                            )));
                        }
                    }
                }
                if self.buf[0] == b']' {
                    self.closed = true;
                    self.buf.drain(..1);
                    continue;
                }
            }

            if self.buf[0] != b'{' {
                return Err(decode_error(&format!(
                    "expected a tweet object, found {:?}",
                    self.buf[0] as char
                )));
            }

            match object_end(&self.buf) {
                // Element still incomplete; wait for the next chunk.
                None => return Ok(out),
                Some(end) => {
                    let tweet: Tweet = serde_json::from_slice(&self.buf[..end])?;
                    self.buf.drain(..end);
                    if self.framing == Framing::Array {
                        self.expect_separator = true;
                    }
                    out.push(tweet);
                }
            }
        }
    }

    fn trim_leading_whitespace(&mut self) {
        let skip = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buf.drain(..skip);
    }
}

/// Index one past the closing brace of the object starting at `buf[0]`, or
/// `None` when the object is still incomplete.
fn object_end(buf: &[u8]) -> Option<usize> {
    debug_assert_eq!(buf[0], b'{');

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in buf.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn decode_error(message: &str) -> FetchError {
    FetchError::Deserialization(serde_json::Error::custom(message))
}
