//! Server-sent event framing for the database's streaming endpoint.
//!
//! The database pushes frames of the form
//!
//! ```text
//! event: put
//! data: {"path": "/", "data": {"temperature": 22, "humidity": 55}}
//!
//! ```
//!
//! [`SseDecoder`] turns raw body chunks into [`SseFrame`]s, and
//! [`StreamEvent::from_frame`] interprets them.

use serde::Deserialize;

use crate::error::Error;

/// A single `event:` / `data:` block from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental decoder: feed it body chunks in arrival order.
///
/// Chunks may split a frame (or a UTF-8 sequence) anywhere; the decoder
/// buffers until a blank line terminates the frame.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_frame_end(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&block[..end]);
            if let Some(frame) = parse_block(&text) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn find_frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        // Comment line.
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line
            .split_once(':')
            .map_or((line, ""), |(f, v)| (f, v.strip_prefix(' ').unwrap_or(v)));
        match field {
            "event" => event = Some(value.to_owned()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }

    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".into()),
        data: data.join("\n"),
    })
}

// ── Interpreted events ───────────────────────────────────────────────

/// Events the database emits on a streaming read.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the value at `path` (relative to the subscribed location).
    /// `data` is `null` when the value was deleted.
    Put {
        path: String,
        data: serde_json::Value,
    },
    /// Replace each listed child under `path`; `data` is an object.
    Patch {
        path: String,
        data: serde_json::Value,
    },
    /// Connection heartbeat, no payload.
    KeepAlive,
    /// Server ended the stream (typically security rules now deny the read).
    Cancel(String),
    /// The auth token expired or was revoked; the stream is over.
    AuthRevoked,
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    data: serde_json::Value,
}

impl StreamEvent {
    /// Interpret a decoded frame.
    pub fn from_frame(frame: &SseFrame) -> Result<Self, Error> {
        let parse = |frame: &SseFrame| {
            serde_json::from_str::<PathData>(&frame.data).map_err(|e| Error::StreamProtocol {
                event: frame.event.clone(),
                message: e.to_string(),
            })
        };

        match frame.event.as_str() {
            "put" => {
                let PathData { path, data } = parse(frame)?;
                Ok(Self::Put { path, data })
            }
            "patch" => {
                let PathData { path, data } = parse(frame)?;
                Ok(Self::Patch { path, data })
            }
            "keep-alive" => Ok(Self::KeepAlive),
            "cancel" => Ok(Self::Cancel(frame.data.clone())),
            "auth_revoked" => Ok(Self::AuthRevoked),
            other => Err(Error::StreamProtocol {
                event: other.to_owned(),
                message: "unknown event type".into(),
            }),
        }
    }
}
