// Realtime database REST client
//
// Wraps `reqwest::Client` with path-to-URL construction, auth query
// injection, and event-stream decoding. Values cross this boundary as
// raw `serde_json::Value`; `bms-core` owns the domain value type.

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::sse::{SseDecoder, StreamEvent};
use crate::transport::TransportConfig;

/// Raw HTTP client for the realtime database.
///
/// Every path is slash-delimited and relative to the database root.
/// Absent values come back as `None`; the database never distinguishes
/// "missing" from "null".
#[derive(Clone)]
pub struct RtdbClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
    /// Database secret or ID token, sent as the `auth` query parameter.
    auth: Option<SecretString>,
}

impl RtdbClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the database root, e.g.
    /// `https://my-building-default-rtdb.firebaseio.com`.
    pub fn new(
        base_url: Url,
        auth: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        check_base(&base_url)?;
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url,
            auth,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The same client serves one-shot and streaming requests.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        auth: Option<SecretString>,
    ) -> Result<Self, Error> {
        check_base(&base_url)?;
        Ok(Self {
            stream_http: http.clone(),
            http,
            base_url,
            auth,
        })
    }

    /// The database root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/{seg}/{seg}.json[?auth=...]`.
    ///
    /// Segments are percent-encoded individually, so keys such as
    /// `First Floor` survive intact.
    pub fn path_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let label = url.to_string();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(label))?;
            segs.pop_if_empty();
            let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            match parts.split_last() {
                Some((last, parents)) => {
                    segs.extend(parents);
                    segs.push(&format!("{last}.json"));
                }
                None => {
                    segs.push(".json");
                }
            }
        }
        if let Some(auth) = &self.auth {
            url.query_pairs_mut()
                .append_pair("auth", auth.expose_secret());
        }
        Ok(url)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Read the value at `path` once. `null` maps to `None`.
    pub async fn get(&self, path: &str) -> Result<Option<serde_json::Value>, Error> {
        let url = self.path_url(path)?;
        debug!(path, "GET");

        let resp = self.http.get(url).send().await?;
        let body = check_status(resp).await?.text().await?;

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        Ok((!value.is_null()).then_some(value))
    }

    /// Replace the value at `path`.
    pub async fn put(&self, path: &str, value: &serde_json::Value) -> Result<(), Error> {
        let url = self.path_url(path)?;
        debug!(path, "PUT");

        let resp = self
            .http
            .put(url)
            .query(&[("print", "silent")])
            .json(value)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Open an event stream on `path`.
    ///
    /// The returned stream yields every interpreted event until the
    /// server closes the body. Malformed frames are yielded as errors
    /// and the stream keeps going; transport failures end it.
    pub async fn stream(
        &self,
        path: &str,
    ) -> Result<impl Stream<Item = Result<StreamEvent, Error>> + Send + 'static, Error> {
        let url = self.path_url(path)?;
        debug!(path, "STREAM");

        let resp = self
            .stream_http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let mut body = resp.bytes_stream();
        Ok(async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for frame in decoder.feed(&bytes) {
                            trace!(event = %frame.event, "stream frame");
                            yield StreamEvent::from_frame(&frame);
                        }
                    }
                    Err(e) => {
                        yield Err(Error::Transport(e));
                        break;
                    }
                }
            }
        })
    }
}

// ── Response helpers ─────────────────────────────────────────────────

fn check_base(url: &Url) -> Result<(), Error> {
    if url.cannot_be_a_base() {
        return Err(Error::InvalidBaseUrl(url.to_string()));
    }
    Ok(())
}

/// Map error statuses; pass successful responses through.
///
/// The database reports errors as `{"error": "..."}`.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| preview(&body).to_owned());

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication { message });
    }

    Err(Error::Http {
        status: status.as_u16(),
        message,
    })
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
