//! Async Rust client for the building's cloud backend.
//!
//! Two surfaces live here, both plain HTTP over `reqwest`:
//!
//! - **[`RtdbClient`]**: the realtime database REST API. Values are
//!   addressed by slash-delimited paths (`smartLight/state`), read with
//!   `GET {base}/{path}.json`, replaced with `PUT`, and observed with a
//!   server-sent event stream (`Accept: text/event-stream`).
//!
//! - **[`IdentityClient`]**: email/password sign-in and sign-up against
//!   the identity toolkit endpoints, keyed by a project API key.
//!
//! Neither client retries. Callers decide what a failure means.

pub mod error;
pub mod identity;
pub mod rtdb;
pub mod sse;
pub mod transport;

pub use error::Error;
pub use identity::{IdentityClient, IdentitySession};
pub use rtdb::RtdbClient;
pub use sse::StreamEvent;
pub use transport::{TlsMode, TransportConfig};
