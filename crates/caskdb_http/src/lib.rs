//! # CaskDB HTTP Adapter
//!
//! A thin, transport-agnostic adapter that maps the `/db/{key}` HTTP
//! surface onto a [`caskdb_core::Store`]:
//!
//! - `POST /db/{key}` with JSON body `{"value": <string or integer>}` —
//!   integers route to `put_int64`, strings to `put`.
//! - `GET /db/{key}?type=string|int64` — `string` is the default; the
//!   response body is `{"key", "type", "value"}` with `value` a JSON
//!   number for `int64` and a JSON string otherwise.
//!
//! The crate deliberately does not bind a socket. An application wires the
//! endpoints of its HTTP server of choice into [`ApiServer::handle_request`]
//! (or the typed `handle_get`/`handle_put` methods) and writes back the
//! returned status and JSON body.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{GetResponse, RequestHandler, ValueType};
pub use server::ApiServer;
