//! Adapter façade and request dispatch.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{GetResponse, RequestHandler, ValueType};
use caskdb_core::Store;
use std::sync::Arc;

/// The HTTP adapter façade.
///
/// Owns the dispatch from `(method, path, query, body)` to the engine. A
/// wiring application hands each incoming request to
/// [`ApiServer::handle_request`] and writes the returned status code and
/// optional JSON body back to the client.
///
/// # Example
///
/// ```no_run
/// use caskdb_http::{ApiServer, ServerConfig};
/// use caskdb_core::Store;
/// use std::sync::Arc;
///
/// let store = Arc::new(Store::open("./data")?);
/// let server = ApiServer::new(ServerConfig::default(), store);
///
/// let (status, body) =
///     server.handle_request("POST", "/db/greeting", None, br#"{"value": "hi"}"#);
/// assert_eq!(status, 200);
/// # let _ = body;
/// # Ok::<(), caskdb_core::CoreError>(())
/// ```
pub struct ApiServer {
    config: ServerConfig,
    handler: RequestHandler,
}

impl ApiServer {
    /// Creates an adapter over a shared store.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<Store>) -> Self {
        Self {
            config,
            handler: RequestHandler::new(store),
        }
    }

    /// Returns the adapter configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handles `GET /db/{key}`.
    ///
    /// # Errors
    ///
    /// See [`crate::ServerError::status`] for the HTTP mapping.
    pub fn handle_get(&self, key: &str, value_type: ValueType) -> ServerResult<GetResponse> {
        self.handler.handle_get(key, value_type)
    }

    /// Handles `POST /db/{key}`.
    ///
    /// # Errors
    ///
    /// See [`crate::ServerError::status`] for the HTTP mapping.
    pub fn handle_put(&self, key: &str, body: &[u8]) -> ServerResult<()> {
        self.handler.handle_put(key, body)
    }

    /// Dispatches one request, resolving errors into status codes.
    ///
    /// `query_type` is the raw `type` query parameter, if present. Returns
    /// the status code and an optional JSON body.
    pub fn handle_request(
        &self,
        method: &str,
        path: &str,
        query_type: Option<&str>,
        body: &[u8],
    ) -> (u16, Option<String>) {
        let Some(key) = path.strip_prefix("/db/").filter(|key| !key.is_empty()) else {
            return (404, None);
        };

        match method {
            "GET" => match self.handle_get(key, ValueType::parse(query_type)) {
                Ok(response) => match serde_json::to_string(&response) {
                    Ok(body) => (200, Some(body)),
                    Err(_) => (500, None),
                },
                Err(err) => (err.status(), None),
            },
            "POST" => {
                if body.len() > self.config.max_body_bytes {
                    return (400, None);
                }
                match self.handle_put(key, body) {
                    Ok(()) => (200, None),
                    Err(err) => (err.status(), None),
                }
            }
            _ => (405, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn server() -> (tempfile::TempDir, ApiServer) {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        (dir, ApiServer::new(ServerConfig::default(), store))
    }

    #[test]
    fn post_then_get_round_trip() {
        let (_dir, server) = server();

        let (status, _) = server.handle_request("POST", "/db/k1", None, br#"{"value": "v1"}"#);
        assert_eq!(status, 200);

        let (status, body) = server.handle_request("GET", "/db/k1", None, &[]);
        assert_eq!(status, 200);
        let body: serde_json::Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"key": "k1", "type": "string", "value": "v1"})
        );
    }

    #[test]
    fn int64_round_trip_over_the_wire() {
        let (_dir, server) = server();

        let (status, _) = server.handle_request("POST", "/db/n", None, br#"{"value": 42}"#);
        assert_eq!(status, 200);

        let (status, body) = server.handle_request("GET", "/db/n", Some("int64"), &[]);
        assert_eq!(status, 200);
        let body: serde_json::Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"key": "n", "type": "int64", "value": 42})
        );
    }

    #[test]
    fn missing_key_is_404() {
        let (_dir, server) = server();
        let (status, body) = server.handle_request("GET", "/db/absent", None, &[]);
        assert_eq!(status, 404);
        assert!(body.is_none());
    }

    #[test]
    fn bad_body_is_400() {
        let (_dir, server) = server();
        let (status, _) = server.handle_request("POST", "/db/k", None, b"{broken");
        assert_eq!(status, 400);
    }

    #[test]
    fn wrong_typed_read_is_400() {
        let (_dir, server) = server();
        server
            .handle_request("POST", "/db/k", None, br#"{"value": "abc"}"#);
        let (status, _) = server.handle_request("GET", "/db/k", Some("int64"), &[]);
        assert_eq!(status, 400);
    }

    #[test]
    fn unknown_route_is_404() {
        let (_dir, server) = server();
        assert_eq!(server.handle_request("GET", "/health", None, &[]).0, 404);
        assert_eq!(server.handle_request("GET", "/db/", None, &[]).0, 404);
    }

    #[test]
    fn unsupported_method_is_405() {
        let (_dir, server) = server();
        assert_eq!(server.handle_request("DELETE", "/db/k", None, &[]).0, 405);
    }

    #[test]
    fn oversized_body_is_400() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let server = ApiServer::new(ServerConfig::default().with_max_body_bytes(8), store);

        let (status, _) =
            server.handle_request("POST", "/db/k", None, br#"{"value": "long body"}"#);
        assert_eq!(status, 400);
    }
}
