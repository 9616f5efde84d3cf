//! The fixed HTTP/1.1 request sent on every iteration.
//!
//! Wire format:
//! ```text
//! GET / HTTP/1.1\r\n
//! Connection: keep-alive\r\n
//! Accept: application/json\r\n
//! Host: <host header>\r\n
//! \r\n
//! ```
//!
//! Method, path and the first two headers are constants.  The `Host` value is
//! configuration and is **not** derived from the resolved server address; a
//! deployment may point the socket at one address while naming another
//! virtual host.

/// Request method.  Not configurable.
pub const METHOD: &str = "GET";
/// Request target.  Not configurable.
pub const PATH: &str = "/";
/// Protocol version token.
pub const VERSION: &str = "HTTP/1.1";

/// A rendered request, ready to be written to a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    bytes: Vec<u8>,
}

impl HttpRequest {
    /// Renders the fixed GET request with the given `Host` header value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cellfetch_core::HttpRequest;
    ///
    /// let req = HttpRequest::get("example.com:8080");
    /// assert!(req.as_bytes().starts_with(b"GET / HTTP/1.1\r\n"));
    /// assert!(req.as_bytes().ends_with(b"Host: example.com:8080\r\n\r\n"));
    /// ```
    pub fn get(host_header: &str) -> Self {
        let text = format!(
            "{METHOD} {PATH} {VERSION}\r\n\
             Connection: keep-alive\r\n\
             Accept: application/json\r\n\
             Host: {host_header}\r\n\r\n"
        );
        Self {
            bytes: text.into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
