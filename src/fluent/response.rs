//! Response values and the response sink contract.
//!
//! Handlers write through a [`ResponseSink`]. A sink accepts status, headers
//! and body bytes until it is ended; after that every call is a no-op, so a
//! response is sent at most once no matter how many times a handler or a
//! middleware tries. [`Reply`] is a complete response as a value: middleware
//! halts with one and handlers usually `send` one.

use {
    axum::{
        body::Body,
        response::{IntoResponse, Response},
    },
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    serde::Serialize,
    std::{io, path::Path},
};

/// A complete response: status, headers and body.
///
/// ```
/// use kiwi_dispatch::Reply;
/// use http::StatusCode;
///
/// let reply = Reply::text(StatusCode::OK, "hello");
/// assert_eq!(reply.content_type(), Some("text/plain"));
/// assert_eq!(reply.body(), b"hello");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Sets `name`, replacing any value it already had.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds another value for `name`, keeping the existing ones (`Set-Cookie`).
    #[must_use]
    pub fn with_appended_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// A JSON reply. A value that fails to serialize yields a 500 instead.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )
                .with_body(body),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize JSON response");
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(text.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::text(StatusCode::NOT_FOUND, message)
    }

    /// 405 with the supported methods listed in `Allow`.
    pub fn method_not_allowed(method: &str) -> Self {
        Self::json(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "error": format!("Method {method} not allowed") }),
        )
        .with_header(
            header::ALLOW,
            HeaderValue::from_static("GET, POST, PUT, DELETE"),
        )
    }

    /// A redirect to `location`. An unencodable location becomes a 500.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        match HeaderValue::from_str(location) {
            Ok(value) => Self::new(status).with_header(header::LOCATION, value),
            Err(err) => {
                tracing::error!(error = %err, location, "Invalid redirect location");
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    /// A file download: the file's bytes with a guessed content type,
    /// `Content-Length` and an attachment `Content-Disposition`.
    ///
    /// `file_name` is the name offered to the client; it defaults to the
    /// last component of `path`. A missing file yields a 404 and any other
    /// read failure a 500.
    pub fn file(path: impl AsRef<Path>, file_name: Option<&str>) -> Self {
        let path = path.as_ref();
        let body = match std::fs::read(path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Self::not_found("File not found");
            }
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "Failed to read file");
                return Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        };

        let file_name = file_name
            .map(str::to_string)
            .or_else(|| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let mut reply =
            Self::new(StatusCode::OK).with_header(header::CONTENT_LENGTH, body.len().into());
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            reply = reply.with_header(header::CONTENT_TYPE, value);
        }
        match HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            file_name.replace('"', "")
        )) {
            Ok(value) => reply = reply.with_header(header::CONTENT_DISPOSITION, value),
            Err(err) => tracing::warn!(error = %err, file_name, "Omitting Content-Disposition"),
        }
        reply.with_body(body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Where a handler writes its response.
///
/// Implementations must ignore every call once [`ResponseSink::end`] has
/// succeeded, and `end` itself must only return `true` the first time.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    /// Sets `name`, replacing any value already set.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Adds another value for `name` next to the ones already set.
    fn append_header(&mut self, name: HeaderName, value: HeaderValue);

    fn write(&mut self, chunk: &[u8]);

    /// Terminates the response. Returns `false` if it was already sent.
    fn end(&mut self) -> bool;

    fn is_sent(&self) -> bool;

    fn set_content_type(&mut self, content_type: &str) {
        match HeaderValue::from_str(content_type) {
            Ok(value) => self.set_header(header::CONTENT_TYPE, value),
            Err(err) => tracing::warn!(error = %err, content_type, "Ignoring invalid content type"),
        }
    }

    /// Writes `reply` and ends the response in one step.
    fn send(&mut self, reply: Reply) -> bool {
        if self.is_sent() {
            return false;
        }
        self.set_status(reply.status);
        for name in reply.headers.keys() {
            let mut values = reply.headers.get_all(name).iter();
            if let Some(first) = values.next() {
                self.set_header(name.clone(), first.clone());
            }
            for value in values {
                self.append_header(name.clone(), value.clone());
            }
        }
        self.write(&reply.body);
        self.end()
    }
}

/// A [`ResponseSink`] that buffers the whole response in memory.
///
/// This is the sink the HTTP host uses, and the natural one for tests.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    sent: bool,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            sent: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the buffered state into a [`Reply`].
    pub fn into_reply(self) -> Reply {
        Reply {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        if !self.sent {
            self.status = status;
        }
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.sent {
            self.headers.insert(name, value);
        }
    }

    fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.sent {
            self.headers.append(name, value);
        }
    }

    fn write(&mut self, chunk: &[u8]) {
        if !self.sent {
            self.body.extend_from_slice(chunk);
        }
    }

    fn end(&mut self) -> bool {
        !std::mem::replace(&mut self.sent, true)
    }

    fn is_sent(&self) -> bool {
        self.sent
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        self.into_reply().into_response()
    }
}
