use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

/// Response sink that remembers the last status written through it.
///
/// Starts as an empty `200 OK`. Every write lands on the wrapped response,
/// so converting back with `into_response()` yields exactly what was written.
pub struct StatusWriter {
    inner: Response,
    status: StatusCode,
}

impl StatusWriter {
    pub fn new() -> Self {
        Self {
            inner: Response::new(Body::empty()),
            status: StatusCode::OK,
        }
    }

    /// Adopt the downstream handler's response as the current sink contents.
    pub fn forward(&mut self, response: Response) {
        self.status = response.status();
        self.inner = response;
    }

    /// Last call wins, on the sink and on the recorded value.
    pub fn write_header(&mut self, status: StatusCode) {
        self.status = status;
        *self.inner.status_mut() = status;
    }

    pub fn set_content_type(&mut self, value: &'static str) {
        self.inner
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
    }

    /// Replace the body. Any stale Content-Length is dropped with it.
    pub fn write(&mut self, body: impl Into<Body>) {
        self.inner.headers_mut().remove(header::CONTENT_LENGTH);
        *self.inner.body_mut() = body.into();
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_response(self) -> Response {
        self.inner
    }
}

impl Default for StatusWriter {
    fn default() -> Self {
        Self::new()
    }
}
