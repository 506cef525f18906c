/// HTTP status codes the server emits.
///
/// - `SwitchingProtocols` (101): upgrade handshake accepted
/// - `Ok` (200): file found and streamed
/// - `NotFound` (404): no such file under the content root
/// - `InternalServerError` (500): handshake or storage failure
/// - `ServiceUnavailable` (503): connection ceiling reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 101 Switching Protocols
    SwitchingProtocols,
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::ServiceUnavailable.as_u16(), 503);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::SwitchingProtocols => 101,
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use switchyard::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::SwitchingProtocols => "Switching Protocols",
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 1xx responses carry neither a body nor a `Content-Length`.
    pub fn is_informational(&self) -> bool {
        self.as_u16() < 200
    }
}

/// A complete HTTP response, or just its head when the body is streamed
/// separately.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in emission order
    pub headers: Vec<(String, String)>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/css")
///     .body(b"body {}".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header, or replaces the value of an existing one in place.
    ///
    /// Header names are compared ignoring ASCII case.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Appends `Content-Length` from the body size unless one was set
    /// explicitly or the status is informational.
    pub fn build(mut self) -> Response {
        let has_length = self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"));
        if !has_length && !self.status.is_informational() {
            self.headers
                .push(("Content-Length".to_string(), self.body.len().to_string()));
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Head of a `200 OK` whose body of `length` bytes is streamed afterwards.
    pub fn file_head(content_type: &str, length: u64, server_name: &str) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", content_type)
            .header("Content-Length", length.to_string())
            .header("Server", server_name)
            .header("Connection", "close")
            .build()
    }

    /// A small inline HTML page describing `status`.
    pub fn page(status: StatusCode, server_name: &str) -> Self {
        let code = status.as_u16();
        let reason = status.reason_phrase();
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{code} {reason}</title></head>\
             <body><h1>{code} {reason}</h1><p>{server_name}</p></body></html>\n"
        )
        .into_bytes();

        ResponseBuilder::new(status)
            .header("Content-Type", "text/html")
            .header("Content-Length", body.len().to_string())
            .header("Server", server_name)
            .header("Connection", "close")
            .body(body)
            .build()
    }

    /// Creates a 404 Not Found page.
    pub fn not_found(server_name: &str) -> Self {
        Self::page(StatusCode::NotFound, server_name)
    }

    /// Creates a 500 Internal Server Error page.
    pub fn internal_error(server_name: &str) -> Self {
        Self::page(StatusCode::InternalServerError, server_name)
    }

    /// Creates a 503 Service Unavailable page.
    pub fn service_unavailable(server_name: &str) -> Self {
        Self::page(StatusCode::ServiceUnavailable, server_name)
    }
}
