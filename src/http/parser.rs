use crate::http::request::{Method, Request, RequestBuilder};

#[derive(Debug)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    Incomplete,
}

/// Parses a request head (request line and headers) from `buf`.
///
/// Returns the request and the number of bytes consumed, terminator included.
/// Anything after the blank line is left to the caller.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    let mut headers = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        headers.push((key.trim().to_string(), value.trim().to_string()));
    }

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
    };

    Ok((request, headers_end + 4))
}

/// Lenient reading of a head that [`parse_http_request`] rejected.
///
/// Only the request line has to be well formed. Header lines without a colon
/// are skipped, and a head cut off mid-way yields the headers seen so far.
pub fn parse_request_prefix(buf: &[u8]) -> Option<Request> {
    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split("\r\n");

    let mut parts = lines.next()?.split_whitespace();
    let method = Method::from_str(parts.next()?)?;
    let mut builder = RequestBuilder::new().method(method).path(parts.next()?);
    if let Some(version) = parts.next() {
        builder = builder.version(version);
    }

    for line in lines.take_while(|line| !line.is_empty()) {
        if let Some((key, value)) = line.split_once(':') {
            builder = builder.header(key.trim(), value.trim());
        }
    }

    builder.build().ok()
}

/// Offset of the `\r\n\r\n` that ends a request head, if present.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.header("Host").unwrap(), "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let req = b"GET / HTTP/1.1\r\n\r\nextra";

        let (_, consumed) = parse_http_request(req).unwrap();

        assert_eq!(&req[consumed..], b"extra");
    }

    #[test]
    fn prefix_skips_malformed_header_lines() {
        let req = b"GET /app.js HTTP/1.1\r\nHost: device\r\nno colon here\r\nUpgrade: websocket\r\n\r\n";

        assert!(matches!(parse_http_request(req), Err(ParseError::InvalidHeader)));
        let parsed = parse_request_prefix(req).unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.path, "/app.js");
        assert!(parsed.is_upgrade());
    }

    #[test]
    fn prefix_of_truncated_head() {
        let req = b"GET /style.css HTTP/1.1\r\nCookie: session=aaaaaaaa";

        let parsed = parse_request_prefix(req).unwrap();

        assert_eq!(parsed.path, "/style.css");
        assert!(!parsed.is_upgrade());
        assert!(parse_request_prefix(b"\r\n\r\n").is_none());
        assert!(parse_request_prefix(b"BREW /pot HTTP/1.1\r\n").is_none());
    }
}
