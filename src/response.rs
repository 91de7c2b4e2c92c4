use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    NotFound = 404,
    InternalServerError = 500,
}

impl StatusCode {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// A response with no headers and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(status: StatusCode, content_type: &str, body: Vec<u8>) -> Self {
        let mut response = Self::new(status);
        response.set_header("Content-Type", content_type);
        response.set_header("Content-Length", &body.len().to_string());
        response.body = body;
        response
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::with_body(StatusCode::Ok, "text/plain", body.into().into_bytes())
    }

    pub fn octet_stream(body: Vec<u8>) -> Self {
        Self::with_body(StatusCode::Ok, "application/octet-stream", body)
    }

    /// Replaces a header of the same name, otherwise appends it.
    pub fn set_header(&mut self, key: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((key.to_string(), value.to_string())),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Compresses the body in place and fixes up the framing headers.
    pub fn gzip(mut self) -> io::Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body)?;
        self.body = encoder.finish()?;

        self.headers.insert(0, ("Content-Encoding".to_string(), "gzip".to_string()));
        self.set_header("Content-Length", &self.body.len().to_string());
        Ok(self)
    }
}
