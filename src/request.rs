use std::collections::HashMap;
use std::io;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(token) => token,
        }
    }
}

/// Header names are stored case-folded, values trimmed.
#[derive(Debug, Default, Clone)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.inner
            .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parses one header line. Lines without a colon yield `None`.
    pub fn parse_line(line: &str) -> Option<(&str, &str)> {
        line.split_once(':')
            .map(|(key, value)| (key.trim(), value.trim()))
    }
}

#[derive(Debug)]
pub struct RequestLine {
    pub method: Method,
    pub path: String,
    pub version: String,
}

impl TryFrom<&str> for RequestLine {
    type Error = ReadError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(path), Some(version)) => Ok(RequestLine {
                method: Method::from(method),
                path: path.to_string(),
                version: version.to_string(),
            }),
            _ => Err(ReadError::InvalidRequestLine(line.trim_end().to_string())),
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(line: RequestLine) -> Self {
        Self {
            method: line.method,
            path: line.path,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Declared body length. Absent means zero.
    pub fn content_length(&self) -> Result<usize, ReadError> {
        match self.headers.get("content-length") {
            None => Ok(0),
            Some(value) => value
                .parse()
                .map_err(|_| ReadError::InvalidContentLength(value.to_string())),
        }
    }

    /// True when `Accept-Encoding` lists the exact token `gzip`.
    pub fn accepts_gzip(&self) -> bool {
        self.headers
            .get("accept-encoding")
            .map(|value| value.split(',').any(|encoding| encoding.trim() == "gzip"))
            .unwrap_or(false)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get("user-agent").filter(|ua| !ua.is_empty())
    }
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unexpected end of stream")]
    UnexpectedEof,
    #[error("Malformed line: not valid UTF-8")]
    MalformedLine,
    #[error("Line too long")]
    LineTooLong,
    #[error("Header block too large")]
    HeadersTooLarge,
    #[error("Invalid request line: {0:?}")]
    InvalidRequestLine(String),
    #[error("Invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("Body too large: {0} bytes")]
    BodyTooLarge(usize),
    #[error("Read timed out")]
    TimedOut,
}
