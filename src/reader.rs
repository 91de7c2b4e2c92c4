use crate::request::{Headers, ReadError, Request, RequestLine};
use log::debug;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt};
use tokio::time::timeout;

const MAX_LINE_LEN: u64 = 8 * 1024;
const MAX_HEADER_BYTES: usize = 64 * 1024;

pub struct RequestReader<R> {
    inner: R,
    read_timeout: Duration,
    max_body_size: usize,
}

impl<R> RequestReader<R>
where
    R: AsyncBufReadExt + AsyncReadExt + Unpin,
{
    pub fn new(inner: R, read_timeout: Duration, max_body_size: usize) -> Self {
        Self {
            inner,
            read_timeout,
            max_body_size,
        }
    }

    /// Reads one line and strips the trailing `\r\n` or `\n`.
    ///
    /// A stream that ends before a terminator is seen is reported as
    /// `UnexpectedEof`, even when some bytes were read.
    pub async fn read_line_bytes(&mut self) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.inner).take(MAX_LINE_LEN);
        let n = timeout(self.read_timeout, limited.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| ReadError::TimedOut)??;

        if buf.last() != Some(&b'\n') && n as u64 == MAX_LINE_LEN {
            return Err(ReadError::LineTooLong);
        }
        if n == 0 || buf.last() != Some(&b'\n') {
            return Err(ReadError::UnexpectedEof);
        }
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(buf)
    }

    /// Like `read_line_bytes`, but the line must be UTF-8.
    pub async fn read_line(&mut self) -> Result<String, ReadError> {
        let buf = self.read_line_bytes().await?;
        String::from_utf8(buf).map_err(|_| ReadError::MalformedLine)
    }

    /// Reads exactly `len` bytes. A short stream is `UnexpectedEof`.
    pub async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let mut buf = vec![0; len];
        match timeout(self.read_timeout, self.inner.read_exact(&mut buf)).await {
            Err(_) => Err(ReadError::TimedOut),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(ReadError::UnexpectedEof)
            }
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(_)) => Ok(buf),
        }
    }

    pub async fn read_request_line(&mut self) -> Result<Request, ReadError> {
        let line = self.read_line().await?;
        let line = RequestLine::try_from(line.as_str())?;
        debug!("{} {} {}", line.method.as_str(), line.path, line.version);
        Ok(Request::new(line))
    }

    /// Reads header lines until a blank line, keeping only the headers named
    /// in `wanted` (lowercase). Lines that are not UTF-8 or have no colon are
    /// skipped. The whole block is capped at `MAX_HEADER_BYTES`.
    pub async fn read_headers(
        &mut self,
        request: &mut Request,
        wanted: &[&str],
    ) -> Result<(), ReadError> {
        let mut total = 0;
        loop {
            let line = self.read_line_bytes().await?;
            if line.is_empty() {
                return Ok(());
            }
            total += line.len();
            if total > MAX_HEADER_BYTES {
                return Err(ReadError::HeadersTooLarge);
            }

            let Ok(line) = std::str::from_utf8(&line) else {
                continue;
            };
            if let Some((key, value)) = Headers::parse_line(line) {
                if wanted.iter().any(|name| key.eq_ignore_ascii_case(name)) {
                    request.headers.insert(key, value);
                }
            }
        }
    }

    /// Reads the body declared by `Content-Length`, which must already be
    /// present in `request.headers`.
    pub async fn read_body(&mut self, request: &mut Request) -> Result<(), ReadError> {
        let len = request.content_length()?;
        if len > self.max_body_size {
            return Err(ReadError::BodyTooLarge(len));
        }
        request.body = self.read_exact(len).await?;
        Ok(())
    }

    /// Discards whatever the peer still sends until it closes the stream or
    /// `linger` elapses.
    pub async fn drain(&mut self, linger: Duration) {
        let mut sink = [0u8; 1024];
        let inner = &mut self.inner;
        let _ = timeout(linger, async move {
            while let Ok(n) = inner.read(&mut sink).await {
                if n == 0 {
                    break;
                }
            }
        })
        .await;
    }
}
