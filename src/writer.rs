use crate::response::Response;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Write timed out")]
    TimedOut,
}

pub struct Writer {}

impl Writer {
    pub fn encode_head(response: &Response) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            response.status.code(),
            response.status.reason()
        );
        for (key, value) in &response.headers {
            head.push_str(key);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    pub async fn write_response(
        response: &Response,
        writer: &mut (impl AsyncWriteExt + Unpin),
    ) -> Result<(), WriteError> {
        writer.write_all(&Self::encode_head(response)).await?;
        writer.write_all(&response.body).await?;
        writer.flush().await?;

        Ok(())
    }

    pub async fn write_response_timeout(
        response: &Response,
        writer: &mut (impl AsyncWriteExt + Unpin),
        write_timeout: Duration,
    ) -> Result<(), WriteError> {
        timeout(write_timeout, Self::write_response(response, writer))
            .await
            .map_err(|_| WriteError::TimedOut)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::StatusCode;

    #[tokio::test]
    async fn test_write_empty_response() {
        let mut buffer = Vec::new();
        let response = Response::new(StatusCode::NotFound);

        Writer::write_response(&response, &mut buffer).await.unwrap();
        assert_eq!(buffer, b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn test_write_text_response() {
        let mut buffer = Vec::new();
        let response = Response::text("abc");

        Writer::write_response(&response, &mut buffer).await.unwrap();
        assert_eq!(
            buffer,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[tokio::test]
    async fn test_write_binary_body_verbatim() {
        let mut buffer = Vec::new();
        let body = vec![0u8, 159, 146, 150, b'\r', b'\n'];
        let response = Response::octet_stream(body.clone());

        Writer::write_response(&response, &mut buffer).await.unwrap();
        assert!(buffer.ends_with(&body));
        assert!(buffer.starts_with(b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n"));
    }

    #[tokio::test]
    async fn test_write_timeout() {
        // Nobody reads the other end, so the 16 byte pipe fills up.
        let (_client, mut server) = tokio::io::duplex(16);
        let response = Response::text("x".repeat(1024));

        let result =
            Writer::write_response_timeout(&response, &mut server, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(WriteError::TimedOut)));
    }
}
