use crate::config::Config;
use crate::files::{FileError, ServeDir};
use crate::reader::RequestReader;
use crate::request::{ReadError, Request};
use crate::response::{Response, StatusCode};
use crate::router::{Endpoint, Router};
use crate::writer::Writer;
use log::{error, info, warn};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;

const LINGER: Duration = Duration::from_secs(2);

/// One request/response cycle per connection. Shared read-only between all
/// connection tasks.
pub struct Handler {
    files: ServeDir,
    router: Router,
    read_timeout: Duration,
    write_timeout: Duration,
    max_body_size: usize,
}

impl Handler {
    pub fn new(config: &Config) -> io::Result<Self> {
        Ok(Self {
            files: ServeDir::new(&config.directory)?,
            router: Router::default(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            max_body_size: config.max_body_bytes,
        })
    }

    pub fn files(&self) -> &ServeDir {
        &self.files
    }

    pub async fn handle_connection(&self, stream: &mut TcpStream) {
        let (read_half, write_half) = stream.split();
        let mut reader = RequestReader::new(
            BufReader::new(read_half),
            self.read_timeout,
            self.max_body_size,
        );
        let mut write_half = BufWriter::new(write_half);

        let response = match self.respond(&mut reader).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Dropping connection: {}", e);
                return;
            }
        };

        if let Err(e) =
            Writer::write_response_timeout(&response, &mut write_half, self.write_timeout).await
        {
            error!("Failed to write response: {}", e);
            return;
        }

        let _ = write_half.shutdown().await;
        reader.drain(LINGER).await;
    }

    /// Reads one request and decides on its response. Any error means the
    /// connection must be dropped without a reply.
    pub async fn respond<R>(&self, reader: &mut RequestReader<R>) -> Result<Response, ReadError>
    where
        R: AsyncBufReadExt + AsyncReadExt + Unpin,
    {
        let mut request = reader.read_request_line().await?;

        let (endpoint, param, headers) = match self.router.route(&request.method, &request.path) {
            Some(m) => (m.endpoint, m.param.to_string(), m.headers),
            None => {
                info!("{} {} -> 404", request.method.as_str(), request.path);
                return Ok(Response::new(StatusCode::NotFound));
            }
        };

        if !headers.is_empty() {
            reader.read_headers(&mut request, headers).await?;
        }
        if endpoint == Endpoint::WriteFile {
            reader.read_body(&mut request).await?;
        }

        let response = self.dispatch(endpoint, &param, &request).await;
        info!(
            "{} {} -> {} ({} bytes)",
            request.method.as_str(),
            request.path,
            response.status.code(),
            response.header("Content-Length").unwrap_or("0")
        );
        Ok(response)
    }

    async fn dispatch(&self, endpoint: Endpoint, param: &str, request: &Request) -> Response {
        match endpoint {
            Endpoint::Root => Response::new(StatusCode::Ok),
            Endpoint::Echo => {
                if !request.accepts_gzip() {
                    return Response::text(param);
                }
                match Response::text(param).gzip() {
                    Ok(response) => response,
                    Err(e) => {
                        error!("Failed to compress body: {}", e);
                        Response::text(param)
                    }
                }
            }
            Endpoint::UserAgent => match request.user_agent() {
                Some(user_agent) => Response::text(user_agent),
                None => Response::new(StatusCode::BadRequest),
            },
            Endpoint::ReadFile => match self.files.read(param).await {
                Ok(contents) => Response::octet_stream(contents),
                Err(e) => file_error_response(e),
            },
            Endpoint::WriteFile => match self.files.write(param, &request.body).await {
                Ok(()) => Response::new(StatusCode::Created),
                Err(FileError::Io(e)) => {
                    error!("Failed to write {:?}: {}", param, e);
                    Response::new(StatusCode::InternalServerError)
                }
                Err(e) => file_error_response(e),
            },
        }
    }
}

fn file_error_response(e: FileError) -> Response {
    match e {
        FileError::OutsideRoot(name) => {
            warn!("Rejected path outside serving directory: {:?}", name);
            Response::new(StatusCode::BadRequest)
        }
        FileError::NotFound(_) | FileError::Io(_) => Response::new(StatusCode::NotFound),
    }
}
