use crate::config::Config;
use crate::handler::Handler;
use log::{debug, error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to bind {0}: {1}")]
    Bind(String, io::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub struct Server {
    listener: TcpListener,
    handler: Arc<Handler>,
    permits: Arc<Semaphore>,
}

impl Server {
    pub async fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let handler = Handler::new(config)?;
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServerError::Bind(address, e))?;

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            permits: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts forever. A permit is taken before each accept, so at most
    /// `max_connections` handlers run at once and further clients wait in
    /// the listen backlog.
    pub async fn run(self) {
        info!(
            "Serving {:?} on {}",
            self.handler.files().root(),
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        );

        loop {
            let permit = match self.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("Connection limiter closed");
                    return;
                }
            };

            let (mut stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                handler.handle_connection(&mut stream).await;
                drop(permit);
            });
        }
    }
}
