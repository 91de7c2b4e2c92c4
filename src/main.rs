use crate::config::Config;
use crate::server::Server;
use clap::Parser;
use log::error;
use std::process;

mod config;
mod files;
mod handler;
mod reader;
mod request;
mod response;
mod router;
mod server;
mod writer;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    server.run().await;
}
